//! Opaque mover: исполняет MovementCommand, двигая Transform по горизонтали
//!
//! Заменяет navmesh-агента хоста: прямолинейное движение к цели с
//! остановкой внутри acceptance radius. Прибытие — команда сама
//! схлопывается в Idle; AI перепроверяет дистанции независимо.

use bevy::prelude::*;

use crate::components::{MovementCommand, MovementSpeed};
use crate::SimSet;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<MovementSpeed>()
            .add_systems(FixedUpdate, drive_agents.in_set(SimSet::Movement));
    }
}

/// Исполнение команд движения
///
/// Два прохода через ParamSet: сперва резолвим цели (FollowEntity читает
/// Transform чужой entity), потом пишем позиции — иначе конфликт запросов.
pub fn drive_agents(
    mut queries: ParamSet<(
        Query<(Entity, &MovementCommand, &Transform)>,
        Query<(&mut Transform, &mut MovementCommand, &MovementSpeed)>,
    )>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    // Проход 1: собрать (entity, goal, acceptance); Stop схлопывается в Idle
    let mut moves = Vec::new();
    let mut stops = Vec::new();
    {
        let readers = queries.p0();
        for (entity, command, _) in readers.iter() {
            match *command {
                MovementCommand::Idle => {}
                MovementCommand::Stop => stops.push(entity),
                MovementCommand::MoveToPosition { target, acceptance } => {
                    moves.push((entity, target, acceptance));
                }
                MovementCommand::FollowEntity { target, acceptance } => {
                    let Ok((_, _, target_transform)) = readers.get(target) else {
                        stops.push(entity);
                        continue;
                    };
                    moves.push((entity, target_transform.translation, acceptance));
                }
            }
        }
    }

    // Проход 2: применить
    let mut writers = queries.p1();
    for entity in stops {
        let Ok((_, mut command, _)) = writers.get_mut(entity) else {
            continue;
        };
        *command = MovementCommand::Idle;
    }

    for (entity, goal, acceptance) in moves {
        let Ok((mut transform, mut command, speed)) = writers.get_mut(entity) else {
            continue;
        };

        let mut to_goal = goal - transform.translation;
        to_goal.y = 0.0;
        let dist = to_goal.length();

        if dist <= acceptance.max(f32::EPSILON) {
            // Прибыли; FollowEntity остаётся активной (цель может уйти)
            if matches!(*command, MovementCommand::MoveToPosition { .. }) {
                *command = MovementCommand::Idle;
            }
            continue;
        }

        let dir = to_goal / dist;
        transform.look_to(dir, Vec3::Y);

        let step = speed.speed * delta;
        if step >= dist - acceptance {
            transform.translation += dir * (dist - acceptance);
            if matches!(*command, MovementCommand::MoveToPosition { .. }) {
                *command = MovementCommand::Idle;
            }
        } else {
            transform.translation += dir * step;
        }
    }
}

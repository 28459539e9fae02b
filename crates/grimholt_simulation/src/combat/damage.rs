//! Приём урона: directional hit react, stagger, смерть, деспавн трупов

use bevy::prelude::*;
use rand::Rng;

use crate::ai::components::{AgentTimers, CombatTarget, EnemyConfig, EnemyState, TimerKind};
use crate::animation::{ActiveMontage, DeathPose, MontageKind, MontageLibrary};
use crate::combat::weapon::{EquippedWeapon, WeaponCollision};
use crate::components::{
    ActionState, Agent, Attributes, CharacterState, CollisionCapsule, DespawnAfter, HealthBar,
    MovementCommand,
};
use crate::{log_info, DeterministicRng};

/// Событие: оружие (или внешний коллаборатор) достало цель
#[derive(Event, Debug, Clone)]
pub struct HitLanded {
    pub target: Entity,
    pub attacker: Entity,
    pub damage: f32,
    pub impact_point: Vec3,
}

/// Событие: урон применён к атрибутам
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub target: Entity,
    pub attacker: Entity,
    pub amount: f32,
    pub remaining_health: f32,
}

/// Событие: агент умер
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
}

/// Откуда прилетел удар (в горизонтальной плоскости агента)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitDirection {
    Front,
    Left,
    Right,
    Back,
}

/// Секция hit-react montage для направления
pub fn hit_react_section(direction: HitDirection) -> u32 {
    match direction {
        HitDirection::Front => 0,
        HitDirection::Left => 1,
        HitDirection::Right => 2,
        HitDirection::Back => 3,
    }
}

/// Направление удара: знаковый угол между горизонтальным forward агента
/// и горизонтальным вектором к точке удара
///
/// Знак — по вертикальной компоненте cross product. Корзины:
/// Front (−45°, 45°), Left [−135°, −45°), Right [45°, 135°), иначе Back.
/// Ровно −45° проваливается в Back: нижняя граница Front открыта.
/// Вырожденный вектор (удар точно в центр) → Front.
pub fn hit_direction(transform: &Transform, impact: Vec3) -> HitDirection {
    let mut forward = transform.forward().as_vec3();
    forward.y = 0.0;
    let forward = forward.normalize_or_zero();

    let mut to_hit = impact - transform.translation;
    to_hit.y = 0.0;
    let to_hit = to_hit.normalize_or_zero();

    if forward == Vec3::ZERO || to_hit == Vec3::ZERO {
        return HitDirection::Front;
    }

    let cos_theta = forward.dot(to_hit).clamp(-1.0, 1.0);
    let mut theta = cos_theta.acos().to_degrees();
    if forward.cross(to_hit).y > 0.0 {
        theta = -theta;
    }

    bucket_theta(theta)
}

fn bucket_theta(theta: f32) -> HitDirection {
    if theta > -45.0 && theta < 45.0 {
        HitDirection::Front
    } else if (-135.0..-45.0).contains(&theta) {
        HitDirection::Left
    } else if (45.0..135.0).contains(&theta) {
        HitDirection::Right
    } else {
        HitDirection::Back
    }
}

/// Применение урона — единая точка входа
///
/// 1. Мутация атрибутов + DamageDealt + показ health bar.
/// 2. Жертва-враг запоминает обидчика как combat target (погоня —
///    после recovery, stagger сильнее немедленной погони).
/// 3. Жив → directional hit react; враг дополнительно в Staggered.
/// 4. Мёртв → терминальный переход смерти.
#[allow(clippy::type_complexity)]
pub fn apply_hits(
    mut hit_events: EventReader<HitLanded>,
    mut targets: Query<(
        &mut Attributes,
        &Transform,
        &mut ActionState,
        &mut CharacterState,
        &mut MovementCommand,
        &mut CollisionCapsule,
        &mut HealthBar,
        &Agent,
        &MontageLibrary,
        Option<&EquippedWeapon>,
        Option<(
            &mut EnemyState,
            &mut AgentTimers,
            &mut CombatTarget,
            &EnemyConfig,
        )>,
    )>,
    mut weapons: Query<&mut WeaponCollision>,
    mut rng: ResMut<DeterministicRng>,
    mut damage_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
    mut commands: Commands,
) {
    for event in hit_events.read() {
        let Ok((
            mut attrs,
            transform,
            mut action,
            mut character,
            mut command,
            mut capsule,
            mut bar,
            agent,
            library,
            equipped,
            enemy,
        )) = targets.get_mut(event.target)
        else {
            continue;
        };
        if !attrs.is_alive() {
            continue;
        }

        attrs.take_damage(event.damage);
        bar.visible = true;
        damage_events.write(DamageDealt {
            target: event.target,
            attacker: event.attacker,
            amount: event.damage,
            remaining_health: attrs.health,
        });
        log_info(&format!(
            "💥 {:?} hit {:?} for {:.1} ({:.1} hp left)",
            event.attacker, event.target, event.damage, attrs.health
        ));

        if attrs.is_alive() {
            let direction = hit_direction(transform, event.impact_point);
            *action = ActionState::HitReaction;
            commands.entity(event.target).insert(ActiveMontage::play(
                MontageKind::HitReact,
                hit_react_section(direction),
                &library.hit_react,
                1.0,
            ));

            if let Some((mut state, mut timers, mut target, config)) = enemy {
                target.0 = Some(event.attacker);
                // Принятая цель отменяет отложенный патрульный приказ
                timers.clear(TimerKind::Patrol);
                if *state != EnemyState::Dead {
                    *state = EnemyState::Staggered;
                    *command = MovementCommand::Stop;
                    timers.clear(TimerKind::Attack);
                    let recover = rng
                        .rng
                        .gen_range(config.min_stagger_recover..=config.max_stagger_recover);
                    timers.start(TimerKind::Stagger, recover);
                }
            }
        } else {
            // Смерть: терминальна, труп нельзя ударить повторно
            *character = CharacterState::Dead;
            *action = ActionState::Occupied;
            *command = MovementCommand::Stop;
            capsule.enabled = false;
            bar.visible = false;

            if let Some((mut state, mut timers, _, _)) = enemy {
                *state = EnemyState::Dead;
                timers.clear_all();
            }
            if let Some(equipped) = equipped {
                if let Ok(mut collision) = weapons.get_mut(equipped.0) {
                    collision.enabled = false;
                }
            }

            // Поза смерти — косметика; без death montage шаг пропускается
            if let Some(death) = library.death {
                let pose = rng.rng.gen_range(0..death.sections);
                commands
                    .entity(event.target)
                    .insert(DeathPose { pose })
                    .insert(ActiveMontage::play(MontageKind::Death, pose, &death, 1.0));
            }
            commands.entity(event.target).insert(DespawnAfter {
                remaining: agent.corpse_lifespan,
            });
            log_info(&format!("💀 Agent {:?} died", event.target));
            died_events.write(EntityDied {
                entity: event.target,
            });
        }
    }
}

/// Деспавн трупов: таймаут вышел → агент и его оружие удаляются
pub fn tick_despawn(
    mut query: Query<(Entity, &mut DespawnAfter, Option<&EquippedWeapon>)>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
) {
    let delta = time.delta_secs();

    for (entity, mut despawn, equipped) in query.iter_mut() {
        despawn.remaining -= delta;
        if despawn.remaining <= 0.0 {
            if let Some(equipped) = equipped {
                if let Ok(mut weapon) = commands.get_entity(equipped.0) {
                    weapon.despawn();
                }
            }
            if let Ok(mut agent) = commands.get_entity(entity) {
                agent.despawn();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_at_origin() -> Transform {
        // Identity rotation: forward = -Z, right = +X
        Transform::from_xyz(0.0, 0.0, 0.0)
    }

    #[test]
    fn test_hit_from_front() {
        let t = agent_at_origin();
        assert_eq!(hit_direction(&t, Vec3::new(0.0, 0.0, -1.0)), HitDirection::Front);
    }

    #[test]
    fn test_hit_from_right() {
        let t = agent_at_origin();
        assert_eq!(hit_direction(&t, Vec3::new(1.0, 0.0, 0.0)), HitDirection::Right);
    }

    #[test]
    fn test_hit_from_left() {
        let t = agent_at_origin();
        assert_eq!(hit_direction(&t, Vec3::new(-1.0, 0.0, 0.0)), HitDirection::Left);
    }

    #[test]
    fn test_hit_from_back() {
        let t = agent_at_origin();
        assert_eq!(hit_direction(&t, Vec3::new(0.0, 0.0, 1.0)), HitDirection::Back);
    }

    #[test]
    fn test_bucket_boundaries() {
        let t = agent_at_origin();
        let at_angle = |deg: f32| {
            let rad = deg.to_radians();
            // Положительный угол = справа от forward (-Z)
            Vec3::new(rad.sin(), 0.0, -rad.cos())
        };

        assert_eq!(hit_direction(&t, at_angle(-44.0)), HitDirection::Front);
        assert_eq!(hit_direction(&t, at_angle(-46.0)), HitDirection::Left);
        assert_eq!(hit_direction(&t, at_angle(44.0)), HitDirection::Front);
        assert_eq!(hit_direction(&t, at_angle(46.0)), HitDirection::Right);
        assert_eq!(hit_direction(&t, at_angle(134.0)), HitDirection::Right);
        assert_eq!(hit_direction(&t, at_angle(136.0)), HitDirection::Back);
        assert_eq!(hit_direction(&t, at_angle(-136.0)), HitDirection::Back);
    }

    #[test]
    fn test_bucket_exact_edges() {
        // Границы как в reaction-таблице: −45° не фронт, а «провал» в Back
        assert_eq!(bucket_theta(0.0), HitDirection::Front);
        assert_eq!(bucket_theta(-45.0), HitDirection::Back);
        assert_eq!(bucket_theta(45.0), HitDirection::Right);
        assert_eq!(bucket_theta(-135.0), HitDirection::Left);
        assert_eq!(bucket_theta(135.0), HitDirection::Back);
        assert_eq!(bucket_theta(180.0), HitDirection::Back);
    }

    #[test]
    fn test_vertical_component_ignored() {
        let t = agent_at_origin();
        // Удар сверху-спереди проецируется в плоскость
        assert_eq!(
            hit_direction(&t, Vec3::new(0.0, 5.0, -1.0)),
            HitDirection::Front
        );
    }

    #[test]
    fn test_degenerate_impact_is_front() {
        let t = agent_at_origin();
        assert_eq!(hit_direction(&t, Vec3::ZERO), HitDirection::Front);
    }

    #[test]
    fn test_rotated_agent() {
        // Агент смотрит на +X: удар с +X — фронтальный
        let t = Transform::from_xyz(0.0, 0.0, 0.0)
            .looking_at(Vec3::new(1.0, 0.0, 0.0), Vec3::Y);
        assert_eq!(hit_direction(&t, Vec3::new(1.0, 0.0, 0.0)), HitDirection::Front);
        assert_eq!(hit_direction(&t, Vec3::new(-1.0, 0.0, 0.0)), HitDirection::Back);
    }
}

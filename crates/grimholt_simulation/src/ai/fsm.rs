//! Enemy FSM: patrol → chase → search → engage → attack, плюс stagger/death
//!
//! Машина «ленивых» переходов: evaluate_* системы каждый тик перепроверяют
//! дистанции/видимость, single-shot таймеры моделируют паузы (wait before
//! attack, patrol idle, stagger recovery, search timeout). Callback'ов от
//! навигации нет — прибытие детектится перепроверкой дистанции.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::components::{
    AgentTimers, CombatTarget, Enemy, EnemyConfig, EnemyState, PatrolRoute, TimerFired, TimerKind,
};
use crate::ai::perception::{PawnSeen, SightCone, SightMemory};
use crate::animation::{ActiveMontage, MontageKind, MontageLibrary};
use crate::combat::attack::AttackIntent;
use crate::components::{
    ActionState, Attributes, CharacterState, HealthBar, Hero, MovementCommand, MovementSpeed,
};
use crate::{log_info, DeterministicRng};

/// Полная евклидова дистанция ≤ radius. None-цель всегда вне радиуса.
pub fn in_target_range(from: Vec3, to: Vec3, radius: f32) -> bool {
    from.distance(to) <= radius
}

/// Экипирован ли агент чем-то атакующим
pub fn is_armed(character: CharacterState) -> bool {
    matches!(
        character,
        CharacterState::EquippedOneHand
            | CharacterState::EquippedTwoHand
            | CharacterState::EquippedThrow
            | CharacterState::EquippedDualHand
    )
}

/// Легальность начала атаки: свободен, жив, вооружён, цель в attack radius
pub fn can_attack(
    action: ActionState,
    character: CharacterState,
    attrs: &Attributes,
    in_attack_range: bool,
) -> bool {
    action == ActionState::Unoccupied && attrs.is_alive() && is_armed(character) && in_attack_range
}

fn chase(
    state: &mut EnemyState,
    command: &mut MovementCommand,
    speed: &mut MovementSpeed,
    config: &EnemyConfig,
    target: Entity,
) {
    *state = EnemyState::Chasing;
    speed.speed = config.chasing_speed;
    *command = MovementCommand::FollowEntity {
        target,
        acceptance: config.move_acceptance_radius,
    };
}

fn lose_interest(target: &mut CombatTarget, bar: &mut HealthBar) {
    target.0 = None;
    bar.visible = false;
}

fn start_patrolling(
    state: &mut EnemyState,
    command: &mut MovementCommand,
    speed: &mut MovementSpeed,
    config: &EnemyConfig,
) {
    *state = EnemyState::Patrolling;
    speed.speed = config.patrolling_speed;
    // Move order выдаст evaluate_patrol (push к текущему waypoint'у)
    *command = MovementCommand::Stop;
}

/// Perception callback: враг увидел hero → погоня
///
/// Guards: не мёртв, не в stagger'е, не engaged и не в замахе.
pub fn handle_pawn_seen(
    mut seen_events: EventReader<PawnSeen>,
    mut enemies: Query<
        (
            &mut EnemyState,
            &mut CombatTarget,
            &mut AgentTimers,
            &mut MovementCommand,
            &mut MovementSpeed,
            &EnemyConfig,
        ),
        With<Enemy>,
    >,
    heroes: Query<(), With<Hero>>,
) {
    for event in seen_events.read() {
        if heroes.get(event.pawn).is_err() {
            continue;
        }
        let Ok((mut state, mut target, mut timers, mut command, mut speed, config)) =
            enemies.get_mut(event.observer)
        else {
            continue;
        };

        if matches!(
            *state,
            EnemyState::Dead | EnemyState::Staggered | EnemyState::Engaged | EnemyState::Attacking
        ) {
            continue;
        }

        target.0 = Some(event.pawn);
        timers.clear(TimerKind::Patrol);
        timers.clear(TimerKind::Search);
        log_info(&format!(
            "🏃 Enemy {:?} chasing hero {:?}",
            event.observer, event.pawn
        ));
        chase(&mut state, &mut command, &mut speed, config, event.pawn);
    }
}

/// Боевая оценка: каждый тик, пока есть combat target
///
/// Порядок веток: вне combat radius → потеря интереса; видимая цель вне
/// attack radius → погоня; цель невидима → search; цель в attack radius →
/// engage + attack timer. Dead и Staggered не оцениваются вовсе.
#[allow(clippy::type_complexity)]
pub fn evaluate_combat(
    mut enemies: Query<
        (
            Entity,
            &mut EnemyState,
            &mut CombatTarget,
            &mut AgentTimers,
            &mut MovementCommand,
            &mut MovementSpeed,
            &mut HealthBar,
            &mut Transform,
            &SightMemory,
            &EnemyConfig,
            &ActionState,
            &CharacterState,
            &Attributes,
            &MontageLibrary,
        ),
        With<Enemy>,
    >,
    targets: Query<(&Transform, &Attributes), Without<Enemy>>,
    mut rng: ResMut<DeterministicRng>,
    mut commands: Commands,
) {
    for (
        entity,
        mut state,
        mut target,
        mut timers,
        mut command,
        mut speed,
        mut bar,
        mut transform,
        memory,
        config,
        action,
        character,
        attrs,
        library,
    ) in enemies.iter_mut()
    {
        if matches!(*state, EnemyState::Dead | EnemyState::Staggered) {
            continue;
        }
        let Some(target_entity) = target.0 else {
            // Остался без цели после переоценки (конец замаха) — в патруль
            if *state == EnemyState::NoState {
                start_patrolling(&mut state, &mut command, &mut speed, config);
            }
            continue;
        };

        // Цель деспавнулась или умерла — интерес терять немедленно
        let Ok((target_transform, target_attrs)) = targets.get(target_entity) else {
            lose_interest(&mut target, &mut bar);
            timers.clear(TimerKind::Attack);
            start_patrolling(&mut state, &mut command, &mut speed, config);
            continue;
        };
        if !target_attrs.is_alive() {
            lose_interest(&mut target, &mut bar);
            timers.clear(TimerKind::Attack);
            start_patrolling(&mut state, &mut command, &mut speed, config);
            continue;
        }

        let here = transform.translation;
        let there = target_transform.translation;
        let in_combat_range = in_target_range(here, there, config.combat_radius);
        let in_attack_range = in_target_range(here, there, config.attack_radius);
        let visible = memory.sees(target_entity);

        if !in_combat_range {
            timers.clear(TimerKind::Attack);
            lose_interest(&mut target, &mut bar);
            // Мидл-замах доигрывает; конец montage приведёт в NoState → патруль
            if *state != EnemyState::Attacking {
                log_info(&format!("🚶 Enemy {:?} lost interest, patrolling", entity));
                start_patrolling(&mut state, &mut command, &mut speed, config);
            }
        } else if !in_attack_range
            && visible
            && *state != EnemyState::Chasing
            && *state != EnemyState::Searching
            && *state != EnemyState::Attacking
        {
            timers.clear(TimerKind::Attack);
            log_info(&format!("🏃 Enemy {:?} chasing", entity));
            chase(&mut state, &mut command, &mut speed, config, target_entity);
        } else if !visible && *state != EnemyState::Attacking && *state != EnemyState::Searching {
            // Цель пропала из конуса — осмотреться на месте
            timers.clear(TimerKind::Attack);
            *state = EnemyState::Searching;
            *command = MovementCommand::Stop;
            commands.entity(entity).insert(ActiveMontage::play(
                MontageKind::LookAround,
                0,
                &library.look_around,
                1.0,
            ));
            let timeout = library.look_around.section_seconds * config.search_loop_count;
            timers.start(TimerKind::Search, timeout);
            log_info(&format!("🔍 Enemy {:?} searching ({timeout:.1}s)", entity));
        } else if in_attack_range
            && visible
            && *state != EnemyState::Engaged
            && *state != EnemyState::Attacking
        {
            *state = EnemyState::Engaged;
            *command = MovementCommand::Stop;
            if can_attack(*action, *character, attrs, in_attack_range) {
                let wait = rng
                    .rng
                    .gen_range(config.min_wait_before_attack..=config.max_wait_before_attack);
                timers.start(TimerKind::Attack, wait);
                log_info(&format!("⚔️ Enemy {:?} engaged, attack in {wait:.2}s", entity));
            }
        }

        // Доворот на цель в ближнем бою — sweep идёт вдоль forward,
        // strafe'ящийся герой иначе остался бы вне лезвия
        if matches!(*state, EnemyState::Engaged | EnemyState::Attacking) {
            let mut dir = there - here;
            dir.y = 0.0;
            if dir.length_squared() > f32::EPSILON {
                transform.look_to(dir, Vec3::Y);
            }
        }
    }
}

/// Патрульная оценка: только для Patrolling
///
/// Прибытие на waypoint → сразу перевыбор следующего + patrol timer;
/// сам move order выдаётся когда таймер отработает. Стоящий patroller
/// без pending таймера подталкивается к текущей точке (spawn push).
pub fn evaluate_patrol(
    mut enemies: Query<
        (
            &EnemyState,
            &mut PatrolRoute,
            &mut AgentTimers,
            &mut MovementCommand,
            &mut MovementSpeed,
            &Transform,
            &EnemyConfig,
        ),
        With<Enemy>,
    >,
    mut rng: ResMut<DeterministicRng>,
) {
    for (state, mut route, mut timers, mut command, mut speed, transform, config) in
        enemies.iter_mut()
    {
        if *state != EnemyState::Patrolling {
            continue;
        }
        let Some(point) = route.current_point() else {
            continue;
        };

        if timers.is_pending(TimerKind::Patrol) {
            continue;
        }

        if in_target_range(transform.translation, point, config.patrol_radius) {
            route.choose_next(&mut rng.rng);
            let wait = rng
                .rng
                .gen_range(config.min_wait_before_patrol..=config.max_wait_before_patrol);
            timers.start(TimerKind::Patrol, wait);
        } else if matches!(*command, MovementCommand::Idle | MovementCommand::Stop) {
            speed.speed = config.patrolling_speed;
            *command = MovementCommand::MoveToPosition {
                target: point,
                acceptance: config.move_acceptance_radius,
            };
        }
    }
}

/// Обработка отработавших single-shot таймеров
#[allow(clippy::type_complexity)]
pub fn handle_timer_fired(
    mut fired_events: EventReader<TimerFired>,
    mut enemies: Query<
        (
            &mut EnemyState,
            &mut ActionState,
            &mut CombatTarget,
            &mut AgentTimers,
            &mut MovementCommand,
            &mut MovementSpeed,
            &mut SightCone,
            &mut HealthBar,
            &PatrolRoute,
            &Transform,
            &EnemyConfig,
            &CharacterState,
            &Attributes,
            &SightMemory,
            Option<&ActiveMontage>,
        ),
        With<Enemy>,
    >,
    targets: Query<&Transform, Without<Enemy>>,
    mut attack_events: EventWriter<AttackIntent>,
    mut commands: Commands,
) {
    for event in fired_events.read() {
        let Ok((
            mut state,
            mut action,
            mut target,
            mut timers,
            mut command,
            mut speed,
            mut cone,
            mut bar,
            route,
            transform,
            config,
            character,
            attrs,
            memory,
            montage,
        )) = enemies.get_mut(event.entity)
        else {
            continue;
        };

        if *state == EnemyState::Dead {
            continue;
        }

        match event.kind {
            TimerKind::Attack => {
                let in_attack_range = target
                    .0
                    .and_then(|t| targets.get(t).ok())
                    .map(|t| {
                        in_target_range(transform.translation, t.translation, config.attack_radius)
                    })
                    .unwrap_or(false);

                if can_attack(*action, *character, attrs, in_attack_range) {
                    *state = EnemyState::Attacking;
                    attack_events.write(AttackIntent {
                        entity: event.entity,
                    });
                } else {
                    // Атака сорвалась — переоценка на следующем тике
                    *state = EnemyState::NoState;
                }
            }
            TimerKind::Patrol => {
                // Запоздалый patrol-таймер не должен перебивать погоню/бой
                if *state != EnemyState::Patrolling {
                    continue;
                }
                if let Some(point) = route.current_point() {
                    speed.speed = config.patrolling_speed;
                    *command = MovementCommand::MoveToPosition {
                        target: point,
                        acceptance: config.move_acceptance_radius,
                    };
                }
            }
            TimerKind::Stagger => {
                // Recovery: встал, переоценка на следующем тике
                *action = ActionState::Unoccupied;
                *state = EnemyState::NoState;
                if matches!(montage, Some(m) if m.kind == MontageKind::HitReact) {
                    commands.entity(event.entity).remove::<ActiveMontage>();
                }
                log_info(&format!("💪 Enemy {:?} recovered from stagger", event.entity));
            }
            TimerKind::Search => {
                // Так никого и не высмотрел — обратно в патруль
                let still_lost = target.0.map(|t| !memory.sees(t)).unwrap_or(true);
                if *state == EnemyState::Searching && still_lost {
                    cone.reset();
                    lose_interest(&mut target, &mut bar);
                    timers.clear(TimerKind::Attack);
                    commands.entity(event.entity).remove::<ActiveMontage>();
                    log_info(&format!("🚶 Enemy {:?} gave up searching", event.entity));
                    start_patrolling(&mut state, &mut command, &mut speed, config);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_target_range_boundary() {
        let a = Vec3::ZERO;
        let b = Vec3::new(3.0, 0.0, 4.0); // дистанция 5
        assert!(in_target_range(a, b, 5.0));
        assert!(!in_target_range(a, b, 4.99));
    }

    #[test]
    fn test_range_uses_full_distance_not_planar() {
        let a = Vec3::ZERO;
        let b = Vec3::new(0.0, 4.0, 3.0); // вертикаль учитывается
        assert!(!in_target_range(a, b, 4.5));
        assert!(in_target_range(a, b, 5.0));
    }

    #[test]
    fn test_can_attack_requires_weapon() {
        let attrs = Attributes::default();
        assert!(!can_attack(
            ActionState::Unoccupied,
            CharacterState::Unequipped,
            &attrs,
            true
        ));
        assert!(can_attack(
            ActionState::Unoccupied,
            CharacterState::EquippedOneHand,
            &attrs,
            true
        ));
    }

    #[test]
    fn test_can_attack_requires_free_and_alive_and_range() {
        let mut attrs = Attributes::default();
        assert!(!can_attack(
            ActionState::Attacking,
            CharacterState::EquippedOneHand,
            &attrs,
            true
        ));
        assert!(!can_attack(
            ActionState::Unoccupied,
            CharacterState::EquippedOneHand,
            &attrs,
            false
        ));

        attrs.take_damage(1000.0);
        assert!(!can_attack(
            ActionState::Unoccupied,
            CharacterState::EquippedOneHand,
            &attrs,
            true
        ));
    }

    #[test]
    fn test_every_equipped_state_counts_as_armed() {
        assert!(is_armed(CharacterState::EquippedOneHand));
        assert!(is_armed(CharacterState::EquippedTwoHand));
        assert!(is_armed(CharacterState::EquippedThrow));
        assert!(is_armed(CharacterState::EquippedDualHand));
        assert!(!is_armed(CharacterState::Unequipped));
        assert!(!is_armed(CharacterState::Dead));
    }
}

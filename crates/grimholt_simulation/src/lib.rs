//! Grimholt Simulation — headless gameplay-логика action-combat игры
//!
//! Стратегический слой на Bevy ECS: агенты (hero/enemy), оружие и melee
//! резолвер, enemy FSM (patrol → chase → search → engage → stagger → dead).
//! Тактический слой (рендер, анимации, физика, navmesh, input) — внешний
//! хост, общение через узкие контракты: компоненты-команды и события.
//!
//! Вся игровая логика тикает в FixedUpdate @ 60Hz, источник случайности —
//! seeded ChaCha8: одинаковый seed ⇒ одинаковая симуляция.

pub mod ai;
pub mod animation;
pub mod combat;
pub mod components;
pub mod logger;
pub mod movement;

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use ai::{
    AiPlugin, CombatTarget, Enemy, EnemyConfig, EnemyState, PatrolRoute, SightCone, SightMemory,
};
pub use animation::{AnimationPlugin, MontageKind, MontageLibrary};
pub use combat::{
    spawn_weapon, AttackIntent, CombatPlugin, DamageDealt, EntityDied, EquipIntent, HitLanded,
    Weapon, WeaponKind,
};
pub use components::{
    ActionState, Agent, Attributes, CharacterState, Hero, MovementCommand, MovementSpeed,
};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger,
    set_logger_if_needed, ConsoleLogger, LogLevel, LogPrinter,
};
pub use movement::MovementPlugin;

/// Порядок подсистем внутри fixed тика
///
/// Жёсткая цепочка — залог детерминизма: перцепция видит позиции прошлого
/// тика, AI решает, анимация тикает, combat резолвит, mover двигает.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    Perception,
    Ai,
    Animation,
    Combat,
    Movement,
    Cleanup,
}

/// Детерминированный RNG симуляции (единственный источник случайности)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Главный плагин симуляции: fixed timestep, порядок подсистем, все домены
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        logger::set_logger_if_needed(Box::new(ConsoleLogger));

        app.insert_resource(Time::<Fixed>::from_hz(60.0))
            .init_resource::<DeterministicRng>()
            .configure_sets(
                FixedUpdate,
                (
                    SimSet::Perception,
                    SimSet::Ai,
                    SimSet::Animation,
                    SimSet::Combat,
                    SimSet::Movement,
                    SimSet::Cleanup,
                )
                    .chain(),
            )
            .register_type::<Agent>()
            .register_type::<Hero>()
            .register_type::<Attributes>()
            .register_type::<ActionState>()
            .register_type::<CharacterState>()
            .register_type::<components::CollisionCapsule>()
            .register_type::<components::HealthBar>()
            .register_type::<components::DespawnAfter>()
            .add_plugins((
                AnimationPlugin,
                AiPlugin,
                CombatPlugin,
                MovementPlugin,
            ));
    }
}

/// Headless App для тестов и сервера: MinimalPlugins + симуляция + seed
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin)
        .insert_resource(DeterministicRng::new(seed));
    app
}

/// Ровно один fixed тик: сдвинуть Time<Fixed> на timestep и прогнать
/// FixedUpdate напрямую. Wall clock не участвует — тесты не флапают.
pub fn step_fixed(app: &mut App) {
    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    app.world_mut()
        .resource_mut::<Time<Fixed>>()
        .advance_by(timestep);
    app.world_mut().run_schedule(FixedUpdate);
}

/// Снапшот состояния мира для сравнения детерминизма
///
/// Строки отсортированы — порядок итерации archetype'ов не влияет.
pub fn world_snapshot(world: &mut World) -> String {
    let mut query = world.query::<(
        Entity,
        &Transform,
        &Attributes,
        &ActionState,
        &CharacterState,
        Option<&EnemyState>,
    )>();

    let mut rows: Vec<String> = query
        .iter(world)
        .map(|(entity, transform, attrs, action, character, enemy_state)| {
            format!(
                "{:?} pos=({:.4},{:.4},{:.4}) hp={:.2} action={:?} char={:?} enemy={:?}",
                entity,
                transform.translation.x,
                transform.translation.y,
                transform.translation.z,
                attrs.health,
                action,
                character,
                enemy_state,
            )
        })
        .collect();
    rows.sort();
    rows.join("\n")
}

//! Enemy AI components: FSM state, config tunables, patrol route, timers

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Маркер врага. Required Components подтягивают весь AI-минимум.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(
    crate::components::Agent,
    EnemyState,
    EnemyConfig,
    CombatTarget,
    PatrolRoute,
    AgentTimers,
    crate::ai::perception::SightCone,
    crate::ai::perception::SightMemory
)]
pub struct Enemy;

/// Enemy FSM состояния
///
/// Dead — терминальное: выхода из него нет.
/// NoState — "переоценить на следующем тике" (после атаки/stagger recovery).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum EnemyState {
    NoState,
    #[default]
    Patrolling,
    Chasing,
    Searching,
    Engaged,
    Attacking,
    Staggered,
    Dead,
}

/// Combat target — слабая ссылка, None = "вне радиуса / не вижу / некого атаковать"
///
/// Чистится при потере интереса; после деспавна цели резолвится в None
/// на месте использования (Query::get по несуществующей entity).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct CombatTarget(pub Option<Entity>);

/// Параметры enemy AI (editor tunables)
///
/// Инвариант: combat_radius ≥ attack_radius ≥ 0.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct EnemyConfig {
    /// Радиус удержания интереса (метры)
    pub combat_radius: f32,
    /// Радиус melee engagement
    pub attack_radius: f32,
    /// Tolerance прибытия на патрульную точку
    pub patrol_radius: f32,
    /// Скорость патрулирования (м/с)
    pub patrolling_speed: f32,
    /// Скорость погони (м/с)
    pub chasing_speed: f32,
    /// Пауза перед атакой: uniform random из [min, max]
    pub min_wait_before_attack: f32,
    pub max_wait_before_attack: f32,
    /// Пауза на патрульной точке: uniform random из [min, max]
    pub min_wait_before_patrol: f32,
    pub max_wait_before_patrol: f32,
    /// Stagger recovery: uniform random из [min, max]
    pub min_stagger_recover: f32,
    pub max_stagger_recover: f32,
    /// Search timeout = длительность look-around секции × loop count
    pub search_loop_count: f32,
    /// Acceptance radius для MoveTo
    pub move_acceptance_radius: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            combat_radius: 10.0,
            attack_radius: 1.9,
            patrol_radius: 2.0,
            patrolling_speed: 1.25,
            chasing_speed: 3.0,
            min_wait_before_attack: 0.5,
            max_wait_before_attack: 1.0,
            min_wait_before_patrol: 5.0,
            max_wait_before_patrol: 10.0,
            min_stagger_recover: 0.5,
            max_stagger_recover: 1.0,
            search_loop_count: 5.0,
            move_acceptance_radius: 0.8,
        }
    }
}

/// Патрульный маршрут: набор waypoint'ов + индекс текущего
///
/// Waypoints неизменяемы в рантайме, меняется только "текущий".
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct PatrolRoute {
    pub waypoints: Vec<Vec3>,
    pub current: usize,
}

impl PatrolRoute {
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        Self {
            waypoints,
            current: 0,
        }
    }

    pub fn current_point(&self) -> Option<Vec3> {
        self.waypoints.get(self.current).copied()
    }

    /// Выбор следующего waypoint: кандидаты = все кроме текущего, uniform random.
    /// Пустой набор кандидатов → остаёмся на текущем (движения не будет).
    pub fn choose_next(&mut self, rng: &mut impl rand::Rng) -> Option<Vec3> {
        let candidates: Vec<usize> = (0..self.waypoints.len())
            .filter(|&i| i != self.current)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        self.current = candidates[rng.gen_range(0..candidates.len())];
        self.current_point()
    }
}

/// Вид single-shot таймера агента
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Attack,
    Patrol,
    Stagger,
    Search,
}

/// Single-shot таймеры агента: максимум один pending на вид
///
/// `start` того же вида вытесняет предыдущий pending.
/// `clear` идемпотентен: снятие несуществующего/отработавшего — no-op.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct AgentTimers {
    attack: Option<f32>,
    patrol: Option<f32>,
    stagger: Option<f32>,
    search: Option<f32>,
}

impl AgentTimers {
    fn slot_mut(&mut self, kind: TimerKind) -> &mut Option<f32> {
        match kind {
            TimerKind::Attack => &mut self.attack,
            TimerKind::Patrol => &mut self.patrol,
            TimerKind::Stagger => &mut self.stagger,
            TimerKind::Search => &mut self.search,
        }
    }

    pub fn start(&mut self, kind: TimerKind, seconds: f32) {
        *self.slot_mut(kind) = Some(seconds);
    }

    pub fn clear(&mut self, kind: TimerKind) {
        *self.slot_mut(kind) = None;
    }

    pub fn clear_all(&mut self) {
        self.attack = None;
        self.patrol = None;
        self.stagger = None;
        self.search = None;
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending(kind).is_some()
    }

    pub fn pending(&self, kind: TimerKind) -> Option<f32> {
        match kind {
            TimerKind::Attack => self.attack,
            TimerKind::Patrol => self.patrol,
            TimerKind::Stagger => self.stagger,
            TimerKind::Search => self.search,
        }
    }

    /// Тик всех pending таймеров; возвращает какие отработали (и сняты)
    pub fn tick(&mut self, delta: f32) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        for kind in [
            TimerKind::Attack,
            TimerKind::Patrol,
            TimerKind::Stagger,
            TimerKind::Search,
        ] {
            let slot = self.slot_mut(kind);
            if let Some(remaining) = slot {
                *remaining -= delta;
                if *remaining <= 0.0 {
                    *slot = None;
                    fired.push(kind);
                }
            }
        }
        fired
    }
}

/// Событие: single-shot таймер отработал
#[derive(Event, Debug, Clone)]
pub struct TimerFired {
    pub entity: Entity,
    pub kind: TimerKind,
}

/// Система: тик таймеров всех агентов → TimerFired события
pub fn tick_agent_timers(
    mut query: Query<(Entity, &mut AgentTimers)>,
    time: Res<Time<Fixed>>,
    mut fired_events: EventWriter<TimerFired>,
) {
    let delta = time.delta_secs();

    for (entity, mut timers) in query.iter_mut() {
        for kind in timers.tick(delta) {
            fired_events.write(TimerFired { entity, kind });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_timer_start_supersedes_pending() {
        let mut timers = AgentTimers::default();
        timers.start(TimerKind::Attack, 5.0);
        timers.start(TimerKind::Attack, 1.0);
        assert_eq!(timers.pending(TimerKind::Attack), Some(1.0));

        // Один pending — один fire
        let fired = timers.tick(1.0);
        assert_eq!(fired, vec![TimerKind::Attack]);
        assert!(!timers.is_pending(TimerKind::Attack));
    }

    #[test]
    fn test_timer_clear_is_idempotent() {
        let mut timers = AgentTimers::default();
        timers.start(TimerKind::Patrol, 3.0);
        timers.clear(TimerKind::Patrol);
        timers.clear(TimerKind::Patrol); // Второй clear — no-op
        assert!(!timers.is_pending(TimerKind::Patrol));
        assert!(timers.tick(10.0).is_empty());
    }

    #[test]
    fn test_timer_fires_once() {
        let mut timers = AgentTimers::default();
        timers.start(TimerKind::Stagger, 0.5);
        assert!(timers.tick(0.3).is_empty());
        assert_eq!(timers.tick(0.3), vec![TimerKind::Stagger]);
        assert!(timers.tick(0.3).is_empty());
    }

    #[test]
    fn test_clear_all_cancels_everything() {
        let mut timers = AgentTimers::default();
        timers.start(TimerKind::Attack, 1.0);
        timers.start(TimerKind::Patrol, 1.0);
        timers.start(TimerKind::Search, 1.0);
        timers.clear_all();
        assert!(timers.tick(5.0).is_empty());
    }

    #[test]
    fn test_patrol_route_excludes_current() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut route = PatrolRoute::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
        ]);

        for _ in 0..50 {
            let before = route.current;
            route.choose_next(&mut rng);
            assert_ne!(route.current, before, "выбран текущий waypoint");
        }
    }

    #[test]
    fn test_patrol_route_single_waypoint_stays_put() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut route = PatrolRoute::new(vec![Vec3::ZERO]);
        assert_eq!(route.choose_next(&mut rng), None);
        assert_eq!(route.current, 0);
    }
}

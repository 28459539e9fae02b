//! Enemy AI: perception + FSM (patrol/chase/search/engage/stagger/dead)

pub mod components;
pub mod fsm;
pub mod perception;

use bevy::prelude::*;

pub use components::{
    AgentTimers, CombatTarget, Enemy, EnemyConfig, EnemyState, PatrolRoute, TimerFired, TimerKind,
};
pub use perception::{PawnSeen, SightCone, SightMemory};

use crate::SimSet;

/// Плагин enemy AI
///
/// Порядок внутри тика жёсткий: перцепция → реакция на PawnSeen →
/// боевая/патрульная оценка → тик таймеров → обработка отработавших.
pub struct AiPlugin;

impl Plugin for AiPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PawnSeen>()
            .add_event::<TimerFired>()
            .register_type::<Enemy>()
            .register_type::<EnemyState>()
            .register_type::<EnemyConfig>()
            .register_type::<CombatTarget>()
            .register_type::<PatrolRoute>()
            .register_type::<AgentTimers>()
            .register_type::<SightCone>()
            .register_type::<SightMemory>()
            .add_systems(
                FixedUpdate,
                perception::update_perception.in_set(SimSet::Perception),
            )
            .add_systems(
                FixedUpdate,
                (
                    fsm::handle_pawn_seen,
                    fsm::evaluate_combat,
                    fsm::evaluate_patrol,
                    components::tick_agent_timers,
                    fsm::handle_timer_fired,
                )
                    .chain()
                    .in_set(SimSet::Ai),
            );
    }
}

//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: базовые агенты (Agent, Hero, Attributes, ActionState, CharacterState)
//! - movement: команды перемещения (MovementCommand, MovementSpeed)

pub mod actor;
pub mod movement;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;

//! Movement компоненты: команды перемещения и скорость
//!
//! Навигация — внешний сервис ("иди в точку, стоп внутри acceptance radius").
//! ECS пишет MovementCommand, адаптер в movement::drive_agents исполняет.
//! Прибытие AI определяет сам, перепроверяя дистанцию каждый тик — callback'а нет.

use bevy::prelude::*;

/// Команда движения для агента
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum MovementCommand {
    /// Стоять на месте
    Idle,
    /// Остановиться немедленно (прервать текущий маршрут)
    Stop,
    /// Двигаться к точке
    MoveToPosition { target: Vec3, acceptance: f32 },
    /// Следовать за entity (target обновляется каждый тик)
    FollowEntity { target: Entity, acceptance: f32 },
}

impl Default for MovementCommand {
    fn default() -> Self {
        Self::Idle
    }
}

/// Скорость движения (метры/сек). AI переключает patrol/chase скорости.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct MovementSpeed {
    pub speed: f32,
}

impl Default for MovementSpeed {
    fn default() -> Self {
        Self { speed: 1.25 }
    }
}

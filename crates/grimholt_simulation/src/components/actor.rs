//! Базовые компоненты агентов: Agent, Hero, Attributes, state machines

use bevy::prelude::*;

/// Агент (hero или enemy) — базовый компонент участника боя
///
/// Автоматически добавляет боевой минимум через Required Components:
/// атрибуты, action state, character state, капсулу, movement.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(
    Transform,
    Attributes,
    ActionState,
    CharacterState,
    CollisionCapsule,
    HealthBar,
    crate::components::MovementCommand,
    crate::components::MovementSpeed,
    crate::animation::MontageLibrary
)]
pub struct Agent {
    /// Stable ID фракции (враги между собой friendly fire не наносят)
    pub faction_id: u64,
    /// Сколько секунд труп лежит до деспавна
    pub corpse_lifespan: f32,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            faction_id: 0,
            corpse_lifespan: 8.0,
        }
    }
}

/// Маркер игрока ("Hero" tag). Перцепция врагов ищет только таких.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Agent)]
pub struct Hero;

/// Action state — гейт на легальность новых действий
///
/// Канонический цикл: Unoccupied → Occupied/Attacking/HitReaction → Unoccupied
/// (возврат по окончании montage или по stagger-recovery таймеру).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum ActionState {
    #[default]
    Unoccupied,
    Occupied,
    Attacking,
    HitReaction,
}

/// Character state — производная от типа экипированного оружия
///
/// Определяет какой пул атакующих анимаций выбирается.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum CharacterState {
    #[default]
    Unequipped,
    EquippedOneHand,
    EquippedTwoHand,
    EquippedThrow,
    EquippedDualHand,
    Dead,
}

/// Атрибуты агента (Attribute Store)
///
/// Инвариант: 0 ≤ health ≤ max_health. Чистая мутация данных —
/// оповещение наблюдателей (health bar) лежит на вызывающем.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Attributes {
    pub health: f32,
    pub max_health: f32,
    pub stamina: f32,
    pub max_stamina: f32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self::new(100.0, 100.0)
    }
}

impl Attributes {
    pub fn new(max_health: f32, max_stamina: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            stamina: max_stamina,
            max_stamina,
        }
    }

    /// Урон с floor'ом на нуле; на мёртвом — no-op
    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount.max(0.0)).max(0.0);
    }

    pub fn health_percent(&self) -> f32 {
        self.health / self.max_health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn consume_stamina(&mut self, cost: f32) {
        self.stamina = (self.stamina - cost).max(0.0);
    }

    pub fn regen_stamina(&mut self, amount: f32) {
        self.stamina = (self.stamina + amount).min(self.max_stamina);
    }
}

/// Капсула агента как цель для weapon sweep
///
/// Выключается на смерти — труп нельзя ударить повторно.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct CollisionCapsule {
    pub enabled: bool,
    pub radius: f32,
}

impl Default for CollisionCapsule {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 0.35,
        }
    }
}

/// Health bar overlay flag (UI-коллаборатор читает видимость + health_percent)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct HealthBar {
    pub visible: bool,
}

/// Труп деспавнится после таймаута (вместе со своим оружием)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct DespawnAfter {
    pub remaining: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_damage_clamps_at_zero() {
        let mut attrs = Attributes::new(100.0, 100.0);

        attrs.take_damage(40.0);
        attrs.take_damage(40.0);
        assert_eq!(attrs.health, 20.0);
        assert!(attrs.is_alive());

        attrs.take_damage(40.0); // Клампится в 0
        assert_eq!(attrs.health, 0.0);
        assert!(!attrs.is_alive());

        attrs.take_damage(40.0); // Уже мёртв — no-op
        assert_eq!(attrs.health, 0.0);
    }

    #[test]
    fn test_health_percent_round_trip() {
        let mut attrs = Attributes::new(100.0, 100.0);
        attrs.take_damage(30.0);
        assert_eq!(attrs.health_percent(), 0.70);
    }

    #[test]
    fn test_negative_damage_ignored() {
        let mut attrs = Attributes::new(100.0, 100.0);
        attrs.take_damage(-25.0);
        assert_eq!(attrs.health, 100.0);
    }

    #[test]
    fn test_stamina_consume_regen() {
        let mut attrs = Attributes::new(100.0, 100.0);
        attrs.consume_stamina(30.0);
        assert_eq!(attrs.stamina, 70.0);

        attrs.regen_stamina(100.0); // Clamp на max
        assert_eq!(attrs.stamina, 100.0);
    }
}

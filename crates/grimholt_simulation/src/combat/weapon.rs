//! Weapon entity + hit resolver (box sweep вдоль forward владельца)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::animation::{AnimNotify, Notify};
use crate::combat::damage::HitLanded;
use crate::components::{Agent, Attributes, CharacterState, CollisionCapsule};
use crate::log_info;

/// Тип оружия — неизменяем для экземпляра
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum WeaponKind {
    OneHand,
    TwoHand,
    Throw,
    BothHands,
}

impl WeaponKind {
    /// Character state, который даёт экипировка этого оружия
    pub fn character_state(self) -> CharacterState {
        match self {
            WeaponKind::OneHand => CharacterState::EquippedOneHand,
            WeaponKind::TwoHand => CharacterState::EquippedTwoHand,
            WeaponKind::Throw => CharacterState::EquippedThrow,
            WeaponKind::BothHands => CharacterState::EquippedDualHand,
        }
    }
}

/// Оружие — отдельная entity со ссылкой на владельца
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(WeaponTrace, WeaponCollision, WeaponSocket)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub damage: f32,
    pub owner: Option<Entity>,
}

impl Weapon {
    pub fn new(kind: WeaponKind, damage: f32) -> Self {
        Self {
            kind,
            damage,
            owner: None,
        }
    }
}

/// Геометрия sweep'а: отрезок вдоль forward владельца (метры от его позиции)
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct WeaponTrace {
    pub start: f32,
    pub end: f32,
    pub half_extent: f32,
}

impl Default for WeaponTrace {
    fn default() -> Self {
        Self {
            start: 0.4,
            end: 1.6,
            half_extent: 0.15,
        }
    }
}

/// Где оружие прикреплено (cosmetic, читает хост)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum WeaponSocket {
    MainHand,
    #[default]
    Back,
}

/// Состояние hitbox'а оружия
///
/// `ignore` — кого этот замах уже ударил (один хит на замах на цель);
/// чистится при включении trace (начало нового замаха).
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct WeaponCollision {
    pub enabled: bool,
    pub ignore: Vec<Entity>,
}

/// Ссылка агента на экипированное оружие
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct EquippedWeapon(pub Entity);

/// Событие: агент подбирает/экипирует оружие
#[derive(Event, Debug, Clone)]
pub struct EquipIntent {
    pub agent: Entity,
    pub weapon: Entity,
}

/// Spawn готового к экипировке оружия (лежит «за спиной», trace выключен)
pub fn spawn_weapon(commands: &mut Commands, kind: WeaponKind, damage: f32) -> Entity {
    commands.spawn(Weapon::new(kind, damage)).id()
}

/// Экипировка: owner back-ref, рука, character state по типу оружия
pub fn equip_weapons(
    mut equip_events: EventReader<EquipIntent>,
    mut weapons: Query<(&mut Weapon, &mut WeaponSocket)>,
    mut agents: Query<(&mut CharacterState, &Attributes), With<Agent>>,
    mut commands: Commands,
) {
    for event in equip_events.read() {
        let Ok((mut weapon, mut socket)) = weapons.get_mut(event.weapon) else {
            continue;
        };
        let Ok((mut character, attrs)) = agents.get_mut(event.agent) else {
            continue;
        };
        if !attrs.is_alive() || *character == CharacterState::Dead {
            continue;
        }

        weapon.owner = Some(event.agent);
        *socket = WeaponSocket::MainHand;
        *character = weapon.kind.character_state();
        commands.entity(event.agent).insert(EquippedWeapon(event.weapon));
        log_info(&format!(
            "🗡️ Agent {:?} equipped {:?} weapon {:?}",
            event.agent, weapon.kind, event.weapon
        ));
    }
}

/// Anim-notify от хоста: фазы замаха и перехват оружия между сокетами
pub fn apply_anim_notifies(
    mut notify_events: EventReader<AnimNotify>,
    agents: Query<&EquippedWeapon>,
    mut weapons: Query<(&mut WeaponCollision, &mut WeaponSocket)>,
) {
    for event in notify_events.read() {
        let Ok(equipped) = agents.get(event.entity) else {
            continue;
        };
        let Ok((mut collision, mut socket)) = weapons.get_mut(equipped.0) else {
            continue;
        };

        match event.notify {
            Notify::EnableWeaponTrace => {
                // Новый замах: прежние жертвы снова легальные цели
                collision.ignore.clear();
                collision.enabled = true;
            }
            Notify::DisableWeaponTrace => {
                collision.enabled = false;
            }
            Notify::ArmWeapon => {
                *socket = WeaponSocket::MainHand;
            }
            Notify::DisarmWeapon => {
                *socket = WeaponSocket::Back;
            }
        }
    }
}

/// Параметр ближайшей точки отрезка [p0, p1] к point, плюс дистанция
fn closest_on_segment(p0: Vec3, p1: Vec3, point: Vec3) -> (f32, f32) {
    let seg = p1 - p0;
    let len_sq = seg.length_squared();
    if len_sq < f32::EPSILON {
        return (0.0, point.distance(p0));
    }
    let t = ((point - p0).dot(seg) / len_sq).clamp(0.0, 1.0);
    (t, point.distance(p0 + seg * t))
}

/// Hit resolver: каждый тик, пока hitbox включён
///
/// Отрезок от owner_pos + forward*start до owner_pos + forward*end.
/// Первый хит = наименьший параметр вдоль отрезка. Своя фракция
/// пропускается целиком (ни урона, ни записи в ignore).
#[allow(clippy::type_complexity)]
pub fn resolve_weapon_sweeps(
    mut weapons: Query<(&Weapon, &WeaponTrace, &mut WeaponCollision)>,
    owners: Query<(&Transform, &Agent)>,
    candidates: Query<(Entity, &Transform, &Agent, &Attributes, &CollisionCapsule)>,
    mut hit_events: EventWriter<HitLanded>,
) {
    for (weapon, trace, mut collision) in weapons.iter_mut() {
        if !collision.enabled {
            continue;
        }
        let Some(owner) = weapon.owner else {
            continue;
        };
        let Ok((owner_transform, owner_agent)) = owners.get(owner) else {
            continue;
        };

        let forward = owner_transform.forward().as_vec3();
        let p0 = owner_transform.translation + forward * trace.start;
        let p1 = owner_transform.translation + forward * trace.end;

        let mut best: Option<(Entity, f32, Vec3)> = None;
        for (candidate, transform, agent, attrs, capsule) in candidates.iter() {
            if candidate == owner
                || !capsule.enabled
                || !attrs.is_alive()
                || collision.ignore.contains(&candidate)
            {
                continue;
            }
            // Friendly fire между своими не наносится
            if agent.faction_id == owner_agent.faction_id {
                continue;
            }

            let (t, dist) = closest_on_segment(p0, p1, transform.translation);
            if dist <= capsule.radius + trace.half_extent
                && best.map(|(_, best_t, _)| t < best_t).unwrap_or(true)
            {
                let impact = p0 + (p1 - p0) * t;
                best = Some((candidate, t, impact));
            }
        }

        if let Some((target, _, impact_point)) = best {
            collision.ignore.push(target);
            hit_events.write(HitLanded {
                target,
                attacker: owner,
                damage: weapon.damage,
                impact_point,
            });
        }
    }
}

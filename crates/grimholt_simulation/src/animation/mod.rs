//! Animation montage contract (strategic layer)
//!
//! Реальное проигрывание/блендинг анимаций — дело engine tactical layer.
//! Симуляции важен только контракт:
//! - "play montage section со скоростью X" → компонент `ActiveMontage`
//! - countdown секции → событие `MontageEnded { interrupted: false }`
//! - снятие компонента до конца → "montage прерван"
//! - anim-notify из середины клипа (включить hitbox, перехват оружия в руку)
//!   моделируется событием `AnimNotify`, которое шлёт хост

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Какой montage играет. Attack-пул выбирается по типу оружия.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum MontageKind {
    AttackOneHand,
    AttackTwoHand,
    HitReact,
    Death,
    LookAround,
}

/// Описание montage: сколько секций и длительность одной секции
#[derive(Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
pub struct MontageSet {
    pub sections: u32,
    pub section_seconds: f32,
}

impl MontageSet {
    pub const fn new(sections: u32, section_seconds: f32) -> Self {
        Self {
            sections,
            section_seconds,
        }
    }
}

/// Каталог montage'ей агента (editor tunables)
///
/// `death: None` = смертельная поза не сконфигурирована; косметический шаг
/// выбора позы пропускается, gameplay-переходы смерти выполняются всё равно.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct MontageLibrary {
    pub attack_one_hand: MontageSet,
    pub attack_two_hand: MontageSet,
    pub hit_react: MontageSet,
    pub look_around: MontageSet,
    pub death: Option<MontageSet>,
    pub attack_speed: f32,
}

impl Default for MontageLibrary {
    fn default() -> Self {
        Self {
            attack_one_hand: MontageSet::new(4, 1.2),
            attack_two_hand: MontageSet::new(3, 1.5),
            hit_react: MontageSet::new(4, 0.8),
            look_around: MontageSet::new(1, 2.0),
            death: Some(MontageSet::new(4, 2.0)),
            attack_speed: 1.0,
        }
    }
}

/// Играющий montage (один на агента; insert поверх = прежний прерван)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ActiveMontage {
    pub kind: MontageKind,
    pub section: u32,
    pub remaining: f32,
    pub speed: f32,
}

impl ActiveMontage {
    /// "PlayMontageSection": секция `section` из `set` со скоростью `speed`
    pub fn play(kind: MontageKind, section: u32, set: &MontageSet, speed: f32) -> Self {
        Self {
            kind,
            section,
            remaining: set.section_seconds / speed.max(0.01),
            speed,
        }
    }
}

/// Событие: montage доиграл (или был прерван снаружи)
#[derive(Event, Debug, Clone)]
pub struct MontageEnded {
    pub entity: Entity,
    pub kind: MontageKind,
    pub interrupted: bool,
}

/// Anim-notify из проигрываемого клипа (внешний коллаборатор → симуляция)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notify {
    /// Активная фаза замаха: включить weapon trace (чистит ignore-список)
    EnableWeaponTrace,
    /// Конец активной фазы: выключить weapon trace
    DisableWeaponTrace,
    /// Перехватить оружие в руку (hand socket)
    ArmWeapon,
    /// Убрать оружие за спину (back socket)
    DisarmWeapon,
}

#[derive(Event, Debug, Clone)]
pub struct AnimNotify {
    pub entity: Entity,
    pub notify: Notify,
}

/// Выбранная поза смерти (uniform random по секциям death montage).
/// Читается anim-blueprint'ом хоста.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct DeathPose {
    pub pose: u32,
}

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MontageEnded>()
            .add_event::<AnimNotify>()
            .register_type::<MontageLibrary>()
            .register_type::<ActiveMontage>()
            .register_type::<DeathPose>()
            .add_systems(
                FixedUpdate,
                advance_montages.in_set(crate::SimSet::Animation),
            );
    }
}

/// Система: countdown играющих montage
///
/// Доигравший montage снимается с entity + MontageEnded(interrupted=false).
pub fn advance_montages(
    mut query: Query<(Entity, &mut ActiveMontage)>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut ended_events: EventWriter<MontageEnded>,
) {
    let delta = time.delta_secs();

    for (entity, mut montage) in query.iter_mut() {
        montage.remaining -= delta;
        if montage.remaining <= 0.0 {
            commands.entity(entity).remove::<ActiveMontage>();
            ended_events.write(MontageEnded {
                entity,
                kind: montage.kind,
                interrupted: false,
            });
        }
    }
}

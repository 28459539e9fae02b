//! Combat: оружие, атаки, урон, смерть

pub mod attack;
pub mod damage;
pub mod weapon;

use bevy::prelude::*;

pub use attack::AttackIntent;
pub use damage::{DamageDealt, EntityDied, HitDirection, HitLanded};
pub use weapon::{
    spawn_weapon, EquipIntent, EquippedWeapon, Weapon, WeaponCollision, WeaponKind, WeaponSocket,
    WeaponTrace,
};

use crate::SimSet;

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<EquipIntent>()
            .add_event::<AttackIntent>()
            .add_event::<HitLanded>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .register_type::<Weapon>()
            .register_type::<WeaponTrace>()
            .register_type::<WeaponSocket>()
            .register_type::<WeaponCollision>()
            .register_type::<EquippedWeapon>()
            .add_systems(
                FixedUpdate,
                (
                    weapon::equip_weapons,
                    attack::begin_attacks,
                    weapon::apply_anim_notifies,
                    weapon::resolve_weapon_sweeps,
                    damage::apply_hits,
                    attack::handle_montage_ended,
                )
                    .chain()
                    .in_set(SimSet::Combat),
            )
            .add_systems(FixedUpdate, damage::tick_despawn.in_set(SimSet::Cleanup));
    }
}

//! Sight perception: конус зрения врага + события обнаружения
//!
//! Видимость = дистанция ≤ radius И угол до цели ≤ half_angle от forward.
//! Окклюзию (line of sight по геометрии) даёт engine tactical layer,
//! симуляция считает только конус.
//!
//! Во время Searching конус расширяется к 180° FOV (враг "озирается"),
//! при выходе из Searching — сброс на базовый угол.

use bevy::prelude::*;

use crate::ai::components::{Enemy, EnemyState};
use crate::components::{Attributes, Hero};
use crate::log_info;

/// Конус зрения врага (editor tunables)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct SightCone {
    /// Дальность зрения (метры)
    pub radius: f32,
    /// Текущая половина угла раствора (градусы); растёт во время Searching
    pub half_angle_deg: f32,
    /// Базовая половина угла, к которой конус сбрасывается
    pub base_half_angle_deg: f32,
    /// Скорость расширения конуса (градусы/сек)
    pub widen_rate: f32,
}

impl Default for SightCone {
    fn default() -> Self {
        Self {
            radius: 18.0,
            half_angle_deg: 45.0,
            base_half_angle_deg: 45.0,
            widen_rate: 15.0,
        }
    }
}

impl SightCone {
    pub fn reset(&mut self) {
        self.half_angle_deg = self.base_half_angle_deg;
    }
}

/// Память перцепции: кто из героев был виден на прошлом тике
///
/// PawnSeen шлётся только на фронте "не видел → увидел",
/// иначе FSM захлёбывается событиями каждый тик.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct SightMemory {
    pub visible: Vec<Entity>,
}

impl SightMemory {
    pub fn sees(&self, pawn: Entity) -> bool {
        self.visible.contains(&pawn)
    }

    pub fn sees_anyone(&self) -> bool {
        !self.visible.is_empty()
    }
}

/// Событие: враг увидел hero
#[derive(Event, Debug, Clone)]
pub struct PawnSeen {
    pub observer: Entity,
    pub pawn: Entity,
}

/// Проверка конуса: target внутри радиуса и угла от forward наблюдателя?
pub fn can_see(observer: &Transform, cone: &SightCone, target_pos: Vec3) -> bool {
    let to_target = target_pos - observer.translation;
    let dist = to_target.length();
    if dist > cone.radius {
        return false;
    }
    if dist < f32::EPSILON {
        return true;
    }

    let forward = observer.forward().as_vec3();
    let cos_angle = forward.dot(to_target / dist).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees() <= cone.half_angle_deg
}

/// Система перцепции: конус зрения каждого живого врага против всех героев
///
/// Мёртвые враги и мёртвые герои из перцепции исключены.
/// Searching расширяет конус, любое другое состояние сбрасывает его.
pub fn update_perception(
    mut enemies: Query<
        (
            Entity,
            &Transform,
            &mut SightCone,
            &mut SightMemory,
            &EnemyState,
        ),
        With<Enemy>,
    >,
    heroes: Query<(Entity, &Transform, &Attributes), With<Hero>>,
    time: Res<Time<Fixed>>,
    mut seen_events: EventWriter<PawnSeen>,
) {
    let delta = time.delta_secs();

    for (observer, transform, mut cone, mut memory, state) in enemies.iter_mut() {
        if *state == EnemyState::Dead {
            memory.visible.clear();
            continue;
        }

        // ExpandSight: озирающийся враг постепенно видит всё шире (до 180° FOV)
        if *state == EnemyState::Searching {
            cone.half_angle_deg = (cone.half_angle_deg + cone.widen_rate * delta).min(90.0);
        } else if cone.half_angle_deg != cone.base_half_angle_deg {
            cone.reset();
        }

        let mut now_visible = Vec::new();
        for (pawn, pawn_transform, attrs) in heroes.iter() {
            if !attrs.is_alive() {
                continue;
            }
            if can_see(transform, &cone, pawn_transform.translation) {
                now_visible.push(pawn);
            }
        }

        for &pawn in &now_visible {
            if !memory.sees(pawn) {
                log_info(&format!("👁️ Enemy {:?} spotted hero {:?}", observer, pawn));
                seen_events.write(PawnSeen { observer, pawn });
            }
        }
        memory.visible = now_visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn looking_along_neg_z() -> Transform {
        // Bevy forward = -Z
        Transform::from_xyz(0.0, 0.0, 0.0)
    }

    #[test]
    fn test_sees_target_in_front() {
        let cone = SightCone::default();
        let t = looking_along_neg_z();
        assert!(can_see(&t, &cone, Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn test_blind_behind() {
        let cone = SightCone::default();
        let t = looking_along_neg_z();
        assert!(!can_see(&t, &cone, Vec3::new(0.0, 0.0, 5.0)));
    }

    #[test]
    fn test_blind_beyond_radius() {
        let cone = SightCone::default();
        let t = looking_along_neg_z();
        assert!(!can_see(&t, &cone, Vec3::new(0.0, 0.0, -50.0)));
    }

    #[test]
    fn test_edge_of_cone() {
        let cone = SightCone::default();
        let t = looking_along_neg_z();
        // 40° от forward — внутри, 50° — снаружи
        let inside = Vec3::new((40.0_f32).to_radians().tan(), 0.0, -1.0);
        let outside = Vec3::new((50.0_f32).to_radians().tan(), 0.0, -1.0);
        assert!(can_see(&t, &cone, inside));
        assert!(!can_see(&t, &cone, outside));
    }

    #[test]
    fn test_widened_cone_sees_flank() {
        let mut cone = SightCone::default();
        let t = looking_along_neg_z();
        let flank = Vec3::new(1.0, 0.0, -0.2); // ~79° от forward

        assert!(!can_see(&t, &cone, flank));
        cone.half_angle_deg = 90.0;
        assert!(can_see(&t, &cone, flank));

        cone.reset();
        assert!(!can_see(&t, &cone, flank));
    }
}

//! Начало атак и возврат action state по окончании montage

use bevy::prelude::*;
use rand::Rng;

use crate::ai::components::EnemyState;
use crate::animation::{ActiveMontage, MontageEnded, MontageKind, MontageLibrary, MontageSet};
use crate::components::{ActionState, Attributes, CharacterState};
use crate::{log_info, DeterministicRng};

/// Событие: агент хочет атаковать (input игрока или attack timer врага)
#[derive(Event, Debug, Clone)]
pub struct AttackIntent {
    pub entity: Entity,
}

/// Пул атакующих анимаций по character state
///
/// Throw использует одноручный пул, BothHands — двуручный:
/// вооружённый агент всегда владеет проигрываемым attack montage.
fn attack_montage(
    character: CharacterState,
    library: &MontageLibrary,
) -> Option<(MontageKind, MontageSet)> {
    match character {
        CharacterState::EquippedOneHand | CharacterState::EquippedThrow => {
            Some((MontageKind::AttackOneHand, library.attack_one_hand))
        }
        CharacterState::EquippedTwoHand | CharacterState::EquippedDualHand => {
            Some((MontageKind::AttackTwoHand, library.attack_two_hand))
        }
        CharacterState::Unequipped | CharacterState::Dead => None,
    }
}

/// Начало атаки: легально только свободному, живому, вооружённому агенту
///
/// Секция — uniform random, без памяти: повтор подряд разрешён.
pub fn begin_attacks(
    mut attack_events: EventReader<AttackIntent>,
    mut agents: Query<(
        &mut ActionState,
        &CharacterState,
        &Attributes,
        &MontageLibrary,
    )>,
    mut rng: ResMut<DeterministicRng>,
    mut commands: Commands,
) {
    for event in attack_events.read() {
        let Ok((mut action, character, attrs, library)) = agents.get_mut(event.entity) else {
            continue;
        };
        if *action != ActionState::Unoccupied || !attrs.is_alive() {
            continue;
        }
        let Some((kind, set)) = attack_montage(*character, library) else {
            continue;
        };

        *action = ActionState::Attacking;
        let section = rng.rng.gen_range(0..set.sections);
        log_info(&format!(
            "⚔️ Agent {:?} attacks: {:?} section {}",
            event.entity, kind, section
        ));
        commands.entity(event.entity).insert(ActiveMontage::play(
            kind,
            section,
            &set,
            library.attack_speed,
        ));
    }
}

/// Канонический цикл действия: доигравший montage освобождает агента
///
/// - attack end → Unoccupied, враг падает в NoState (переоценка);
/// - hit-react end → Unoccupied, если recovery не держит stagger-таймер;
/// - look-around end → replay, пока враг всё ещё Searching;
/// - death montage end → ничего.
#[allow(clippy::type_complexity)]
pub fn handle_montage_ended(
    mut ended_events: EventReader<MontageEnded>,
    mut agents: Query<(
        &mut ActionState,
        &MontageLibrary,
        Option<&mut EnemyState>,
    )>,
    mut commands: Commands,
) {
    for event in ended_events.read() {
        if event.interrupted {
            continue;
        }
        let Ok((mut action, library, enemy_state)) = agents.get_mut(event.entity) else {
            continue;
        };

        match event.kind {
            MontageKind::AttackOneHand | MontageKind::AttackTwoHand => {
                if *action == ActionState::Attacking {
                    *action = ActionState::Unoccupied;
                }
                if let Some(mut state) = enemy_state {
                    if *state == EnemyState::Attacking {
                        *state = EnemyState::NoState;
                    }
                }
            }
            MontageKind::HitReact => {
                let staggered = enemy_state
                    .map(|state| *state == EnemyState::Staggered)
                    .unwrap_or(false);
                if !staggered && *action == ActionState::HitReaction {
                    *action = ActionState::Unoccupied;
                }
            }
            MontageKind::LookAround => {
                let searching = enemy_state
                    .map(|state| *state == EnemyState::Searching)
                    .unwrap_or(false);
                if searching {
                    commands.entity(event.entity).insert(ActiveMontage::play(
                        MontageKind::LookAround,
                        0,
                        &library.look_around,
                        1.0,
                    ));
                }
            }
            MontageKind::Death => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throw_uses_one_hand_pool() {
        let library = MontageLibrary::default();
        let (kind, _) = attack_montage(CharacterState::EquippedThrow, &library)
            .unwrap_or_else(|| panic!("Throw должен давать атакующий montage"));
        assert_eq!(kind, MontageKind::AttackOneHand);
    }

    #[test]
    fn test_both_hands_uses_two_hand_pool() {
        let library = MontageLibrary::default();
        let (kind, _) = attack_montage(CharacterState::EquippedDualHand, &library)
            .unwrap_or_else(|| panic!("BothHands должен давать атакующий montage"));
        assert_eq!(kind, MontageKind::AttackTwoHand);
    }

    #[test]
    fn test_unarmed_has_no_attack_montage() {
        let library = MontageLibrary::default();
        assert!(attack_montage(CharacterState::Unequipped, &library).is_none());
        assert!(attack_montage(CharacterState::Dead, &library).is_none());
    }
}

use crate::game::action::Action;
use crate::game::character::CharacterState;
use crate::game::motion::MotionTable;

/// The actions a searching agent considers, split by posture.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    air: Vec<Action>,
    ground: Vec<Action>,
    special: Action,
}

impl Default for ActionCatalog {
    fn default() -> Self {
        use Action::*;

        ActionCatalog {
            air: vec![
                AirGuard, AirA, AirB, AirDA, AirDB, AirFA, AirFB, AirUA, AirUB, AirDDfFA,
                AirDDfFB, AirFDDfA, AirFDDfB, AirDDbBA, AirDDbBB,
            ],
            ground: vec![
                StandDDbBA, BackStep, ForwardWalk, Dash, Jump, ForJump, BackJump, StandGuard,
                CrouchGuard, ThrowA, ThrowB, StandA, StandB, CrouchA, CrouchB, StandFA, StandFB,
                CrouchFA, CrouchFB, StandDDfFA, StandDDfFB, StandFDDfA, StandFDDfB, StandDDbBB,
            ],
            special: StandDDfFC,
        }
    }
}

impl ActionCatalog {
    pub fn new(air: Vec<Action>, ground: Vec<Action>, special: Action) -> Self {
        ActionCatalog {
            air,
            ground,
            special,
        }
    }

    /// Returns the actions `character` can afford from its current posture.
    ///
    /// Airborne characters get the air actions; grounded characters get the
    /// special skill first, then the ground actions. An action is kept when
    /// `|attack_start_add_energy| <= energy`.
    pub fn legal_actions(&self, character: &CharacterState, motions: &MotionTable) -> Vec<Action> {
        let energy = character.energy;
        let affordable = |a: &&Action| motions.energy_cost(**a) <= energy;

        if character.is_airborne() {
            self.air.iter().filter(affordable).copied().collect()
        } else {
            std::iter::once(&self.special)
                .chain(self.ground.iter())
                .filter(affordable)
                .copied()
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::{CharacterPhase, PlayerSide};

    #[test]
    fn test_no_energy_excludes_special_skill() {
        let catalog = ActionCatalog::default();
        let motions = MotionTable::default();
        let character = CharacterState::standing(PlayerSide::P1, 200);
        assert_eq!(character.energy, 0);

        let legal = catalog.legal_actions(&character, &motions);
        assert!(!legal.contains(&Action::StandDDfFC));
        for action in &catalog.ground {
            if motions.energy_cost(*action) == 0 {
                assert!(legal.contains(action), "{} should be legal", action);
            }
        }
        assert!(legal.iter().all(|a| motions.energy_cost(*a) <= character.energy));
    }

    #[test]
    fn test_special_skill_first_when_affordable() {
        let catalog = ActionCatalog::default();
        let motions = MotionTable::default();
        let mut character = CharacterState::standing(PlayerSide::P1, 200);
        character.energy = 150;

        let legal = catalog.legal_actions(&character, &motions);
        assert_eq!(legal[0], Action::StandDDfFC);
        assert_eq!(legal.len(), 1 + catalog.ground.len());
    }

    #[test]
    fn test_airborne_gets_air_actions_only() {
        let catalog = ActionCatalog::default();
        let motions = MotionTable::default();
        let mut character = CharacterState::standing(PlayerSide::P2, 500);
        character.phase = CharacterPhase::Air;
        character.energy = 40;

        let legal = catalog.legal_actions(&character, &motions);
        assert!(!legal.is_empty());
        assert!(legal.iter().all(|a| a.is_air()));
        assert!(legal.contains(&Action::AirFDDfB));
        assert!(!legal.contains(&Action::AirDDfFB));
    }

    #[test]
    fn test_deterministic() {
        let catalog = ActionCatalog::default();
        let motions = MotionTable::default();
        let mut character = CharacterState::standing(PlayerSide::P1, 200);
        character.energy = 35;
        assert_eq!(
            catalog.legal_actions(&character, &motions),
            catalog.legal_actions(&character, &motions)
        );
    }
}

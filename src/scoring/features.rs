//! Fixed feature schema shared by the extractor, the normalizer and the
//! scoring oracles.
//!
//! Every feature has a stable slot. Names follow the `self_*` / `oppo_*`
//! convention of the trained models; "self" is whichever character the
//! extractor is pointed at.

use crate::game::action::Action;
use crate::game::character::CharacterPhase;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Number of horizontal stage bins per character.
pub const BIN_COUNT: usize = 5;
/// Attack types that get their own ratio (1 = high .. 4 = throw).
pub const ATTACK_TYPES: usize = 4;

/// Which of the two characters a feature describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Own,
    Opponent,
}

impl Role {
    pub const BOTH: [Role; 2] = [Role::Own, Role::Opponent];

    fn offset(self) -> usize {
        match self {
            Role::Own => 0,
            Role::Opponent => 1,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Role::Own => "self",
            Role::Opponent => "oppo",
        }
    }
}

/// Slot indices of every feature.
pub mod slot {
    use super::{Role, ATTACK_TYPES, BIN_COUNT};
    use crate::game::action::Action;
    use crate::game::character::CharacterPhase;

    pub fn time_in_bin(role: Role, bin: usize) -> usize {
        role.offset() * BIN_COUNT + bin
    }

    pub const CLOSE_DISTANCE_RATIO: usize = 2 * BIN_COUNT;
    pub const AVG_DISTANCE: usize = CLOSE_DISTANCE_RATIO + 1;

    const MOVEMENT: usize = AVG_DISTANCE + 1;

    pub fn approaching_ratio(role: Role) -> usize {
        MOVEMENT + 2 * role.offset()
    }

    pub fn moving_away_ratio(role: Role) -> usize {
        MOVEMENT + 2 * role.offset() + 1
    }

    pub fn approaching_speed(role: Role) -> usize {
        MOVEMENT + 4 + 2 * role.offset()
    }

    pub fn moving_away_speed(role: Role) -> usize {
        MOVEMENT + 4 + 2 * role.offset() + 1
    }

    const ACTIONS: usize = MOVEMENT + 8;

    pub fn action_ratio(role: Role, action: Action) -> usize {
        ACTIONS + 2 * action.ordinal() + role.offset()
    }

    const STATES: usize = ACTIONS + 2 * Action::COUNT;

    pub fn state_ratio(role: Role, phase: CharacterPhase) -> usize {
        STATES + 2 * phase.ordinal() + role.offset()
    }

    const ATTACKS: usize = STATES + 2 * CharacterPhase::COUNT;

    /// `attack_type` is 1-based.
    pub fn attack_type_ratio(role: Role, attack_type: usize) -> usize {
        ATTACKS + 2 * (attack_type - 1) + role.offset()
    }

    pub fn attack_ratio(role: Role) -> usize {
        ATTACKS + 2 * ATTACK_TYPES + role.offset()
    }

    pub fn attack_avg_damage(role: Role) -> usize {
        ATTACKS + 2 * ATTACK_TYPES + 2 + role.offset()
    }

    const PROJECTILES: usize = ATTACKS + 2 * ATTACK_TYPES + 4;

    /// `attack_type` is 1-based.
    pub fn projectile_type_ratio(role: Role, attack_type: usize) -> usize {
        PROJECTILES + 2 * (attack_type - 1) + role.offset()
    }

    pub fn projectile_ratio(role: Role) -> usize {
        PROJECTILES + 2 * ATTACK_TYPES + role.offset()
    }

    pub fn projectile_avg_damage(role: Role) -> usize {
        PROJECTILES + 2 * ATTACK_TYPES + 2 + role.offset()
    }

    pub fn avg_projectile_count(role: Role) -> usize {
        PROJECTILES + 2 * ATTACK_TYPES + 4 + role.offset()
    }

    pub const BE_HIT_PER_SECOND: usize = PROJECTILES + 2 * ATTACK_TYPES + 6;
    pub const HIT_PER_SECOND: usize = BE_HIT_PER_SECOND + 1;
    pub const GUARD_PER_SECOND: usize = BE_HIT_PER_SECOND + 2;
    pub const BLOCKED_PER_SECOND: usize = BE_HIT_PER_SECOND + 3;

    pub const AVG_HP_DIFF: usize = BE_HIT_PER_SECOND + 4;

    pub fn hp_superiority_ratio(role: Role) -> usize {
        AVG_HP_DIFF + 1 + role.offset()
    }

    pub const AVG_HP_ZERO_CROSSING: usize = AVG_HP_DIFF + 3;

    pub fn hp_reducing_speed(role: Role) -> usize {
        AVG_HP_ZERO_CROSSING + 1 + role.offset()
    }

    pub fn energy_gaining_speed(role: Role) -> usize {
        AVG_HP_ZERO_CROSSING + 3 + role.offset()
    }

    pub fn energy_reducing_speed(role: Role) -> usize {
        AVG_HP_ZERO_CROSSING + 5 + role.offset()
    }

    pub const COUNT: usize = AVG_HP_ZERO_CROSSING + 7;
}

/// Number of features.
pub const FEATURE_COUNT: usize = slot::COUNT;

static FEATURE_NAMES: LazyLock<Vec<String>> = LazyLock::new(|| {
    let mut names = vec![String::new(); FEATURE_COUNT];
    let mut put = |index: usize, name: String| names[index] = name;

    for role in Role::BOTH {
        let p = role.prefix();
        for bin in 0..BIN_COUNT {
            put(slot::time_in_bin(role, bin), format!("{p}_time_spent_in_bin{bin}"));
        }
        put(slot::approaching_ratio(role), format!("{p}_approaching_ratio"));
        put(slot::moving_away_ratio(role), format!("{p}_moving_away_ratio"));
        put(slot::approaching_speed(role), format!("{p}_avg_approaching_speed"));
        put(slot::moving_away_speed(role), format!("{p}_avg_moving_away_speed"));
        for &action in Action::ALL {
            put(
                slot::action_ratio(role, action),
                format!("{p}_action{}_ratio", action.ordinal()),
            );
        }
        for phase in [
            CharacterPhase::Stand,
            CharacterPhase::Crouch,
            CharacterPhase::Air,
            CharacterPhase::Down,
        ] {
            put(
                slot::state_ratio(role, phase),
                format!("{p}_state{}_ratio", phase.ordinal()),
            );
        }
        for t in 1..=ATTACK_TYPES {
            put(slot::attack_type_ratio(role, t), format!("{p}_attack_type{t}_ratio"));
            put(
                slot::projectile_type_ratio(role, t),
                format!("{p}_projectiles_type{t}_ratio"),
            );
        }
        put(slot::attack_ratio(role), format!("{p}_attack_ratio"));
        put(slot::attack_avg_damage(role), format!("{p}_attack_avg_damage"));
        put(slot::projectile_ratio(role), format!("{p}_projectiles_ratio"));
        put(slot::projectile_avg_damage(role), format!("{p}_projectiles_avg_damage"));
        put(slot::avg_projectile_count(role), format!("{p}_avg_projectiles_num"));
        put(slot::hp_superiority_ratio(role), format!("{p}_hp_sup_ratio"));
        put(slot::hp_reducing_speed(role), format!("avg_{p}_hp_reducing_speed"));
        put(slot::energy_gaining_speed(role), format!("avg_{p}_energy_gaining_speed"));
        put(slot::energy_reducing_speed(role), format!("avg_{p}_energy_reducing_speed"));
    }

    put(slot::CLOSE_DISTANCE_RATIO, "close_distance_ratio".to_string());
    put(slot::AVG_DISTANCE, "avg_distance".to_string());
    put(slot::BE_HIT_PER_SECOND, "self_be_hit_per_second".to_string());
    put(slot::HIT_PER_SECOND, "self_hit_per_second".to_string());
    put(slot::GUARD_PER_SECOND, "self_guard_per_second".to_string());
    put(slot::BLOCKED_PER_SECOND, "self_blocked_per_second".to_string());
    put(slot::AVG_HP_DIFF, "avg_hp_diff".to_string());
    put(slot::AVG_HP_ZERO_CROSSING, "avg_hp_zero_crossing".to_string());

    names
});

static FEATURE_INDEX: LazyLock<HashMap<&'static str, usize>> = LazyLock::new(|| {
    FEATURE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect()
});

/// All feature names in slot order.
pub fn feature_names() -> &'static [String] {
    &FEATURE_NAMES
}

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_INDEX.get(name).copied()
}

/// One value per feature slot.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl Default for FeatureVector {
    fn default() -> Self {
        FeatureVector::zeroed()
    }
}

impl FeatureVector {
    pub fn zeroed() -> Self {
        FeatureVector {
            values: vec![0.0; FEATURE_COUNT],
        }
    }

    pub fn value(&self, index: usize) -> f64 {
        self.values[index]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|i| self.values[i])
    }

    pub fn set(&mut self, index: usize, value: f64) {
        self.values[index] = value;
    }

    pub fn add(&mut self, index: usize, amount: f64) {
        self.values[index] += amount;
    }

    /// Adds one to a counter feature.
    pub fn bump(&mut self, index: usize) {
        self.values[index] += 1.0;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// `(name, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        feature_names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

//! Trajectory feature extraction.
//!
//! Counters are accumulated frame by frame over a window of snapshots; turning
//! them into ratios and rates is the normalizer's job.

use crate::game::character::{CharacterState, PlayerSide};
use crate::game::game_state::GameState;
use crate::scoring::features::{slot, FeatureVector, Role, ATTACK_TYPES, BIN_COUNT};

/// Width of one horizontal stage bin in pixels.
pub const BIN_WIDTH: i32 = 192;
/// Box gap under which the characters count as close.
pub const CLOSE_DISTANCE: i32 = 100;

/// Accumulated counters and the number of frames they cover.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeatures {
    pub counters: FeatureVector,
    pub frame_count: usize,
}

/// Extracts features describing the fight from the point of view of
/// `subject` (the `self_*` features) against its opponent (`oppo_*`).
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    subject: PlayerSide,
}

impl FeatureExtractor {
    pub fn new(subject: PlayerSide) -> Self {
        FeatureExtractor { subject }
    }

    fn side(&self, role: Role) -> PlayerSide {
        match role {
            Role::Own => self.subject,
            Role::Opponent => self.subject.opponent(),
        }
    }

    /// Accumulates every snapshot of `frames` in order. `prior` is the
    /// snapshot preceding the first frame, if known; delta-based counters
    /// start one frame later without it.
    pub fn extract<'a, I>(&self, frames: I, prior: Option<&'a GameState>) -> RawFeatures
    where
        I: IntoIterator<Item = &'a GameState>,
    {
        let mut counters = FeatureVector::zeroed();
        let mut prev = prior;
        let mut frame_count = 0;

        for state in frames {
            self.accumulate(&mut counters, state, prev);
            prev = Some(state);
            frame_count += 1;
        }

        RawFeatures {
            counters,
            frame_count,
        }
    }

    fn accumulate(&self, f: &mut FeatureVector, state: &GameState, prev: Option<&GameState>) {
        let own = self.side(Role::Own);
        let opp = self.side(Role::Opponent);

        for role in Role::BOTH {
            let c = state.character(self.side(role));
            let toward = state.character(self.side(role).opponent());

            if let Some(bin) = stage_bin(c.x) {
                f.bump(slot::time_in_bin(role, bin));
            }

            match approach_direction(&c, &toward) {
                1 => {
                    f.bump(slot::approaching_ratio(role));
                    f.add(slot::approaching_speed(role), c.speed_x.abs() as f64);
                }
                -1 => {
                    f.bump(slot::moving_away_ratio(role));
                    f.add(slot::moving_away_speed(role), -(c.speed_x.abs() as f64));
                }
                _ => {}
            }

            f.bump(slot::action_ratio(role, c.action));
            f.bump(slot::state_ratio(role, c.phase));

            if let Some(attack) = c.attack.filter(|a| a.attack_type != 0) {
                if let Some(t) = attack_type_index(attack.attack_type) {
                    f.bump(slot::attack_type_ratio(role, t));
                }
                f.bump(slot::attack_ratio(role));
                f.add(slot::attack_avg_damage(role), attack.hit_damage as f64);
            }

            let fired = state.projectiles_by(c.side).count();
            if fired > 0 {
                let closest = state.closest_projectile(toward.side, c.side);
                if let Some(projectile) = closest.filter(|p| p.attack_type > 0) {
                    if let Some(t) = attack_type_index(projectile.attack_type) {
                        f.bump(slot::projectile_type_ratio(role, t));
                    }
                    f.bump(slot::projectile_ratio(role));
                    f.add(slot::projectile_avg_damage(role), projectile.hit_damage as f64);
                }
                f.add(slot::avg_projectile_count(role), fired as f64);
            }
        }

        let distance = state.distance_x(own, opp);
        if distance < CLOSE_DISTANCE {
            f.bump(slot::CLOSE_DISTANCE_RATIO);
        }
        f.add(slot::AVG_DISTANCE, distance as f64);

        let hp_diff = state.character(own).hp - state.character(opp).hp;
        f.add(slot::AVG_HP_DIFF, hp_diff as f64);
        if hp_diff < 0 {
            f.bump(slot::hp_superiority_ratio(Role::Opponent));
        } else if hp_diff > 0 {
            f.bump(slot::hp_superiority_ratio(Role::Own));
        }

        let Some(prev) = prev else {
            return;
        };

        // Damage taken is a clean hit when it equals what the attacker (or its
        // closest projectile) dealt on the previous frame, a guard otherwise.
        let own_hp_delta = state.character(own).hp - prev.character(own).hp;
        let opp_hp_delta = state.character(opp).hp - prev.character(opp).hp;
        if own_hp_delta < 0 {
            if was_clean_hit(prev, opp, own, -own_hp_delta) {
                f.bump(slot::BE_HIT_PER_SECOND);
            } else {
                f.bump(slot::GUARD_PER_SECOND);
            }
        }
        if opp_hp_delta < 0 {
            if was_clean_hit(prev, own, opp, -opp_hp_delta) {
                f.bump(slot::HIT_PER_SECOND);
            } else {
                f.bump(slot::BLOCKED_PER_SECOND);
            }
        }

        // Counted while the HP lead keeps its sign.
        let prev_hp_diff = prev.character(own).hp - prev.character(opp).hp;
        if hp_diff.signum() == prev_hp_diff.signum() {
            f.bump(slot::AVG_HP_ZERO_CROSSING);
        }

        for role in Role::BOTH {
            let side = self.side(role);
            let hp_delta = state.character(side).hp - prev.character(side).hp;
            f.add(slot::hp_reducing_speed(role), hp_delta as f64);

            let energy_delta = state.character(side).energy - prev.character(side).energy;
            if energy_delta < 0 {
                f.add(slot::energy_reducing_speed(role), energy_delta as f64);
            } else {
                f.add(slot::energy_gaining_speed(role), energy_delta as f64);
            }
        }
    }
}

/// Bin index of a horizontal center, `None` when off stage.
fn stage_bin(x: i32) -> Option<usize> {
    (0..BIN_COUNT).find(|&i| {
        let left = BIN_WIDTH * i as i32;
        left <= x && x < left + BIN_WIDTH
    })
}

fn attack_type_index(attack_type: i32) -> Option<usize> {
    usize::try_from(attack_type)
        .ok()
        .filter(|t| (1..=ATTACK_TYPES).contains(t))
}

/// 1 when `mover` moves toward `target`, -1 when it moves away, 0 when it
/// stands still horizontally.
fn approach_direction(mover: &CharacterState, target: &CharacterState) -> i32 {
    if mover.speed_x == 0 {
        0
    } else if (target.x - mover.x).signum() == mover.speed_x.signum() {
        1
    } else {
        -1
    }
}

fn was_clean_hit(prev: &GameState, attacker: PlayerSide, defender: PlayerSide, damage: i32) -> bool {
    let melee = prev.character(attacker).attack.map(|a| a.hit_damage);
    let projectile = prev
        .closest_projectile(defender, attacker)
        .map(|p| p.hit_damage);
    melee == Some(damage) || projectile == Some(damage)
}

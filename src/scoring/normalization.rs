//! Turns raw trajectory counters into model inputs.
//!
//! Each counter is first divided by the size of the population it was counted
//! over (frames, movement events, attacks, projectiles or seconds), then
//! min-max scaled against reference bounds measured on the training data.
//! Values outside the reference bounds are not clamped.

use crate::game::FPS;
use crate::scoring::extractor::RawFeatures;
use crate::scoring::features::{
    feature_index, feature_names, slot, FeatureVector, Role, ATTACK_TYPES, FEATURE_COUNT,
};
use crate::{FightingMctsError, Result};
use std::path::Path;
use std::sync::LazyLock;

/// Population a counter is divided by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Divisor {
    Frames,
    Seconds,
    Movements(Role),
    Approaches(Role),
    Retreats(Role),
    Attacks(Role),
    Projectiles(Role),
}

static DIVISORS: LazyLock<[Divisor; FEATURE_COUNT]> = LazyLock::new(|| {
    let mut divisors = [Divisor::Frames; FEATURE_COUNT];

    for role in Role::BOTH {
        divisors[slot::approaching_ratio(role)] = Divisor::Movements(role);
        divisors[slot::moving_away_ratio(role)] = Divisor::Movements(role);
        divisors[slot::approaching_speed(role)] = Divisor::Approaches(role);
        divisors[slot::moving_away_speed(role)] = Divisor::Retreats(role);

        for t in 1..=ATTACK_TYPES {
            divisors[slot::attack_type_ratio(role, t)] = Divisor::Attacks(role);
            divisors[slot::projectile_type_ratio(role, t)] = Divisor::Projectiles(role);
        }
        divisors[slot::attack_avg_damage(role)] = Divisor::Attacks(role);
        divisors[slot::projectile_avg_damage(role)] = Divisor::Projectiles(role);
        divisors[slot::avg_projectile_count(role)] = Divisor::Projectiles(role);

        divisors[slot::hp_reducing_speed(role)] = Divisor::Seconds;
        divisors[slot::energy_gaining_speed(role)] = Divisor::Seconds;
        divisors[slot::energy_reducing_speed(role)] = Divisor::Seconds;
    }
    for index in [
        slot::BE_HIT_PER_SECOND,
        slot::HIT_PER_SECOND,
        slot::GUARD_PER_SECOND,
        slot::BLOCKED_PER_SECOND,
        slot::AVG_HP_ZERO_CROSSING,
    ] {
        divisors[index] = Divisor::Seconds;
    }

    divisors
});

/// Per-feature reference bounds, loaded once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationTable {
    bounds: Vec<Option<(f64, f64)>>,
}

impl NormalizationTable {
    /// A table with no bounds: features are divided but never rescaled.
    pub fn unscaled() -> Self {
        NormalizationTable {
            bounds: vec![None; FEATURE_COUNT],
        }
    }

    /// Builds a table from `(name, min, max)` entries. Unknown names are an error.
    pub fn from_bounds<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f64, f64)>,
    {
        let mut table = NormalizationTable::unscaled();
        for (name, min, max) in entries {
            let index = feature_index(name).ok_or_else(|| {
                FightingMctsError::Config(format!("unknown feature in min/max table: {}", name))
            })?;
            if !(min.is_finite() && max.is_finite()) {
                return Err(FightingMctsError::Config(format!(
                    "non-finite min/max bounds for {}",
                    name
                )));
            }
            table.bounds[index] = Some((min, max));
        }
        Ok(table)
    }

    /// Loads the min/max reference table.
    ///
    /// The first row holds the feature names (the first column is a row
    /// label and is ignored), the second row the maxima and the third row the
    /// minima. Columns that are not features are skipped with a warning;
    /// features without a column stay unscaled.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let mut rows = reader.records();

        let missing = |what: &str| {
            FightingMctsError::Config(format!("min/max table {} has no {} row", path.display(), what))
        };
        let max_row = rows.next().ok_or_else(|| missing("max"))??;
        let min_row = rows.next().ok_or_else(|| missing("min"))??;

        let mut table = NormalizationTable::unscaled();
        for (column, name) in headers.iter().enumerate().skip(1) {
            let Some(index) = feature_index(name.trim()) else {
                log::warn!("Ignoring unknown min/max column {:?} in {}", name, path.display());
                continue;
            };
            let parse = |row: &csv::StringRecord| -> Result<f64> {
                let raw = row.get(column).unwrap_or_default().trim();
                let value = raw.parse::<f64>().map_err(|e| {
                    FightingMctsError::Config(format!("bad min/max value {:?} for {}: {}", raw, name, e))
                })?;
                if !value.is_finite() {
                    return Err(FightingMctsError::Config(format!(
                        "non-finite min/max value {:?} for {}",
                        raw, name
                    )));
                }
                Ok(value)
            };
            table.bounds[index] = Some((parse(&min_row)?, parse(&max_row)?));
        }

        let covered = table.bounds.iter().filter(|b| b.is_some()).count();
        log::info!(
            "📐 Loaded min/max bounds for {}/{} features from {}",
            covered,
            FEATURE_COUNT,
            path.display()
        );
        Ok(table)
    }

    /// `(min, max)` of a feature, if the table has it.
    pub fn bounds(&self, index: usize) -> Option<(f64, f64)> {
        self.bounds[index]
    }

    /// Names of features the table has no bounds for.
    pub fn unbounded_features(&self) -> Vec<&'static str> {
        feature_names()
            .iter()
            .zip(self.bounds.iter())
            .filter(|(_, b)| b.is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Divides every counter by its population, then rescales it to the
    /// reference bounds. A zero population leaves the counter as is; equal
    /// bounds skip the rescale.
    pub fn normalize(&self, raw: &RawFeatures) -> FeatureVector {
        let c = &raw.counters;
        let frames = raw.frame_count as f64;
        let seconds = frames / FPS as f64;

        let count = |role: Role, slot_of: fn(Role, usize) -> usize| -> f64 {
            (1..=ATTACK_TYPES).map(|t| c.value(slot_of(role, t))).sum()
        };
        let population = |divisor: Divisor| -> f64 {
            match divisor {
                Divisor::Frames => frames,
                Divisor::Seconds => seconds,
                Divisor::Movements(role) => {
                    c.value(slot::approaching_ratio(role)) + c.value(slot::moving_away_ratio(role))
                }
                Divisor::Approaches(role) => c.value(slot::approaching_ratio(role)),
                Divisor::Retreats(role) => c.value(slot::moving_away_ratio(role)),
                Divisor::Attacks(role) => count(role, slot::attack_type_ratio),
                Divisor::Projectiles(role) => count(role, slot::projectile_type_ratio),
            }
        };

        let mut normalized = FeatureVector::zeroed();
        for (index, divisor) in DIVISORS.iter().enumerate() {
            let mut value = c.value(index);
            let by = population(*divisor);
            if by > 0.0 {
                value /= by;
            }
            if let Some((min, max)) = self.bounds[index] {
                if max != min {
                    value = (value - min) / (max - min);
                }
            }
            normalized.set(index, value);
        }
        normalized
    }
}

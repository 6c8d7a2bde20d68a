use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::game::game_state::GameState;
use crate::scoring::extractor::FeatureExtractor;
use crate::scoring::features::FeatureVector;
use crate::scoring::normalization::NormalizationTable;
use crate::scoring::oracle::ScoringOracle;
use crate::scoring::trajectory::TrajectoryWindow;
use crate::{FightingMctsError, Result};

/// How the signed scores of several models become one reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationPolicy {
    Sum,
    Mean,
    /// Only the named model is evaluated.
    Only(String),
}

/// A loaded oracle and the class it rewards.
#[derive(Clone)]
pub struct ScoringModel {
    pub oracle: Arc<dyn ScoringOracle>,
    pub reward_class: i64,
}

impl ScoringModel {
    pub fn new(oracle: Arc<dyn ScoringOracle>, reward_class: i64) -> Self {
        ScoringModel {
            oracle,
            reward_class,
        }
    }
}

/// Trajectory in, reward out: extraction, normalization and model
/// combination. Shared read-only by every playout of a search.
pub struct Scorer {
    extractor: FeatureExtractor,
    table: NormalizationTable,
    models: Vec<ScoringModel>,
    policy: CombinationPolicy,
}

impl fmt::Debug for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let models: Vec<(&str, i64)> = self
            .models
            .iter()
            .map(|m| (m.oracle.name(), m.reward_class))
            .collect();
        f.debug_struct("Scorer")
            .field("extractor", &self.extractor)
            .field("models", &models)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Scorer {
    pub fn new(
        extractor: FeatureExtractor,
        table: NormalizationTable,
        models: Vec<ScoringModel>,
        policy: CombinationPolicy,
    ) -> Result<Self> {
        if models.is_empty() {
            return Err(FightingMctsError::Config(
                "at least one scoring model is required".to_string(),
            ));
        }
        if let CombinationPolicy::Only(name) = &policy {
            if !models.iter().any(|m| m.oracle.name() == name) {
                return Err(FightingMctsError::Config(format!(
                    "combination policy names unknown model '{}'",
                    name
                )));
            }
        }
        Ok(Scorer {
            extractor,
            table,
            models,
            policy,
        })
    }

    /// The policy used when none is configured: the valence model alone if
    /// one is loaded, otherwise the sum over every model.
    pub fn default_policy(models: &[ScoringModel]) -> CombinationPolicy {
        if models.iter().any(|m| m.oracle.name() == "valence") {
            CombinationPolicy::Only("valence".to_string())
        } else {
            CombinationPolicy::Sum
        }
    }

    pub fn policy(&self) -> &CombinationPolicy {
        &self.policy
    }

    /// Scores `window` as it would look with `simulated` appended. The window
    /// itself is left untouched.
    pub fn score_trajectory(&self, window: &TrajectoryWindow, simulated: &[GameState]) -> Result<f64> {
        let raw = self.extractor.extract(window.extended(simulated), None);
        if raw.frame_count == 0 {
            return Err(FightingMctsError::Simulation(
                "nothing to score: empty trajectory".to_string(),
            ));
        }
        let features = self.table.normalize(&raw);
        self.score_features(&features)
    }

    /// Combines the signed scores of the active models.
    pub fn score_features(&self, features: &FeatureVector) -> Result<f64> {
        match &self.policy {
            CombinationPolicy::Only(name) => {
                let model = self
                    .models
                    .iter()
                    .find(|m| m.oracle.name() == name)
                    .ok_or_else(|| FightingMctsError::Model(format!("no model named {}", name)))?;
                Self::signed(model, features)
            }
            CombinationPolicy::Sum | CombinationPolicy::Mean => {
                let mut total = 0.0;
                for model in &self.models {
                    total += Self::signed(model, features)?;
                }
                if self.policy == CombinationPolicy::Mean {
                    total /= self.models.len() as f64;
                }
                Ok(total)
            }
        }
    }

    fn signed(model: &ScoringModel, features: &FeatureVector) -> Result<f64> {
        let output = model.oracle.evaluate(features)?;
        let score = output.signed_score(model.reward_class);
        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "{} -> {}={} ({:.3})",
                model.oracle.name(),
                output.output_field,
                output.predicted_class,
                score
            );
        }
        Ok(score)
    }
}

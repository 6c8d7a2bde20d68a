//! Scoring oracles: trained models mapping a normalized feature vector to a
//! predicted class and per-class probabilities.

use crate::scoring::features::{feature_index, FeatureVector};
use crate::{FightingMctsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Result of one oracle evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleOutput {
    /// Name of the model's target field, e.g. `Va_rank`.
    pub output_field: String,
    pub predicted_class: i64,
    /// `(class, probability)` pairs.
    pub probabilities: Vec<(i64, f64)>,
}

impl OracleOutput {
    /// Probability of `class`, 0 when the model does not know it.
    pub fn probability(&self, class: i64) -> f64 {
        self.probabilities
            .iter()
            .find(|(c, _)| *c == class)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }

    /// Signed score relative to the class that counts as a reward:
    /// `+p(predicted)` when the model predicts `reward_class`, `-p(predicted)`
    /// otherwise.
    pub fn signed_score(&self, reward_class: i64) -> f64 {
        let p = self.probability(self.predicted_class);
        if self.predicted_class == reward_class {
            p
        } else {
            -p
        }
    }
}

/// An opaque trained evaluation model. Implementations are shared across
/// playout workers and must be callable concurrently.
pub trait ScoringOracle: Send + Sync {
    fn name(&self) -> &str;

    /// Features the model reads.
    fn required_features(&self) -> Vec<&'static str>;

    fn evaluate(&self, features: &FeatureVector) -> Result<OracleOutput>;
}

/// Multinomial logistic model stored as JSON:
///
/// ```json
/// {
///   "output_field": "Va_rank",
///   "classes": [
///     { "label": 0, "bias": 0.2, "weights": { "avg_hp_diff": -1.5 } },
///     { "label": 1, "bias": -0.2, "weights": { "avg_hp_diff": 1.5 } }
///   ]
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LinearOracle {
    name: String,
    output_field: String,
    classes: Vec<LinearClass>,
}

#[derive(Debug, Clone)]
struct LinearClass {
    label: i64,
    bias: f64,
    /// `(feature slot, weight)` pairs.
    weights: Vec<(usize, f64)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinearModelFile {
    output_field: String,
    classes: Vec<LinearClassFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinearClassFile {
    label: i64,
    #[serde(default)]
    bias: f64,
    #[serde(default)]
    weights: HashMap<String, f64>,
}

impl LinearOracle {
    pub fn from_json_path<P: AsRef<Path>>(name: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FightingMctsError::Model(format!("cannot read model {} ({}): {}", name, path.display(), e))
        })?;
        let oracle = Self::from_json_str(name, &text)?;
        log::info!(
            "🧠 Loaded model '{}' from {} ({} classes)",
            name,
            path.display(),
            oracle.classes.len()
        );
        Ok(oracle)
    }

    pub fn from_json_str(name: &str, json: &str) -> Result<Self> {
        let file: LinearModelFile = serde_json::from_str(json)
            .map_err(|e| FightingMctsError::Model(format!("malformed model {}: {}", name, e)))?;
        if file.classes.is_empty() {
            return Err(FightingMctsError::Model(format!("model {} has no classes", name)));
        }

        let mut classes = Vec::with_capacity(file.classes.len());
        for class in file.classes {
            if !class.bias.is_finite() {
                return Err(FightingMctsError::Model(format!(
                    "model {} class {} has a non-finite bias",
                    name, class.label
                )));
            }
            let mut weights = Vec::with_capacity(class.weights.len());
            for (feature, weight) in class.weights {
                let index = feature_index(&feature).ok_or_else(|| {
                    FightingMctsError::Model(format!("model {} uses unknown feature {}", name, feature))
                })?;
                if !weight.is_finite() {
                    return Err(FightingMctsError::Model(format!(
                        "model {} has a non-finite weight for {}",
                        name, feature
                    )));
                }
                weights.push((index, weight));
            }
            weights.sort_by_key(|(index, _)| *index);
            classes.push(LinearClass {
                label: class.label,
                bias: class.bias,
                weights,
            });
        }

        Ok(LinearOracle {
            name: name.to_string(),
            output_field: file.output_field,
            classes,
        })
    }
}

impl ScoringOracle for LinearOracle {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_features(&self) -> Vec<&'static str> {
        let mut slots: Vec<usize> = self
            .classes
            .iter()
            .flat_map(|c| c.weights.iter().map(|(i, _)| *i))
            .collect();
        slots.sort_unstable();
        slots.dedup();
        let names = crate::scoring::features::feature_names();
        slots.into_iter().map(|i| names[i].as_str()).collect()
    }

    fn evaluate(&self, features: &FeatureVector) -> Result<OracleOutput> {
        let logits: Vec<f64> = self
            .classes
            .iter()
            .map(|class| {
                class.bias
                    + class
                        .weights
                        .iter()
                        .map(|(i, w)| w * features.value(*i))
                        .sum::<f64>()
            })
            .collect();
        if logits.iter().any(|l| !l.is_finite()) {
            return Err(FightingMctsError::Model(format!(
                "model {} produced a non-finite logit",
                self.name
            )));
        }

        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exps.iter().sum();

        let mut predicted = 0;
        for (i, l) in logits.iter().enumerate() {
            if *l > logits[predicted] {
                predicted = i;
            }
        }

        Ok(OracleOutput {
            output_field: self.output_field.clone(),
            predicted_class: self.classes[predicted].label,
            probabilities: self
                .classes
                .iter()
                .zip(exps)
                .map(|(class, e)| (class.label, e / total))
                .collect(),
        })
    }
}

//! Search configuration.
//!
//! Every tunable of a decision cycle lives in [`SearchConfig`], built once
//! and passed by reference to the search.
//!
//! Presets:
//! - `default()`: 165 ms budget, C = 2 * 1.414, depth 5, expansion after 10 visits
//! - `shallow()`: C = 3, depth 2, expansion after 4 visits

use crate::scoring::scoring::CombinationPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lowest UCB1 an unvisited child may receive.
pub const MIN_UNVISITED_BONUS: f64 = 9999.0;

/// Where playouts run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayoutMode {
    /// One playout per iteration, on the searching thread.
    Single,
    /// Every sibling of the selected node is played out together.
    SiblingBatch,
}

/// Visit increment a node receives after a sibling batch below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpropIncrement {
    /// The number of siblings in the node's child set, whatever completed.
    SiblingCount,
    /// The number of playouts that posted a score.
    CompletedPlayouts,
}

/// How the root's child is picked once the budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalSelection {
    BestScore,
    BestVisits,
}

/// MCTS configuration for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Wall-clock budget of a decision cycle in milliseconds. Checked
    /// between iterations only.
    pub time_budget_ms: u64,

    /// UCB1 exploration constant C.
    pub exploration_constant: f64,

    /// Nodes at this depth are never expanded.
    pub max_depth: usize,

    /// Visits a node needs before it is expanded.
    pub expansion_threshold: u32,

    /// Frames simulated by one playout.
    pub simulation_frames: u32,

    pub playout_mode: PlayoutMode,
    pub backprop_increment: BackpropIncrement,
    pub final_selection: FinalSelection,

    /// UCB1 value of an unvisited child, before jitter.
    pub unvisited_bonus: f64,

    /// Unvisited children get a random integer in `0..unvisited_jitter`
    /// added to the bonus.
    pub unvisited_jitter: u32,

    /// Names of the configured models to load. Empty loads all of them.
    pub active_models: Vec<String>,

    /// How model scores are combined. `None` picks the valence model when
    /// one is loaded, otherwise the sum.
    pub combination: Option<CombinationPolicy>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 165,
            exploration_constant: 2.0 * 1.414,
            max_depth: 5,
            expansion_threshold: 10,
            simulation_frames: 30, // 0.5 s

            playout_mode: PlayoutMode::SiblingBatch,
            backprop_increment: BackpropIncrement::SiblingCount,
            final_selection: FinalSelection::BestScore,

            unvisited_bonus: MIN_UNVISITED_BONUS,
            unvisited_jitter: 50,

            active_models: Vec::new(),
            combination: None,
        }
    }
}

impl SearchConfig {
    /// Short, wide trees with a larger exploration constant.
    pub fn shallow() -> Self {
        Self {
            exploration_constant: 3.0,
            max_depth: 2,
            expansion_threshold: 4,
            ..Self::default()
        }
    }

    /// Whether the model named `name` takes part in scoring.
    pub fn is_model_active(&self, name: &str) -> bool {
        self.active_models.is_empty() || self.active_models.iter().any(|m| m == name)
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.exploration_constant.is_finite() && self.exploration_constant > 0.0) {
            return Err(format!(
                "Exploration constant must be positive, got {}",
                self.exploration_constant
            ));
        }
        if self.simulation_frames == 0 {
            return Err("Playouts must simulate at least one frame".to_string());
        }
        if self.expansion_threshold == 0 {
            return Err("Expansion threshold must be at least 1".to_string());
        }
        if !(self.unvisited_bonus.is_finite() && self.unvisited_bonus >= MIN_UNVISITED_BONUS) {
            return Err(format!(
                "Unvisited bonus must be finite and at least {}, got {}",
                MIN_UNVISITED_BONUS, self.unvisited_bonus
            ));
        }
        Ok(())
    }

    /// Create a configuration string for logging
    pub fn to_config_string(&self) -> String {
        format!(
            "budget[{}ms]_c[{:.3}]_depth[{}]_expand[{}]_frames[{}]_mode[{:?}]_backprop[{:?}]_select[{:?}]",
            self.time_budget_ms,
            self.exploration_constant,
            self.max_depth,
            self.expansion_threshold,
            self.simulation_frames,
            self.playout_mode,
            self.backprop_increment,
            self.final_selection
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.time_budget(), Duration::from_millis(165));
        assert_eq!(config.max_depth, 5);
    }

    #[test]
    fn test_shallow_preset() {
        let config = SearchConfig::shallow();
        assert_eq!(config.exploration_constant, 3.0);
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.expansion_threshold, 4);
        assert_eq!(config.simulation_frames, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = SearchConfig::default();
        config.exploration_constant = 0.0;
        assert!(config.validate().is_err());

        let mut config = SearchConfig::default();
        config.simulation_frames = 0;
        assert!(config.validate().is_err());

        let mut config = SearchConfig::default();
        config.expansion_threshold = 0;
        assert!(config.validate().is_err());

        let mut config = SearchConfig::default();
        config.unvisited_bonus = 0.0;
        assert!(config.validate().is_err());

        config.unvisited_bonus = MIN_UNVISITED_BONUS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_string() {
        let config = SearchConfig::default().to_config_string();
        assert!(config.contains("budget[165ms]"));
        assert!(config.contains("c[2.828]"));
        assert!(config.contains("mode[SiblingBatch]"));
    }

    #[test]
    fn test_active_model_subset() {
        let mut config = SearchConfig::default();
        assert!(config.is_model_active("arousal"));

        config.active_models = vec!["valence".to_string()];
        assert!(config.is_model_active("valence"));
        assert!(!config.is_model_active("arousal"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"max_depth": 2, "playout_mode": "single"}"#).unwrap();
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.playout_mode, PlayoutMode::Single);
        assert_eq!(config.time_budget_ms, 165);
        assert_eq!(config.backprop_increment, BackpropIncrement::SiblingCount);
    }
}

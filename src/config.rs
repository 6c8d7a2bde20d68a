//! Agent configuration, loaded once from JSON and passed by reference.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::game::character::PlayerSide;
use crate::mcts::hyperparameters::SearchConfig;
use crate::{FightingMctsError, Result};

/// Whose experience the extracted features describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    /// Features are computed for the opponent of the searching side.
    Opponent,
    Own,
}

impl Perspective {
    /// Feature subject when searching for `side`.
    pub fn subject(self, side: PlayerSide) -> PlayerSide {
        match self {
            Perspective::Opponent => side.opponent(),
            Perspective::Own => side,
        }
    }
}

/// One scoring-model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub path: PathBuf,
    /// Class whose prediction counts as a reward.
    #[serde(default = "default_reward_class")]
    pub reward_class: i64,
}

fn default_reward_class() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub search: SearchConfig,

    /// Playout pool size for sibling batches.
    pub workers: usize,

    /// Frames kept in the trajectory window.
    pub trajectory_capacity: usize,

    /// Frames simulated with no input before the search root.
    pub frames_ahead: u32,

    /// Min/max reference table. Without it features stay unscaled.
    pub min_max_path: Option<PathBuf>,

    /// Character motion table. Without it the built-in table is used.
    pub motion_path: Option<PathBuf>,

    pub models: Vec<ModelSpec>,

    pub perspective: Perspective,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            workers: 48,
            trajectory_capacity: 300,
            frames_ahead: 14,
            min_max_path: None,
            motion_path: None,
            models: Vec::new(),
            perspective: Perspective::Opponent,
        }
    }
}

impl AgentConfig {
    /// Reads a JSON config. Relative artifact paths are resolved against the
    /// config file's directory.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FightingMctsError::Config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let mut config: AgentConfig = serde_json::from_str(&text)
            .map_err(|e| FightingMctsError::Config(format!("malformed config {}: {}", path.display(), e)))?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        log::info!("⚙️ Loaded agent config from {}", path.display());
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(p) = self.min_max_path.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.motion_path.as_mut() {
            resolve(p);
        }
        for model in &mut self.models {
            resolve(&mut model.path);
        }
    }

    /// Models that take part in scoring under the active subset.
    pub fn active_models(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models
            .iter()
            .filter(|m| self.search.is_model_active(&m.name))
    }

    pub fn validate(&self) -> Result<()> {
        self.search.validate().map_err(FightingMctsError::Config)?;
        if self.trajectory_capacity == 0 {
            return Err(FightingMctsError::Config(
                "trajectory window must hold at least one frame".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for model in &self.models {
            if !names.insert(model.name.as_str()) {
                return Err(FightingMctsError::Config(format!(
                    "model '{}' is configured twice",
                    model.name
                )));
            }
        }
        for name in &self.search.active_models {
            if !names.contains(name.as_str()) {
                return Err(FightingMctsError::Config(format!(
                    "active model '{}' is not configured",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcts::hyperparameters::PlayoutMode;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.workers, 48);
        assert_eq!(config.trajectory_capacity, 300);
        assert_eq!(config.frames_ahead, 14);
        assert_eq!(config.perspective, Perspective::Opponent);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_perspective_subject() {
        assert_eq!(Perspective::Opponent.subject(PlayerSide::P1), PlayerSide::P2);
        assert_eq!(Perspective::Own.subject(PlayerSide::P1), PlayerSide::P1);
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "workers": 4,
                "min_max_path": "minmax.csv",
                "models": [{{ "name": "valence", "path": "models/valence.json" }}],
                "search": {{ "playout_mode": "single", "active_models": ["valence"] }}
            }}"#
        )
        .unwrap();

        let config = AgentConfig::from_json_path(&path).unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.frames_ahead, 14);
        assert_eq!(config.search.playout_mode, PlayoutMode::Single);
        assert_eq!(config.min_max_path, Some(dir.path().join("minmax.csv")));
        assert_eq!(config.models[0].path, dir.path().join("models/valence.json"));
        assert_eq!(config.models[0].reward_class, 1);
        assert_eq!(config.active_models().count(), 1);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let spec = |name: &str| ModelSpec {
            name: name.to_string(),
            path: PathBuf::from("m.json"),
            reward_class: 1,
        };

        let duplicated = AgentConfig {
            models: vec![spec("valence"), spec("valence")],
            ..AgentConfig::default()
        };
        assert_matches!(duplicated.validate(), Err(FightingMctsError::Config(_)));

        let mut unknown_active = AgentConfig {
            models: vec![spec("valence")],
            ..AgentConfig::default()
        };
        unknown_active.search.active_models = vec!["arousal".to_string()];
        assert_matches!(unknown_active.validate(), Err(FightingMctsError::Config(_)));

        let empty_window = AgentConfig {
            trajectory_capacity: 0,
            ..AgentConfig::default()
        };
        assert_matches!(empty_window.validate(), Err(FightingMctsError::Config(_)));

        assert_matches!(
            AgentConfig::from_json_path("/nonexistent/agent.json"),
            Err(FightingMctsError::Config(_))
        );
    }
}

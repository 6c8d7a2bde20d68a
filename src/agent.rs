//! Agent lifecycle: initialize once, observe every frame, decide when ready,
//! shut down at the end of the match.

use std::sync::Arc;

use crate::config::AgentConfig;
use crate::game::character::PlayerSide;
use crate::game::fight_model::KinematicModel;
use crate::game::game_state::GameState;
use crate::game::legal_actions::ActionCatalog;
use crate::game::motion::MotionTable;
use crate::game::simulator::ForwardSimulator;
use crate::mcts::algorithm::SearchEngine;
use crate::mcts::hyperparameters::PlayoutMode;
use crate::mcts::mcts_result::DecisionResult;
use crate::mcts::playout::PlayoutExecutor;
use crate::scoring::extractor::FeatureExtractor;
use crate::scoring::features::feature_index;
use crate::scoring::normalization::NormalizationTable;
use crate::scoring::oracle::LinearOracle;
use crate::scoring::scoring::{Scorer, ScoringModel};
use crate::scoring::trajectory::TrajectoryWindow;
use crate::{FightingMctsError, Result};

#[derive(Debug)]
pub struct Agent {
    side: PlayerSide,
    frames_ahead: u32,
    engine: Option<SearchEngine>,
    window: TrajectoryWindow,
    latest: Option<GameState>,
    decisions: u64,
}

impl Agent {
    /// Loads every artifact named by `config` and starts the playout pool.
    /// Any missing or malformed artifact is an error.
    pub fn initialize(config: AgentConfig, side: PlayerSide) -> Result<Self> {
        config.validate()?;

        let motions = match &config.motion_path {
            Some(path) => MotionTable::from_csv_path(path)?,
            None => MotionTable::default(),
        };
        let simulator = ForwardSimulator::new(
            Arc::new(KinematicModel::new(motions.clone(), motions)),
            ActionCatalog::default(),
        );

        let table = match &config.min_max_path {
            Some(path) => NormalizationTable::from_csv_path(path)?,
            None => {
                log::warn!("No min/max table configured, features stay unscaled");
                NormalizationTable::unscaled()
            }
        };

        let mut models = Vec::new();
        for spec in config.active_models() {
            let oracle = LinearOracle::from_json_path(&spec.name, &spec.path)?;
            models.push(ScoringModel::new(Arc::new(oracle), spec.reward_class));
        }
        if config.min_max_path.is_some() {
            check_bounds(&table, &models)?;
        }

        let policy = config
            .search
            .combination
            .clone()
            .unwrap_or_else(|| Scorer::default_policy(&models));
        let scorer = Scorer::new(
            FeatureExtractor::new(config.perspective.subject(side)),
            table,
            models,
            policy,
        )?;

        Self::with_components(config, side, simulator, scorer)
    }

    /// Builds an agent around an already assembled simulator and scorer.
    pub fn with_components(
        config: AgentConfig,
        side: PlayerSide,
        simulator: ForwardSimulator,
        scorer: Scorer,
    ) -> Result<Self> {
        config.validate()?;
        let executor = match config.search.playout_mode {
            PlayoutMode::Single => PlayoutExecutor::inline(),
            PlayoutMode::SiblingBatch => PlayoutExecutor::with_workers(config.workers)?,
        };
        log::info!(
            "🤖 Agent {:?} ready with {:?} scoring: {}",
            side,
            scorer.policy(),
            config.search.to_config_string()
        );
        let engine = SearchEngine::new(config.search, simulator, scorer, executor)?;

        Ok(Agent {
            side,
            frames_ahead: config.frames_ahead,
            engine: Some(engine),
            window: TrajectoryWindow::new(config.trajectory_capacity),
            latest: None,
            decisions: 0,
        })
    }

    pub fn side(&self) -> PlayerSide {
        self.side
    }

    pub fn window(&self) -> &TrajectoryWindow {
        &self.window
    }

    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    /// Latest real frame. Called once per frame; never searches.
    pub fn observe(&mut self, state: GameState) {
        self.latest = Some(state);
    }

    /// Whether a decision cycle should run for the latest frame.
    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
            && self
                .latest
                .as_ref()
                .is_some_and(|state| state.is_ready_to_act(self.side))
    }

    /// Runs one decision cycle from the latest frame projected a few frames
    /// ahead.
    pub fn decide(&mut self) -> Result<DecisionResult> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| FightingMctsError::Search("agent has been shut down".to_string()))?;
        let current = self
            .latest
            .as_ref()
            .ok_or_else(|| FightingMctsError::Search("no frame observed yet".to_string()))?;

        let ahead = engine
            .simulator()
            .simulate(current, self.side, &[], &[], self.frames_ahead, false)
            .pop()
            .unwrap_or_else(|| current.clone());

        let result = engine.decide(&mut self.window, &ahead, self.side)?;
        self.decisions += 1;
        Ok(result)
    }

    /// Releases the playout pool. Later decisions fail.
    pub fn shutdown(&mut self) {
        if self.engine.take().is_some() {
            log::info!(
                "🛑 Agent {:?} shut down after {} decisions",
                self.side,
                self.decisions
            );
        }
    }
}

/// Every feature a model reads must have min/max bounds.
fn check_bounds(table: &NormalizationTable, models: &[ScoringModel]) -> Result<()> {
    for model in models {
        for name in model.oracle.required_features() {
            let bounded = feature_index(name).and_then(|i| table.bounds(i)).is_some();
            if !bounded {
                return Err(FightingMctsError::Config(format!(
                    "model '{}' reads {} which has no min/max bounds",
                    model.oracle.name(),
                    name
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelSpec;
    use crate::game::action::Action;
    use crate::game::character::CharacterState;
    use crate::scoring::scoring::tests::FixedOracle;
    use crate::scoring::scoring::CombinationPolicy;
    use assert_matches::assert_matches;
    use std::path::PathBuf;

    fn state() -> GameState {
        GameState::new(
            CharacterState::standing(PlayerSide::P1, 300),
            CharacterState::standing(PlayerSide::P2, 560),
        )
        .with_frame(60)
    }

    fn agent(mode: PlayoutMode) -> Agent {
        let mut config = AgentConfig {
            workers: 2,
            trajectory_capacity: 20,
            ..AgentConfig::default()
        };
        config.search.time_budget_ms = 5;
        config.search.simulation_frames = 10;
        config.search.playout_mode = mode;

        let scorer = Scorer::new(
            FeatureExtractor::new(PlayerSide::P2),
            NormalizationTable::unscaled(),
            vec![ScoringModel::new(
                Arc::new(FixedOracle {
                    name: "valence",
                    class: 1,
                    p: 0.6,
                }),
                1,
            )],
            CombinationPolicy::Sum,
        )
        .unwrap();
        let simulator = ForwardSimulator::new(Arc::new(KinematicModel::default()), ActionCatalog::default());
        Agent::with_components(config, PlayerSide::P1, simulator, scorer).unwrap()
    }

    #[test]
    fn test_decision_cycle() {
        for mode in [PlayoutMode::SiblingBatch, PlayoutMode::Single] {
            let mut agent = agent(mode);
            assert!(!agent.is_ready());

            agent.observe(state());
            assert!(agent.is_ready());

            let result = agent.decide().unwrap();
            assert_ne!(result.action, Action::Neutral);
            assert!(result.iterations >= 1);
            assert_eq!(agent.decisions(), 1);
            assert!(agent.window().is_full());
        }
    }

    #[test]
    fn test_debug_output_names_collaborators() {
        let agent = agent(PlayoutMode::SiblingBatch);
        let rendered = format!("{:?}", agent);
        assert!(rendered.contains("SearchEngine"));
        assert!(rendered.contains("\"valence\""));
        assert!(rendered.contains("workers: 2"));
    }

    #[test]
    fn test_not_ready_without_control_or_time() {
        let mut agent = agent(PlayoutMode::Single);

        let mut busy = state();
        busy.characters_mut()[0].control = false;
        agent.observe(busy);
        assert!(!agent.is_ready());

        agent.observe(state().with_frame(60 * 60));
        assert!(!agent.is_ready());
    }

    #[test]
    fn test_shutdown_stops_decisions() {
        let mut agent = agent(PlayoutMode::SiblingBatch);
        agent.observe(state());
        agent.shutdown();
        assert!(!agent.is_ready());
        assert_matches!(agent.decide(), Err(FightingMctsError::Search(_)));
        agent.shutdown();
    }

    #[test]
    fn test_decide_before_observe_fails() {
        let mut agent = agent(PlayoutMode::Single);
        assert_matches!(agent.decide(), Err(FightingMctsError::Search(_)));
    }

    #[test]
    fn test_empty_trajectory_window_rejected() {
        let config = AgentConfig {
            trajectory_capacity: 0,
            ..AgentConfig::default()
        };
        assert_matches!(
            Agent::initialize(config.clone(), PlayerSide::P1),
            Err(FightingMctsError::Config(_))
        );

        let scorer = Scorer::new(
            FeatureExtractor::new(PlayerSide::P2),
            NormalizationTable::unscaled(),
            vec![ScoringModel::new(
                Arc::new(FixedOracle {
                    name: "valence",
                    class: 1,
                    p: 0.6,
                }),
                1,
            )],
            CombinationPolicy::Sum,
        )
        .unwrap();
        let simulator = ForwardSimulator::new(Arc::new(KinematicModel::default()), ActionCatalog::default());
        assert_matches!(
            Agent::with_components(config, PlayerSide::P1, simulator, scorer),
            Err(FightingMctsError::Config(_))
        );
    }

    #[test]
    fn test_initialize_fails_fast_on_missing_model() {
        let config = AgentConfig {
            models: vec![ModelSpec {
                name: "valence".to_string(),
                path: PathBuf::from("/nonexistent/valence.json"),
                reward_class: 1,
            }],
            ..AgentConfig::default()
        };
        assert_matches!(
            Agent::initialize(config, PlayerSide::P1),
            Err(FightingMctsError::Model(_))
        );
        assert_matches!(
            Agent::initialize(AgentConfig::default(), PlayerSide::P1),
            Err(FightingMctsError::Config(_))
        );
    }

    #[test]
    fn test_initialize_requires_bounds_for_model_features() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("valence.json");
        std::fs::write(
            &model,
            r#"{"output_field": "Va_rank", "classes": [
                {"label": 0, "weights": {"avg_hp_diff": -1.0}},
                {"label": 1, "weights": {"avg_hp_diff": 1.0, "avg_distance": 0.5}}
            ]}"#,
        )
        .unwrap();
        let min_max = dir.path().join("minmax.csv");
        std::fs::write(&min_max, "label,avg_hp_diff\nmax,400\nmin,-400\n").unwrap();

        let mut config = AgentConfig {
            workers: 1,
            min_max_path: Some(min_max.clone()),
            models: vec![ModelSpec {
                name: "valence".to_string(),
                path: model,
                reward_class: 1,
            }],
            ..AgentConfig::default()
        };
        assert_matches!(
            Agent::initialize(config.clone(), PlayerSide::P2),
            Err(FightingMctsError::Config(_))
        );

        std::fs::write(&min_max, "label,avg_hp_diff,avg_distance\nmax,400,900\nmin,-400,0\n").unwrap();
        config.min_max_path = Some(min_max);
        let agent = Agent::initialize(config, PlayerSide::P2).unwrap();
        assert_eq!(agent.side(), PlayerSide::P2);
        assert!(agent.window().is_empty());
    }
}

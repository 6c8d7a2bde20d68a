//! Time-boxed UCT search over the searching side's action sequences.
//!
//! The root is the state a few frames ahead of the live one and is expanded
//! as soon as the tree is built, one child per legal action. Each iteration
//! descends by UCB1 until it meets a child that should be played out rather
//! than expanded:
//!
//! - an unvisited child is always played out
//! - a visited leaf is expanded once it has enough visits and is above the
//!   depth limit, otherwise it is played out again
//! - an expanded child is descended into unless it sits at the depth limit
//!
//! In [`PlayoutMode::SiblingBatch`] "played out" means every sibling of the
//! selected child runs one playout, and the batch total is propagated up
//! the descent path.
use std::fmt::Write;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::action::Action;
use crate::game::character::PlayerSide;
use crate::game::game_state::GameState;
use crate::game::simulator::ForwardSimulator;
use crate::mcts::hyperparameters::{BackpropIncrement, FinalSelection, PlayoutMode, SearchConfig};
use crate::mcts::mcts_result::{ChildStats, DecisionResult};
use crate::mcts::node::SearchNode;
use crate::mcts::playout::{BatchOutcome, PlayoutContext, PlayoutExecutor};
use crate::mcts::selection::{best_score, best_visits, select_child};
use crate::scoring::scoring::Scorer;
use crate::scoring::trajectory::TrajectoryWindow;
use crate::{FightingMctsError, Result};

/// Long-lived collaborators of every decision cycle of one agent.
pub struct SearchEngine {
    config: SearchConfig,
    simulator: ForwardSimulator,
    scorer: Scorer,
    executor: PlayoutExecutor,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("config", &self.config)
            .field("scorer", &self.scorer)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl SearchEngine {
    pub fn new(
        config: SearchConfig,
        simulator: ForwardSimulator,
        scorer: Scorer,
        executor: PlayoutExecutor,
    ) -> Result<Self> {
        config.validate().map_err(FightingMctsError::Config)?;
        Ok(SearchEngine {
            config,
            simulator,
            scorer,
            executor,
        })
    }

    pub fn simulator(&self) -> &ForwardSimulator {
        &self.simulator
    }

    /// Builds a tree rooted at `root_state` and searches until the time
    /// budget is spent.
    pub fn decide(
        &self,
        window: &mut TrajectoryWindow,
        root_state: &GameState,
        side: PlayerSide,
    ) -> Result<DecisionResult> {
        SearchTree::new(self, window, root_state.clone(), side)?.run()
    }
}

/// One decision cycle's tree. Discarded after the decision.
pub struct SearchTree<'a> {
    root: SearchNode,
    ctx: SearchContext<'a>,
}

struct SearchContext<'a> {
    engine: &'a SearchEngine,
    window: &'a mut TrajectoryWindow,
    root_state: GameState,
    side: PlayerSide,
    my_actions: Vec<Action>,
    opp_actions: Vec<Action>,
    rng: StdRng,
    playouts: u64,
    failed_playouts: u64,
}

impl<'a> SearchTree<'a> {
    /// Creates the root and expands it immediately. The window is seeded
    /// with the root state once for the root and once per child.
    pub fn new(
        engine: &'a SearchEngine,
        window: &'a mut TrajectoryWindow,
        root_state: GameState,
        side: PlayerSide,
    ) -> Result<Self> {
        let my_actions = engine.simulator.legal_actions(&root_state, side);
        if my_actions.is_empty() {
            return Err(FightingMctsError::Search(format!(
                "{:?} has no legal action at frame {}",
                side, root_state.frame
            )));
        }
        let opp_actions = engine.simulator.legal_actions(&root_state, side.opponent());

        let mut ctx = SearchContext {
            engine,
            window,
            root_state,
            side,
            my_actions,
            opp_actions,
            rng: StdRng::from_rng(&mut rand::rng()),
            playouts: 0,
            failed_playouts: 0,
        };

        let mut root = SearchNode::new_root();
        ctx.window.seed(&ctx.root_state);
        ctx.expand(&mut root);

        Ok(SearchTree { root, ctx })
    }

    /// Replaces the selection rng, for reproducible tie-breaking.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ctx.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn root(&self) -> &SearchNode {
        &self.root
    }

    /// Root legal actions of the searching side.
    pub fn my_actions(&self) -> &[Action] {
        &self.ctx.my_actions
    }

    pub fn opp_actions(&self) -> &[Action] {
        &self.ctx.opp_actions
    }

    /// One selection, playout and backpropagation pass.
    pub fn iterate(&mut self) {
        let SearchTree { root, ctx } = self;
        match ctx.engine.config.playout_mode {
            PlayoutMode::Single => {
                if ctx.uct_single(root).is_some() {
                    root.visits += 1;
                }
            }
            PlayoutMode::SiblingBatch => {
                ctx.uct_batch(root);
            }
        }
    }

    /// Iterates until the time budget is spent, always at least once, then
    /// picks the root child.
    pub fn run(&mut self) -> Result<DecisionResult> {
        let start = Instant::now();
        let budget = self.ctx.engine.config.time_budget();

        let mut iterations = 0u64;
        loop {
            self.iterate();
            iterations += 1;
            if start.elapsed() > budget {
                break;
            }
        }

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("🌳 Search tree\n{}", self.describe());
        }

        let result = self.decision(iterations, start)?;
        log::debug!("🎯 {}", result.summary());
        Ok(result)
    }

    /// Root child chosen by the configured final selection.
    pub fn best_action(&self) -> Option<Action> {
        let children = self.root.children.as_deref()?;
        let index = match self.ctx.engine.config.final_selection {
            FinalSelection::BestScore => best_score(children),
            FinalSelection::BestVisits => best_visits(children),
        }?;
        children[index].action()
    }

    /// Text dump of every visited node, indented by depth.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "root visits={} score={:.4} nodes={}",
            self.root.visits,
            self.root.score,
            self.root.subtree_size()
        );
        describe_children(&self.root, &mut out);
        out
    }

    fn decision(&self, iterations: u64, start: Instant) -> Result<DecisionResult> {
        let action = self
            .best_action()
            .ok_or_else(|| FightingMctsError::Search("root has no children".to_string()))?;

        let children = self
            .root
            .children
            .iter()
            .flatten()
            .filter_map(|child| {
                Some(ChildStats {
                    action: child.action()?,
                    visits: child.visits,
                    mean_score: child.mean_score(),
                    ucb: child.ucb,
                    failed_playouts: child.failed_playouts,
                })
            })
            .collect();

        Ok(DecisionResult {
            action,
            iterations,
            root_visits: self.root.visits,
            playouts: self.ctx.playouts,
            failed_playouts: self.ctx.failed_playouts,
            tree_size: self.root.subtree_size(),
            elapsed: start.elapsed(),
            children,
        })
    }
}

impl SearchContext<'_> {
    /// Creates one child per root legal action.
    fn expand(&mut self, node: &mut SearchNode) {
        let mut children = Vec::with_capacity(self.my_actions.len());
        for &action in &self.my_actions {
            self.window.seed(&self.root_state);
            children.push(node.child(action));
        }
        node.children = Some(children);
    }

    fn select(&mut self, node: &mut SearchNode) -> Option<usize> {
        let config = &self.engine.config;
        let parent_visits = node.visits;
        select_child(
            node.children.as_deref_mut()?,
            parent_visits,
            config.exploration_constant,
            config.unvisited_bonus,
            config.unvisited_jitter,
            &mut self.rng,
        )
    }

    fn should_descend(&self, child: &SearchNode) -> bool {
        let config = &self.engine.config;
        child.visits > 0
            && child.depth < config.max_depth
            && (child.is_expanded() || child.visits >= config.expansion_threshold)
    }

    /// Single-playout descent. Returns the score credited to `node`'s
    /// selected child, or `None` when its playout failed; nothing on the
    /// path is credited then.
    fn uct_single(&mut self, node: &mut SearchNode) -> Option<f64> {
        let index = self.select(node)?;
        let child = &mut node.children.as_mut()?[index];

        if self.should_descend(child) {
            if !child.is_expanded() {
                self.expand(child);
            }
            let score = self.uct_single(child)?;
            child.visits += 1;
            child.score += score;
            Some(score)
        } else {
            let outcome = self.run_batch(std::slice::from_mut(child), &PlayoutExecutor::inline());
            (outcome.completed > 0).then_some(outcome.total)
        }
    }

    /// Sibling-batch descent. `node` is credited with the batch total and a
    /// visit increment set by [`BackpropIncrement`].
    fn uct_batch(&mut self, node: &mut SearchNode) -> BatchOutcome {
        let engine = self.engine;
        let Some(index) = self.select(node) else {
            return BatchOutcome::default();
        };
        let Some(children) = node.children.as_mut() else {
            return BatchOutcome::default();
        };

        let outcome = if self.should_descend(&children[index]) {
            let child = &mut children[index];
            if !child.is_expanded() {
                self.expand(child);
            }
            self.uct_batch(child)
        } else {
            self.run_batch(children, &engine.executor)
        };

        let increment = match engine.config.backprop_increment {
            BackpropIncrement::SiblingCount => children.len() as u32,
            BackpropIncrement::CompletedPlayouts => outcome.completed,
        };
        node.score += outcome.total;
        node.visits += increment;
        outcome
    }

    fn run_batch(&mut self, siblings: &mut [SearchNode], executor: &PlayoutExecutor) -> BatchOutcome {
        let engine = self.engine;
        let context = PlayoutContext {
            simulator: &engine.simulator,
            scorer: &engine.scorer,
            window: &*self.window,
            root_state: &self.root_state,
            side: self.side,
            my_actions: &self.my_actions,
            opp_actions: &self.opp_actions,
            frames: engine.config.simulation_frames,
        };
        let outcome = executor.run_sibling_batch(siblings, |actions| context.run(actions));

        self.playouts += outcome.completed as u64;
        self.failed_playouts += outcome.failed as u64;
        outcome
    }
}

fn describe_children(node: &SearchNode, out: &mut String) {
    for child in node.children.iter().flatten() {
        if child.visits == 0 && child.failed_playouts == 0 {
            continue;
        }
        let mean = child
            .mean_score()
            .map_or_else(|| "-".to_string(), |m| format!("{:.4}", m));
        let _ = writeln!(
            out,
            "{:indent$}{} visits={} mean={} ucb={:.3} failed={}",
            "",
            child.action().map_or("?", Action::name),
            child.visits,
            mean,
            child.ucb,
            child.failed_playouts,
            indent = child.depth * 2
        );
        describe_children(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::CharacterState;
    use crate::game::fight_model::KinematicModel;
    use crate::game::legal_actions::ActionCatalog;
    use crate::scoring::extractor::FeatureExtractor;
    use crate::scoring::features::FeatureVector;
    use crate::scoring::normalization::NormalizationTable;
    use crate::scoring::oracle::{OracleOutput, ScoringOracle};
    use crate::scoring::scoring::tests::FixedOracle;
    use crate::scoring::scoring::{CombinationPolicy, ScoringModel};
    use assert_matches::assert_matches;
    use std::sync::Arc;

    struct BrokenOracle;

    impl ScoringOracle for BrokenOracle {
        fn name(&self) -> &str {
            "broken"
        }

        fn required_features(&self) -> Vec<&'static str> {
            Vec::new()
        }

        fn evaluate(&self, _features: &FeatureVector) -> Result<OracleOutput> {
            Err(FightingMctsError::Model("model unavailable".to_string()))
        }
    }

    fn engine_with(config: SearchConfig, oracle: Arc<dyn ScoringOracle>, workers: usize) -> SearchEngine {
        let scorer = Scorer::new(
            FeatureExtractor::new(PlayerSide::P2),
            NormalizationTable::unscaled(),
            vec![ScoringModel::new(oracle, 1)],
            CombinationPolicy::Sum,
        )
        .unwrap();
        SearchEngine::new(
            config,
            ForwardSimulator::new(Arc::new(KinematicModel::default()), ActionCatalog::default()),
            scorer,
            PlayoutExecutor::with_workers(workers).unwrap(),
        )
        .unwrap()
    }

    fn engine(config: SearchConfig) -> SearchEngine {
        let oracle = Arc::new(FixedOracle {
            name: "valence",
            class: 1,
            p: 0.75,
        });
        engine_with(config, oracle, 2)
    }

    fn root_state() -> GameState {
        GameState::new(
            CharacterState::standing(PlayerSide::P1, 300),
            CharacterState::standing(PlayerSide::P2, 500),
        )
        .with_frame(600)
    }

    fn config(budget_ms: u64) -> SearchConfig {
        SearchConfig {
            time_budget_ms: budget_ms,
            simulation_frames: 10,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_zero_budget_still_decides() {
        let engine = engine(config(0));
        let mut window = TrajectoryWindow::new(20);

        let result = engine.decide(&mut window, &root_state(), PlayerSide::P1).unwrap();
        let legal = engine.simulator().legal_actions(&root_state(), PlayerSide::P1);

        assert_eq!(result.iterations, 1);
        assert!(legal.contains(&result.action));
        assert_eq!(result.root_visits as usize, legal.len());
        assert_eq!(result.playouts as usize, legal.len());
        assert_eq!(result.failed_playouts, 0);
        assert!(window.is_full());
    }

    #[test]
    fn test_root_is_expanded_on_creation() {
        let engine = engine(config(0));
        let mut window = TrajectoryWindow::new(300);
        let tree = SearchTree::new(&engine, &mut window, root_state(), PlayerSide::P1).unwrap();

        let children = tree.root().children.as_ref().unwrap();
        assert_eq!(children.len(), tree.my_actions().len());
        assert!(children.iter().all(|c| c.depth == 1 && c.visits == 0));
        assert!(!tree.opp_actions().is_empty());
    }

    #[test]
    fn test_batch_backprop_counts_siblings() {
        let engine = engine(config(0));
        let mut window = TrajectoryWindow::new(20);
        let mut tree = SearchTree::new(&engine, &mut window, root_state(), PlayerSide::P1)
            .unwrap()
            .with_seed(11);
        tree.iterate();

        let n = tree.my_actions().len();
        let root = tree.root();
        assert_eq!(root.visits as usize, n);
        assert!((root.score - 0.75 * n as f64).abs() < 1e-9);
        for child in root.children.as_ref().unwrap() {
            assert_eq!(child.visits, 1);
            assert_eq!(child.latest_score, 0.75);
        }
    }

    #[test]
    fn test_single_mode_one_playout_per_iteration() {
        let engine = engine(SearchConfig {
            playout_mode: PlayoutMode::Single,
            ..config(0)
        });
        let mut window = TrajectoryWindow::new(20);
        let mut tree = SearchTree::new(&engine, &mut window, root_state(), PlayerSide::P1)
            .unwrap()
            .with_seed(5);
        tree.iterate();
        tree.iterate();

        let root = tree.root();
        assert_eq!(root.visits, 2);
        let visited: Vec<_> = root
            .children
            .as_ref()
            .unwrap()
            .iter()
            .filter(|c| c.visits > 0)
            .collect();
        assert_eq!(visited.len(), 2);
        assert!(visited.iter().all(|c| c.visits == 1 && c.score == 0.75));
    }

    #[test]
    fn test_expansion_below_threshold_and_depth() {
        let engine = engine(SearchConfig {
            expansion_threshold: 1,
            max_depth: 2,
            ..config(0)
        });
        let mut window = TrajectoryWindow::new(20);
        let mut tree = SearchTree::new(&engine, &mut window, root_state(), PlayerSide::P1)
            .unwrap()
            .with_seed(3);
        let n = tree.my_actions().len();

        // First pass plays out every root child, second pass expands one.
        tree.iterate();
        tree.iterate();

        let root = tree.root();
        assert_eq!(root.subtree_size(), 1 + n + n);
        assert_eq!(root.visits as usize, 2 * n);
        let expanded = root
            .children
            .as_ref()
            .unwrap()
            .iter()
            .find(|c| c.is_expanded())
            .unwrap();
        assert_eq!(expanded.visits as usize, 1 + n);
        for grandchild in expanded.children.as_ref().unwrap() {
            assert_eq!(grandchild.depth, 2);
            assert_eq!(grandchild.actions.len(), 2);
            assert_eq!(grandchild.actions[0], expanded.actions[0]);
            assert_eq!(grandchild.visits, 1);
        }
        assert!(tree.describe().contains("visits="));
    }

    #[test]
    fn test_failed_playouts_under_both_increments() {
        for (increment, expected_root_visits) in [
            (BackpropIncrement::SiblingCount, None),
            (BackpropIncrement::CompletedPlayouts, Some(0)),
        ] {
            let engine = engine_with(
                SearchConfig {
                    backprop_increment: increment,
                    ..config(0)
                },
                Arc::new(BrokenOracle),
                2,
            );
            let mut window = TrajectoryWindow::new(20);
            let mut tree = SearchTree::new(&engine, &mut window, root_state(), PlayerSide::P1).unwrap();
            let n = tree.my_actions().len();
            let result = tree.run().unwrap();

            assert_eq!(result.playouts, 0);
            assert_eq!(result.failed_playouts as usize, n);
            assert_eq!(result.root_visits as usize, expected_root_visits.unwrap_or(n));
            assert!(result.children.iter().all(|c| c.visits == 0 && c.failed_playouts == 1));
            // Nothing was visited, the first root child is chosen.
            assert_eq!(result.action, result.children[0].action);
        }
    }

    #[test]
    fn test_single_mode_failed_playout_credits_nothing() {
        let engine = engine_with(
            SearchConfig {
                playout_mode: PlayoutMode::Single,
                ..config(0)
            },
            Arc::new(BrokenOracle),
            0,
        );
        let mut window = TrajectoryWindow::new(20);
        let result = engine.decide(&mut window, &root_state(), PlayerSide::P1).unwrap();
        assert_eq!(result.root_visits, 0);
        assert_eq!(result.failed_playouts, 1);
    }

    #[test]
    fn test_best_visits_selection() {
        let engine = engine(SearchConfig {
            final_selection: FinalSelection::BestVisits,
            ..config(20)
        });
        let mut window = TrajectoryWindow::new(20);
        let result = engine.decide(&mut window, &root_state(), PlayerSide::P1).unwrap();

        let most = result.children.iter().map(|c| c.visits).max().unwrap();
        assert_eq!(result.chosen().unwrap().visits, most);
        assert!(result.iterations >= 1);
        assert!(result.summary().contains(result.action.name()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let oracle = Arc::new(FixedOracle {
            name: "valence",
            class: 1,
            p: 0.5,
        });
        let scorer = Scorer::new(
            FeatureExtractor::new(PlayerSide::P2),
            NormalizationTable::unscaled(),
            vec![ScoringModel::new(oracle, 1)],
            CombinationPolicy::Sum,
        )
        .unwrap();
        let result = SearchEngine::new(
            SearchConfig {
                simulation_frames: 0,
                ..SearchConfig::default()
            },
            ForwardSimulator::new(Arc::new(KinematicModel::default()), ActionCatalog::default()),
            scorer,
            PlayoutExecutor::inline(),
        );
        assert_matches!(result, Err(FightingMctsError::Config(_)));
    }
}

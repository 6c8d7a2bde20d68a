//! Playouts: simulate a short continuation of the fight and score it.
//!
//! A sibling batch plays out every child of one node together, either on a
//! dedicated rayon pool or inline on the calling thread. A playout that
//! errors or panics is isolated: it is logged, scored 0 and credited no
//! visit, and the batch still returns.

use std::panic::{self, AssertUnwindSafe};

use rand::seq::IndexedRandom;
use rayon::prelude::*;

use crate::game::action::Action;
use crate::game::character::PlayerSide;
use crate::game::game_state::GameState;
use crate::game::simulator::ForwardSimulator;
use crate::mcts::node::SearchNode;
use crate::scoring::scoring::Scorer;
use crate::scoring::trajectory::TrajectoryWindow;
use crate::{FightingMctsError, Result};

/// Read-only inputs shared by every playout of one decision cycle.
pub struct PlayoutContext<'a> {
    pub simulator: &'a ForwardSimulator,
    pub scorer: &'a Scorer,
    pub window: &'a TrajectoryWindow,
    pub root_state: &'a GameState,
    pub side: PlayerSide,
    /// Root legal actions of the searching side.
    pub my_actions: &'a [Action],
    /// Root legal actions of the opponent.
    pub opp_actions: &'a [Action],
    pub frames: u32,
}

impl PlayoutContext<'_> {
    /// Plays `prefix` (or one random root action when it is empty) against
    /// one random opponent action, then scores the window extended with the
    /// simulated frames.
    pub fn run(&self, prefix: &[Action]) -> Result<f64> {
        let mut rng = rand::rng();

        let mine: Vec<Action> = if prefix.is_empty() {
            self.my_actions.choose(&mut rng).copied().into_iter().collect()
        } else {
            prefix.to_vec()
        };
        let theirs: Vec<Action> = self
            .opp_actions
            .choose(&mut rng)
            .copied()
            .into_iter()
            .collect();

        let trace = self.simulator.simulate_with_rng(
            self.root_state,
            self.side,
            [mine.as_slice(), theirs.as_slice()],
            self.frames,
            true,
            &mut rng,
        );
        self.scorer.score_trajectory(self.window, &trace)
    }
}

/// Aggregate of one sibling batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchOutcome {
    /// Sum of the scores of the playouts that completed.
    pub total: f64,
    pub completed: u32,
    pub failed: u32,
}

/// Runs sibling batches, on a worker pool or on the calling thread.
pub struct PlayoutExecutor {
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for PlayoutExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayoutExecutor")
            .field("workers", &self.workers())
            .finish()
    }
}

impl PlayoutExecutor {
    /// Executor that runs every playout on the calling thread.
    pub fn inline() -> Self {
        PlayoutExecutor { pool: None }
    }

    /// Dedicated pool of `workers` threads. Zero workers means inline.
    pub fn with_workers(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Ok(Self::inline());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("playout-{}", i))
            .build()
            .map_err(|e| FightingMctsError::Config(format!("cannot start playout pool: {}", e)))?;
        log::info!("🧵 Playout pool started with {} workers", workers);
        Ok(PlayoutExecutor { pool: Some(pool) })
    }

    pub fn workers(&self) -> usize {
        self.pool.as_ref().map_or(0, |p| p.current_num_threads())
    }

    /// Plays out every sibling once and waits for all of them.
    ///
    /// Each completed playout adds its score to the sibling, counts one
    /// visit and becomes the sibling's latest score.
    ///
    /// # Returns
    /// The sum of the completed scores and the completed/failed counts
    pub fn run_sibling_batch<F>(&self, siblings: &mut [SearchNode], playout: F) -> BatchOutcome
    where
        F: Fn(&[Action]) -> Result<f64> + Sync,
    {
        let results: Vec<Option<f64>> = match &self.pool {
            Some(pool) => pool.install(|| {
                siblings
                    .par_iter_mut()
                    .map(|node| run_isolated(node, &playout))
                    .collect()
            }),
            None => siblings
                .iter_mut()
                .map(|node| run_isolated(node, &playout))
                .collect(),
        };

        results
            .into_iter()
            .fold(BatchOutcome::default(), |mut outcome, result| {
                match result {
                    Some(score) => {
                        outcome.total += score;
                        outcome.completed += 1;
                    }
                    None => outcome.failed += 1,
                }
                outcome
            })
    }
}

/// Runs one playout and records it on `node`. `None` marks a failure.
fn run_isolated<F>(node: &mut SearchNode, playout: &F) -> Option<f64>
where
    F: Fn(&[Action]) -> Result<f64> + Sync,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| playout(&node.actions)));
    match result {
        Ok(Ok(score)) if score.is_finite() => {
            node.record_playout(score);
            return Some(score);
        }
        Ok(Ok(score)) => log::warn!("⚠️ Playout of {:?} returned {}, scored 0", node.actions, score),
        Ok(Err(e)) => log::warn!("⚠️ Playout of {:?} failed: {}", node.actions, e),
        Err(_) => log::warn!("⚠️ Playout of {:?} panicked, scored 0", node.actions),
    }
    node.record_failure();
    None
}

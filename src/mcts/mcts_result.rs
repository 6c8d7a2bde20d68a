use std::time::Duration;

use crate::game::action::Action;

/// Root-level statistics of one child after a search.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildStats {
    pub action: Action,
    pub visits: u32,
    pub mean_score: Option<f64>,
    pub ucb: f64,
    pub failed_playouts: u32,
}

/// Outcome of one decision cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionResult {
    pub action: Action,
    pub iterations: u64,
    pub root_visits: u32,
    pub playouts: u64,
    pub failed_playouts: u64,
    pub tree_size: usize,
    pub elapsed: Duration,
    pub children: Vec<ChildStats>,
}

impl DecisionResult {
    /// Stats of the chosen root child.
    pub fn chosen(&self) -> Option<&ChildStats> {
        self.children.iter().find(|c| c.action == self.action)
    }

    pub fn summary(&self) -> String {
        let mean = self
            .chosen()
            .and_then(|c| c.mean_score)
            .map_or_else(|| "n/a".to_string(), |m| format!("{:.4}", m));
        format!(
            "{} (mean {}) after {} iterations, {} playouts ({} failed), {} nodes in {:.1}ms",
            self.action,
            mean,
            self.iterations,
            self.playouts,
            self.failed_playouts,
            self.tree_size,
            self.elapsed.as_secs_f64() * 1000.0
        )
    }
}

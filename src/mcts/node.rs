//! Search tree node.
//!
//! Children are owned by their parent and created all at once, one per root
//! legal action. The descent path replaces a parent pointer: statistics are
//! updated on the way back up the recursion.

use crate::game::action::Action;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchNode {
    /// Distance from the root (root = 0).
    pub depth: usize,

    /// Actions of the searching side leading to this node, one per level.
    pub actions: Vec<Action>,

    /// Number of times this node has been credited with a playout
    pub visits: u32,

    /// Sum of all scores backpropagated through this node
    pub score: f64,

    /// UCB1 value from the last selection among its siblings
    pub ucb: f64,

    /// Score of the most recent playout run on this node
    pub latest_score: f64,

    /// Playouts on this node that failed and were scored 0
    pub failed_playouts: u32,

    /// `None` until expanded, then one child per legal action
    pub children: Option<Vec<SearchNode>>,
}

impl SearchNode {
    pub fn new_root() -> Self {
        SearchNode {
            depth: 0,
            actions: Vec::new(),
            visits: 0,
            score: 0.0,
            ucb: 0.0,
            latest_score: 0.0,
            failed_playouts: 0,
            children: None,
        }
    }

    /// Unexpanded child reached by playing `action` after this node's actions.
    pub fn child(&self, action: Action) -> Self {
        let mut actions = Vec::with_capacity(self.actions.len() + 1);
        actions.extend_from_slice(&self.actions);
        actions.push(action);

        SearchNode {
            depth: self.depth + 1,
            actions,
            ..SearchNode::new_root()
        }
    }

    /// The action that leads from the parent to this node.
    pub fn action(&self) -> Option<Action> {
        self.actions.last().copied()
    }

    pub fn is_expanded(&self) -> bool {
        self.children.is_some()
    }

    /// Mean backpropagated score, `None` before the first visit.
    pub fn mean_score(&self) -> Option<f64> {
        (self.visits > 0).then(|| self.score / self.visits as f64)
    }

    /// Credits one completed playout.
    pub fn record_playout(&mut self, score: f64) {
        self.score += score;
        self.visits += 1;
        self.latest_score = score;
    }

    /// Marks a failed playout: it contributes 0 and no visit.
    pub fn record_failure(&mut self) {
        self.failed_playouts += 1;
        self.latest_score = 0.0;
    }

    /// Number of nodes in this subtree, this one included.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(SearchNode::subtree_size)
            .sum::<usize>()
    }
}

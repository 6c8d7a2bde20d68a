//! Child selection during descent and for the final decision.
//!
//! Descent uses UCB1 with a large bonus for unvisited children so that every
//! child is tried once before any is revisited. A small random jitter on the
//! bonus spreads the first visits across siblings.

use rand::Rng;

use crate::mcts::node::SearchNode;

/// UCB1 value of a visited child
///
/// Formula: mean + C × sqrt(2 × ln(N_parent) / N_child)
///
/// # Arguments
/// * `mean` - Mean score of the child
/// * `parent_visits` - Visit count of the parent (treated as at least 1)
/// * `child_visits` - Visit count of the child, must be positive
/// * `exploration` - Exploration constant C
pub fn ucb1(mean: f64, parent_visits: u32, child_visits: u32, exploration: f64) -> f64 {
    let parent = parent_visits.max(1) as f64;
    mean + exploration * (2.0 * parent.ln() / child_visits as f64).sqrt()
}

/// Selects the child to descend into and stores each child's UCB1 value
///
/// Unvisited children score `unvisited_bonus` plus a random integer in
/// `0..jitter`. The first child with the strictly greatest value wins.
///
/// # Arguments
/// * `children` - Sibling set, must not be empty
/// * `parent_visits` - Visit count of their parent
///
/// # Returns
/// Index of the selected child, or None for an empty sibling set
pub fn select_child<R: Rng + ?Sized>(
    children: &mut [SearchNode],
    parent_visits: u32,
    exploration: f64,
    unvisited_bonus: f64,
    jitter: u32,
    rng: &mut R,
) -> Option<usize> {
    let mut best_index = None;
    let mut best_ucb = f64::NEG_INFINITY;

    for (i, child) in children.iter_mut().enumerate() {
        child.ucb = match child.mean_score() {
            Some(mean) => ucb1(mean, parent_visits, child.visits, exploration),
            None if jitter > 0 => unvisited_bonus + rng.random_range(0..jitter) as f64,
            None => unvisited_bonus,
        };

        if child.ucb > best_ucb {
            best_ucb = child.ucb;
            best_index = Some(i);
        }
    }

    best_index
}

/// Index of the visited child with the strictly greatest mean score.
/// Falls back to the first child when nothing was visited.
pub fn best_score(children: &[SearchNode]) -> Option<usize> {
    if children.is_empty() {
        return None;
    }

    let mut best_index = 0;
    let mut best_mean = f64::NEG_INFINITY;
    for (i, child) in children.iter().enumerate() {
        if let Some(mean) = child.mean_score() {
            if mean > best_mean {
                best_mean = mean;
                best_index = i;
            }
        }
    }
    Some(best_index)
}

/// Index of the child with the strictly greatest visit count.
pub fn best_visits(children: &[SearchNode]) -> Option<usize> {
    if children.is_empty() {
        return None;
    }

    let mut best_index = 0;
    for (i, child) in children.iter().enumerate() {
        if child.visits > children[best_index].visits {
            best_index = i;
        }
    }
    Some(best_index)
}

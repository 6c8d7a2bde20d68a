use crate::game::game_state::GameState;
use std::collections::VecDeque;

/// Bounded FIFO of recent snapshots giving the scoring models temporal
/// context beyond the simulated frames.
#[derive(Debug, Clone)]
pub struct TrajectoryWindow {
    capacity: usize,
    frames: VecDeque<GameState>,
}

impl TrajectoryWindow {
    pub fn new(capacity: usize) -> Self {
        TrajectoryWindow {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() >= self.capacity
    }

    /// Appends `state`, evicting the oldest snapshot when full.
    pub fn push(&mut self, state: GameState) {
        if self.capacity == 0 {
            return;
        }
        while self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(state);
    }

    /// Records the search root when a tree node is created: a window that is
    /// not yet full is padded to capacity with copies of `root`, a full one
    /// receives a single copy.
    pub fn seed(&mut self, root: &GameState) {
        if self.is_full() {
            self.push(root.clone());
        } else {
            while !self.is_full() {
                self.frames.push_back(root.clone());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameState> + '_ {
        self.frames.iter()
    }

    /// The window as it would look after pushing every state in `extra`,
    /// without modifying it.
    pub fn extended<'a>(&'a self, extra: &'a [GameState]) -> impl Iterator<Item = &'a GameState> + 'a {
        let skip = (self.frames.len() + extra.len()).saturating_sub(self.capacity);
        self.frames.iter().chain(extra.iter()).skip(skip)
    }
}

use std::collections::VecDeque;
use std::sync::Arc;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::game::action::Action;
use crate::game::character::PlayerSide;
use crate::game::fight_model::FightModel;
use crate::game::game_state::GameState;
use crate::game::legal_actions::ActionCatalog;
use crate::game::motion::MotionTable;

/// Projects a fight forward by a number of frames on a private copy of the
/// start state.
#[derive(Clone)]
pub struct ForwardSimulator {
    model: Arc<dyn FightModel>,
    catalog: ActionCatalog,
}

impl ForwardSimulator {
    pub fn new(model: Arc<dyn FightModel>, catalog: ActionCatalog) -> Self {
        ForwardSimulator { model, catalog }
    }

    pub fn motion_table(&self, side: PlayerSide) -> &MotionTable {
        self.model.motion_table(side)
    }

    /// Legal actions of `side` in `state`.
    pub fn legal_actions(&self, state: &GameState, side: PlayerSide) -> Vec<Action> {
        self.catalog
            .legal_actions(&state.character(side), self.model.motion_table(side))
    }

    /// Simulates `frame_budget` frames from `start` with a thread-local rng.
    pub fn simulate(
        &self,
        start: &GameState,
        side: PlayerSide,
        my_actions: &[Action],
        opp_actions: &[Action],
        frame_budget: u32,
        collect_trace: bool,
    ) -> Vec<GameState> {
        let mut rng = rand::rng();
        self.simulate_with_rng(
            start,
            side,
            [my_actions, opp_actions],
            frame_budget,
            collect_trace,
            &mut rng,
        )
    }

    /// Simulates `frame_budget` frames from `start`.
    ///
    /// # Arguments
    /// * `side` - The searching player; `actions[0]` is queued for it and
    ///   `actions[1]` for its opponent.
    /// * `collect_trace` - When true every simulated frame is returned and a
    ///   side whose queue is empty gets a uniformly random legal action
    ///   whenever it has control. When false the queues are played out, the
    ///   remaining frames pass with no new input, and only the final state is
    ///   returned.
    ///
    /// # Returns
    /// Snapshots in chronological order, frame indices increasing by one.
    /// `start` is never modified.
    pub fn simulate_with_rng<R: Rng + ?Sized>(
        &self,
        start: &GameState,
        side: PlayerSide,
        actions: [&[Action]; 2],
        frame_budget: u32,
        collect_trace: bool,
        rng: &mut R,
    ) -> Vec<GameState> {
        let mut state = start.clone();
        let mut queues: [VecDeque<Action>; 2] = Default::default();
        queues[side.index()] = actions[0].iter().copied().collect();
        queues[side.opponent().index()] = actions[1].iter().copied().collect();

        let mut trace = Vec::with_capacity(if collect_trace {
            frame_budget as usize
        } else {
            1
        });

        for _ in 0..frame_budget {
            let mut commands = [None, None];
            for player in PlayerSide::BOTH {
                if !state.character(player).control {
                    continue;
                }
                let queued = queues[player.index()].pop_front();
                commands[player.index()] = match queued {
                    Some(action) => Some(action),
                    None if collect_trace => {
                        self.legal_actions(&state, player).choose(rng).copied()
                    }
                    None => None,
                };
            }

            self.model.step(&mut state, commands);
            if collect_trace {
                trace.push(state.clone());
            }
        }

        if !collect_trace {
            trace.push(state);
        }
        trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::CharacterState;
    use crate::game::fight_model::KinematicModel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn simulator() -> ForwardSimulator {
        ForwardSimulator::new(Arc::new(KinematicModel::default()), ActionCatalog::default())
    }

    fn start() -> GameState {
        GameState::new(
            CharacterState::standing(PlayerSide::P1, 200),
            CharacterState::standing(PlayerSide::P2, 700),
        )
        .with_frame(120)
    }

    #[test]
    fn test_trace_has_one_snapshot_per_frame() {
        let sim = simulator();
        let start = start();
        let mut rng = StdRng::seed_from_u64(7);
        let trace = sim.simulate_with_rng(&start, PlayerSide::P1, [&[], &[]], 30, true, &mut rng);

        assert_eq!(trace.len(), 30);
        for (i, snapshot) in trace.iter().enumerate() {
            assert_eq!(snapshot.frame, start.frame + 1 + i as u32);
        }
    }

    #[test]
    fn test_fast_path_returns_final_state_only() {
        let sim = simulator();
        let start = start();
        let result = sim.simulate(&start, PlayerSide::P1, &[Action::ForwardWalk], &[], 14, false);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].frame, start.frame + 14);
        assert_eq!(result[0].character(PlayerSide::P1).x, 205);
        assert_eq!(result[0].character(PlayerSide::P2).x, 700);
    }

    #[test]
    fn test_start_state_untouched() {
        let sim = simulator();
        let start = start();
        let before = start.clone();
        let _ = sim.simulate(&start, PlayerSide::P2, &[Action::Dash], &[Action::Jump], 30, true);
        assert_eq!(start, before);
    }

    #[test]
    fn test_queue_assigned_to_searching_side() {
        let sim = simulator();
        let start = start();
        let result = sim.simulate(&start, PlayerSide::P2, &[Action::Jump], &[], 1, false);
        assert!(result[0].character(PlayerSide::P2).is_airborne());
        assert!(!result[0].character(PlayerSide::P1).is_airborne());
    }

    #[test]
    fn test_zero_budget() {
        let sim = simulator();
        let start = start();
        assert!(sim.simulate(&start, PlayerSide::P1, &[], &[], 0, true).is_empty());
        assert_eq!(sim.simulate(&start, PlayerSide::P1, &[], &[], 0, false), vec![start]);
    }
}

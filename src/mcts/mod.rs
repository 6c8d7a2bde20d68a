pub mod algorithm;
pub mod hyperparameters;
pub mod mcts_result;
pub mod node;
pub mod playout;
pub mod selection;

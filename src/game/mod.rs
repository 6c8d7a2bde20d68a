pub mod action;
pub mod attack;
pub mod character;
pub mod fight_model;
pub mod game_state;
pub mod legal_actions;
pub mod motion;
pub mod simulator;

/// Frames per second of the host engine.
pub const FPS: u32 = 60;
/// Length of one round.
pub const ROUND_TIME_MS: i64 = 60_000;
pub const STAGE_WIDTH: i32 = 960;
/// Screen y of the floor; characters stand with their bottom edge on it.
pub const GROUND_Y: i32 = 640;
pub const CHARACTER_WIDTH: i32 = 60;
pub const CHARACTER_HEIGHT: i32 = 180;
pub const MAX_HP: i32 = 400;
pub const MAX_ENERGY: i32 = 300;

//! # Fighting MCTS
//!
//! A real-time decision engine for a two-player fighting game.
//!
//! ## Features
//!
//! - **Game Model**: Action catalog, motion tables, frame snapshots and a forward simulator
//! - **Scoring Pipeline**: Trajectory features, min-max normalization and pluggable scoring oracles
//! - **Search Engine**: Time-boxed UCT search with sequential or parallel sibling playouts
//! - **Agent**: Initialize / observe / decide / shutdown lifecycle for a host engine
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fighting_mcts::{agent::Agent, config::AgentConfig, game::character::PlayerSide};
//!
//! # fn main() -> fighting_mcts::Result<()> {
//! let config = AgentConfig::from_json_path("agent.json")?;
//! let mut agent = Agent::initialize(config, PlayerSide::P1)?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Agent lifecycle exposed to the host engine
pub mod agent;

/// Agent configuration loading
pub mod config;

/// Fight domain model and forward simulation
pub mod game;

/// Monte Carlo Tree Search engine
pub mod mcts;

/// Feature extraction, normalization and scoring oracles
pub mod scoring;

/// Logger setup
pub mod logging;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the engine
#[derive(Debug, thiserror::Error)]
pub enum FightingMctsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, FightingMctsError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

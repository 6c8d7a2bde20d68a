use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::seq::IndexedRandom;

use fighting_mcts::agent::Agent;
use fighting_mcts::config::AgentConfig;
use fighting_mcts::game::action::Action;
use fighting_mcts::game::character::{CharacterState, PlayerSide};
use fighting_mcts::game::fight_model::{FightModel, KinematicModel};
use fighting_mcts::game::game_state::GameState;
use fighting_mcts::game::legal_actions::ActionCatalog;
use fighting_mcts::game::motion::MotionTable;
use fighting_mcts::game::simulator::ForwardSimulator;
use fighting_mcts::logging::setup_logging;
use fighting_mcts::scoring::extractor::FeatureExtractor;
use fighting_mcts::scoring::normalization::NormalizationTable;
use fighting_mcts::scoring::oracle::LinearOracle;
use fighting_mcts::scoring::scoring::{Scorer, ScoringModel};

/// Valence model used when the config names none: rewards keeping the
/// opponent close and ahead on HP.
const BUILTIN_VALENCE: &str = r#"{
    "output_field": "Va_rank",
    "classes": [
        { "label": 0, "bias": 0.5, "weights": {} },
        { "label": 1, "bias": 0.0, "weights": { "close_distance_ratio": 1.0, "avg_hp_diff": 0.02 } }
    ]
}"#;

#[derive(Parser, Debug)]
#[command(name = "fighting_mcts", version, about = "Play a local match: MCTS agent vs random opponent")]
struct Cli {
    /// Agent config (JSON). Defaults apply when omitted.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of rounds to play
    #[arg(short = 'r', long, default_value_t = 1)]
    rounds: u32,

    /// Frames per round, at most one full round
    #[arg(short = 'f', long, default_value_t = 600)]
    frames: u32,

    /// Side controlled by the MCTS agent
    #[arg(long, value_enum, default_value = "p1")]
    side: SideCli,

    /// Overrides the configured search budget
    #[arg(long)]
    budget_ms: Option<u64>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write rotated log files to this directory instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SideCli {
    P1,
    P2,
}

impl From<SideCli> for PlayerSide {
    fn from(side: SideCli) -> Self {
        match side {
            SideCli::P1 => PlayerSide::P1,
            SideCli::P2 => PlayerSide::P2,
        }
    }
}

#[derive(Debug, Default)]
struct MatchStats {
    decisions: u64,
    iterations: u64,
    playouts: u64,
    failed_playouts: u64,
    thinking: Duration,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _logger = setup_logging(&cli.log_level, cli.log_dir.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => AgentConfig::from_json_path(path)?,
        None => AgentConfig::default(),
    };
    if let Some(budget) = cli.budget_ms {
        config.search.time_budget_ms = budget;
    }

    let side = PlayerSide::from(cli.side);
    let motions = match &config.motion_path {
        Some(path) => MotionTable::from_csv_path(path)?,
        None => MotionTable::default(),
    };
    let model = Arc::new(KinematicModel::new(motions.clone(), motions));
    let simulator = ForwardSimulator::new(model.clone(), ActionCatalog::default());

    let mut agent = if config.models.is_empty() {
        log::info!("🧠 No scoring model configured, using the built-in valence model");
        let oracle = LinearOracle::from_json_str("valence", BUILTIN_VALENCE)?;
        let models = vec![ScoringModel::new(Arc::new(oracle), 1)];
        let policy = config
            .search
            .combination
            .clone()
            .unwrap_or_else(|| Scorer::default_policy(&models));
        let scorer = Scorer::new(
            FeatureExtractor::new(config.perspective.subject(side)),
            NormalizationTable::unscaled(),
            models,
            policy,
        )?;
        Agent::with_components(config, side, simulator.clone(), scorer)?
    } else {
        Agent::initialize(config, side)?
    };

    log::info!(
        "🥊 {} v{}: {} round(s) of {} frames, agent plays {:?}",
        fighting_mcts::NAME,
        fighting_mcts::VERSION,
        cli.rounds,
        cli.frames,
        side
    );

    let mut stats = MatchStats::default();
    let mut wins = [0u32; 2];
    for round in 1..=cli.rounds {
        let end = play_round(&mut agent, model.as_ref(), &simulator, round, cli.frames, &mut stats)?;
        let (own, opp) = (end.character(side).hp, end.character(side.opponent()).hp);
        log::info!(
            "🏁 Round {} over at frame {}: agent hp {} vs opponent hp {}",
            round,
            end.frame,
            own,
            opp
        );
        if own > opp {
            wins[0] += 1;
        } else if opp > own {
            wins[1] += 1;
        }
    }
    agent.shutdown();

    let mean_ms = if stats.decisions > 0 {
        stats.thinking.as_secs_f64() * 1000.0 / stats.decisions as f64
    } else {
        0.0
    };
    println!("Rounds won: agent {} / opponent {}", wins[0], wins[1]);
    println!(
        "Decisions: {} (mean {:.1} ms), iterations: {}, playouts: {} ({} failed)",
        stats.decisions, mean_ms, stats.iterations, stats.playouts, stats.failed_playouts
    );
    Ok(())
}

/// Plays one round frame by frame and returns the final state.
fn play_round(
    agent: &mut Agent,
    model: &dyn FightModel,
    simulator: &ForwardSimulator,
    round: u32,
    frames: u32,
    stats: &mut MatchStats,
) -> fighting_mcts::Result<GameState> {
    let side = agent.side();
    let mut rng = rand::rng();
    let mut state = GameState::new(
        CharacterState::standing(PlayerSide::P1, 380),
        CharacterState::standing(PlayerSide::P2, 580),
    );
    state.round = round;

    for _ in 0..frames {
        let mut commands: [Option<Action>; 2] = [None, None];

        agent.observe(state.clone());
        if agent.is_ready() {
            let result = agent.decide()?;
            stats.decisions += 1;
            stats.iterations += result.iterations;
            stats.playouts += result.playouts;
            stats.failed_playouts += result.failed_playouts;
            stats.thinking += result.elapsed;
            commands[side.index()] = Some(result.action);
        }

        let opponent = side.opponent();
        if state.is_ready_to_act(opponent) {
            commands[opponent.index()] = simulator
                .legal_actions(&state, opponent)
                .choose(&mut rng)
                .copied();
        }

        model.step(&mut state, commands);
        let knocked_out = PlayerSide::BOTH
            .iter()
            .any(|&s| state.character(s).hp <= 0);
        if knocked_out || state.remaining_time_ms() <= 0 {
            break;
        }
    }
    Ok(state)
}

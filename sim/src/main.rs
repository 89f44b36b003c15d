use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::Rng;
use tracing::info;

use sim::{
    config::{init_tracing, load_settings},
    constants::DEFAULT_TICKS,
    game::{build_app, run_headless, run_realtime},
};

// ============================================================================
// CLI Argument Parsing
// ============================================================================

#[derive(Parser)]
#[command(author, version, about = "Catacomb stalker simulation", long_about = None)]
struct Args {
    // Dungeon seed, random when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    // Number of ticks to simulate
    #[arg(short, long, default_value_t = DEFAULT_TICKS)]
    ticks: u64,

    // JSON settings file; missing fields keep their defaults
    #[arg(long)]
    settings: Option<PathBuf>,

    // Pace ticks against the wall clock
    #[arg(long, default_value_t = false)]
    realtime: bool,

    // Keep the stalker dead once killed
    #[arg(long, default_value_t = false)]
    no_respawn: bool,

    // Log filter used when RUST_LOG is unset
    #[arg(long)]
    log: Option<String>,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref());

    let mut settings = load_settings(args.settings.as_deref())?;
    if args.no_respawn {
        settings.enemy.respawn_enabled = false;
    }

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    info!("starting simulation with seed {seed}");

    let mut app = build_app(&settings, seed)?;
    let report = if args.realtime {
        run_realtime(&mut app, args.ticks).await
    } else {
        run_headless(&mut app, args.ticks)
    };

    info!("{report}");
    Ok(())
}

//! Headless party runner
//!
//! Runs the party for a fixed wall-clock duration, logging who is talking to
//! whom, and optionally writes the final snapshot as JSON.

use clap::Parser;
use party_core::config::DEFAULT_CONFIG_PATH;
use party_core::{PartyConfig, PartyError, PartyRuntime, RuntimeHandle};
use party_events::{Catalog, ConversationState, PartySnapshot};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Command line arguments for the headless party
#[derive(Parser, Debug)]
#[command(name = "party_sim")]
#[command(about = "Physics-driven party where nearby guests strike up conversations")]
struct Args {
    /// Entity catalog as a JSON array (defaults to the bundled sample)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// TOML tuning file (defaults to ./party.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// How long to run, in seconds
    #[arg(long, default_value_t = 30.0)]
    seconds: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Arena width override
    #[arg(long)]
    width: Option<f32>,

    /// Arena height override
    #[arg(long)]
    height: Option<f32>,

    /// Interval between progress reports
    #[arg(long, default_value_t = 2000)]
    report_interval_ms: u64,

    /// Write the final snapshot here as JSON
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), PartyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.print_default_config {
        print!("{}", party_core::config::default_config_toml()?);
        return Ok(());
    }

    let config = load_config(&args)?;
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_file(path)?,
        None => Catalog::sample()?,
    };

    println!("Party Simulation");
    println!("================");
    println!("Guests: {}", catalog.len());
    println!(
        "Arena: {}x{}",
        config.world.arena_width, config.world.arena_height
    );
    match config.schedule.seed {
        Some(seed) => println!("Seed: {}", seed),
        None => println!("Seed: (entropy)"),
    }
    println!("Duration: {}s", args.seconds);
    println!();

    let (runtime, handle) = PartyRuntime::new(config, catalog)?;
    let duration = Duration::from_secs_f64(args.seconds.max(0.0));
    let report_every = Duration::from_millis(args.report_interval_ms.max(1));

    let (summary, ()) = tokio::join!(
        runtime.run(),
        drive(handle.clone(), duration, report_every)
    );

    let snapshot = handle.latest_snapshot();
    println!();
    println!("Simulation complete!");
    println!("  Ticks: {}", summary.ticks);
    println!("  Polls: {}", summary.polls);
    println!("  Conversations started: {}", summary.conversations_started);
    println!("  Conversations ended: {}", summary.conversations_ended);
    println!("  Turns: {}", summary.turns_produced);
    println!("  Active at stop: {}", snapshot.active_count());

    if let Some(path) = &args.snapshot_out {
        write_snapshot(path, &snapshot)?;
        println!("  Snapshot written to {}", path.display());
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<PartyConfig, PartyError> {
    let mut config = match &args.config {
        Some(path) => PartyConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            PartyConfig::from_file(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => PartyConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.schedule.seed = Some(seed);
    }
    if let Some(width) = args.width {
        config.world.arena_width = width;
    }
    if let Some(height) = args.height {
        config.world.arena_height = height;
    }
    config.validate()?;
    Ok(config)
}

/// Reports progress until the deadline or Ctrl-C, then stops the party.
async fn drive(handle: RuntimeHandle, duration: Duration, report_every: Duration) {
    let deadline = tokio::time::Instant::now() + duration;
    let mut report = tokio::time::interval(report_every);
    report.tick().await;

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            _ = report.tick() => log_snapshot(&handle.latest_snapshot()),
        }
    }
    handle.stop();
}

fn log_snapshot(snapshot: &PartySnapshot) {
    tracing::info!(
        "t={:.1}s tick {}: {} active conversations",
        snapshot.elapsed_ms as f64 / 1000.0,
        snapshot.tick,
        snapshot.active_count()
    );
    for conversation in &snapshot.conversations {
        if conversation.state != ConversationState::Active {
            continue;
        }
        let (a, b) = conversation.participants();
        if let Some(turn) = &conversation.last_turn {
            tracing::info!(
                "  {} & {} ({} turns) {}: {}",
                a,
                b,
                conversation.turn_count,
                turn.speaker_id,
                turn.text
            );
        }
    }
}

fn write_snapshot(path: &Path, snapshot: &PartySnapshot) -> Result<(), PartyError> {
    std::fs::write(path, snapshot.to_json()?)?;
    Ok(())
}

use anima_core::{AnimaConfig, Episode};
use anima_memory::{spawn_maintenance, AffectCoordinator, EmotionStore, SleepDepth};
use anima_reasoning::{build_collaborator, CollaboratorHandle};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file (missing file means defaults)
    #[arg(short, long, default_value = "anima.toml")]
    config: PathBuf,

    /// Path to the emotional state database (overrides config)
    #[arg(short, long, env = "ANIMA_DB_PATH")]
    db: Option<String>,

    /// Seed every random source for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record an event and show how it felt
    Feel {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Print the current affective context
    Status,
    /// Print recorded emotions from the last N hours
    Timeline {
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
    /// Run a sleep session over a JSONL file of {"prompt", "response"} episodes
    Sleep {
        #[arg(long)]
        episodes: PathBuf,
        #[arg(long, default_value = "full")]
        depth: SleepDepth,
        #[arg(long, default_value_t = 1)]
        cycles: u32,
    },
    /// Keep ticking and snapshotting until Ctrl-C or the time runs out
    Run {
        #[arg(long)]
        secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut config = AnimaConfig::load_or_default(&args.config);
    if let Some(db) = args.db {
        config.persistence.db_path = db;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let collaborator = CollaboratorHandle::from_option(build_collaborator(&config.llm)?, config.llm.timeout());
    info!("Opening emotional state at {}", config.persistence.db_path);
    let store = EmotionStore::open(&config.persistence.db_path).await?;
    let mut coordinator = AffectCoordinator::init(config, collaborator, Some(store), Utc::now()).await?;

    match args.command {
        Command::Feel { text } => {
            let event = text.join(" ");
            let state = coordinator.record_event(&event, Utc::now()).await;
            println!("{} ({:.2})", state.emotion, state.intensity);
            println!("{}", coordinator.engine().describe());
            if let Some(line) = coordinator.engine_mut().express_emotion().await {
                println!("{}", line);
            }
        }
        Command::Status => {
            coordinator.tick(Utc::now());
            print!("{}", coordinator.engine().affective_context(Utc::now()));
            print!("\n{}", coordinator.engine().complexity_context());
        }
        Command::Timeline { hours } => {
            if let Some(store) = coordinator.store() {
                let entries = store.timeline(hours, Utc::now()).await?;
                if entries.is_empty() {
                    println!("No emotions recorded in the last {}h", hours);
                }
                for e in entries {
                    println!(
                        "{} {:<14} {:.2} {}",
                        e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        e.emotion,
                        e.intensity,
                        e.cause
                    );
                }
            }
        }
        Command::Sleep { episodes, depth, cycles } => {
            let batch = read_episodes(&episodes)?;
            info!("Sleeping over {} episodes ({} x {})", batch.len(), cycles, depth);
            coordinator.enter_sleep(batch, Utc::now());
            for _ in 0..cycles {
                let report = coordinator.process_sleep(depth, Utc::now()).await?;
                println!("{}", serde_json::to_string(&report)?);
            }
            coordinator.exit_sleep(Utc::now()).await?;
            println!("{}", coordinator.sleep().sleep_summary_text());
            if let Some(share) = coordinator.sleep().morning_share() {
                println!("{}", share);
            }
        }
        Command::Run { secs } => {
            coordinator = run_maintenance(coordinator, secs).await?;
            print!("{}", coordinator.engine().affective_context(Utc::now()));
        }
    }

    if let Some(drift) = coordinator.update_baselines(Utc::now()).await? {
        info!("Recent emotions lean toward {}", drift);
    }
    coordinator.teardown(Utc::now()).await?;
    Ok(())
}

async fn run_maintenance(coordinator: AffectCoordinator, secs: Option<u64>) -> Result<AffectCoordinator> {
    let tick = Duration::from_secs(coordinator.config().persistence.tick_interval_secs.max(1));
    let snap = Duration::from_secs(coordinator.config().persistence.snapshot_interval_secs.max(1));
    let shared = Arc::new(Mutex::new(coordinator));
    let (tx, rx) = watch::channel(false);
    let handle = spawn_maintenance(shared.clone(), tick, snap, rx);

    match secs {
        Some(s) => tokio::time::sleep(Duration::from_secs(s)).await,
        None => {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            }
        }
    }
    let _ = tx.send(true);
    if let Err(e) = handle.await {
        tracing::warn!("Maintenance task ended abnormally: {}", e);
    }

    match Arc::try_unwrap(shared) {
        Ok(m) => Ok(m.into_inner()),
        Err(_) => anyhow::bail!("maintenance task still holds the coordinator"),
    }
}

fn read_episodes(path: &Path) -> Result<Vec<Episode>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read episodes file: {}", path.display()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<Episode>(line)
                .with_context(|| format!("Invalid episode on line {}", i + 1))
        })
        .collect()
}

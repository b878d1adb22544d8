//! Session replay CLI - inspect configuration and simulate capture runs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use session_replay_core::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "session-replay")]
#[command(about = "Session replay capture pipeline CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to session-replay.toml plus environment)
    #[arg(short, long, global = true, env = "SESSION_REPLAY_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated capture session and print the emitted stream
    Simulate {
        /// Number of snapshots to capture
        #[arg(short, long, default_value_t = 5)]
        snapshots: usize,

        /// Input event batches captured after each snapshot
        #[arg(short, long, default_value_t = 1)]
        input_events: usize,

        /// Resource-encoding jobs attached to each snapshot
        #[arg(short, long, default_value_t = 2)]
        resource_jobs: usize,

        /// Simulated encoding time per resource job, in milliseconds
        #[arg(short, long, default_value_t = 20)]
        encode_delay_ms: u64,
    },
    /// Print the effective configuration
    Config,
    /// Version information
    Version,
}

fn load_config(path: Option<&Path>) -> Result<SessionReplayConfig> {
    SessionReplayConfig::load_with(path).context("failed to load configuration")
}

async fn simulate(
    config: SessionReplayConfig,
    snapshots: usize,
    input_events: usize,
    resource_jobs: usize,
    encode_delay: Duration,
) -> Result<()> {
    if !config.enabled {
        tracing::warn!("Session replay is disabled; nothing to simulate");
        return Ok(());
    }

    let processor = Arc::new(CollectingProcessor::new());
    let context = SessionReplayContext::new(
        "session-replay-cli",
        uuid::Uuid::new_v4().to_string(),
        uuid::Uuid::new_v4().to_string(),
    );
    let handler = Arc::new(
        QueueHandler::builder()
            .processor(processor.clone())
            .context_provider(Arc::new(StaticContextProvider::new(context)))
            .config(config.queue.clone())
            .build()?,
    );

    let cancel = CancellationToken::new();
    let ticker = spawn_periodic_drain(handler.clone(), config.queue.drain_interval, cancel.clone());

    let clock = SystemTimeProvider::new();
    let mut encoders = Vec::new();
    for frame in 0..snapshots {
        let Some(snapshot) = handler.add_snapshot_item(SystemInformation::default()) else {
            continue;
        };
        let refs = RecordedDataQueueRefs::new(&handler, &snapshot);

        for job in 0..resource_jobs {
            refs.increment_pending_jobs();
            let refs = refs.clone();
            let handler = handler.clone();
            encoders.push(tokio::spawn(async move {
                tokio::time::sleep(encode_delay).await;
                handler.add_resource_item(format!("frame-{}-res-{}", frame, job), vec![0xAB; 64]);
                refs.decrement_pending_jobs();
            }));
        }

        let nodes = (0..=resource_jobs)
            .map(|id| Node::new(id as i64, if id == 0 { "root" } else { "image" }))
            .collect();
        snapshot.finish_traversal(nodes);

        for batch in 0..input_events {
            handler.add_input_event_item(vec![InputEvent {
                kind: InputEventKind::PointerDown,
                pointer_id: batch as i64,
                x: frame as i64,
                y: batch as i64,
                timestamp_ms: clock.timestamp_ms(),
            }]);
        }
        handler.try_to_consume_items();
    }

    for encoder in encoders {
        encoder.await.context("resource encoder task failed")?;
    }

    // let the ticker flush anything still waiting, bounded by the max delay
    let deadline = tokio::time::Instant::now() + config.queue.max_delay * 2;
    loop {
        let metrics = handler.metrics();
        if handler.is_empty() && metrics.emitted as usize <= processor.len() {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!("Timed out waiting for the queue to settle");
            break;
        }
        tokio::time::sleep(config.queue.drain_interval).await;
    }

    cancel.cancel();
    ticker.await.context("periodic drain task failed")?;
    handler.clear_and_stop_processing_queue();
    handler.await_termination(Duration::from_secs(5)).await;

    let output = serde_json::json!({
        "records": processor.records(),
        "metrics": handler.metrics(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            snapshots,
            input_events,
            resource_jobs,
            encode_delay_ms,
        } => {
            let config = load_config(cli.config.as_deref())?;
            simulate(
                config,
                snapshots,
                input_events,
                resource_jobs,
                Duration::from_millis(encode_delay_ms),
            )
            .await?;
        }
        Commands::Config => {
            let config = load_config(cli.config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Version => {
            println!("session-replay {}", env!("CARGO_PKG_VERSION"));
            println!("session-replay-core {}", session_replay_core::VERSION);
        }
    }

    Ok(())
}

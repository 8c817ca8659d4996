//! scenefsm - State machine runner
//!
//! Compiles a state machine program, runs it on a fixed tick, and feeds it
//! event names read line by line from stdin.

use scenefsm_core::Submission;
use scenefsm_host::{Config, Runner};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration (from file if SCENEFSM_CONFIG is set, then env overrides)
    let config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("SCENEFSM_CONFIG") {
                tracing::info!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            if std::env::var("SCENEFSM_CONFIG").is_ok() {
                tracing::error!("Failed to load config: {}", e);
                return Err(e.into());
            }
            tracing::info!("Using default configuration");
            Config::default()
        }
    };

    tracing::info!("Starting scenefsm");
    tracing::info!("  Program: {}", config.program.path.display());
    tracing::info!("  Tick interval: {}ms", config.runtime.tick_interval_ms);
    tracing::info!(
        "  Activation latency: {}ms",
        config.runtime.activation_latency_ms
    );

    let runner = match Runner::from_config(&config) {
        Ok(runner) => Arc::new(runner),
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            return Err(e.into());
        }
    };

    // Echo transitions as JSON lines
    if config.runtime.echo_transitions {
        let mut transitions = runner.subscribe();
        tokio::spawn(async move {
            loop {
                match transitions.recv().await {
                    Ok(record) => match serde_json::to_string(&record) {
                        Ok(json) => println!("{}", json),
                        Err(e) => tracing::warn!("Failed to encode transition: {}", e),
                    },
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Transition echo lagged {} records", n);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    // Feed stdin lines to the machine as event names
    let input_runner = runner.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let name = line.trim();
                    if name.is_empty() || name.starts_with('#') {
                        continue;
                    }
                    match input_runner.submit(name) {
                        Ok(Submission::Accepted) => tracing::debug!("Queued {}", name),
                        Ok(Submission::Dropped) => {}
                        Err(e) => tracing::warn!("{}", e),
                    }
                }
                Ok(None) => {
                    tracing::info!("stdin closed; no further events");
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    // Spawn shutdown signal handler
    let shutdown_runner = runner.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Received shutdown signal, stopping runner...");
        shutdown_runner.shutdown();
    });

    // Run the machine (blocks until shutdown)
    runner.run().await;

    let snapshot = runner.snapshot();
    tracing::info!(
        "Stopped in state {} after {} transitions",
        snapshot.state,
        snapshot.transitions
    );
    Ok(())
}

//! FakeMan agent process.
//!
//! Reads configuration from environment variables (see [`config::Config`]
//! and [`fakeman_agency::AgencyConfig`]), restores the agent from the data
//! directory, then runs the agency loop against the mailbox directory until
//! SIGINT.
//!
//! ## Quick start
//!
//! ```bash
//! # Dry run with the echo generator
//! FAKEMAN_ECHO=1 cargo run --bin fakeman-server --release
//!
//! # Drive an external model
//! FAKEMAN_GENERATOR_CMD="ollama run llama3" \
//! FAKEMAN_AGENCY_GATE=llm \
//! FAKEMAN_LOG_LEVEL=fakeman_agency=debug,info \
//!   cargo run --bin fakeman-server --release
//!
//! # Talk to it
//! echo '{"text": "hello"}' > comm/input.json && sleep 2 && cat comm/output.json
//! ```

mod config;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use fakeman_agency::{
    build_gate, AgencyConfig, AgencyEngine, AgentStore, CommandGenerator, EchoGenerator, FileMailbox,
    Generator, GeneratorSummarizer,
};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────────
    let config = Config::from_env();

    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .compact()
        .init();

    let agency = AgencyConfig::from_env();
    info!(
        version  = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir,
        comm_dir = %config.comm_dir,
        gate     = ?agency.gate_mode,
        "FakeMan starting"
    );

    // ── Generator ─────────────────────────────────────────────────────────────
    let command = if config.use_echo {
        None
    } else {
        config.generator_cmd.as_deref().and_then(CommandGenerator::from_command_line)
    };
    let generator: Arc<dyn Generator> = match command {
        Some(cmd) => {
            info!(command = ?config.generator_cmd, "using external generator");
            Arc::new(cmd)
        }
        None => {
            if !config.use_echo {
                warn!("FAKEMAN_GENERATOR_CMD not set, falling back to the echo generator");
            }
            Arc::new(EchoGenerator)
        }
    };

    // ── Agent state ───────────────────────────────────────────────────────────
    let store = AgentStore::open(&config.data_dir)?;
    let mailbox = FileMailbox::open(&config.comm_dir)?;
    let gate = build_gate(&agency, generator.clone());
    let mut engine = AgencyEngine::restore(agency, store, generator.clone(), gate, mailbox)?;
    if config.summarize_with_generator {
        engine = engine.with_summarizer(Arc::new(GeneratorSummarizer::new(generator)));
    }

    // ── Agency loop ───────────────────────────────────────────────────────────
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut task = tokio::spawn(async move { engine.run(stop_rx).await });

    tokio::select! {
        joined = &mut task => {
            return match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    error!(error = %e, "agency loop failed");
                    Err(e.into())
                }
                Err(e) => Err(anyhow::anyhow!("agency task panicked: {e}")),
            };
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT, shutting down gracefully");
        }
    }

    // The loop persists and publishes `stopped` on its way out.
    let _ = stop_tx.send(true);
    match task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "agency loop failed during shutdown"),
        Err(e) => error!(error = %e, "agency task panicked during shutdown"),
    }

    info!("FakeMan shutdown complete");
    Ok(())
}

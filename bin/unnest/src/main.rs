//! Unnest - flattens decoded Substrate extrinsics into atomic call records.
//!
//! # Usage
//!
//! ```bash
//! # Read transactions from stdin, write call records to stdout
//! unnest < transactions.jsonl > calls.jsonl
//!
//! # Files, strict correlation and a metrics endpoint
//! unnest --input transactions.jsonl --output calls.jsonl --mode correlated --metrics-port 9090
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tokio::sync::watch;
use tracing::{Instrument, debug, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt};

use unnest_core::metrics::init_metrics;
use unnest_core::services::{PipelineConfig, PipelineService};
use unnest_flatten::{BatchAllEvents, Decomposer, FlattenMode, FlattenerConfig};
use unnest_flatten::config::{DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_DEPTH, DEFAULT_MAX_EVENTS};
use unnest_io::{Input, JsonLinesSink, JsonLinesSource, Output};

/// Unnest CLI - nested call flattener.
#[derive(Parser, Debug)]
#[command(name = "unnest")]
#[command(about = "Unnest - flattens nested Substrate calls and attributes their events")]
#[command(version)]
struct Cli {
    /// Transactions to read, one JSON object per line ("-" for stdin).
    #[arg(long, env = "INPUT", default_value = "-")]
    input: Input,

    /// Where to write call records, one JSON object per line ("-" for stdout).
    #[arg(long, env = "OUTPUT", default_value = "-")]
    output: Output,

    /// Event correlation: auto, correlated or basic.
    #[arg(long, env = "FLATTEN_MODE", default_value = "auto")]
    mode: FlattenMode,

    /// Event count above which correlation is refused.
    #[arg(long, env = "MAX_EVENTS", default_value_t = DEFAULT_MAX_EVENTS)]
    max_events: usize,

    /// Batch size above which a transaction is rejected.
    #[arg(long, env = "MAX_BATCH_SIZE", default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    max_batch_size: usize,

    /// Maximum nesting depth of composite calls.
    #[arg(long, env = "MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Events of successful batchAll items: grouped or none.
    #[arg(long, env = "BATCH_ALL_EVENTS", default_value = "grouped")]
    batch_all_events: BatchAllEvents,

    /// Flush the output after this many transactions (0 = only at the end).
    #[arg(long, env = "FLUSH_EVERY", default_value_t = 100)]
    flush_every: usize,

    /// Prometheus metrics port (disabled when unset).
    #[arg(long, env = "METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn flattener_config(&self) -> FlattenerConfig {
        FlattenerConfig {
            mode: self.mode,
            max_events: self.max_events,
            max_batch_size: self.max_batch_size,
            max_depth: self.max_depth,
            batch_all_events: self.batch_all_events,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled = match cli.metrics_port {
        Some(port) => start_metrics(port),
        None => false,
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Unnest");
    let flattener_config = cli.flattener_config();
    debug!(config = ?flattener_config, "Flattener configuration");

    let decomposer = Decomposer::new(flattener_config);
    debug!(
        signatures = ?decomposer.registry().registered_signatures(),
        "Composite calls"
    );

    let source = JsonLinesSource::new(cli.input.clone());
    let sink = JsonLinesSink::open(&cli.output)
        .await
        .with_context(|| format!("Failed to open output {}", cli.output))?;

    let pipeline = PipelineService::new(
        PipelineConfig {
            flush_every: cli.flush_every,
        },
        Arc::new(source),
        Arc::new(sink),
        Arc::new(decomposer),
    );

    info!("✅ Unnest ready");
    info!("   📥 Input:    {}", cli.input);
    info!("   📤 Output:   {}", cli.output);
    if metrics_enabled {
        if let Some(port) = cli.metrics_port {
            info!("   📊 Metrics:  http://localhost:{}/metrics", port);
        }
    } else {
        info!("   📊 Metrics:  disabled");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ PIPELINE
    // ─────────────────────────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut pipeline_handle = tokio::spawn(
        async move { pipeline.run(shutdown_rx).await }.instrument(info_span!("pipeline")),
    );

    let joined = tokio::select! {
        joined = &mut pipeline_handle => joined,
        _ = shutdown_signal() => {
            // ─────────────────────────────────────────────────────────────────
            // 🛑 SHUTDOWN
            // ─────────────────────────────────────────────────────────────────
            info!("🛑 Shutting down...");
            let _ = shutdown_tx.send(true);

            match tokio::time::timeout(Duration::from_secs(30), &mut pipeline_handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("⚠️  Pipeline shutdown timed out");
                    return Ok(());
                }
            }
        }
    };

    let stats = joined
        .context("Pipeline task failed")?
        .context("Pipeline stopped with an error")?;

    info!(
        processed = stats.processed,
        skipped = stats.skipped,
        calls = stats.calls,
        fallbacks = stats.fallbacks,
        "🏁 Done"
    );
    Ok(())
}

/// Install the Prometheus exporter on `port`.
fn start_metrics(port: u16) -> bool {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            init_metrics();
            true
        }
        Err(e) => {
            warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e);
            false
        }
    }
}

/// Initialize tracing subscriber.
///
/// Logs go to stderr; stdout may carry the call records.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "⚠️  Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "⚠️  Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

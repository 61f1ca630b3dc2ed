//! Command-line surface and the validated settings built from it.

use std::time::Duration;

use anyhow::{Context, ensure};
use clap::{Args, Parser, Subcommand};

use monito_api::Latency;
use monito_client::{HttpServiceApi, ServiceFilters, StatusFilter};

#[derive(Parser, Debug)]
#[command(name = "monitod", about = "MonitoCorp service status daemon")]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "MONITO_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the status API over an in-memory store.
    Serve(ServeArgs),
    /// Poll a running server and log what the dashboard would show.
    Watch(WatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on.
    #[arg(long, env = "MONITO_PORT", default_value = "8080")]
    pub port: u16,

    /// Lower bound of the simulated response delay.
    #[arg(long, env = "MONITO_LATENCY_MIN_MS", default_value = "100")]
    pub latency_min_ms: u64,

    /// Upper bound of the simulated response delay. 0 with a 0 minimum disables it.
    #[arg(long, env = "MONITO_LATENCY_MAX_MS", default_value = "300")]
    pub latency_max_ms: u64,

    /// Start with an empty catalog.
    #[arg(long, env = "MONITO_NO_SEED")]
    pub no_seed: bool,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Base URL of the API, including any path prefix.
    #[arg(long, env = "MONITO_SERVER", default_value = "http://127.0.0.1:8080/api")]
    pub server: String,

    /// Only show services in this status (all, online, degraded, offline).
    #[arg(long, default_value = "all")]
    pub status: String,

    /// Case-insensitive match on name or type.
    #[arg(long, default_value = "")]
    pub search: String,

    /// Seconds between list polls.
    #[arg(long, env = "MONITO_POLL_SECS", default_value = "15")]
    pub poll_secs: u64,

    /// Also open this service's detail view and walk its event history.
    #[arg(long)]
    pub service: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value = "10")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub port: u16,
    pub latency: Latency,
    pub seed: bool,
}

impl ServeConfig {
    pub fn from_args(args: &ServeArgs) -> anyhow::Result<Self> {
        ensure!(
            args.latency_min_ms <= args.latency_max_ms,
            "latency minimum ({} ms) exceeds maximum ({} ms)",
            args.latency_min_ms,
            args.latency_max_ms
        );
        Ok(Self {
            port: args.port,
            latency: Latency::between(args.latency_min_ms, args.latency_max_ms),
            seed: !args.no_seed,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub api: HttpServiceApi,
    pub filters: ServiceFilters,
    pub poll_interval: Duration,
    pub service: Option<String>,
}

impl WatchConfig {
    pub fn from_args(args: &WatchArgs) -> anyhow::Result<Self> {
        ensure!(args.poll_secs > 0, "poll interval must be at least one second");
        ensure!(args.timeout_secs > 0, "timeout must be at least one second");

        let status: StatusFilter = args
            .status
            .parse()
            .with_context(|| format!("invalid --status {:?}", args.status))?;
        let api = HttpServiceApi::from_url(&args.server)
            .with_context(|| format!("invalid --server {:?}", args.server))?
            .with_timeout(Duration::from_secs(args.timeout_secs));

        Ok(Self {
            api,
            filters: ServiceFilters::new(status, args.search.trim()),
            poll_interval: Duration::from_secs(args.poll_secs),
            service: args
                .service
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }
}

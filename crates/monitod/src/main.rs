//! monitod — the MonitoCorp daemon.
//!
//! One binary, two modes:
//! - `serve`: the status API (store, simulator, event log) over HTTP
//! - `watch`: the dashboard data layer polling a running server
//!
//! # Usage
//!
//! ```text
//! monitod serve --port 8080
//! monitod watch --server http://127.0.0.1:8080/api --status degraded
//! ```

mod config;
mod serve;
mod watch;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{Cli, Command, ServeConfig, WatchConfig};

const DEFAULT_LOG_FILTER: &str = "info,monitod=debug,monito=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Serve(args) => serve::run_serve(ServeConfig::from_args(&args)?).await,
        Command::Watch(args) => watch::run_watch(WatchConfig::from_args(&args)?).await,
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

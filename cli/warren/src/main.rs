//! warren - RabbitMQ cluster membership reconciler
//!
//! Meant to be run periodically (e.g. from cron or a systemd timer) on each
//! broker node. Each run performs a single reconciliation pass and exits.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod config;
mod error;

use cli::{Cli, LogFormat};
use error::ExitStatus;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let status = match cli.run().await {
        Ok(status) => status,
        Err(e) => {
            error::print_error(&e);
            ExitStatus::Startup
        }
    };

    std::process::exit(status.code());
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

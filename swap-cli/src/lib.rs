pub mod cli;
pub mod commands;
pub mod console;

pub use cli::{Cli, Command};
pub use commands::{execute, run, Services};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(level: &str) {
    let fallback = format!(
        "swap_cli={level},swap_booking={level},swap_catalog={level},swap_client={level}"
    );
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

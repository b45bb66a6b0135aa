//! Process-level startup helpers.

use std::fmt::Display;
use std::process;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Prefer `RUST_LOG` if set; otherwise use a sensible default, e.g.
/// `RUST_LOG=info,fhir_sim_util=debug cargo run`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Log the error and terminate the process with status 1.
///
/// For unrecoverable startup-time failures only (bad config, missing data
/// files). Library code everywhere else returns errors to the caller.
pub fn die(error: impl Display) -> ! {
    tracing::error!(%error, "fatal startup error");
    eprintln!("{error}");
    process::exit(1)
}

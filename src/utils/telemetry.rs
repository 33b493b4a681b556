//! Logging setup

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Where formatted log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Keeps stdout free for protocol traffic
    Stderr,
}

/// Install the global subscriber. `RUST_LOG` overrides `default_directive`.
/// Calling it twice is harmless; the second call does nothing.
pub fn init_tracing(default_directive: &str, target: LogTarget) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let result = match target {
        LogTarget::Stdout => Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init(),
        LogTarget::Stderr => Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

//! Tracing setup
//!
//! Installs a `tracing_subscriber` formatter once per process. `RUST_LOG`
//! takes precedence over the default filter.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static TRACING_INITIALIZED: OnceLock<bool> = OnceLock::new();

/// Output format for [`init_tracing_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Initialize tracing with a default filter such as `"info"` or `"cairn_stack=debug"`
///
/// Returns `true` if the subscriber installed by this module is active.
pub fn init_tracing(default_filter: &str) -> bool {
    init_tracing_with(default_filter, LogFormat::Pretty)
}

/// Initialize tracing with an explicit output format
///
/// Later calls are no-ops; an already installed global subscriber (from a
/// host process or another test) is left in place.
pub fn init_tracing_with(default_filter: &str, format: LogFormat) -> bool {
    *TRACING_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let installed = match format {
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(fmt::layer().with_target(true))
                .with(filter)
                .try_init()
                .is_ok(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(fmt::layer().json().with_target(true))
                .with(filter)
                .try_init()
                .is_ok(),
        };

        if installed {
            tracing::debug!(format = ?format, "Tracing initialized");
        }
        installed
    })
}

#![forbid(unsafe_code)]

//! Stderr tracing setup for slotgrid hosts.
//!
//! The engine itself only emits `tracing` events (targets `slotgrid.layout`,
//! `slotgrid.slider`, `slotgrid.reorder`). Hosts that do not already install a
//! subscriber can call [`init_from_env`] once at startup.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SLOTGRID_LOG` | `slotgrid=info` | `EnvFilter` directives |

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

/// Environment variable holding the filter directives.
pub const LOG_ENV_VAR: &str = "SLOTGRID_LOG";

/// Filter used when [`LOG_ENV_VAR`] is unset or unparsable.
pub const DEFAULT_DIRECTIVES: &str = "slotgrid=info";

/// Directives used when the caller asks for verbose output.
pub const VERBOSE_DIRECTIVES: &str = "slotgrid=trace,debug";

/// Build the filter from [`LOG_ENV_VAR`], falling back to the defaults.
#[must_use]
pub fn filter_from_env(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new(VERBOSE_DIRECTIVES)
        } else {
            EnvFilter::new(DEFAULT_DIRECTIVES)
        }
    })
}

/// Install a global stderr subscriber.
///
/// Fails if a global subscriber is already set; callers usually ignore that.
pub fn init_from_env(verbose: bool) -> Result<(), TryInitError> {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter_from_env(verbose))
        .with(layer)
        .try_init()
}

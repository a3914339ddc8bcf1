//! Tracing initialisation for the `screener` binary.
//!
//! Logs go to stderr so `--json` command output on stdout stays parseable.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "screener=info,screener_runtime=info";
const VERBOSE_FILTER: &str = "screener=debug,screener_runtime=debug";
const QUIET_FILTER: &str = "screener=warn,screener_runtime=warn";

/// Verbosity selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (_, true) => Verbosity::Verbose,
            (true, false) => Verbosity::Quiet,
            _ => Verbosity::Normal,
        }
    }

    fn default_filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => QUIET_FILTER,
            Verbosity::Normal => DEFAULT_FILTER,
            Verbosity::Verbose => VERBOSE_FILTER,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbosity`.
/// Only the first call takes effect.
pub fn init_tracing(json: bool, verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_filter()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .ok();
    }
}

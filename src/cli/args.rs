//! Command-line argument structures.

use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::walk::{DEFAULT_PORT, WalkConfig};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `OID (hint) = value`, one row per line.
    #[default]
    Human,
    /// Pretty-printed JSON, one object per walk.
    Json,
    /// Tab-separated `OID<TAB>value`.
    Raw,
    /// All walks joined by index into aligned columns.
    Table,
}

/// Target and protocol options shared by every command.
#[derive(Debug, Parser)]
pub struct CommonArgs {
    /// Agent host name or address, optionally with `:port`.
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Community string.
    #[arg(short = 'c', long = "community", default_value = "public")]
    pub community: String,

    /// Time budget for the whole walk, in seconds.
    #[arg(short = 't', long = "timeout", default_value = "5")]
    pub timeout: f64,

    /// Agent port, when TARGET does not carry one.
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl CommonArgs {
    /// Timeout as a [`Duration`]; negative or non-finite values become zero.
    pub fn timeout_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout).unwrap_or(Duration::ZERO)
    }

    /// Walk settings derived from these arguments.
    pub fn walk_config(&self) -> WalkConfig {
        WalkConfig {
            community: self.community.clone(),
            timeout: self.timeout_duration(),
            port: self.port,
            ..WalkConfig::default()
        }
    }
}

/// Output and diagnostics options.
#[derive(Debug, Parser)]
pub struct OutputArgs {
    /// Output format.
    #[arg(short = 'O', long = "output", value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Do not show well-known OID names next to OIDs.
    #[arg(long = "no-hints")]
    pub no_hints: bool,

    /// Print the elapsed time.
    #[arg(long = "timing")]
    pub timing: bool,

    /// Log debug events to stderr.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Log every datagram to stderr.
    #[arg(short = 'D', long = "trace", conflicts_with = "debug")]
    pub trace: bool,
}

impl OutputArgs {
    /// Log filter for the selected verbosity. `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        if self.trace {
            "snmp_walker=trace"
        } else if self.debug {
            "snmp_walker=debug"
        } else {
            "snmp_walker=warn"
        }
    }

    /// Install a stderr `fmt` subscriber.
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_filter()));

        // a second init (tests) is harmless
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

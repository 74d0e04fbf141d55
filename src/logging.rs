//! Structured logging initialization for the deck CLI.
//!
//! Robot mode emits JSON lines, interactive terminals get the pretty
//! formatter, everything else gets compact plain text. All output goes to
//! stderr so stdout stays parseable.

use std::io::{self, IsTerminal};

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Which formatter the subscriber should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON lines for machine consumption.
    Json,
    /// Colored output for a terminal.
    Pretty,
    /// Plain output for pipes and files.
    Compact,
}

impl LogFormat {
    /// Pick the format from the robot flag and whether stderr is a TTY.
    #[must_use]
    pub const fn detect(robot_mode: bool, stderr_is_tty: bool) -> Self {
        if robot_mode {
            Self::Json
        } else if stderr_is_tty {
            Self::Pretty
        } else {
            Self::Compact
        }
    }
}

/// Filter directive for the given verbosity flags.
///
/// `quiet` wins over `verbose`. The model is chatty at debug level (every
/// propagation step logs), so the default stays at `warn`.
#[must_use]
pub const fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "deck=error";
    }
    match verbose {
        0 => "deck=warn",
        1 => "deck=info",
        2 => "deck=debug",
        _ => "deck=trace",
    }
}

/// Initialize the tracing subscriber based on CLI flags and environment.
///
/// `RUST_LOG` overrides the directive derived from the flags, e.g.
/// `RUST_LOG=deck=debug,deck::model::swap=trace`.
pub fn init_logging(robot_mode: bool, verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let registry = tracing_subscriber::registry().with(filter);

    match LogFormat::detect(robot_mode, io::stderr().is_terminal()) {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_span_events(FmtSpan::NONE)
                    .with_writer(io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_span_events(FmtSpan::NONE)
                    .with_writer(io::stderr),
            )
            .init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .compact()
                    .with_writer(io::stderr),
            )
            .init(),
    }
}

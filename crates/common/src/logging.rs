//! Logging setup and configuration

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// How much of a probe run is reported
///
/// Replaces separate "debug" and "verbose" output streams: each level maps to
/// a default tracing filter, and `RUST_LOG` still wins when it is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings and errors only
    #[default]
    Quiet,
    /// Progress of each session step
    Verbose,
    /// Everything, including descriptor hex dumps
    Debug,
}

impl Verbosity {
    /// Pick a verbosity from the CLI flags; `debug` implies `verbose`
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        if debug {
            Verbosity::Debug
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Quiet
        }
    }

    /// Default filter directive for this verbosity
    pub fn filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Verbose => "info",
            Verbosity::Debug => "debug",
        }
    }
}

/// Setup tracing subscriber for the application
pub fn setup_logging(default_level: &str) -> crate::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| crate::Error::Config(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| crate::Error::Logging(e.to_string()))?;

    tracing::debug!("Logging initialised with filter '{}'", default_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Debug);
    }

    #[test]
    fn test_verbosity_filters_are_valid() {
        for verbosity in [Verbosity::Quiet, Verbosity::Verbose, Verbosity::Debug] {
            assert!(EnvFilter::try_new(verbosity.filter()).is_ok());
        }
    }

    #[test]
    fn test_setup_logging_installs_once() {
        // Only one global subscriber per process
        let _ = setup_logging("info");
        let err = setup_logging("debug").unwrap_err();
        assert!(matches!(err, crate::Error::Logging(_)));
        tracing::info!("still logging after a rejected second install");
    }

    #[test]
    fn test_verbosity_ordering() {
        assert!(Verbosity::Debug > Verbosity::Verbose);
        assert!(Verbosity::Verbose > Verbosity::Quiet);
    }
}

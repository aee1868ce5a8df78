//! `tracing` subscriber setup
//!
//! Filtering follows `RUST_LOG` and falls back to `info`. Installing is
//! idempotent: a second call leaves the first subscriber in place.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::config::loader::env_bool;

/// Default filter directive when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "info";

/// Set to a truthy value to emit JSON lines
pub const ENV_LOG_JSON: &str = "VOXGUARD_LOG_JSON";

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Plain,
    /// One JSON object per event, with the current span's fields
    Json,
}

impl LogFormat {
    /// `Json` when `VOXGUARD_LOG_JSON` is truthy
    pub fn from_env() -> Self {
        if env_bool(ENV_LOG_JSON, false) {
            Self::Json
        } else {
            Self::Plain
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" | "pretty" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber
///
/// # Returns
/// `true` if this call installed the subscriber, `false` if one was already
/// set.
pub fn init(format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter()).with_target(true);

    let result = match format {
        LogFormat::Plain => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).with_span_list(false).try_init(),
    };

    match result {
        Ok(()) => {
            tracing::debug!(format = ?format, "Logging initialized");
            true
        }
        Err(_) => false,
    }
}

/// [`init`] with the format taken from the environment
pub fn init_from_env() -> bool {
    init(LogFormat::from_env())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Plain));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    /// Validates repeated initialization is harmless.
    ///
    /// Assertions:
    /// - Confirms the second call reports the existing subscriber.
    #[test]
    fn test_init_is_idempotent() {
        let _ = init(LogFormat::Plain);
        assert!(!init(LogFormat::Json));
    }
}

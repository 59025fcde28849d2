//! Structured logging for the earthquake forecast service
//!
//! Provides context-rich logging tagged with the emitting component and,
//! where one applies, the event id. Records are emitted as `tracing` events;
//! `init_logger` installs a `tracing-subscriber` formatter writing either to
//! the console or to an append-only log file for daemon operation.

use std::fmt;
use std::fs::OpenOptions;
use std::sync::{Mutex, Once};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses a configured level name. Unknown names fall back to `Info`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_uppercase().as_str() {
            "DEBUG" | "TRACE" => LogLevel::Debug,
            "WARN" | "WARNING" => LogLevel::Warning,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Store,
    Detector,
    Forecast,
    Feed,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Store => write!(f, "STORE"),
            Component::Detector => write!(f, "CLUSTER"),
            Component::Forecast => write!(f, "FORECAST"),
            Component::Feed => write!(f, "FEED"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

static INIT: Once = Once::new();

/// Install the global subscriber. Later calls are ignored.
///
/// `RUST_LOG` directives, when set, are layered on top of `min_level`.
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env().add_directive(min_level.as_filter().into());

        let file = log_file.and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => Some(file),
                Err(e) => {
                    eprintln!("Failed to open log file {}: {}", path, e);
                    None
                }
            }
        });

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false);

        let installed = match (file, console_timestamps) {
            (Some(file), _) => builder.with_ansi(false).with_writer(Mutex::new(file)).try_init(),
            (None, true) => builder.try_init(),
            (None, false) => builder.without_time().try_init(),
        };

        if let Err(e) = installed {
            eprintln!("Logger not installed: {}", e);
            return;
        }

        tracing::info!(
            level = %min_level,
            log_file = ?log_file,
            "Logging initialized"
        );
    });
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Log a general informational message
pub fn info(component: Component, event_id: Option<&str>, message: &str) {
    tracing::info!(component = %component, event_id = event_id.unwrap_or("-"), "{}", message);
}

/// Log a warning message
pub fn warn(component: Component, event_id: Option<&str>, message: &str) {
    tracing::warn!(component = %component, event_id = event_id.unwrap_or("-"), "{}", message);
}

/// Log an error message
pub fn error(component: Component, event_id: Option<&str>, message: &str) {
    tracing::error!(component = %component, event_id = event_id.unwrap_or("-"), "{}", message);
}

/// Log a debug message
pub fn debug(component: Component, event_id: Option<&str>, message: &str) {
    tracing::debug!(component = %component, event_id = event_id.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Ingest Summary Logging
// ---------------------------------------------------------------------------

/// Level for a batch ingest summary.
///
/// Duplicates are routine for a summary feed that repeats its window, so a
/// batch with nothing new is only debug noise. Records that were neither
/// accepted nor duplicates were rejected: warn when some got through, error
/// when none did.
pub fn ingest_summary_level(total: usize, accepted: usize, duplicates: usize) -> LogLevel {
    let rejected = total.saturating_sub(accepted + duplicates);
    if rejected > 0 {
        if accepted == 0 { LogLevel::Error } else { LogLevel::Warning }
    } else if accepted == 0 {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

/// Log a summary of a batch ingest (feed poll or replay).
pub fn log_ingest_summary(component: Component, total: usize, accepted: usize, duplicates: usize) {
    let message = format!(
        "Ingest complete: {}/{} accepted, {} duplicates",
        accepted, total, duplicates
    );

    match ingest_summary_level(total, accepted, duplicates) {
        LogLevel::Debug => debug(component, None, &message),
        LogLevel::Info => info(component, None, &message),
        LogLevel::Warning => warn(component, None, &message),
        LogLevel::Error => error(component, None, &message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parse_accepts_aliases_and_falls_back_to_info() {
        assert_eq!(LogLevel::parse("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("WARNING"), LogLevel::Warning);
        assert_eq!(LogLevel::parse("warn"), LogLevel::Warning);
        assert_eq!(LogLevel::parse(" Error "), LogLevel::Error);
        assert_eq!(LogLevel::parse("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::parse(""), LogLevel::Info);
    }

    #[test]
    fn test_component_tags() {
        assert_eq!(Component::Detector.to_string(), "CLUSTER");
        assert_eq!(Component::System.to_string(), "SYS");
    }

    #[test]
    fn test_all_duplicate_batch_is_not_an_error() {
        assert_eq!(
            ingest_summary_level(3, 0, 3),
            LogLevel::Debug,
            "a repeat of an already-seen feed is routine"
        );
        assert_eq!(ingest_summary_level(0, 0, 0), LogLevel::Debug);
    }

    #[test]
    fn test_ingest_summary_levels() {
        assert_eq!(ingest_summary_level(4, 4, 0), LogLevel::Info);
        assert_eq!(ingest_summary_level(4, 1, 3), LogLevel::Info);
        assert_eq!(ingest_summary_level(4, 2, 1), LogLevel::Warning);
        assert_eq!(ingest_summary_level(4, 0, 1), LogLevel::Error);
    }

    #[test]
    fn test_logging_without_subscriber_is_silent() {
        // No subscriber installed in this test: every call must be a no-op.
        info(Component::Store, Some("1"), "accepted");
        debug(Component::Detector, None, "pass complete");
        log_ingest_summary(Component::Feed, 3, 0, 3);
    }
}

//! Tracing subscriber setup with a runtime-adjustable level.

use once_cell::sync::OnceCell;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::config::LogLevel;
use crate::error::{SwitchError, SwitchResult};

static LOGGING: OnceCell<LogHandle> = OnceCell::new();

/// Map a settings level onto a tracing filter
pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::NotSet => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warning => LevelFilter::WARN,
        LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
    }
}

/// Handle for changing the log level after initialisation
#[derive(Clone, Default)]
pub struct LogHandle {
    reload: Option<reload::Handle<LevelFilter, Registry>>,
    pinned: bool,
}

impl LogHandle {
    /// A handle that ignores level changes, for tests and embedding
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Apply a new level. Pinned handles keep their level.
    pub fn set_level(&self, level: LogLevel) -> SwitchResult<()> {
        if self.pinned {
            debug!("Log level pinned, ignoring change to {}", level);
            return Ok(());
        }

        match &self.reload {
            Some(handle) => handle
                .reload(level_filter(level))
                .map_err(|e| SwitchError::config(format!("Failed to change log level: {}", e))),
            None => Ok(()),
        }
    }
}

/// Install the global subscriber once; later calls return the same handle.
///
/// Output goes to stderr so stdout stays free for shell scripts. `RUST_LOG`,
/// when set, narrows what the level lets through. `pinned` freezes the level
/// (used for `--verbose`).
pub fn init(level: LogLevel, pinned: bool) -> LogHandle {
    LOGGING
        .get_or_init(|| {
            let (filter, handle) = reload::Layer::new(level_filter(level));
            let env_filter = EnvFilter::try_from_default_env().ok();

            let installed = tracing_subscriber::registry()
                .with(filter)
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .try_init()
                .is_ok();

            LogHandle {
                reload: installed.then_some(handle),
                pinned,
            }
        })
        .clone()
}

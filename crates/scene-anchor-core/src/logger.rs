//! Logging setup for tools built on the solver.
//!
//! [`init_with_level`] installs a stderr logger. Records from the
//! `scene_anchor*` crates pass at the requested level; records from other
//! crates are capped at `warn` so dependency chatter stays out of
//! calibration logs. The level can also come from `SCENE_ANCHOR_LOG`
//! via [`level_from_env`]. With the `tracing` feature, [`init_tracing`]
//! installs a `tracing-subscriber` using the same variable.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log level (or, with `tracing`, filter directives).
pub const LOG_ENV: &str = "SCENE_ANCHOR_LOG";

const OWN_TARGET_PREFIX: &str = "scene_anchor";

#[cfg(feature = "tracing")]
const DEFAULT_DIRECTIVES: &str = "warn";

struct CalibrationLogger {
    own_level: LevelFilter,
    dependency_level: LevelFilter,
    started: Instant,
}

impl CalibrationLogger {
    fn new(level: LevelFilter) -> Self {
        Self {
            own_level: level,
            dependency_level: level.min(LevelFilter::Warn),
            started: Instant::now(),
        }
    }

    fn level_for(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_TARGET_PREFIX) {
            self.own_level
        } else {
            self.dependency_level
        }
    }

    fn format_line(&self, record: &Record) -> String {
        format!(
            "{:>9.3}s {:<5} {}: {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for CalibrationLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(std::io::stderr().lock(), "{}", self.format_line(record));
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<CalibrationLogger> = OnceLock::new();

/// Install the stderr logger; `level` applies to the `scene_anchor*` crates.
///
/// Only the first call installs anything; later calls return `Ok(())`.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| CalibrationLogger::new(level));
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Level named by [`LOG_ENV`], if set to a valid level name.
pub fn level_from_env() -> Option<LevelFilter> {
    parse_level(&std::env::var(LOG_ENV).ok()?)
}

fn parse_level(raw: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(raw.trim()).ok()
}

/// Install a `tracing` subscriber.
///
/// Directives come from [`LOG_ENV`], then `RUST_LOG`, then a default level
/// of `warn`, matching the CLI.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

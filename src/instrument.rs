//! Logging setup and timing around public entry points

use log::LevelFilter;
use std::time::Instant;

/// Explicit logging configuration handed to [`init_logging`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
        }
    }
}

impl LogConfig {
    /// `--verbose` wins over `--log-level`; `--quiet` only silences info chatter
    pub fn from_flags(verbose: bool, quiet: bool, level: Option<&str>) -> Result<Self, String> {
        let level = match level {
            Some(name) => parse_level(name)?,
            None if quiet => LevelFilter::Warn,
            None => LevelFilter::Info,
        };
        Ok(Self {
            level: if verbose { LevelFilter::Debug } else { level },
        })
    }
}

pub fn parse_level(name: &str) -> Result<LevelFilter, String> {
    match name.to_lowercase().as_str() {
        "off" => Ok(LevelFilter::Off),
        "error" => Ok(LevelFilter::Error),
        "warn" | "warning" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        _ => Err(format!(
            "Invalid log level: {}. Use off, error, warn, info, debug or trace",
            name
        )),
    }
}

/// Install the global logger; later calls are ignored
pub fn init_logging(config: &LogConfig) {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(config.level)
        .try_init();
    log::set_max_level(config.level);
}

/// Run `f` and log how long it took under `label`
pub fn timed<T, F>(label: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let value = f();
    log::debug!("{} finished in {:.3?}", label, start.elapsed());
    value
}

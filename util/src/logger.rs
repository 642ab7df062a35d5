//! Generic logger utility functions
//!
//! Everything goes to two outputs: the terminal, with coloured level tags, and the session log
//! file, in plain text. Each has its own level, so the per-cycle debug traffic of the control loop
//! can be kept in the file without scrolling the terminal. Individual modules can be quietened or
//! made more verbose by target.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::{collections::BTreeMap, fmt};
use log::{self, info};
use fern::{self, FormatCallback};
use colored::{ColoredString, Colorize};
use serde::{Serialize, Deserialize};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// STRUCTURES
// ---------------------------------------------------------------------------

/// Verbosity of each logger output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LogLevels {
    /// Level shown on the terminal
    #[serde(default = "default_console_level")]
    pub console: LevelFilter,

    /// Level written to the session log file
    #[serde(default = "default_file_level")]
    pub file: LevelFilter,

    /// Level for particular targets, for example `"exc_lib::blend_ctrl" = "info"`.
    ///
    /// A record still has to pass the level of the output it goes to.
    #[serde(default)]
    pub targets: BTreeMap<String, LevelFilter>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log file level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LogLevels {
    fn default() -> Self {
        Self::new(default_console_level(), default_file_level())
    }
}

impl LogLevels {
    pub fn new(console: LevelFilter, file: LevelFilter) -> Self {
        Self {
            console,
            file,
            targets: BTreeMap::new(),
        }
    }

    /// Set the level of a single target.
    pub fn with_target(mut self, target: &str, level: LevelFilter) -> Self {
        self.targets.insert(String::from(target), level);
        self
    }

    /// The log file must be at least `Info`, warnings and errors alone are not enough to
    /// reconstruct a session afterwards. The terminal may be quieter.
    pub fn validate(&self) -> Result<(), LoggerInitError> {
        if self.file < log::Level::Info {
            return Err(LoggerInitError::InvalidMinLogLevel(self.file))
        }

        Ok(())
    }

    /// The most verbose level any output accepts.
    fn max_level(&self) -> LevelFilter {
        self.console.max(self.file)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    levels: &LogLevels,
    session: &session::Session
) -> Result<(), LoggerInitError> {
    levels.validate()?;

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let console = fern::Dispatch::new()
        .format(|out, message, record| format_record(out, message, record, true))
        .level(levels.console)
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| format_record(out, message, record, false))
        .level(levels.file)
        .chain(log_file);

    let mut dispatch = fern::Dispatch::new().level(levels.max_level());
    for (target, level) in levels.targets.iter() {
        dispatch = dispatch.level_for(target.clone(), *level);
    }

    dispatch
        .chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log levels: terminal {:?}, file {:?}", levels.console, levels.file);
    for (target, level) in levels.targets.iter() {
        info!("    {}: {:?}", target, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_console_level() -> LevelFilter {
    LevelFilter::Info
}

fn default_file_level() -> LevelFilter {
    LevelFilter::Debug
}

fn format_record(
    out: FormatCallback,
    message: &fmt::Arguments,
    record: &log::Record,
    colour: bool
) {
    let tag = if colour {
        level_to_str(record.level())
    }
    else {
        ColoredString::from(level_tag(record.level()))
    };

    // If debug or trace include the target, otherwise don't include it
    if record.level() > log::Level::Info {
        out.finish(format_args!(
            "[{:10.6} {}] {}: {}",
            session::get_elapsed_seconds(),
            tag,
            record.target(),
            message
        ))
    }
    else {
        out.finish(format_args!(
            "[{:10.6} {}] {}",
            session::get_elapsed_seconds(),
            tag,
            message
        ))
    }
}

fn level_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info  => "INF",
        log::Level::Warn  => "WRN",
        log::Level::Error => "ERR"
    }
}

/// Get the coloured representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    let tag = level_tag(level);

    match level {
        log::Level::Trace => tag.dimmed().italic(),
        log::Level::Debug => tag.dimmed(),
        log::Level::Info  => tag.normal(),
        log::Level::Warn  => tag.yellow(),
        log::Level::Error => tag.red().bold()
    }
}

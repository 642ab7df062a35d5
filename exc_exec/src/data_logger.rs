//! # Data Logger
//!
//! Writes one CSV row per control cycle. The columns depend on the operating mode, each mode has a
//! fixed header written when the file is opened.
//!
//! Logging never stops the excavator: if the file can't be opened or written the problem is
//! reported once and the logger disables itself.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{convert::TryFrom, fs::File, path::{Path, PathBuf}, str::FromStr};
use chrono::{DateTime, TimeZone};
use csv::{Writer, WriterBuilder};
use log::{info, warn};
use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const MANUAL_HEADER: [&str; 9] = [
    "Time",
    "Boom Cmd", "Stick Cmd", "Bucket Cmd", "Swing Cmd",
    "Boom Ms", "Stick Ms", "Bucket Ms", "Swing Ms",
];

const AUTONOMOUS_HEADER: [&str; 13] = [
    "Time",
    "Boom Ms", "Stick Ms", "Bucket Ms", "Swing Ms",
    "Boom Cmd", "Stick Cmd", "Bucket Cmd", "Swing Cmd",
    "Boom Error", "Stick Error", "Bucket Error", "Swing Error",
];

const MONITOR_HEADER: [&str; 5] = [
    "Time",
    "Boom Ms", "Stick Ms", "Bucket Ms", "Swing Ms",
];

const BLENDED_HEADER: [&str; 19] = [
    "Time",
    "Boom Cmd", "Stick Cmd", "Bucket Cmd", "Swing Cmd",
    "Boom Ctrl", "Stick Ctrl", "Bucket Ctrl", "Swing Ctrl",
    "Boom Blended", "Stick Blended", "Bucket Blended", "Swing Blended",
    "Boom Ms", "Stick Ms", "Bucket Ms", "Swing Ms",
    "Class", "Confidence",
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A CSV data log.
pub struct DataLogger {
    path: PathBuf,

    /// `None` when logging is disabled
    writer: Option<Writer<File>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Operating mode of the excavator, which selects the log schema.
///
/// Given either by name or by number, 1 manual, 2 autonomous and 3 blended.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase", try_from = "LogModeDef")]
pub enum LogMode {
    /// Operator commands drive the valves
    Manual,

    /// The autonomous controller drives the valves
    Autonomous,

    /// A blend of operator and controller drives the valves
    Blended,

    /// Only the sensors are read, the valves are never energised. Used for calibration runs.
    Monitor,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LogModeDef {
    Number(u8),
    Name(String),
}

#[derive(thiserror::Error, Debug)]
pub enum DataLoggerError {
    #[error("Could not create the data log {0:?}: {1}")]
    CreateError(PathBuf, std::io::Error),

    #[error("Could not write to the data log: {0}")]
    WriteError(csv::Error),

    #[error("Could not flush the data log: {0}")]
    FlushError(std::io::Error),

    #[error("{0} is not a log mode, expected 1 (manual), 2 (autonomous) or 3 (blended)")]
    InvalidMode(u8),

    #[error("Unknown log mode \"{0}\"")]
    UnknownMode(String),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Name a data file after the executable and the time, as `{stem}_{mmdd}_{HHMM}.csv`.
pub fn data_file_name<Tz>(stem: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display
{
    format!("{}_{}.csv", stem, now.format("%m%d_%H%M"))
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LogMode {
    /// Mode from its number: 1 manual, 2 autonomous, 3 blended.
    pub fn from_number(n: u8) -> Result<Self, DataLoggerError> {
        match n {
            1 => Ok(LogMode::Manual),
            2 => Ok(LogMode::Autonomous),
            3 => Ok(LogMode::Blended),
            _ => Err(DataLoggerError::InvalidMode(n))
        }
    }

    /// Column names for this mode.
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            LogMode::Manual => &MANUAL_HEADER,
            LogMode::Autonomous => &AUTONOMOUS_HEADER,
            LogMode::Blended => &BLENDED_HEADER,
            LogMode::Monitor => &MONITOR_HEADER,
        }
    }

    /// False if the valves stay unpowered in this mode.
    pub fn drives_valves(&self) -> bool {
        *self != LogMode::Monitor
    }

    /// True if the autonomous controller runs in this mode.
    pub fn runs_controller(&self) -> bool {
        matches!(self, LogMode::Autonomous | LogMode::Blended)
    }
}

impl FromStr for LogMode {
    type Err = DataLoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(LogMode::Manual),
            "autonomous" => Ok(LogMode::Autonomous),
            "blended" => Ok(LogMode::Blended),
            "monitor" => Ok(LogMode::Monitor),
            _ => Err(DataLoggerError::UnknownMode(String::from(s)))
        }
    }
}

impl TryFrom<LogModeDef> for LogMode {
    type Error = DataLoggerError;

    fn try_from(def: LogModeDef) -> Result<Self, Self::Error> {
        match def {
            LogModeDef::Number(n) => LogMode::from_number(n),
            LogModeDef::Name(s) => s.parse(),
        }
    }
}

impl DataLogger {
    /// Create (or truncate) the log file and write the header for the mode.
    pub fn try_open<P: AsRef<Path>>(mode: LogMode, path: P) -> Result<Self, DataLoggerError> {
        let path = path.as_ref().to_path_buf();

        let file = File::create(&path)
            .map_err(|e| DataLoggerError::CreateError(path.clone(), e))?;

        // Record arity is the caller's responsibility
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);

        writer
            .write_record(mode.header())
            .map_err(DataLoggerError::WriteError)?;

        Ok(Self {
            path,
            writer: Some(writer),
        })
    }

    /// Open the log, or on failure warn and return a disabled logger.
    pub fn open<P: AsRef<Path>>(mode: LogMode, path: P) -> Self {
        match Self::try_open(mode, path.as_ref()) {
            Ok(l) => {
                info!("Logging {:?} mode data to {:?}", mode, path.as_ref());
                l
            },
            Err(e) => {
                warn!("{}, data logging is disabled for this session", e);
                Self {
                    path: path.as_ref().to_path_buf(),
                    writer: None,
                }
            }
        }
    }

    /// Append one row.
    ///
    /// Values are written in their shortest round-trip form. A write failure disables the logger.
    pub fn log(&mut self, record: &[f64]) {
        let writer = match self.writer {
            Some(ref mut w) => w,
            None => return
        };

        if let Err(e) = writer.write_record(record.iter().map(|v| format!("{:?}", v))) {
            warn!("Could not write to the data log {:?} ({}), data logging is disabled", self.path, e);
            self.writer = None;
        }
    }

    /// Flush and close the log.
    pub fn close(mut self) -> Result<(), DataLoggerError> {
        match self.writer.take() {
            Some(mut w) => w.flush().map_err(DataLoggerError::FlushError),
            None => Ok(())
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DataLogger {
    fn drop(&mut self) {
        if let Some(mut w) = self.writer.take() {
            if let Err(e) = w.flush() {
                warn!("Could not flush the data log {:?}: {}", self.path, e);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_header_arity() {
        assert_eq!(LogMode::Manual.header().len(), 9);
        assert_eq!(LogMode::Autonomous.header().len(), 13);
        assert_eq!(LogMode::Blended.header().len(), 19);
        assert_eq!(LogMode::Monitor.header(), &["Time", "Boom Ms", "Stick Ms", "Bucket Ms", "Swing Ms"]);
    }

    #[test]
    fn test_mode_from_params() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: LogMode,
        }

        let mode = |s: &str| toml::from_str::<Wrapper>(s).map(|w| w.mode);

        assert_eq!(mode("mode = 1").unwrap(), LogMode::Manual);
        assert_eq!(mode("mode = 2").unwrap(), LogMode::Autonomous);
        assert_eq!(mode("mode = 3").unwrap(), LogMode::Blended);
        assert_eq!(mode("mode = \"blended\"").unwrap(), LogMode::Blended);
        assert_eq!(mode("mode = \"monitor\"").unwrap(), LogMode::Monitor);

        assert!(mode("mode = 0").is_err());
        assert!(mode("mode = 4").is_err());
        assert!(mode("mode = \"teleop\"").is_err());

        assert!(matches!(LogMode::from_number(7), Err(DataLoggerError::InvalidMode(7))));
    }

    #[test]
    fn test_mode_flags() {
        assert!(LogMode::Manual.drives_valves());
        assert!(!LogMode::Monitor.drives_valves());
        assert!(!LogMode::Manual.runs_controller());
        assert!(LogMode::Blended.runs_controller());
        assert!(!LogMode::Monitor.runs_controller());
    }

    #[test]
    fn test_manual_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.csv");

        let mut logger = DataLogger::try_open(LogMode::Manual, &path).unwrap();
        logger.log(&[0.05, 0.0, 0.2, 0.5, -1.0, 1.25, 3.5, 9.0, 0.0]);
        logger.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines[0],
            "Time,Boom Cmd,Stick Cmd,Bucket Cmd,Swing Cmd,Boom Ms,Stick Ms,Bucket Ms,Swing Ms"
        );
        assert_eq!(lines[1], "0.05,0.0,0.2,0.5,-1.0,1.25,3.5,9.0,0.0");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_blended_row_matches_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blended.csv");

        {
            let mut logger = DataLogger::open(LogMode::Blended, &path);
            assert!(logger.is_enabled());
            let record: Vec<f64> = (0..19).map(|i| i as f64 * 0.5).collect();
            logger.log(&record);
            logger.log(&record);
            // Flushed on drop
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);

        let header_cols = lines[0].split(',').count();
        assert_eq!(header_cols, 19);
        assert_eq!(lines[1].split(',').count(), header_cols);
        assert!(lines[0].ends_with("Class,Confidence"));
    }

    #[test]
    fn test_reopen_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let mut logger = DataLogger::try_open(LogMode::Manual, &path).unwrap();
        logger.log(&[1.0; 9]);
        logger.close().unwrap();

        DataLogger::try_open(LogMode::Autonomous, &path).unwrap().close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.starts_with("Time,Boom Ms"));
    }

    #[test]
    fn test_open_failure_disables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("log.csv");

        assert!(matches!(
            DataLogger::try_open(LogMode::Manual, &path),
            Err(DataLoggerError::CreateError(_, _))
        ));

        let mut logger = DataLogger::open(LogMode::Manual, &path);
        assert!(!logger.is_enabled());

        // Logging to a disabled logger does nothing
        logger.log(&[0.0; 9]);
        assert!(logger.close().is_ok());
        assert!(!path.exists());
    }

    #[test]
    fn test_data_file_name() {
        let t = Utc.ymd(2016, 10, 15).and_hms(9, 5, 0);
        assert_eq!(data_file_name("exc_exec", &t), "exc_exec_1015_0905.csv");
    }
}

//! # Axis Sources
//!
//! Where the joystick sender gets its raw axes from. Each source reports the four axes as
//! `[tm0.x, tm0.y, tm1.x, tm1.y]` and knows which joystick the operator chose as primary.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fs::File, io::Read, path::Path};
use comms_if::eqpt::exc::{AxisOrder, NUM_JOINTS};
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of raw joystick axes.
pub trait AxisSource {
    /// Block until the operator has selected a primary joystick, and return the axis order it
    /// implies.
    fn wait_primary(&mut self) -> Result<AxisOrder, AxisSourceError>;

    /// Get the current raw axes, or `None` once the source is exhausted.
    fn poll(&mut self) -> Result<Option<[f64; NUM_JOINTS]>, AxisSourceError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Replays recorded joystick axes from a CSV file with columns `tm0_x,tm0_y,tm1_x,tm1_y`.
///
/// There's no trigger to squeeze in a recording, so the primary joystick is given up front.
pub struct ReplaySource<R: Read = File> {
    reader: csv::Reader<R>,

    primary: AxisOrder,

    row: usize,
}

#[derive(Deserialize, Debug)]
struct ReplayRow {
    tm0_x: f64,
    tm0_y: f64,
    tm1_x: f64,
    tm1_y: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum AxisSourceError {
    #[error("Could not open the replay file: {0}")]
    OpenError(csv::Error),

    #[error("Could not read row {0} of the replay: {1}")]
    ReadError(usize, csv::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ReplaySource<File> {
    /// Open a replay file.
    pub fn open<P: AsRef<Path>>(path: P, primary: AxisOrder) -> Result<Self, AxisSourceError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(AxisSourceError::OpenError)?;

        Ok(Self { reader, primary, row: 0 })
    }
}

impl<R: Read> ReplaySource<R> {
    /// Replay from any reader, for example an in-memory recording.
    pub fn from_reader(rdr: R, primary: AxisOrder) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);

        Self { reader, primary, row: 0 }
    }
}

impl<R: Read> AxisSource for ReplaySource<R> {
    fn wait_primary(&mut self) -> Result<AxisOrder, AxisSourceError> {
        Ok(self.primary)
    }

    fn poll(&mut self) -> Result<Option<[f64; NUM_JOINTS]>, AxisSourceError> {
        self.row += 1;

        match self.reader.deserialize::<ReplayRow>().next() {
            Some(Ok(r)) => Ok(Some([r.tm0_x, r.tm0_y, r.tm1_x, r.tm1_y])),
            Some(Err(e)) => Err(AxisSourceError::ReadError(self.row, e)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_replay() {
        let data = "tm0_x,tm0_y,tm1_x,tm1_y\n0.1, 0.2, 0.3, 0.4\n-1.0,0.0,0.5,1.0\n";
        let mut src = ReplaySource::from_reader(data.as_bytes(), AxisOrder::Tm1Primary);

        assert_eq!(src.wait_primary().unwrap(), AxisOrder::Tm1Primary);
        assert_eq!(src.poll().unwrap(), Some([0.1, 0.2, 0.3, 0.4]));
        assert_eq!(src.poll().unwrap(), Some([-1.0, 0.0, 0.5, 1.0]));
        assert_eq!(src.poll().unwrap(), None);
    }

    #[test]
    fn test_replay_columns_by_name() {
        let data = "tm1_y,tm1_x,tm0_y,tm0_x\n4,3,2,1\n";
        let mut src = ReplaySource::from_reader(data.as_bytes(), AxisOrder::Tm0Primary);

        assert_eq!(src.poll().unwrap(), Some([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_replay_bad_row() {
        let data = "tm0_x,tm0_y,tm1_x,tm1_y\n0.1,0.2,0.3,0.4\n0.1,abc,0.3,0.4\n";
        let mut src = ReplaySource::from_reader(data.as_bytes(), AxisOrder::Tm0Primary);

        assert!(src.poll().unwrap().is_some());
        assert!(matches!(src.poll(), Err(AxisSourceError::ReadError(2, _))));
    }

    #[test]
    fn test_open_missing() {
        assert!(matches!(
            ReplaySource::open("/nonexistent/replay.csv", AxisOrder::Tm0Primary),
            Err(AxisSourceError::OpenError(_))
        ));
    }
}

//! Sensor inputs read through Linux sysfs
//!
//! The BeagleBone ADC is exposed by the IIO subsystem as `in_voltageN_raw` files holding 12 bit
//! codes. The eQEP quadrature decoders expose `mode`, `position` and `enabled` attributes.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fs, path::{Path, PathBuf}};
use serde::{Serialize, Deserialize};
use util::maths::lin_map;

use super::{AnalogInput, EncoderInput, MeasError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const IIO_DEVICE_DIR: &str = "/sys/bus/iio/devices/iio:device0";

/// Largest code of the 12 bit ADC.
const ADC_MAX_RAW: f64 = 4095.0;

/// Code range the calibration tables were recorded in (millivolts at the 1.8 V ADC reference).
const LEGACY_FULL_SCALE_CODE: f64 = 1800.0;

/// Value written to the eQEP `mode` attribute for absolute positioning.
const EQEP_MODE_ABSOLUTE: &str = "0";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Configuration of an ADC channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SysfsAdcConfig {
    /// Analog input number, `AINn`
    pub ain: u32,

    /// Code reported at the top of the ADC range
    #[serde(default = "default_full_scale_code")]
    pub full_scale_code: f64,
}

/// Configuration of an eQEP encoder.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SysfsEqepConfig {
    /// sysfs directory of the eQEP device, for example
    /// `/sys/devices/platform/ocp/48302000.epwmss/48302180.eqep`
    pub dir: PathBuf,
}

/// An ADC channel read through IIO.
pub struct SysfsAdc {
    path: PathBuf,
    full_scale_code: f64,
}

/// An eQEP encoder read through sysfs.
pub struct SysfsEqep {
    dir: PathBuf,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SysfsAdc {
    pub fn new(config: &SysfsAdcConfig) -> Self {
        Self::with_device_dir(IIO_DEVICE_DIR, config)
    }

    /// Read the channel from an explicit IIO device directory.
    pub fn with_device_dir<P: AsRef<Path>>(dir: P, config: &SysfsAdcConfig) -> Self {
        Self {
            path: dir.as_ref().join(format!("in_voltage{}_raw", config.ain)),
            full_scale_code: config.full_scale_code,
        }
    }
}

impl AnalogInput for SysfsAdc {
    fn read_raw(&mut self) -> Result<f64, MeasError> {
        let raw: f64 = read_attr(&self.path)?;

        Ok(lin_map((0.0, ADC_MAX_RAW), (0.0, self.full_scale_code), raw))
    }
}

impl SysfsEqep {
    /// Open the encoder and make sure it is counting.
    pub fn new(config: &SysfsEqepConfig) -> Result<Self, MeasError> {
        let eqep = Self { dir: config.dir.clone() };
        write_attr(&eqep.dir.join("enabled"), "1")?;

        Ok(eqep)
    }
}

impl EncoderInput for SysfsEqep {
    fn set_absolute(&mut self) -> Result<(), MeasError> {
        write_attr(&self.dir.join("mode"), EQEP_MODE_ABSOLUTE)
    }

    fn zero(&mut self) -> Result<(), MeasError> {
        write_attr(&self.dir.join("position"), "0")
    }

    fn position(&mut self) -> Result<i64, MeasError> {
        read_attr(&self.dir.join("position"))
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_full_scale_code() -> f64 {
    LEGACY_FULL_SCALE_CODE
}

/// Read the first line of a sysfs attribute and parse it.
fn read_attr<T: std::str::FromStr>(path: &Path) -> Result<T, MeasError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| MeasError::Io(path.to_path_buf(), e))?;

    let line = contents.lines().next().unwrap_or("").trim();

    line.parse()
        .map_err(|_| MeasError::InvalidReading(path.to_path_buf(), line.to_string()))
}

fn write_attr(path: &Path, value: &str) -> Result<(), MeasError> {
    fs::write(path, value).map_err(|e| MeasError::Io(path.to_path_buf(), e))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sysfs_adc() {
        let dir = tempfile::tempdir().unwrap();
        let config = SysfsAdcConfig { ain: 6, full_scale_code: LEGACY_FULL_SCALE_CODE };
        let mut adc = SysfsAdc::with_device_dir(dir.path(), &config);

        assert!(matches!(adc.read_raw(), Err(MeasError::Io(_, _))));

        fs::write(dir.path().join("in_voltage6_raw"), "4095\n").unwrap();
        assert_eq!(adc.read_raw().unwrap(), 1800.0);

        fs::write(dir.path().join("in_voltage6_raw"), "garbage\n").unwrap();
        assert!(matches!(adc.read_raw(), Err(MeasError::InvalidReading(_, _))));
    }

    #[test]
    fn test_sysfs_eqep() {
        let dir = tempfile::tempdir().unwrap();
        let mut eqep = SysfsEqep::new(&SysfsEqepConfig { dir: dir.path().to_path_buf() }).unwrap();

        eqep.set_absolute().unwrap();
        eqep.zero().unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("mode")).unwrap(), "0");
        assert_eq!(eqep.position().unwrap(), 0);

        // The driver reports the position on the first line
        fs::write(dir.path().join("position"), "-3200\n").unwrap();
        assert_eq!(eqep.position().unwrap(), -3200);
    }
}

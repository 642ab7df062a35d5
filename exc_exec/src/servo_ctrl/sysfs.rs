//! [`PwmDriver`] implementation for the Linux sysfs PWM interface
//!
//! On the BeagleBone the valve pins are routed to the eHRPWM modules, which the kernel exposes as
//! `/sys/class/pwm/pwmchipN`. Each channel is exported, given a period and duty cycle in
//! nanoseconds, and then enabled.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fs, path::{Path, PathBuf}};
use log::trace;
use serde::{Serialize, Deserialize};

use super::{check_duty, PwmDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const SYSFS_PWM_ROOT: &str = "/sys/class/pwm";

const NANOS_PER_SECOND: f64 = 1e9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Location of a sysfs PWM channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SysfsPwmConfig {
    /// The `pwmchipN` the pin is routed to
    pub chip: u32,

    /// The channel within the chip
    pub channel: u32,
}

/// A PWM channel driven through sysfs.
pub struct SysfsPwm {
    chip_dir: PathBuf,

    channel: u32,

    channel_dir: PathBuf,

    period_ns: Option<u64>,

    exported_here: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SysfsPwm {
    /// Open the channel below the standard sysfs PWM root, exporting it if needed.
    pub fn new(config: &SysfsPwmConfig) -> Result<Self, ServoError> {
        Self::with_root(SYSFS_PWM_ROOT, config)
    }

    /// Open the channel below an explicit sysfs root.
    pub fn with_root<P: AsRef<Path>>(
        root: P,
        config: &SysfsPwmConfig
    ) -> Result<Self, ServoError> {
        let chip_dir = root.as_ref().join(format!("pwmchip{}", config.chip));
        let channel_dir = chip_dir.join(format!("pwm{}", config.channel));

        // Export the channel if the kernel hasn't already
        let exported_here = if !channel_dir.exists() {
            write_attr(&chip_dir.join("export"), &config.channel.to_string())?;
            true
        }
        else {
            false
        };

        Ok(Self {
            chip_dir,
            channel: config.channel,
            channel_dir,
            period_ns: None,
            exported_here,
        })
    }

    fn duty_ns(&self, duty_pct: f64) -> Result<u64, ServoError> {
        let period_ns = self.period_ns.ok_or(ServoError::NotRunning)?;

        Ok((period_ns as f64 * duty_pct / 100.0).round() as u64)
    }
}

impl PwmDriver for SysfsPwm {
    fn start(&mut self, duty_pct: f64, freq_hz: f64) -> Result<(), ServoError> {
        check_duty(duty_pct)?;

        let period_ns = (NANOS_PER_SECOND / freq_hz).round() as u64;

        // The duty cycle may never exceed the period, so clear it before changing the period
        write_attr(&self.channel_dir.join("duty_cycle"), "0")?;
        write_attr(&self.channel_dir.join("period"), &period_ns.to_string())?;
        self.period_ns = Some(period_ns);

        let duty_ns = self.duty_ns(duty_pct)?;
        write_attr(&self.channel_dir.join("duty_cycle"), &duty_ns.to_string())?;
        write_attr(&self.channel_dir.join("enable"), "1")
    }

    fn set_duty_cycle(&mut self, duty_pct: f64) -> Result<(), ServoError> {
        check_duty(duty_pct)?;

        let duty_ns = self.duty_ns(duty_pct)?;
        write_attr(&self.channel_dir.join("duty_cycle"), &duty_ns.to_string())
    }

    fn stop(&mut self) -> Result<(), ServoError> {
        write_attr(&self.channel_dir.join("enable"), "0")?;
        self.period_ns = None;

        if self.exported_here {
            write_attr(&self.chip_dir.join("unexport"), &self.channel.to_string())?;
            self.exported_here = false;
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn write_attr(path: &Path, value: &str) -> Result<(), ServoError> {
    trace!("{:?} <- {}", path, value);
    fs::write(path, value).map_err(|e| ServoError::Io(path.to_path_buf(), e))
}

#[cfg(test)]
mod test {
    use super::*;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_sysfs_pwm() {
        // Fake an already exported channel
        let root = tempfile::tempdir().unwrap();
        let channel_dir = root.path().join("pwmchip3").join("pwm1");
        fs::create_dir_all(&channel_dir).unwrap();

        let mut pwm = SysfsPwm::with_root(
            root.path(),
            &SysfsPwmConfig { chip: 3, channel: 1 }
        ).unwrap();

        // Not started, so there is no period to scale against
        assert!(matches!(pwm.set_duty_cycle(5.0), Err(ServoError::NotRunning)));

        pwm.start(7.5, 50.0).unwrap();
        assert_eq!(read(&channel_dir.join("period")), "20000000");
        assert_eq!(read(&channel_dir.join("duty_cycle")), "1500000");
        assert_eq!(read(&channel_dir.join("enable")), "1");

        pwm.set_duty_cycle(10.0).unwrap();
        assert_eq!(read(&channel_dir.join("duty_cycle")), "2000000");

        assert!(matches!(pwm.set_duty_cycle(120.0), Err(ServoError::InvalidDutyCycle(_))));

        pwm.stop().unwrap();
        assert_eq!(read(&channel_dir.join("enable")), "0");
        // Not exported by us so not unexported either
        assert!(!root.path().join("pwmchip3").join("unexport").exists());
    }

    #[test]
    fn test_missing_chip() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            SysfsPwm::with_root(root.path(), &SysfsPwmConfig { chip: 0, channel: 0 }),
            Err(ServoError::Io(_, _))
        ));
    }
}

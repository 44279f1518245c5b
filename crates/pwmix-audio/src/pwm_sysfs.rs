//! Linux sysfs PWM actuator.
//!
//! Exports the channel if needed, programs its period, enables it and keeps
//! the `duty_cycle` attribute open. Every tick rewrites that attribute with
//! the new active time in nanoseconds as decimal text.

use core::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::traits::{Actuator, ActuatorError, PwmConfig};

/// Longest decimal rendering of a `u32`.
const DUTY_TEXT_LEN: usize = 10;

/// An enabled PWM channel. Disabled again when dropped.
pub struct PwmActuator {
    duty: File,
    period_ns: u32,
    enable_path: std::path::PathBuf,
    text: heapless::String<DUTY_TEXT_LEN>,
}

impl PwmActuator {
    pub fn open(config: &PwmConfig) -> Result<Self, ActuatorError> {
        let chip_dir = config.chip_dir();
        if !chip_dir.is_dir() {
            return Err(ActuatorError::NoChip(chip_dir));
        }

        let channel_dir = config.channel_dir();
        if !channel_dir.is_dir() {
            write_attr(&chip_dir.join("export"), config.channel)?;
        }

        // A period below the current duty cycle is rejected, so clear it first.
        write_attr(&channel_dir.join("duty_cycle"), 0)?;
        write_attr(&channel_dir.join("period"), config.period_ns)?;
        let enable_path = channel_dir.join("enable");
        write_attr(&enable_path, 1)?;

        let duty_path = config.duty_cycle_path();
        let duty = OpenOptions::new()
            .write(true)
            .open(&duty_path)
            .map_err(|e| ActuatorError::OpenDuty(duty_path.clone(), e))?;

        tracing::info!(
            chip = config.chip,
            channel = config.channel,
            period_ns = config.period_ns,
            "PWM output enabled"
        );
        Ok(Self {
            duty,
            period_ns: config.period_ns,
            enable_path,
            text: heapless::String::new(),
        })
    }
}

impl Actuator for PwmActuator {
    fn period_ns(&self) -> u32 {
        self.period_ns
    }

    fn write_duty_ns(&mut self, duty_ns: u32) -> Result<(), ActuatorError> {
        self.text.clear();
        // Always fits: DUTY_TEXT_LEN holds any u32.
        let _ = write!(self.text, "{}", duty_ns);
        self.duty
            .write_all_at(self.text.as_bytes(), 0)
            .map_err(ActuatorError::Write)?;
        Ok(())
    }
}

impl Drop for PwmActuator {
    fn drop(&mut self) {
        if let Err(e) = fs::write(&self.enable_path, "0") {
            tracing::debug!(error = %e, "could not disable PWM channel");
        }
    }
}

fn write_attr(path: &Path, value: u32) -> Result<(), ActuatorError> {
    fs::write(path, value.to_string())
        .map_err(|e| ActuatorError::Configure(format!("{}: {}", path.display(), e)))
}

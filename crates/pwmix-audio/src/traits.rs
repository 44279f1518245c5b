//! Actuator trait, configuration and error types.

use std::path::PathBuf;

/// Default PWM period. Pick one that suits the RC low-pass filter on the pin.
pub const DEFAULT_PERIOD_NS: u32 = 10_000;

/// Error type for actuator operations.
#[derive(Debug)]
pub enum ActuatorError {
    /// PWM chip directory not present
    NoChip(PathBuf),
    /// Failed to export or configure the PWM channel
    Configure(String),
    /// Failed to open the duty-cycle control file
    OpenDuty(PathBuf, std::io::Error),
    /// A duty-cycle write failed
    Write(std::io::Error),
    /// No audio device available
    NoDevice,
    /// Failed to initialize audio device
    DeviceInit(String),
    /// Failed to create or start audio stream
    StreamCreate(String),
}

impl std::fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActuatorError::NoChip(path) => write!(f, "PWM chip not found: {}", path.display()),
            ActuatorError::Configure(msg) => write!(f, "PWM configure error: {}", msg),
            ActuatorError::OpenDuty(path, e) => {
                write!(f, "cannot open PWM duty file {}: {}", path.display(), e)
            }
            ActuatorError::Write(e) => write!(f, "PWM duty write failure: {}", e),
            ActuatorError::NoDevice => write!(f, "No audio device available"),
            ActuatorError::DeviceInit(msg) => write!(f, "Device init error: {}", msg),
            ActuatorError::StreamCreate(msg) => write!(f, "Stream create error: {}", msg),
        }
    }
}

impl std::error::Error for ActuatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActuatorError::OpenDuty(_, e) | ActuatorError::Write(e) => Some(e),
            _ => None,
        }
    }
}

/// Something that turns a duty-cycle value into an output level.
pub trait Actuator {
    /// The fixed period the duty cycle is measured against, in nanoseconds.
    fn period_ns(&self) -> u32;

    /// Commit the active time per period for the next output tick.
    fn write_duty_ns(&mut self, duty_ns: u32) -> Result<(), ActuatorError>;
}

/// Active time for a duty ratio in 0.0..=1.0.
#[inline]
pub fn duty_cycle_ns(ratio: f32, period_ns: u32) -> u32 {
    (ratio * period_ns as f32) as u32
}

/// Location and timing of a sysfs PWM channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PwmConfig {
    /// Root of the PWM class directory, normally `/sys/class/pwm`.
    pub sysfs_root: PathBuf,
    pub chip: u32,
    pub channel: u32,
    pub period_ns: u32,
}

impl PwmConfig {
    pub fn chip_dir(&self) -> PathBuf {
        self.sysfs_root.join(format!("pwmchip{}", self.chip))
    }

    pub fn channel_dir(&self) -> PathBuf {
        self.chip_dir().join(format!("pwm{}", self.channel))
    }

    pub fn duty_cycle_path(&self) -> PathBuf {
        self.channel_dir().join("duty_cycle")
    }
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys/class/pwm"),
            chip: 0,
            channel: 0,
            period_ns: DEFAULT_PERIOD_NS,
        }
    }
}

/// Discards every value. Keeps the output loop's timing without hardware.
#[derive(Debug)]
pub struct NullActuator {
    period_ns: u32,
    writes: u64,
    last_duty_ns: Option<u32>,
}

impl NullActuator {
    pub fn new(period_ns: u32) -> Self {
        Self {
            period_ns,
            writes: 0,
            last_duty_ns: None,
        }
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn last_duty_ns(&self) -> Option<u32> {
        self.last_duty_ns
    }
}

impl Actuator for NullActuator {
    fn period_ns(&self) -> u32 {
        self.period_ns
    }

    fn write_duty_ns(&mut self, duty_ns: u32) -> Result<(), ActuatorError> {
        self.writes += 1;
        self.last_duty_ns = Some(duty_ns);
        Ok(())
    }
}

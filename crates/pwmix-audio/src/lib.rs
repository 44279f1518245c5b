//! Output actuators for pwmix.
//!
//! An actuator accepts one duty-cycle value per output tick. The primary
//! backend is a Linux sysfs PWM channel; a sound card preview and a null
//! sink exist for machines without PWM hardware.

mod cpal_backend;
#[cfg(unix)]
mod pwm_sysfs;
mod traits;

pub use cpal_backend::CpalActuator;
#[cfg(unix)]
pub use pwm_sysfs::PwmActuator;
pub use traits::{duty_cycle_ns, Actuator, ActuatorError, NullActuator, PwmConfig};

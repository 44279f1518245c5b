//! CPAL-based preview actuator.
//!
//! Plays the duty-cycle stream through the default sound card so the mix
//! can be heard on a machine without a PWM pin. Values cross to the device
//! callback through a ring buffer; each one is held until the next arrives.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::traits::{Actuator, ActuatorError};

/// Duty-cycle sink backed by a CPAL output stream.
pub struct CpalActuator {
    _stream: Stream,
    producer: HeapProd<f32>,
    period_ns: u32,
}

impl CpalActuator {
    /// Open the default output device.
    ///
    /// `source_rate` is the rate duty values are written at; `period_ns` is
    /// the nominal PWM period they are expressed against.
    pub fn open(source_rate: u32, period_ns: u32) -> Result<Self, ActuatorError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(ActuatorError::NoDevice)?;

        let config: StreamConfig = device
            .default_output_config()
            .map_err(|e| ActuatorError::DeviceInit(e.to_string()))?
            .into();
        let channels = config.channels as usize;
        let device_rate = config.sample_rate.0;

        // About 100ms of duty values
        let rb = HeapRb::<f32>::new((source_rate as usize / 10).max(1));
        let (producer, consumer) = rb.split();
        let mut hold = SampleHold::new(consumer, source_rate, device_rate);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for chunk in data.chunks_mut(channels) {
                        let level = hold.next_level();
                        for sample in chunk.iter_mut() {
                            *sample = level;
                        }
                    }
                },
                |err| tracing::warn!(error = %err, "preview stream error"),
                None,
            )
            .map_err(|e| ActuatorError::StreamCreate(e.to_string()))?;

        stream
            .play()
            .map_err(|e| ActuatorError::StreamCreate(e.to_string()))?;

        tracing::info!(device_rate, source_rate, "sound card preview output enabled");
        Ok(Self {
            _stream: stream,
            producer,
            period_ns,
        })
    }
}

impl Actuator for CpalActuator {
    fn period_ns(&self) -> u32 {
        self.period_ns
    }

    fn write_duty_ns(&mut self, duty_ns: u32) -> Result<(), ActuatorError> {
        let ratio = duty_ns as f32 / self.period_ns.max(1) as f32;
        // Non-blocking push; drop values if the device falls behind
        let _ = self.producer.try_push(ratio);
        Ok(())
    }
}

/// Zero-order hold from the duty rate up to the device rate.
struct SampleHold {
    consumer: HeapCons<f32>,
    source_rate: u32,
    device_rate: u32,
    phase: u32,
    ratio: f32,
}

impl SampleHold {
    fn new(consumer: HeapCons<f32>, source_rate: u32, device_rate: u32) -> Self {
        Self {
            consumer,
            source_rate,
            device_rate: device_rate.max(1),
            phase: 0,
            ratio: 0.5,
        }
    }

    /// Next device sample in -1.0..=1.0.
    fn next_level(&mut self) -> f32 {
        self.phase += self.source_rate;
        while self.phase >= self.device_rate {
            self.phase -= self.device_rate;
            if let Some(ratio) = self.consumer.try_pop() {
                self.ratio = ratio;
            }
        }
        self.ratio * 2.0 - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold(source_rate: u32, device_rate: u32, values: &[f32]) -> SampleHold {
        let rb = HeapRb::<f32>::new(64);
        let (mut producer, consumer) = rb.split();
        for &v in values {
            producer.try_push(v).unwrap();
        }
        SampleHold::new(consumer, source_rate, device_rate)
    }

    #[test]
    fn silent_until_data_arrives() {
        let mut h = hold(11025, 44100, &[]);
        assert_eq!(h.next_level(), 0.0);
    }

    #[test]
    fn holds_each_value_for_rate_ratio() {
        let mut h = hold(11025, 44100, &[1.0, 0.0]);
        let levels: Vec<f32> = (0..8).map(|_| h.next_level()).collect();
        assert_eq!(levels, [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, -1.0]);
    }

    #[test]
    fn same_rate_passes_through() {
        let mut h = hold(11025, 11025, &[0.75, 0.25]);
        assert_eq!(h.next_level(), 0.5);
        assert_eq!(h.next_level(), -0.5);
        // Buffer drained: hold the last value
        assert_eq!(h.next_level(), -0.5);
    }
}

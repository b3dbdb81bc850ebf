//! Four-channel PWM output bank.
//!
//! Duty requests arrive every control cycle as percentages; a channel is
//! only re-driven when its request changes.  0 % and 100 % use the fully
//! off / fully on states so the output never glitches at the extremes.

use embedded_hal::pwm::SetDutyCycle;

use crate::error::TransportError;

pub const CHANNEL_COUNT: usize = 4;

pub struct PwmBank<P> {
    channels: [P; CHANNEL_COUNT],
    /// Last duty driven per channel; `None` until first written.
    applied: [Option<u8>; CHANNEL_COUNT],
}

impl<P: SetDutyCycle> PwmBank<P> {
    pub fn new(channels: [P; CHANNEL_COUNT]) -> Self {
        Self {
            channels,
            applied: [None; CHANNEL_COUNT],
        }
    }

    /// Drive every channel whose duty differs from the last one applied.
    /// Duties above 100 are clamped.
    pub fn apply(&mut self, duties: &[u8; CHANNEL_COUNT]) -> Result<(), TransportError> {
        for ((channel, applied), &duty) in self.channels.iter_mut().zip(&mut self.applied).zip(duties) {
            let duty = duty.min(100);
            if *applied == Some(duty) {
                continue;
            }
            let result = match duty {
                0 => channel.set_duty_cycle_fully_off(),
                100 => channel.set_duty_cycle_fully_on(),
                d => {
                    let max = u32::from(channel.max_duty_cycle());
                    channel.set_duty_cycle((u32::from(d) * max / 100) as u16)
                }
            };
            result.map_err(|_| TransportError::Pwm)?;
            *applied = Some(duty);
        }
        Ok(())
    }

    pub fn applied(&self) -> [Option<u8>; CHANNEL_COUNT] {
        self.applied
    }

    pub fn channels(&self) -> &[P; CHANNEL_COUNT] {
        &self.channels
    }
}

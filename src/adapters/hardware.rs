//! Hardware adapter: bridges the board transport to the [`IoPort`] trait.
//!
//! Owns both shift-register chains and the PWM bank.  Transport errors
//! are logged here and never reach the domain: a failed input read keeps
//! the previous image, a failed commit is retried on the next change.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::IoPort;
use crate::drivers::pwm::PwmBank;
use crate::drivers::shift_register::{InputShiftRegister, OutputShiftRegister};
use crate::image::{InputImage, OutputImage};

/// Input chain, output chain and PWM channels behind one port.
pub struct BoardTransport<I, O, P> {
    inputs: I,
    outputs: O,
    pwm: PwmBank<P>,
    last_inputs: InputImage,
}

impl<CE, CP, PL, SDIN, DI, OE, STCP, MR, SHCP, SDOUT, DO, P>
    BoardTransport<
        InputShiftRegister<CE, CP, PL, SDIN, DI>,
        OutputShiftRegister<OE, STCP, MR, SHCP, SDOUT, DO>,
        P,
    >
where
    CE: OutputPin,
    CP: OutputPin,
    PL: OutputPin,
    SDIN: InputPin,
    DI: DelayNs,
    OE: OutputPin,
    STCP: OutputPin,
    MR: OutputPin,
    SHCP: OutputPin,
    SDOUT: OutputPin,
    DO: DelayNs,
    P: SetDutyCycle,
{
    /// Take ownership of the chains, park the input chain and run the
    /// output power-up sequence.
    pub fn new(
        mut inputs: InputShiftRegister<CE, CP, PL, SDIN, DI>,
        mut outputs: OutputShiftRegister<OE, STCP, MR, SHCP, SDOUT, DO>,
        pwm: PwmBank<P>,
    ) -> Self {
        if let Err(e) = inputs.init() {
            warn!("Input register init failed: {e}");
        }
        if let Err(e) = outputs.init() {
            warn!("Output register init failed: {e}");
        }
        Self {
            inputs,
            outputs,
            pwm,
            last_inputs: InputImage::default(),
        }
    }
}

// ── IoPort implementation ─────────────────────────────────────

impl<CE, CP, PL, SDIN, DI, OE, STCP, MR, SHCP, SDOUT, DO, P> IoPort
    for BoardTransport<
        InputShiftRegister<CE, CP, PL, SDIN, DI>,
        OutputShiftRegister<OE, STCP, MR, SHCP, SDOUT, DO>,
        P,
    >
where
    CE: OutputPin,
    CP: OutputPin,
    PL: OutputPin,
    SDIN: InputPin,
    DI: DelayNs,
    OE: OutputPin,
    STCP: OutputPin,
    MR: OutputPin,
    SHCP: OutputPin,
    SDOUT: OutputPin,
    DO: DelayNs,
    P: SetDutyCycle,
{
    fn sample_inputs(&mut self) -> InputImage {
        match self.inputs.read() {
            Ok(image) => self.last_inputs = image,
            Err(e) => warn!("Input register read failed: {e}"),
        }
        self.last_inputs
    }

    fn commit_outputs(&mut self, image: OutputImage) {
        if let Err(e) = self.outputs.write(image) {
            warn!("Output register write failed: {e}");
        }
    }

    fn write_pwm(&mut self, duties: &[u8; 4]) {
        if let Err(e) = self.pwm.apply(duties) {
            warn!("PWM update failed: {e}");
        }
    }
}

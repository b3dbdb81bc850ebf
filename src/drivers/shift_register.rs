//! Bit-banged 74HC165 / 74HC595 shift-register drivers.
//!
//! Two cascaded 74HC165 parallel-in registers carry the 14 board inputs;
//! two cascaded 74HC595 serial-in registers drive the 16 board outputs.
//! Both are clocked by GPIO toggling with microsecond busy-waits between
//! edges, so the drivers are generic over the `embedded-hal` pin and delay
//! traits and run against mock pins on the host.
//!
//! The inputs are active LOW: a closed contact reads as 0 on the wire and
//! as 1 in the returned [`InputImage`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::TransportError;
use crate::image::{InputImage, OutputImage};

/// Setup/hold time between edges during a normal transfer (µs).
const EDGE_US: u32 = 1;
/// Settle time between edges during output power-up (µs).
const INIT_EDGE_US: u32 = 10;
/// Both cascades are 16 bits long.
const CHAIN_BITS: u32 = 16;

fn set<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), TransportError> {
    pin.set_state(high.into()).map_err(|_| TransportError::Gpio)
}

// ── Input (74HC165) ──────────────────────────────────────────

/// Parallel-load input chain.
pub struct InputShiftRegister<CE, CP, PL, SDIN, D> {
    ce: CE,
    cp: CP,
    pl: PL,
    sdin: SDIN,
    delay: D,
}

impl<CE, CP, PL, SDIN, D> InputShiftRegister<CE, CP, PL, SDIN, D>
where
    CE: OutputPin,
    CP: OutputPin,
    PL: OutputPin,
    SDIN: InputPin,
    D: DelayNs,
{
    pub fn new(ce: CE, cp: CP, pl: PL, sdin: SDIN, delay: D) -> Self {
        Self { ce, cp, pl, sdin, delay }
    }

    /// Park the chain idle: chip disabled, not loading, clock low.
    pub fn init(&mut self) -> Result<(), TransportError> {
        set(&mut self.ce, true)?;
        set(&mut self.cp, false)?;
        set(&mut self.pl, true)
    }

    /// Latch all inputs and shift them in, MSB first.
    pub fn read(&mut self) -> Result<InputImage, TransportError> {
        // Latch the parallel inputs.
        set(&mut self.cp, false)?;
        set(&mut self.pl, false)?;
        self.delay.delay_us(EDGE_US);
        set(&mut self.pl, true)?;
        self.delay.delay_us(EDGE_US);

        set(&mut self.ce, false)?;
        self.delay.delay_us(EDGE_US);

        let mut raw: u16 = 0;
        for _ in 0..CHAIN_BITS {
            let bit = self.sdin.is_high().map_err(|_| TransportError::Gpio)?;
            raw = (raw << 1) | u16::from(bit);
            set(&mut self.cp, true)?;
            self.delay.delay_us(EDGE_US);
            set(&mut self.cp, false)?;
            self.delay.delay_us(EDGE_US);
        }

        set(&mut self.ce, true)?;
        Ok(InputImage::from_bits(!raw))
    }
}

// ── Output (74HC595) ─────────────────────────────────────────

/// Serial-in output chain with storage latch.
pub struct OutputShiftRegister<OE, STCP, MR, SHCP, SDOUT, D> {
    oe: OE,
    stcp: STCP,
    mr: MR,
    shcp: SHCP,
    sdout: SDOUT,
    delay: D,
}

impl<OE, STCP, MR, SHCP, SDOUT, D> OutputShiftRegister<OE, STCP, MR, SHCP, SDOUT, D>
where
    OE: OutputPin,
    STCP: OutputPin,
    MR: OutputPin,
    SHCP: OutputPin,
    SDOUT: OutputPin,
    D: DelayNs,
{
    pub fn new(oe: OE, stcp: STCP, mr: MR, shcp: SHCP, sdout: SDOUT, delay: D) -> Self {
        Self { oe, stcp, mr, shcp, sdout, delay }
    }

    /// Power-up sequence: clock an all-zero image through and latch it
    /// before releasing reset, so no relay twitches at boot.
    pub fn init(&mut self) -> Result<(), TransportError> {
        set(&mut self.oe, false)?;
        set(&mut self.stcp, false)?;
        set(&mut self.mr, false)?;
        set(&mut self.shcp, false)?;
        set(&mut self.sdout, false)?;

        set(&mut self.shcp, true)?;
        self.delay.delay_us(INIT_EDGE_US);
        set(&mut self.stcp, true)?;
        self.delay.delay_us(INIT_EDGE_US);
        set(&mut self.shcp, false)?;
        self.delay.delay_us(INIT_EDGE_US);
        set(&mut self.stcp, false)?;
        self.delay.delay_us(INIT_EDGE_US);

        set(&mut self.mr, true)
    }

    /// Clear the shift stage, shift `image` out MSB first and latch it.
    pub fn write(&mut self, image: OutputImage) -> Result<(), TransportError> {
        set(&mut self.sdout, false)?;
        set(&mut self.mr, false)?;
        self.delay.delay_us(EDGE_US);
        set(&mut self.shcp, true)?;
        self.delay.delay_us(EDGE_US);
        set(&mut self.shcp, false)?;
        self.delay.delay_us(EDGE_US);
        set(&mut self.mr, true)?;
        self.delay.delay_us(EDGE_US);

        let bits = image.bits();
        for i in (0..CHAIN_BITS).rev() {
            set(&mut self.sdout, bits & (1 << i) != 0)?;
            self.delay.delay_us(EDGE_US);
            set(&mut self.shcp, true)?;
            self.delay.delay_us(EDGE_US);
            set(&mut self.shcp, false)?;
        }

        self.delay.delay_us(EDGE_US);
        set(&mut self.stcp, true)?;
        self.delay.delay_us(EDGE_US);
        set(&mut self.stcp, false)?;
        set(&mut self.oe, false)
    }
}

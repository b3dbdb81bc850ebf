//! Hardware input/output images.
//!
//! The board multiplexes its discrete I/O through two 16-bit shift-register
//! chains.  These newtypes keep the exact wire layout at the transport
//! boundary while giving every other module named accessors.
//!
//! ```text
//!  Input (74HC165, active LOW, inverted on read)
//!  bit 15 14 13    12   11     10     9       8        7..0
//!       -  -  PWR  RAIN BTN_CL BTN_OP LIM_OP  LIM_CL   IN7..IN0
//!
//!  Output (74HC595, MSB first)
//!  bit 15 14      13     12    11    10     9      8        7..0
//!       -  SAFEMON SWITCH DOME  WS_OK CPU_OK RELAY_OP RELAY_CL OUT0..OUT7
//! ```

use core::ops::{BitOr, BitOrAssign};

// ---------------------------------------------------------------------------
// Bit layout
// ---------------------------------------------------------------------------

pub mod bits {
    //! Raw bit positions at the shift-register boundary.

    /// Significant input bits; the top two lines are unused.
    pub const INPUT_MASK: u16 = 0x3FFF;

    pub const IN_CLOSE_LIMIT: u16 = 0x0100;
    pub const IN_OPEN_LIMIT: u16 = 0x0200;
    pub const IN_OPEN_BUTTON: u16 = 0x0400;
    pub const IN_CLOSE_BUTTON: u16 = 0x0800;
    pub const IN_RAIN: u16 = 0x1000;
    pub const IN_POWER_LOSS: u16 = 0x2000;

    /// Generic output 0; output `i` is `OUT_0 >> i`.
    pub const OUT_0: u16 = 0x0080;
    pub const OUT_GENERIC_MASK: u16 = 0x00FF;
    pub const OUT_CLOSE_RELAY: u16 = 0x0100;
    pub const OUT_OPEN_RELAY: u16 = 0x0200;
    pub const OUT_CPU_OK: u16 = 0x0400;
    pub const OUT_WS_OK: u16 = 0x0800;
    pub const OUT_DOME_CLIENT: u16 = 0x1000;
    pub const OUT_SWITCH_CLIENT: u16 = 0x2000;
    pub const OUT_SAFETY_CLIENT: u16 = 0x4000;

    /// Bits owned by the dome controller.
    pub const OUT_RELAY_MASK: u16 = OUT_CLOSE_RELAY | OUT_OPEN_RELAY;
}

// ---------------------------------------------------------------------------
// Input image
// ---------------------------------------------------------------------------

/// One sample of the input shift register, already inverted and masked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputImage(u16);

impl InputImage {
    /// Wrap a raw value; bits above the significant range are dropped.
    pub const fn from_bits(raw: u16) -> Self {
        Self(raw & bits::INPUT_MASK)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Generic input `i` (0–7).  Out-of-range indices read false.
    pub const fn input(self, i: usize) -> bool {
        i < 8 && self.0 & (1 << i) != 0
    }

    pub const fn close_limit(self) -> bool {
        self.0 & bits::IN_CLOSE_LIMIT != 0
    }

    pub const fn open_limit(self) -> bool {
        self.0 & bits::IN_OPEN_LIMIT != 0
    }

    pub const fn open_button(self) -> bool {
        self.0 & bits::IN_OPEN_BUTTON != 0
    }

    pub const fn close_button(self) -> bool {
        self.0 & bits::IN_CLOSE_BUTTON != 0
    }

    pub const fn rain_alarm(self) -> bool {
        self.0 & bits::IN_RAIN != 0
    }

    pub const fn power_loss(self) -> bool {
        self.0 & bits::IN_POWER_LOSS != 0
    }

    /// Limit-switch pair as seen by the shutter.
    pub const fn limits(self) -> LimitSwitches {
        LimitSwitches {
            opened: self.open_limit(),
            closed: self.close_limit(),
        }
    }
}

/// Shutter end-of-travel switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitSwitches {
    pub opened: bool,
    pub closed: bool,
}

// ---------------------------------------------------------------------------
// Output image
// ---------------------------------------------------------------------------

/// Output shift-register image, assembled fresh every cycle.
///
/// Components only ever OR their own bits in, so an image built from
/// several contributions never loses a bit another component set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputImage(u16);

impl OutputImage {
    pub const EMPTY: Self = Self(0);

    pub const fn from_bits(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Drive generic output `i` (0–7), wired in reverse order.
    #[must_use]
    pub const fn with_output(self, i: usize, on: bool) -> Self {
        if i < 8 && on {
            Self(self.0 | (bits::OUT_0 >> i))
        } else {
            self
        }
    }

    pub const fn output(self, i: usize) -> bool {
        i < 8 && self.0 & (bits::OUT_0 >> i) != 0
    }

    /// Roof relay pair.  Close wins if both are requested, so the two relay
    /// bits are never set together.
    #[must_use]
    pub const fn with_relays(self, open: bool, close: bool) -> Self {
        if close {
            Self(self.0 | bits::OUT_CLOSE_RELAY)
        } else if open {
            Self(self.0 | bits::OUT_OPEN_RELAY)
        } else {
            self
        }
    }

    pub const fn open_relay(self) -> bool {
        self.0 & bits::OUT_OPEN_RELAY != 0
    }

    pub const fn close_relay(self) -> bool {
        self.0 & bits::OUT_CLOSE_RELAY != 0
    }

    /// Set `mask` when `on`; never clears.
    #[must_use]
    pub const fn with(self, mask: u16, on: bool) -> Self {
        if on { Self(self.0 | mask) } else { self }
    }

    pub const fn contains(self, mask: u16) -> bool {
        self.0 & mask == mask
    }
}

impl BitOr for OutputImage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OutputImage {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

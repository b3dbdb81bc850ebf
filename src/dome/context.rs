//! Shared mutable context threaded through every shutter state handler.
//!
//! `DomeContext` is the blackboard the state handlers read from and write
//! to: the latest limit-switch readings, the relay request, the movement
//! timer and the dome configuration.

use crate::config::DomeConfig;
use crate::image::LimitSwitches;

/// Relay drive requested by the shutter FSM.
///
/// Handlers only ever set one of the pair; the output image additionally
/// refuses to assert both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relays {
    pub open: bool,
    pub close: bool,
}

impl Relays {
    pub const OFF: Self = Self { open: false, close: false };
    pub const OPEN: Self = Self { open: true, close: false };
    pub const CLOSE: Self = Self { open: false, close: true };
}

#[derive(Debug, Clone)]
pub struct DomeContext {
    pub config: DomeConfig,
    /// Monotonic time of the current evaluation (ms).
    pub now_ms: u64,
    /// Latest limit-switch levels.
    pub limits: LimitSwitches,
    pub relays: Relays,
    /// True while the shutter is being driven.
    pub slewing: bool,
    /// Start of the current movement; `None` when idle.
    pub motion_started_ms: Option<u64>,
}

impl DomeContext {
    pub fn new(config: DomeConfig) -> Self {
        Self {
            config,
            now_ms: 0,
            limits: LimitSwitches::default(),
            relays: Relays::OFF,
            slewing: false,
            motion_started_ms: None,
        }
    }

    /// Milliseconds since the current movement started (0 when idle).
    pub fn motion_elapsed_ms(&self) -> u64 {
        self.motion_started_ms
            .map_or(0, |start| self.now_ms.saturating_sub(start))
    }

    /// Start driving the shutter with `relays`.
    pub fn start_motion(&mut self, relays: Relays) {
        self.relays = relays;
        self.slewing = true;
        self.motion_started_ms = Some(self.now_ms);
    }

    /// Stop the motor and forget the movement timer.
    pub fn stop_motion(&mut self) {
        self.relays = Relays::OFF;
        self.slewing = false;
        self.motion_started_ms = None;
    }
}

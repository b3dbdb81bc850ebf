//! Dome shutter controller.
//!
//! A function-pointer finite state machine drives the roof relays:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌─────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ State   │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├─────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Open    │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  │ Closed  │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  │ Opening │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Closing │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Error   │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  └─────────┴───────────┴──────────┴───────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each cycle the engine calls `on_update` for the current state with the
//! latest limit-switch readings.  Commands (`open`, `close`, `abort`) force
//! transitions directly.  Two operating modes exist: with limit switches the
//! movement timer is a watchdog that faults to `Error`; without them the
//! timer alone decides when a movement is complete.

pub mod context;
pub mod states;

use context::{DomeContext, Relays};
use log::{info, warn};
use serde_json::{Map, Value};

use crate::app::ports::{CycleContext, Device, DeviceKind};
use crate::config::{self, DomeConfig};
use crate::error::CommandError;
use crate::image::{LimitSwitches, OutputImage};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Shutter state.  Discriminants follow the ASCOM `ShutterState` values
/// reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ShutterState {
    Open = 0,
    Closed = 1,
    Opening = 2,
    Closing = 3,
    Error = 4,
}

impl ShutterState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 5;

    /// Convert an index back to `ShutterState`.  Out-of-range indices map
    /// to `Error`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Open,
            1 => Self::Closed,
            2 => Self::Opening,
            3 => Self::Closing,
            _ => Self::Error,
        }
    }

    pub fn is_moving(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }
}

impl core::fmt::Display for ShutterState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::Opening => "Opening",
            Self::Closing => "Closing",
            Self::Error => "Error",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut DomeContext);

/// Signature for the per-cycle update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut DomeContext) -> Option<ShutterState>;

/// Static descriptor for a single shutter state.
pub struct StateDescriptor {
    pub id: ShutterState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// Table-driven engine.  Owns the state table; the context is passed in.
pub struct Fsm {
    /// Fixed-size table indexed by `ShutterState as usize`.
    table: [StateDescriptor; ShutterState::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; ShutterState::COUNT], initial: ShutterState) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut DomeContext) {
        info!("Shutter starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Run `on_update` for the current state and follow any transition it
    /// requests.
    pub fn tick(&mut self, ctx: &mut DomeContext) {
        if let Some(next) = (self.table[self.current].on_update)(ctx) {
            self.transition(next, ctx);
        }
    }

    /// Jump to `next` unless it is already current.
    pub fn force_transition(&mut self, next: ShutterState, ctx: &mut DomeContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> ShutterState {
        self.table[self.current].id
    }

    fn transition(&mut self, next: ShutterState, ctx: &mut DomeContext) {
        let next_idx = next as usize;

        info!(
            "Shutter transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

// ---------------------------------------------------------------------------
// Dome device
// ---------------------------------------------------------------------------

/// The dome shutter: state machine plus its blackboard.
pub struct Dome {
    fsm: Fsm,
    ctx: DomeContext,
}

impl Dome {
    /// Construct in `Error` (position unknown) until [`Dome::begin`] runs.
    pub fn new(config: DomeConfig) -> Self {
        Self {
            fsm: Fsm::new(states::build_state_table(), ShutterState::Error),
            ctx: DomeContext::new(config),
        }
    }

    /// Infer the boot state.  With limit switches the position is read
    /// directly; a reading of neither or both switches is an error.  In
    /// timeout mode the position is unknown until the first command.
    pub fn begin(&mut self, now_ms: u64, limits: LimitSwitches) {
        self.ctx.now_ms = now_ms;
        self.ctx.limits = limits;
        let initial = if self.ctx.config.use_limit_switches {
            match (limits.closed, limits.opened) {
                (true, false) => ShutterState::Closed,
                (false, true) => ShutterState::Open,
                _ => ShutterState::Error,
            }
        } else {
            ShutterState::Error
        };
        self.fsm = Fsm::new(states::build_state_table(), initial);
        self.fsm.start(&mut self.ctx);
    }

    /// Start opening.  Refused while closing; a repeat while already
    /// opening keeps the running movement and its timer.
    pub fn open(&mut self, now_ms: u64) -> Result<(), CommandError> {
        match self.fsm.current_state() {
            ShutterState::Closing => {
                warn!("Dome open command ignored while closing");
                Err(CommandError::MotionConflict)
            }
            ShutterState::Opening => {
                info!("Dome is already opening, command ignored");
                Ok(())
            }
            _ => {
                self.ctx.now_ms = now_ms;
                self.fsm.force_transition(ShutterState::Opening, &mut self.ctx);
                Ok(())
            }
        }
    }

    /// Start closing.  Refused while opening.
    pub fn close(&mut self, now_ms: u64) -> Result<(), CommandError> {
        match self.fsm.current_state() {
            ShutterState::Opening => {
                warn!("Dome close command ignored while opening");
                Err(CommandError::MotionConflict)
            }
            ShutterState::Closing => {
                info!("Dome is already closing, command ignored");
                Ok(())
            }
            _ => {
                self.ctx.now_ms = now_ms;
                self.fsm.force_transition(ShutterState::Closing, &mut self.ctx);
                Ok(())
            }
        }
    }

    /// Halt the motor and enter `Error`, whatever the current state.
    pub fn abort(&mut self) {
        self.fsm.force_transition(ShutterState::Error, &mut self.ctx);
        self.ctx.stop_motion();
        info!("Dome halted");
    }

    /// Per-cycle evaluation against fresh limit-switch readings.
    pub fn update(&mut self, now_ms: u64, limits: LimitSwitches) {
        self.ctx.now_ms = now_ms;
        self.ctx.limits = limits;
        self.fsm.tick(&mut self.ctx);
    }

    pub fn shutter_status(&self) -> ShutterState {
        self.fsm.current_state()
    }

    pub fn is_slewing(&self) -> bool {
        self.ctx.slewing
    }

    /// Relay drive currently requested by the state machine.
    pub fn relays(&self) -> Relays {
        self.ctx.relays
    }

    pub fn config(&self) -> &DomeConfig {
        &self.ctx.config
    }

    /// Relay contribution with the end-of-travel interlock applied: a relay
    /// is never driven into a switch that already reports that end.
    fn remote_image(&self, limits: LimitSwitches) -> OutputImage {
        let r = self.ctx.relays;
        OutputImage::EMPTY.with_relays(r.open && !limits.opened, r.close && !limits.closed)
    }
}

/// Manual buttons: exactly one pressed and its end not yet reached.
fn manual_image(open_button: bool, close_button: bool, limits: LimitSwitches) -> OutputImage {
    let close = close_button && !open_button && !limits.closed;
    let open = open_button && !close_button && !limits.opened;
    OutputImage::EMPTY.with_relays(open, close)
}

impl Device for Dome {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Dome
    }

    fn read_config(&mut self, doc: &Value) {
        if let Some(section) = config::section(doc, DomeConfig::SECTION) {
            self.ctx.config.apply_section(section);
            info!(
                "Dome config: use_limit_switches={} timeout={} s",
                self.ctx.config.use_limit_switches, self.ctx.config.shutter_timeout_secs
            );
        } else {
            warn!("Dome config: no {} section, keeping defaults", DomeConfig::SECTION);
        }
    }

    fn write_config(&self, doc: &mut Map<String, Value>) {
        match serde_json::to_value(self.ctx.config) {
            Ok(v) => {
                doc.insert(DomeConfig::SECTION.into(), v);
            }
            Err(e) => warn!("Dome config: serialise failed: {e}"),
        }
    }

    fn evaluate(&mut self, cycle: &CycleContext) -> OutputImage {
        let limits = cycle.inputs.limits();
        self.update(cycle.now_ms, limits);
        self.remote_image(limits)
    }

    fn evaluate_unattended(&mut self, cycle: &CycleContext) -> OutputImage {
        let limits = cycle.inputs.limits();
        self.update(cycle.now_ms, limits);
        manual_image(cycle.inputs.open_button(), cycle.inputs.close_button(), limits)
    }
}

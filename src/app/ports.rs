//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (shift registers, PWM, serial link, host runtime,
//! configuration store, event sinks) implement these traits.  The
//! [`Controller`](super::service::Controller) consumes them via generics,
//! so the domain core never touches hardware directly.
//!
//! Each enclosure device (dome, switch bank, safety monitor) implements
//! [`Device`]; the host runtime composes over that interface instead of the
//! devices inheriting from host code.

use serde_json::{Map, Value};

use crate::image::{InputImage, OutputImage};
use crate::weather::{Liveness, WeatherSample};

// ───────────────────────────────────────────────────────────────
// I/O port (driven adapter: shift registers + PWM ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Hardware transport.  Writes are best-effort: adapters log failures and
/// keep going, the domain never sees them.
pub trait IoPort {
    /// Latch and shift in the input register.
    fn sample_inputs(&mut self) -> InputImage;

    /// Shift out and latch a new output image.
    fn commit_outputs(&mut self, image: OutputImage);

    /// Request duty (percent, 0–100) on the four PWM channels.  Adapters
    /// only re-drive channels whose duty changed.
    fn write_pwm(&mut self, duties: &[u8; 4]);
}

// ───────────────────────────────────────────────────────────────
// Host port (driven adapter: remote-control runtime → domain)
// ───────────────────────────────────────────────────────────────

/// The three enclosure devices exposed to remote clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Dome,
    Switch,
    SafetyMonitor,
}

/// Queries answered by the host runtime that serves remote clients.
pub trait HostPort {
    /// Number of remote clients currently attached to `device`.
    fn connected_clients(&self, device: DeviceKind) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Serial port (driven adapter: weather station UART → domain)
// ───────────────────────────────────────────────────────────────

/// Non-blocking byte source.
pub trait SerialPort {
    /// Next received byte, or `None` if nothing is waiting.
    fn read_byte(&mut self) -> Option<u8>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the device configuration document.
///
/// The document is one JSON object with a section per device.  Values in
/// it are validated by the devices on read, so implementations store it
/// as-is.
pub trait ConfigPort {
    /// Load the stored document.  [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> Result<Value, ConfigError>;

    /// Persist the document, replacing any previous one.
    fn save(&self, doc: &Value) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Device interface (domain ↔ host runtime)
// ───────────────────────────────────────────────────────────────

/// Everything a device may look at during one control cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleContext {
    /// Monotonic time (ms).
    pub now_ms: u64,
    /// Latest sampled input image.
    pub inputs: InputImage,
    pub weather: WeatherSample,
    pub link: Liveness,
}

/// Standard lifecycle of an enclosure device.
///
/// The controller calls exactly one of [`Device::evaluate`] (a client is
/// attached) or [`Device::evaluate_unattended`] (no client) every cycle and
/// ORs the returned bits into the output image.  A device only ever
/// returns bits it owns.
pub trait Device {
    fn kind(&self) -> DeviceKind;

    /// Merge this device's section of the persisted document.
    fn read_config(&mut self, doc: &Value);

    /// Write this device's section into the document root.
    fn write_config(&self, doc: &mut Map<String, Value>);

    /// Remote-controlled cycle.
    fn evaluate(&mut self, cycle: &CycleContext) -> OutputImage;

    /// Cycle with no client attached: fall back to the device's local or
    /// inactive behaviour.
    fn evaluate_unattended(&mut self, cycle: &CycleContext) -> OutputImage;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored document is not valid JSON.
    Corrupted,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

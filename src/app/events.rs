//! Outbound controller events.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::dome::ShutterState;
use crate::image::OutputImage;

/// Structured events emitted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller has started (carries the inferred shutter state).
    Started(ShutterState),

    /// The shutter state machine moved.
    ShutterChanged { from: ShutterState, to: ShutterState },

    /// The aggregated safety verdict flipped.  `hazards` is the
    /// [`Hazard`](crate::error::Hazard) bitmask at the time.
    SafetyChanged { safe: bool, hazards: u8 },

    /// The weather station link came up or went down.
    WeatherLink { connected: bool },

    /// A new output image was shifted out.
    OutputsCommitted(OutputImage),
}

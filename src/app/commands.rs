//! Inbound commands to the controller.
//!
//! These represent requests from remote clients, relayed by the host
//! runtime, that the [`Controller`](super::service::Controller) interprets
//! and acts upon.

use serde_json::Value;

use crate::switch::Label;

/// Commands that external adapters can send into the controller.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Drive the shutter towards open.
    OpenShutter,

    /// Drive the shutter towards closed.
    CloseShutter,

    /// Stop the shutter wherever it is.
    AbortSlew,

    /// Set a writable switch (outputs take 0/1, PWM channels 0–100).
    SetSwitch { id: u32, value: f64 },

    /// Rename a switch.
    SetSwitchName { id: u32, name: Label },

    /// Merge a configuration document into the live device settings.
    UpdateConfig(Value),

    /// Persist the current device settings immediately.
    SaveConfig,
}

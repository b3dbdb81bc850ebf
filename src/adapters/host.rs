//! Host runtime adapter for running without the remote-control server.
//!
//! The networked host that serves remote clients lives outside this crate.
//! [`StandaloneHost`] stands in for it: client counts are set explicitly,
//! which is how the board behaves before any client attaches and how tests
//! simulate attachment.

use crate::app::ports::{DeviceKind, HostPort};

#[derive(Debug, Default, Clone, Copy)]
pub struct StandaloneHost {
    dome: u32,
    switch: u32,
    safety: u32,
}

impl StandaloneHost {
    /// No clients attached: every device runs unattended.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_clients(&mut self, device: DeviceKind, count: u32) {
        *self.slot(device) = count;
    }

    pub fn attach(&mut self, device: DeviceKind) {
        *self.slot(device) += 1;
    }

    pub fn detach(&mut self, device: DeviceKind) {
        let slot = self.slot(device);
        *slot = slot.saturating_sub(1);
    }

    fn slot(&mut self, device: DeviceKind) -> &mut u32 {
        match device {
            DeviceKind::Dome => &mut self.dome,
            DeviceKind::Switch => &mut self.switch,
            DeviceKind::SafetyMonitor => &mut self.safety,
        }
    }
}

impl HostPort for StandaloneHost {
    fn connected_clients(&self, device: DeviceKind) -> u32 {
        match device {
            DeviceKind::Dome => self.dome,
            DeviceKind::Switch => self.switch,
            DeviceKind::SafetyMonitor => self.safety,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_and_detach_per_device() {
        let mut host = StandaloneHost::new();
        host.attach(DeviceKind::Dome);
        host.attach(DeviceKind::Dome);
        host.detach(DeviceKind::Dome);
        host.detach(DeviceKind::Switch);
        assert_eq!(host.connected_clients(DeviceKind::Dome), 1);
        assert_eq!(host.connected_clients(DeviceKind::Switch), 0);
        assert_eq!(host.connected_clients(DeviceKind::SafetyMonitor), 0);
    }
}

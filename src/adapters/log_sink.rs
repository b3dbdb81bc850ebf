//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured controller events to
//! the ESP-IDF logger (which goes to UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | shutter={}", state);
            }
            AppEvent::ShutterChanged { from, to } => {
                info!("SHUTTER | {} -> {}", from, to);
            }
            AppEvent::SafetyChanged { safe: true, .. } => {
                info!("SAFETY | safe");
            }
            AppEvent::SafetyChanged { safe: false, hazards } => {
                warn!("SAFETY | unsafe, hazards=0b{:06b}", hazards);
            }
            AppEvent::WeatherLink { connected } => {
                info!("WEATHER | link {}", if *connected { "up" } else { "down" });
            }
            AppEvent::OutputsCommitted(image) => {
                log::debug!("OUTPUT | 0x{:04X}", image.bits());
            }
        }
    }
}

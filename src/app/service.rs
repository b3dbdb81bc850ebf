//! Controller: the hexagonal core.
//!
//! [`Controller`] owns the three enclosure devices, the weather station
//! state and the last sampled and committed register images.  It exposes a
//! hardware-agnostic API; all I/O flows through port traits injected at
//! call sites, making the whole control cycle testable with mock adapters.
//!
//! ```text
//!  SerialPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          Controller           │
//!      IoPort ◀──▶│  Dome · Switches · Safety     │◀── HostPort
//!                 └──────────────────────────────┘
//! ```

use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::config::SystemConfig;
use crate::dome::{Dome, ShutterState};
use crate::error::{CommandError, Result};
use crate::image::{InputImage, OutputImage, bits};
use crate::safety::SafetyMonitor;
use crate::switch::SwitchBank;
use crate::weather::codec::FRAME_CAPACITY;
use crate::weather::{Liveness, WeatherSample, WeatherStation};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{
    ConfigError, ConfigPort, CycleContext, Device, DeviceKind, EventSink, HostPort, IoPort,
    SerialPort,
};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// Runs the fixed control cycle: sample → weather → devices → status →
/// commit.
pub struct Controller {
    config: SystemConfig,
    dome: Dome,
    switches: SwitchBank,
    safety: SafetyMonitor,
    weather: WeatherStation,

    inputs: InputImage,
    /// Image assembled by the latest cycle.
    outputs: OutputImage,
    /// Image last shifted out to the register.
    committed: OutputImage,

    last_sample_ms: u64,
    last_commit_ms: u64,
    blink_epoch_ms: u64,

    reported_shutter: ShutterState,
    reported_safe: bool,
    config_dirty: bool,
}

impl Controller {
    /// Construct the controller from configuration.
    ///
    /// Does **not** touch hardware; call [`begin`](Self::begin) next.
    pub fn new(config: SystemConfig) -> Self {
        let dome = Dome::new(config.dome);
        let safety = SafetyMonitor::new(config.safety);
        Self {
            config,
            dome,
            switches: SwitchBank::new(),
            safety,
            weather: WeatherStation::new(),
            inputs: InputImage::default(),
            outputs: OutputImage::EMPTY,
            committed: OutputImage::EMPTY,
            last_sample_ms: 0,
            last_commit_ms: 0,
            blink_epoch_ms: 0,
            reported_shutter: ShutterState::Error,
            reported_safe: true,
            config_dirty: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load the persisted settings, sample the inputs once and infer the
    /// shutter position from them.
    pub fn begin(
        &mut self,
        now_ms: u64,
        io: &mut impl IoPort,
        store: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) {
        match store.load() {
            Ok(doc) => self.read_config(&doc),
            Err(ConfigError::NotFound) => info!("No stored config, using defaults"),
            Err(e) => warn!("Config load failed ({e}), using defaults"),
        }

        self.inputs = io.sample_inputs();
        self.last_sample_ms = now_ms;
        self.last_commit_ms = now_ms;
        self.blink_epoch_ms = now_ms;

        self.dome.begin(now_ms, self.inputs.limits());
        self.reported_shutter = self.dome.shutter_status();
        self.reported_safe = self.safety.is_safe();

        sink.emit(&AppEvent::Started(self.reported_shutter));
        info!("Controller started, shutter {}", self.reported_shutter);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle.
    ///
    /// Every device is evaluated every cycle; whether it runs attended or
    /// unattended depends on its client count at that moment.
    pub fn tick(
        &mut self,
        now_ms: u64,
        io: &mut impl IoPort,
        host: &impl HostPort,
        serial: &mut impl SerialPort,
        sink: &mut impl EventSink,
    ) {
        // 1. Sample inputs
        if now_ms.saturating_sub(self.last_sample_ms) >= self.config.sample_interval_ms {
            self.inputs = io.sample_inputs();
            self.last_sample_ms = now_ms;
        }

        // 2. Weather station (link held down while the safety monitor is unattended)
        let safety_attended = host.connected_clients(DeviceKind::SafetyMonitor) > 0;
        self.drain_serial(now_ms, safety_attended, serial, sink);

        // 3. Devices
        let cycle = CycleContext {
            now_ms,
            inputs: self.inputs,
            weather: *self.weather.sample(),
            link: self.weather.liveness(),
        };
        let mut image = OutputImage::EMPTY;
        let devices: [&mut dyn Device; 3] = [&mut self.dome, &mut self.switches, &mut self.safety];
        for device in devices {
            let attached = host.connected_clients(device.kind()) > 0;
            image |= if attached {
                device.evaluate(&cycle)
            } else {
                device.evaluate_unattended(&cycle)
            };
            image |= OutputImage::EMPTY.with(client_led(device.kind()), attached);
        }

        // 4. Status LEDs
        image |= self.status_image(now_ms, cycle.link);
        self.outputs = image;

        // 5. Commit
        if now_ms.saturating_sub(self.last_commit_ms) >= self.config.commit_interval_ms {
            self.last_commit_ms = now_ms;
            if image != self.committed {
                io.commit_outputs(image);
                self.committed = image;
                sink.emit(&AppEvent::OutputsCommitted(image));
            }
        }
        io.write_pwm(&self.switches.pwm_duties());

        // 6. Report changes
        self.report_changes(sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a client request relayed by the host runtime.
    ///
    /// State changes caused here are reported as events on the next tick.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        store: &impl ConfigPort,
    ) -> Result<()> {
        match cmd {
            AppCommand::OpenShutter => self.open_shutter(now_ms)?,
            AppCommand::CloseShutter => self.close_shutter(now_ms)?,
            AppCommand::AbortSlew => self.abort_slew(),
            AppCommand::SetSwitch { id, value } => self.write_switch(id, value)?,
            AppCommand::SetSwitchName { id, name } => {
                self.switches.set_name(id, &name)?;
                self.mark_config_dirty();
            }
            AppCommand::UpdateConfig(doc) => self.write_config(&doc),
            AppCommand::SaveConfig => self.save_config(store)?,
        }
        Ok(())
    }

    pub fn open_shutter(&mut self, now_ms: u64) -> core::result::Result<(), CommandError> {
        self.dome.open(now_ms)
    }

    pub fn close_shutter(&mut self, now_ms: u64) -> core::result::Result<(), CommandError> {
        self.dome.close(now_ms)
    }

    pub fn abort_slew(&mut self) {
        self.dome.abort();
    }

    pub fn write_switch(&mut self, id: u32, value: f64) -> core::result::Result<(), CommandError> {
        self.switches.write_value(id, value)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn shutter_status(&self) -> ShutterState {
        self.dome.shutter_status()
    }

    pub fn is_slewing(&self) -> bool {
        self.dome.is_slewing()
    }

    pub fn switch_value(&self, id: u32) -> core::result::Result<f64, CommandError> {
        self.switches.value(id)
    }

    pub fn switches(&self) -> &SwitchBank {
        &self.switches
    }

    pub fn is_safe(&self) -> bool {
        self.safety.is_safe()
    }

    /// Active [`Hazard`](crate::error::Hazard) bitmask.
    pub fn hazards(&self) -> u8 {
        self.safety.hazards()
    }

    pub fn weather(&self) -> &WeatherSample {
        self.weather.sample()
    }

    pub fn weather_link(&self) -> Liveness {
        self.weather.liveness()
    }

    /// Latest sampled input image.
    pub fn inputs(&self) -> InputImage {
        self.inputs
    }

    /// Image assembled by the latest cycle (not necessarily committed yet).
    pub fn outputs(&self) -> OutputImage {
        self.outputs
    }

    /// Image last shifted out.
    pub fn committed(&self) -> OutputImage {
        self.committed
    }

    pub fn system_config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Configuration ─────────────────────────────────────────

    /// Merge a configuration document into every device.  Missing sections
    /// leave that device's settings untouched.
    pub fn read_config(&mut self, doc: &Value) {
        self.dome.read_config(doc);
        self.switches.read_config(doc);
        self.safety.read_config(doc);
        self.config.dome = *self.dome.config();
        self.config.safety = *self.safety.config();
    }

    /// Snapshot of the live device settings as one document.
    pub fn config_document(&self) -> Value {
        let mut root = Map::new();
        self.dome.write_config(&mut root);
        self.switches.write_config(&mut root);
        self.safety.write_config(&mut root);
        Value::Object(root)
    }

    /// Apply a document at runtime and schedule it for persistence.
    pub fn write_config(&mut self, doc: &Value) {
        self.read_config(doc);
        self.mark_config_dirty();
        info!("Configuration updated at runtime");
    }

    /// Persist the live settings now.
    pub fn save_config(&mut self, store: &impl ConfigPort) -> core::result::Result<(), ConfigError> {
        store.save(&self.config_document())?;
        self.config_dirty = false;
        info!("Config saved");
        Ok(())
    }

    /// Save only if something changed since the last save.  Returns `true`
    /// if the document was written.
    pub fn save_if_dirty(&mut self, store: &impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        match self.save_config(store) {
            Ok(()) => true,
            Err(e) => {
                warn!("Config save failed: {e}");
                false
            }
        }
    }

    pub fn mark_config_dirty(&mut self) {
        self.config_dirty = true;
    }

    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }

    // ── Internal ──────────────────────────────────────────────

    /// Feed at most one frame's worth of waiting bytes, then check the
    /// link timeout.
    fn drain_serial(
        &mut self,
        now_ms: u64,
        safety_attended: bool,
        serial: &mut impl SerialPort,
        sink: &mut impl EventSink,
    ) {
        let was_connected = self.weather.liveness().connected;
        self.weather.hold_down(!safety_attended);

        for _ in 0..FRAME_CAPACITY {
            let Some(byte) = serial.read_byte() else {
                break;
            };
            match self.weather.feed(byte, now_ms) {
                Ok(Some(accepted)) => debug!("Weather frame merged, fields 0b{accepted:08b}"),
                Ok(None) => {}
                Err(e) => debug!("Weather frame discarded: {e}"),
            }
        }

        let timeout_ms = u64::from(self.config.weather_link_timeout_secs) * 1000;
        self.weather.poll_link(now_ms, timeout_ms);

        let connected = self.weather.liveness().connected;
        if connected != was_connected {
            sink.emit(&AppEvent::WeatherLink { connected });
        }
    }

    /// CPU heartbeat (on for the first half of each period) and weather
    /// link LED.
    fn status_image(&self, now_ms: u64, link: Liveness) -> OutputImage {
        let period = self.config.status_blink_period_ms.max(1);
        let phase = now_ms.saturating_sub(self.blink_epoch_ms) % period;
        OutputImage::EMPTY
            .with(bits::OUT_CPU_OK, phase < period / 2)
            .with(bits::OUT_WS_OK, link.connected)
    }

    fn report_changes(&mut self, sink: &mut impl EventSink) {
        let shutter = self.dome.shutter_status();
        if shutter != self.reported_shutter {
            sink.emit(&AppEvent::ShutterChanged {
                from: self.reported_shutter,
                to: shutter,
            });
            self.reported_shutter = shutter;
        }

        let safe = self.safety.is_safe();
        if safe != self.reported_safe {
            sink.emit(&AppEvent::SafetyChanged {
                safe,
                hazards: self.safety.hazards(),
            });
            self.reported_safe = safe;
        }
    }
}

/// Front-panel LED showing that `kind` has a client attached.
fn client_led(kind: DeviceKind) -> u16 {
    match kind {
        DeviceKind::Dome => bits::OUT_DOME_CLIENT,
        DeviceKind::Switch => bits::OUT_SWITCH_CLIENT,
        DeviceKind::SafetyMonitor => bits::OUT_SAFETY_CLIENT,
    }
}

//! Safety monitor.
//!
//! Runs every cycle after input sampling and accumulates a hazard bitmask.
//! `is_safe()` is true only while the mask is zero.
//!
//! ## Hazard lifecycle
//!
//! 1. A source reads true (rain alarm, power alarm, sky temperature or wind
//!    above limit) and its debounce timer starts.
//! 2. Once the condition has held continuously for the source's grace
//!    delay, the hazard bit is set.
//! 3. The first false reading clears both the timer and the bit on the
//!    same cycle.
//!
//! Trip is delayed, recovery is instant.  Several hazards can be active at
//! once and the monitor stays unsafe until every one of them clears.
//!
//! Weather sources are only trusted while the station link is up; a lost
//! link clears them.  A power-off delay of 0 disables power sensing.

use log::{error, info, warn};
use serde_json::{Map, Value};

use crate::app::ports::{CycleContext, Device, DeviceKind};
use crate::config::{self, SafetyConfig};
use crate::error::Hazard;
use crate::image::{InputImage, OutputImage};
use crate::weather::{Liveness, WeatherSample};

/// Delayed-trip, instant-recovery timer for one hazard source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Debounce {
    started_ms: Option<u64>,
}

impl Debounce {
    /// Feed the current condition.  Returns `true` once it has held for at
    /// least `grace_ms`.
    pub fn update(&mut self, condition: bool, now_ms: u64, grace_ms: u64) -> bool {
        if !condition {
            self.started_ms = None;
            return false;
        }
        let start = *self.started_ms.get_or_insert(now_ms);
        now_ms.saturating_sub(start) >= grace_ms
    }

    pub fn reset(&mut self) {
        self.started_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_ms.is_some()
    }
}

/// Safety monitor.
pub struct SafetyMonitor {
    config: SafetyConfig,
    /// Active hazard bitmask.
    hazards: u8,
    rain: Debounce,
    power: Debounce,
    sky: Debounce,
    wind: Debounce,
}

impl SafetyMonitor {
    pub fn new(config: SafetyConfig) -> Self {
        Self {
            config,
            hazards: 0,
            rain: Debounce::default(),
            power: Debounce::default(),
            sky: Debounce::default(),
            wind: Debounce::default(),
        }
    }

    /// Evaluate every source against the latest inputs and telemetry.
    /// Returns the updated hazard bitmask.
    pub fn evaluate(
        &mut self,
        now_ms: u64,
        inputs: InputImage,
        weather: &WeatherSample,
        link: Liveness,
    ) -> u8 {
        let cfg = self.config;

        // ── Rain alarm ────────────────────────────────────────────
        let tripped = self
            .rain
            .update(inputs.rain_alarm(), now_ms, secs_to_ms(cfg.rain_delay_secs));
        self.set_hazard(Hazard::Rain, tripped);

        // ── Power loss (0 s delay = not fitted) ──────────────────
        if cfg.power_off_delay_secs > 0 {
            let tripped =
                self.power
                    .update(inputs.power_loss(), now_ms, secs_to_ms(cfg.power_off_delay_secs));
            self.set_hazard(Hazard::PowerLoss, tripped);
        } else {
            self.power.reset();
            self.set_hazard(Hazard::PowerLoss, false);
        }

        // ── Weather station sources ──────────────────────────────
        let grace = secs_to_ms(cfg.weather_delay_secs);
        // Raw comparison: the limit is not rescaled to the sample's tenths.
        let sky_hot = link.connected && cfg.use_sky_temp && weather.sky_temp > cfg.sky_temp_limit_c;
        let tripped = self.sky.update(sky_hot, now_ms, grace);
        self.set_hazard(Hazard::SkyTemperature, tripped);

        let windy = link.connected && cfg.use_wind && weather.wind > cfg.wind_limit_kmh;
        let tripped = self.wind.update(windy, now_ms, grace);
        self.set_hazard(Hazard::Wind, tripped);

        self.hazards
    }

    /// Clear every hazard and timer.
    pub fn reset(&mut self) {
        if self.hazards != 0 {
            info!("Safety monitor reset, hazards 0x{:02x} cleared", self.hazards);
        }
        self.hazards = 0;
        self.rain.reset();
        self.power.reset();
        self.sky.reset();
        self.wind.reset();
    }

    pub fn is_safe(&self) -> bool {
        self.hazards == 0
    }

    /// Current hazard bitmask.
    pub fn hazards(&self) -> u8 {
        self.hazards
    }

    pub fn has_hazard(&self, hazard: Hazard) -> bool {
        self.hazards & hazard.mask() != 0
    }

    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────────

    fn set_hazard(&mut self, hazard: Hazard, active: bool) {
        if active {
            if self.hazards & hazard.mask() == 0 {
                error!("SAFETY HAZARD SET: {hazard}");
            }
            self.hazards |= hazard.mask();
        } else {
            if self.hazards & hazard.mask() != 0 {
                info!("SAFETY HAZARD CLEARED: {hazard}");
            }
            self.hazards &= !hazard.mask();
        }
    }
}

fn secs_to_ms(secs: u32) -> u64 {
    u64::from(secs) * 1000
}

impl Device for SafetyMonitor {
    fn kind(&self) -> DeviceKind {
        DeviceKind::SafetyMonitor
    }

    fn read_config(&mut self, doc: &Value) {
        if let Some(section) = config::section(doc, SafetyConfig::SECTION) {
            self.config.apply_section(section);
            let c = &self.config;
            info!(
                "Safety config: rain={} s power={} s weather={} s sky({})={} C wind({})={} hum({})={} light({})={}",
                c.rain_delay_secs,
                c.power_off_delay_secs,
                c.weather_delay_secs,
                c.use_sky_temp,
                c.sky_temp_limit_c,
                c.use_wind,
                c.wind_limit_kmh,
                c.use_humidity,
                c.humidity_limit,
                c.use_light,
                c.light_limit
            );
        } else {
            warn!("Safety config: no {} section, keeping defaults", SafetyConfig::SECTION);
        }
    }

    fn write_config(&self, doc: &mut Map<String, Value>) {
        match serde_json::to_value(self.config) {
            Ok(v) => {
                doc.insert(SafetyConfig::SECTION.into(), v);
            }
            Err(e) => warn!("Safety config: serialise failed: {e}"),
        }
    }

    fn evaluate(&mut self, cycle: &CycleContext) -> OutputImage {
        SafetyMonitor::evaluate(self, cycle.now_ms, cycle.inputs, &cycle.weather, cycle.link);
        OutputImage::EMPTY
    }

    fn evaluate_unattended(&mut self, _cycle: &CycleContext) -> OutputImage {
        self.reset();
        OutputImage::EMPTY
    }
}

//! Weather station telemetry.
//!
//! Bytes from the station UART are framed by [`codec::FrameAssembler`],
//! split by [`codec::parse_frame`] and merged into the latest
//! [`WeatherSample`] field by field.  A field outside its valid range keeps
//! its previous value; the other fields of the same frame still update.

pub mod codec;

use log::{debug, info, warn};

use crate::error::FrameError;
use codec::{FIELD_COUNT, FrameAssembler, parse_frame};

/// Valid range for each field, in frame order.
const FIELD_RANGES: [(i32, i32); FIELD_COUNT] = [
    (-500, 500), // sky temperature, 0.1 °C
    (-500, 500), // air temperature, 0.1 °C
    (0, 100),    // wind, km/h
    (0, 110),    // humidity, %
    (0, 9999),   // rain
    (0, 9999),   // light, lux
    (-1, 100),   // cloud coverage, % (-1 = not fitted)
    (-1, 9999),  // star count (-1 = not fitted)
];

const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "sky_temp", "air_temp", "wind", "humidity", "rain", "light", "clouds", "stars",
];

/// Latest accepted reading of every station field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeatherSample {
    /// Sky temperature in tenths of a degree Celsius.
    pub sky_temp: i16,
    /// Air temperature in tenths of a degree Celsius.
    pub air_temp: i16,
    /// km/h.
    pub wind: i16,
    /// Relative humidity, %.
    pub humidity: i16,
    pub rain: i16,
    /// lux.
    pub light: i16,
    pub cloud_coverage: i16,
    pub star_count: i16,
}

impl WeatherSample {
    /// Merge parsed fields.  Returns a bitmask of the accepted fields
    /// (bit `i` = field `i`).
    pub fn apply(&mut self, fields: &[i32; FIELD_COUNT]) -> u8 {
        let slots: [&mut i16; FIELD_COUNT] = [
            &mut self.sky_temp,
            &mut self.air_temp,
            &mut self.wind,
            &mut self.humidity,
            &mut self.rain,
            &mut self.light,
            &mut self.cloud_coverage,
            &mut self.star_count,
        ];

        let mut accepted = 0u8;
        for (i, slot) in slots.into_iter().enumerate() {
            let (lo, hi) = FIELD_RANGES[i];
            let v = fields[i];
            if (lo..=hi).contains(&v) {
                *slot = v as i16;
                accepted |= 1 << i;
            } else {
                debug!("Weather {} = {} outside {}..={}, keeping {}", FIELD_NAMES[i], v, lo, hi, slot);
            }
        }
        accepted
    }
}

/// Whether the station link is considered up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Liveness {
    pub connected: bool,
    /// Time of the last complete frame.
    pub last_frame_ms: Option<u64>,
}

/// Frame assembler plus the sample and link state it feeds.
pub struct WeatherStation {
    assembler: FrameAssembler,
    sample: WeatherSample,
    liveness: Liveness,
    /// Link forced down while nobody watches the safety monitor.
    held_down: bool,
}

impl WeatherStation {
    pub fn new() -> Self {
        Self {
            assembler: FrameAssembler::new(),
            sample: WeatherSample::default(),
            liveness: Liveness::default(),
            held_down: false,
        }
    }

    /// Feed one received byte.
    ///
    /// Any complete frame marks the link alive, even if its contents are
    /// then rejected.  Returns the accepted-field mask when a frame was
    /// merged, `Ok(None)` while a frame is still being assembled.
    pub fn feed(&mut self, byte: u8, now_ms: u64) -> Result<Option<u8>, FrameError> {
        let parsed = match self.assembler.push(byte)? {
            Some(frame) => parse_frame(frame),
            None => return Ok(None),
        };

        self.mark_alive(now_ms);
        let fields = parsed?;
        Ok(Some(self.sample.apply(&fields)))
    }

    /// Drop the link after `timeout_ms` without a complete frame.
    /// Returns `true` on the cycle the link goes down.
    pub fn poll_link(&mut self, now_ms: u64, timeout_ms: u64) -> bool {
        let Some(last) = self.liveness.last_frame_ms else {
            return false;
        };
        if self.liveness.connected && now_ms.saturating_sub(last) >= timeout_ms {
            self.liveness.connected = false;
            warn!("Weather link lost: no frame for {} ms", now_ms.saturating_sub(last));
            return true;
        }
        false
    }

    /// Force the link down while `held`. Frames keep updating the sample,
    /// but the link only comes back with a frame received after release.
    pub fn hold_down(&mut self, held: bool) {
        if held && self.liveness.connected {
            info!("Weather link held down");
            self.liveness.connected = false;
        }
        self.held_down = held;
    }

    pub fn sample(&self) -> &WeatherSample {
        &self.sample
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    fn mark_alive(&mut self, now_ms: u64) {
        self.liveness.last_frame_ms = Some(now_ms);
        if self.held_down {
            return;
        }
        if !self.liveness.connected {
            info!("Weather link up");
        }
        self.liveness.connected = true;
    }
}

impl Default for WeatherStation {
    fn default() -> Self {
        Self::new()
    }
}

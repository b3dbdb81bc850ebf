//! System configuration parameters
//!
//! All tunable parameters for the TSBoard controller.  Device settings are
//! persisted by the host runtime as one JSON document with a section per
//! device; the readers here are lenient (out-of-range values are clamped,
//! defaulted or ignored, never fatal) and the writers use serde derive so the
//! key names round-trip exactly.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default shutter movement timeout, also used when a persisted value is
/// outside 1–300 s.
pub const SHUTTER_TIMEOUT_DEFAULT_SECS: u32 = 60;
pub const RAIN_DELAY_DEFAULT_SECS: u32 = 2;
pub const POWER_OFF_DELAY_DEFAULT_SECS: u32 = 0;
pub const WEATHER_DELAY_DEFAULT_SECS: u32 = 10;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Minimum interval between input shift-register samples (milliseconds)
    pub sample_interval_ms: u64,
    /// Minimum interval between output shift-register commits (milliseconds)
    pub commit_interval_ms: u64,
    /// CPU-OK LED blink period; on for the first half (milliseconds)
    pub status_blink_period_ms: u64,
    /// Weather link is considered lost after this much silence (seconds)
    pub weather_link_timeout_secs: u32,

    // --- Devices ---
    pub dome: DomeConfig,
    pub safety: SafetyConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100,
            commit_interval_ms: 100,
            status_blink_period_ms: 1000,
            weather_link_timeout_secs: 30,
            dome: DomeConfig::default(),
            safety: SafetyConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dome
// ---------------------------------------------------------------------------

/// Shutter behaviour.  `use_limit_switches == false` selects timeout mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomeConfig {
    #[serde(rename = "Use_limit_switches")]
    pub use_limit_switches: bool,
    /// Movement timeout in seconds, 1–300.
    #[serde(rename = "Shutter_timeout")]
    pub shutter_timeout_secs: u32,
}

impl Default for DomeConfig {
    fn default() -> Self {
        Self {
            use_limit_switches: false,
            shutter_timeout_secs: SHUTTER_TIMEOUT_DEFAULT_SECS,
        }
    }
}

impl DomeConfig {
    /// Section name in the persisted document.
    pub const SECTION: &'static str = "Dome_Configuration";

    /// Merge a persisted `Dome_Configuration` section into `self`.
    pub fn apply_section(&mut self, section: &Map<String, Value>) {
        if let Some(flag) = read_flag(section, "Use_limit_switches") {
            self.use_limit_switches = flag;
        }
        if let Some(t) = read_number(section, "Shutter_timeout") {
            self.shutter_timeout_secs = if (1..=300).contains(&t) {
                t as u32
            } else {
                warn!("Shutter_timeout {t} outside 1-300 s, using {SHUTTER_TIMEOUT_DEFAULT_SECS}");
                SHUTTER_TIMEOUT_DEFAULT_SECS
            };
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::from(self.shutter_timeout_secs) * 1000
    }
}

// ---------------------------------------------------------------------------
// Safety monitor
// ---------------------------------------------------------------------------

/// Hazard sources, their grace delays and limits.
///
/// Delays apply per source: rain and power use their own, sky temperature
/// and wind share `weather_delay_secs`.  Humidity and light are stored and
/// persisted but do not take part in the safety verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// 2–60 s.
    #[serde(rename = "Rain_delay")]
    pub rain_delay_secs: u32,
    /// 0–600 s; 0 disables power-loss sensing.
    #[serde(rename = "Power_off_delay")]
    pub power_off_delay_secs: u32,
    /// 0–600 s.
    #[serde(rename = "Weather_delay")]
    pub weather_delay_secs: u32,

    #[serde(rename = "Use_sky_temp")]
    pub use_sky_temp: bool,
    /// Degrees Celsius, -50–50.
    #[serde(rename = "Sky_temp_limit")]
    pub sky_temp_limit_c: i16,
    #[serde(rename = "Use_wind")]
    pub use_wind: bool,
    /// km/h, 0–100.
    #[serde(rename = "Wind_limit")]
    pub wind_limit_kmh: i16,
    #[serde(rename = "Use_humidity")]
    pub use_humidity: bool,
    /// Percent, 0–100.
    #[serde(rename = "Humidity")]
    pub humidity_limit: i16,
    #[serde(rename = "Use_light")]
    pub use_light: bool,
    /// 0–100.
    #[serde(rename = "Ambient_light")]
    pub light_limit: i16,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            rain_delay_secs: RAIN_DELAY_DEFAULT_SECS,
            power_off_delay_secs: POWER_OFF_DELAY_DEFAULT_SECS,
            weather_delay_secs: WEATHER_DELAY_DEFAULT_SECS,
            use_sky_temp: false,
            sky_temp_limit_c: 0,
            use_wind: false,
            wind_limit_kmh: 20,
            use_humidity: false,
            humidity_limit: 95,
            use_light: false,
            light_limit: 0,
        }
    }
}

impl SafetyConfig {
    /// Section name in the persisted document.
    pub const SECTION: &'static str = "SafetyMonitor_Configuration";

    /// Merge a persisted `SafetyMonitor_Configuration` section into `self`.
    ///
    /// Delays outside their range fall back to the default; limits outside
    /// their range are dropped and the previous value is kept.
    pub fn apply_section(&mut self, section: &Map<String, Value>) {
        if let Some(d) = read_number(section, "Rain_delay") {
            self.rain_delay_secs = delay_or_default("Rain_delay", d, 2, 60, RAIN_DELAY_DEFAULT_SECS);
        }
        if let Some(d) = read_number(section, "Power_off_delay") {
            self.power_off_delay_secs =
                delay_or_default("Power_off_delay", d, 0, 600, POWER_OFF_DELAY_DEFAULT_SECS);
        }
        if let Some(d) = read_number(section, "Weather_delay") {
            self.weather_delay_secs =
                delay_or_default("Weather_delay", d, 0, 600, WEATHER_DELAY_DEFAULT_SECS);
        }

        if let Some(flag) = read_flag(section, "Use_sky_temp") {
            self.use_sky_temp = flag;
        }
        retain_limit(section, "Sky_temp_limit", -50, 50, &mut self.sky_temp_limit_c);
        if let Some(flag) = read_flag(section, "Use_wind") {
            self.use_wind = flag;
        }
        retain_limit(section, "Wind_limit", 0, 100, &mut self.wind_limit_kmh);
        if let Some(flag) = read_flag(section, "Use_humidity") {
            self.use_humidity = flag;
        }
        retain_limit(section, "Humidity", 0, 100, &mut self.humidity_limit);
        if let Some(flag) = read_flag(section, "Use_light") {
            self.use_light = flag;
        }
        retain_limit(section, "Ambient_light", 0, 100, &mut self.light_limit);
    }
}

fn delay_or_default(key: &str, value: i64, min: i64, max: i64, default: u32) -> u32 {
    if (min..=max).contains(&value) {
        value as u32
    } else {
        warn!("{key} {value} outside {min}-{max} s, using {default}");
        default
    }
}

fn retain_limit(section: &Map<String, Value>, key: &str, min: i64, max: i64, slot: &mut i16) {
    if let Some(v) = read_number(section, key) {
        if (min..=max).contains(&v) {
            *slot = v as i16;
        } else {
            warn!("{key} {v} outside {min}-{max}, keeping {slot}");
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient document readers
// ---------------------------------------------------------------------------

/// Look up a device section in the root document.
pub fn section<'a>(doc: &'a Value, name: &str) -> Option<&'a Map<String, Value>> {
    doc.get(name).and_then(Value::as_object)
}

/// Read a boolean flag.  Accepts JSON booleans or strings; `"true"` in any
/// case is true and any other non-empty string is false.  Missing keys and
/// empty strings yield `None` so the caller keeps its previous value.
pub fn read_flag(section: &Map<String, Value>, key: &str) -> Option<bool> {
    match section.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) if !s.is_empty() => Some(s.eq_ignore_ascii_case("true")),
        _ => None,
    }
}

/// Read an integer; floats are truncated toward zero.
pub fn read_number(section: &Map<String, Value>, key: &str) -> Option<i64> {
    match section.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

/// Read a string value.
pub fn read_str<'a>(section: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    section.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert_eq!(c.sample_interval_ms, 100);
        assert_eq!(c.commit_interval_ms, 100);
        assert_eq!(c.status_blink_period_ms, 1000);
        assert_eq!(c.weather_link_timeout_secs, 30);
        assert_eq!(c.dome.shutter_timeout_secs, 60);
        assert_eq!(c.safety.rain_delay_secs, 2);
        assert_eq!(c.safety.power_off_delay_secs, 0);
        assert_eq!(c.safety.weather_delay_secs, 10);
    }

    #[test]
    fn dome_timeout_out_of_range_falls_back_to_default() {
        let mut d = DomeConfig { use_limit_switches: true, shutter_timeout_secs: 20 };
        d.apply_section(&obj(json!({ "Shutter_timeout": 0 })));
        assert_eq!(d.shutter_timeout_secs, 60);
        d.apply_section(&obj(json!({ "Shutter_timeout": 301 })));
        assert_eq!(d.shutter_timeout_secs, 60);
        d.apply_section(&obj(json!({ "Shutter_timeout": 300 })));
        assert_eq!(d.shutter_timeout_secs, 300);
    }

    #[test]
    fn dome_missing_keys_keep_previous() {
        let mut d = DomeConfig { use_limit_switches: true, shutter_timeout_secs: 45 };
        d.apply_section(&Map::new());
        assert!(d.use_limit_switches);
        assert_eq!(d.shutter_timeout_secs, 45);
    }

    #[test]
    fn flags_accept_strings_and_bools() {
        let s = obj(json!({ "a": "TRUE", "b": "yes", "c": "", "d": false, "e": 1 }));
        assert_eq!(read_flag(&s, "a"), Some(true));
        assert_eq!(read_flag(&s, "b"), Some(false));
        assert_eq!(read_flag(&s, "c"), None);
        assert_eq!(read_flag(&s, "d"), Some(false));
        assert_eq!(read_flag(&s, "e"), None);
        assert_eq!(read_flag(&s, "missing"), None);
    }

    #[test]
    fn numbers_truncate_floats() {
        let s = obj(json!({ "x": 12.9, "y": -3, "z": "7" }));
        assert_eq!(read_number(&s, "x"), Some(12));
        assert_eq!(read_number(&s, "y"), Some(-3));
        assert_eq!(read_number(&s, "z"), None);
    }

    #[test]
    fn safety_delays_default_when_invalid() {
        let mut s = SafetyConfig::default();
        s.apply_section(&obj(json!({
            "Rain_delay": 1,
            "Power_off_delay": 601,
            "Weather_delay": -1,
        })));
        assert_eq!(s.rain_delay_secs, 2);
        assert_eq!(s.power_off_delay_secs, 0);
        assert_eq!(s.weather_delay_secs, 10);
    }

    #[test]
    fn safety_limits_retain_previous_when_invalid() {
        let mut s = SafetyConfig { sky_temp_limit_c: -10, wind_limit_kmh: 30, ..Default::default() };
        s.apply_section(&obj(json!({ "Sky_temp_limit": -51, "Wind_limit": 101 })));
        assert_eq!(s.sky_temp_limit_c, -10);
        assert_eq!(s.wind_limit_kmh, 30);

        s.apply_section(&obj(json!({ "Sky_temp_limit": -20, "Wind_limit": 40, "Humidity": 80 })));
        assert_eq!(s.sky_temp_limit_c, -20);
        assert_eq!(s.wind_limit_kmh, 40);
        assert_eq!(s.humidity_limit, 80);
    }

    #[test]
    fn safety_empty_flag_keeps_previous() {
        let mut s = SafetyConfig { use_wind: true, ..Default::default() };
        s.apply_section(&obj(json!({ "Use_wind": "", "Use_sky_temp": "true" })));
        assert!(s.use_wind);
        assert!(s.use_sky_temp);
    }

    #[test]
    fn serde_uses_document_key_names() {
        let v = serde_json::to_value(DomeConfig::default()).unwrap();
        assert_eq!(v["Use_limit_switches"], json!(false));
        assert_eq!(v["Shutter_timeout"], json!(60));

        let v = serde_json::to_value(SafetyConfig::default()).unwrap();
        assert_eq!(v["Power_off_delay"], json!(0));
        assert_eq!(v["Ambient_light"], json!(0));
    }

    #[test]
    fn written_section_reads_back() {
        let saved = SafetyConfig {
            use_sky_temp: true,
            sky_temp_limit_c: -15,
            weather_delay_secs: 30,
            ..Default::default()
        };
        let v = serde_json::to_value(saved).unwrap();
        let mut restored = SafetyConfig::default();
        restored.apply_section(v.as_object().unwrap());
        assert_eq!(restored, saved);
    }
}

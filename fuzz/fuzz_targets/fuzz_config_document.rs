//! Fuzz target: `Controller::read_config`
//!
//! Parses arbitrary bytes as a JSON document and merges it into a fresh
//! controller.  Whatever the document holds, every setting must land
//! inside its valid range.
//!
//! cargo fuzz run fuzz_config_document

#![no_main]

use libfuzzer_sys::fuzz_target;
use tsboard::app::service::Controller;
use tsboard::config::SystemConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let mut ctl = Controller::new(SystemConfig::default());
    ctl.read_config(&doc);

    let cfg = ctl.system_config();
    assert!((1..=300).contains(&cfg.dome.shutter_timeout_secs));
    assert!((2..=60).contains(&cfg.safety.rain_delay_secs));
    assert!(cfg.safety.power_off_delay_secs <= 600);
    assert!(cfg.safety.weather_delay_secs <= 600);
    assert!((-50..=50).contains(&cfg.safety.sky_temp_limit_c));
    assert!((0..=100).contains(&cfg.safety.wind_limit_kmh));

    // The written-back document must be readable again.
    let _ = ctl.config_document();
});

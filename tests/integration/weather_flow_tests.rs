//! Weather station bytes through the control cycle: sample updates, link
//! liveness and the environmental hazards that depend on them.

use serde_json::json;
use tsboard::app::events::AppEvent;
use tsboard::app::ports::DeviceKind;
use tsboard::error::Hazard;
use tsboard::image::bits;

use crate::mock_hw::{MemoryStore, Rig};

const TYPICAL: &[u8] = b"%WS,-175,-120,24,85,1,1270,-1,-1#";

fn frame_with_wind(kmh: i32) -> Vec<u8> {
    format!("%WS,-175,-120,{kmh},85,0,1270,-1,-1#").into_bytes()
}

/// Rig with a client on the safety monitor, so the weather link is live.
fn attended_rig() -> Rig {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    rig.host.attach(DeviceKind::SafetyMonitor);
    rig
}

fn wind_rig() -> Rig {
    let store = MemoryStore::with_doc(json!({
        "SafetyMonitor_Configuration": {
            "Use_wind": true,
            "Wind_limit": 20,
            "Weather_delay": 5
        }
    }));
    let mut rig = Rig::new(store, 0);
    rig.host.attach(DeviceKind::SafetyMonitor);
    rig
}

#[test]
fn frame_updates_sample_and_link_led() {
    let mut rig = attended_rig();
    rig.serial.inject(TYPICAL);
    rig.tick_at(100);

    let w = rig.controller.weather();
    assert_eq!(w.sky_temp, -175);
    assert_eq!(w.wind, 24);
    assert_eq!(w.light, 1270);
    assert!(rig.controller.weather_link().connected);
    assert!(rig.controller.outputs().contains(bits::OUT_WS_OK));
    assert!(rig.sink.contains(&AppEvent::WeatherLink { connected: true }));
}

#[test]
fn frame_split_across_cycles_is_reassembled() {
    let mut rig = attended_rig();
    rig.serial.inject(&TYPICAL[..10]);
    rig.tick_at(100);
    assert!(!rig.controller.weather_link().connected);

    rig.serial.inject(&TYPICAL[10..]);
    rig.tick_at(200);
    assert!(rig.controller.weather_link().connected);
    assert_eq!(rig.controller.weather().humidity, 85);
}

#[test]
fn at_most_one_buffer_of_bytes_per_cycle() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    rig.serial.inject(TYPICAL);
    rig.serial.inject(TYPICAL);
    rig.tick_at(100);
    assert_eq!(rig.serial.pending(), 2 * TYPICAL.len() - 64);
    rig.tick_at(200);
    assert_eq!(rig.serial.pending(), 0);
}

#[test]
fn silent_link_drops_after_timeout() {
    let mut rig = attended_rig();
    rig.serial.inject(TYPICAL);
    rig.tick_at(100);

    rig.run_until(30_000);
    assert!(rig.controller.weather_link().connected);

    rig.run_until(30_100);
    assert!(!rig.controller.weather_link().connected);
    assert!(!rig.controller.outputs().contains(bits::OUT_WS_OK));
    assert!(rig.sink.contains(&AppEvent::WeatherLink { connected: false }));
}

#[test]
fn sustained_wind_trips_and_clears_on_calm_frame() {
    let mut rig = wind_rig();
    rig.serial.inject(&frame_with_wind(25));
    rig.run_until(5_000);
    assert!(rig.controller.is_safe());

    rig.run_until(5_100);
    assert!(!rig.controller.is_safe());
    assert_eq!(rig.controller.hazards(), Hazard::Wind.mask());

    rig.serial.inject(&frame_with_wind(10));
    rig.run_until(5_200);
    assert!(rig.controller.is_safe());
}

#[test]
fn lost_link_clears_wind_hazard() {
    let mut rig = wind_rig();
    rig.serial.inject(&frame_with_wind(30));
    rig.run_until(6_000);
    assert!(!rig.controller.is_safe());

    // No further frames: the link times out and the stale reading no
    // longer counts.
    rig.run_until(30_100);
    assert!(!rig.controller.weather_link().connected);
    assert!(rig.controller.is_safe());
}

#[test]
fn out_of_range_wind_keeps_previous_reading() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    rig.serial.inject(TYPICAL);
    rig.tick_at(100);
    rig.serial.inject(&frame_with_wind(150));
    rig.tick_at(200);
    assert_eq!(rig.controller.weather().wind, 24);
    assert_eq!(rig.controller.weather().rain, 0);
}

#[test]
fn unattended_safety_monitor_holds_link_down() {
    let mut rig = attended_rig();
    rig.serial.inject(TYPICAL);
    rig.tick_at(100);
    assert!(rig.controller.outputs().contains(bits::OUT_WS_OK));

    rig.host.detach(DeviceKind::SafetyMonitor);
    rig.tick_at(200);
    assert!(!rig.controller.weather_link().connected);
    assert!(!rig.controller.outputs().contains(bits::OUT_WS_OK));
    assert!(rig.sink.contains(&AppEvent::WeatherLink { connected: false }));

    // Frames still refresh the sample without reviving the link.
    rig.serial.inject(&frame_with_wind(40));
    rig.tick_at(300);
    assert_eq!(rig.controller.weather().wind, 40);
    assert!(!rig.controller.weather_link().connected);

    // Reattaching waits for a fresh frame.
    rig.host.attach(DeviceKind::SafetyMonitor);
    rig.tick_at(400);
    assert!(!rig.controller.weather_link().connected);
    rig.serial.inject(TYPICAL);
    rig.tick_at(500);
    assert!(rig.controller.weather_link().connected);
}

//! Configuration document flow: load at boot, runtime update, save and
//! reload.

use serde_json::json;
use tsboard::app::commands::AppCommand;
use tsboard::app::events::AppEvent;
use tsboard::app::ports::ConfigError;
use tsboard::config::{SafetyConfig, SHUTTER_TIMEOUT_DEFAULT_SECS};
use tsboard::dome::ShutterState;
use tsboard::error::Error;
use tsboard::switch::Label;

use crate::mock_hw::{MemoryStore, Rig};

fn label(text: &str) -> Label {
    let mut l = Label::new();
    l.push_str(text).unwrap();
    l
}

#[test]
fn stored_sections_are_applied_at_boot() {
    let store = MemoryStore::with_doc(json!({
        "Dome_Configuration": { "Use_limit_switches": "true", "Shutter_timeout": 120 },
        "SafetyMonitor_Configuration": {
            "Rain_delay": 5,
            "Use_wind": true,
            "Wind_limit": 35,
            "Weather_delay": 15
        },
        "Switch_Configuration": { "Ch_3": "Roof sensor" }
    }));
    let rig = Rig::new(store, 0);

    let cfg = rig.controller.system_config();
    assert!(cfg.dome.use_limit_switches);
    assert_eq!(cfg.dome.shutter_timeout_secs, 120);
    assert_eq!(cfg.safety.rain_delay_secs, 5);
    assert!(cfg.safety.use_wind);
    assert_eq!(cfg.safety.wind_limit_kmh, 35);
    assert_eq!(cfg.safety.weather_delay_secs, 15);
    assert_eq!(rig.controller.switches().switch(3).unwrap().name.as_str(), "Roof sensor");
}

#[test]
fn invalid_values_fall_back_without_failing() {
    let store = MemoryStore::with_doc(json!({
        "Dome_Configuration": { "Shutter_timeout": 900 },
        "SafetyMonitor_Configuration": { "Rain_delay": 1, "Wind_limit": 250 }
    }));
    let rig = Rig::new(store, 0);

    let cfg = rig.controller.system_config();
    assert_eq!(cfg.dome.shutter_timeout_secs, SHUTTER_TIMEOUT_DEFAULT_SECS);
    assert_eq!(cfg.safety.rain_delay_secs, SafetyConfig::default().rain_delay_secs);
    assert_eq!(cfg.safety.wind_limit_kmh, SafetyConfig::default().wind_limit_kmh);
}

#[test]
fn unreadable_store_boots_with_defaults() {
    let store = MemoryStore {
        fail_with: Some(ConfigError::Corrupted),
        ..MemoryStore::default()
    };
    let rig = Rig::new(store, 0);
    assert_eq!(rig.sink.events, vec![AppEvent::Started(ShutterState::Error)]);
    assert!(!rig.controller.system_config().dome.use_limit_switches);
}

#[test]
fn saved_document_restores_on_next_boot() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    rig.controller
        .handle_command(AppCommand::SetSwitchName { id: 12, name: label("Flat panel") }, 0, &rig.store)
        .unwrap();
    rig.controller
        .handle_command(
            AppCommand::UpdateConfig(json!({
                "Dome_Configuration": { "Use_limit_switches": true, "Shutter_timeout": 45 }
            })),
            0,
            &rig.store,
        )
        .unwrap();
    assert!(rig.controller.is_config_dirty());

    rig.controller
        .handle_command(AppCommand::SaveConfig, 0, &rig.store)
        .unwrap();
    assert!(!rig.controller.is_config_dirty());

    let doc = rig.store.doc.borrow().clone().unwrap();
    assert_eq!(doc["Switch_Configuration"]["Ch_12"], "Flat panel");
    assert_eq!(doc["Dome_Configuration"]["Shutter_timeout"], 45);
    assert!(doc["SafetyMonitor_Configuration"].is_object());

    let reboot = Rig::new(MemoryStore::with_doc(doc), 0);
    assert_eq!(reboot.controller.system_config().dome.shutter_timeout_secs, 45);
    assert_eq!(
        reboot.controller.switches().switch(12).unwrap().name.as_str(),
        "Flat panel"
    );
}

#[test]
fn failed_save_keeps_changes_pending() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    rig.controller.mark_config_dirty();

    let broken = MemoryStore {
        fail_with: Some(ConfigError::IoError),
        ..MemoryStore::default()
    };
    assert_eq!(
        rig.controller.handle_command(AppCommand::SaveConfig, 0, &broken),
        Err(Error::Config(ConfigError::IoError))
    );
    assert!(rig.controller.is_config_dirty());
    assert!(!rig.controller.save_if_dirty(&broken));
    assert!(rig.controller.save_if_dirty(&rig.store));
}

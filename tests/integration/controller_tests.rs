//! Control-cycle tests: sampling cadence, device gating by client count,
//! output assembly and commit.

use serde_json::json;
use tsboard::app::commands::AppCommand;
use tsboard::app::events::AppEvent;
use tsboard::app::ports::DeviceKind;
use tsboard::dome::ShutterState;
use tsboard::error::{CommandError, Error, Hazard};
use tsboard::image::bits;

use crate::mock_hw::{MemoryStore, Rig};

fn limit_mode_store(timeout_secs: u32) -> MemoryStore {
    MemoryStore::with_doc(json!({
        "Dome_Configuration": {
            "Use_limit_switches": true,
            "Shutter_timeout": timeout_secs
        }
    }))
}

// ── Cadence ───────────────────────────────────────────────────

#[test]
fn inputs_are_sampled_at_most_every_100ms() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    assert_eq!(rig.board.samples, 1);

    rig.tick_at(50);
    assert_eq!(rig.board.samples, 1);
    rig.tick_at(100);
    assert_eq!(rig.board.samples, 2);
    rig.tick_at(150);
    assert_eq!(rig.board.samples, 2);
    rig.tick_at(200);
    assert_eq!(rig.board.samples, 3);
}

#[test]
fn input_change_is_not_seen_before_next_sample() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    rig.host.attach(DeviceKind::Switch);
    rig.tick_at(100);

    rig.board.set_inputs(0x0001);
    rig.tick_at(150);
    assert_eq!(rig.controller.switch_value(0), Ok(0.0));
    rig.tick_at(200);
    assert_eq!(rig.controller.switch_value(0), Ok(1.0));
}

#[test]
fn outputs_commit_only_on_change() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    rig.run_until(400);
    assert_eq!(rig.board.commits.len(), 1);
    assert!(rig.board.last_commit().unwrap().contains(bits::OUT_CPU_OK));

    // Heartbeat goes dark for the second half of the period.
    rig.run_until(500);
    assert_eq!(rig.board.commits.len(), 2);
    assert!(!rig.board.last_commit().unwrap().contains(bits::OUT_CPU_OK));
    assert!(rig.sink.contains(&AppEvent::OutputsCommitted(
        rig.board.last_commit().unwrap()
    )));
}

#[test]
fn pwm_is_requested_every_cycle() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    rig.tick_at(10);
    rig.tick_at(20);
    assert_eq!(rig.board.pwm.len(), 2);
}

// ── Dome ──────────────────────────────────────────────────────

#[test]
fn boot_infers_closed_from_close_limit() {
    let rig = Rig::new(limit_mode_store(10), bits::IN_CLOSE_LIMIT);
    assert_eq!(rig.controller.shutter_status(), ShutterState::Closed);
    assert_eq!(rig.sink.events.first(), Some(&AppEvent::Started(ShutterState::Closed)));
}

#[test]
fn boot_in_timeout_mode_is_error() {
    let rig = Rig::new(MemoryStore::new(), bits::IN_CLOSE_LIMIT);
    assert_eq!(rig.controller.shutter_status(), ShutterState::Error);
}

#[test]
fn remote_open_runs_until_open_limit() {
    let mut rig = Rig::new(limit_mode_store(10), bits::IN_CLOSE_LIMIT);
    rig.host.attach(DeviceKind::Dome);

    rig.controller.open_shutter(0).unwrap();
    rig.tick_at(100);
    let out = rig.board.last_commit().unwrap();
    assert!(out.open_relay());
    assert!(!out.close_relay());
    assert!(out.contains(bits::OUT_DOME_CLIENT));
    assert!(rig.controller.is_slewing());

    rig.board.set_inputs(bits::IN_OPEN_LIMIT);
    rig.tick_at(200);
    assert_eq!(rig.controller.shutter_status(), ShutterState::Open);
    assert!(!rig.controller.is_slewing());
    let out = rig.board.last_commit().unwrap();
    assert!(!out.open_relay() && !out.close_relay());

    assert!(rig.sink.contains(&AppEvent::ShutterChanged {
        from: ShutterState::Closed,
        to: ShutterState::Opening
    }));
    assert!(rig.sink.contains(&AppEvent::ShutterChanged {
        from: ShutterState::Opening,
        to: ShutterState::Open
    }));
}

#[test]
fn missing_limit_switch_faults_after_timeout() {
    let mut rig = Rig::new(limit_mode_store(10), bits::IN_CLOSE_LIMIT);
    rig.host.attach(DeviceKind::Dome);
    rig.board.set_inputs(0);

    rig.controller.open_shutter(0).unwrap();
    rig.run_until(10_000);
    assert_eq!(rig.controller.shutter_status(), ShutterState::Opening);

    rig.run_until(10_100);
    assert_eq!(rig.controller.shutter_status(), ShutterState::Error);
    let out = rig.controller.outputs();
    assert!(!out.open_relay() && !out.close_relay());
}

#[test]
fn conflicting_command_is_rejected() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    rig.controller.open_shutter(0).unwrap();
    let r = rig
        .controller
        .handle_command(AppCommand::CloseShutter, 10, &rig.store);
    assert_eq!(r, Err(Error::Command(CommandError::MotionConflict)));
    assert_eq!(rig.controller.shutter_status(), ShutterState::Opening);
}

#[test]
fn abort_stops_motion() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    rig.host.attach(DeviceKind::Dome);
    rig.controller.close_shutter(0).unwrap();
    rig.tick_at(100);
    assert!(rig.controller.outputs().close_relay());

    rig.controller
        .handle_command(AppCommand::AbortSlew, 150, &rig.store)
        .unwrap();
    rig.tick_at(200);
    assert_eq!(rig.controller.shutter_status(), ShutterState::Error);
    assert!(!rig.controller.outputs().close_relay());
}

#[test]
fn manual_buttons_drive_relays_when_unattended() {
    let mut rig = Rig::new(MemoryStore::new(), bits::IN_OPEN_BUTTON);
    rig.tick_at(100);
    assert!(rig.controller.outputs().open_relay());
    assert!(!rig.controller.outputs().contains(bits::OUT_DOME_CLIENT));

    // End already reached: interlock holds the relay off.
    rig.board.set_inputs(bits::IN_OPEN_BUTTON | bits::IN_OPEN_LIMIT);
    rig.tick_at(200);
    assert!(!rig.controller.outputs().open_relay());

    // Both buttons: nothing moves.
    rig.board.set_inputs(bits::IN_OPEN_BUTTON | bits::IN_CLOSE_BUTTON);
    rig.tick_at(300);
    let out = rig.controller.outputs();
    assert!(!out.open_relay() && !out.close_relay());
}

#[test]
fn manual_buttons_are_ignored_while_attended() {
    let mut rig = Rig::new(MemoryStore::new(), bits::IN_CLOSE_BUTTON);
    rig.host.attach(DeviceKind::Dome);
    rig.tick_at(100);
    assert!(!rig.controller.outputs().close_relay());
}

// ── Switches ──────────────────────────────────────────────────

#[test]
fn switch_outputs_follow_client_attachment() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    rig.host.attach(DeviceKind::Switch);
    rig.controller.write_switch(8, 1.0).unwrap();
    rig.controller.write_switch(17, 50.0).unwrap();
    rig.tick_at(100);
    assert!(rig.controller.outputs().contains(bits::OUT_0));
    assert!(rig.controller.outputs().contains(bits::OUT_SWITCH_CLIENT));
    assert_eq!(rig.board.last_pwm(), Some([0, 50, 0, 0]));

    rig.host.detach(DeviceKind::Switch);
    rig.tick_at(200);
    assert!(!rig.controller.outputs().contains(bits::OUT_0));
    assert_eq!(rig.controller.switch_value(8), Ok(0.0));
    assert_eq!(rig.board.last_pwm(), Some([0, 0, 0, 0]));
}

#[test]
fn switch_write_errors_surface_through_commands() {
    let mut rig = Rig::new(MemoryStore::new(), 0);
    let store = MemoryStore::new();
    assert_eq!(
        rig.controller
            .handle_command(AppCommand::SetSwitch { id: 3, value: 1.0 }, 0, &store),
        Err(Error::Command(CommandError::ReadOnlySwitch(3)))
    );
    assert_eq!(
        rig.controller
            .handle_command(AppCommand::SetSwitch { id: 25, value: 1.0 }, 0, &store),
        Err(Error::Command(CommandError::InvalidSwitch(25)))
    );
}

// ── Safety ────────────────────────────────────────────────────

#[test]
fn sustained_rain_trips_after_delay_and_clears_at_once() {
    let mut rig = Rig::new(MemoryStore::new(), bits::IN_RAIN);
    rig.host.attach(DeviceKind::SafetyMonitor);

    rig.run_until(2_000);
    assert!(rig.controller.is_safe());

    rig.run_until(2_100);
    assert!(!rig.controller.is_safe());
    assert_eq!(rig.controller.hazards(), Hazard::Rain.mask());
    assert!(rig.sink.contains(&AppEvent::SafetyChanged {
        safe: false,
        hazards: Hazard::Rain.mask()
    }));

    rig.board.set_inputs(0);
    rig.run_until(2_200);
    assert!(rig.controller.is_safe());
    assert!(rig.sink.contains(&AppEvent::SafetyChanged { safe: true, hazards: 0 }));
}

#[test]
fn unattended_safety_monitor_reports_safe() {
    let mut rig = Rig::new(MemoryStore::new(), bits::IN_RAIN);
    rig.host.attach(DeviceKind::SafetyMonitor);
    rig.run_until(3_000);
    assert!(!rig.controller.is_safe());

    rig.host.detach(DeviceKind::SafetyMonitor);
    rig.run_until(3_100);
    assert!(rig.controller.is_safe());
}

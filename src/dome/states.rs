//! Concrete shutter state handlers and table builder.
//!
//! Each state is three plain `fn` pointers, no closures and no heap.
//!
//! ```text
//!  CLOSED/OPEN/ERROR ──open()──▶ OPENING ──[open limit | timer done]──▶ OPEN
//!  CLOSED/OPEN/ERROR ──close()─▶ CLOSING ──[close limit | timer done]─▶ CLOSED
//!
//!  OPENING / CLOSING ──[timer exceeded, limit-switch mode]──▶ ERROR
//!  any state ──abort()──▶ ERROR
//! ```

use super::ShutterState;
use super::StateDescriptor;
use super::context::{DomeContext, Relays};
use log::{error, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Order follows the `ShutterState`
/// discriminants.
pub fn build_state_table() -> [StateDescriptor; ShutterState::COUNT] {
    [
        // Index 0: Open
        StateDescriptor {
            id: ShutterState::Open,
            name: "Open",
            on_enter: Some(open_enter),
            on_exit: None,
            on_update: rest_update,
        },
        // Index 1: Closed
        StateDescriptor {
            id: ShutterState::Closed,
            name: "Closed",
            on_enter: Some(closed_enter),
            on_exit: None,
            on_update: rest_update,
        },
        // Index 2: Opening
        StateDescriptor {
            id: ShutterState::Opening,
            name: "Opening",
            on_enter: Some(opening_enter),
            on_exit: Some(motion_exit),
            on_update: opening_update,
        },
        // Index 3: Closing
        StateDescriptor {
            id: ShutterState::Closing,
            name: "Closing",
            on_enter: Some(closing_enter),
            on_exit: Some(motion_exit),
            on_update: closing_update,
        },
        // Index 4: Error
        StateDescriptor {
            id: ShutterState::Error,
            name: "Error",
            on_enter: Some(error_enter),
            on_exit: None,
            on_update: rest_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Resting states (Open, Closed, Error) leave only on a command
// ═══════════════════════════════════════════════════════════════════════════

fn rest_update(_ctx: &mut DomeContext) -> Option<ShutterState> {
    None
}

fn open_enter(ctx: &mut DomeContext) {
    ctx.stop_motion();
    info!("Dome open");
}

fn closed_enter(ctx: &mut DomeContext) {
    ctx.stop_motion();
    info!("Dome closed");
}

fn error_enter(ctx: &mut DomeContext) {
    ctx.stop_motion();
}

// ═══════════════════════════════════════════════════════════════════════════
//  Moving states
// ═══════════════════════════════════════════════════════════════════════════

fn opening_enter(ctx: &mut DomeContext) {
    ctx.start_motion(Relays::OPEN);
    info!(
        "Dome opening ({}, {} s)",
        mode_name(ctx),
        ctx.config.shutter_timeout_secs
    );
}

fn closing_enter(ctx: &mut DomeContext) {
    ctx.start_motion(Relays::CLOSE);
    info!(
        "Dome closing ({}, {} s)",
        mode_name(ctx),
        ctx.config.shutter_timeout_secs
    );
}

fn motion_exit(ctx: &mut DomeContext) {
    ctx.stop_motion();
}

fn opening_update(ctx: &mut DomeContext) -> Option<ShutterState> {
    let reached = ctx.limits.opened;
    motion_update(ctx, reached, ShutterState::Open)
}

fn closing_update(ctx: &mut DomeContext) -> Option<ShutterState> {
    let reached = ctx.limits.closed;
    motion_update(ctx, reached, ShutterState::Closed)
}

/// Shared completion logic for both directions.
///
/// Limit-switch mode: the timer is a watchdog, exceeding it faults.
/// Timeout mode: the timer is trusted and reaching it completes the move.
fn motion_update(
    ctx: &mut DomeContext,
    target_reached: bool,
    target: ShutterState,
) -> Option<ShutterState> {
    let elapsed = ctx.motion_elapsed_ms();
    let timeout = ctx.config.timeout_ms();

    if ctx.config.use_limit_switches {
        if elapsed > timeout {
            error!(
                "Dome timeout: no end-of-travel after {} ms (limit {} ms)",
                elapsed, timeout
            );
            return Some(ShutterState::Error);
        }
        if target_reached {
            return Some(target);
        }
    } else if elapsed >= timeout {
        return Some(target);
    }

    None
}

fn mode_name(ctx: &DomeContext) -> &'static str {
    if ctx.config.use_limit_switches {
        "limit switches"
    } else {
        "timed"
    }
}

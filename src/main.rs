//! TSBoard Firmware: Main Entry Point
//!
//! Hexagonal architecture around a fixed-rate control cycle.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BoardTransport   LogEventSink   NvsAdapter   MonotonicClock   │
//! │  (IoPort)         (EventSink)    (ConfigPort)                  │
//! │  UartSerial       StandaloneHost                               │
//! │  (SerialPort)     (HostPort)                                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  Dome FSM · Switch bank · Safety monitor · Weather     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::{Result, anyhow};
use esp_idf_hal::delay::{Ets, FreeRtos};
use log::{error, info};

use tsboard::adapters::hardware::BoardTransport;
use tsboard::adapters::host::StandaloneHost;
use tsboard::adapters::log_sink::LogEventSink;
use tsboard::adapters::nvs::NvsAdapter;
use tsboard::adapters::serial::UartSerial;
use tsboard::adapters::time::MonotonicClock;
use tsboard::app::service::Controller;
use tsboard::config::SystemConfig;
use tsboard::drivers::hw_init::{self, LedcChannel, SysInput, SysPin};
use tsboard::drivers::pwm::PwmBank;
use tsboard::drivers::shift_register::{InputShiftRegister, OutputShiftRegister};
use tsboard::pins;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TSBoard v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}", e);
        return Err(anyhow!("peripheral init failed: {e}"));
    }

    // ── 3. Construct adapters ─────────────────────────────────
    let inputs = InputShiftRegister::new(
        SysPin(pins::SR_IN_CE_GPIO),
        SysPin(pins::SR_IN_CP_GPIO),
        SysPin(pins::SR_IN_PL_GPIO),
        SysInput(pins::SR_IN_SDIN_GPIO),
        Ets,
    );
    let outputs = OutputShiftRegister::new(
        SysPin(pins::SR_OUT_OE_GPIO),
        SysPin(pins::SR_OUT_STCP_GPIO),
        SysPin(pins::SR_OUT_MR_GPIO),
        SysPin(pins::SR_OUT_SHCP_GPIO),
        SysPin(pins::SR_OUT_SDOUT_GPIO),
        Ets,
    );
    let pwm = PwmBank::new([
        LedcChannel::new(0),
        LedcChannel::new(1),
        LedcChannel::new(2),
        LedcChannel::new(3),
    ]);
    let mut io = BoardTransport::new(inputs, outputs, pwm);

    let nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let mut serial = UartSerial::new();
    let host = StandaloneHost::new();
    let mut log_sink = LogEventSink::new();
    let clock = MonotonicClock::new();

    // ── 4. Construct controller ───────────────────────────────
    let mut controller = Controller::new(SystemConfig::default());
    controller.begin(clock.now_ms(), &mut io, &nvs, &mut log_sink);

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        let now = clock.now_ms();
        controller.tick(now, &mut io, &host, &mut serial, &mut log_sink);
        controller.save_if_dirty(&nvs);
        FreeRtos::delay_ms(1);
    }
}

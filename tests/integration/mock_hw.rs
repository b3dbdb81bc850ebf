//! Mock hardware adapters for integration tests.
//!
//! Records every transport call so tests can assert on the full commit
//! history without touching real GPIO/PWM registers.

use std::cell::RefCell;

use serde_json::Value;
use tsboard::adapters::host::StandaloneHost;
use tsboard::adapters::serial::SimSerial;
use tsboard::app::events::AppEvent;
use tsboard::app::ports::{ConfigError, ConfigPort, EventSink, IoPort};
use tsboard::app::service::Controller;
use tsboard::config::SystemConfig;
use tsboard::image::{InputImage, OutputImage};

// ── MockBoard ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBoard {
    /// Wire state presented to the next sample.
    pub inputs: InputImage,
    pub samples: usize,
    pub commits: Vec<OutputImage>,
    pub pwm: Vec<[u8; 4]>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_inputs(&mut self, bits: u16) {
        self.inputs = InputImage::from_bits(bits);
    }

    pub fn last_commit(&self) -> Option<OutputImage> {
        self.commits.last().copied()
    }

    pub fn last_pwm(&self) -> Option<[u8; 4]> {
        self.pwm.last().copied()
    }
}

impl IoPort for MockBoard {
    fn sample_inputs(&mut self) -> InputImage {
        self.samples += 1;
        self.inputs
    }

    fn commit_outputs(&mut self, image: OutputImage) {
        self.commits.push(image);
    }

    fn write_pwm(&mut self, duties: &[u8; 4]) {
        self.pwm.push(*duties);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MemoryStore ───────────────────────────────────────────────

/// In-memory [`ConfigPort`] with an optional forced failure.
#[derive(Default)]
pub struct MemoryStore {
    pub doc: RefCell<Option<Value>>,
    pub fail_with: Option<ConfigError>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doc(doc: Value) -> Self {
        Self {
            doc: RefCell::new(Some(doc)),
            fail_with: None,
        }
    }
}

impl ConfigPort for MemoryStore {
    fn load(&self) -> Result<Value, ConfigError> {
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        self.doc.borrow().clone().ok_or(ConfigError::NotFound)
    }

    fn save(&self, doc: &Value) -> Result<(), ConfigError> {
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        *self.doc.borrow_mut() = Some(doc.clone());
        Ok(())
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Controller plus every adapter it needs, with a manual clock.
pub struct Rig {
    pub controller: Controller,
    pub board: MockBoard,
    pub host: StandaloneHost,
    pub serial: SimSerial,
    pub sink: RecordingSink,
    pub store: MemoryStore,
    pub now_ms: u64,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(store: MemoryStore, input_bits: u16) -> Self {
        let mut rig = Self {
            controller: Controller::new(SystemConfig::default()),
            board: MockBoard::new(),
            host: StandaloneHost::new(),
            serial: SimSerial::new(),
            sink: RecordingSink::new(),
            store,
            now_ms: 0,
        };
        rig.board.set_inputs(input_bits);
        rig.controller
            .begin(0, &mut rig.board, &rig.store, &mut rig.sink);
        rig
    }

    pub fn tick(&mut self) {
        self.controller.tick(
            self.now_ms,
            &mut self.board,
            &self.host,
            &mut self.serial,
            &mut self.sink,
        );
    }

    /// Advance the clock in 100 ms steps up to `until_ms`, ticking each step.
    pub fn run_until(&mut self, until_ms: u64) {
        while self.now_ms + 100 <= until_ms {
            self.now_ms += 100;
            self.tick();
        }
    }

    pub fn tick_at(&mut self, at_ms: u64) {
        self.now_ms = at_ms;
        self.tick();
    }
}

//! Logical switch bank.
//!
//! Twenty uniformly addressed slots over three kinds of hardware:
//!
//! | Index | Kind   | Access | Backing                                   |
//! |-------|--------|--------|-------------------------------------------|
//! | 0–7   | Input  | read   | input image bits 0–7                      |
//! | 8–15  | Output | write  | output image, slot `8 + i` drives OUT `i` |
//! | 16–19 | PWM    | write  | PWM channel `i - 16`, duty 0–100 %        |
//!
//! Writes are validated here; realisation happens in the control cycle
//! through [`SwitchBank::output_bits`] and [`SwitchBank::pwm_duties`].

use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::app::ports::{CycleContext, Device, DeviceKind};
use crate::config;
use crate::error::CommandError;
use crate::image::{InputImage, OutputImage};

pub const SWITCH_COUNT: usize = 20;
pub const INPUT_COUNT: usize = 8;
pub const OUTPUT_BASE: usize = 8;
pub const OUTPUT_COUNT: usize = 8;
pub const PWM_BASE: usize = 16;
pub const PWM_COUNT: usize = 4;

/// Capacity of names and descriptions.
pub const LABEL_CAPACITY: usize = 32;

pub type Label = heapless::String<LABEL_CAPACITY>;

/// Physical kind, implied by the slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    Input,
    Output,
    Pwm,
}

impl SwitchKind {
    pub fn of(id: usize) -> Option<Self> {
        match id {
            0..INPUT_COUNT => Some(Self::Input),
            OUTPUT_BASE..PWM_BASE => Some(Self::Output),
            PWM_BASE..SWITCH_COUNT => Some(Self::Pwm),
            _ => None,
        }
    }
}

/// One addressable slot with its client-facing metadata.
#[derive(Debug, Clone)]
pub struct LogicalSwitch {
    pub kind: SwitchKind,
    pub name: Label,
    pub description: Label,
    pub can_write: bool,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl LogicalSwitch {
    fn with_defaults(id: usize, kind: SwitchKind) -> Self {
        let (description, max) = match kind {
            SwitchKind::Input => (label(format_args!("IN {} (R)", id + 1)), 1.0),
            SwitchKind::Output => (label(format_args!("OUT {} (RW)", id - OUTPUT_BASE + 1)), 1.0),
            SwitchKind::Pwm => (label(format_args!("PWM {} (RW)", id - PWM_BASE + 1)), 100.0),
        };
        Self {
            kind,
            name: label(format_args!("Switch_{id}")),
            description,
            can_write: kind != SwitchKind::Input,
            value: 0.0,
            min: 0.0,
            max,
            step: 1.0,
        }
    }

    pub fn is_on(&self) -> bool {
        self.value != 0.0
    }
}

/// Format into a label, truncating at capacity.
fn label(args: core::fmt::Arguments<'_>) -> Label {
    truncate_label(&std::fmt::format(args))
}

fn truncate_label(text: &str) -> Label {
    let mut out = Label::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// The twenty logical switches.
pub struct SwitchBank {
    slots: [LogicalSwitch; SWITCH_COUNT],
}

impl SwitchBank {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|id| {
                // Every index below SWITCH_COUNT has a kind.
                let kind = SwitchKind::of(id).unwrap_or(SwitchKind::Input);
                LogicalSwitch::with_defaults(id, kind)
            }),
        }
    }

    pub fn max_switch(&self) -> usize {
        SWITCH_COUNT
    }

    pub fn switch(&self, id: u32) -> Option<&LogicalSwitch> {
        self.slots.get(id as usize)
    }

    pub fn value(&self, id: u32) -> Result<f64, CommandError> {
        self.switch(id)
            .map(|s| s.value)
            .ok_or(CommandError::InvalidSwitch(id))
    }

    /// Store a client write.
    ///
    /// Input mirrors are read-only.  Output slots store any nonzero value
    /// as on.  PWM slots accept 0–100 and keep the integer part.
    pub fn write_value(&mut self, id: u32, value: f64) -> Result<(), CommandError> {
        let idx = id as usize;
        let kind = SwitchKind::of(idx).ok_or_else(|| {
            warn!("Switch write: invalid switch id {id}");
            CommandError::InvalidSwitch(id)
        })?;

        let stored = match kind {
            SwitchKind::Input => {
                warn!("Switch write: switch {id} is read-only");
                return Err(CommandError::ReadOnlySwitch(id));
            }
            _ if !value.is_finite() => {
                warn!("Switch write: switch {id} value {value} is not finite");
                return Err(CommandError::InvalidValue);
            }
            SwitchKind::Output => {
                if value != 0.0 { 1.0 } else { 0.0 }
            }
            SwitchKind::Pwm => {
                if !(0.0..=100.0).contains(&value) {
                    warn!("Switch write: PWM {id} duty {value} outside 0-100");
                    return Err(CommandError::InvalidValue);
                }
                value.trunc()
            }
        };

        self.slots[idx].value = stored;
        debug!("Switch write: id={id} value={value} stored={stored}");
        Ok(())
    }

    /// Copy input image bits 0–7 into the read-only slots.
    pub fn mirror_inputs(&mut self, inputs: InputImage) {
        for (i, slot) in self.slots[..INPUT_COUNT].iter_mut().enumerate() {
            slot.value = if inputs.input(i) { 1.0 } else { 0.0 };
        }
    }

    /// Generic output bits requested by slots 8–15.
    pub fn output_bits(&self) -> OutputImage {
        self.slots[OUTPUT_BASE..PWM_BASE]
            .iter()
            .enumerate()
            .fold(OutputImage::EMPTY, |img, (i, s)| img.with_output(i, s.is_on()))
    }

    /// Requested duty percentage per PWM channel.
    pub fn pwm_duties(&self) -> [u8; PWM_COUNT] {
        core::array::from_fn(|ch| self.slots[PWM_BASE + ch].value as u8)
    }

    /// Return every slot to its inactive value: outputs off, PWM 0, input
    /// mirrors false.
    pub fn release(&mut self) {
        for slot in &mut self.slots {
            slot.value = 0.0;
        }
    }

    pub fn set_name(&mut self, id: u32, name: &str) -> Result<(), CommandError> {
        let slot = self
            .slots
            .get_mut(id as usize)
            .ok_or(CommandError::InvalidSwitch(id))?;
        slot.name = truncate_label(name);
        Ok(())
    }

    fn config_key(id: usize) -> String {
        format!("Ch_{id}")
    }
}

impl Default for SwitchBank {
    fn default() -> Self {
        Self::new()
    }
}

/// Section name in the persisted document.
pub const CONFIG_SECTION: &str = "Switch_Configuration";

impl Device for SwitchBank {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Switch
    }

    fn read_config(&mut self, doc: &Value) {
        let Some(section) = config::section(doc, CONFIG_SECTION) else {
            warn!("Switch config: no {CONFIG_SECTION} section, keeping default names");
            return;
        };
        let mut renamed = 0;
        for (id, slot) in self.slots.iter_mut().enumerate() {
            if let Some(name) = config::read_str(section, &Self::config_key(id)) {
                slot.name = truncate_label(name);
                renamed += 1;
            }
        }
        info!("Switch config: {renamed} names loaded");
    }

    fn write_config(&self, doc: &mut Map<String, Value>) {
        let section: Map<String, Value> = self
            .slots
            .iter()
            .enumerate()
            .map(|(id, s)| (Self::config_key(id), Value::String(s.name.as_str().into())))
            .collect();
        doc.insert(CONFIG_SECTION.into(), Value::Object(section));
    }

    fn evaluate(&mut self, cycle: &CycleContext) -> OutputImage {
        self.mirror_inputs(cycle.inputs);
        self.output_bits()
    }

    fn evaluate_unattended(&mut self, _cycle: &CycleContext) -> OutputImage {
        self.release();
        OutputImage::EMPTY
    }
}

//! Weather station frame codec.
//!
//! Wire format (ASCII, 9600 8N1):
//! ```text
//! %WS,<sky>,<air>,<wind>,<hum>,<rain>,<light>,<clouds>,<stars>#
//! e.g. %WS,-175,-120,24,85,1,1270,-1,-1#
//! ```
//!
//! The assembler accumulates bytes and yields complete frames.  `%` always
//! restarts the buffer, so a frame torn by line noise resynchronises on the
//! next sync byte.  Field text is parsed permissively: anything that is not
//! a number reads as 0.

use heapless::Vec;

use crate::error::FrameError;

/// Receive buffer size; longer frames are discarded.
pub const FRAME_CAPACITY: usize = 64;

/// Number of data fields after the header.
pub const FIELD_COUNT: usize = 8;

pub const SYNC: u8 = b'%';
pub const TERMINATOR: u8 = b'#';
const SEPARATOR: u8 = b',';
const HEADER: &[u8] = b"%WS,";

/// Streaming `%`…`#` frame assembler.
pub struct FrameAssembler {
    buf: Vec<u8, FRAME_CAPACITY>,
    /// Last push completed a frame; clear before storing the next byte.
    complete: bool,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            complete: false,
        }
    }

    /// Feed one byte.
    ///
    /// Returns `Ok(Some(frame))` when the terminator closes a frame that
    /// began with the sync byte.  The slice is valid until the next call.
    /// A terminator without sync, or a frame longer than the buffer, is
    /// discarded with an error and the buffer restarts.
    pub fn push(&mut self, byte: u8) -> Result<Option<&[u8]>, FrameError> {
        if self.complete || byte == SYNC {
            self.reset();
        }

        if self.buf.push(byte).is_err() {
            self.reset();
            return Err(FrameError::Overflow);
        }

        if byte != TERMINATOR {
            return Ok(None);
        }

        if self.buf.first() == Some(&SYNC) {
            self.complete = true;
            Ok(Some(self.buf.as_slice()))
        } else {
            self.reset();
            Err(FrameError::MissingSync)
        }
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.complete = false;
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a complete frame into its eight numeric fields.
///
/// Fields end at `,` or `#`; text after the terminator is ignored.
pub fn parse_frame(frame: &[u8]) -> Result<[i32; FIELD_COUNT], FrameError> {
    let body = frame.strip_prefix(HEADER).ok_or(FrameError::BadHeader)?;

    let mut fields = [0i32; FIELD_COUNT];
    let mut count = 0;
    let mut start = 0;

    for (i, &b) in body.iter().enumerate() {
        if b == SEPARATOR || b == TERMINATOR {
            if let Some(slot) = fields.get_mut(count) {
                *slot = parse_int(&body[start..i]);
            }
            count += 1;
            start = i + 1;
            if b == TERMINATOR {
                break;
            }
        }
    }

    if count == FIELD_COUNT {
        Ok(fields)
    } else {
        Err(FrameError::FieldCount(count))
    }
}

/// `atoi`-style integer parse: optional leading blanks and sign, then
/// digits up to the first non-digit.  No digits reads as 0; values beyond
/// `i32` saturate.
pub fn parse_int(text: &[u8]) -> i32 {
    let mut rest = text;
    while let [b' ' | b'\t', tail @ ..] = rest {
        rest = tail;
    }

    let negative = match rest {
        [b'-', tail @ ..] => {
            rest = tail;
            true
        }
        [b'+', tail @ ..] => {
            rest = tail;
            false
        }
        _ => false,
    };

    let mut value: i64 = 0;
    for &b in rest.iter().take_while(|b| b.is_ascii_digit()) {
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    if negative {
        value = -value;
    }
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

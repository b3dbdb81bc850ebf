//! Fuzz target: `FrameAssembler::push` + `parse_frame`
//!
//! Drives arbitrary byte sequences through the weather station framer and
//! asserts that it never panics, never yields a frame longer than its
//! buffer, and that every yielded frame starts with the sync byte.
//!
//! cargo fuzz run fuzz_weather_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use tsboard::weather::codec::{FRAME_CAPACITY, FrameAssembler, SYNC, TERMINATOR, parse_frame};

fuzz_target!(|data: &[u8]| {
    let mut asm = FrameAssembler::new();

    for &b in data {
        if let Ok(Some(frame)) = asm.push(b) {
            assert!(frame.len() <= FRAME_CAPACITY, "frame exceeds buffer");
            assert_eq!(frame.first(), Some(&SYNC));
            assert_eq!(frame.last(), Some(&TERMINATOR));
            let _ = parse_frame(frame);
        }
    }

    // Raw input straight into the parser must not panic either.
    let _ = parse_frame(data);
});

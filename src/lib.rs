//! TSBoard enclosure controller library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod dome;
pub mod error;
pub mod image;
pub mod safety;
pub mod switch;
pub mod weather;

pub mod pins;

// The ESP-IDF-only parts of these are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;

// src/encode/mod.rs

//! Embedded coefficient coding.

pub mod spiht;

pub use spiht::*;

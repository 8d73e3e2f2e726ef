// src/encode/spiht/mod.rs

//! SPIHT (Set Partitioning In Hierarchical Trees) coding.
//!
//! The engine walks wavelet coefficient trees bit plane by bit plane and
//! produces an embedded bitstream: any prefix of it decodes to a valid,
//! coarser reconstruction, and the full stream is lossless up to the
//! last bit plane.

pub mod codec;
pub mod coder;
pub mod engine;
pub mod geometry;
pub mod lists;
pub mod rate;
pub mod settings;
pub mod topology;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use codec::{Codec, ColorSpihtCodec, DegradedSpihtCodec, PlanarCodec, SpihtCodec};
pub use engine::Engine;
pub use geometry::BandGeometry;
pub use lists::{Lists, Pixel, SetEntry, SetKind};
pub use settings::{CodecSettings, ReportSettings};
pub use topology::{DegradedTree, Joint, Offspring, PlaneLocal, Topology};

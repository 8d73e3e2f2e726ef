//! Progressive, embedded coding of wavelet coefficient planes.
//!
//! This crate implements SPIHT (Set Partitioning In Hierarchical Trees) over
//! three coefficient planes (Y, Cb, Cr). The produced bitstreams can be cut
//! at any bit count and still decode to a valid reconstruction; read in full
//! they are lossless for integer coefficients.
//!
//! # Quick Start
//!
//! ```ignore
//! use spiht_codec::{Codec, CodecSettings, CoeffImage, SpihtCodec};
//!
//! // coefficients produced by a wavelet transform with 3 levels
//! let image: CoeffImage = forward_transform(&pixels);
//!
//! // 0.5 bits per sample, counted over Y, Cb and Cr
//! let settings = CodecSettings::new()
//!     .with_levels(3)
//!     .with_bpp(0.5, image.width(), image.height());
//! let mut codec = SpihtCodec::new(settings);
//! codec.encode(&image)?;
//! codec.save("picture.spiht".as_ref())?;
//!
//! let mut decoded = CoeffImage::default();
//! codec.decode(&mut decoded, 0)?;
//! ```
//!
//! # Codecs
//!
//! - [`SpihtCodec`]: one tree per plane, three streams
//! - [`DegradedSpihtCodec`]: the plane-local layout stored under its own
//!   format version
//! - [`ColorSpihtCodec`]: one tree spanning all planes, a single stream
//!
//! The wavelet transform itself, colour conversion and image file I/O are
//! left to the caller.

// Core modules
pub mod container;
pub mod encode;
pub mod image;
pub mod utils;

// Codec API
pub use encode::spiht::{
    BandGeometry, Codec, CodecSettings, ColorSpihtCodec, DegradedSpihtCodec, Engine, Lists,
    PlanarCodec, ReportSettings, SpihtCodec,
};

// Data types
pub use container::{BitStream, Container, UNBOUNDED};
pub use image::{CoeffImage, CoefficientPlanes, Plane};
pub use utils::progress::StepReport;

// Error types
pub use utils::error::{Result, SpihtError};

/// Crate version, logged in the codec encode and decode banners.
pub const SPIHT_VERSION: &str = "0.3.0";

// src/utils/error.rs

use crate::image::Plane;
use thiserror::Error;

/// The primary error type for all operations in the SPIHT codec library.
#[derive(Error, Debug)]
pub enum SpihtError {
    /// An I/O error occurred after a file or writer was successfully opened.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A plane identifier outside of {0, 1, 2} was supplied.
    #[error("Invalid plane id {0}, expected 0 (Y), 1 (Cb) or 2 (Cr)")]
    InvalidPlaneId(u8),

    /// The lowest-frequency band is odd, smaller than 2 pixels, or does not
    /// tile the image for the requested decomposition depth.
    #[error("Decomposition level {levels} does not fit image {axis} {size} (low band {band})")]
    InvalidBandSize {
        axis: &'static str,
        size: u32,
        band: u32,
        levels: u32,
    },

    /// Stored bitstream data disagrees with the reader (word width, level,
    /// stream count, truncated word array).
    #[error("Malformed bitstream: {0}")]
    MalformedBitstream(String),

    /// The container's version or stream count does not belong to the codec
    /// reading it.
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    /// Planes were encoded out of the Y, Cb, Cr order.
    #[error("Plane {actual} encoded out of order, expected {expected}")]
    OutOfOrderUse { expected: Plane, actual: Plane },

    /// An invalid argument was provided to a function.
    #[error("Invalid argument: {0}")]
    InvalidArg(String),
}

/// A specialized `Result` type for SPIHT operations.
pub type Result<T> = std::result::Result<T, SpihtError>;

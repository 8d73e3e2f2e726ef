// src/encode/spiht/geometry.rs

//! Image and low-band dimensions for one coding tree.

use crate::utils::error::{Result, SpihtError};

/// Plane dimensions together with the size of the lowest-frequency band
/// after `levels` decomposition steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandGeometry {
    pub width: u32,
    pub height: u32,
    pub band_w: u32,
    pub band_h: u32,
    pub levels: u32,
}

impl BandGeometry {
    /// Halves the image dimensions `levels` times.
    ///
    /// The resulting band must be even, at least 2 pixels on each axis and
    /// tile the image exactly (`band << levels == size`).
    pub fn new(width: u32, height: u32, levels: u32) -> Result<Self> {
        if levels == 0 {
            return Err(SpihtError::InvalidArg(
                "at least one decomposition level is required".to_string(),
            ));
        }
        let band_w = band_size("width", width, levels)?;
        let band_h = band_size("height", height, levels)?;
        Ok(Self {
            width,
            height,
            band_w,
            band_h,
            levels,
        })
    }

    /// Whether `(x, y)` lies in the lowest-frequency band.
    #[inline]
    pub fn in_low_band(&self, x: u32, y: u32) -> bool {
        x < self.band_w && y < self.band_h
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Number of coefficients in the low band.
    pub fn band_area(&self) -> usize {
        self.band_w as usize * self.band_h as usize
    }
}

fn band_size(axis: &'static str, size: u32, levels: u32) -> Result<u32> {
    let band = size.checked_shr(levels).unwrap_or(0);
    let tiles = band.checked_shl(levels).is_some_and(|full| full == size);
    if band < 2 || band % 2 != 0 || !tiles {
        return Err(SpihtError::InvalidBandSize {
            axis,
            size,
            band,
            levels,
        });
    }
    Ok(band)
}

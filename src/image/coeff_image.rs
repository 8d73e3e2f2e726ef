// src/image/coeff_image.rs

//! Wavelet coefficient storage.
//!
//! The codec never transforms pixels itself: callers hand it planes that
//! already hold the output of a multi-level wavelet decomposition, laid out
//! in the usual Mallat arrangement with the lowest band in the top-left
//! corner. [`CoefficientPlanes`] is the accessor the coding engine consumes;
//! [`CoeffImage`] is the in-memory implementation used by the codecs.

use super::plane::Plane;

/// Read/write access to transform coefficients by `(x, y, plane)`.
pub trait CoefficientPlanes {
    /// Width and height shared by all planes.
    fn dimensions(&self) -> (u32, u32);

    fn get(&self, x: u32, y: u32, plane: Plane) -> f64;

    fn set(&mut self, x: u32, y: u32, plane: Plane, value: f64);

    /// Largest absolute coefficient value of the plane.
    fn max_magnitude(&self, plane: Plane) -> f64;

    /// Whether the `size`×`size` window at `(x, y)` holds a coefficient with
    /// `|c| >= threshold`. Windows reaching past the plane report `false`.
    fn range_has_magnitude_at_least(
        &self,
        x: u32,
        y: u32,
        size: u32,
        plane: Plane,
        threshold: f64,
    ) -> bool;
}

/// Three equally sized planes of `f64` coefficients (Y, Cb, Cr).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoeffImage {
    width: u32,
    height: u32,
    planes: [Vec<f64>; 3],
}

impl CoeffImage {
    /// Creates a zero-filled image.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            planes: [vec![0.0; len], vec![0.0; len], vec![0.0; len]],
        }
    }

    /// Builds an image from row-major planes.
    ///
    /// Returns `None` when a plane does not hold exactly `width * height` values.
    pub fn from_planes(width: u32, height: u32, planes: [Vec<f64>; 3]) -> Option<Self> {
        let len = width as usize * height as usize;
        if planes.iter().any(|p| p.len() != len) {
            return None;
        }
        Some(Self {
            width,
            height,
            planes,
        })
    }

    /// Builds an image whose three planes are all copies of `plane`.
    pub fn from_single_plane(width: u32, height: u32, plane: Vec<f64>) -> Option<Self> {
        Self::from_planes(width, height, [plane.clone(), plane.clone(), plane])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Zeroes the image and resizes it to `width`×`height`.
    pub fn reset(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    /// Row-major coefficients of one plane.
    pub fn plane(&self, plane: Plane) -> &[f64] {
        &self.planes[plane.index()]
    }

    pub fn plane_mut(&mut self, plane: Plane) -> &mut [f64] {
        &mut self.planes[plane.index()]
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    /// Mean of the `w`×`h` window at `(x, y)`.
    pub fn range_mean(&self, x: u32, y: u32, w: u32, h: u32, plane: Plane) -> f64 {
        let total = w as usize * h as usize;
        if total == 0 {
            return 0.0;
        }
        let mut sum = 0.0;
        for j in y..y + h {
            for i in x..x + w {
                sum += self.get(i, j, plane);
            }
        }
        sum / total as f64
    }

    /// Population variance of the `w`×`h` window at `(x, y)`; zero for empty
    /// or out-of-range windows.
    pub fn range_variance(&self, x: u32, y: u32, w: u32, h: u32, plane: Plane) -> f64 {
        let total = w as usize * h as usize;
        if total == 0 || x + w > self.width || y + h > self.height {
            return 0.0;
        }
        let mean = self.range_mean(x, y, w, h, plane);
        let mut variance = 0.0;
        for j in y..y + h {
            for i in x..x + w {
                let d = self.get(i, j, plane) - mean;
                variance += d * d;
            }
        }
        variance / total as f64
    }

    /// Total variance estimate across subbands, up to `depth` detail levels:
    /// `σ²_LL + Σ 4^i (σ²_HL + σ²_LH + σ²_HH)`, starting from the lowest band
    /// of size `band_w`×`band_h`.
    pub fn total_variance(&self, plane: Plane, band_w: u32, band_h: u32, depth: u32) -> f64 {
        if band_w == 0 || band_h == 0 {
            return 0.0;
        }
        let (mut w, mut h) = (band_w, band_h);
        let mut sum = self.range_variance(0, 0, w, h, plane);

        let mut level = 0;
        while w < self.width && h < self.height && level < depth {
            let detail = self.range_variance(w, 0, w, h, plane)
                + self.range_variance(0, h, w, h, plane)
                + self.range_variance(w, h, w, h, plane);
            sum += detail * 4f64.powi(level as i32);
            w *= 2;
            h *= 2;
            level += 1;
        }
        sum
    }
}

impl CoefficientPlanes for CoeffImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn get(&self, x: u32, y: u32, plane: Plane) -> f64 {
        self.planes[plane.index()][self.offset(x, y)]
    }

    #[inline]
    fn set(&mut self, x: u32, y: u32, plane: Plane, value: f64) {
        let offset = self.offset(x, y);
        self.planes[plane.index()][offset] = value;
    }

    fn max_magnitude(&self, plane: Plane) -> f64 {
        self.planes[plane.index()]
            .iter()
            .fold(0.0, |max: f64, c| max.max(c.abs()))
    }

    fn range_has_magnitude_at_least(
        &self,
        x: u32,
        y: u32,
        size: u32,
        plane: Plane,
        threshold: f64,
    ) -> bool {
        if x + size > self.width || y + size > self.height {
            return false;
        }
        let data = &self.planes[plane.index()];
        let stride = self.width as usize;
        (y..y + size).any(|j| {
            let row = j as usize * stride;
            data[row + x as usize..row + (x + size) as usize]
                .iter()
                .any(|c| c.abs() >= threshold)
        })
    }
}

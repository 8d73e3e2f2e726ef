// src/encode/spiht/settings.rs

use crate::container::bit_stream::UNBOUNDED;

/// Diagnostic output switches handed to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSettings {
    /// Log step reports and summaries at `info` instead of `debug`.
    pub extended: bool,
    /// Log wall-clock time of list initialisation and of each step.
    pub timing: bool,
}

/// Configuration shared by all codecs.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecSettings {
    /// Wavelet decomposition depth of the luma plane.
    pub levels: u32,
    /// Extra decomposition levels of the chroma planes (plane-local codecs).
    pub color_shift: u32,
    /// Total bit budget for a whole-image encode.
    pub bits: u32,
    /// Number of detail levels included in the variance estimate.
    pub variance_depth: u32,
    /// Estimate chroma variance on the deeper chroma decomposition.
    pub compute_deep_variance: bool,
    pub bias_cb: f64,
    pub bias_cr: f64,
    pub report: ReportSettings,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            levels: 5,
            color_shift: 0,
            bits: UNBOUNDED,
            variance_depth: 5,
            compute_deep_variance: false,
            bias_cb: 0.5,
            bias_cr: 0.5,
            report: ReportSettings::default(),
        }
    }
}

impl CodecSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_color_shift(mut self, shift: u32) -> Self {
        self.color_shift = shift;
        self
    }

    pub fn with_bits(mut self, bits: u32) -> Self {
        self.bits = bits;
        self
    }

    /// Sets the budget from a bit rate in bits per sample, counted over all
    /// three planes: `ceil(bpp * width * height * 3)`.
    pub fn with_bpp(mut self, bpp: f32, width: u32, height: u32) -> Self {
        let samples = width as f64 * height as f64 * 3.0;
        self.bits = (bpp as f64 * samples).ceil().clamp(0.0, UNBOUNDED as f64) as u32;
        self
    }

    pub fn with_variance_depth(mut self, depth: u32) -> Self {
        self.variance_depth = depth;
        self
    }

    pub fn with_deep_variance(mut self, enabled: bool) -> Self {
        self.compute_deep_variance = enabled;
        self
    }

    pub fn with_bias(mut self, bias_cb: f64, bias_cr: f64) -> Self {
        self.bias_cb = bias_cb;
        self.bias_cr = bias_cr;
        self
    }

    pub fn with_extended_report(mut self, enabled: bool) -> Self {
        self.report.extended = enabled;
        self
    }

    pub fn with_timing(mut self, enabled: bool) -> Self {
        self.report.timing = enabled;
        self
    }

    /// Whether the encode budget is unlimited.
    pub fn is_unbounded(&self) -> bool {
        self.bits == UNBOUNDED
    }
}

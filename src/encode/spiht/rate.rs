// src/encode/spiht/rate.rs

//! Splits a total bit budget across the Y, Cb and Cr streams in proportion
//! to each plane's subband variance.

use super::settings::CodecSettings;
use crate::container::bit_stream::UNBOUNDED;
use crate::image::{CoeffImage, Plane};
use log::{debug, info};

/// Weighted total variance of every plane.
///
/// The low band is taken at `levels` decomposition steps. With
/// `compute_deep_variance` the chroma planes use `levels + color_shift` and
/// include `color_shift` extra detail levels. Chroma values are scaled by
/// `bias_cb` / `bias_cr`.
pub fn plane_variances(image: &CoeffImage, settings: &CodecSettings) -> [f64; 3] {
    Plane::ALL.map(|plane| {
        let (levels, depth) = if plane.is_chroma() && settings.compute_deep_variance {
            (
                settings.levels + settings.color_shift,
                settings.variance_depth + settings.color_shift,
            )
        } else {
            (settings.levels, settings.variance_depth)
        };
        let band_w = image.width().checked_shr(levels).unwrap_or(0);
        let band_h = image.height().checked_shr(levels).unwrap_or(0);
        let variance = image.total_variance(plane, band_w, band_h, depth);
        let bias = match plane {
            Plane::Y => 1.0,
            Plane::Cb => settings.bias_cb,
            Plane::Cr => settings.bias_cr,
        };
        let weighted = bias * variance;
        debug!(
            "Total variance for plane {} at depth {} (biased) is {}",
            plane, depth, weighted
        );
        weighted
    })
}

/// Assigns `ceil(share * bits)` bits to each plane.
///
/// An unbounded budget stays unbounded for every plane. When all variances
/// are zero the budget is split evenly.
pub fn split_budget(variances: [f64; 3], bits: u32) -> [u32; 3] {
    if bits == UNBOUNDED {
        return [UNBOUNDED; 3];
    }
    let sum: f64 = variances.iter().sum();
    let (shares, out) = if sum > 0.0 && sum.is_finite() {
        let shares = variances.map(|v| v / sum);
        let out = shares
            .map(|share| (share * bits as f64).ceil().clamp(0.0, UNBOUNDED as f64) as u32);
        (shares, out)
    } else {
        ([1.0 / 3.0; 3], [bits.div_ceil(3); 3])
    };

    for (plane, (&assigned, share)) in Plane::ALL.iter().zip(out.iter().zip(shares)) {
        info!(
            "For plane {} algorithm assigned {}/{} bits ({:.2}%)",
            plane,
            assigned,
            bits,
            share * 100.0
        );
    }
    out
}

/// Per-stream read limits for a partial decode of `desired` bits.
///
/// Each stream gets `floor(total_p / total * desired)` bits, at least one.
/// A `desired` of zero, or one covering everything stored, yields zeros,
/// which decode every stream in full.
pub fn split_decode_budget(totals: &[u32], desired: u32) -> Vec<u32> {
    let sum: u64 = totals.iter().map(|&t| t as u64).sum();
    if desired == 0 || desired as u64 >= sum {
        return vec![0; totals.len()];
    }
    totals
        .iter()
        .map(|&total| {
            let share = total as f64 / sum as f64 * desired as f64;
            share.floor().max(1.0) as u32
        })
        .collect()
}

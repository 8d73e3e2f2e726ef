// src/utils/progress.rs

//! Per-step progress reporting for the bit-plane coding loop.
//!
//! Every sorting + refinement step produces one [`StepReport`]. The engine
//! logs it and hands it to an optional observer; nothing in the report feeds
//! back into coding decisions.

use std::fmt;
use std::time::Duration;

/// What happened during one sorting + refinement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// 1-based step counter (`n_max - n + 1`).
    pub step: u32,
    /// Bit-plane index `n` of this step; the threshold was `2^n`.
    pub bit_plane: i32,
    /// Bits exchanged during the sorting pass.
    pub sorting_bits: u32,
    /// Bits exchanged during the refinement pass.
    pub refinement_bits: u32,
    pub lis: usize,
    pub lip: usize,
    pub lsp: usize,
    /// The stream ended during (or right after) this step.
    pub finished: bool,
    /// Wall-clock time spent in the two passes.
    pub elapsed: Duration,
}

impl StepReport {
    pub fn total_bits(&self) -> u32 {
        self.sorting_bits + self.refinement_bits
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:2}, bits={:6}sp + {:6}rp ({:7.1}B) | LIS: {:5}, LIP: {:5}, LSP: {:5}",
            if self.finished { 'F' } else { 'S' },
            self.step,
            self.sorting_bits,
            self.refinement_bits,
            self.total_bits() as f64 / 8.0,
            self.lis,
            self.lip,
            self.lsp
        )
    }
}

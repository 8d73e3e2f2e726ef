// src/encode/spiht/lists.rs

//! The three coordinate lists driving the set-partitioning passes.
//!
//! * LIP: pixels still insignificant at the current threshold.
//! * LIS: tree roots whose descendant sets are still insignificant.
//! * LSP: significant pixels, in the order they became significant.

use crate::image::Plane;
use std::fmt;

/// A coefficient coordinate tagged with its plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
    pub plane: Plane,
}

impl Pixel {
    #[inline]
    pub const fn new(x: u32, y: u32, plane: Plane) -> Self {
        Self { x, y, plane }
    }

    /// Same plane, shifted by `(dx, dy)`.
    #[inline]
    pub const fn offset(self, dx: u32, dy: u32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.plane)
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.plane)
    }
}

/// How much of a tree an LIS entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetKind {
    /// All descendants of the root, children included.
    A,
    /// Descendants of the root's children (the children are already listed
    /// elsewhere).
    B,
}

/// One LIS entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetEntry {
    pub root: Pixel,
    pub kind: SetKind,
}

impl SetEntry {
    pub const fn a(root: Pixel) -> Self {
        Self {
            root,
            kind: SetKind::A,
        }
    }

    pub const fn b(root: Pixel) -> Self {
        Self {
            root,
            kind: SetKind::B,
        }
    }
}

/// LIP, LIS and LSP for one coding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lists {
    pub lip: Vec<Pixel>,
    pub lis: Vec<SetEntry>,
    pub lsp: Vec<Pixel>,
}

impl Lists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.lip.clear();
        self.lis.clear();
        self.lsp.clear();
    }

    /// Whether all three lists are empty.
    pub fn is_empty(&self) -> bool {
        self.lip.is_empty() && self.lis.is_empty() && self.lsp.is_empty()
    }
}

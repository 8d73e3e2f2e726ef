// src/encode/spiht/topology.rs

//! Spatial orientation trees.
//!
//! Every variant uses the same quad-tree below the low band: node `(x, y)`
//! has the four children starting at `(2x, 2y)`. In the low band each 2×2
//! group keeps its top-left coefficient as a leaf and maps the other three
//! onto the matching 2×2 block of the HL, LH and HH bands:
//!
//! ```text
//! (x odd,  y even) -> (x - 1 + bw, y)
//! (x even, y odd)  -> (x, y - 1 + bh)
//! (x odd,  y odd)  -> (x - 1 + bw, y - 1 + bh)
//! ```
//!
//! The joint topology additionally turns the top-left luma coefficient of
//! every group into the root of the co-located chroma groups.

use super::geometry::BandGeometry;
use super::lists::{Lists, Pixel, SetEntry, SetKind};
use crate::image::{CoefficientPlanes, Plane};

/// Up to eight direct children of a node, in coding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offspring {
    nodes: [Pixel; 8],
    len: usize,
}

impl Offspring {
    pub const fn empty() -> Self {
        Self {
            nodes: [Pixel::new(0, 0, Plane::Y); 8],
            len: 0,
        }
    }

    /// The 2×2 block at `base`: top-left, top-right, bottom-left, bottom-right.
    pub fn quad(base: Pixel) -> Self {
        let mut out = Self::empty();
        out.push_quad(base);
        out
    }

    fn push_quad(&mut self, base: Pixel) {
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            self.nodes[self.len] = base.offset(dx, dy);
            self.len += 1;
        }
    }

    pub fn as_slice(&self) -> &[Pixel] {
        &self.nodes[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pixel> {
        self.as_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<'a> IntoIterator for &'a Offspring {
    type Item = &'a Pixel;
    type IntoIter = std::slice::Iter<'a, Pixel>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Tree shape used by the coding engine.
///
/// Encoder and decoder both derive their traversal from these hooks, so any
/// implementation is automatically symmetric.
pub trait Topology: Default {
    /// Container version written by codecs using this topology.
    const VERSION: u8;
    /// Number of bitstreams in such a container.
    const STREAM_COUNT: u8;
    /// Short name used in log output.
    const NAME: &'static str;

    /// Fills empty lists with the initial LIP and LIS of the tree coded when
    /// `plane` is requested.
    fn seed(&self, geom: &BandGeometry, plane: Plane, lists: &mut Lists);

    /// Direct children of `node`.
    fn offspring(&self, geom: &BandGeometry, node: Pixel) -> Offspring;

    /// Whether `node` has at least one child inside the image.
    fn has_offspring(&self, geom: &BandGeometry, node: Pixel) -> bool;

    /// Whether the set described by `entry` holds a coefficient with
    /// magnitude `>= threshold`.
    fn is_significant<P: CoefficientPlanes + ?Sized>(
        &self,
        planes: &P,
        geom: &BandGeometry,
        entry: &SetEntry,
        threshold: f64,
    ) -> bool;

    /// Largest magnitude among the coefficients coded by one run.
    fn max_magnitude<P: CoefficientPlanes + ?Sized>(&self, planes: &P, plane: Plane) -> f64;
}

/// Index of the top bit plane for a maximum magnitude, `floor(log2(max))`.
/// Magnitudes below one still get a single pass at threshold 1.
pub fn top_bit_plane(max: f64) -> i32 {
    if max >= 1.0 {
        max.log2().floor() as i32
    } else {
        0
    }
}

/// Top-left corner of the four children of `node`. `None` for the
/// top-left coefficient of a low-band group.
#[inline]
fn quad_base(geom: &BandGeometry, node: Pixel) -> Option<Pixel> {
    if geom.in_low_band(node.x, node.y) {
        let odd_x = node.x & 1 == 1;
        let odd_y = node.y & 1 == 1;
        if !odd_x && !odd_y {
            return None;
        }
        let x = (node.x & !1) + if odd_x { geom.band_w } else { 0 };
        let y = (node.y & !1) + if odd_y { geom.band_h } else { 0 };
        Some(Pixel::new(x, y, node.plane))
    } else {
        Some(Pixel::new(node.x * 2, node.y * 2, node.plane))
    }
}

#[inline]
fn quad_has_offspring(geom: &BandGeometry, node: Pixel) -> bool {
    quad_base(geom, node).is_some_and(|base| geom.contains(base.x, base.y))
}

/// Descendant search below `root` in its own plane.
///
/// Tests the 2×2 child block, then the 4×4 grandchild block and so on until
/// the block leaves the image. With `include_children` unset the first
/// level is skipped.
fn tree_significant<P: CoefficientPlanes + ?Sized>(
    planes: &P,
    geom: &BandGeometry,
    root: Pixel,
    include_children: bool,
    threshold: f64,
) -> bool {
    let Some(base) = quad_base(geom, root) else {
        return false;
    };
    let (mut x, mut y, mut size) = (base.x, base.y, 2);
    let mut test = include_children;
    loop {
        if test && planes.range_has_magnitude_at_least(x, y, size, root.plane, threshold) {
            return true;
        }
        test = true;
        size *= 2;
        x *= 2;
        y *= 2;
        if !geom.contains(x, y) {
            return false;
        }
    }
}

fn seed_low_band(
    geom: &BandGeometry,
    plane: Plane,
    lists: &mut Lists,
    is_root: impl Fn(u32, u32) -> bool,
) {
    lists.lip.reserve(geom.band_area());
    for y in 0..geom.band_h {
        for x in 0..geom.band_w {
            let px = Pixel::new(x, y, plane);
            lists.lip.push(px);
            if is_root(x, y) {
                lists.lis.push(SetEntry::a(px));
            }
        }
    }
}

/// One independent tree per plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaneLocal;

impl Topology for PlaneLocal {
    const VERSION: u8 = 0xB0;
    const STREAM_COUNT: u8 = 3;
    const NAME: &'static str = "BSPIHT";

    fn seed(&self, geom: &BandGeometry, plane: Plane, lists: &mut Lists) {
        seed_low_band(geom, plane, lists, |x, y| x % 2 == 1 || y % 2 == 1);
    }

    fn offspring(&self, geom: &BandGeometry, node: Pixel) -> Offspring {
        quad_base(geom, node).map_or_else(Offspring::empty, Offspring::quad)
    }

    fn has_offspring(&self, geom: &BandGeometry, node: Pixel) -> bool {
        quad_has_offspring(geom, node)
    }

    fn is_significant<P: CoefficientPlanes + ?Sized>(
        &self,
        planes: &P,
        geom: &BandGeometry,
        entry: &SetEntry,
        threshold: f64,
    ) -> bool {
        tree_significant(planes, geom, entry.root, entry.kind == SetKind::A, threshold)
    }

    fn max_magnitude<P: CoefficientPlanes + ?Sized>(&self, planes: &P, plane: Plane) -> f64 {
        planes.max_magnitude(plane)
    }
}

/// Plane-local trees stored under their own container version.
///
/// Partitioning is identical to [`PlaneLocal`]; only the version byte
/// differs, so streams of the two codecs are not interchangeable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DegradedTree;

impl Topology for DegradedTree {
    const VERSION: u8 = 0xB1;
    const STREAM_COUNT: u8 = 3;
    const NAME: &'static str = "DSPIHT";

    fn seed(&self, geom: &BandGeometry, plane: Plane, lists: &mut Lists) {
        PlaneLocal.seed(geom, plane, lists);
    }

    fn offspring(&self, geom: &BandGeometry, node: Pixel) -> Offspring {
        PlaneLocal.offspring(geom, node)
    }

    fn has_offspring(&self, geom: &BandGeometry, node: Pixel) -> bool {
        PlaneLocal.has_offspring(geom, node)
    }

    fn is_significant<P: CoefficientPlanes + ?Sized>(
        &self,
        planes: &P,
        geom: &BandGeometry,
        entry: &SetEntry,
        threshold: f64,
    ) -> bool {
        PlaneLocal.is_significant(planes, geom, entry, threshold)
    }

    fn max_magnitude<P: CoefficientPlanes + ?Sized>(&self, planes: &P, plane: Plane) -> f64 {
        PlaneLocal.max_magnitude(planes, plane)
    }
}

/// A single tree spanning Y, Cb and Cr.
///
/// The top-left luma coefficient of each low-band group owns eight children:
/// the co-located 2×2 groups of Cb and then Cr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Joint;

impl Joint {
    #[inline]
    fn is_color_root(geom: &BandGeometry, node: Pixel) -> bool {
        node.plane == Plane::Y
            && geom.in_low_band(node.x, node.y)
            && node.x % 2 == 0
            && node.y % 2 == 0
    }
}

impl Topology for Joint {
    const VERSION: u8 = 0xA0;
    const STREAM_COUNT: u8 = 1;
    const NAME: &'static str = "CSPIHT";

    /// Seeds the whole luma low band; `plane` is ignored.
    fn seed(&self, geom: &BandGeometry, _plane: Plane, lists: &mut Lists) {
        seed_low_band(geom, Plane::Y, lists, |_, _| true);
    }

    fn offspring(&self, geom: &BandGeometry, node: Pixel) -> Offspring {
        if Self::is_color_root(geom, node) {
            let mut out = Offspring::empty();
            out.push_quad(Pixel::new(node.x, node.y, Plane::Cb));
            out.push_quad(Pixel::new(node.x, node.y, Plane::Cr));
            return out;
        }
        PlaneLocal.offspring(geom, node)
    }

    fn has_offspring(&self, geom: &BandGeometry, node: Pixel) -> bool {
        Self::is_color_root(geom, node) || quad_has_offspring(geom, node)
    }

    fn is_significant<P: CoefficientPlanes + ?Sized>(
        &self,
        planes: &P,
        geom: &BandGeometry,
        entry: &SetEntry,
        threshold: f64,
    ) -> bool {
        let root = entry.root;
        if !Self::is_color_root(geom, root) {
            return tree_significant(planes, geom, root, entry.kind == SetKind::A, threshold);
        }

        if entry.kind == SetKind::A
            && (planes.range_has_magnitude_at_least(root.x, root.y, 2, Plane::Cb, threshold)
                || planes.range_has_magnitude_at_least(root.x, root.y, 2, Plane::Cr, threshold))
        {
            return true;
        }
        // the chroma top-left coefficients are leaves; search below the other three
        [Plane::Cb, Plane::Cr].into_iter().any(|plane| {
            [(1, 0), (0, 1), (1, 1)].into_iter().any(|(dx, dy)| {
                let child = Pixel::new(root.x + dx, root.y + dy, plane);
                tree_significant(planes, geom, child, true, threshold)
            })
        })
    }

    fn max_magnitude<P: CoefficientPlanes + ?Sized>(&self, planes: &P, _plane: Plane) -> f64 {
        Plane::ALL
            .into_iter()
            .map(|p| planes.max_magnitude(p))
            .fold(0.0, f64::max)
    }
}

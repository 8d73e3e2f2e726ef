//! Coefficient images and plane identifiers.

pub mod coeff_image;
pub mod plane;

pub use coeff_image::{CoeffImage, CoefficientPlanes};
pub use plane::Plane;

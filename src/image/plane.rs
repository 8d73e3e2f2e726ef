// src/image/plane.rs

use crate::utils::error::SpihtError;
use std::fmt;

/// One of the three colour planes of a YCbCr coefficient image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Plane {
    #[default]
    Y = 0,
    Cb = 1,
    Cr = 2,
}

impl Plane {
    /// All planes in coding order.
    pub const ALL: [Plane; 3] = [Plane::Y, Plane::Cb, Plane::Cr];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The plane coded after this one, `None` after Cr.
    pub fn next(self) -> Option<Plane> {
        match self {
            Plane::Y => Some(Plane::Cb),
            Plane::Cb => Some(Plane::Cr),
            Plane::Cr => None,
        }
    }

    pub fn is_chroma(self) -> bool {
        self != Plane::Y
    }
}

impl TryFrom<u8> for Plane {
    type Error = SpihtError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Plane::Y),
            1 => Ok(Plane::Cb),
            2 => Ok(Plane::Cr),
            _ => Err(SpihtError::InvalidPlaneId(id)),
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Plane::Y => "Y",
            Plane::Cb => "Cb",
            Plane::Cr => "Cr",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_ids() {
        assert_eq!(Plane::try_from(0).unwrap(), Plane::Y);
        assert_eq!(Plane::try_from(2).unwrap(), Plane::Cr);
        assert!(matches!(
            Plane::try_from(3),
            Err(SpihtError::InvalidPlaneId(3))
        ));
    }

    #[test]
    fn test_plane_order() {
        assert_eq!(Plane::Y.next(), Some(Plane::Cb));
        assert_eq!(Plane::Cb.next(), Some(Plane::Cr));
        assert_eq!(Plane::Cr.next(), None);
    }
}

use nalgebra::Matrix3;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("Box dimensions must be 2 or 3, got {0}")]
pub struct InvalidDimensions(pub u8);

/// Number of spatial dimensions a simulation box spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "u8")]
pub enum Dimensions {
    Two,
    #[default]
    Three,
}

impl Dimensions {
    pub fn get(self) -> u8 {
        match self {
            Dimensions::Two => 2,
            Dimensions::Three => 3,
        }
    }
}

impl TryFrom<u8> for Dimensions {
    type Error = InvalidDimensions;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Dimensions::Two),
            3 => Ok(Dimensions::Three),
            other => Err(InvalidDimensions(other)),
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// A triclinic periodic simulation cell.
///
/// The box is described by its edge lengths `(lx, ly, lz)` and the tilt
/// factors `(xy, xz, yz)`, following the HOOMD-blue convention. For
/// two-dimensional boxes the cross tilts `xz` and `yz` are always zero, while
/// `lz` carries whatever value the source stored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimBox {
    pub lx: f64,
    pub ly: f64,
    pub lz: f64,
    #[serde(default)]
    pub xy: f64,
    #[serde(default)]
    pub xz: f64,
    #[serde(default)]
    pub yz: f64,
    #[serde(default)]
    pub dimensions: Dimensions,
}

impl SimBox {
    /// Creates a box from edge lengths and tilt factors.
    ///
    /// For [`Dimensions::Two`] the `xz` and `yz` tilts are discarded.
    pub fn new(lx: f64, ly: f64, lz: f64, xy: f64, xz: f64, yz: f64, dimensions: Dimensions) -> Self {
        let (xz, yz) = match dimensions {
            Dimensions::Two => (0.0, 0.0),
            Dimensions::Three => (xz, yz),
        };
        Self {
            lx,
            ly,
            lz,
            xy,
            xz,
            yz,
            dimensions,
        }
    }

    /// Creates an orthorhombic three-dimensional box.
    pub fn orthorhombic(lx: f64, ly: f64, lz: f64) -> Self {
        Self::new(lx, ly, lz, 0.0, 0.0, 0.0, Dimensions::Three)
    }

    /// Returns the box matrix whose columns are the three box vectors.
    ///
    /// The matrix is upper triangular and its diagonal is `(lx, ly, lz)`.
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.lx,
            self.xy * self.ly,
            self.xz * self.lz,
            0.0,
            self.ly,
            self.yz * self.lz,
            0.0,
            0.0,
            self.lz,
        )
    }

    /// Returns the box parameters as `[lx, ly, lz, xy, xz, yz]`.
    pub fn params(&self) -> [f64; 6] {
        [self.lx, self.ly, self.lz, self.xy, self.xz, self.yz]
    }

    /// Volume of the cell, or its area for two-dimensional boxes.
    pub fn volume(&self) -> f64 {
        match self.dimensions {
            Dimensions::Two => self.lx * self.ly,
            Dimensions::Three => self.lx * self.ly * self.lz,
        }
    }

    pub fn is_orthorhombic(&self) -> bool {
        self.xy == 0.0 && self.xz == 0.0 && self.yz == 0.0
    }
}

impl fmt::Display for SimBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Box(Lx={}, Ly={}, Lz={}, xy={}, xz={}, yz={}, dimensions={})",
            self.lx, self.ly, self.lz, self.xy, self.xz, self.yz, self.dimensions
        )
    }
}

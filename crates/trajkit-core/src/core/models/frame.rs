use super::simbox::SimBox;
use nalgebra::{Point3, Quaternion, Vector3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Names of the per-frame attributes a trajectory reader can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Position,
    Box,
    Types,
    Orientation,
    Velocity,
    Mass,
    Charge,
    Diameter,
    MomentInertia,
    AngMom,
    Image,
}

impl Attribute {
    pub const ALL: [Attribute; 11] = [
        Attribute::Position,
        Attribute::Box,
        Attribute::Types,
        Attribute::Orientation,
        Attribute::Velocity,
        Attribute::Mass,
        Attribute::Charge,
        Attribute::Diameter,
        Attribute::MomentInertia,
        Attribute::AngMom,
        Attribute::Image,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Position => "position",
            Attribute::Box => "box",
            Attribute::Types => "types",
            Attribute::Orientation => "orientation",
            Attribute::Velocity => "velocity",
            Attribute::Mass => "mass",
            Attribute::Charge => "charge",
            Attribute::Diameter => "diameter",
            Attribute::MomentInertia => "moment_inertia",
            Attribute::AngMom => "angmom",
            Attribute::Image => "image",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|attribute| attribute.name() == s)
            .ok_or_else(|| FrameError::UnknownAttribute(s.to_string()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Attribute '{0}' is not available for this frame")]
    MissingAttribute(Attribute),

    #[error("Attribute '{attribute}' has {found} entries, expected {expected}")]
    ShapeMismatch {
        attribute: Attribute,
        expected: usize,
        found: usize,
    },

    #[error("Unknown attribute name: '{0}'")]
    UnknownAttribute(String),
}

/// One snapshot of a particle system in the normalized form every reader produces.
///
/// The box and the particle positions are always present. All other
/// attributes are optional: a reader sets only what its source data holds,
/// and asking for an attribute the source did not provide returns
/// [`FrameError::MissingAttribute`] instead of a default value.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    simbox: SimBox,
    positions: Vec<Point3<f32>>,
    types: Option<Vec<String>>,
    orientations: Option<Vec<Quaternion<f32>>>,
    velocities: Option<Vec<Vector3<f32>>>,
    mass: Option<Vec<f32>>,
    charge: Option<Vec<f32>>,
    diameter: Option<Vec<f32>>,
    moment_inertia: Option<Vec<Vector3<f32>>>,
    angmom: Option<Vec<Quaternion<f32>>>,
    image: Option<Vec<Vector3<i32>>>,
}

fn present<T>(data: &Option<Vec<T>>, attribute: Attribute) -> Result<&[T], FrameError> {
    data.as_deref()
        .ok_or(FrameError::MissingAttribute(attribute))
}

impl Frame {
    /// Number of particles in the frame.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn simbox(&self) -> &SimBox {
        &self.simbox
    }

    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    pub fn into_positions(self) -> Vec<Point3<f32>> {
        self.positions
    }

    pub fn types(&self) -> Result<&[String], FrameError> {
        present(&self.types, Attribute::Types)
    }

    /// Particle orientations as quaternions with the scalar part first.
    pub fn orientations(&self) -> Result<&[Quaternion<f32>], FrameError> {
        present(&self.orientations, Attribute::Orientation)
    }

    pub fn velocities(&self) -> Result<&[Vector3<f32>], FrameError> {
        present(&self.velocities, Attribute::Velocity)
    }

    pub fn mass(&self) -> Result<&[f32], FrameError> {
        present(&self.mass, Attribute::Mass)
    }

    pub fn charge(&self) -> Result<&[f32], FrameError> {
        present(&self.charge, Attribute::Charge)
    }

    pub fn diameter(&self) -> Result<&[f32], FrameError> {
        present(&self.diameter, Attribute::Diameter)
    }

    pub fn moment_inertia(&self) -> Result<&[Vector3<f32>], FrameError> {
        present(&self.moment_inertia, Attribute::MomentInertia)
    }

    pub fn angmom(&self) -> Result<&[Quaternion<f32>], FrameError> {
        present(&self.angmom, Attribute::AngMom)
    }

    pub fn image(&self) -> Result<&[Vector3<i32>], FrameError> {
        present(&self.image, Attribute::Image)
    }

    /// Returns `true` if the frame carries the given attribute.
    pub fn has(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::Position | Attribute::Box => true,
            Attribute::Types => self.types.is_some(),
            Attribute::Orientation => self.orientations.is_some(),
            Attribute::Velocity => self.velocities.is_some(),
            Attribute::Mass => self.mass.is_some(),
            Attribute::Charge => self.charge.is_some(),
            Attribute::Diameter => self.diameter.is_some(),
            Attribute::MomentInertia => self.moment_inertia.is_some(),
            Attribute::AngMom => self.angmom.is_some(),
            Attribute::Image => self.image.is_some(),
        }
    }

    /// Lists every attribute present on this frame, in canonical order.
    pub fn attributes(&self) -> Vec<Attribute> {
        Attribute::ALL
            .into_iter()
            .filter(|&attribute| self.has(attribute))
            .collect()
    }
}

/// Assembles a [`Frame`], checking every optional array against the particle count.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    frame: Frame,
}

impl FrameBuilder {
    pub fn new(simbox: SimBox, positions: Vec<Point3<f32>>) -> Self {
        Self {
            frame: Frame {
                simbox,
                positions,
                types: None,
                orientations: None,
                velocities: None,
                mass: None,
                charge: None,
                diameter: None,
                moment_inertia: None,
                angmom: None,
                image: None,
            },
        }
    }

    pub fn types(mut self, types: Vec<String>) -> Self {
        self.frame.types = Some(types);
        self
    }
    pub fn orientations(mut self, orientations: Vec<Quaternion<f32>>) -> Self {
        self.frame.orientations = Some(orientations);
        self
    }
    pub fn velocities(mut self, velocities: Vec<Vector3<f32>>) -> Self {
        self.frame.velocities = Some(velocities);
        self
    }
    pub fn mass(mut self, mass: Vec<f32>) -> Self {
        self.frame.mass = Some(mass);
        self
    }
    pub fn charge(mut self, charge: Vec<f32>) -> Self {
        self.frame.charge = Some(charge);
        self
    }
    pub fn diameter(mut self, diameter: Vec<f32>) -> Self {
        self.frame.diameter = Some(diameter);
        self
    }
    pub fn moment_inertia(mut self, moment_inertia: Vec<Vector3<f32>>) -> Self {
        self.frame.moment_inertia = Some(moment_inertia);
        self
    }
    pub fn angmom(mut self, angmom: Vec<Quaternion<f32>>) -> Self {
        self.frame.angmom = Some(angmom);
        self
    }
    pub fn image(mut self, image: Vec<Vector3<i32>>) -> Self {
        self.frame.image = Some(image);
        self
    }

    /// Validates the arrays and returns the finished frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ShapeMismatch`] if an optional array does not hold
    /// exactly one entry per particle. Values are stored as given, NaN included.
    pub fn build(self) -> Result<Frame, FrameError> {
        let frame = self.frame;
        let n = frame.positions.len();

        check_len(Attribute::Types, &frame.types, n)?;
        check_len(Attribute::Orientation, &frame.orientations, n)?;
        check_len(Attribute::Velocity, &frame.velocities, n)?;
        check_len(Attribute::Mass, &frame.mass, n)?;
        check_len(Attribute::Charge, &frame.charge, n)?;
        check_len(Attribute::Diameter, &frame.diameter, n)?;
        check_len(Attribute::MomentInertia, &frame.moment_inertia, n)?;
        check_len(Attribute::AngMom, &frame.angmom, n)?;
        check_len(Attribute::Image, &frame.image, n)?;

        Ok(frame)
    }
}

fn check_len<T>(attribute: Attribute, data: &Option<Vec<T>>, expected: usize) -> Result<(), FrameError> {
    match data {
        Some(values) if values.len() != expected => Err(FrameError::ShapeMismatch {
            attribute,
            expected,
            found: values.len(),
        }),
        _ => Ok(()),
    }
}

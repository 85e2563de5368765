use super::error::TrajectoryError;
use super::lazy::LazyTrajectory;
use crate::core::models::frame::{Attribute, FrameError};
use crate::core::models::simbox::SimBox;
use nalgebra::{Point3, Quaternion};
use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Seek};
use tracing::debug;

/// Distinct type names and the index of each particle's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTable {
    pub names: Vec<String>,
    pub ids: Vec<u32>,
}

impl TypeTable {
    /// Builds a table whose names are the sorted distinct entries of `types`.
    pub fn from_names(types: &[String]) -> Self {
        let names: Vec<String> = types
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        let lookup: HashMap<&str, u32> = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.as_str(), id as u32))
            .collect();
        let ids = types.iter().map(|name| lookup[name.as_str()]).collect();
        Self { names, ids }
    }
}

/// Every frame of a trajectory decoded into flat per-attribute arrays.
///
/// Positions are stored frame after frame, so the particles of frame `i`
/// occupy `i * num_particles .. (i + 1) * num_particles`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryArrays {
    num_particles: usize,
    boxes: Vec<SimBox>,
    positions: Vec<Point3<f32>>,
    orientations: Option<Vec<Quaternion<f32>>>,
    types: Option<TypeTable>,
}

impl TrajectoryArrays {
    pub fn num_frames(&self) -> usize {
        self.boxes.len()
    }

    pub fn num_particles(&self) -> usize {
        self.num_particles
    }

    pub fn boxes(&self) -> &[SimBox] {
        &self.boxes
    }

    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    /// Positions of frame `frame`, or `None` past the last frame.
    pub fn frame_positions(&self, frame: usize) -> Option<&[Point3<f32>]> {
        let start = frame.checked_mul(self.num_particles)?;
        self.positions.get(start..start + self.num_particles)
    }

    pub fn orientations(&self) -> Result<&[Quaternion<f32>], FrameError> {
        self.orientations
            .as_deref()
            .ok_or(FrameError::MissingAttribute(Attribute::Orientation))
    }

    /// Type table shared by all frames.
    pub fn types(&self) -> Result<&TypeTable, FrameError> {
        self.types
            .as_ref()
            .ok_or(FrameError::MissingAttribute(Attribute::Types))
    }
}

impl<R: Read + Seek> LazyTrajectory<R> {
    /// Decodes every frame of this view into contiguous arrays.
    ///
    /// # Errors
    ///
    /// Fails with the first error any frame produces.
    pub fn load_arrays(&self) -> Result<TrajectoryArrays, TrajectoryError> {
        let num_particles = self.header().num_particles;
        let mut arrays = TrajectoryArrays {
            num_particles,
            boxes: Vec::with_capacity(self.len()),
            positions: Vec::with_capacity(self.len().saturating_mul(num_particles)),
            orientations: None,
            types: None,
        };

        for frame in self {
            let frame = frame?;
            arrays.boxes.push(*frame.simbox());
            if let Ok(orientations) = frame.orientations() {
                arrays
                    .orientations
                    .get_or_insert_with(Vec::new)
                    .extend_from_slice(orientations);
            }
            if arrays.types.is_none() {
                if let Ok(types) = frame.types() {
                    arrays.types = Some(TypeTable::from_names(types));
                }
            }
            arrays.positions.extend(frame.into_positions());
        }

        debug!(
            frames = arrays.num_frames(),
            particles = num_particles,
            "Loaded trajectory into arrays."
        );
        Ok(arrays)
    }
}

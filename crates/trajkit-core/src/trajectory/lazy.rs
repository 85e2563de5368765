use super::config::ReaderConfig;
use super::error::TrajectoryError;
use crate::core::io::dcd::{DecodedFrame, FileHeader, FrameDecoder, FrameIndexEntry, scan};
use crate::core::models::frame::{Frame, FrameBuilder};
use crate::core::models::simbox::Dimensions;
use crate::core::utils::geometry::euler_to_quaternion;
use std::cell::RefCell;
use std::fmt;
use std::io::{Read, Seek};
use std::iter::FusedIterator;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// An arithmetic window `start, start + step, ...` of `len` positions into the shared index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct View {
    start: usize,
    step: isize,
    len: usize,
}

impl View {
    fn full(len: usize) -> Self {
        Self {
            start: 0,
            step: 1,
            len,
        }
    }

    fn position(&self, i: usize) -> usize {
        (self.start as isize + i as isize * self.step) as usize
    }

    fn resolve(&self, index: isize) -> Option<usize> {
        let len = self.len as isize;
        let i = if index < 0 { index + len } else { index };
        (0..len).contains(&i).then_some(i as usize)
    }

    /// Applies Python slice semantics to this view; `None` if `step` is zero.
    fn slice(&self, start: Option<isize>, stop: Option<isize>, step: isize) -> Option<View> {
        if step == 0 {
            return None;
        }
        let len = self.len as isize;
        let clamp = |bound: isize, low: isize, high: isize| {
            let bound = if bound < 0 { bound + len } else { bound };
            bound.clamp(low, high)
        };

        let (first, count) = if step > 0 {
            let first = start.map_or(0, |s| clamp(s, 0, len));
            let stop = stop.map_or(len, |s| clamp(s, 0, len));
            let count = if stop > first { (stop - first + step - 1) / step } else { 0 };
            (first, count)
        } else {
            let first = start.map_or(len - 1, |s| clamp(s, -1, len - 1));
            let stop = stop.map_or(-1, |s| clamp(s, -1, len - 1));
            let count = if first > stop { (first - stop - step - 1) / -step } else { 0 };
            (first, count)
        };

        Some(if count == 0 {
            View {
                start: self.start,
                step: self.step,
                len: 0,
            }
        } else {
            View {
                start: self.position(first as usize),
                step: self.step * step,
                len: count as usize,
            }
        })
    }
}

/// A DCD trajectory whose frames are decoded only when accessed.
///
/// Opening scans the stream once to build the offset index; afterwards each
/// [`get`](Self::get) or iteration step seeks to one frame and decodes just
/// that frame. Decoded frames are handed to the caller and never cached.
///
/// [`slice`](Self::slice) returns another `LazyTrajectory` that shares the
/// stream handle and the offset index with its parent. The stream is
/// released when [`close`](Self::close) is called on any of these views or
/// when the last of them is dropped; after closing, every view reports
/// [`TrajectoryError::Closed`].
///
/// The shared stream makes this type `!Send`. To decode from several threads,
/// open one handle per thread and build each trajectory with
/// [`from_index`](Self::from_index) from the same [`index`](Self::index).
pub struct LazyTrajectory<R> {
    stream: Rc<RefCell<Option<R>>>,
    header: Arc<FileHeader>,
    index: Arc<[FrameIndexEntry]>,
    config: Arc<ReaderConfig>,
    view: View,
}

impl<R: Read + Seek> LazyTrajectory<R> {
    /// Scans `stream` and returns a trajectory over all of its frames.
    ///
    /// # Errors
    ///
    /// Any structural defect found by the scan is returned as
    /// [`TrajectoryError::Dcd`]; no trajectory is produced from a partial index.
    #[instrument(skip_all, name = "trajectory_open")]
    pub fn open(mut stream: R, config: ReaderConfig) -> Result<Self, TrajectoryError> {
        let (header, index) = scan(&mut stream)?;
        let trajectory = Self::from_index(stream, Arc::new(header), index.into(), config)?;
        info!(
            frames = trajectory.len(),
            particles = trajectory.header.num_particles,
            "Indexed DCD trajectory."
        );
        Ok(trajectory)
    }

    /// Builds a trajectory from an existing scan result and a fresh stream handle.
    ///
    /// The stream must hold the same bytes the index was built from.
    pub fn from_index(
        stream: R,
        header: Arc<FileHeader>,
        index: Arc<[FrameIndexEntry]>,
        config: ReaderConfig,
    ) -> Result<Self, TrajectoryError> {
        config.validate()?;
        if let Some(types) = &config.types {
            if types.len() != header.num_particles {
                return Err(TrajectoryError::TypeCount {
                    expected: header.num_particles,
                    found: types.len(),
                });
            }
        }
        if !header.include_unitcell && config.fallback_box.is_none() {
            return Err(TrajectoryError::MissingUnitCell);
        }

        Ok(Self {
            stream: Rc::new(RefCell::new(Some(stream))),
            view: View::full(index.len()),
            header,
            index,
            config: Arc::new(config),
        })
    }
}

impl<R> LazyTrajectory<R> {
    /// Number of frames in this view.
    pub fn len(&self) -> usize {
        self.view.len
    }

    pub fn is_empty(&self) -> bool {
        self.view.len == 0
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// The offset index of the whole file, shared with every view.
    pub fn index(&self) -> Arc<[FrameIndexEntry]> {
        Arc::clone(&self.index)
    }

    /// Index entries of the frames in this view, in view order.
    pub fn entries(&self) -> impl Iterator<Item = FrameIndexEntry> + '_ {
        (0..self.view.len).map(|i| self.index[self.view.position(i)])
    }

    pub fn is_closed(&self) -> bool {
        self.stream.borrow().is_none()
    }

    /// Releases the stream for this trajectory and every view sharing it.
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) {
        if self.stream.borrow_mut().take().is_some() {
            debug!("Closed trajectory stream.");
        }
    }

    fn ensure_open(&self) -> Result<(), TrajectoryError> {
        if self.is_closed() {
            Err(TrajectoryError::Closed)
        } else {
            Ok(())
        }
    }

    /// Returns a view over `start..stop` taking every `step`-th frame.
    ///
    /// Bounds follow Python slicing: negative values count from the end,
    /// out-of-range bounds are clamped, `None` selects the natural end for
    /// the direction of `step`, and a negative `step` walks backwards.
    /// Nothing is decoded.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::InvalidSlice`] if `step` is zero and
    /// [`TrajectoryError::Closed`] if the stream was closed.
    pub fn slice(
        &self,
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    ) -> Result<Self, TrajectoryError> {
        self.ensure_open()?;
        let view = self
            .view
            .slice(start, stop, step)
            .ok_or(TrajectoryError::InvalidSlice)?;
        Ok(Self {
            stream: Rc::clone(&self.stream),
            header: Arc::clone(&self.header),
            index: Arc::clone(&self.index),
            config: Arc::clone(&self.config),
            view,
        })
    }
}

impl<R: Read + Seek> LazyTrajectory<R> {
    /// Decodes frame `index` of this view; negative indices count from the end.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::Closed`] after [`close`](Self::close),
    /// [`TrajectoryError::Index`] if `index` is out of range, and
    /// [`TrajectoryError::Dcd`] if the frame cannot be decoded.
    pub fn get(&self, index: isize) -> Result<Frame, TrajectoryError> {
        self.ensure_open()?;
        let position = self.view.resolve(index).ok_or(TrajectoryError::Index {
            index,
            len: self.view.len,
        })?;
        self.decode_at(position)
    }

    /// Iterates over the frames of this view, decoding each one as it is reached.
    pub fn iter(&self) -> Frames<'_, R> {
        Frames {
            trajectory: self,
            front: 0,
            back: self.view.len,
            failed: false,
        }
    }

    fn decode_at(&self, position: usize) -> Result<Frame, TrajectoryError> {
        let entry = self.index[self.view.position(position)];
        let decoded = {
            let mut guard = self.stream.borrow_mut();
            let stream = guard.as_mut().ok_or(TrajectoryError::Closed)?;
            FrameDecoder::new(&self.header, self.config.dimensions)
                .with_fallback_box(self.config.fallback_box)
                .decode(stream, entry.offset)?
        };
        self.package(decoded)
    }

    fn package(&self, decoded: DecodedFrame) -> Result<Frame, TrajectoryError> {
        let DecodedFrame {
            simbox,
            mut positions,
        } = decoded;

        let orientations = match self.config.dimensions {
            Dimensions::Two => Some(
                positions
                    .iter_mut()
                    .map(|p| {
                        let angle = p.z;
                        p.z = 0.0;
                        euler_to_quaternion(angle)
                    })
                    .collect(),
            ),
            Dimensions::Three => None,
        };

        let n = positions.len();
        let mut builder = FrameBuilder::new(simbox, positions);
        if let Some(orientations) = orientations {
            builder = builder.orientations(orientations);
        }
        if let Some(types) = self.config.particle_types(n) {
            builder = builder.types(types);
        }
        Ok(builder.build()?)
    }
}

impl<R> fmt::Debug for LazyTrajectory<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyTrajectory")
            .field("frames", &self.view.len)
            .field("particles", &self.header.num_particles)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<'a, R: Read + Seek> IntoIterator for &'a LazyTrajectory<R> {
    type Item = Result<Frame, TrajectoryError>;
    type IntoIter = Frames<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over the frames of a [`LazyTrajectory`].
///
/// Each call to `next` decodes one frame. After the first error the
/// iterator is exhausted. Calling [`LazyTrajectory::iter`] again starts over.
pub struct Frames<'a, R> {
    trajectory: &'a LazyTrajectory<R>,
    front: usize,
    back: usize,
    failed: bool,
}

impl<R: Read + Seek> Frames<'_, R> {
    fn yield_at(&mut self, position: usize) -> Result<Frame, TrajectoryError> {
        let frame = self.trajectory.decode_at(position);
        if frame.is_err() {
            self.failed = true;
        }
        frame
    }
}

impl<R: Read + Seek> Iterator for Frames<'_, R> {
    type Item = Result<Frame, TrajectoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.front >= self.back {
            return None;
        }
        let position = self.front;
        self.front += 1;
        Some(self.yield_at(position))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.failed { 0 } else { self.back - self.front };
        (remaining, Some(remaining))
    }
}

impl<R: Read + Seek> DoubleEndedIterator for Frames<'_, R> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.failed || self.front >= self.back {
            return None;
        }
        self.back -= 1;
        let position = self.back;
        Some(self.yield_at(position))
    }
}

impl<R: Read + Seek> ExactSizeIterator for Frames<'_, R> {}

impl<R: Read + Seek> FusedIterator for Frames<'_, R> {}

use super::progress::ProgressReporter;
use crate::core::io::dcd::{FileHeader, FrameIndexEntry, scan};
use crate::core::models::frame::Frame;
use crate::trajectory::{LazyTrajectory, ReaderConfig, TrajectoryError};
use nalgebra::Point3;
use rayon::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// A lazily decoded trajectory backed by a file on disk.
pub type FileTrajectory = LazyTrajectory<BufReader<File>>;

const CHUNKS_PER_THREAD: usize = 4;

/// Summary of a trajectory whose frames all decoded successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub header: FileHeader,
    pub frames: usize,
    /// Smallest and largest box volume, or `None` for a file without frames.
    pub volume_range: Option<(f64, f64)>,
}

/// Opens and indexes the DCD file at `path`.
#[instrument(skip_all, name = "open_trajectory", fields(path = %path.display()))]
pub fn open_path(path: &Path, config: ReaderConfig) -> Result<FileTrajectory, TrajectoryError> {
    let file = File::open(path)?;
    LazyTrajectory::open(BufReader::new(file), config)
}

/// Indexes `path` and decodes every frame once, failing on the first defect.
#[instrument(skip_all, name = "validate_workflow", fields(path = %path.display()))]
pub fn validate(
    path: &Path,
    config: ReaderConfig,
    reporter: &ProgressReporter,
) -> Result<ValidationReport, TrajectoryError> {
    reporter.indexing();
    let trajectory = open_path(path, config)?;
    reporter.indexed(trajectory.len(), trajectory.header().num_particles);

    reporter.decode_started(trajectory.len());
    let mut volume_range: Option<(f64, f64)> = None;
    for (index, frame) in trajectory.iter().enumerate() {
        let volume = frame?.simbox().volume();
        volume_range = Some(match volume_range {
            Some((min, max)) => (min.min(volume), max.max(volume)),
            None => (volume, volume),
        });
        reporter.frame_decoded(index);
    }
    reporter.decode_finished();

    let report = ValidationReport {
        header: trajectory.header().clone(),
        frames: trajectory.len(),
        volume_range,
    };
    trajectory.close();
    info!(frames = report.frames, "Trajectory validated.");
    Ok(report)
}

/// Decodes every frame of `path` on the rayon thread pool and maps each through `map`.
///
/// The file is indexed once. Each worker then opens its own handle and
/// decodes a contiguous run of frames, so the result is in file order.
#[instrument(skip_all, name = "parallel_load_workflow", fields(path = %path.display()))]
pub fn load_frames_parallel<T, F>(
    path: &Path,
    config: &ReaderConfig,
    reporter: &ProgressReporter,
    map: F,
) -> Result<Vec<T>, TrajectoryError>
where
    T: Send,
    F: Fn(Frame) -> T + Sync,
{
    let shared = SharedIndex::scan(path, config, reporter)?;
    reporter.decode_started(shared.index.len());
    let results = shared.decode_range(path, config, reporter, 0..shared.index.len(), |_, frame| {
        map(frame)
    })?;
    reporter.decode_finished();

    info!(frames = results.len(), "Loaded trajectory in parallel.");
    Ok(results)
}

/// Decodes `path` in batches of `batch_len` frames and hands each mapped frame to `sink` in file order.
///
/// Frames within a batch are decoded and mapped in parallel; the next batch
/// starts only after `sink` has consumed the current one, so at most
/// `batch_len` mapped frames are held at a time. `map` receives the file
/// index of the frame. Returns the number of frames passed to `sink`.
#[instrument(skip_all, name = "stream_workflow", fields(path = %path.display()))]
pub fn stream_frames_parallel<T, E, F, S>(
    path: &Path,
    config: &ReaderConfig,
    reporter: &ProgressReporter,
    batch_len: usize,
    map: F,
    mut sink: S,
) -> Result<usize, E>
where
    T: Send,
    E: From<TrajectoryError>,
    F: Fn(usize, Frame) -> T + Sync,
    S: FnMut(T) -> Result<(), E>,
{
    let shared = SharedIndex::scan(path, config, reporter)?;
    let total = shared.index.len();
    let batch_len = batch_len.max(1);
    reporter.decode_started(total);

    let mut start = 0;
    while start < total {
        let end = (start + batch_len).min(total);
        for item in shared.decode_range(path, config, reporter, start..end, &map)? {
            sink(item)?;
        }
        start = end;
    }
    reporter.decode_finished();

    info!(frames = total, batch_len, "Streamed trajectory.");
    Ok(total)
}

/// Header and frame index of one file, shared by every worker handle.
struct SharedIndex {
    header: Arc<FileHeader>,
    index: Arc<[FrameIndexEntry]>,
}

impl SharedIndex {
    fn scan(path: &Path, config: &ReaderConfig, reporter: &ProgressReporter) -> Result<Self, TrajectoryError> {
        reporter.indexing();
        let mut stream = BufReader::new(File::open(path)?);
        let (header, index) = scan(&mut stream)?;
        reporter.indexed(index.len(), header.num_particles);
        let shared = Self {
            header: Arc::new(header),
            index: index.into(),
        };
        // Config problems such as a type-count mismatch surface before any worker starts.
        shared.open(stream, config)?.close();
        Ok(shared)
    }

    fn open(&self, stream: BufReader<File>, config: &ReaderConfig) -> Result<FileTrajectory, TrajectoryError> {
        LazyTrajectory::from_index(stream, Arc::clone(&self.header), Arc::clone(&self.index), config.clone())
    }

    /// Decodes the frames in `range` across the rayon pool, in file order.
    fn decode_range<T, F>(
        &self,
        path: &Path,
        config: &ReaderConfig,
        reporter: &ProgressReporter,
        range: Range<usize>,
        map: F,
    ) -> Result<Vec<T>, TrajectoryError>
    where
        T: Send,
        F: Fn(usize, Frame) -> T + Sync,
    {
        let entries = &self.index[range];
        let chunk_len = entries
            .len()
            .div_ceil(rayon::current_num_threads() * CHUNKS_PER_THREAD)
            .max(1);

        let chunks = entries
            .par_chunks(chunk_len)
            .map(|chunk| -> Result<Vec<T>, TrajectoryError> {
                let first = chunk[0].frame as isize;
                let trajectory = self.open(BufReader::new(File::open(path)?), config)?;
                let view = trajectory.slice(Some(first), Some(first + chunk.len() as isize), 1)?;
                view.iter()
                    .zip(chunk)
                    .map(|(frame, entry)| -> Result<T, TrajectoryError> {
                        let frame = frame?;
                        reporter.frame_decoded(entry.frame);
                        Ok(map(entry.frame, frame))
                    })
                    .collect()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(chunks.into_iter().flatten().collect())
    }
}

/// Positions of every frame in `path`, decoded in parallel.
pub fn load_positions_parallel(
    path: &Path,
    config: &ReaderConfig,
    reporter: &ProgressReporter,
) -> Result<Vec<Vec<Point3<f32>>>, TrajectoryError> {
    load_frames_parallel(path, config, reporter, Frame::into_positions)
}

use std::sync::atomic::{AtomicUsize, Ordering};

/// What a trajectory workflow is doing right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The file is being scanned to build the frame index.
    Indexing,
    /// The index is complete.
    Indexed { frames: usize, particles: usize },

    /// Decoding of `total` frames begins.
    DecodeStarted { total: usize },
    /// Frame `frame` (file index) was decoded; `done` frames are finished so far.
    ///
    /// Parallel workflows report frames out of file order, but `done`
    /// increases by exactly one per event.
    FrameDecoded { frame: usize, done: usize },
    /// All frames were decoded.
    DecodeFinished { decoded: usize },
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards workflow progress to an optional callback and counts decoded frames.
///
/// The counter is shared by every thread reporting through the same
/// reporter, so `FrameDecoded::done` is consistent across rayon workers.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
    decoded: AtomicUsize,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
            decoded: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    pub fn indexing(&self) {
        self.report(Progress::Indexing);
    }

    pub fn indexed(&self, frames: usize, particles: usize) {
        self.report(Progress::Indexed { frames, particles });
    }

    /// Resets the decoded-frame counter and announces `total` frames.
    pub fn decode_started(&self, total: usize) {
        self.decoded.store(0, Ordering::Relaxed);
        self.report(Progress::DecodeStarted { total });
    }

    pub fn frame_decoded(&self, frame: usize) {
        let done = self.decoded.fetch_add(1, Ordering::Relaxed) + 1;
        self.report(Progress::FrameDecoded { frame, done });
    }

    pub fn decode_finished(&self) {
        self.report(Progress::DecodeFinished {
            decoded: self.decoded(),
        });
    }

    /// Frames reported as decoded since the last [`decode_started`](Self::decode_started).
    pub fn decoded(&self) -> usize {
        self.decoded.load(Ordering::Relaxed)
    }
}

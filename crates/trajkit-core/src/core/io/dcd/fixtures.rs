//! Synthetic DCD streams for tests, written with the same record codec the reader uses.

use super::header::MAGIC;
use crate::core::io::record::{ByteOrder, RecordCodec, encode_f32s};

const TITLE_WIDTH: usize = 80;
const MODERN_MARKER: u32 = 24;

#[derive(Debug, Clone)]
pub(crate) struct FixtureFrame {
    pub cell: [f64; 6],
    pub positions: Vec<[f32; 3]>,
}

#[derive(Debug, Clone)]
pub(crate) struct DcdFixture {
    order: ByteOrder,
    num_particles: u32,
    declared_frames: Option<u32>,
    include_unitcell: bool,
    marker: u32,
    titles: Vec<String>,
    frames: Vec<FixtureFrame>,
}

#[derive(Debug, Clone)]
pub(crate) struct EncodedFixture {
    pub bytes: Vec<u8>,
    /// Absolute offset of each frame's first record.
    pub frame_offsets: Vec<u64>,
    /// Position of every record's trailing length field.
    pub trailing_markers: Vec<usize>,
}

impl DcdFixture {
    pub fn new(num_particles: u32) -> Self {
        Self {
            order: ByteOrder::Little,
            num_particles,
            declared_frames: None,
            include_unitcell: true,
            marker: MODERN_MARKER,
            titles: vec!["Created by trajkit test fixtures".to_string()],
            frames: Vec::new(),
        }
    }

    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    pub fn variant_marker(mut self, marker: u32) -> Self {
        self.marker = marker;
        self
    }

    pub fn declared_frames(mut self, count: u32) -> Self {
        self.declared_frames = Some(count);
        self
    }

    pub fn without_unit_cell(mut self) -> Self {
        self.include_unitcell = false;
        self
    }

    /// Adds a frame with raw unit-cell slots `a, gamma, b, beta, alpha, c`.
    pub fn frame(mut self, cell: [f64; 6], positions: Vec<[f32; 3]>) -> Self {
        self.frames.push(FixtureFrame { cell, positions });
        self
    }

    /// Adds a frame in a right-angled cube of edge `edge`.
    pub fn cubic_frame(self, edge: f64, positions: Vec<[f32; 3]>) -> Self {
        self.frame([edge, 0.0, edge, 0.0, 0.0, edge], positions)
    }

    pub fn encode(&self) -> EncodedFixture {
        let codec = RecordCodec::new(self.order);
        let order = self.order;
        let mut out = EncodedFixture {
            bytes: Vec::new(),
            frame_offsets: Vec::new(),
            trailing_markers: Vec::new(),
        };

        let num_frames = self.declared_frames.unwrap_or(self.frames.len() as u32);
        let mut leading = Vec::with_capacity(84);
        leading.extend_from_slice(MAGIC);
        for word in [num_frames, 0, 1, num_frames, 0, 0, 0, 0, 0, 0] {
            leading.extend_from_slice(&order.u32_to(word));
        }
        leading.extend_from_slice(&order.u32_to(u32::from(self.include_unitcell)));
        for _ in 0..8 {
            leading.extend_from_slice(&order.u32_to(0));
        }
        leading.extend_from_slice(&order.u32_to(self.marker));
        assert_eq!(leading.len(), 84);
        out.push_record(&codec, &leading);

        let mut titles = order.u32_to(self.titles.len() as u32).to_vec();
        for title in &self.titles {
            let mut padded = title.clone().into_bytes();
            padded.resize(TITLE_WIDTH, b' ');
            titles.extend_from_slice(&padded);
        }
        out.push_record(&codec, &titles);
        out.push_record(&codec, &order.u32_to(self.num_particles));

        for frame in &self.frames {
            out.frame_offsets.push(out.bytes.len() as u64);
            if self.include_unitcell {
                let cell: Vec<u8> = frame.cell.iter().flat_map(|&v| order.f64_to(v)).collect();
                out.push_record(&codec, &cell);
            }
            for axis in 0..3 {
                let values: Vec<f32> = frame.positions.iter().map(|p| p[axis]).collect();
                out.push_record(&codec, &encode_f32s(&values, order));
            }
        }
        out
    }
}

impl EncodedFixture {
    fn push_record(&mut self, codec: &RecordCodec, payload: &[u8]) {
        codec
            .write_record(&mut self.bytes, payload)
            .expect("writing to a Vec cannot fail");
        self.trailing_markers.push(self.bytes.len() - 4);
    }
}

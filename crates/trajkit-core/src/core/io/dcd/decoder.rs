use super::error::DcdError;
use super::header::{FileHeader, UNIT_CELL_RECORD_LEN};
use crate::core::io::record::{FieldReader, RecordCodec, decode_f32s};
use crate::core::models::simbox::{Dimensions, SimBox};
use crate::core::utils::geometry::{StoredBox, box_from_stored};
use nalgebra::Point3;
use std::io::{Read, Seek, SeekFrom};
use tracing::trace;

/// Box and coordinates of one decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub simbox: SimBox,
    pub positions: Vec<Point3<f32>>,
}

/// Decodes single frames at offsets produced by [`scan`](super::scan).
///
/// The decoder holds no stream state of its own: every call seeks to the
/// requested offset, so decoding the same offset twice yields identical data.
#[derive(Debug, Clone, Copy)]
pub struct FrameDecoder<'a> {
    header: &'a FileHeader,
    codec: RecordCodec,
    dimensions: Dimensions,
    fallback_box: Option<SimBox>,
}

impl<'a> FrameDecoder<'a> {
    pub fn new(header: &'a FileHeader, dimensions: Dimensions) -> Self {
        Self {
            header,
            codec: RecordCodec::new(header.byte_order),
            dimensions,
            fallback_box: None,
        }
    }

    /// Box to report for files whose frames carry no unit-cell record.
    pub fn with_fallback_box(mut self, fallback_box: Option<SimBox>) -> Self {
        self.fallback_box = fallback_box;
        self
    }

    pub fn decode<R: Read + Seek>(&self, stream: &mut R, offset: u64) -> Result<DecodedFrame, DcdError> {
        stream.seek(SeekFrom::Start(offset))?;

        let simbox = if self.header.include_unitcell {
            self.read_unit_cell(stream)?
        } else {
            self.fallback_box.ok_or_else(|| {
                DcdError::Format("frames carry no unit cell and no fallback box was given".into())
            })?
        };

        let n = self.header.num_particles;
        let mut payload = Vec::with_capacity(4 * n);
        let mut axes: [Vec<f32>; 3] = Default::default();
        for axis in axes.iter_mut() {
            axis.reserve_exact(n);
            self.read_axis(stream, &mut payload, axis)?;
        }

        let [xs, ys, zs] = axes;
        let positions = xs
            .into_iter()
            .zip(ys)
            .zip(zs)
            .map(|((x, y), z)| Point3::new(x, y, z))
            .collect();

        trace!(offset, particles = n, "Decoded DCD frame.");
        Ok(DecodedFrame { simbox, positions })
    }

    fn read_unit_cell<R: Read + Seek>(&self, stream: &mut R) -> Result<SimBox, DcdError> {
        let offset = stream.stream_position()?;
        let payload = self.codec.read_record(stream)?;
        if payload.len() != UNIT_CELL_RECORD_LEN as usize {
            return Err(DcdError::Format(format!(
                "unit-cell record at byte {} holds {} bytes, expected {}",
                offset,
                payload.len(),
                UNIT_CELL_RECORD_LEN
            )));
        }

        let mut fields = FieldReader::new(&payload, self.codec.order());
        let mut slots = [0.0; 6];
        for slot in slots.iter_mut() {
            *slot = fields.read_f64()?;
        }
        let stored = StoredBox::from_slots(slots);
        Ok(box_from_stored(&stored, self.header.convention, self.dimensions)?)
    }

    fn read_axis<R: Read + Seek>(
        &self,
        stream: &mut R,
        payload: &mut Vec<u8>,
        axis: &mut Vec<f32>,
    ) -> Result<(), DcdError> {
        let offset = stream.stream_position()?;
        self.codec.read_record_into(stream, payload)?;
        if payload.len() as u64 != self.header.coordinate_record_len() {
            return Err(DcdError::InconsistentParticleCount {
                offset,
                expected: self.header.num_particles,
                found: payload.len() / 4,
            });
        }
        decode_f32s(payload, self.codec.order(), axis);
        Ok(())
    }
}

use super::error::DcdError;
use super::header::{FileHeader, UNIT_CELL_RECORD_LEN, read_file_header};
use crate::core::io::record::RecordCodec;
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, instrument, warn};

/// Upper bound on the index capacity reserved up front, whatever the header claims.
const MAX_PREALLOCATED_FRAMES: usize = 1 << 16;

/// Byte offset of one frame inside a DCD stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameIndexEntry {
    pub frame: usize,
    pub offset: u64,
}

/// Reads the header and builds the offset index of every declared frame.
///
/// The scan is a single forward pass that only looks at record length
/// fields: unit-cell and coordinate payloads are seeked over, never read.
/// Structural defects visible from the lengths alone are reported here
/// rather than when a frame is decoded.
///
/// # Errors
///
/// * [`DcdError::Format`] for a bad magic tag, non-zero reserved words or a
///   malformed title, particle-count or unit-cell record.
/// * [`DcdError::UnsupportedVariant`] for an unknown version marker.
/// * [`DcdError::CorruptRecord`] if any record's length fields disagree.
/// * [`DcdError::InconsistentParticleCount`] if a coordinate record does not
///   hold exactly one `f32` per declared particle.
/// * [`DcdError::UnexpectedEof`] if the stream ends before all declared
///   frames are indexed; the error names the last frame that was complete.
#[instrument(skip_all, name = "dcd_scan")]
pub fn scan<R: Read + Seek>(stream: &mut R) -> Result<(FileHeader, Vec<FrameIndexEntry>), DcdError> {
    let header = read_file_header(stream)?;
    debug!(
        frames = header.num_frames,
        particles = header.num_particles,
        unit_cell = header.include_unitcell,
        marker = header.variant_marker,
        byte_order = ?header.byte_order,
        "Parsed DCD header."
    );

    let codec = RecordCodec::new(header.byte_order);
    let mut index = Vec::with_capacity(header.num_frames.min(MAX_PREALLOCATED_FRAMES));
    for frame in 0..header.num_frames {
        let offset = stream.stream_position()?;
        skip_frame(&codec, &header, stream)
            .map_err(|e| e.with_last_indexed(frame.checked_sub(1)))?;
        index.push(FrameIndexEntry { frame, offset });
    }

    let frames_end = stream.stream_position()?;
    let stream_end = stream.seek(SeekFrom::End(0))?;
    if stream_end > frames_end {
        warn!(
            trailing_bytes = stream_end - frames_end,
            "Ignoring data after the last declared frame."
        );
    }
    stream.seek(SeekFrom::Start(frames_end))?;

    Ok((header, index))
}

fn skip_frame<R: Read + Seek>(
    codec: &RecordCodec,
    header: &FileHeader,
    stream: &mut R,
) -> Result<(), DcdError> {
    if header.include_unitcell {
        let offset = stream.stream_position()?;
        let len = codec.skip_record(stream)?;
        if len != UNIT_CELL_RECORD_LEN {
            return Err(DcdError::Format(format!(
                "unit-cell record at byte {} holds {} bytes, expected {}",
                offset, len, UNIT_CELL_RECORD_LEN
            )));
        }
    }

    let expected = header.coordinate_record_len();
    for _axis in 0..3 {
        let offset = stream.stream_position()?;
        let len = codec.skip_record(stream)?;
        if u64::from(len) != expected {
            return Err(DcdError::InconsistentParticleCount {
                offset,
                expected: header.num_particles,
                found: len as usize / 4,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::dcd::fixtures::DcdFixture;
    use crate::core::io::record::ByteOrder;
    use crate::core::utils::geometry::AngleConvention;
    use std::io::Cursor;

    fn still_particles(n: usize, value: f32) -> Vec<[f32; 3]> {
        vec![[value, value, value]; n]
    }

    fn three_frame_fixture() -> DcdFixture {
        DcdFixture::new(4)
            .cubic_frame(10.0, still_particles(4, 0.0))
            .cubic_frame(10.0, still_particles(4, 1.0))
            .cubic_frame(10.0, still_particles(4, 2.0))
    }

    #[test]
    fn scan_indexes_every_declared_frame_in_increasing_order() {
        let encoded = three_frame_fixture().encode();
        let (header, index) = scan(&mut Cursor::new(encoded.bytes)).unwrap();

        assert_eq!(header.num_frames, 3);
        assert_eq!(header.num_particles, 4);
        assert_eq!(header.convention, AngleConvention::Modern);
        assert_eq!(header.titles, vec!["Created by trajkit test fixtures".to_string()]);
        assert_eq!(index.len(), 3);
        assert!(index.windows(2).all(|pair| pair[0].offset < pair[1].offset));
        assert_eq!(
            index.iter().map(|e| e.offset).collect::<Vec<_>>(),
            encoded.frame_offsets
        );
        assert!(index.iter().enumerate().all(|(i, e)| e.frame == i));
    }

    #[test]
    fn scan_reads_big_endian_files() {
        let encoded = three_frame_fixture().byte_order(ByteOrder::Big).encode();
        let (header, index) = scan(&mut Cursor::new(encoded.bytes)).unwrap();
        assert_eq!(header.byte_order, ByteOrder::Big);
        assert_eq!(header.num_particles, 4);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn scan_handles_files_without_unit_cells() {
        let encoded = three_frame_fixture().without_unit_cell().encode();
        let (header, index) = scan(&mut Cursor::new(encoded.bytes)).unwrap();
        assert!(!header.include_unitcell);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn scan_rejects_wrong_magic_tag() {
        let mut bytes = three_frame_fixture().encode().bytes;
        bytes[4..8].copy_from_slice(b"VELD");
        assert!(matches!(
            scan(&mut Cursor::new(bytes)),
            Err(DcdError::Format(_))
        ));
    }

    #[test]
    fn scan_rejects_wrong_leading_record_length() {
        let mut bytes = three_frame_fixture().encode().bytes;
        bytes[0] = 80;
        assert!(matches!(
            scan(&mut Cursor::new(bytes)),
            Err(DcdError::Format(_))
        ));
    }

    #[test]
    fn scan_rejects_non_zero_reserved_word() {
        let mut bytes = three_frame_fixture().encode().bytes;
        // First of the eight zero words: 4 (marker) + 4 (magic) + 4 * 11 words.
        bytes[52] = 1;
        assert!(matches!(
            scan(&mut Cursor::new(bytes)),
            Err(DcdError::Format(_))
        ));
    }

    #[test]
    fn scan_rejects_unknown_variant_marker() {
        let encoded = three_frame_fixture().variant_marker(7).encode();
        assert!(matches!(
            scan(&mut Cursor::new(encoded.bytes)),
            Err(DcdError::UnsupportedVariant(7))
        ));
    }

    #[test]
    fn flipping_any_trailing_length_byte_is_detected_as_corruption() {
        let encoded = three_frame_fixture().encode();
        for &marker in &encoded.trailing_markers {
            for byte in 0..4 {
                let mut bytes = encoded.bytes.clone();
                bytes[marker + byte] ^= 0x40;
                let result = scan(&mut Cursor::new(bytes));
                assert!(
                    matches!(result, Err(DcdError::CorruptRecord { .. })),
                    "flip at byte {} was not reported as corrupt: {:?}",
                    marker + byte,
                    result
                );
            }
        }
    }

    #[test]
    fn truncated_stream_reports_last_complete_frame() {
        let encoded = three_frame_fixture().encode();
        let mut bytes = encoded.bytes.clone();
        bytes.truncate(encoded.frame_offsets[2] as usize + 20);

        match scan(&mut Cursor::new(bytes)) {
            Err(DcdError::UnexpectedEof { last_indexed, .. }) => assert_eq!(last_indexed, Some(1)),
            other => panic!("expected UnexpectedEof, got {:?}", other),
        }
    }

    #[test]
    fn truncation_inside_first_frame_reports_no_complete_frame() {
        let encoded = three_frame_fixture().encode();
        let mut bytes = encoded.bytes.clone();
        bytes.truncate(encoded.frame_offsets[0] as usize + 4);

        match scan(&mut Cursor::new(bytes)) {
            Err(DcdError::UnexpectedEof { last_indexed, .. }) => assert_eq!(last_indexed, None),
            other => panic!("expected UnexpectedEof, got {:?}", other),
        }
    }

    #[test]
    fn declared_frame_count_beyond_data_is_unexpected_eof() {
        let encoded = three_frame_fixture().declared_frames(5).encode();
        match scan(&mut Cursor::new(encoded.bytes)) {
            Err(DcdError::UnexpectedEof { last_indexed, .. }) => assert_eq!(last_indexed, Some(2)),
            other => panic!("expected UnexpectedEof, got {:?}", other),
        }
    }

    #[test]
    fn coordinate_block_of_wrong_size_is_inconsistent_particle_count() {
        let encoded = DcdFixture::new(4)
            .cubic_frame(10.0, still_particles(4, 0.0))
            .cubic_frame(10.0, still_particles(3, 0.0))
            .encode();
        match scan(&mut Cursor::new(encoded.bytes)) {
            Err(DcdError::InconsistentParticleCount {
                expected, found, ..
            }) => assert_eq!((expected, found), (4, 3)),
            other => panic!("expected InconsistentParticleCount, got {:?}", other),
        }
    }

    #[test]
    fn trailing_garbage_after_last_frame_is_tolerated() {
        let mut encoded = three_frame_fixture().encode();
        encoded.bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let (_, index) = scan(&mut Cursor::new(encoded.bytes)).unwrap();
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn empty_trajectory_has_empty_index() {
        let encoded = DcdFixture::new(2).encode();
        let (header, index) = scan(&mut Cursor::new(encoded.bytes)).unwrap();
        assert_eq!(header.num_frames, 0);
        assert!(index.is_empty());
    }
}

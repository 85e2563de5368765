use super::error::DcdError;
use crate::core::io::record::{ByteOrder, FieldReader, RecordCodec};
use crate::core::utils::geometry::AngleConvention;
use std::io::{self, Read, Seek, SeekFrom};

/// Payload length of the leading header record.
pub const LEADING_RECORD_LEN: u32 = 84;
/// Magic tag opening the leading header record.
pub const MAGIC: &[u8; 4] = b"CORD";
/// Payload length of a per-frame unit-cell record (six `f64`).
pub const UNIT_CELL_RECORD_LEN: u32 = 48;

const RESERVED_WORDS: usize = 5;
const ZERO_WORDS: usize = 8;

/// Everything the DCD header declares about the trajectory that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub byte_order: ByteOrder,
    pub num_frames: usize,
    pub start_timestep: u32,
    pub period: u32,
    pub timesteps: u32,
    /// Raw timestep word. CHARMM writers store an `f32` here, see [`FileHeader::timestep_f32`].
    pub timestep: u32,
    /// Whether every frame starts with a unit-cell record.
    pub include_unitcell: bool,
    /// Trailing version word of the leading record (CHARMM version, or 0).
    pub variant_marker: u32,
    pub convention: AngleConvention,
    pub titles: Vec<String>,
    pub num_particles: usize,
}

impl FileHeader {
    /// Payload length of each x, y and z coordinate record.
    pub fn coordinate_record_len(&self) -> u64 {
        4 * self.num_particles as u64
    }

    pub fn timestep_f32(&self) -> f32 {
        f32::from_bits(self.timestep)
    }
}

/// Reads the leading, title and particle-count records.
///
/// The stream is left positioned at the first frame.
pub(crate) fn read_file_header<R: Read + Seek>(stream: &mut R) -> Result<FileHeader, DcdError> {
    let start = stream.stream_position()?;
    let mut first = [0u8; 4];
    stream.read_exact(&mut first).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            DcdError::Format("stream is too short to hold a DCD header".into())
        }
        _ => DcdError::Io(e),
    })?;
    let byte_order = ByteOrder::detect(first, LEADING_RECORD_LEN).ok_or_else(|| {
        DcdError::Format(format!(
            "leading record must be {} bytes long, found length field {:02x?}",
            LEADING_RECORD_LEN, first
        ))
    })?;
    stream.seek(SeekFrom::Start(start))?;

    let codec = RecordCodec::new(byte_order);
    let leading = codec.read_record(stream)?;
    let mut fields = FieldReader::new(&leading, byte_order);

    let magic = fields.read_bytes(MAGIC.len())?;
    if magic != MAGIC {
        return Err(DcdError::Format(format!(
            "expected magic tag {:?}, found {:?}",
            String::from_utf8_lossy(MAGIC),
            String::from_utf8_lossy(magic)
        )));
    }

    let num_frames = fields.read_u32()? as usize;
    let start_timestep = fields.read_u32()?;
    let period = fields.read_u32()?;
    let timesteps = fields.read_u32()?;
    fields.skip(4 * RESERVED_WORDS)?;
    let timestep = fields.read_u32()?;
    let include_unitcell = fields.read_u32()? != 0;
    for word in 0..ZERO_WORDS {
        let value = fields.read_u32()?;
        if value != 0 {
            return Err(DcdError::Format(format!(
                "reserved header word {} must be zero, found {}",
                word, value
            )));
        }
    }
    let variant_marker = fields.read_u32()?;
    let convention = AngleConvention::from_marker(variant_marker)
        .ok_or(DcdError::UnsupportedVariant(variant_marker))?;

    let titles = read_titles(&codec, stream)?;

    let count_record = codec.read_record(stream)?;
    if count_record.len() != 4 {
        return Err(DcdError::Format(format!(
            "particle-count record must hold 4 bytes, found {}",
            count_record.len()
        )));
    }
    let num_particles = FieldReader::new(&count_record, byte_order).read_u32()? as usize;

    Ok(FileHeader {
        byte_order,
        num_frames,
        start_timestep,
        period,
        timesteps,
        timestep,
        include_unitcell,
        variant_marker,
        convention,
        titles,
        num_particles,
    })
}

fn read_titles<R: Read + Seek>(codec: &RecordCodec, stream: &mut R) -> Result<Vec<String>, DcdError> {
    let payload = codec.read_record(stream)?;
    let mut fields = FieldReader::new(&payload, codec.order());
    let count = fields.read_u32()? as usize;
    let body = fields.rest();

    if count == 0 {
        return Ok(Vec::new());
    }
    if body.len() < count || body.len() % count != 0 {
        return Err(DcdError::Format(format!(
            "title block of {} bytes cannot hold {} fixed-width titles",
            body.len(),
            count
        )));
    }

    Ok(body
        .chunks_exact(body.len() / count)
        .map(|title| {
            String::from_utf8_lossy(title)
                .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
                .to_string()
        })
        .collect())
}

//! Fortran "unformatted" sequential records.
//!
//! Every record is a payload bracketed by two 4-byte length fields holding the
//! payload size. All structural reads of a binary trajectory go through
//! [`RecordCodec`], which is the single place where the two length fields are
//! checked against each other.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};
use thiserror::Error;

/// Size in bytes of the length field on either side of a record.
pub const MARKER_LEN: u64 = 4;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unexpected end of stream in record starting at byte {offset}")]
    UnexpectedEof { offset: u64 },

    #[error(
        "Corrupt record at byte {offset}: leading length {leading} does not match trailing length {trailing}"
    )]
    Corrupt {
        offset: u64,
        leading: u32,
        trailing: u32,
    },

    #[error("Record payload too short: needed {needed} more bytes, {remaining} left")]
    ShortPayload { needed: usize, remaining: usize },
}

/// Byte order of the integer and floating-point fields in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Detects the byte order from a leading length field with a known value.
    pub fn detect(marker: [u8; 4], expected: u32) -> Option<Self> {
        if LittleEndian::read_u32(&marker) == expected {
            Some(ByteOrder::Little)
        } else if BigEndian::read_u32(&marker) == expected {
            Some(ByteOrder::Big)
        } else {
            None
        }
    }

    /// Reads a `u32` from the first four bytes of `bytes`.
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::Little => LittleEndian::read_u32(bytes),
            ByteOrder::Big => BigEndian::read_u32(bytes),
        }
    }

    pub fn read_f32(self, bytes: &[u8]) -> f32 {
        match self {
            ByteOrder::Little => LittleEndian::read_f32(bytes),
            ByteOrder::Big => BigEndian::read_f32(bytes),
        }
    }

    pub fn read_f64(self, bytes: &[u8]) -> f64 {
        match self {
            ByteOrder::Little => LittleEndian::read_f64(bytes),
            ByteOrder::Big => BigEndian::read_f64(bytes),
        }
    }

    pub fn u32_to(self, value: u32) -> [u8; 4] {
        let mut buf = [0u8; 4];
        match self {
            ByteOrder::Little => LittleEndian::write_u32(&mut buf, value),
            ByteOrder::Big => BigEndian::write_u32(&mut buf, value),
        }
        buf
    }

    pub fn f64_to(self, value: f64) -> [u8; 8] {
        let mut buf = [0u8; 8];
        match self {
            ByteOrder::Little => LittleEndian::write_f64(&mut buf, value),
            ByteOrder::Big => BigEndian::write_f64(&mut buf, value),
        }
        buf
    }

    fn read_marker<R: Read>(self, stream: &mut R) -> io::Result<u32> {
        match self {
            ByteOrder::Little => stream.read_u32::<LittleEndian>(),
            ByteOrder::Big => stream.read_u32::<BigEndian>(),
        }
    }

    fn write_marker<W: Write>(self, stream: &mut W, len: u32) -> io::Result<()> {
        match self {
            ByteOrder::Little => stream.write_u32::<LittleEndian>(len),
            ByteOrder::Big => stream.write_u32::<BigEndian>(len),
        }
    }
}

/// Reads, skips and writes length-bracketed records in one byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordCodec {
    order: ByteOrder,
}

impl RecordCodec {
    pub fn new(order: ByteOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Reads one record and returns its payload.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Corrupt`] if the leading and trailing length
    /// fields disagree, and [`RecordError::UnexpectedEof`] if the stream ends
    /// inside the record.
    pub fn read_record<R: Read + Seek>(&self, stream: &mut R) -> Result<Vec<u8>, RecordError> {
        let mut payload = Vec::new();
        self.read_record_into(stream, &mut payload)?;
        Ok(payload)
    }

    /// Reads one record into `payload`, replacing its previous contents.
    pub fn read_record_into<R: Read + Seek>(
        &self,
        stream: &mut R,
        payload: &mut Vec<u8>,
    ) -> Result<(), RecordError> {
        let offset = stream.stream_position()?;
        let leading = self.read_marker(stream, offset)?;

        payload.clear();
        let read = stream
            .by_ref()
            .take(u64::from(leading))
            .read_to_end(payload)?;
        if read != leading as usize {
            return Err(RecordError::UnexpectedEof { offset });
        }

        let trailing = self.read_marker(stream, offset)?;
        check_markers(offset, leading, trailing)
    }

    /// Moves past one record without reading its payload and returns the payload length.
    ///
    /// The trailing length field is still read and compared, so skipping
    /// detects the same corruption as reading.
    pub fn skip_record<R: Read + Seek>(&self, stream: &mut R) -> Result<u32, RecordError> {
        let offset = stream.stream_position()?;
        let leading = self.read_marker(stream, offset)?;
        stream.seek(SeekFrom::Current(i64::from(leading)))?;
        let trailing = self.read_marker(stream, offset)?;
        check_markers(offset, leading, trailing)?;
        Ok(leading)
    }

    /// Writes `payload` as one record.
    pub fn write_record<W: Write>(&self, stream: &mut W, payload: &[u8]) -> Result<(), RecordError> {
        let len = u32::try_from(payload.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "record payload does not fit a 32-bit length field",
            )
        })?;
        self.order.write_marker(stream, len)?;
        stream.write_all(payload)?;
        self.order.write_marker(stream, len)?;
        Ok(())
    }

    fn read_marker<R: Read>(&self, stream: &mut R, offset: u64) -> Result<u32, RecordError> {
        self.order.read_marker(stream).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => RecordError::UnexpectedEof { offset },
            _ => RecordError::Io(e),
        })
    }
}

fn check_markers(offset: u64, leading: u32, trailing: u32) -> Result<(), RecordError> {
    if leading == trailing {
        Ok(())
    } else {
        Err(RecordError::Corrupt {
            offset,
            leading,
            trailing,
        })
    }
}

/// A cursor over a record payload with typed reads in a fixed byte order.
pub struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            pos: 0,
            order,
        }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Returns everything after the cursor and moves the cursor to the end.
    pub fn rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos.min(self.data.len())..];
        self.pos = self.data.len();
        rest
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], RecordError> {
        if self.remaining() < n {
            return Err(RecordError::ShortPayload {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), RecordError> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_u32(&mut self) -> Result<u32, RecordError> {
        let order = self.order;
        self.read_bytes(4).map(|b| order.read_u32(b))
    }

    pub fn read_f32(&mut self) -> Result<f32, RecordError> {
        let order = self.order;
        self.read_bytes(4).map(|b| order.read_f32(b))
    }

    pub fn read_f64(&mut self) -> Result<f64, RecordError> {
        let order = self.order;
        self.read_bytes(8).map(|b| order.read_f64(b))
    }
}

/// Decodes a payload of packed 32-bit floats, appending them to `out`.
///
/// A trailing partial value is ignored.
pub fn decode_f32s(payload: &[u8], order: ByteOrder, out: &mut Vec<f32>) {
    let count = payload.len() / 4;
    let start = out.len();
    out.resize(start + count, 0.0);
    let (src, dst) = (&payload[..count * 4], &mut out[start..]);
    match order {
        ByteOrder::Little => LittleEndian::read_f32_into(src, dst),
        ByteOrder::Big => BigEndian::read_f32_into(src, dst),
    }
}

/// Encodes `values` as packed 32-bit floats.
pub fn encode_f32s(values: &[f32], order: ByteOrder) -> Vec<u8> {
    let mut bytes = vec![0u8; values.len() * 4];
    match order {
        ByteOrder::Little => LittleEndian::write_f32_into(values, &mut bytes),
        ByteOrder::Big => BigEndian::write_f32_into(values, &mut bytes),
    }
    bytes
}

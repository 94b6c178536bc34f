//! Cursor over a protobuf-encoded byte buffer.
//!
//! [`WireReader`] exposes the primitive reads every message decoder is built
//! from: base-128 varints, little-endian fixed-width values, length-delimited
//! runs and field tags. Every successful read advances the cursor by exactly
//! the number of bytes it consumed; a failed read leaves it where it was.

/// Protobuf wire types understood by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl WireType {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

/// Field number and wire type read from a single tag varint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub field_number: u32,
    pub wire_type: WireType,
}

impl Tag {
    /// Largest field number protobuf allows
    pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

    pub fn new(field_number: u32, wire_type: WireType) -> Self {
        Tag {
            field_number,
            wire_type,
        }
    }

    /// Encoded tag value, `(field_number << 3) | wire_type`
    pub fn encoded(self) -> u64 {
        (u64::from(self.field_number) << 3) | self.wire_type as u64
    }
}

/// Violations of the wire encoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("truncated input at byte {offset}: needed {needed} more byte(s), {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("varint at byte {offset} exceeds 64 bits")]
    VarintOverflow { offset: usize },

    #[error("invalid wire type {wire_type} at byte {offset}")]
    InvalidWireType { offset: usize, wire_type: u8 },

    #[error("invalid field number {field_number} at byte {offset}")]
    InvalidFieldNumber { offset: usize, field_number: u64 },

    #[error("field {field_number} of {message} cannot be encoded as {wire_type:?}")]
    UnexpectedWireType {
        message: &'static str,
        field_number: u32,
        wire_type: WireType,
    },

    #[error("length-delimited field at byte {offset} runs past its enclosing message ending at byte {end}")]
    LengthOverrun { offset: usize, end: usize },

    #[error("message nesting exceeds the recursion limit of {limit}")]
    RecursionLimitExceeded { limit: u32 },
}

/// Read-only cursor over an encoded buffer
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        WireReader { buf, pos: 0 }
    }

    /// Current cursor position
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Total buffer length
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Unsigned base-128 varint, at most ten bytes
    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let start = self.pos;
        let mut value: u64 = 0;
        for (i, &byte) in self.buf[start..].iter().enumerate() {
            if i == 9 && byte > 0x01 {
                return Err(WireError::VarintOverflow { offset: start });
            }
            value |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                self.pos = start + i + 1;
                return Ok(value);
            }
        }
        let available = self.buf.len() - start;
        Err(WireError::TruncatedInput {
            offset: start,
            needed: available + 1,
            available,
        })
    }

    /// Varint reinterpreted as two's complement `int64`
    #[inline]
    pub fn read_int64(&mut self) -> Result<i64, WireError> {
        self.read_varint().map(|v| v as i64)
    }

    /// Varint truncated to `int32`, the way protobuf encodes negative int32
    /// and enum values
    #[inline]
    pub fn read_int32(&mut self) -> Result<i32, WireError> {
        self.read_varint().map(|v| v as i32)
    }

    #[inline]
    pub fn read_uint64(&mut self) -> Result<u64, WireError> {
        self.read_varint()
    }

    pub fn read_fixed32(&mut self) -> Result<u32, WireError> {
        let bytes = self.take(4)?;
        let mut le = [0u8; 4];
        le.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(le))
    }

    pub fn read_fixed64(&mut self) -> Result<u64, WireError> {
        let bytes = self.take(8)?;
        let mut le = [0u8; 8];
        le.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(le))
    }

    #[inline]
    pub fn read_float(&mut self) -> Result<f32, WireError> {
        self.read_fixed32().map(f32::from_bits)
    }

    #[inline]
    pub fn read_double(&mut self) -> Result<f64, WireError> {
        self.read_fixed64().map(f64::from_bits)
    }

    /// Length prefix of a length-delimited field, checked against the buffer
    pub fn read_length(&mut self) -> Result<usize, WireError> {
        let start = self.pos;
        let len = self.read_varint()?;
        let available = self.remaining();
        match usize::try_from(len) {
            Ok(len) if len <= available => Ok(len),
            _ => {
                self.pos = start;
                Err(WireError::TruncatedInput {
                    offset: start,
                    needed: usize::try_from(len).unwrap_or(usize::MAX),
                    available,
                })
            }
        }
    }

    /// Length-prefixed byte run, borrowed from the underlying buffer
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], WireError> {
        let start = self.pos;
        let len = self.read_length()?;
        self.take(len).inspect_err(|_| self.pos = start)
    }

    pub fn read_tag(&mut self) -> Result<Tag, WireError> {
        let start = self.pos;
        let value = self.read_varint()?;
        let field_number = value >> 3;
        if field_number == 0 || field_number > u64::from(Tag::MAX_FIELD_NUMBER) {
            self.pos = start;
            return Err(WireError::InvalidFieldNumber {
                offset: start,
                field_number,
            });
        }
        let bits = (value & 0x07) as u8;
        let Some(wire_type) = WireType::from_bits(bits) else {
            self.pos = start;
            return Err(WireError::InvalidWireType {
                offset: start,
                wire_type: bits,
            });
        };
        Ok(Tag::new(field_number as u32, wire_type))
    }

    /// Advance past a field payload without interpreting it
    pub fn skip(&mut self, wire_type: WireType) -> Result<(), WireError> {
        match wire_type {
            WireType::Varint => self.read_varint().map(|_| ()),
            WireType::Fixed64 => self.take(8).map(|_| ()),
            WireType::LengthDelimited => self.read_length_delimited().map(|_| ()),
            WireType::Fixed32 => self.take(4).map(|_| ()),
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let available = self.remaining();
        if n > available {
            return Err(WireError::TruncatedInput {
                offset: self.pos,
                needed: n,
                available,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }
}

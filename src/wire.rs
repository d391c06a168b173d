//! Cursor-based reader for the protocol buffer wire format.
//!
//! The reader only knows about wire-level primitives. It performs the checks that make a single
//! primitive canonical (minimal varints, values that fit their target type) but knows nothing about
//! messages or fields.

use crate::error::DecodeError;
use std::convert::TryFrom;

/// Maximum number of bytes a 64-bit varint can occupy.
pub const MAX_VARINT_LEN: usize = 10;

/// Largest field number allowed in a tag.
pub const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

/// On-the-wire representation class of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireType
{
    /// Base-128 varint (wire type = 0).
    Varint,

    /// Little endian 64-bit value (wire type = 1).
    Fixed64,

    /// Varint length followed by that many bytes (wire type = 2).
    LengthDelimited,

    /// Little endian 32-bit value (wire type = 5).
    Fixed32,
}

impl WireType
{
    /// Maps the three low bits of a tag to a wire type.
    ///
    /// Groups (3 and 4) are not supported and are treated like the undefined wire types.
    pub fn from_raw(raw: u8) -> Option<Self>
    {
        match raw {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }

    /// The three low bits of a tag with this wire type.
    pub fn raw(self) -> u8
    {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
        }
    }
}

/// Parsed field header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tag
{
    /// Field number.
    pub number: u64,

    /// Wire type used for the value.
    pub wire_type: WireType,
}

impl Tag
{
    /// Splits a raw tag value into the field number and wire type.
    ///
    /// Returns `None` for field number zero, field numbers above [`MAX_FIELD_NUMBER`] and
    /// unsupported wire types.
    pub fn from_raw(raw: u64) -> Option<Self>
    {
        let wire_type = WireType::from_raw((raw & 0x07) as u8)?;
        let number = raw >> 3;
        if number == 0 || number > MAX_FIELD_NUMBER {
            return None;
        }

        Some(Tag { number, wire_type })
    }
}

/// Read cursor over an immutable byte buffer.
///
/// Offsets reported in errors are absolute: a reader created for a nested payload keeps the
/// offset of the payload within the top level buffer.
#[derive(Clone, Debug)]
pub struct WireReader<'a>
{
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> WireReader<'a>
{
    /// Creates a reader over the whole buffer.
    pub fn new(data: &'a [u8]) -> Self
    {
        WireReader {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Cursor position relative to the start of this reader's buffer.
    pub fn position(&self) -> usize
    {
        self.pos
    }

    /// Cursor position relative to the start of the top level buffer.
    pub fn offset(&self) -> usize
    {
        self.base + self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize
    {
        self.data.len() - self.pos
    }

    /// True, if every byte has been read.
    pub fn is_empty(&self) -> bool
    {
        self.remaining() == 0
    }

    /// Reads an unsigned varint, returning the value and the number of bytes it occupied.
    ///
    /// The cursor is left in place if the varint is malformed.
    pub fn read_varint(&mut self) -> Result<(u64, usize), DecodeError>
    {
        let offset = self.offset();
        let mut result = 0u64;
        for (idx, &b) in self.data[self.pos..].iter().enumerate() {
            let value = u64::from(b & 0x7f);

            // The tenth group may only contribute the 64th bit and must terminate the varint.
            if idx == MAX_VARINT_LEN - 1 && (b & 0x80 != 0 || value > 1) {
                return Err(DecodeError::VarintOverlong { offset });
            }

            result |= value << (idx * 7);
            if b & 0x80 == 0 {
                let len = idx + 1;
                if len > 1 && b == 0 {
                    return Err(DecodeError::NonCanonicalVarint { offset });
                }

                self.pos += len;
                return Ok((result, len));
            }
        }

        Err(DecodeError::Truncated { offset })
    }

    /// Reads a zig-zag encoded `sint32`.
    pub fn read_zigzag32(&mut self) -> Result<i32, DecodeError>
    {
        let offset = self.offset();
        let (raw, _) = self.read_varint()?;
        let n = u32::try_from(raw).map_err(|_| DecodeError::ValueOutOfRange {
            offset,
            value: raw,
            target: "sint32",
        })?;
        Ok(((n >> 1) as i32) ^ -((n & 1) as i32))
    }

    /// Reads a zig-zag encoded `sint64`.
    pub fn read_zigzag64(&mut self) -> Result<i64, DecodeError>
    {
        let (n, _) = self.read_varint()?;
        Ok(((n >> 1) as i64) ^ -((n & 1) as i64))
    }

    /// Reads an `int32`.
    ///
    /// Negative values are sign extended to 64 bits on the wire so the payload must be the sign
    /// extension of a 32-bit value.
    pub fn read_int32(&mut self) -> Result<i32, DecodeError>
    {
        let offset = self.offset();
        let (raw, _) = self.read_varint()?;
        i32::try_from(raw as i64).map_err(|_| DecodeError::ValueOutOfRange {
            offset,
            value: raw,
            target: "int32",
        })
    }

    /// Reads an `int64`.
    pub fn read_int64(&mut self) -> Result<i64, DecodeError>
    {
        self.read_varint().map(|(raw, _)| raw as i64)
    }

    /// Reads a `uint32`.
    pub fn read_uint32(&mut self) -> Result<u32, DecodeError>
    {
        let offset = self.offset();
        let (raw, _) = self.read_varint()?;
        u32::try_from(raw).map_err(|_| DecodeError::ValueOutOfRange {
            offset,
            value: raw,
            target: "uint32",
        })
    }

    /// Reads a `uint64`.
    pub fn read_uint64(&mut self) -> Result<u64, DecodeError>
    {
        self.read_varint().map(|(raw, _)| raw)
    }

    /// Reads a `bool`. Only 0 and 1 are accepted.
    pub fn read_bool(&mut self) -> Result<bool, DecodeError>
    {
        let offset = self.offset();
        match self.read_varint()? {
            (0, _) => Ok(false),
            (1, _) => Ok(true),
            (raw, _) => Err(DecodeError::ValueOutOfRange {
                offset,
                value: raw,
                target: "bool",
            }),
        }
    }

    /// Reads 4 bytes as a little endian `u32`.
    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError>
    {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Reads 8 bytes as a little endian `u64`.
    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError>
    {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError>
    {
        let offset = self.offset();
        if self.remaining() < N {
            return Err(DecodeError::Truncated { offset });
        }

        let array = <[u8; N]>::try_from(&self.data[self.pos..self.pos + N])
            .map_err(|_| DecodeError::Truncated { offset })?;
        self.pos += N;
        Ok(array)
    }

    /// Reads a varint length followed by exactly that many bytes.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], DecodeError>
    {
        let offset = self.offset();
        let (len, _) = self.read_varint()?;
        let len = match usize::try_from(len) {
            Ok(len) if len <= self.remaining() => len,
            _ => return Err(DecodeError::Truncated { offset }),
        };

        let payload = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(payload)
    }

    /// Reads a length delimited payload and returns a reader scoped exactly to it.
    pub fn read_nested(&mut self) -> Result<WireReader<'a>, DecodeError>
    {
        let payload = self.read_length_delimited()?;
        Ok(WireReader {
            data: payload,
            pos: 0,
            base: self.offset() - payload.len(),
        })
    }

    /// Reads a field header.
    pub fn read_tag(&mut self) -> Result<Tag, DecodeError>
    {
        let offset = self.offset();
        let (raw, _) = self.read_varint()?;
        Tag::from_raw(raw).ok_or(DecodeError::InvalidTag { offset, tag: raw })
    }
}

#[cfg(test)]
mod test
{
    use super::*;
    use crate::error::ErrorKind;

    fn varint(data: &[u8]) -> Result<(u64, usize), ErrorKind>
    {
        WireReader::new(data).read_varint().map_err(|e| e.kind())
    }

    #[test]
    fn varints()
    {
        assert_eq!(varint(b"\x00"), Ok((0, 1)));
        assert_eq!(varint(b"\x7f"), Ok((127, 1)));
        assert_eq!(varint(b"\x80\x01"), Ok((128, 2)));
        assert_eq!(varint(b"\xac\x02"), Ok((300, 2)));
        assert_eq!(
            varint(b"\xff\xff\xff\xff\xff\xff\xff\xff\xff\x01"),
            Ok((u64::MAX, 10))
        );
    }

    #[test]
    fn truncated_varint()
    {
        assert_eq!(varint(b""), Err(ErrorKind::Truncated));
        assert_eq!(varint(b"\x80"), Err(ErrorKind::Truncated));
        assert_eq!(varint(b"\xde\xad\xbe\xef"), Err(ErrorKind::Truncated));
    }

    #[test]
    fn overlong_varint()
    {
        assert_eq!(
            varint(b"\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\x01"),
            Err(ErrorKind::VarintOverlong)
        );

        // Tenth group carrying more than the 64th bit.
        assert_eq!(
            varint(b"\xff\xff\xff\xff\xff\xff\xff\xff\xff\x02"),
            Err(ErrorKind::VarintOverlong)
        );
    }

    #[test]
    fn non_minimal_varint()
    {
        assert_eq!(varint(b"\x80\x00"), Err(ErrorKind::NonCanonicalVarint));
        assert_eq!(varint(b"\x81\x80\x00"), Err(ErrorKind::NonCanonicalVarint));
    }

    #[test]
    fn failed_read_keeps_cursor()
    {
        let mut reader = WireReader::new(b"\x01\x80");
        assert_eq!(reader.read_varint().unwrap(), (1, 1));
        assert!(reader.read_varint().is_err());
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn zigzag()
    {
        let mut reader = WireReader::new(b"\x00\x01\x02\x03\xfe\xff\xff\xff\x0f\xff\xff\xff\xff\x0f");
        assert_eq!(reader.read_zigzag32().unwrap(), 0);
        assert_eq!(reader.read_zigzag32().unwrap(), -1);
        assert_eq!(reader.read_zigzag32().unwrap(), 1);
        assert_eq!(reader.read_zigzag32().unwrap(), -2);
        assert_eq!(reader.read_zigzag32().unwrap(), i32::MAX);
        assert_eq!(reader.read_zigzag32().unwrap(), i32::MIN);
        assert!(reader.is_empty());

        let mut reader = WireReader::new(b"\xe3\x0a\xa4\x0a");
        assert_eq!(reader.read_zigzag64().unwrap(), -690);
        assert_eq!(reader.read_zigzag64().unwrap(), 658);

        let mut reader = WireReader::new(b"\x80\x80\x80\x80\x10");
        assert_eq!(
            reader.read_zigzag32().unwrap_err().kind(),
            ErrorKind::ValueOutOfRange
        );
    }

    #[test]
    fn int32_sign_extension()
    {
        let mut reader = WireReader::new(b"\xd6\xff\xff\xff\xff\xff\xff\xff\xff\x01");
        assert_eq!(reader.read_int32().unwrap(), -42);

        // -42 truncated to 32 bits is not the canonical form.
        let mut reader = WireReader::new(b"\xd6\xff\xff\xff\x0f");
        assert_eq!(
            reader.read_int32().unwrap_err().kind(),
            ErrorKind::ValueOutOfRange
        );
    }

    #[test]
    fn ranges()
    {
        let mut reader = WireReader::new(b"\x80\x80\x80\x80\x10");
        assert_eq!(
            reader.read_uint32().unwrap_err().kind(),
            ErrorKind::ValueOutOfRange
        );

        let mut reader = WireReader::new(b"\x01\x00\x02");
        assert_eq!(reader.read_bool().unwrap(), true);
        assert_eq!(reader.read_bool().unwrap(), false);
        assert_eq!(
            reader.read_bool().unwrap_err().kind(),
            ErrorKind::ValueOutOfRange
        );
    }

    #[test]
    fn fixed()
    {
        let mut reader = WireReader::new(b"\x84\x03\x00\x00\x28\x23\x00\x00\x00\x00\x00\x00\x01");
        assert_eq!(reader.read_fixed32().unwrap(), 900);
        assert_eq!(reader.read_fixed64().unwrap(), 9000);
        assert_eq!(
            reader.read_fixed32().unwrap_err().kind(),
            ErrorKind::Truncated
        );
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn length_delimited()
    {
        let mut reader = WireReader::new(b"\x03abc\x05ab");
        assert_eq!(reader.read_length_delimited().unwrap(), b"abc");
        let err = reader.read_length_delimited().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
        assert_eq!(err.offset(), 4);
    }

    #[test]
    fn nested_offsets()
    {
        let mut reader = WireReader::new(b"\x00\x02\x80\x01");
        reader.read_varint().unwrap();
        let mut nested = reader.read_nested().unwrap();
        assert!(reader.is_empty());
        assert_eq!(nested.offset(), 2);
        assert_eq!(nested.read_varint().unwrap(), (128, 2));
        assert_eq!(nested.offset(), 4);
        assert_eq!(nested.position(), 2);
    }

    #[test]
    fn tags()
    {
        let mut reader = WireReader::new(b"\x18\x82\x01");
        assert_eq!(
            reader.read_tag().unwrap(),
            Tag {
                number: 3,
                wire_type: WireType::Varint
            }
        );
        assert_eq!(
            reader.read_tag().unwrap(),
            Tag {
                number: 16,
                wire_type: WireType::LengthDelimited
            }
        );

        // Field number zero.
        assert_eq!(
            WireReader::new(b"\x00").read_tag().unwrap_err().kind(),
            ErrorKind::InvalidTag
        );

        // Start group.
        assert_eq!(
            WireReader::new(b"\x0b").read_tag().unwrap_err().kind(),
            ErrorKind::InvalidTag
        );

        // Field number above the maximum.
        assert_eq!(
            WireReader::new(b"\x80\x80\x80\x80\x20")
                .read_tag()
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidTag
        );
    }
}

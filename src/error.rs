//! Decoding errors.

use crate::wire::WireType;
use snafu::Snafu;

/// Reason a payload was rejected.
///
/// Offsets are absolute positions in the top level buffer.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[non_exhaustive]
pub enum DecodeError
{
    /// The buffer ended in the middle of a value.
    #[snafu(display("Truncated value at offset {}", offset))]
    Truncated
    {
        /// Start of the incomplete value.
        offset: usize,
    },

    /// Field header with field number zero, a too large field number or an unsupported wire type.
    #[snafu(display("Invalid tag {:#x} at offset {}", tag, offset))]
    InvalidTag
    {
        /// Offset of the tag.
        offset: usize,
        /// Raw tag value.
        tag: u64,
    },

    /// Varint longer than ten bytes or wider than 64 bits.
    #[snafu(display("Overlong varint at offset {}", offset))]
    VarintOverlong
    {
        /// Offset of the varint.
        offset: usize,
    },

    /// Varint encoded with redundant trailing zero groups.
    #[snafu(display("Non-minimal varint at offset {}", offset))]
    NonCanonicalVarint
    {
        /// Offset of the varint.
        offset: usize,
    },

    /// Varint payload that does not fit the field type.
    #[snafu(display("Value {} at offset {} is out of range for {}", value, offset, target))]
    ValueOutOfRange
    {
        /// Offset of the value.
        offset: usize,
        /// Raw varint payload.
        value: u64,
        /// Target type name.
        target: &'static str,
    },

    /// `string` payload that isn't valid UTF-8.
    #[snafu(display("Invalid UTF-8 in field {} at offset {}", number, offset))]
    InvalidUtf8
    {
        /// Offset of the field.
        offset: usize,
        /// Field number.
        number: u64,
    },

    /// Field number not defined in the message.
    #[snafu(display("Unknown field {} at offset {}", number, offset))]
    UnknownField
    {
        /// Offset of the field.
        offset: usize,
        /// Field number.
        number: u64,
    },

    /// Field encoded with a different wire type than its type requires.
    #[snafu(display(
        "Field {} at offset {} used wire type {:?}, expected {:?}",
        number,
        offset,
        actual,
        expected
    ))]
    WireTypeMismatch
    {
        /// Offset of the field.
        offset: usize,
        /// Field number.
        number: u64,
        /// Wire type required by the field type.
        expected: WireType,
        /// Wire type found in the tag.
        actual: WireType,
    },

    /// Field appearing after a field with a higher number.
    #[snafu(display(
        "Field {} at offset {} follows field {}",
        number,
        offset,
        previous
    ))]
    FieldOutOfOrder
    {
        /// Offset of the field.
        offset: usize,
        /// Field number.
        number: u64,
        /// Number of the preceding field.
        previous: u64,
    },

    /// Non-repeated field appearing more than once.
    #[snafu(display("Duplicate field {} at offset {}", number, offset))]
    DuplicateField
    {
        /// Offset of the second occurrence.
        offset: usize,
        /// Field number.
        number: u64,
    },

    /// Field transmitted with the default value of its type.
    #[snafu(display("Field {} at offset {} carries its default value", number, offset))]
    ExplicitDefaultValue
    {
        /// Offset of the field.
        offset: usize,
        /// Field number.
        number: u64,
    },

    /// Bytes after the last complete field that do not form a field.
    #[snafu(display("{} trailing bytes at offset {}", len, offset))]
    TrailingBytes
    {
        /// Offset of the first trailing byte.
        offset: usize,
        /// Number of trailing bytes.
        len: usize,
    },

    /// Message nesting deeper than the configured limit.
    #[snafu(display(
        "Nested message at offset {} exceeds the recursion limit of {}",
        offset,
        limit
    ))]
    RecursionLimitExceeded
    {
        /// Offset of the nested message field.
        offset: usize,
        /// Configured limit.
        limit: u32,
    },

    /// Input buffer larger than the configured maximum.
    #[snafu(display("Input of {} bytes exceeds the limit of {} bytes", len, limit))]
    InputTooLarge
    {
        /// Input length.
        len: usize,
        /// Configured limit.
        limit: usize,
    },
}

/// Error category without the diagnostic details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ErrorKind
{
    Truncated,
    InvalidTag,
    VarintOverlong,
    NonCanonicalVarint,
    ValueOutOfRange,
    InvalidUtf8,
    UnknownField,
    WireTypeMismatch,
    FieldOutOfOrder,
    DuplicateField,
    ExplicitDefaultValue,
    TrailingBytes,
    RecursionLimitExceeded,
    InputTooLarge,
}

impl DecodeError
{
    /// Category of the error.
    pub fn kind(&self) -> ErrorKind
    {
        match self {
            DecodeError::Truncated { .. } => ErrorKind::Truncated,
            DecodeError::InvalidTag { .. } => ErrorKind::InvalidTag,
            DecodeError::VarintOverlong { .. } => ErrorKind::VarintOverlong,
            DecodeError::NonCanonicalVarint { .. } => ErrorKind::NonCanonicalVarint,
            DecodeError::ValueOutOfRange { .. } => ErrorKind::ValueOutOfRange,
            DecodeError::InvalidUtf8 { .. } => ErrorKind::InvalidUtf8,
            DecodeError::UnknownField { .. } => ErrorKind::UnknownField,
            DecodeError::WireTypeMismatch { .. } => ErrorKind::WireTypeMismatch,
            DecodeError::FieldOutOfOrder { .. } => ErrorKind::FieldOutOfOrder,
            DecodeError::DuplicateField { .. } => ErrorKind::DuplicateField,
            DecodeError::ExplicitDefaultValue { .. } => ErrorKind::ExplicitDefaultValue,
            DecodeError::TrailingBytes { .. } => ErrorKind::TrailingBytes,
            DecodeError::RecursionLimitExceeded { .. } => ErrorKind::RecursionLimitExceeded,
            DecodeError::InputTooLarge { .. } => ErrorKind::InputTooLarge,
        }
    }

    /// Offset in the top level buffer where the error was detected.
    pub fn offset(&self) -> usize
    {
        match *self {
            DecodeError::Truncated { offset }
            | DecodeError::InvalidTag { offset, .. }
            | DecodeError::VarintOverlong { offset }
            | DecodeError::NonCanonicalVarint { offset }
            | DecodeError::ValueOutOfRange { offset, .. }
            | DecodeError::InvalidUtf8 { offset, .. }
            | DecodeError::UnknownField { offset, .. }
            | DecodeError::WireTypeMismatch { offset, .. }
            | DecodeError::FieldOutOfOrder { offset, .. }
            | DecodeError::DuplicateField { offset, .. }
            | DecodeError::ExplicitDefaultValue { offset, .. }
            | DecodeError::TrailingBytes { offset, .. }
            | DecodeError::RecursionLimitExceeded { offset, .. } => offset,
            DecodeError::InputTooLarge { .. } => 0,
        }
    }
}

//! Strict protocol buffer binary payload decoding.
//!
//! The decoding functionality can be accessed by building a decoding context and acquiring a
//! message or message reference. See the example in the [crate root](crate).
//!
//! A payload is accepted only when it is the canonical encoding of its value. Any deviation aborts
//! the decode with a [`DecodeError`] and no partial value is returned.

use crate::context::*;
use crate::error::DecodeError;
use crate::validate::FieldValidator;
use crate::wire::WireReader;
use bytes::Bytes;

/// Default maximum depth of nested messages.
pub const RECURSION_LIMIT: u32 = 100;

/// Upper bound for a configured recursion limit.
pub const MAX_RECURSION_LIMIT: u32 = 500;

/// Decoded protocol buffer value.
#[derive(Debug, PartialEq, Clone)]
pub enum Value
{
    /// `double` value.
    Double(f64),
    /// `float` value.
    Float(f32),
    /// `int32` value.
    Int32(i32),
    /// `int64` value.
    Int64(i64),
    /// `uint32` value.
    UInt32(u32),
    /// `uint64` value.
    UInt64(u64),
    /// `sint32` value.
    SInt32(i32),
    /// `sint64` value.
    SInt64(i64),
    /// `fixed32` value.
    Fixed32(u32),
    /// `fixed64` value.
    Fixed64(u64),
    /// `sfixed32` value.
    SFixed32(i32),
    /// `sfixed64` value.
    SFixed64(i64),
    /// `bool` value.
    Bool(bool),
    /// `string` value.
    String(String),
    /// `bytes` value.
    Bytes(Bytes),

    /// Elements of an unpacked repeated field in wire order.
    Repeated(Vec<Value>),

    /// A repeated packed value.
    Packed(PackedArray),

    /// Message type value.
    Message(Box<MessageValue>),

    /// Enum type value.
    Enum(EnumValue),
}

/// Packed scalar fields.
#[derive(Debug, PartialEq, Clone)]
pub enum PackedArray
{
    /// `double` value.
    Double(Vec<f64>),
    /// `float` value.
    Float(Vec<f32>),
    /// `int32` value.
    Int32(Vec<i32>),
    /// `int64` value.
    Int64(Vec<i64>),
    /// `uint32` value.
    UInt32(Vec<u32>),
    /// `uint64` value.
    UInt64(Vec<u64>),
    /// `sint32` value.
    SInt32(Vec<i32>),
    /// `sint64` value.
    SInt64(Vec<i64>),
    /// `fixed32` value.
    Fixed32(Vec<u32>),
    /// `fixed64` value.
    Fixed64(Vec<u64>),
    /// `sfixed32` value.
    SFixed32(Vec<i32>),
    /// `sfixed64` value.
    SFixed64(Vec<i64>),
    /// `bool` value.
    Bool(Vec<bool>),
    /// Enum value.
    Enum(Vec<EnumValue>),
}

/// Enum value.
///
/// Enums are open: any `int32` is accepted whether or not the enum defines a name for it.
#[derive(Debug, PartialEq, Clone)]
pub struct EnumValue
{
    /// Reference to the enum type.
    pub enum_ref: EnumRef,

    /// Value.
    pub value: i32,
}

/// Message value.
#[derive(Debug, PartialEq, Clone)]
pub struct MessageValue
{
    /// Reference to the message type.
    pub msg_ref: MessageRef,

    /// Populated fields in ascending field number order.
    pub fields: Vec<FieldValue>,
}

/// Field value.
#[derive(Debug, PartialEq, Clone)]
pub struct FieldValue
{
    /// Field number.
    pub number: u64,

    /// Field value.
    pub value: Value,
}

/// Decoder limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions
{
    /// Maximum nesting depth of messages below the top level message.
    pub recursion_limit: u32,

    /// Maximum accepted size of the top level buffer.
    pub max_input_len: Option<usize>,
}

impl Default for DecodeOptions
{
    fn default() -> Self
    {
        DecodeOptions {
            recursion_limit: RECURSION_LIMIT,
            max_input_len: None,
        }
    }
}

impl DecodeOptions
{
    /// Options with the default limits.
    pub fn new() -> Self
    {
        Default::default()
    }

    /// Set the maximum message nesting depth.
    ///
    /// Each nesting level is a native stack frame of the decoder, so the limit must stay within
    /// the stack available to the decoding thread. Limits above `MAX_RECURSION_LIMIT` are clamped.
    pub fn with_recursion_limit(mut self, limit: u32) -> Self
    {
        self.recursion_limit = limit.min(MAX_RECURSION_LIMIT);
        self
    }

    /// Set the maximum input size in bytes.
    pub fn with_max_input_len(mut self, limit: usize) -> Self
    {
        self.max_input_len = Some(limit);
        self
    }
}

impl Value
{
    /// True, if the value equals the proto3 default of its type.
    ///
    /// Floating point values are defaults only when all bits are zero so `-0.0` is not a
    /// default. Messages are never defaults: an empty message still marks its field present.
    pub fn is_default(&self) -> bool
    {
        match self {
            Value::Double(v) => v.to_bits() == 0,
            Value::Float(v) => v.to_bits() == 0,
            Value::Int32(v) => *v == 0,
            Value::Int64(v) => *v == 0,
            Value::UInt32(v) => *v == 0,
            Value::UInt64(v) => *v == 0,
            Value::SInt32(v) => *v == 0,
            Value::SInt64(v) => *v == 0,
            Value::Fixed32(v) => *v == 0,
            Value::Fixed64(v) => *v == 0,
            Value::SFixed32(v) => *v == 0,
            Value::SFixed64(v) => *v == 0,
            Value::Bool(v) => !*v,
            Value::String(v) => v.is_empty(),
            Value::Bytes(v) => v.is_empty(),
            Value::Repeated(v) => v.is_empty(),
            Value::Packed(v) => v.is_empty(),
            Value::Message(..) => false,
            Value::Enum(v) => v.value == 0,
        }
    }
}

impl PackedArray
{
    /// Number of elements.
    pub fn len(&self) -> usize
    {
        match self {
            PackedArray::Double(v) => v.len(),
            PackedArray::Float(v) => v.len(),
            PackedArray::Int32(v) => v.len(),
            PackedArray::Int64(v) => v.len(),
            PackedArray::UInt32(v) => v.len(),
            PackedArray::UInt64(v) => v.len(),
            PackedArray::SInt32(v) => v.len(),
            PackedArray::SInt64(v) => v.len(),
            PackedArray::Fixed32(v) => v.len(),
            PackedArray::Fixed64(v) => v.len(),
            PackedArray::SFixed32(v) => v.len(),
            PackedArray::SFixed64(v) => v.len(),
            PackedArray::Bool(v) => v.len(),
            PackedArray::Enum(v) => v.len(),
        }
    }

    /// True, if the array has no elements.
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}

impl MessageValue
{
    /// Gets the value of a populated field.
    pub fn get_field(&self, number: u64) -> Option<&Value>
    {
        self.fields
            .binary_search_by_key(&number, |f| f.number)
            .ok()
            .map(|idx| &self.fields[idx].value)
    }

    fn record(&mut self, field: &MessageField, value: Value)
    {
        if field.is_repeated() {
            if let Some(FieldValue {
                number,
                value: Value::Repeated(elements),
            }) = self.fields.last_mut()
            {
                if *number == field.number {
                    elements.push(value);
                    return;
                }
            }

            self.fields.push(FieldValue {
                number: field.number,
                value: Value::Repeated(vec![value]),
            });
            return;
        }

        self.fields.push(FieldValue {
            number: field.number,
            value,
        });
    }
}

/// State shared by every message level of a single decode call.
struct MessageDecoder<'a>
{
    ctx: &'a Context,
    options: &'a DecodeOptions,
}

impl<'a> MessageDecoder<'a>
{
    fn decode_message(
        &self,
        info: &MessageInfo,
        reader: &mut WireReader,
        depth: u32,
    ) -> Result<MessageValue, DecodeError>
    {
        let mut msg = MessageValue {
            msg_ref: info.self_ref,
            fields: vec![],
        };
        let mut validator = FieldValidator::new();

        while !reader.is_empty() {
            let offset = reader.offset();

            // A header cut short by the end of the level isn't a field at all.
            let tag = match reader.read_tag() {
                Ok(tag) => tag,
                Err(DecodeError::Truncated { .. }) => {
                    return Err(DecodeError::TrailingBytes {
                        offset,
                        len: reader.remaining(),
                    })
                }
                Err(e) => return Err(e),
            };

            let field = validator.check_occurrence(info, tag, offset)?;
            let value = match field.multiplicity {
                Multiplicity::RepeatedPacked => self.decode_packed(&field.field_type, reader)?,
                Multiplicity::Single | Multiplicity::Repeated => {
                    self.decode_single(field, reader, depth, offset)?
                }
            };
            validator.check_value(field, &value, offset)?;

            tracing::trace!(
                message_type = %info.full_name,
                number = field.number,
                offset,
                "decoded field"
            );
            msg.record(field, value);
        }

        Ok(msg)
    }

    fn decode_single(
        &self,
        field: &MessageField,
        reader: &mut WireReader,
        depth: u32,
        offset: usize,
    ) -> Result<Value, DecodeError>
    {
        Ok(match &field.field_type {
            ValueType::Double => Value::Double(f64::from_bits(reader.read_fixed64()?)),
            ValueType::Float => Value::Float(f32::from_bits(reader.read_fixed32()?)),
            ValueType::Int32 => Value::Int32(reader.read_int32()?),
            ValueType::Int64 => Value::Int64(reader.read_int64()?),
            ValueType::UInt32 => Value::UInt32(reader.read_uint32()?),
            ValueType::UInt64 => Value::UInt64(reader.read_uint64()?),
            ValueType::SInt32 => Value::SInt32(reader.read_zigzag32()?),
            ValueType::SInt64 => Value::SInt64(reader.read_zigzag64()?),
            ValueType::Fixed32 => Value::Fixed32(reader.read_fixed32()?),
            ValueType::Fixed64 => Value::Fixed64(reader.read_fixed64()?),
            ValueType::SFixed32 => Value::SFixed32(reader.read_fixed32()? as i32),
            ValueType::SFixed64 => Value::SFixed64(reader.read_fixed64()? as i64),
            ValueType::Bool => Value::Bool(reader.read_bool()?),
            ValueType::String => {
                let payload = reader.read_length_delimited()?;
                let s = std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8 {
                    offset,
                    number: field.number,
                })?;
                Value::String(s.to_string())
            }
            ValueType::Bytes => Value::Bytes(Bytes::copy_from_slice(
                reader.read_length_delimited()?,
            )),
            ValueType::Enum(eref) => Value::Enum(EnumValue {
                enum_ref: *eref,
                value: reader.read_int32()?,
            }),
            ValueType::Message(mref) => {
                let limit = self.options.recursion_limit.min(MAX_RECURSION_LIMIT);
                if depth >= limit {
                    return Err(DecodeError::RecursionLimitExceeded { offset, limit });
                }

                let mut nested = reader.read_nested()?;
                let info = self.ctx.resolve_message(*mref);
                Value::Message(Box::new(self.decode_message(info, &mut nested, depth + 1)?))
            }
        })
    }

    fn decode_packed(&self, vt: &ValueType, reader: &mut WireReader) -> Result<Value, DecodeError>
    {
        let mut array = reader.read_nested()?;

        // Every packed type is a run of the same primitive read until the payload is exhausted.
        // A partial element at the end of the payload fails the read.
        macro_rules! read_packed {
            ($variant:ident @ $val:ident = $try_read:expr => $insert:expr ) => {{
                let mut output = vec![];
                while !array.is_empty() {
                    let $val = $try_read?;
                    output.push($insert);
                }
                PackedArray::$variant(output)
            }};
        }

        let packed = match vt {
            ValueType::Double => {
                read_packed! { Double @ b = array.read_fixed64() => f64::from_bits(b) }
            }
            ValueType::Float => {
                read_packed! { Float @ b = array.read_fixed32() => f32::from_bits(b) }
            }
            ValueType::Int32 => read_packed! { Int32 @ b = array.read_int32() => b },
            ValueType::Int64 => read_packed! { Int64 @ b = array.read_int64() => b },
            ValueType::UInt32 => read_packed! { UInt32 @ b = array.read_uint32() => b },
            ValueType::UInt64 => read_packed! { UInt64 @ b = array.read_uint64() => b },
            ValueType::SInt32 => read_packed! { SInt32 @ b = array.read_zigzag32() => b },
            ValueType::SInt64 => read_packed! { SInt64 @ b = array.read_zigzag64() => b },
            ValueType::Fixed32 => read_packed! { Fixed32 @ b = array.read_fixed32() => b },
            ValueType::Fixed64 => read_packed! { Fixed64 @ b = array.read_fixed64() => b },
            ValueType::SFixed32 => {
                read_packed! { SFixed32 @ b = array.read_fixed32() => b as i32 }
            }
            ValueType::SFixed64 => {
                read_packed! { SFixed64 @ b = array.read_fixed64() => b as i64 }
            }
            ValueType::Bool => read_packed! { Bool @ b = array.read_bool() => b },
            ValueType::Enum(eref) => read_packed! { Enum @ b = array.read_int32() => EnumValue {
                enum_ref: *eref,
                value: b,
            } },

            // Descriptors refuse packed multiplicity for these when the field is added.
            ValueType::String | ValueType::Bytes | ValueType::Message(..) => {
                unreachable!("Non-scalar type was handled as packed")
            }
        };

        Ok(Value::Packed(packed))
    }
}

impl MessageRef
{
    /// Decode a message with the default options.
    ///
    /// Will **panic** if the message defined by the `MessageRef` does not exist in this context.
    /// Such panic means the `MessageRef` came from a different context. The panic is not
    /// guaranteed, as a message with an equal `MessageRef` may exist in multiple contexts.
    pub fn decode(self, data: &[u8], ctx: &Context) -> Result<MessageValue, DecodeError>
    {
        ctx.resolve_message(self).decode(data, ctx)
    }
}

impl MessageInfo
{
    /// Decode a message with the default options.
    ///
    /// Returns the decoded value only if `data` is the canonical encoding of it.
    pub fn decode(&self, data: &[u8], ctx: &Context) -> Result<MessageValue, DecodeError>
    {
        self.decode_with(data, ctx, &DecodeOptions::default())
    }

    /// Decode a message with explicit limits.
    pub fn decode_with(
        &self,
        data: &[u8],
        ctx: &Context,
        options: &DecodeOptions,
    ) -> Result<MessageValue, DecodeError>
    {
        let result = self.decode_strict(data, ctx, options);
        if let Err(e) = &result {
            tracing::debug!(
                message_type = %self.full_name,
                kind = ?e.kind(),
                reason = %e,
                "rejected payload"
            );
        }

        result
    }

    /// Decodes the payload, discarding the reason of a rejection.
    pub fn accept(&self, data: &[u8], ctx: &Context) -> Option<MessageValue>
    {
        self.decode(data, ctx).ok()
    }

    fn decode_strict(
        &self,
        data: &[u8],
        ctx: &Context,
        options: &DecodeOptions,
    ) -> Result<MessageValue, DecodeError>
    {
        if let Some(limit) = options.max_input_len {
            if data.len() > limit {
                return Err(DecodeError::InputTooLarge {
                    len: data.len(),
                    limit,
                });
            }
        }

        let mut reader = WireReader::new(data);
        let decoder = MessageDecoder { ctx, options };
        let value = decoder.decode_message(self, &mut reader, 0)?;

        if !reader.is_empty() {
            return Err(DecodeError::TrailingBytes {
                offset: reader.offset(),
                len: reader.remaining(),
            });
        }

        Ok(value)
    }
}

#![allow(dead_code)]

use bytes::{BufMut, Bytes, BytesMut};
use protostrict::decode::{PackedArray, Value};
use protostrict::MessageValue;

/// Schema covering every field type both singular and repeated.
pub const ALL_FEATURES: &str = r#"
    syntax = "proto3";

    enum OtherEnum {
        UNSPECIFIED = 0;
        ONE = 1;
        TWO = 2;
    }

    message OtherMessage {
        uint64 other_field = 1;
    }

    message Message {
        int32 optional_int32 = 1;
        int64 optional_int64 = 2;
        uint32 optional_uint32 = 3;
        uint64 optional_uint64 = 4;
        sint32 optional_sint32 = 5;
        sint64 optional_sint64 = 6;
        fixed32 optional_fixed32 = 7;
        fixed64 optional_fixed64 = 8;
        sfixed32 optional_sfixed32 = 9;
        sfixed64 optional_sfixed64 = 10;
        bool optional_bool = 11;
        string optional_string = 12;
        bytes optional_bytes = 13;
        OtherEnum optional_enum = 14;
        OtherMessage optional_message = 15;

        repeated int32 repeated_int32 = 16;
        repeated int64 repeated_int64 = 17;
        repeated uint32 repeated_uint32 = 18;
        repeated uint64 repeated_uint64 = 19;
        repeated sint32 repeated_sint32 = 20;
        repeated sint64 repeated_sint64 = 21;
        repeated fixed32 repeated_fixed32 = 22;
        repeated fixed64 repeated_fixed64 = 23;
        repeated sfixed32 repeated_sfixed32 = 24;
        repeated sfixed64 repeated_sfixed64 = 25;
        repeated bool repeated_bool = 26;
        repeated OtherEnum repeated_enum = 27;
        repeated OtherMessage repeated_message = 28;
        repeated string repeated_string = 29;

        float optional_float = 30;
        double optional_double = 31;
    }
"#;

/// Encodes a message value the way a canonical encoder would.
///
/// The value is written exactly as given: field order and default values are not checked, which
/// allows building payloads that break the canonical rules.
pub fn encode(msg: &MessageValue) -> Bytes
{
    let mut out = BytesMut::new();
    for field in &msg.fields {
        match &field.value {
            Value::Repeated(elements) => {
                for element in elements {
                    encode_field(&mut out, field.number, element);
                }
            }
            value => encode_field(&mut out, field.number, value),
        }
    }
    out.freeze()
}

pub fn encode_field(out: &mut BytesMut, number: u64, value: &Value)
{
    match value {
        Value::Double(v) => {
            put_tag(out, number, 1);
            out.put_f64_le(*v);
        }
        Value::Float(v) => {
            put_tag(out, number, 5);
            out.put_f32_le(*v);
        }
        Value::Fixed64(v) => {
            put_tag(out, number, 1);
            out.put_u64_le(*v);
        }
        Value::SFixed64(v) => {
            put_tag(out, number, 1);
            out.put_i64_le(*v);
        }
        Value::Fixed32(v) => {
            put_tag(out, number, 5);
            out.put_u32_le(*v);
        }
        Value::SFixed32(v) => {
            put_tag(out, number, 5);
            out.put_i32_le(*v);
        }
        Value::String(s) => put_length_delimited(out, number, s.as_bytes()),
        Value::Bytes(b) => put_length_delimited(out, number, b),
        Value::Message(m) => put_length_delimited(out, number, &encode(m)),
        Value::Packed(array) => {
            let mut payload = BytesMut::new();
            put_packed(&mut payload, array);
            put_length_delimited(out, number, &payload);
        }
        Value::Repeated(elements) => {
            for element in elements {
                encode_field(out, number, element);
            }
        }
        scalar => {
            put_tag(out, number, 0);
            put_varint(out, varint_payload(scalar));
        }
    }
}

fn varint_payload(value: &Value) -> u64
{
    match value {
        Value::Int32(v) => *v as i64 as u64,
        Value::Int64(v) => *v as u64,
        Value::UInt32(v) => u64::from(*v),
        Value::UInt64(v) => *v,
        Value::SInt32(v) => u64::from(((v << 1) ^ (v >> 31)) as u32),
        Value::SInt64(v) => ((v << 1) ^ (v >> 63)) as u64,
        Value::Bool(v) => *v as u64,
        Value::Enum(e) => e.value as i64 as u64,
        other => panic!("Not a varint value: {:?}", other),
    }
}

fn put_packed(out: &mut BytesMut, array: &PackedArray)
{
    match array {
        PackedArray::Double(v) => v.iter().for_each(|x| out.put_f64_le(*x)),
        PackedArray::Float(v) => v.iter().for_each(|x| out.put_f32_le(*x)),
        PackedArray::Fixed64(v) => v.iter().for_each(|x| out.put_u64_le(*x)),
        PackedArray::SFixed64(v) => v.iter().for_each(|x| out.put_i64_le(*x)),
        PackedArray::Fixed32(v) => v.iter().for_each(|x| out.put_u32_le(*x)),
        PackedArray::SFixed32(v) => v.iter().for_each(|x| out.put_i32_le(*x)),
        PackedArray::Int32(v) => v
            .iter()
            .for_each(|x| put_varint(out, varint_payload(&Value::Int32(*x)))),
        PackedArray::Int64(v) => v
            .iter()
            .for_each(|x| put_varint(out, varint_payload(&Value::Int64(*x)))),
        PackedArray::UInt32(v) => v.iter().for_each(|x| put_varint(out, u64::from(*x))),
        PackedArray::UInt64(v) => v.iter().for_each(|x| put_varint(out, *x)),
        PackedArray::SInt32(v) => v
            .iter()
            .for_each(|x| put_varint(out, varint_payload(&Value::SInt32(*x)))),
        PackedArray::SInt64(v) => v
            .iter()
            .for_each(|x| put_varint(out, varint_payload(&Value::SInt64(*x)))),
        PackedArray::Bool(v) => v.iter().for_each(|x| put_varint(out, *x as u64)),
        PackedArray::Enum(v) => v
            .iter()
            .for_each(|x| put_varint(out, x.value as i64 as u64)),
    }
}

pub fn put_tag(out: &mut BytesMut, number: u64, wire_type: u8)
{
    put_varint(out, number << 3 | u64::from(wire_type));
}

pub fn put_varint(out: &mut BytesMut, mut value: u64)
{
    while value >= 0x80 {
        out.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.put_u8(value as u8);
}

pub fn put_length_delimited(out: &mut BytesMut, number: u64, payload: &[u8])
{
    put_tag(out, number, 2);
    put_varint(out, payload.len() as u64);
    out.put_slice(payload);
}

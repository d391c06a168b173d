//! Schema descriptors built from the proto-files.
//!
//! A [`Context`] holds the descriptor tables of every message and enum. It is built once, either
//! by [parsing](Context::parse) `.proto` sources or by inserting hand built descriptors, and is
//! read-only afterwards. The decoder only ever sees the built tables.

use bytes::Bytes;
use snafu::Snafu;
use std::collections::{BTreeMap, HashMap};

mod api;
mod builder;
mod modify_api;
mod parse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InternalRef(usize);

/// A reference to a message. Can be resolved to `MessageInfo` through a `Context`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(InternalRef);

/// A reference to an enum. Can be resolved to `EnumInfo` through a `Context`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumRef(InternalRef);

/// Schema error.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum ParseError
{
    /// Syntax error in the input files.
    #[snafu(display("Parsing error: {}", source))]
    SyntaxError
    {
        /// Source error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Duplicate type.
    #[snafu(display("Duplicate type: {}", name))]
    DuplicateType
    {
        /// Type.
        name: String,
    },

    /// Unknown type reference.
    #[snafu(display("Unknown type '{}' in '{}'", name, context))]
    TypeNotFound
    {
        /// Type name.
        name: String,
        /// Type that referred to the unknown type.
        context: String,
    },

    /// Numeric literal that doesn't fit its target.
    #[snafu(display("Invalid literal '{}'", literal))]
    InvalidLiteral
    {
        /// Literal as written in the source.
        literal: String,
    },

    /// A field or enum value that could not be added to its type.
    #[snafu(display("Invalid member in '{}': {}", type_name, source))]
    InvalidMember
    {
        /// Full name of the type.
        type_name: String,
        /// Source error.
        source: MemberInsertError,
    },
}

/// Error inserting a type into the context.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum InsertError
{
    /// A type conflicts with an existing type.
    #[snafu(display("Type already exists: {:?}", original))]
    TypeExists
    {
        /// The previous type that conflicts with the new one.
        original: TypeRef,
    },
}

/// Error inserting a field into a message or a value into an enum.
#[derive(Debug, PartialEq, Snafu)]
#[non_exhaustive]
pub enum MemberInsertError
{
    /// The number or value is already used.
    #[snafu(display("Number {} is already in use", number))]
    NumberConflict
    {
        /// Conflicting number.
        number: i64,
    },

    /// The name is already used.
    #[snafu(display("Name '{}' is already in use", name))]
    NameConflict
    {
        /// Conflicting name.
        name: String,
    },

    /// Field number outside the valid range.
    #[snafu(display("Invalid field number {}", number))]
    InvalidNumber
    {
        /// Field number.
        number: u64,
    },

    /// Packed multiplicity on a field type that cannot be packed.
    #[snafu(display("Field {} cannot be packed", number))]
    NotPackable
    {
        /// Field number.
        number: u64,
    },
}

/// Reference to a message or an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef
{
    /// Message reference.
    Message(MessageRef),

    /// Enum reference.
    Enum(EnumRef),
}

/// Protostrict schema context.
///
/// Contains the descriptor tables required for decoding messages. The context is immutable once
/// shared, so a single instance may be used from any number of threads.
#[derive(Default, Debug, PartialEq)]
pub struct Context
{
    types: Vec<TypeInfo>,
    types_by_name: HashMap<String, usize>,
}

/// Message or enum type.
#[derive(Debug, PartialEq)]
pub enum TypeInfo
{
    /// Message.
    Message(MessageInfo),

    /// Enum.
    Enum(EnumInfo),
}

/// Message descriptor.
#[derive(Debug, PartialEq)]
pub struct MessageInfo
{
    /// Message name.
    pub name: String,

    /// Full message name, including package and parent type names.
    pub full_name: String,

    /// `MessageRef` that references this message.
    pub self_ref: MessageRef,

    fields: BTreeMap<u64, MessageField>,
    fields_by_name: BTreeMap<String, u64>,
}

/// Enum descriptor.
#[derive(Debug, PartialEq)]
pub struct EnumInfo
{
    /// Enum name.
    pub name: String,

    /// Full enum name, including package and parent type names.
    pub full_name: String,

    /// `EnumRef` that references this enum.
    pub self_ref: EnumRef,

    fields_by_value: BTreeMap<i64, EnumField>,
    fields_by_name: BTreeMap<String, i64>,
}

/// Field descriptor.
#[derive(Debug, PartialEq, Clone)]
pub struct MessageField
{
    /// Field name.
    pub name: String,

    /// Field number.
    pub number: u64,

    /// Field type
    pub field_type: ValueType,

    /// Whether the field is singular, repeated or packed.
    pub multiplicity: Multiplicity,

    /// Field options.
    pub options: Vec<ProtoOption>,
}

/// Defines the multiplicity of the field values.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Multiplicity
{
    /// Field is not repeated.
    Single,

    /// Field may be repeated. Each value is a separate occurrence on the wire.
    Repeated,

    /// Field is repeated by packing all values into a single occurrence.
    RepeatedPacked,
}

/// Enum field details.
#[derive(Debug, PartialEq, Clone)]
pub struct EnumField
{
    /// Enum field name.
    pub name: String,

    /// Enum field value.
    pub value: i64,
}

/// Field value types.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueType
{
    /// `double`
    Double,

    /// `float`
    Float,

    /// `int32`
    Int32,

    /// `int64`
    Int64,

    /// `uint32`
    UInt32,

    /// `uint64`
    UInt64,

    /// `sint32`
    SInt32,

    /// `sint64`
    SInt64,

    /// `fixed32`
    Fixed32,

    /// `fixed64`
    Fixed64,

    /// `sfixed32`
    SFixed32,

    /// `sfixed64`
    SFixed64,

    /// `bool`
    Bool,

    /// `string`
    String,

    /// `bytes`
    Bytes,

    /// A message type.
    Message(MessageRef),

    /// An enum type.
    Enum(EnumRef),
}

/// A single option.
#[derive(Debug, PartialEq, Clone)]
pub struct ProtoOption
{
    /// Option name.
    pub name: String,

    /// Option value.
    pub value: Constant,
}

/// Constant value, used for options.
#[derive(Debug, PartialEq, Clone)]
pub enum Constant
{
    /// An ident `foo.bar.baz`.
    Ident(String),

    /// An integer constant.
    Integer(i64),

    /// A floating point constant.
    Float(f64),

    /// A string constant.
    ///
    /// The string isn't guaranteed to be well formed UTF-8 so it's stored as
    /// Bytes here.
    String(Bytes),

    /// A boolean constant.
    Bool(bool),
}

use super::*;
use crate::wire::WireType;

impl Context
{
    /// Create a new context.
    pub fn new() -> Self
    {
        Default::default()
    }

    /// Gets type info by name.
    pub fn get_type(&self, full_name: &str) -> Option<&TypeInfo>
    {
        self.types_by_name
            .get(full_name)
            .map(|idx| &self.types[*idx])
    }

    /// Gets a message type info by name.
    pub fn get_message(&self, full_name: &str) -> Option<&MessageInfo>
    {
        match self.get_type(full_name) {
            Some(TypeInfo::Message(m)) => Some(m),
            _ => None,
        }
    }

    /// Gets an enum type info by name.
    pub fn get_enum(&self, full_name: &str) -> Option<&EnumInfo>
    {
        match self.get_type(full_name) {
            Some(TypeInfo::Enum(e)) => Some(e),
            _ => None,
        }
    }

    /// Iterates all types in definition order.
    pub fn iter_types(&self) -> impl Iterator<Item = &TypeInfo>
    {
        self.types.iter()
    }

    fn resolve_type(&self, tr: InternalRef) -> Option<&TypeInfo>
    {
        self.types.get(tr.0)
    }

    /// Resolves a message reference.
    ///
    /// Will **panic** if the message defined by the `MessageRef` does not exist in this context.
    /// Such panic means the `MessageRef` came from a different context. The panic is not
    /// guaranteed, as a message with an equal `MessageRef` may exist in multiple contexts.
    pub fn resolve_message(&self, tr: MessageRef) -> &MessageInfo
    {
        match self.resolve_type(tr.0) {
            Some(TypeInfo::Message(msg)) => msg,
            _ => panic!("Message did not exist in this context"),
        }
    }

    /// Resolves a enum reference.
    ///
    /// Will **panic** if the enum defined by the `EnumRef` does not exist in this context.
    /// Such panic means the `EnumRef` came from a different context. The panic is not
    /// guaranteed, as an enum with an equal `EnumRef` may exist in multiple contexts.
    pub fn resolve_enum(&self, tr: EnumRef) -> &EnumInfo
    {
        match self.resolve_type(tr.0) {
            Some(TypeInfo::Enum(e)) => e,
            _ => panic!("Enum did not exist in this context"),
        }
    }
}

impl TypeInfo
{
    /// Get the name of the type.
    pub fn name(&self) -> &str
    {
        match self {
            TypeInfo::Message(m) => &m.name,
            TypeInfo::Enum(e) => &e.name,
        }
    }

    /// Get the full name of the type.
    pub fn full_name(&self) -> &str
    {
        match self {
            TypeInfo::Message(m) => &m.full_name,
            TypeInfo::Enum(e) => &e.full_name,
        }
    }
}

impl MessageInfo
{
    /// Iterates all message fields in ascending field number order.
    ///
    /// This is the only order in which the fields may appear on the wire.
    pub fn iter_fields(&self) -> impl Iterator<Item = &MessageField>
    {
        self.fields.values()
    }

    /// Get a field by its number.
    pub fn get_field(&self, number: u64) -> Option<&MessageField>
    {
        self.fields.get(&number)
    }

    /// Get a field by its name.
    pub fn get_field_by_name(&self, name: &str) -> Option<&MessageField>
    {
        self.fields_by_name
            .get(name)
            .and_then(|id| self.get_field(*id))
    }
}

impl EnumInfo
{
    /// Iterates all enum fields in ascending value order.
    pub fn iter_fields(&self) -> impl Iterator<Item = &EnumField>
    {
        self.fields_by_value.values()
    }

    /// Gets a field by value.
    pub fn get_field_by_value(&self, value: i64) -> Option<&EnumField>
    {
        self.fields_by_value.get(&value)
    }

    /// Gets a field by name.
    pub fn get_field_by_name(&self, name: &str) -> Option<&EnumField>
    {
        self.fields_by_name
            .get(name)
            .and_then(|v| self.get_field_by_value(*v))
    }
}

impl MessageField
{
    /// Wire type every occurrence of this field must use.
    pub fn wire_type(&self) -> WireType
    {
        match self.multiplicity {
            Multiplicity::RepeatedPacked => WireType::LengthDelimited,
            Multiplicity::Single | Multiplicity::Repeated => self.field_type.wire_type(),
        }
    }

    /// True, if the field may occur several times in a row.
    pub fn is_repeated(&self) -> bool
    {
        self.multiplicity == Multiplicity::Repeated
    }
}

impl ValueType
{
    /// Wire type of a single value of this type.
    pub fn wire_type(&self) -> WireType
    {
        match self {
            Self::Double => WireType::Fixed64,
            Self::Float => WireType::Fixed32,
            Self::Int32 => WireType::Varint,
            Self::Int64 => WireType::Varint,
            Self::UInt32 => WireType::Varint,
            Self::UInt64 => WireType::Varint,
            Self::SInt32 => WireType::Varint,
            Self::SInt64 => WireType::Varint,
            Self::Fixed32 => WireType::Fixed32,
            Self::Fixed64 => WireType::Fixed64,
            Self::SFixed32 => WireType::Fixed32,
            Self::SFixed64 => WireType::Fixed64,
            Self::Bool => WireType::Varint,
            Self::String => WireType::LengthDelimited,
            Self::Bytes => WireType::LengthDelimited,
            Self::Message(..) => WireType::LengthDelimited,
            Self::Enum(..) => WireType::Varint,
        }
    }

    /// True, for the scalar numeric types that may use packed encoding.
    pub fn is_packable(&self) -> bool
    {
        self.wire_type() != WireType::LengthDelimited
    }
}

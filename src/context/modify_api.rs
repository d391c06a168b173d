use super::*;
use crate::wire::MAX_FIELD_NUMBER;
use std::convert::TryFrom;

impl Context
{
    /// Insert a new message definition to the context.
    pub fn insert_message(&mut self, ty: MessageInfo) -> Result<MessageRef, InsertError>
    {
        self.insert_type(TypeInfo::Message(ty)).map(MessageRef)
    }

    /// Insert a new enum definition to the context.
    pub fn insert_enum(&mut self, ty: EnumInfo) -> Result<EnumRef, InsertError>
    {
        self.insert_type(TypeInfo::Enum(ty)).map(EnumRef)
    }

    /// Reference the next inserted message will receive.
    ///
    /// Allows building messages that refer to themselves.
    pub fn next_message_ref(&self) -> MessageRef
    {
        MessageRef(InternalRef(self.types.len()))
    }

    fn insert_type(&mut self, mut ty: TypeInfo) -> Result<InternalRef, InsertError>
    {
        use std::collections::hash_map::Entry;

        // Validate before touching the context so a failure leaves it unchanged.
        let internal_ref = InternalRef(self.types.len());
        let vacant = match self.types_by_name.entry(ty.full_name().to_string()) {
            Entry::Occupied(occupied) => {
                let original_ref = InternalRef(*occupied.get());
                let original = match self.types[original_ref.0] {
                    TypeInfo::Message(..) => TypeRef::Message(MessageRef(original_ref)),
                    TypeInfo::Enum(..) => TypeRef::Enum(EnumRef(original_ref)),
                };
                return Err(InsertError::TypeExists { original });
            }
            Entry::Vacant(vacant) => vacant,
        };

        match &mut ty {
            TypeInfo::Message(m) => m.self_ref = MessageRef(internal_ref),
            TypeInfo::Enum(e) => e.self_ref = EnumRef(internal_ref),
        }

        vacant.insert(internal_ref.0);
        self.types.push(ty);

        Ok(internal_ref)
    }
}

/// Splits `a.b.C` into `C`.
fn short_name(full_name: &str) -> String
{
    full_name.rsplit('.').next().unwrap_or(full_name).to_string()
}

impl MessageInfo
{
    /// Create a new message info.
    ///
    /// The `self_ref` is not valid before the message is inserted into a [`Context`].
    pub fn new(full_name: String) -> Self
    {
        MessageInfo {
            name: short_name(&full_name),
            full_name,
            self_ref: MessageRef(InternalRef(0)),
            fields: BTreeMap::new(),
            fields_by_name: BTreeMap::new(),
        }
    }

    /// Add a field to the type.
    pub fn add_field(&mut self, field: MessageField) -> Result<(), MemberInsertError>
    {
        use std::collections::btree_map::Entry;

        let num = field.number;
        if num == 0 || num > MAX_FIELD_NUMBER {
            return Err(MemberInsertError::InvalidNumber { number: num });
        }

        if field.multiplicity == Multiplicity::RepeatedPacked && !field.field_type.is_packable() {
            return Err(MemberInsertError::NotPackable { number: num });
        }

        let num_entry = self.fields.entry(num);
        let name_entry = self.fields_by_name.entry(field.name.to_string());

        let (vacant_num, vacant_name) = match (num_entry, name_entry) {
            (Entry::Occupied(..), _) => {
                return Err(MemberInsertError::NumberConflict {
                    number: num as i64,
                })
            }
            (_, Entry::Occupied(..)) => {
                return Err(MemberInsertError::NameConflict { name: field.name })
            }
            (Entry::Vacant(num), Entry::Vacant(name)) => (num, name),
        };

        vacant_num.insert(field);
        vacant_name.insert(num);

        Ok(())
    }
}

impl MessageField
{
    /// Create a new singular message field.
    pub fn new(name: String, number: u64, field_type: ValueType) -> Self
    {
        Self {
            name,
            number,
            field_type,
            multiplicity: Multiplicity::Single,
            options: vec![],
        }
    }

    /// Create a new field with the given multiplicity.
    pub fn with_multiplicity(mut self, multiplicity: Multiplicity) -> Self
    {
        self.multiplicity = multiplicity;
        self
    }
}

impl EnumInfo
{
    /// Create a new enum info.
    ///
    /// The `self_ref` is not valid before the enum is inserted into a [`Context`].
    pub fn new(full_name: String) -> Self
    {
        Self {
            name: short_name(&full_name),
            full_name,
            self_ref: EnumRef(InternalRef(0)),
            fields_by_value: BTreeMap::new(),
            fields_by_name: BTreeMap::new(),
        }
    }

    /// Add a field to the enum definition.
    ///
    /// Aliases are not supported: every value may be used once.
    pub fn add_field(&mut self, field: EnumField) -> Result<(), MemberInsertError>
    {
        use std::collections::btree_map::Entry;

        // Enum values travel as int32 on the wire.
        if i32::try_from(field.value).is_err() {
            return Err(MemberInsertError::InvalidNumber {
                number: field.value as u64,
            });
        }

        let value = field.value;
        let value_entry = self.fields_by_value.entry(value);
        let name_entry = self.fields_by_name.entry(field.name.to_string());

        let (vacant_value, vacant_name) = match (value_entry, name_entry) {
            (Entry::Occupied(..), _) => return Err(MemberInsertError::NumberConflict { number: value }),
            (_, Entry::Occupied(..)) => {
                return Err(MemberInsertError::NameConflict { name: field.name })
            }
            (Entry::Vacant(value), Entry::Vacant(name)) => (value, name),
        };

        vacant_value.insert(field);
        vacant_name.insert(value);

        Ok(())
    }
}

impl EnumField
{
    /// Create a new enum field.
    pub fn new(name: String, value: i64) -> Self
    {
        Self { name, value }
    }
}

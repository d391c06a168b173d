use snafu::ResultExt;
use std::borrow::Cow;
use std::collections::BTreeMap;

use super::*;

#[derive(Default)]
pub(crate) struct ContextBuilder
{
    pub(crate) packages: Vec<PackageBuilder>,
}

#[derive(Default, Debug, PartialEq)]
pub(crate) struct PackageBuilder
{
    pub(crate) name: Option<String>,
    pub(crate) types: Vec<ProtobufTypeBuilder>,
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) enum ProtobufTypeBuilder
{
    Message(MessageBuilder),
    Enum(EnumBuilder),
}

#[derive(Default, Debug, PartialEq, Clone)]
pub(crate) struct MessageBuilder
{
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldBuilder>,
    pub(crate) inner_types: Vec<ProtobufTypeBuilder>,
}

#[derive(Default, Debug, PartialEq, Clone)]
pub(crate) struct EnumBuilder
{
    pub(crate) name: String,
    pub(crate) fields: Vec<EnumField>,
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) struct FieldBuilder
{
    pub(crate) repeated: bool,
    pub(crate) field_type: FieldTypeBuilder,
    pub(crate) name: String,
    pub(crate) number: u64,
    pub(crate) options: Vec<ProtoOption>,
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) enum FieldTypeBuilder
{
    Builtin(ValueType),
    Unknown(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum ItemType
{
    Message,
    Enum,
}

/// A type lifted out of its parent, with the fully qualified name it was defined under.
struct FlatType
{
    full_name: String,
    ty: ProtobufTypeBuilder,
}

impl ContextBuilder
{
    pub fn build(self) -> Result<Context, ParseError>
    {
        // Nested types are flattened in definition order. The position of a type in the flat
        // list is the index it will have in the context, which lets field types be resolved
        // before the referenced type is built.
        let mut flat = vec![];
        for package in self.packages {
            let path: Vec<String> = match &package.name {
                Some(name) => name.split('.').map(str::to_string).collect(),
                None => vec![],
            };
            for ty in package.types {
                ty.flatten(&mut path.clone(), &mut flat);
            }
        }

        let mut cache = BuildCache::default();
        for (idx, t) in flat.iter().enumerate() {
            let item_type = match t.ty {
                ProtobufTypeBuilder::Message(..) => ItemType::Message,
                ProtobufTypeBuilder::Enum(..) => ItemType::Enum,
            };
            if cache
                .items
                .insert(t.full_name.clone(), (item_type, idx))
                .is_some()
            {
                return Err(ParseError::DuplicateType {
                    name: t.full_name.clone(),
                });
            }
        }

        let mut context = Context::new();
        for FlatType { full_name, ty } in flat {
            let inserted = match ty {
                ProtobufTypeBuilder::Message(m) => {
                    let info = m.build(full_name.clone(), &cache)?;
                    context.insert_message(info).map(|_| ())
                }
                ProtobufTypeBuilder::Enum(e) => {
                    let info = e.build(full_name.clone())?;
                    context.insert_enum(info).map(|_| ())
                }
            };

            if inserted.is_err() {
                return Err(ParseError::DuplicateType { name: full_name });
            }
        }

        tracing::debug!(types = context.types.len(), "built schema context");
        Ok(context)
    }
}

impl ProtobufTypeBuilder
{
    fn name(&self) -> &str
    {
        match self {
            ProtobufTypeBuilder::Message(m) => &m.name,
            ProtobufTypeBuilder::Enum(e) => &e.name,
        }
    }

    fn flatten(self, path: &mut Vec<String>, out: &mut Vec<FlatType>)
    {
        path.push(self.name().to_string());
        let full_name = path.join(".");
        match self {
            ProtobufTypeBuilder::Message(mut m) => {
                let inner_types = std::mem::take(&mut m.inner_types);
                out.push(FlatType {
                    full_name,
                    ty: ProtobufTypeBuilder::Message(m),
                });
                for inner in inner_types {
                    inner.flatten(path, out);
                }
            }
            ProtobufTypeBuilder::Enum(e) => out.push(FlatType {
                full_name,
                ty: ProtobufTypeBuilder::Enum(e),
            }),
        }
        path.pop();
    }
}

impl MessageBuilder
{
    fn build(self, full_name: String, cache: &BuildCache) -> Result<MessageInfo, ParseError>
    {
        let mut info = MessageInfo::new(full_name);
        for field in self.fields {
            let field = field.build(&info.full_name, cache)?;
            info.add_field(field).context(InvalidMember {
                type_name: info.full_name.clone(),
            })?;
        }

        Ok(info)
    }
}

impl EnumBuilder
{
    fn build(self, full_name: String) -> Result<EnumInfo, ParseError>
    {
        let mut info = EnumInfo::new(full_name);
        for field in self.fields {
            info.add_field(field).context(InvalidMember {
                type_name: info.full_name.clone(),
            })?;
        }

        Ok(info)
    }
}

impl FieldBuilder
{
    fn build(self, scope: &str, cache: &BuildCache) -> Result<MessageField, ParseError>
    {
        let field_type = self.field_type.build(scope, cache)?;
        let multiplicity = resolve_multiplicity(self.repeated, &field_type, &self.options);
        Ok(MessageField {
            name: self.name,
            number: self.number,
            multiplicity,
            field_type,
            options: self.options,
        })
    }
}

fn resolve_multiplicity(
    repeated: bool,
    field_type: &ValueType,
    options: &[ProtoOption],
) -> Multiplicity
{
    // If this isn't a repeated field, the multiplicity is always Single.
    if !repeated {
        return Multiplicity::Single;
    }

    // Strings, bytes and messages are always repeated one value at a time.
    if !field_type.is_packable() {
        return Multiplicity::Repeated;
    }

    // Check the options.
    if let Some(opt) = options.iter().find(|o| o.name == "packed") {
        return match opt.value {
            Constant::Bool(true) => Multiplicity::RepeatedPacked,
            _ => Multiplicity::Repeated,
        };
    }

    // Proto3 packs scalar numeric fields by default.
    Multiplicity::RepeatedPacked
}

impl FieldTypeBuilder
{
    fn build(self, scope: &str, cache: &BuildCache) -> Result<ValueType, ParseError>
    {
        Ok(match self {
            FieldTypeBuilder::Builtin(vt) => vt,
            FieldTypeBuilder::Unknown(s) => {
                let (item_type, idx) =
                    cache
                        .resolve_type(&s, scope)
                        .ok_or_else(|| ParseError::TypeNotFound {
                            name: s,
                            context: scope.to_string(),
                        })?;

                match item_type {
                    ItemType::Message => ValueType::Message(MessageRef(InternalRef(idx))),
                    ItemType::Enum => ValueType::Enum(EnumRef(InternalRef(idx))),
                }
            }
        })
    }
}

#[derive(Default)]
struct BuildCache
{
    items: BTreeMap<String, (ItemType, usize)>,
}

impl BuildCache
{
    /// Resolves a type name the way protoc does: starting from the innermost scope and moving
    /// outwards one level at a time. A leading `.` marks a fully qualified name.
    fn resolve_type(&self, relative_name: &str, mut current_path: &str) -> Option<(ItemType, usize)>
    {
        if let Some(full_name) = relative_name.strip_prefix('.') {
            return self.items.get(full_name).copied();
        }

        loop {
            let lookup: Cow<str> = match current_path.is_empty() {
                true => relative_name.into(),
                false => format!("{}.{}", current_path, relative_name).into(),
            };

            if let Some(t) = self.items.get(lookup.as_ref()) {
                return Some(*t);
            }

            if current_path.is_empty() {
                return None;
            }

            match current_path.rfind('.') {
                Some(i) => {
                    let (start, _) = current_path.split_at(i);
                    current_path = start;
                }
                None => {
                    current_path = "";
                }
            }
        }
    }
}

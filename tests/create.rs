#[test]
fn create_context_by_hand()
{
    use bytes::Bytes;
    use protostrict::context::{
        Constant, Context, EnumField, EnumInfo, MessageField, MessageInfo, Multiplicity,
        ProtoOption, ValueType,
    };

    let parsed_context = Context::parse(&[r#"
        syntax = "proto3";

        package Named;

        enum Inner {
            value0 = 0;
            value1 = 1;
        }

        message Child {
            repeated Child children = 1;

            enum Kind {
                KIND_UNSPECIFIED = 0;
            }
        }

        message Message {
            bool immediate = 1;
            repeated uint32 counts = 2;
            repeated uint32 raw = 3 [packed = false];
            repeated string names = 4 [(custom) = "x"];
            Child child = 5;
            Inner kind = 6;
        }
    "#])
    .unwrap();

    let mut handbuilt_context = Context::new();

    let mut inner_enum = EnumInfo::new("Named.Inner".to_string());
    inner_enum
        .add_field(EnumField::new("value0".to_string(), 0))
        .unwrap();
    inner_enum
        .add_field(EnumField::new("value1".to_string(), 1))
        .unwrap();
    let inner_ref = handbuilt_context.insert_enum(inner_enum).unwrap();

    // Child refers to itself so its reference is needed before it is inserted.
    let child_ref = handbuilt_context.next_message_ref();
    let mut child = MessageInfo::new("Named.Child".to_string());
    child
        .add_field(
            MessageField::new("children".to_string(), 1, ValueType::Message(child_ref))
                .with_multiplicity(Multiplicity::Repeated),
        )
        .unwrap();
    assert_eq!(handbuilt_context.insert_message(child).unwrap(), child_ref);

    let mut kind = EnumInfo::new("Named.Child.Kind".to_string());
    kind.add_field(EnumField::new("KIND_UNSPECIFIED".to_string(), 0))
        .unwrap();
    handbuilt_context.insert_enum(kind).unwrap();

    let mut message = MessageInfo::new("Named.Message".to_string());
    message
        .add_field(MessageField::new("immediate".to_string(), 1, ValueType::Bool))
        .unwrap();
    message
        .add_field(
            MessageField::new("counts".to_string(), 2, ValueType::UInt32)
                .with_multiplicity(Multiplicity::RepeatedPacked),
        )
        .unwrap();

    let mut raw = MessageField::new("raw".to_string(), 3, ValueType::UInt32)
        .with_multiplicity(Multiplicity::Repeated);
    raw.options.push(ProtoOption {
        name: "packed".to_string(),
        value: Constant::Bool(false),
    });
    message.add_field(raw).unwrap();

    let mut names = MessageField::new("names".to_string(), 4, ValueType::String)
        .with_multiplicity(Multiplicity::Repeated);
    names.options.push(ProtoOption {
        name: "(custom)".to_string(),
        value: Constant::String(Bytes::from_static(b"x")),
    });
    message.add_field(names).unwrap();

    message
        .add_field(MessageField::new(
            "child".to_string(),
            5,
            ValueType::Message(child_ref),
        ))
        .unwrap();
    message
        .add_field(MessageField::new(
            "kind".to_string(),
            6,
            ValueType::Enum(inner_ref),
        ))
        .unwrap();
    handbuilt_context.insert_message(message).unwrap();

    assert_eq!(parsed_context, handbuilt_context);
}

#[test]
fn hand_built_context_decodes()
{
    use protostrict::context::{Context, MessageField, MessageInfo, ValueType};
    use protostrict::{ErrorKind, Value};

    let mut ctx = Context::new();
    let mut fish = MessageInfo::new("Fish".to_string());
    fish.add_field(MessageField::new("length".to_string(), 3, ValueType::UInt32))
        .unwrap();
    fish.add_field(MessageField::new("weight".to_string(), 4, ValueType::UInt64))
        .unwrap();
    let fish_ref = ctx.insert_message(fish).unwrap();

    let value = fish_ref.decode(b"\x18\x01\x20\x02", &ctx).unwrap();
    assert_eq!(value.get_field(4), Some(&Value::UInt64(2)));
    assert_eq!(
        fish_ref.decode(b"\x20\x01\x18\x01", &ctx).unwrap_err().kind(),
        ErrorKind::FieldOutOfOrder
    );
}

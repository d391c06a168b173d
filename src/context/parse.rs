use bytes::{BufMut, Bytes, BytesMut};
use pest::{iterators::Pair, Parser};
use snafu::ResultExt;
use std::convert::TryFrom;

use super::builder::*;
use super::*;

#[derive(pest_derive::Parser)]
#[grammar = "proto.pest"]
struct ProtoParser;

impl Context
{
    /// Parses the files and creates a schema context.
    ///
    /// All files are resolved together, so types may refer to types defined in any of the
    /// files. `import` statements are not followed.
    pub fn parse<T, S>(files: T) -> Result<Self, ParseError>
    where
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let builder = ContextBuilder {
            packages: files
                .into_iter()
                .map(|f| PackageBuilder::parse_str(f.as_ref()))
                .collect::<Result<_, _>>()?,
        };

        builder.build()
    }
}

impl PackageBuilder
{
    fn parse_str(input: &str) -> Result<Self, ParseError>
    {
        let pairs = ProtoParser::parse(Rule::proto, input)
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
            .context(SyntaxError {})?;

        let mut current_package = PackageBuilder::default();
        for pair in pairs {
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::syntax => {}
                    Rule::topLevelDef => current_package
                        .types
                        .push(ProtobufTypeBuilder::parse(inner)?),
                    Rule::import => {}
                    Rule::package => {
                        current_package.name =
                            Some(inner.into_inner().next().unwrap().as_str().to_string())
                    }
                    Rule::option => {}
                    Rule::emptyStatement => {}
                    Rule::EOI => {}
                    r => unreachable!("{:?}: {:?}", r, inner),
                }
            }
        }

        Ok(current_package)
    }
}

impl ProtobufTypeBuilder
{
    fn parse(p: Pair<Rule>) -> Result<Self, ParseError>
    {
        let pair = p.into_inner().next().unwrap();
        Ok(match pair.as_rule() {
            Rule::message => ProtobufTypeBuilder::Message(MessageBuilder::parse(pair)?),
            Rule::enum_ => ProtobufTypeBuilder::Enum(EnumBuilder::parse(pair)?),
            r => unreachable!("{:?}: {:?}", r, pair),
        })
    }
}

impl MessageBuilder
{
    fn parse(p: Pair<Rule>) -> Result<Self, ParseError>
    {
        let mut inner = p.into_inner();
        let name = inner.next().unwrap().as_str().to_string();

        let mut fields = vec![];
        let mut inner_types = vec![];
        let body = inner.next().unwrap();
        for p in body.into_inner() {
            match p.as_rule() {
                Rule::field => fields.push(FieldBuilder::parse(p)?),
                Rule::enum_ => {
                    inner_types.push(ProtobufTypeBuilder::Enum(EnumBuilder::parse(p)?))
                }
                Rule::message => {
                    inner_types.push(ProtobufTypeBuilder::Message(MessageBuilder::parse(p)?))
                }
                Rule::option => {}
                Rule::reserved => {} // We don't need to care about reserved field numbers.
                Rule::emptyStatement => {}
                r => unreachable!("{:?}: {:?}", r, p),
            }
        }

        Ok(MessageBuilder {
            name,
            fields,
            inner_types,
        })
    }
}

impl EnumBuilder
{
    fn parse(p: Pair<Rule>) -> Result<EnumBuilder, ParseError>
    {
        let mut inner = p.into_inner();
        let name = inner.next().unwrap().as_str().to_string();

        let mut fields = vec![];
        let body = inner.next().unwrap();
        for p in body.into_inner() {
            match p.as_rule() {
                Rule::enumField => {
                    let mut inner = p.into_inner();
                    fields.push(EnumField {
                        name: inner.next().unwrap().as_str().to_string(),
                        value: parse_int_literal(inner.next().unwrap())?,
                    })
                }
                Rule::option => {}
                Rule::reserved => {}
                Rule::emptyStatement => {}
                r => unreachable!("{:?}: {:?}", r, p),
            }
        }

        Ok(EnumBuilder { name, fields })
    }
}

impl FieldBuilder
{
    fn parse(p: Pair<Rule>) -> Result<Self, ParseError>
    {
        let mut inner = p.into_inner().peekable();
        let repeated = match inner.peek() {
            Some(label) if label.as_rule() == Rule::repeated => {
                inner.next();
                true
            }
            _ => false,
        };
        let field_type = parse_field_type(inner.next().unwrap().as_str());
        let name = inner.next().unwrap().as_str().to_string();
        let number = parse_uint_literal(inner.next().unwrap())?;

        let options = match inner.next() {
            Some(p) => p
                .into_inner()
                .map(ProtoOption::parse)
                .collect::<Result<_, _>>()?,
            None => vec![],
        };

        Ok(FieldBuilder {
            repeated,
            field_type,
            name,
            number,
            options,
        })
    }
}

fn parse_field_type(t: &str) -> FieldTypeBuilder
{
    FieldTypeBuilder::Builtin(match t {
        "double" => ValueType::Double,
        "float" => ValueType::Float,
        "int32" => ValueType::Int32,
        "int64" => ValueType::Int64,
        "uint32" => ValueType::UInt32,
        "uint64" => ValueType::UInt64,
        "sint32" => ValueType::SInt32,
        "sint64" => ValueType::SInt64,
        "fixed32" => ValueType::Fixed32,
        "fixed64" => ValueType::Fixed64,
        "sfixed32" => ValueType::SFixed32,
        "sfixed64" => ValueType::SFixed64,
        "bool" => ValueType::Bool,
        "string" => ValueType::String,
        "bytes" => ValueType::Bytes,
        _ => return FieldTypeBuilder::Unknown(t.to_string()),
    })
}

fn invalid_literal(p: &Pair<Rule>) -> ParseError
{
    ParseError::InvalidLiteral {
        literal: p.as_str().to_string(),
    }
}

/// Parses an `intLit` into its sign and magnitude.
fn parse_int_parts(p: Pair<Rule>) -> Result<(bool, u64), ParseError>
{
    let err = invalid_literal(&p);
    let mut inner = p.into_inner();
    let first = inner.next().unwrap();
    let (negative, lit) = match first.as_rule() {
        Rule::sign => (first.as_str() == "-", inner.next().unwrap()),
        _ => (false, first),
    };

    let magnitude = match lit.as_rule() {
        Rule::decimalLit => lit.as_str().parse::<u64>().ok(),
        Rule::octalLit if lit.as_str() == "0" => Some(0),
        Rule::octalLit => u64::from_str_radix(&lit.as_str()[1..], 8).ok(),
        Rule::hexLit => u64::from_str_radix(&lit.as_str()[2..], 16).ok(),
        r => unreachable!("{:?}: {:?}", r, lit),
    };

    magnitude.map(|m| (negative, m)).ok_or(err)
}

fn parse_uint_literal(p: Pair<Rule>) -> Result<u64, ParseError>
{
    match p.as_rule() {
        Rule::fieldNumber => parse_uint_literal(p.into_inner().next().unwrap()),
        Rule::intLit => {
            let err = invalid_literal(&p);
            match parse_int_parts(p)? {
                (false, value) => Ok(value),
                (true, 0) => Ok(0),
                (true, _) => Err(err),
            }
        }
        r => unreachable!("{:?}: {:?}", r, p),
    }
}

fn parse_int_literal(p: Pair<Rule>) -> Result<i64, ParseError>
{
    match p.as_rule() {
        Rule::intLit => {
            let err = invalid_literal(&p);
            let (negative, magnitude) = parse_int_parts(p)?;
            let value = match negative {
                true => -i128::from(magnitude),
                false => i128::from(magnitude),
            };
            i64::try_from(value).map_err(|_| err)
        }
        r => unreachable!("{:?}: {:?}", r, p),
    }
}

fn parse_float_literal(p: Pair<Rule>) -> Result<f64, ParseError>
{
    match p.as_rule() {
        Rule::floatLit => p.as_str().parse::<f64>().map_err(|_| invalid_literal(&p)),
        r => unreachable!("{:?}: {:?}", r, p),
    }
}

impl ProtoOption
{
    fn parse(p: Pair<Rule>) -> Result<Self, ParseError>
    {
        let mut inner = p.into_inner();
        Ok(Self {
            name: inner.next().unwrap().as_str().to_string(),
            value: Constant::parse(inner.next().unwrap())?,
        })
    }
}

impl Constant
{
    fn parse(p: Pair<Rule>) -> Result<Self, ParseError>
    {
        let p = p.into_inner().next().unwrap();
        Ok(match p.as_rule() {
            Rule::fullIdent => Constant::Ident(p.as_str().to_string()),
            Rule::intLit => Constant::Integer(parse_int_literal(p)?),
            Rule::floatLit => Constant::Float(parse_float_literal(p)?),
            Rule::strLit => Constant::String(parse_string_literal(p)),
            Rule::boolLit => Constant::Bool(p.as_str() == "true"),
            r => unreachable!("{:?}: {:?}", r, p),
        })
    }
}

fn parse_string_literal(s: Pair<Rule>) -> Bytes
{
    let raw = s.into_inner().next().unwrap().as_str();
    let mut output = BytesMut::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            output.put_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        match chars.next() {
            Some('a') => output.put_u8(0x07),
            Some('b') => output.put_u8(0x08),
            Some('f') => output.put_u8(0x0C),
            Some('n') => output.put_u8(0x0A),
            Some('r') => output.put_u8(0x0D),
            Some('t') => output.put_u8(0x09),
            Some('v') => output.put_u8(0x0B),
            Some('x') | Some('X') => {
                let hex: String = chars
                    .clone()
                    .take(2)
                    .take_while(char::is_ascii_hexdigit)
                    .collect();
                for _ in 0..hex.len() {
                    chars.next();
                }
                output.put_u8(u8::from_str_radix(&hex, 16).unwrap_or(0));
            }
            Some(first @ '0'..='7') => {
                let rest: String = chars
                    .clone()
                    .take(2)
                    .take_while(|c| ('0'..='7').contains(c))
                    .collect();
                for _ in 0..rest.len() {
                    chars.next();
                }
                let value = u32::from_str_radix(&format!("{}{}", first, rest), 8).unwrap_or(0);
                output.put_u8(value as u8);
            }
            Some(other) => {
                let mut buf = [0u8; 4];
                output.put_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => output.put_u8(b'\\'),
        }
    }
    output.freeze()
}

//!
//! Protostrict is a protocol buffer decoder that only accepts canonical encodings. A payload
//! decodes successfully if and only if it is the unique byte string a canonical encoder would
//! produce for its value: fields in ascending order, no duplicates, no explicitly encoded default
//! values and no bytes left over at any nesting level.
//!
//! Schemas are loaded at runtime from .proto-files or built by hand through the
//! [`Context`] insertion API.
//!
//! ```
//! use protostrict::{Context, ErrorKind, Value};
//!
//! let context = Context::parse(&[r#"
//!   syntax = "proto3";
//!   package Proto;
//!
//!   message Fish {
//!     uint32 length = 3;
//!     uint64 weight = 4;
//!   }
//! "#]).unwrap();
//!
//! let fish = context.get_message("Proto.Fish").unwrap();
//!
//! let value = fish.decode(b"\x18\x01\x20\x01", &context).unwrap();
//! assert_eq!(value.get_field(3), Some(&Value::UInt32(1)));
//! assert_eq!(value.get_field(4), Some(&Value::UInt64(1)));
//!
//! // Fields out of order.
//! let err = fish.decode(b"\x20\x01\x18\x01", &context).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::FieldOutOfOrder);
//!
//! // Explicit default value.
//! let err = fish.decode(b"\x18\x00\x20\x01", &context).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::ExplicitDefaultValue);
//!
//! // Bytes that do not form a field.
//! assert!(fish.accept(b"\x18\x01\x20\x01\xde\xad\xbe\xef", &context).is_none());
//! ```
#![warn(missing_docs)]
#![allow(clippy::match_bool)]

pub mod context;
pub mod decode;
pub mod error;
pub mod validate;
pub mod wire;

pub use context::{Context, MessageInfo, MessageRef};
pub use decode::{DecodeOptions, MessageValue, Value};
pub use error::{DecodeError, ErrorKind};

//! Canonical encoding rules applied to each field occurrence.
//!
//! The wire reader only checks that individual primitives are well formed. Whether a well formed
//! field is allowed to appear at its position is decided here, separately for every message level.

use crate::context::{MessageField, MessageInfo, Multiplicity};
use crate::decode::Value;
use crate::error::DecodeError;
use crate::wire::Tag;
use std::collections::BTreeSet;

/// Occurrence state of a single message level.
#[derive(Debug, Default)]
pub struct FieldValidator
{
    last_number: u64,
    populated: BTreeSet<u64>,
}

impl FieldValidator
{
    /// Creates the state for a message level where no fields have been seen yet.
    pub fn new() -> Self
    {
        Default::default()
    }

    /// Number of the most recently accepted field, zero before the first field.
    pub fn last_number(&self) -> u64
    {
        self.last_number
    }

    /// Checks that a field header may appear at this point of the message.
    ///
    /// On success the occurrence is recorded and the field descriptor is returned.
    pub fn check_occurrence<'m>(
        &mut self,
        msg: &'m MessageInfo,
        tag: Tag,
        offset: usize,
    ) -> Result<&'m MessageField, DecodeError>
    {
        let number = tag.number;
        let field = msg
            .get_field(number)
            .ok_or(DecodeError::UnknownField { offset, number })?;

        let expected = field.wire_type();
        if tag.wire_type != expected {
            return Err(DecodeError::WireTypeMismatch {
                offset,
                number,
                expected,
                actual: tag.wire_type,
            });
        }

        if number < self.last_number {
            return Err(DecodeError::FieldOutOfOrder {
                offset,
                number,
                previous: self.last_number,
            });
        }

        // Only an unpacked repeated field may continue with the same number.
        if !field.is_repeated() {
            if number == self.last_number || !self.populated.insert(number) {
                return Err(DecodeError::DuplicateField { offset, number });
            }
        }

        self.last_number = number;
        Ok(field)
    }

    /// Checks a decoded value against the default value rule.
    pub fn check_value(
        &self,
        field: &MessageField,
        value: &Value,
        offset: usize,
    ) -> Result<(), DecodeError>
    {
        // Elements of an unpacked repeated field are positional and may hold defaults.
        if field.multiplicity == Multiplicity::Repeated {
            return Ok(());
        }

        match value.is_default() {
            true => Err(DecodeError::ExplicitDefaultValue {
                offset,
                number: field.number,
            }),
            false => Ok(()),
        }
    }
}

//! The recursive tagged `encoded_value` tree used inside annotations and
//! static-value arrays.
//!
//! See: <https://source.android.com/docs/core/runtime/dex-format#value-formats>

use winnow::binary::u8;
use winnow::combinator::repeat;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use crate::annotations::EncodedAnnotation;
use crate::stream::uleb128;

const VALUE_BYTE: u8 = 0x00;
const VALUE_SHORT: u8 = 0x02;
const VALUE_CHAR: u8 = 0x03;
const VALUE_INT: u8 = 0x04;
const VALUE_LONG: u8 = 0x06;
const VALUE_FLOAT: u8 = 0x10;
const VALUE_DOUBLE: u8 = 0x11;
const VALUE_STRING: u8 = 0x17;
const VALUE_TYPE: u8 = 0x18;
const VALUE_FIELD: u8 = 0x19;
const VALUE_METHOD: u8 = 0x1a;
const VALUE_ENUM: u8 = 0x1b;
const VALUE_ARRAY: u8 = 0x1c;
const VALUE_ANNOTATION: u8 = 0x1d;
const VALUE_NULL: u8 = 0x1e;
const VALUE_BOOLEAN: u8 = 0x1f;

/// A decoded `encoded_value`.
///
/// Index-carrying variants (`String`, `Type`, `Field`, `Method`, `Enum`)
/// hold the pool index, not the resolved entry.
#[derive(Debug, PartialEq)]
pub enum EncodedValue {
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(u32),
    Type(u32),
    Field(u32),
    Method(u32),
    Enum(u32),
    Array(Vec<EncodedValue>),
    Annotation(EncodedAnnotation),
    Null,
    Boolean(bool),
}

impl EncodedValue {
    /// Parse one value at the current position.
    ///
    /// The header byte splits into `value_arg` (upper three bits) and
    /// `value_type` (lower five); scalar payloads are `value_arg + 1`
    /// bytes, sign- or zero-extended to their natural width.
    pub fn parse(input: &mut &[u8]) -> ModalResult<EncodedValue> {
        let header = u8.parse_next(input)?;
        let arg = header >> 5;
        let size = arg as usize + 1;

        let value = match header & 0x1f {
            VALUE_BYTE if size == 1 => EncodedValue::Byte(le_signed(input, 1)? as i8),
            VALUE_SHORT if size <= 2 => EncodedValue::Short(le_signed(input, size)? as i16),
            VALUE_CHAR if size <= 2 => EncodedValue::Char(le_unsigned(input, size)? as u16),
            VALUE_INT if size <= 4 => EncodedValue::Int(le_signed(input, size)? as i32),
            VALUE_LONG if size <= 8 => EncodedValue::Long(le_signed(input, size)?),
            VALUE_FLOAT if size <= 4 => {
                let raw = le_unsigned(input, size)? as u32;
                EncodedValue::Float(f32::from_bits(raw << (8 * (4 - size))))
            }
            VALUE_DOUBLE if size <= 8 => {
                let raw = le_unsigned(input, size)?;
                EncodedValue::Double(f64::from_bits(raw << (8 * (8 - size))))
            }
            VALUE_STRING if size <= 4 => EncodedValue::String(le_unsigned(input, size)? as u32),
            VALUE_TYPE if size <= 4 => EncodedValue::Type(le_unsigned(input, size)? as u32),
            VALUE_FIELD if size <= 4 => EncodedValue::Field(le_unsigned(input, size)? as u32),
            VALUE_METHOD if size <= 4 => EncodedValue::Method(le_unsigned(input, size)? as u32),
            VALUE_ENUM if size <= 4 => EncodedValue::Enum(le_unsigned(input, size)? as u32),
            VALUE_ARRAY if arg == 0 => {
                let count = uleb128(input)? as usize;
                EncodedValue::Array(repeat(count, Self::parse).parse_next(input)?)
            }
            VALUE_ANNOTATION if arg == 0 => {
                EncodedValue::Annotation(EncodedAnnotation::parse(input)?)
            }
            VALUE_NULL if arg == 0 => EncodedValue::Null,
            // the value lives in the arg bits, there is no payload
            VALUE_BOOLEAN if arg <= 1 => EncodedValue::Boolean(arg != 0),
            _ => return Err(ErrMode::Cut(ContextError::new())),
        };

        Ok(value)
    }
}

/// Little-endian integer of `size` bytes, sign-extended.
fn le_signed(input: &mut &[u8], size: usize) -> ModalResult<i64> {
    let value = le_unsigned(input, size)? as i64;
    let shift = 64 - 8 * size as u32;
    Ok((value << shift) >> shift)
}

/// Little-endian integer of `size` bytes, zero-extended.
fn le_unsigned(input: &mut &[u8], size: usize) -> ModalResult<u64> {
    let bytes = take(size).parse_next(input)?;
    Ok(bytes
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | ((b as u64) << (8 * i))))
}

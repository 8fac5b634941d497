//! Class-data records: the LEB128-encoded field and method streams reached
//! through a class definition's `class_data_off`.

use winnow::combinator::repeat;
use winnow::prelude::*;

use crate::stream::uleb128;

/// Abstraction over `class_data_item`
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#class-data-item>
#[derive(Debug)]
pub struct ClassData {
    pub static_fields: Vec<EncodedField>,
    pub instance_fields: Vec<EncodedField>,
    pub direct_methods: Vec<EncodedMethod>,
    pub virtual_methods: Vec<EncodedMethod>,
}

impl ClassData {
    pub fn parse(input: &mut &[u8]) -> ModalResult<ClassData> {
        let static_fields_size = uleb128(input)? as usize;
        let instance_fields_size = uleb128(input)? as usize;
        let direct_methods_size = uleb128(input)? as usize;
        let virtual_methods_size = uleb128(input)? as usize;

        let static_fields = repeat(static_fields_size, EncodedField::parse).parse_next(input)?;
        let instance_fields = repeat(instance_fields_size, EncodedField::parse).parse_next(input)?;
        let direct_methods = repeat(direct_methods_size, EncodedMethod::parse).parse_next(input)?;
        let virtual_methods = repeat(virtual_methods_size, EncodedMethod::parse).parse_next(input)?;

        Ok(ClassData {
            static_fields,
            instance_fields,
            direct_methods,
            virtual_methods,
        })
    }
}

/// Field entry in a class-data stream.
#[derive(Debug)]
pub struct EncodedField {
    /// Read from the wire's `field_idx_diff` field
    pub field_idx: u64,

    /// Raw access flags
    pub access_flags: u64,
}

impl EncodedField {
    #[inline]
    fn parse(input: &mut &[u8]) -> ModalResult<EncodedField> {
        let (field_idx, access_flags) = (uleb128, uleb128).parse_next(input)?;

        Ok(EncodedField {
            field_idx,
            access_flags,
        })
    }
}

/// Method entry in a class-data stream.
#[derive(Debug)]
pub struct EncodedMethod {
    /// Read from the wire's `method_idx_diff` field; name lookups consume
    /// it as an absolute index into the method pool
    pub method_idx: u64,

    /// Raw access flags
    pub access_flags: u64,

    /// Offset to the code item, 0 for abstract and native methods
    pub code_off: u64,
}

impl EncodedMethod {
    #[inline]
    fn parse(input: &mut &[u8]) -> ModalResult<EncodedMethod> {
        let (method_idx, access_flags, code_off) =
            (uleb128, uleb128, uleb128).parse_next(input)?;

        Ok(EncodedMethod {
            method_idx,
            access_flags,
            code_off,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_method_count_matches_header() {
        // 1 static field, 1 instance field, 1 direct method, 2 virtual methods
        let data = [
            0x01, 0x01, 0x01, 0x02, // sizes
            0x03, 0x1a, // static field: idx 3, flags 0x1a
            0x84, 0x01, 0x08, // instance field: idx 132, flags 8
            0x05, 0x01, 0x00, // direct: idx 5, flags 1, no code
            0x06, 0x01, 0x80, 0x01, // virtual: idx 6, flags 1, code at 128
            0x07, 0x11, 0x00, // virtual: idx 7, flags 0x11, no code
        ];
        let mut input = &data[..];

        let class_data = ClassData::parse(&mut input).unwrap();
        assert!(input.is_empty());
        assert_eq!(class_data.static_fields.len(), 1);
        assert_eq!(class_data.static_fields[0].field_idx, 3);
        assert_eq!(class_data.static_fields[0].access_flags, 0x1a);
        assert_eq!(class_data.instance_fields.len(), 1);
        assert_eq!(class_data.instance_fields[0].field_idx, 132);
        assert_eq!(class_data.instance_fields[0].access_flags, 8);
        assert_eq!(class_data.virtual_methods.len(), 2);
        assert_eq!(class_data.direct_methods.len(), 1);
        assert_eq!(class_data.virtual_methods[0].method_idx, 6);
        assert_eq!(class_data.virtual_methods[0].code_off, 128);
        assert_eq!(class_data.virtual_methods[1].access_flags, 0x11);
    }

    #[test]
    fn truncated_stream_fails() {
        let data = [0x00, 0x00, 0x00, 0x01, 0x05]; // one virtual method, cut short
        assert!(ClassData::parse(&mut &data[..]).is_err());
    }
}

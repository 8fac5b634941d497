//! Dex container: header validation and the pooled ID tables.
//!
//! See: <https://source.android.com/docs/core/runtime/dex-format>

use std::borrow::Cow;

use bitflags::bitflags;
use winnow::binary::{le_i32, le_u16, le_u32, u8};
use winnow::combinator::repeat;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take;

use crate::errors::DexError;
use crate::stream;

/// The constant is used to indicate the endianness of the file in which it is found.
///
/// This constant means - little-endian.
pub const ENDIAN_CONSTANT: u32 = 0x12345678;

/// Byte-swapped [ENDIAN_CONSTANT]; big-endian files are not supported.
pub const REVERSE_ENDIAN_CONSTANT: u32 = 0x78563412;

const DEX_MAGIC: &[u8] = b"dex\n";
const DEX_VERSION: &[u8] = b"035";

/// A decoded dex file.
///
/// Owns the raw file bytes; the pooled tables store offsets and indices
/// into them, and the accessors resolve those on demand.
#[derive(Debug)]
pub struct Dex {
    /// Store data of dex file inside this structure
    data: Vec<u8>,

    /// Information about dex header
    pub header: DexHeader,

    /// String pool: one data offset per string
    pub string_ids: Vec<u32>,

    /// Type pool: one string-pool index per type descriptor
    pub type_ids: Vec<u32>,

    /// Method prototypes
    pub proto_ids: Vec<ProtoItem>,

    /// Field identifiers
    pub field_ids: Vec<FieldItem>,

    /// Method identifiers
    pub method_ids: Vec<MethodItem>,

    /// Class definitions
    pub class_defs: Vec<ClassItem>,
}

impl Dex {
    /// Parse given dex file
    ///
    /// ```ignore
    /// let dex = Dex::new(data)?;
    /// ```
    pub fn new(data: Vec<u8>) -> Result<Dex, DexError> {
        let header = Self::parse_header(&mut &data[..])?;

        let string_ids: Vec<u32> = repeat(header.string_ids.count as usize, le_u32)
            .parse_next(&mut Self::slice_at(&data, header.string_ids.offset)?)
            .map_err(|_: ContextError| DexError::StringError)?;

        let type_ids: Vec<u32> = repeat(header.type_ids.count as usize, le_u32)
            .parse_next(&mut Self::slice_at(&data, header.type_ids.offset)?)
            .map_err(|_: ContextError| DexError::TypeError)?;

        let proto_ids: Vec<ProtoItem> = repeat(header.proto_ids.count as usize, ProtoItem::parse)
            .parse_next(&mut Self::slice_at(&data, header.proto_ids.offset)?)
            .map_err(|_| DexError::ProtoError)?;

        let field_ids: Vec<FieldItem> = repeat(header.field_ids.count as usize, FieldItem::parse)
            .parse_next(&mut Self::slice_at(&data, header.field_ids.offset)?)
            .map_err(|_| DexError::FieldError)?;

        let method_ids: Vec<MethodItem> = repeat(header.method_ids.count as usize, MethodItem::parse)
            .parse_next(&mut Self::slice_at(&data, header.method_ids.offset)?)
            .map_err(|_| DexError::MethodError)?;

        let class_defs: Vec<ClassItem> = repeat(header.class_defs.count as usize, ClassItem::parse)
            .parse_next(&mut Self::slice_at(&data, header.class_defs.offset)?)
            .map_err(|_| DexError::ClassError)?;

        Ok(Dex {
            data,
            header,
            string_ids,
            type_ids,
            proto_ids,
            field_ids,
            method_ids,
            class_defs,
        })
    }

    fn parse_header(input: &mut &[u8]) -> Result<DexHeader, DexError> {
        let magic = take(4usize)
            .parse_next(input)
            .map_err(|_: ContextError| DexError::Truncated)?;
        if magic != DEX_MAGIC {
            return Err(DexError::InvalidMagic);
        }

        let (version, zero) = (take(3usize), u8)
            .parse_next(input)
            .map_err(|_: ContextError| DexError::Truncated)?;
        if version != DEX_VERSION {
            return Err(DexError::UnsupportedVersion);
        }
        if zero != 0 {
            return Err(DexError::InvalidMagic);
        }

        let (checksum, signature_bytes, ints) = (
            le_u32,                                         // checksum
            take(20usize),                                  // signature
            (le_u32, le_u32, le_u32, le_u32, le_u32, le_u32),
        )
            .parse_next(input)
            .map_err(|_: ContextError| DexError::Truncated)?;
        let (file_size, header_size, endian_tag, link_size, link_off, map_off) = ints;

        if endian_tag != ENDIAN_CONSTANT {
            return Err(DexError::InvalidEndianTag(endian_tag));
        }

        let mut signature = [0u8; 20];
        signature.copy_from_slice(signature_bytes);

        let mut tables = [TableRef::default(); 7];
        for table in &mut tables {
            let (count, offset) = (le_u32, le_u32)
                .parse_next(input)
                .map_err(|_: ContextError| DexError::Truncated)?;
            *table = TableRef { count, offset };
        }
        let [string_ids, type_ids, proto_ids, field_ids, method_ids, class_defs, class_data] =
            tables;

        Ok(DexHeader {
            checksum,
            signature,
            file_size,
            header_size,
            endian_tag,
            link_size,
            link_off,
            map_off,
            string_ids,
            type_ids,
            proto_ids,
            field_ids,
            method_ids,
            class_defs,
            class_data,
        })
    }

    fn slice_at(data: &[u8], offset: u32) -> Result<&[u8], DexError> {
        data.get(offset as usize..).ok_or(DexError::Truncated)
    }

    /// Raw file bytes starting at `offset`, for records reached through
    /// per-class offsets.
    pub(crate) fn data_at(&self, offset: u32) -> Result<&[u8], DexError> {
        Self::slice_at(&self.data, offset)
    }

    /// Look up a string-pool entry.
    pub fn string(&self, idx: usize) -> Option<Cow<'_, str>> {
        let offset = *self.string_ids.get(idx)? as usize;
        stream::pool_string(self.data.get(offset..)?)
    }

    /// Resolve a type-pool entry to its descriptor, e.g. `Ljava/lang/Object;`.
    #[inline]
    pub fn type_descriptor(&self, idx: usize) -> Option<Cow<'_, str>> {
        let idx = *self.type_ids.get(idx)?;
        self.string(idx as usize)
    }
}

/// `(count, file offset)` of one pooled table, as stored in the header.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRef {
    pub count: u32,
    pub offset: u32,
}

/// Decoded dex header.
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#header-item>
#[derive(Debug, Clone)]
pub struct DexHeader {
    /// Adler32 checksum of the file; captured, never verified
    pub checksum: u32,

    /// SHA-1 signature of the file
    pub signature: [u8; 20],

    /// Size of the entire file in bytes
    pub file_size: u32,

    /// Size of the header in bytes
    pub header_size: u32,

    /// Endianness tag; must equal [ENDIAN_CONSTANT]
    pub endian_tag: u32,

    /// Size of the link section, 0 if the file is not statically linked
    pub link_size: u32,

    /// Offset to the link section
    pub link_off: u32,

    /// Offset to the map item
    pub map_off: u32,

    pub string_ids: TableRef,
    pub type_ids: TableRef,
    pub proto_ids: TableRef,
    pub field_ids: TableRef,
    pub method_ids: TableRef,
    pub class_defs: TableRef,

    /// Bookkeeping only: class-data records are reached through the
    /// per-class offsets, never through this table
    pub class_data: TableRef,
}

/// Abstraction over `proto_id_item`
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#proto-id-item>
#[derive(Debug)]
pub struct ProtoItem {
    /// Index into [Dex::string_ids] for the short-form descriptor
    pub shorty_idx: u32,

    /// Index into [Dex::type_ids] for the return type
    pub return_type_idx: u32,

    /// Offset to the parameter type list, 0 if there are no parameters
    pub parameters_off: u32,
}

impl ProtoItem {
    #[inline]
    fn parse(input: &mut &[u8]) -> ModalResult<ProtoItem> {
        (le_u32, le_u32, le_u32)
            .map(|(shorty_idx, return_type_idx, parameters_off)| ProtoItem {
                shorty_idx,
                return_type_idx,
                parameters_off,
            })
            .parse_next(input)
    }
}

/// Abstraction over `field_id_item`
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#field-id-item>
#[derive(Debug)]
pub struct FieldItem {
    /// Index into [Dex::type_ids] for the definer of this field
    pub class_idx: u16,

    /// Index into [Dex::type_ids] for the type of this field
    pub type_idx: u16,

    /// Index into [Dex::string_ids] for the name of this field
    pub name_idx: u32,
}

impl FieldItem {
    #[inline]
    fn parse(input: &mut &[u8]) -> ModalResult<FieldItem> {
        (le_u16, le_u16, le_u32)
            .map(|(class_idx, type_idx, name_idx)| FieldItem {
                class_idx,
                type_idx,
                name_idx,
            })
            .parse_next(input)
    }
}

/// Abstraction over `method_id_item`
///
/// Same wire layout as [FieldItem], but the middle index points into the
/// prototype pool.
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#method-id-item>
#[derive(Debug)]
pub struct MethodItem {
    /// Index into [Dex::type_ids] for the definer of this method
    pub class_idx: u16,

    /// Index into [Dex::proto_ids] for the prototype of this method
    pub proto_idx: u16,

    /// Index into [Dex::string_ids] for the name of this method
    pub name_idx: u32,
}

impl MethodItem {
    #[inline]
    fn parse(input: &mut &[u8]) -> ModalResult<MethodItem> {
        (le_u16, le_u16, le_u32)
            .map(|(class_idx, proto_idx, name_idx)| MethodItem {
                class_idx,
                proto_idx,
                name_idx,
            })
            .parse_next(input)
    }

    /// Get method name
    #[inline]
    pub fn name<'a>(&self, dex: &'a Dex) -> Option<Cow<'a, str>> {
        dex.string(self.name_idx as usize)
    }
}

/// Abstraction over `class_def_item`
///
/// See: <https://source.android.com/docs/core/runtime/dex-format#class-def-item>
#[derive(Debug)]
pub struct ClassItem {
    /// Index into [Dex::type_ids] for this class
    pub class_idx: u32,

    /// Access flags for the class
    pub access_flags: AccessFlags,

    /// Index into [Dex::type_ids] for the superclass; the sole signed
    /// field - negative means the class has no superclass
    pub superclass_idx: i32,

    /// Offset to the interface list, 0 if there are none
    pub interfaces_off: u32,

    /// Index into [Dex::string_ids] for the source file name
    pub source_file_idx: u32,

    /// Offset to the annotations directory, 0 if the class has none
    pub annotations_off: u32,

    /// Offset to the class data, 0 if the class has none
    pub class_data_off: u32,

    /// Offset to the static field initial values, 0 if there are none
    pub static_values_off: u32,
}

impl ClassItem {
    #[inline]
    fn parse(input: &mut &[u8]) -> ModalResult<ClassItem> {
        (
            le_u32,
            le_u32.map(AccessFlags::from_bits_truncate),
            le_i32,
            le_u32,
            le_u32,
            le_u32,
            le_u32,
            le_u32,
        )
            .map(
                |(
                    class_idx,
                    access_flags,
                    superclass_idx,
                    interfaces_off,
                    source_file_idx,
                    annotations_off,
                    class_data_off,
                    static_values_off,
                )| ClassItem {
                    class_idx,
                    access_flags,
                    superclass_idx,
                    interfaces_off,
                    source_file_idx,
                    annotations_off,
                    class_data_off,
                    static_values_off,
                },
            )
            .parse_next(input)
    }

    /// Descriptor of this class, e.g. `Lcom/example/Foo;`
    #[inline]
    pub fn descriptor<'a>(&self, dex: &'a Dex) -> Option<Cow<'a, str>> {
        dex.type_descriptor(self.class_idx as usize)
    }

    /// Descriptor of the direct superclass, or `None` for a root class
    #[inline]
    pub fn superclass_descriptor<'a>(&self, dex: &'a Dex) -> Option<Cow<'a, str>> {
        if self.superclass_idx < 0 {
            return None;
        }

        dex.type_descriptor(self.superclass_idx as usize)
    }
}

bitflags! {
    /// Access flags used for classes, fields, and methods.
    ///
    /// See: <https://source.android.com/docs/core/runtime/dex-format#access-flags>
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        /// Fields only
        const VOLATILE = 0x0040;
        /// Methods only, same bit as `VOLATILE`
        const BRIDGE = 0x0040;
        /// Fields only
        const TRANSIENT = 0x0080;
        /// Methods only, same bit as `TRANSIENT`
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const CONSTRUCTOR = 0x10000;
        const DECLARED_SYNCHRONIZED = 0x20000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_dex(version: &[u8; 3], endian: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"dex\n");
        data.extend_from_slice(version);
        data.push(0);
        data.extend_from_slice(&0xdead_beefu32.to_le_bytes()); // checksum
        data.extend_from_slice(&[0x11; 20]); // signature
        data.extend_from_slice(&112u32.to_le_bytes()); // file_size
        data.extend_from_slice(&112u32.to_le_bytes()); // header_size
        data.extend_from_slice(&endian.to_le_bytes());
        data.extend_from_slice(&[0; 12]); // link size/offset, map offset
        for _ in 0..7 {
            data.extend_from_slice(&0u32.to_le_bytes()); // count
            data.extend_from_slice(&112u32.to_le_bytes()); // offset
        }
        data
    }

    #[test]
    fn parses_empty_dex() {
        let dex = Dex::new(minimal_dex(b"035", ENDIAN_CONSTANT)).unwrap();
        assert_eq!(dex.header.checksum, 0xdead_beef);
        assert_eq!(dex.header.signature, [0x11; 20]);
        assert_eq!(dex.header.endian_tag, ENDIAN_CONSTANT);
        assert!(dex.string_ids.is_empty());
        assert!(dex.class_defs.is_empty());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = minimal_dex(b"035", ENDIAN_CONSTANT);
        data[0] = b'x';
        assert!(matches!(Dex::new(data), Err(DexError::InvalidMagic)));
    }

    #[test]
    fn rejects_unsupported_version() {
        let data = minimal_dex(b"036", ENDIAN_CONSTANT);
        assert!(matches!(Dex::new(data), Err(DexError::UnsupportedVersion)));
    }

    #[test]
    fn rejects_reverse_endian_tag() {
        let data = minimal_dex(b"035", REVERSE_ENDIAN_CONSTANT);
        assert!(matches!(
            Dex::new(data),
            Err(DexError::InvalidEndianTag(REVERSE_ENDIAN_CONSTANT))
        ));
    }

    #[test]
    fn rejects_truncated_header() {
        let mut data = minimal_dex(b"035", ENDIAN_CONSTANT);
        data.truncate(40);
        assert!(matches!(Dex::new(data), Err(DexError::Truncated)));
    }
}

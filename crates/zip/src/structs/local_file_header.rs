use winnow::binary::{le_u16, le_u32};
use winnow::error::{ErrMode, Needed};
use winnow::prelude::*;

/// Local file header; variable-length name and extra fields are only
/// accounted for in [LocalFileHeader::size].
#[derive(Debug)]
pub(crate) struct LocalFileHeader {
    pub(crate) compression_method: u16,
    pub(crate) compressed_size: u32,
    pub(crate) uncompressed_size: u32,
    file_name_length: u16,
    extra_field_length: u16,
}

impl LocalFileHeader {
    const MAGIC: u32 = 0x0403_4b50;

    pub(crate) fn parse(input: &[u8], offset: usize) -> ModalResult<LocalFileHeader> {
        let mut input = input
            .get(offset..)
            .ok_or(ErrMode::Incomplete(Needed::Unknown))?;

        let (
            _,
            _version_needed,
            _general_purpose,
            compression_method,
            _last_mod,
            _crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
        ) = (
            le_u32.verify(|magic| *magic == Self::MAGIC),
            le_u16,           // version needed
            le_u16,           // general purpose bit flag
            le_u16,           // compression method
            (le_u16, le_u16), // last modification time and date
            le_u32,           // crc32
            le_u32,           // compressed size
            le_u32,           // uncompressed size
            le_u16,           // file name length
            le_u16,           // extra field length
        )
            .parse_next(&mut input)?;

        Ok(LocalFileHeader {
            compression_method,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
        })
    }

    /// Offset from the header start to the entry data:
    /// 4 (magic) + 26 (fixed fields) + name + extra.
    #[inline]
    pub(crate) fn size(&self) -> usize {
        30 + self.file_name_length as usize + self.extra_field_length as usize
    }
}

use ahash::AHashMap;
use winnow::binary::{le_u16, le_u32};
use winnow::combinator::repeat;
use winnow::error::{ErrMode, Needed};
use winnow::prelude::*;
use winnow::token::take;

use crate::structs::eocd::EndOfCentralDirectory;

/// One central-directory entry; only the fields the reader needs.
#[derive(Debug)]
pub(crate) struct CentralDirectoryEntry {
    pub(crate) compressed_size: u32,
    pub(crate) uncompressed_size: u32,
    pub(crate) local_header_offset: u32,
    pub(crate) file_name: String,
}

impl CentralDirectoryEntry {
    const MAGIC: u32 = 0x0201_4b50;

    fn parse(input: &mut &[u8]) -> ModalResult<CentralDirectoryEntry> {
        let (
            _,
            _versions,
            _general_purpose,
            _compression_method,
            _last_mod,
            _crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
            file_comment_length,
            _attrs,
            local_header_offset,
        ) = (
            le_u32.verify(|magic| *magic == Self::MAGIC),
            (le_u16, le_u16), // version made by, version needed
            le_u16,           // general purpose bit flag
            le_u16,           // compression method
            (le_u16, le_u16), // last modification time and date
            le_u32,           // crc32
            le_u32,           // compressed size
            le_u32,           // uncompressed size
            le_u16,           // file name length
            le_u16,           // extra field length
            le_u16,           // file comment length
            (le_u16, le_u16, le_u32), // disk number, internal attrs, external attrs
            le_u32,           // local header offset
        )
            .parse_next(input)?;

        let (file_name, _extra, _comment) = (
            take(file_name_length),
            take(extra_field_length),
            take(file_comment_length),
        )
            .parse_next(input)?;

        Ok(CentralDirectoryEntry {
            compressed_size,
            uncompressed_size,
            local_header_offset,
            file_name: String::from_utf8_lossy(file_name).to_string(),
        })
    }
}

/// The central directory, keyed by entry name.
#[derive(Debug)]
pub(crate) struct CentralDirectory {
    pub(crate) entries: AHashMap<String, CentralDirectoryEntry>,
}

impl CentralDirectory {
    pub(crate) fn parse(
        input: &[u8],
        eocd: &EndOfCentralDirectory,
    ) -> ModalResult<CentralDirectory> {
        let mut input = input
            .get(eocd.central_dir_offset as usize..)
            .ok_or(ErrMode::Incomplete(Needed::Unknown))?;

        let entries: Vec<CentralDirectoryEntry> =
            repeat(0.., CentralDirectoryEntry::parse).parse_next(&mut input)?;

        Ok(CentralDirectory {
            entries: entries
                .into_iter()
                .map(|entry| (entry.file_name.clone(), entry))
                .collect(),
        })
    }
}

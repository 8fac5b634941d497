use memchr::memmem;
use winnow::binary::{le_u16, le_u32};
use winnow::prelude::*;

/// End-of-central-directory record; only the fields the reader needs.
#[derive(Debug)]
pub(crate) struct EndOfCentralDirectory {
    pub(crate) total_entries: u16,
    pub(crate) central_dir_offset: u32,
}

impl EndOfCentralDirectory {
    const MAGIC: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];

    pub(crate) fn parse(input: &mut &[u8]) -> ModalResult<EndOfCentralDirectory> {
        let (_, _disk, _cd_disk, _disk_entries, total_entries, _cd_size, central_dir_offset) = (
            le_u32.verify(|magic| *magic == u32::from_le_bytes(Self::MAGIC)),
            le_u16, // disk number
            le_u16, // central directory start disk
            le_u16, // entries on this disk
            le_u16, // total entries
            le_u32, // central directory size
            le_u32, // central directory offset
        )
            .parse_next(input)?;

        Ok(EndOfCentralDirectory {
            total_entries,
            central_dir_offset,
        })
    }

    /// Search the magic backwards from the end of the file, one window at
    /// a time; the record usually sits in the last few dozen bytes.
    pub(crate) fn locate(input: &[u8], window: usize) -> Option<usize> {
        let mut end = input.len();

        while end > 0 {
            let start = end.saturating_sub(window);
            if let Some(pos) = memmem::rfind(&input[start..end], &Self::MAGIC) {
                return Some(start + pos);
            }
            end = start;
        }

        None
    }
}

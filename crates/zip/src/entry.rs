use flate2::{Decompress, FlushDecompress};
use log::debug;

use crate::errors::ZipError;
use crate::structs::central_directory::CentralDirectory;
use crate::structs::eocd::EndOfCentralDirectory;
use crate::structs::local_file_header::LocalFileHeader;

/// How far back from the end of the file the end-of-central-directory
/// scan looks per window.
const EOCD_SCAN_WINDOW: usize = 4096;

/// Compression methods APKs use.
const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

/// A parsed ZIP archive held in memory.
pub struct ZipEntry {
    input: Vec<u8>,
    central_directory: CentralDirectory,
}

impl ZipEntry {
    pub fn new(input: Vec<u8>) -> Result<ZipEntry, ZipError> {
        // perform basic sanity check
        if !input.starts_with(b"PK\x03\x04") {
            return Err(ZipError::InvalidHeader);
        }

        let eocd_offset = EndOfCentralDirectory::locate(&input, EOCD_SCAN_WINDOW)
            .ok_or(ZipError::MissingEocd)?;
        let eocd = EndOfCentralDirectory::parse(&mut &input[eocd_offset..])
            .map_err(|_| ZipError::ParseError)?;
        debug!("central directory with {} entries", eocd.total_entries);

        let central_directory =
            CentralDirectory::parse(&input, &eocd).map_err(|_| ZipError::ParseError)?;

        Ok(ZipEntry {
            input,
            central_directory,
        })
    }

    /// Names of the entries in the central directory.
    pub fn namelist(&self) -> impl Iterator<Item = &str> {
        self.central_directory.entries.keys().map(String::as_str)
    }

    /// Decompress one entry.
    pub fn read(&self, filename: &str) -> Result<Vec<u8>, ZipError> {
        let entry = self
            .central_directory
            .entries
            .get(filename)
            .ok_or(ZipError::FileNotFound)?;

        let local_header = LocalFileHeader::parse(&self.input, entry.local_header_offset as usize)
            .map_err(|_| ZipError::ParseError)?;

        // local headers written with streaming tools store zero sizes and
        // defer to the central directory
        let (compressed_size, uncompressed_size) =
            if local_header.compressed_size == 0 || local_header.uncompressed_size == 0 {
                (entry.compressed_size as usize, entry.uncompressed_size as usize)
            } else {
                (
                    local_header.compressed_size as usize,
                    local_header.uncompressed_size as usize,
                )
            };

        let offset = entry.local_header_offset as usize + local_header.size();
        let slice = |len: usize| {
            offset
                .checked_add(len)
                .and_then(|end| self.input.get(offset..end))
                .ok_or(ZipError::Eof)
        };

        match local_header.compression_method {
            METHOD_STORED => Ok(slice(uncompressed_size)?.to_vec()),
            METHOD_DEFLATED => {
                let compressed = slice(compressed_size)?;
                let mut uncompressed = Vec::with_capacity(uncompressed_size);

                Decompress::new(false)
                    .decompress_vec(compressed, &mut uncompressed, FlushDecompress::Finish)
                    .map_err(|_| ZipError::DecompressionError)?;

                Ok(uncompressed)
            }
            other => Err(ZipError::UnsupportedMethod(other)),
        }
    }
}

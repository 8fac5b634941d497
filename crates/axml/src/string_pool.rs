//! The manifest's string pool: an offset table into a raw block of
//! per-string encoded data.

use winnow::binary::{le_u16, le_u32};
use winnow::combinator::repeat;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

/// String chunk header size: tag, chunk size, string count, style count,
/// reserved word, string data offset, style data offset.
const HEADER_SIZE: u32 = 28;

#[derive(Debug)]
pub(crate) struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    /// Parse the string chunk. The caller has consumed the chunk tag; on
    /// return the input is positioned at the next chunk.
    pub(crate) fn parse(input: &mut &[u8]) -> ModalResult<StringPool> {
        let (chunk_size, string_count, style_count, _reserved, strings_start, styles_start) =
            (le_u32, le_u32, le_u32, le_u32, le_u32, le_u32).parse_next(input)?;

        let string_offsets: Vec<u32> =
            repeat(string_count as usize, le_u32).parse_next(input)?;
        let _ = take(style_count as usize * 4).parse_next(input)?;

        // the offset tables normally run right up to the raw data
        let consumed = HEADER_SIZE + 4 * (string_count + style_count);
        let _ = take(strings_start.saturating_sub(consumed) as usize).parse_next(input)?;

        let raw_len = if styles_start > 0 {
            styles_start.checked_sub(strings_start)
        } else {
            chunk_size.checked_sub(strings_start)
        }
        .ok_or_else(|| ErrMode::Cut(ContextError::new()))?;
        let raw = take(raw_len as usize).parse_next(input)?;

        if styles_start > 0 {
            let style_len = chunk_size
                .checked_sub(styles_start)
                .ok_or_else(|| ErrMode::Cut(ContextError::new()))?;
            log::debug!("skipping {style_len} bytes of style data");
            let _ = take(style_len as usize).parse_next(input)?;
        }

        let mut strings = Vec::with_capacity(string_count as usize);
        for &offset in &string_offsets {
            let mut slice = raw
                .get(offset as usize..)
                .ok_or_else(|| ErrMode::Cut(ContextError::new()))?;
            strings.push(Self::parse_string(&mut slice)?);
        }

        Ok(StringPool { strings })
    }

    /// Decode one string at its offset in the raw block.
    ///
    /// The 16-bit length prefix does double duty: when its two bytes are
    /// equal the value is a duplicated single-byte length and the payload
    /// is that many UTF-8 bytes; otherwise it is a UTF-16 code-unit count.
    fn parse_string(input: &mut &[u8]) -> ModalResult<String> {
        let length = le_u16(input)?;
        let (hi, lo) = ((length >> 8) as u8, (length & 0xff) as u8);

        if hi == lo {
            let content = take(lo as usize).parse_next(input)?;
            Ok(String::from_utf8_lossy(content).into_owned())
        } else {
            let content = take(length as usize * 2).parse_next(input)?;
            Ok(Self::read_utf16(content))
        }
    }

    fn read_utf16(slice: &[u8]) -> String {
        char::decode_utf16(
            slice
                .chunks_exact(2)
                .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]])),
        )
        .collect::<Result<String, _>>()
        .unwrap_or_default()
    }

    pub(crate) fn get(&self, idx: u32) -> Option<&str> {
        self.strings.get(idx as usize).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.strings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16_string(s: &str) -> Vec<u8> {
        let units: Vec<u16> = s.encode_utf16().collect();
        let mut out = (units.len() as u16).to_le_bytes().to_vec();
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }

    fn pool_bytes(strings: &[Vec<u8>]) -> Vec<u8> {
        let mut offsets = Vec::new();
        let mut raw = Vec::new();
        for encoded in strings {
            offsets.push(raw.len() as u32);
            raw.extend_from_slice(encoded);
        }

        let strings_start = HEADER_SIZE + 4 * strings.len() as u32;
        let chunk_size = strings_start + raw.len() as u32;

        let mut out = Vec::new();
        out.extend_from_slice(&chunk_size.to_le_bytes());
        out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // styles
        out.extend_from_slice(&0u32.to_le_bytes()); // reserved
        out.extend_from_slice(&strings_start.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // no style data
        for offset in offsets {
            out.extend_from_slice(&offset.to_le_bytes());
        }
        out.extend_from_slice(&raw);
        out
    }

    #[test]
    fn decodes_utf16_strings() {
        let data = pool_bytes(&[utf16_string("manifest"), utf16_string("uses-sdk")]);
        let mut input = &data[..];

        let pool = StringPool::parse(&mut input).unwrap();
        assert!(input.is_empty());
        assert_eq!(pool.get(0), Some("manifest"));
        assert_eq!(pool.get(1), Some("uses-sdk"));
        assert_eq!(pool.get(2), None);
    }

    #[test]
    fn decodes_duplicated_length_as_utf8() {
        // "abc": duplicated single-byte length 3, then utf-8 payload
        let encoded = vec![3u8, 3, b'a', b'b', b'c'];
        // the length prefix is the u16 0x0303, both bytes equal
        let data = pool_bytes(&[encoded]);

        let pool = StringPool::parse(&mut &data[..]).unwrap();
        assert_eq!(pool.get(0), Some("abc"));
    }

    #[test]
    fn utf16_length_counts_units() {
        let encoded = utf16_string("snowman \u{2603}");
        // 9 characters, all in the basic plane: 9 units
        assert_eq!(u16::from_le_bytes([encoded[0], encoded[1]]), 9);
        assert_eq!(encoded.len() - 2, 9 * 2);

        let data = pool_bytes(&[encoded]);
        let pool = StringPool::parse(&mut &data[..]).unwrap();
        assert_eq!(pool.get(0), Some("snowman \u{2603}"));
    }

    #[test]
    fn utf8_length_counts_bytes() {
        let payload = "caf\u{e9}"; // 5 utf-8 bytes
        let mut encoded = vec![5u8, 5];
        encoded.extend_from_slice(payload.as_bytes());

        let data = pool_bytes(&[encoded]);
        let pool = StringPool::parse(&mut &data[..]).unwrap();
        assert_eq!(pool.get(0), Some(payload));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn offset_past_raw_block_fails() {
        let mut data = pool_bytes(&[utf16_string("x")]);
        // corrupt the single offset-table entry
        data[HEADER_SIZE as usize - 4..HEADER_SIZE as usize]
            .copy_from_slice(&0x1000u32.to_le_bytes());
        assert!(StringPool::parse(&mut &data[..]).is_err());
    }
}

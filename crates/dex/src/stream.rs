//! Byte-level primitives shared by the dex record decoders.

use std::borrow::Cow;

use winnow::binary::u8;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

/// Decode an unsigned LEB128 integer.
///
/// The encoding is capped at five bytes (35 bits of shift); a fifth byte
/// that still carries the continuation bit is malformed.
pub(crate) fn uleb128(input: &mut &[u8]) -> ModalResult<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;

    loop {
        let byte = u8.parse_next(input)?;
        value |= ((byte & 0x7f) as u64) << shift;

        if byte & 0x80 == 0 {
            return Ok(value);
        }

        shift += 7;
        if shift >= 35 {
            return Err(ErrMode::Cut(ContextError::new()));
        }
    }
}

/// Decode a pool string: an unused LEB128 prefix (the UTF-16 unit count)
/// followed by MUTF-8 bytes up to the first NUL.
pub(crate) fn pool_string(mut input: &[u8]) -> Option<Cow<'_, str>> {
    uleb128(&mut input).ok()?;

    let end = memchr::memchr(0, input).unwrap_or(input.len());
    Some(simd_cesu8::mutf8::decode_lossy(&input[..end]))
}

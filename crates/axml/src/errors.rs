//! Errors returned by this crate.

use thiserror::Error;

/// Errors that may occur while parsing a binary `AndroidManifest.xml`.
#[derive(Error, Debug)]
pub enum AxmlError {
    /// Provided file too small to be a manifest
    #[error("file size too small for manifest")]
    TooSmall,

    #[error("got truncated input")]
    Truncated,

    #[error("invalid file tag: {0:#010x}")]
    InvalidFileTag(u32),

    #[error("invalid string chunk tag: {0:#010x}")]
    InvalidStringChunkTag(u32),

    #[error("invalid resource chunk tag: {0:#010x}")]
    InvalidResourceChunkTag(u32),

    #[error("resource chunk size is not 4-byte aligned: {0}")]
    MisalignedResourceChunk(u32),

    #[error("got error while parsing string pool")]
    StringPoolError,

    #[error("unexpected element tag: {0:#010x}")]
    UnexpectedElementTag(u32),

    #[error("got error while parsing xml element")]
    ElementError,

    #[error("string index out of range: {0}")]
    StringIndex(i32),

    #[error("can't get root for xml tree")]
    MissingRoot,
}

//! Errors returned by this crate.

use thiserror::Error;

/// Errors that may occur while decoding a dex file or resolving test methods.
#[derive(Error, Debug)]
pub enum DexError {
    #[error("invalid dex magic")]
    InvalidMagic,

    #[error("unsupported dex version")]
    UnsupportedVersion,

    #[error("invalid endian tag: {0:#010x}")]
    InvalidEndianTag(u32),

    #[error("got truncated input")]
    Truncated,

    #[error("got error while parsing string_ids")]
    StringError,

    #[error("got error while parsing type_ids")]
    TypeError,

    #[error("got error while parsing proto_ids")]
    ProtoError,

    #[error("got error while parsing field_ids")]
    FieldError,

    #[error("got error while parsing method_ids")]
    MethodError,

    #[error("got error while parsing class_defs")]
    ClassError,

    #[error("got error while parsing class data")]
    ClassDataError,

    #[error("got error while parsing annotations")]
    AnnotationError,

    #[error("string index out of range: {0}")]
    StringIndex(u64),

    #[error("type index out of range: {0}")]
    TypeIndex(u64),

    #[error("method index out of range: {0}")]
    MethodIndex(u64),
}

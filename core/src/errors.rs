use std::io;

use apkdump_axml::AxmlError;
use apkdump_dex::DexError;
use apkdump_zip::ZipError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApkError {
    /// Generic I/O error while trying to read data
    #[error(transparent)]
    IoError(#[from] io::Error),

    /// Got invalid input (for example, empty file or not apk)
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Error occurred while parsing apk as zip archive
    #[error("got error while parsing apk archive")]
    ZipError(#[from] ZipError),

    /// Error occurred while parsing a dex entry
    #[error("got error while parsing dex entry")]
    DexError(#[from] DexError),

    /// Error occurred while parsing AndroidManifest.xml
    #[error("got error while parsing AndroidManifest.xml")]
    ManifestError(#[from] AxmlError),
}

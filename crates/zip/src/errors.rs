use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZipError {
    /// Basic sanity check
    #[error("provided file is not a zip archive")]
    InvalidHeader,

    /// Can't operate without the end-of-central-directory record
    #[error("can't find end of central directory in zip")]
    MissingEocd,

    /// Generic parsing error
    #[error("got error while parsing zip archive")]
    ParseError,

    /// Requested file not present in the central directory
    #[error("file not exist in zip")]
    FileNotFound,

    /// APKs only ever store or deflate their entries
    #[error("unsupported compression method: {0}")]
    UnsupportedMethod(u16),

    /// Got error while decompressing entry
    #[error("got error while decompressing entry")]
    DecompressionError,

    /// Entry data runs past the end of the file
    #[error("got EOF while reading entry data")]
    Eof,
}

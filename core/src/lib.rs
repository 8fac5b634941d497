pub mod apk;
pub mod errors;

pub use apk::Apk;
pub use errors::ApkError;

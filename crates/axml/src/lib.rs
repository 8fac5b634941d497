pub mod axml;
pub mod elements;
pub mod errors;
pub mod manifest;

mod string_pool;

pub use axml::XmlDocument;
pub use elements::{XmlAttr, XmlTag};
pub use errors::AxmlError;
pub use manifest::{Instrumentation, Manifest, UsesSdk};

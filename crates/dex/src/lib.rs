pub mod annotations;
pub mod class_data;
pub mod dex;
pub mod encoded_value;
pub mod errors;
pub mod resolver;

mod stream;

pub use dex::Dex;
pub use encoded_value::EncodedValue;
pub use errors::DexError;
pub use resolver::{DEFAULT_TEST_BASE_CLASSES, TestResolver, descriptor_to_dotted};

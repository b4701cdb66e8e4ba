pub mod field_extractor;
pub mod locator;
pub mod page_validator;

pub use field_extractor::*;
pub use locator::*;
pub use page_validator::*;

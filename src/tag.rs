pub mod attribute;
pub mod catalog;

pub use attribute::{AttributeError, AttributeList, AttributeValue};
pub use catalog::{TagCategory, TagDescriptor, TagName, ValueKind, lookup};

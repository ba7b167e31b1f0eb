//! Data module - workbook loading and value coercion

pub mod loader;
pub mod processor;

pub use loader::{DataLoader, LoaderError, NoticeSource};
pub use processor::ProcessorError;

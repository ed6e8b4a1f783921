pub mod import;
pub mod reader;
pub mod records;
pub mod writer;

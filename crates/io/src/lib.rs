// File I/O operations

pub mod bbox;
pub mod csv;
pub mod error;
pub mod export;
pub mod mapping;
pub mod pdftotext;

pub use error::IoError;

//! Bulk import of contacts from word-processing documents.

pub mod converter;
pub mod parser;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("unsupported file format {0:?}; expected .doc or .docx")]
    UnsupportedFormat(String),
    #[error("document conversion failed: {0}")]
    Conversion(String),
    #[error("no contacts found in document")]
    NoCandidates,
}

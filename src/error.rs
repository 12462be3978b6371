//! Error types for the PDF object model and writer

use std::io;
use thiserror::Error;
use crate::pdf::{ObjectId, ObjectKey};

/// Main error type for object model and write operations
#[derive(Error, Debug)]
pub enum PDFError {
    /// I/O failure outside a write pass, such as creating the output file
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// The sink failed during a write pass. `key` names the indirect
    /// object being rendered, or is `None` for the header, xref table,
    /// trailer and final flush.
    #[error("Visitor error while writing {}: {}", write_site(.key), .source)]
    Visitor {
        key: Option<ObjectKey>,
        #[source]
        source: io::Error,
    },

    /// Malformed PDF structure
    #[error("Malformed PDF structure: {0}")]
    MalformedPDF(String),

    /// Invalid object type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        expected: &'static str,
        found: &'static str,
    },

    /// Reference to an object that is not in the document
    #[error("Dangling reference to {0} under key /{1}")]
    DanglingReference(ObjectId, String),

    /// Object not found
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Cross reference table error
    #[error("Cross reference table error: {0}")]
    XRefError(String),

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Filter input that cannot be decoded
    #[error("Invalid filter data: {0}")]
    InvalidData(String),

    /// Compression error
    #[error("Compression error: {0}")]
    CompressionError(String),

    /// Integer parsing error
    #[error("Integer parsing error: {0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    /// Hex decoding error
    #[error("Hex decoding error: {0}")]
    HexError(#[from] hex::FromHexError),
}

/// Result type for object model and write operations
pub type PDFResult<T> = Result<T, PDFError>;

fn write_site(key: &Option<ObjectKey>) -> String {
    match key {
        Some(key) => format!("object {}", key),
        None => "file structure".to_string(),
    }
}

impl PDFError {
    /// Create a new malformed PDF error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPDF(msg.into())
    }

    /// Create a new cross reference error
    pub fn xref(msg: impl Into<String>) -> Self {
        Self::XRefError(msg.into())
    }

    /// Wrap a raw I/O failure raised while `key` was being rendered.
    /// Errors of any other kind, including ones already wrapped, pass
    /// through unchanged.
    pub fn visitor(self, key: Option<ObjectKey>) -> Self {
        match self {
            Self::IoError(source) => Self::Visitor { key, source },
            other => other,
        }
    }

    /// Check if error came from the output sink
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::IoError(_) | Self::Visitor { .. })
    }

    /// Check if error is related to PDF structure
    pub fn is_structure_error(&self) -> bool {
        matches!(self,
            Self::MalformedPDF(_) |
            Self::InvalidObjectType { .. } |
            Self::DanglingReference(..) |
            Self::ObjectNotFound(_) |
            Self::XRefError(_)
        )
    }

    /// Check if error came from a stream filter
    pub fn is_filter_error(&self) -> bool {
        matches!(self,
            Self::UnsupportedFilter(_) |
            Self::InvalidData(_) |
            Self::CompressionError(_)
        )
    }
}

//! PDF object model and writer for Rust
//!
//! Documents are built in memory as an arena of objects addressed by
//! [`ObjectId`] handles and written out in full: a header, every object
//! reachable from the trailer, a cross-reference table and the trailer.
//!
//! ```no_run
//! use pdf_cos::{Dictionary, PDFDocument};
//!
//! let mut document = PDFDocument::new();
//! let mut catalog = Dictionary::with_type("Catalog");
//! catalog.set("Pages", Dictionary::with_type("Pages"));
//! let root = document.add_object(catalog);
//! document.set_root(root);
//! document.save("out.pdf")?;
//! # Ok::<(), pdf_cos::PDFError>(())
//! ```

mod config;
mod error;
pub mod pdf;

pub use config::{LineEnding, WriterConfig, DEFAULT_BUFFER_CAPACITY};
pub use error::{PDFError, PDFResult};
pub use pdf::{
    Dictionary, Filter, Name, ObjectId, ObjectKey, ObjectType, PDFDocument, PDFObject,
    PDFString, PDFWriter, Stream, WriteSummary, XRefEntry, XRefTable,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<PDFDocument>();
    }

    #[test]
    fn test_to_bytes_starts_with_header() -> PDFResult<()> {
        let mut document = PDFDocument::with_version("1.7");
        let root = document.add_object(Dictionary::with_type("Catalog"));
        document.set_root(root);

        let bytes = document.to_bytes()?;
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.ends_with(b"%%EOF"));
        Ok(())
    }
}

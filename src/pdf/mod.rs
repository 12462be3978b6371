//! PDF object model and serialization

mod dict;
mod document;
mod filter;
mod format;
mod keys;
mod object;
mod output;
mod stream;
mod string;
mod writer;
pub mod xref;

pub use dict::Dictionary;
pub use document::{PDFDocument, DEFAULT_VERSION};
pub use filter::Filter;
pub use keys::ObjectKeyRegistry;
pub use object::{Name, ObjectId, ObjectKey, ObjectType, PDFObject};
pub use output::PDFOutputStream;
pub use stream::Stream;
pub use string::PDFString;
pub use writer::{PDFWriter, WriteSummary};
pub use xref::{find_startxref, read_xref, XRefEntry, XRefTable};

//! In-memory PDF document: an object arena plus a trailer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::debug;

use crate::config::WriterConfig;
use crate::error::{PDFError, PDFResult};
use super::{Dictionary, Name, ObjectId, ObjectKey, ObjectType, PDFObject, PDFWriter};

/// Header version used for new documents
pub const DEFAULT_VERSION: &str = "1.4";

/// PDF document.
///
/// Objects live in an arena and are addressed by [`ObjectId`]. Containers
/// share objects by holding [`ObjectType::Reference`] handles, so any graph,
/// cycles included, can be expressed without shared ownership.
#[derive(Debug, Clone)]
pub struct PDFDocument {
    version: String,
    objects: Vec<PDFObject>,
    trailer: Dictionary,
}

impl Default for PDFDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PDFDocument {
    pub fn new() -> Self {
        Self::with_version(DEFAULT_VERSION)
    }

    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            objects: Vec::new(),
            trailer: Dictionary::new(),
        }
    }

    /// Version written after `%PDF-`
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Header line, without line ending
    pub fn header(&self) -> String {
        format!("%PDF-{}", self.version)
    }

    /// Store a new object and return its handle
    pub fn add_object(&mut self, object: impl Into<ObjectType>) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(PDFObject::new(object.into()));
        id
    }

    /// Store an object loaded from a file under its original key. The key
    /// is kept on output unless another object already claimed the number.
    pub fn insert_parsed(&mut self, key: ObjectKey, object: impl Into<ObjectType>) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(PDFObject::parsed(key, object.into()));
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&PDFObject> {
        self.objects.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut PDFObject> {
        self.objects.get_mut(id.0)
    }

    /// Parsed key of an object, if it came from a file
    pub fn object_key(&self, id: ObjectId) -> Option<ObjectKey> {
        self.get(id).and_then(|object| object.key)
    }

    /// Handle of the object that was parsed under `key`
    pub fn id_for_key(&self, key: ObjectKey) -> Option<ObjectId> {
        self.objects
            .iter()
            .position(|object| object.key == Some(key))
            .map(ObjectId)
    }

    /// Follow references from `id` to a direct value
    pub fn resolve(&self, id: ObjectId) -> PDFResult<&ObjectType> {
        let mut current = id;
        for _ in 0..=self.objects.len() {
            let object = self.get(current).ok_or(PDFError::ObjectNotFound(current))?;
            match object.object_type {
                ObjectType::Reference(next) => current = next,
                ref value => return Ok(value),
            }
        }
        Err(PDFError::malformed(format!("Reference cycle starting at {}", id)))
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn trailer_mut(&mut self) -> &mut Dictionary {
        &mut self.trailer
    }

    /// Point the trailer's `/Root` at the document catalog
    pub fn set_root(&mut self, id: ObjectId) {
        self.trailer.set_reference(Name::ROOT, id);
    }

    pub fn set_info(&mut self, id: ObjectId) {
        self.trailer.set_reference(Name::INFO, id);
    }

    pub fn set_encrypt(&mut self, id: ObjectId) {
        self.trailer.set_reference(Name::ENCRYPT, id);
    }

    pub fn root_id(&self) -> Option<ObjectId> {
        self.trailer.get_reference(Name::ROOT)
    }

    /// The document catalog
    pub fn catalog(&self) -> PDFResult<&Dictionary> {
        let id = self
            .root_id()
            .ok_or_else(|| PDFError::malformed("Trailer has no /Root reference"))?;
        match self.resolve(id)? {
            ObjectType::Dictionary(dictionary) => Ok(dictionary),
            other => Err(PDFError::InvalidObjectType {
                expected: "Dictionary",
                found: other.type_name(),
            }),
        }
    }

    pub fn objects(&self) -> &[PDFObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Serialize the whole document with default settings
    pub fn write<W: Write>(&self, sink: W) -> PDFResult<()> {
        self.write_with_config(sink, WriterConfig::default())
    }

    pub fn write_with_config<W: Write>(&self, sink: W, config: WriterConfig) -> PDFResult<()> {
        PDFWriter::with_config(config).write(self, sink)
    }

    /// Write the document to a file, replacing it if it exists
    pub fn save<P: AsRef<Path>>(&self, path: P) -> PDFResult<()> {
        let path = path.as_ref();
        debug!("Saving document to {}", path.display());
        let file = File::create(path)?;
        self.write(file)
    }

    pub fn to_bytes(&self) -> PDFResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;
        Ok(buffer)
    }
}

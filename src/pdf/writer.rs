//! Full-rewrite PDF serializer
//!
//! Writes the header, every object reachable from the trailer as an
//! indirect object, a single-section cross-reference table and the
//! trailer. Nested dictionaries and streams are never inlined: they get
//! their own object and are referenced as `n g R`, which keeps the output
//! bounded for cyclic graphs.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{BufWriter, Read, Write};

use log::{debug, trace, warn};

use crate::config::WriterConfig;
use crate::error::{PDFError, PDFResult};
use super::format::{write_name, write_real, write_string};
use super::keys::ObjectKeyRegistry;
use super::output::PDFOutputStream;
use super::xref::{XRefEntry, XRefTable};
use super::{Dictionary, Name, ObjectId, ObjectKey, ObjectType, PDFDocument};

/// Binary marker written on the second header line
const BINARY_MARKER: [u8; 4] = [0xF6, 0xE4, 0xFC, 0xDF];

/// Array elements per output line
const ITEMS_PER_LINE: usize = 10;

/// Outcome of the last write pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteSummary {
    /// Indirect objects written to the body
    pub objects_written: usize,
    /// Rows in the cross-reference table, also the trailer `/Size`
    pub xref_size: u32,
    /// Byte offset of the `xref` keyword
    pub startxref: u64,
    /// Dictionary entries dropped because their value was null or dangling
    pub skipped_entries: usize,
}

/// PDF document writer
#[derive(Debug, Default)]
pub struct PDFWriter {
    config: WriterConfig,
    summary: Option<WriteSummary>,
}

impl PDFWriter {
    /// Create a writer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WriterConfig) -> Self {
        Self {
            config,
            summary: None,
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Summary of the last successful write
    pub fn summary(&self) -> Option<&WriteSummary> {
        self.summary.as_ref()
    }

    /// Serialize `document` into `sink`.
    ///
    /// The document is only read. Keys assigned during the pass are
    /// discarded afterwards, so writing the same document twice produces
    /// the same bytes. On error the sink may hold a partial file. Every
    /// failure of the sink, including the final flush, is reported as
    /// [`PDFError::Visitor`].
    pub fn write<W: Write>(&mut self, document: &PDFDocument, sink: W) -> PDFResult<()> {
        self.summary = None;

        let buffered = BufWriter::with_capacity(self.config.buffer_capacity, sink);
        let mut output = PDFOutputStream::new(buffered, self.config.line_ending.as_bytes());

        let mut pass = WritePass::new(document, &self.config);
        let summary = pass
            .run(&mut output)
            .and_then(|summary| {
                output.flush()?;
                Ok(summary)
            })
            .map_err(|err| err.visitor(None))?;

        debug!(
            "Wrote {} objects, xref at {}, {} entries skipped",
            summary.objects_written, summary.startxref, summary.skipped_entries
        );
        self.summary = Some(summary);
        Ok(())
    }
}

/// Object waiting in the body queue
#[derive(Debug, Clone, Copy)]
enum Pending<'a> {
    /// Arena object, keyed through the registry
    Indirect(ObjectId),
    /// Dictionary or stream owned by another container or the trailer
    Inline(&'a ObjectType),
}

/// A value after following indirect references
#[derive(Debug, Clone, Copy)]
enum Resolved<'a> {
    Inline(&'a ObjectType),
    Arena(ObjectId, &'a ObjectType),
    Dangling(ObjectId),
}

/// Container being rendered inline
enum Frame<'a> {
    Array {
        items: std::slice::Iter<'a, ObjectType>,
        index: usize,
        id: Option<ObjectId>,
    },
    Dictionary {
        entries: indexmap::map::Iter<'a, Name, ObjectType>,
        /// Entry whose value is replaced, or appended when absent
        replace: Option<(&'static str, i64)>,
        replaced: bool,
        /// Entry skipped entirely
        omit: Option<&'static str>,
        /// Stream data written after `>>`
        payload: Option<Vec<u8>>,
    },
}

enum Step<'a> {
    Item(usize, &'a ObjectType),
    Entry(&'a Name, &'a ObjectType),
    Replace(&'static str, i64),
    Close,
}

impl<'a> Frame<'a> {
    fn array(items: &'a [ObjectType], id: Option<ObjectId>) -> Self {
        Frame::Array {
            items: items.iter(),
            index: 0,
            id,
        }
    }

    fn dictionary(dictionary: &'a Dictionary) -> Self {
        Frame::Dictionary {
            entries: dictionary.iter(),
            replace: None,
            replaced: false,
            omit: None,
            payload: None,
        }
    }

    fn with_replacement(mut self, name: &'static str, value: i64) -> Self {
        if let Frame::Dictionary { replace, .. } = &mut self {
            *replace = Some((name, value));
        }
        self
    }

    fn with_omission(mut self, name: &'static str) -> Self {
        if let Frame::Dictionary { omit, .. } = &mut self {
            *omit = Some(name);
        }
        self
    }

    fn with_payload(mut self, data: Vec<u8>) -> Self {
        if let Frame::Dictionary { payload, .. } = &mut self {
            *payload = Some(data);
        }
        self
    }

    fn step(&mut self) -> Step<'a> {
        match self {
            Frame::Array { items, index, .. } => match items.next() {
                Some(item) => {
                    let position = *index;
                    *index += 1;
                    Step::Item(position, item)
                }
                None => Step::Close,
            },
            Frame::Dictionary { entries, replace, replaced, omit, .. } => loop {
                let Some((name, value)) = entries.next() else {
                    return match *replace {
                        Some((key, number)) if !*replaced => {
                            *replaced = true;
                            Step::Replace(key, number)
                        }
                        _ => Step::Close,
                    };
                };
                if *omit == Some(name.as_str()) {
                    continue;
                }
                return match *replace {
                    Some((key, number)) if name.as_str() == key => {
                        *replaced = true;
                        Step::Replace(key, number)
                    }
                    _ => Step::Entry(name, value),
                };
            },
        }
    }
}

/// Node of the trailer walk in `seed_queue`
enum Visit<'a> {
    Value(&'a ObjectType),
    /// An arena array's items are done
    Leave(ObjectId),
}

/// State of a single write call
struct WritePass<'a> {
    document: &'a PDFDocument,
    config: &'a WriterConfig,
    registry: ObjectKeyRegistry,
    pending: VecDeque<Pending<'a>>,
    /// Arena objects written or queued
    scheduled: HashSet<ObjectId>,
    /// Inline dictionaries and streams written or queued, by address
    scheduled_inline: HashSet<*const ObjectType>,
    /// Keys of inline dictionaries and streams. The document is borrowed
    /// for the whole pass, so addresses are stable.
    inline_keys: HashMap<*const ObjectType, ObjectKey>,
    /// Arena arrays currently open on the render stack
    open_arrays: HashSet<ObjectId>,
    xref: XRefTable,
    skipped_entries: usize,
}

impl<'a> WritePass<'a> {
    fn new(document: &'a PDFDocument, config: &'a WriterConfig) -> Self {
        let mut registry = ObjectKeyRegistry::new();
        for (index, object) in document.objects().iter().enumerate() {
            if let Some(key) = object.key {
                registry.seed(ObjectId(index), key);
            }
        }

        Self {
            document,
            config,
            registry,
            pending: VecDeque::new(),
            scheduled: HashSet::new(),
            scheduled_inline: HashSet::new(),
            inline_keys: HashMap::new(),
            open_arrays: HashSet::new(),
            xref: XRefTable::new(),
            skipped_entries: 0,
        }
    }

    fn run<W: Write>(&mut self, out: &mut PDFOutputStream<W>) -> PDFResult<WriteSummary> {
        let document: &'a PDFDocument = self.document;
        let trailer = document.trailer();
        self.check_root(trailer)?;
        self.write_header(out)?;

        self.seed_queue(trailer);
        debug!("Writing body, {} objects queued from the trailer", self.pending.len());
        self.write_body(out)?;

        let startxref = out.position();
        let size = self.xref.size()?;
        let trailer_bytes = self.render_trailer(trailer, size, startxref)?;
        if !self.pending.is_empty() {
            return Err(PDFError::malformed("Trailer references objects missing from the body"));
        }

        self.xref.write_to(out)?;
        out.write_all(&trailer_bytes)?;

        Ok(WriteSummary {
            objects_written: self.xref.len(),
            xref_size: size,
            startxref,
            skipped_entries: self.skipped_entries,
        })
    }

    fn check_root(&self, trailer: &'a Dictionary) -> PDFResult<()> {
        let Some(root) = trailer.get(Name::ROOT) else {
            return Ok(());
        };
        match self.resolve(root) {
            Resolved::Inline(ObjectType::Dictionary(_)) | Resolved::Arena(_, ObjectType::Dictionary(_)) => Ok(()),
            Resolved::Inline(ObjectType::Null) | Resolved::Arena(_, ObjectType::Null) | Resolved::Dangling(_) => Ok(()),
            Resolved::Inline(other) | Resolved::Arena(_, other) => Err(PDFError::malformed(format!(
                "Trailer /Root is {}, expected a dictionary",
                other.type_name()
            ))),
        }
    }

    fn write_header<W: Write>(&self, out: &mut PDFOutputStream<W>) -> PDFResult<()> {
        write!(out, "%PDF-{}", self.document.version())?;
        out.write_eol()?;
        out.write_all(b"%")?;
        out.write_all(&BINARY_MARKER)?;
        out.write_eol()?;
        Ok(())
    }

    /// Queue `/Root`, `/Info` and `/Encrypt`, then every other object the
    /// trailer will reference. The walk follows `render`: arena arrays are
    /// inlined unless already open, in which case they are referenced.
    fn seed_queue(&mut self, trailer: &'a Dictionary) {
        const PRIMARY: [&str; 3] = [Name::ROOT, Name::INFO, Name::ENCRYPT];

        for key in PRIMARY {
            if let Some(value) = trailer.get(key) {
                match self.resolve(value) {
                    Resolved::Arena(id, target) if target.is_container() => self.enqueue(id),
                    Resolved::Inline(target) if target.is_container() => self.enqueue_inline(target),
                    _ => {}
                }
            }
        }

        let mut open = HashSet::new();
        let mut stack: Vec<Visit<'a>> = trailer
            .iter()
            .filter(|(name, _)| name.as_str() != Name::SIZE && name.as_str() != Name::PREV)
            .map(|(_, value)| Visit::Value(value))
            .rev()
            .collect();
        while let Some(visit) = stack.pop() {
            let value = match visit {
                Visit::Value(value) => value,
                Visit::Leave(id) => {
                    open.remove(&id);
                    continue;
                }
            };
            match self.resolve(value) {
                Resolved::Arena(id, target) if target.is_container() => self.enqueue(id),
                Resolved::Inline(target) if target.is_container() => self.enqueue_inline(target),
                Resolved::Arena(id, ObjectType::Array(items)) => {
                    if open.insert(id) {
                        stack.push(Visit::Leave(id));
                        stack.extend(items.iter().rev().map(Visit::Value));
                    } else {
                        self.enqueue(id);
                    }
                }
                Resolved::Inline(ObjectType::Array(items)) => {
                    stack.extend(items.iter().rev().map(Visit::Value));
                }
                _ => {}
            }
        }
    }

    fn write_body<W: Write>(&mut self, out: &mut PDFOutputStream<W>) -> PDFResult<()> {
        while let Some(next) = self.pending.pop_front() {
            match next {
                Pending::Indirect(id) => {
                    let key = self.registry.get_or_assign(id)?;
                    let value = self.lookup(id).ok_or(PDFError::ObjectNotFound(id))?;
                    self.write_object(out, key, value, Some(id))?;
                }
                Pending::Inline(value) => {
                    let key = self.inline_key(value)?;
                    self.write_object(out, key, value, None)?;
                }
            }
        }
        Ok(())
    }

    fn write_object<W: Write>(
        &mut self,
        out: &mut PDFOutputStream<W>,
        key: ObjectKey,
        value: &'a ObjectType,
        id: Option<ObjectId>,
    ) -> PDFResult<()> {
        trace!("Writing object {} at offset {}", key, out.position());
        self.xref.push(XRefEntry::used(out.position(), key));

        self.write_object_body(out, key, value, id)
            .map_err(|err| err.visitor(Some(key)))
    }

    fn write_object_body<W: Write>(
        &mut self,
        out: &mut PDFOutputStream<W>,
        key: ObjectKey,
        value: &'a ObjectType,
        id: Option<ObjectId>,
    ) -> PDFResult<()> {
        write!(out, "{} {} obj", key.number, key.generation)?;
        out.write_eol()?;
        self.write_direct(out, value, id)?;
        out.write_eol()?;
        out.write_all(b"endobj")?;
        out.write_eol()?;
        Ok(())
    }

    /// Render the trailer through `%%EOF` into memory. It may only
    /// reference objects already in the body, which `run` checks before
    /// the xref table is written.
    fn render_trailer(&mut self, trailer: &'a Dictionary, size: u32, startxref: u64) -> PDFResult<Vec<u8>> {
        let mut out = PDFOutputStream::new(Vec::new(), self.config.line_ending.as_bytes());
        out.write_all(b"trailer")?;
        out.write_eol()?;
        out.write_all(b"<<")?;
        out.write_eol()?;
        let frame = Frame::dictionary(trailer)
            .with_replacement(Name::SIZE, size as i64)
            .with_omission(Name::PREV);
        self.render(&mut out, frame)?;

        out.write_all(b"startxref")?;
        out.write_eol()?;
        write!(out, "{}", startxref)?;
        out.write_eol()?;
        out.write_all(b"%%EOF")?;
        Ok(out.into_inner())
    }

    /// Render the payload of an indirect object
    fn write_direct<W: Write>(
        &mut self,
        out: &mut PDFOutputStream<W>,
        value: &'a ObjectType,
        id: Option<ObjectId>,
    ) -> PDFResult<()> {
        match value {
            ObjectType::Dictionary(dictionary) => {
                out.write_all(b"<<")?;
                out.write_eol()?;
                self.render(out, Frame::dictionary(dictionary))
            }
            ObjectType::Stream(stream) => {
                let mut payload = Vec::with_capacity(stream.raw_data().len());
                stream
                    .filtered_stream()
                    .read_to_end(&mut payload)
                    .map_err(|err| PDFError::malformed(format!("Unreadable stream payload: {}", err)))?;

                out.write_all(b"<<")?;
                out.write_eol()?;
                let frame = Frame::dictionary(stream.dictionary())
                    .with_replacement(Name::LENGTH, payload.len() as i64)
                    .with_payload(payload);
                self.render(out, frame)
            }
            ObjectType::Array(items) => {
                if let Some(id) = id {
                    self.open_arrays.insert(id);
                }
                out.write_all(b"[")?;
                self.render(out, Frame::array(items, id))
            }
            scalar => write_scalar(out, scalar),
        }
    }

    /// Drive inline rendering of nested containers with an explicit stack.
    /// The opening token of `root` is already written.
    fn render<W: Write>(&mut self, out: &mut PDFOutputStream<W>, root: Frame<'a>) -> PDFResult<()> {
        let mut stack = vec![root];

        while let Some(frame) = stack.last_mut() {
            match frame.step() {
                Step::Item(index, item) => {
                    if index > 0 {
                        if index % ITEMS_PER_LINE == 0 {
                            out.write_eol()?;
                        } else {
                            out.write_all(b" ")?;
                        }
                    }
                    let resolved = self.resolve(item);
                    if let Some(child) = self.write_value(out, resolved)? {
                        stack.push(child);
                    }
                }
                Step::Entry(name, value) => {
                    if let Some(child) = self.write_entry(out, name, value)? {
                        stack.push(child);
                    }
                }
                Step::Replace(name, number) => {
                    write_name(out, &Name::from(name))?;
                    write!(out, " {}", number)?;
                    out.write_eol()?;
                }
                Step::Close => {
                    if let Some(frame) = stack.pop() {
                        self.close(out, frame)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn close<W: Write>(&mut self, out: &mut PDFOutputStream<W>, frame: Frame<'a>) -> PDFResult<()> {
        match frame {
            Frame::Array { id, .. } => {
                if let Some(id) = id {
                    self.open_arrays.remove(&id);
                }
                out.write_all(b"]")?;
                out.write_eol()?;
            }
            Frame::Dictionary { payload, .. } => {
                out.write_all(b">>")?;
                out.write_eol()?;
                if let Some(data) = payload {
                    out.write_all(b"stream")?;
                    out.write_crlf()?;
                    out.write_all(&data)?;
                    out.write_crlf()?;
                    out.write_all(b"endstream")?;
                    out.write_eol()?;
                }
            }
        }
        Ok(())
    }

    /// Write one `/Key value` line. Entries whose value is null or a
    /// dangling reference are dropped.
    fn write_entry<W: Write>(
        &mut self,
        out: &mut PDFOutputStream<W>,
        name: &'a Name,
        value: &'a ObjectType,
    ) -> PDFResult<Option<Frame<'a>>> {
        let resolved = self.resolve(value);
        match resolved {
            Resolved::Inline(ObjectType::Null) | Resolved::Arena(_, ObjectType::Null) => {
                warn!("Dropping entry {} with a null value", name);
                self.skipped_entries += 1;
                return Ok(None);
            }
            Resolved::Dangling(id) => {
                if self.config.strict_references {
                    return Err(PDFError::DanglingReference(id, name.as_str().to_string()));
                }
                warn!("Dropping entry {} with dangling reference {}", name, id);
                self.skipped_entries += 1;
                return Ok(None);
            }
            _ => {}
        }

        write_name(out, name)?;
        out.write_all(b" ")?;
        let child = self.write_value(out, resolved)?;
        if child.is_none() {
            out.write_eol()?;
        }
        Ok(child)
    }

    /// Write a value at a container site. Returns the frame to push when
    /// the value is an array rendered inline.
    fn write_value<W: Write>(
        &mut self,
        out: &mut PDFOutputStream<W>,
        resolved: Resolved<'a>,
    ) -> PDFResult<Option<Frame<'a>>> {
        match resolved {
            Resolved::Inline(value) if value.is_container() => {
                let key = self.schedule_inline(value)?;
                write_reference(out, key)?;
            }
            Resolved::Inline(ObjectType::Array(items)) => {
                out.write_all(b"[")?;
                return Ok(Some(Frame::array(items, None)));
            }
            Resolved::Inline(value) => write_scalar(out, value)?,
            Resolved::Arena(id, target) if target.is_container() => {
                let key = self.schedule(id)?;
                write_reference(out, key)?;
            }
            Resolved::Arena(id, ObjectType::Array(items)) => {
                if self.open_arrays.contains(&id) {
                    // an array reached from inside itself
                    let key = self.schedule(id)?;
                    write_reference(out, key)?;
                } else {
                    self.open_arrays.insert(id);
                    out.write_all(b"[")?;
                    return Ok(Some(Frame::array(items, Some(id))));
                }
            }
            Resolved::Arena(_, value) => write_scalar(out, value)?,
            Resolved::Dangling(id) => {
                debug!("Dangling reference {} written as null", id);
                out.write_all(b"null")?;
            }
        }
        Ok(None)
    }

    /// Follow references until a non-reference value
    fn resolve(&self, value: &'a ObjectType) -> Resolved<'a> {
        let ObjectType::Reference(start) = value else {
            return Resolved::Inline(value);
        };

        let mut seen = HashSet::new();
        let mut id = *start;
        loop {
            if !seen.insert(id) {
                warn!("Reference chain starting at {} loops", start);
                return Resolved::Dangling(*start);
            }
            match self.lookup(id) {
                None => return Resolved::Dangling(id),
                Some(ObjectType::Reference(next)) => id = *next,
                Some(target) => return Resolved::Arena(id, target),
            }
        }
    }

    fn lookup(&self, id: ObjectId) -> Option<&'a ObjectType> {
        let document: &'a PDFDocument = self.document;
        document.get(id).map(|object| &object.object_type)
    }

    /// Queue an arena object without assigning its key yet
    fn enqueue(&mut self, id: ObjectId) {
        if self.scheduled.insert(id) {
            self.pending.push_back(Pending::Indirect(id));
        }
    }

    /// Queue an arena object and return the key it is referenced by
    fn schedule(&mut self, id: ObjectId) -> PDFResult<ObjectKey> {
        self.enqueue(id);
        self.registry.get_or_assign(id)
    }

    /// Queue an inline dictionary or stream once, however many sites
    /// reach it
    fn enqueue_inline(&mut self, value: &'a ObjectType) {
        if self.scheduled_inline.insert(value as *const ObjectType) {
            self.pending.push_back(Pending::Inline(value));
        }
    }

    fn schedule_inline(&mut self, value: &'a ObjectType) -> PDFResult<ObjectKey> {
        self.enqueue_inline(value);
        self.inline_key(value)
    }

    /// Key of an inline dictionary or stream, allocated on first request
    fn inline_key(&mut self, value: &'a ObjectType) -> PDFResult<ObjectKey> {
        let address = value as *const ObjectType;
        if let Some(key) = self.inline_keys.get(&address) {
            return Ok(*key);
        }
        let key = self.registry.assign_fresh()?;
        trace!("Assigned key {} to inline {}", key, value.type_name());
        self.inline_keys.insert(address, key);
        Ok(key)
    }
}

fn write_reference<W: Write>(out: &mut W, key: ObjectKey) -> PDFResult<()> {
    write!(out, "{} {} R", key.number, key.generation)?;
    Ok(())
}

fn write_scalar<W: Write>(out: &mut W, value: &ObjectType) -> PDFResult<()> {
    match value {
        ObjectType::Null => out.write_all(b"null")?,
        ObjectType::Boolean(true) => out.write_all(b"true")?,
        ObjectType::Boolean(false) => out.write_all(b"false")?,
        ObjectType::Integer(value) => write!(out, "{}", value)?,
        ObjectType::Real(value) => write_real(out, *value)?,
        ObjectType::Name(name) => write_name(out, name)?,
        ObjectType::String(string) => write_string(out, string)?,
        other => {
            return Err(PDFError::InvalidObjectType {
                expected: "scalar",
                found: other.type_name(),
            })
        }
    }
    Ok(())
}

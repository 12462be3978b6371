//! PDF cross-reference table implementation

use std::io::{self, BufRead, Write};

use log::trace;

use crate::error::{PDFError, PDFResult};
use super::output::PDFOutputStream;
use super::ObjectKey;

/// Generation number of free entries that can never be reused
pub const FREE_GENERATION: u16 = 65535;

const MAX_OFFSET: u64 = 9_999_999_999;

/// One row of the cross-reference table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XRefEntry {
    /// Byte offset of the `obj` line, 0 for free entries
    pub offset: u64,
    pub key: ObjectKey,
    pub free: bool,
}

impl XRefEntry {
    pub fn used(offset: u64, key: ObjectKey) -> Self {
        Self { offset, key, free: false }
    }

    pub fn free(number: u32) -> Self {
        Self {
            offset: 0,
            key: ObjectKey::new(number, FREE_GENERATION),
            free: true,
        }
    }

    /// Write the fixed 20-byte form: `oooooooooo ggggg n\r\n`
    fn write_to<W: Write>(&self, output: &mut PDFOutputStream<W>) -> PDFResult<()> {
        if self.offset > MAX_OFFSET {
            return Err(PDFError::xref(format!(
                "Offset {} of object {} does not fit in 10 digits",
                self.offset, self.key
            )));
        }
        write!(
            output,
            "{:010} {:05} {}",
            self.offset,
            self.key.generation,
            if self.free { 'f' } else { 'n' }
        )?;
        output.write_crlf()?;
        Ok(())
    }
}

/// PDF cross-reference table
#[derive(Debug, Default)]
pub struct XRefTable {
    entries: Vec<XRefEntry>,
}

impl XRefTable {
    /// Create new xref table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record an entry. Entries may arrive in any order.
    pub fn push(&mut self, entry: XRefEntry) {
        self.entries.push(entry);
    }

    /// Number of recorded entries, excluding object 0 and gap fillers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest recorded object number, 0 for an empty table
    pub fn max_number(&self) -> u32 {
        self.entries.iter().map(|e| e.key.number).max().unwrap_or(0)
    }

    /// Rows in the written table: objects 0 through the largest number.
    /// This is the trailer `/Size`, which does not fit a `u32` when
    /// object `4294967295` is present.
    pub fn size(&self) -> PDFResult<u32> {
        self.max_number()
            .checked_add(1)
            .ok_or_else(|| PDFError::xref(format!("Table size exceeds {}", u32::MAX)))
    }

    /// Entries sorted by object number
    pub fn entries(&self) -> &[XRefEntry] {
        &self.entries
    }

    /// Offset of a used entry
    pub fn offset_of(&self, number: u32) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.key.number == number && !e.free)
            .map(|e| e.offset)
    }

    pub fn sort(&mut self) {
        self.entries.sort_by_key(|e| e.key);
    }

    /// Write `xref`, a single `0 N` subsection and every row from object 0
    /// up to the largest number, filling gaps with free entries.
    pub fn write_to<W: Write>(&mut self, output: &mut PDFOutputStream<W>) -> PDFResult<()> {
        self.sort();
        trace!("Writing xref table with {} entries", self.entries.len());

        output.write_all(b"xref")?;
        output.write_eol()?;
        write!(output, "0 {}", self.size()?)?;
        output.write_eol()?;

        XRefEntry::free(0).write_to(output)?;

        let mut last_number = 0;
        for entry in &self.entries {
            if entry.key.number <= last_number {
                return Err(PDFError::xref(format!(
                    "Duplicate entry for object {}",
                    entry.key.number
                )));
            }
            while last_number + 1 < entry.key.number {
                last_number += 1;
                XRefEntry::free(last_number).write_to(output)?;
            }
            entry.write_to(output)?;
            last_number = entry.key.number;
        }

        Ok(())
    }

    /// Parse a classic xref section starting at the `xref` keyword.
    /// Free rows are kept, so the result mirrors the file exactly.
    pub fn parse<R: BufRead>(input: &mut R) -> PDFResult<Self> {
        let mut table = Self::new();
        let mut line = String::new();

        input.read_line(&mut line)?;
        if line.trim() != "xref" {
            return Err(PDFError::malformed("Missing xref keyword"));
        }

        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }

            // Parse subsection header
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.first() == Some(&"trailer") {
                break;
            }
            if parts.len() != 2 {
                return Err(PDFError::malformed("Invalid xref subsection"));
            }

            let start = parts[0].parse::<u32>()?;
            let count = parts[1].parse::<u32>()?;

            // Parse entries
            for i in 0..count {
                let number = start
                    .checked_add(i)
                    .ok_or_else(|| PDFError::malformed(format!("Xref subsection {} {} overflows", start, count)))?;
                let mut raw = [0u8; 20];
                input.read_exact(&mut raw)?;
                table.push(parse_entry(&raw, number)?);
            }
        }

        Ok(table)
    }
}

fn parse_entry(raw: &[u8; 20], number: u32) -> PDFResult<XRefEntry> {
    if raw[10] != b' ' || raw[16] != b' ' {
        return Err(PDFError::malformed("Invalid xref entry layout"));
    }
    let offset = entry_field(&raw[0..10])?.parse::<u64>()?;
    let generation = entry_field(&raw[11..16])?.parse::<u16>()?;
    let free = match raw[17] {
        b'n' => false,
        b'f' => true,
        other => {
            return Err(PDFError::malformed(format!("Invalid xref entry type: {:#04x}", other)))
        }
    };

    Ok(XRefEntry {
        offset,
        key: ObjectKey::new(number, generation),
        free,
    })
}

fn entry_field(bytes: &[u8]) -> PDFResult<&str> {
    std::str::from_utf8(bytes).map_err(|_| PDFError::malformed("Invalid xref entry encoding"))
}

/// Value of the last `startxref` in a file
pub fn find_startxref(data: &[u8]) -> PDFResult<u64> {
    let idx = find_sequence_backwards(data, b"startxref")
        .ok_or_else(|| PDFError::malformed("No startxref marker found"))?;

    let tail = &data[idx + b"startxref".len()..];
    let digits: String = tail
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .map(|&b| b as char)
        .collect();

    Ok(digits.parse::<u64>()?)
}

/// Find byte sequence in reverse
fn find_sequence_backwards(data: &[u8], sequence: &[u8]) -> Option<usize> {
    if sequence.len() > data.len() {
        return None;
    }
    (0..=data.len() - sequence.len())
        .rev()
        .find(|&i| &data[i..i + sequence.len()] == sequence)
}

/// Read a table back from the bytes of a complete file
pub fn read_xref(data: &[u8]) -> PDFResult<XRefTable> {
    let offset = find_startxref(data)? as usize;
    let section = data
        .get(offset..)
        .ok_or_else(|| PDFError::xref(format!("startxref {} past end of file", offset)))?;
    let mut cursor = io::Cursor::new(section);
    XRefTable::parse(&mut cursor)
}

//! PDF string object

use std::fmt;
use std::io::Cursor;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::error::PDFResult;

const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];

/// PDF string: an owned byte sequence compared by value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PDFString {
    bytes: Vec<u8>,
}

impl PDFString {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Encode text as a PDF text string. Latin-1 text is stored one byte
    /// per character, anything else as UTF-16BE with a byte order mark.
    pub fn from_text(text: &str) -> Self {
        if text.chars().all(|c| (c as u32) < 0x100) {
            return Self::new(text.chars().map(|c| c as u8).collect());
        }

        let mut bytes = UTF16_BE_BOM.to_vec();
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Self::new(bytes)
    }

    /// Create a string from hex digits. An odd trailing digit is padded
    /// with `0`, so `"ABC"` decodes to `[0xAB, 0xC0]`.
    pub fn from_hex(hex_digits: &str) -> PDFResult<Self> {
        let digits: String = hex_digits.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = if digits.len() % 2 == 1 {
            hex::decode(format!("{}0", digits))?
        } else {
            hex::decode(digits)?
        };
        Ok(Self::new(bytes))
    }

    /// Uppercase hex representation of the raw bytes
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn append(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// True when some byte has its high bit set; such strings are written
    /// in hex form.
    pub fn has_high_bytes(&self) -> bool {
        self.bytes.iter().any(|&b| b >= 0x80)
    }

    /// Decoded text. A UTF-16 byte order mark selects the UTF-16 decoding
    /// and is stripped; otherwise every byte maps to one Latin-1 char.
    pub fn to_text(&self) -> String {
        if self.bytes.len() >= 2 {
            if self.bytes[..2] == UTF16_BE_BOM {
                return decode_utf16::<BigEndian>(&self.bytes[2..]);
            }
            if self.bytes[..2] == UTF16_LE_BOM {
                return decode_utf16::<LittleEndian>(&self.bytes[2..]);
            }
        }
        self.bytes.iter().map(|&b| b as char).collect()
    }
}

fn decode_utf16<B: byteorder::ByteOrder>(data: &[u8]) -> String {
    let mut cursor = Cursor::new(data);
    let mut units = Vec::with_capacity(data.len() / 2);
    while let Ok(unit) = cursor.read_u16::<B>() {
        units.push(unit);
    }
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

impl fmt::Display for PDFString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl From<&str> for PDFString {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for PDFString {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for PDFString {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

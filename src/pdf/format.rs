//! Lexical formatting of scalar PDF objects

use std::io::{self, Write};

use log::warn;

use super::{Name, PDFString};

const MAX_FRACTION_DIGITS: usize = 10;

/// Bytes that must be written as `#XX` inside a name
fn needs_name_escape(byte: u8) -> bool {
    byte <= 0x20
        || byte >= 0x7F
        || matches!(byte, b'(' | b')' | b'[' | b']' | b'/' | b'%' | b'#')
}

pub fn write_name<W: Write>(out: &mut W, name: &Name) -> io::Result<()> {
    out.write_all(b"/")?;
    for &byte in name.as_bytes() {
        if needs_name_escape(byte) {
            write!(out, "#{:02X}", byte)?;
        } else {
            out.write_all(&[byte])?;
        }
    }
    Ok(())
}

/// Fixed-point decimal, at most ten fractional digits, never an exponent
pub fn format_real(value: f64) -> String {
    if !value.is_finite() {
        warn!("Non-finite real {} written as 0", value);
        return "0".to_string();
    }

    let mut text = format!("{:.*}", MAX_FRACTION_DIGITS, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

pub fn write_real<W: Write>(out: &mut W, value: f64) -> io::Result<()> {
    out.write_all(format_real(value).as_bytes())
}

/// Literal strings for 7-bit data, hex strings as soon as one byte has
/// its high bit set
pub fn write_string<W: Write>(out: &mut W, string: &PDFString) -> io::Result<()> {
    if string.has_high_bytes() {
        out.write_all(b"<")?;
        out.write_all(string.to_hex().as_bytes())?;
        out.write_all(b">")
    } else {
        out.write_all(b"(")?;
        write_escaped(out, string.as_bytes())?;
        out.write_all(b")")
    }
}

fn write_escaped<W: Write>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    for &byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => out.write_all(&[b'\\', byte])?,
            b'\n' => out.write_all(b"\\n")?,
            b'\r' => out.write_all(b"\\r")?,
            b'\t' => out.write_all(b"\\t")?,
            0x08 => out.write_all(b"\\b")?,
            0x0C => out.write_all(b"\\f")?,
            _ => out.write_all(&[byte])?,
        }
    }
    Ok(())
}

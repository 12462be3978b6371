//! Position-tracking output for the writer

use std::io::{self, Write};

pub(crate) const CRLF: &[u8] = b"\r\n";

/// Wraps the sink, counting bytes written and remembering whether the
/// last thing written was a line break.
///
/// `write_eol` is a no-op at the start of a line, so callers can request a
/// break after every token without producing blank lines.
pub struct PDFOutputStream<W: Write> {
    inner: W,
    position: u64,
    on_new_line: bool,
    eol: &'static [u8],
}

impl<W: Write> PDFOutputStream<W> {
    pub fn new(inner: W, eol: &'static [u8]) -> Self {
        Self {
            inner,
            position: 0,
            on_new_line: false,
            eol,
        }
    }

    /// Bytes written so far
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_on_new_line(&self) -> bool {
        self.on_new_line
    }

    /// Write the configured line ending unless already at a line start
    pub fn write_eol(&mut self) -> io::Result<()> {
        if !self.on_new_line {
            let eol = self.eol;
            self.write_all(eol)?;
            self.on_new_line = true;
        }
        Ok(())
    }

    /// Write CRLF unconditionally
    pub fn write_crlf(&mut self) -> io::Result<()> {
        self.write_all(CRLF)
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for PDFOutputStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        if written > 0 {
            self.on_new_line = false;
            self.position += written as u64;
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_tracking() -> io::Result<()> {
        let mut out = PDFOutputStream::new(Vec::new(), b"\n");
        out.write_all(b"%PDF-1.4")?;
        assert_eq!(out.position(), 8);
        write!(out, "{} {} obj", 12, 0)?;
        assert_eq!(out.position(), 16);
        Ok(())
    }

    #[test]
    fn test_eol_suppressed_at_line_start() -> io::Result<()> {
        let mut out = PDFOutputStream::new(Vec::new(), b"\r\n");
        out.write_all(b"<<")?;
        out.write_eol()?;
        out.write_eol()?;
        out.write_all(b">>")?;
        out.write_crlf()?;
        out.write_crlf()?;
        assert_eq!(out.position(), 10);
        assert_eq!(out.into_inner(), b"<<\r\n>>\r\n\r\n".to_vec());
        Ok(())
    }
}

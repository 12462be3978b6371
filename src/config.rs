//! Writer configuration

use std::fmt;

/// Default capacity of the buffer placed in front of the output sink
pub const DEFAULT_BUFFER_CAPACITY: usize = 32 * 1024; // 32KB

/// Line terminator for header, body and trailer lines.
/// Cross-reference entries always end with CRLF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    /// The host platform convention
    pub fn native() -> Self {
        if cfg!(windows) {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }
}

impl Default for LineEnding {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineEnding::Lf => write!(f, "LF"),
            LineEnding::CrLf => write!(f, "CRLF"),
        }
    }
}

/// Options for a write pass
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// End-of-line sequence outside the xref table
    pub line_ending: LineEnding,
    /// Capacity of the output buffer
    pub buffer_capacity: usize,
    /// Fail on dictionary entries that reference missing objects instead
    /// of dropping them
    pub strict_references: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::native(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            strict_references: false,
        }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    pub fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }
}

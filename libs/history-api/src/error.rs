use std::fmt;

/// Error kind for export errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing configuration. Fatal at module start.
    Config,
    /// File open/lock/write/flush failure during export.
    Io,
    /// Host or item lookup failed. Output degrades, processing continues.
    Metadata,
    /// Internal defect, e.g. an unknown value-type tag.
    Invariant,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Io => f.write_str("io"),
            ErrorKind::Metadata => f.write_str("metadata"),
            ErrorKind::Invariant => f.write_str("invariant"),
        }
    }
}

/// Export error. None of these ever reach the host callback; they end at the log sink.
#[derive(Debug, Clone)]
pub struct ExportError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ExportError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Io, message: msg.into() }
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Metadata, message: msg.into() }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Invariant, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Prefix the message with `ctx`; the kind is unchanged.
    pub fn with_context(mut self, ctx: impl fmt::Display) -> Self {
        self.message = format!("{ctx}: {}", self.message);
        self
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

// A record that serde cannot encode is a bug in the line layout, not bad input.
impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        Self::invariant(e.to_string())
    }
}

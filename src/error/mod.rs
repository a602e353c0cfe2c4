//! Centralized error handling for the undo engine.
//! Defines common error types, severity levels, and error codes.

use std::fmt;

/// Severity level of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational message (not really an error)
    Info,
    /// Warning - something might be wrong but operation can continue
    Warning,
    /// Standard error - operation failed but the caller can continue
    Error,
    /// Critical error - an internal invariant was violated
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Category of the error.
///
/// `CorruptTree` and `CorruptFile` are specific to the undo engine: the
/// former is an in-memory invariant violation (error kind 2), the latter a
/// failure to load a persisted undo file (error kind 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// File system or I/O errors
    Io,
    /// Command line parsing errors
    Parse,
    /// Configuration or settings errors
    Settings,
    /// Command execution errors (includes policy-denied edits)
    Execution,
    /// An in-memory undo tree invariant was violated
    CorruptTree,
    /// An on-disk undo file failed magic/version/hash/seq validation
    CorruptFile,
    /// Errors that don't fit other categories
    Other,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "IO"),
            Self::Parse => write!(f, "Parse"),
            Self::Settings => write!(f, "Settings"),
            Self::Execution => write!(f, "Execution"),
            Self::CorruptTree => write!(f, "CorruptTree"),
            Self::CorruptFile => write!(f, "CorruptFile"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// A structured error from the undo engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorError {
    /// How serious the error is
    pub severity: ErrorSeverity,
    /// What kind of error occurred
    pub kind: ErrorType,
    /// Machine-readable error code (e.g., "E825", "E828")
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl EditorError {
    /// Create a new standard error (Severity: Error)
    pub fn new(kind: ErrorType, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ErrorSeverity::Error,
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a new critical error (Severity: Critical)
    pub fn critical(kind: ErrorType, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ErrorSeverity::Critical,
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a new warning (Severity: Warning)
    pub fn warning(kind: ErrorType, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ErrorSeverity::Warning,
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    /// A corrupt in-memory tree invariant (spec error kind 2).
    pub fn corrupt_tree(message: impl Into<String>) -> Self {
        Self::critical(ErrorType::CorruptTree, "E_CORRUPT_TREE", message)
    }

    /// A corrupt on-disk undo file (spec error kind 3).
    pub fn corrupt_file(mesg: &str, file_name: &str) -> Self {
        Self::new(
            ErrorType::CorruptFile,
            "E825",
            format!("Corrupted undo file ({mesg}): {file_name}"),
        )
    }

    /// Check if the message contains a substring (useful for tests)
    pub fn contains_msg(&self, sub: &str) -> bool {
        self.message.contains(sub)
    }
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}({}): {}",
            self.severity, self.kind, self.code, self.message
        )
    }
}

impl std::error::Error for EditorError {}

impl From<String> for EditorError {
    fn from(msg: String) -> Self {
        Self::new(ErrorType::Other, "GENERIC_ERROR", msg)
    }
}

impl From<&str> for EditorError {
    fn from(msg: &str) -> Self {
        Self::new(ErrorType::Other, "GENERIC_ERROR", msg)
    }
}

impl From<std::io::Error> for EditorError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorType::Io, "IO_ERROR", err.to_string())
    }
}

/// Result alias for undo-engine operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Helper trait to convert various error types into `EditorError`
pub trait ToEditorError {
    fn to_editor_error(self) -> EditorError;
}

impl ToEditorError for std::io::Error {
    fn to_editor_error(self) -> EditorError {
        EditorError::new(ErrorType::Io, "IO_ERROR", self.to_string())
    }
}

impl ToEditorError for String {
    fn to_editor_error(self) -> EditorError {
        EditorError::new(ErrorType::Other, "GENERIC_ERROR", self)
    }
}

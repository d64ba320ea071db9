//! Error types for LDraw parsing, geometry composition and scheduling
//!
//! Every error carries a code so callers can categorize failures without
//! matching on message text. Line-level errors also carry an [`ErrorContext`]
//! with the raw line and the parser state at the time of failure.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and part library errors
//! - **E2xxx**: Line syntax and parse context errors
//! - **E3xxx**: Model store invariants and transforms
//! - **E4xxx**: Schedule construction and extraction
//!
//! ## Common Error Codes
//!
//! - `E1001`: I/O error reading a file
//! - `E1002`: Part file could not be resolved
//! - `E2001`: Malformed line (wrong token count or bad number)
//! - `E2002`: Unknown command code (strict mode only)
//! - `E2003`: Placement line without an active model
//! - `E2004`: Placement or geometry line without an active part
//! - `E3001`: Name registered twice
//! - `E3002`: Transform cannot be inverted
//! - `E4001`: Schedule root not present
//! - `E4002`: Submodels reference each other cyclically

use std::io;
use thiserror::Error;

/// Result type for LDraw operations
pub type Result<T> = std::result::Result<T, Error>;

/// Additional context for line-level errors
///
/// Provides optional supplementary information to help with debugging:
/// - The source the line came from (file name or caller-supplied label)
/// - The 1-based line number and the raw line text
/// - The parser state the line was handled in
/// - A hint for resolving common issues
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Source label, typically a file name
    pub file: Option<String>,

    /// 1-based line number within the source
    pub line: Option<usize>,

    /// Raw line text as it appeared in the source
    pub content: Option<String>,

    /// Debug rendering of the parser state when the line was handled
    pub state: Option<String>,

    /// A helpful hint for resolving the error
    pub hint: Option<String>,
}

impl ErrorContext {
    /// Create a new empty error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error context with just a hint
    pub fn with_hint(hint: impl Into<String>) -> Self {
        Self {
            hint: Some(hint.into()),
            ..Self::default()
        }
    }

    /// Set the source label
    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the line number
    pub fn line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Set the raw line text
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the parser state rendering
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Set the hint
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        match (&self.file, self.line) {
            (Some(file), Some(line)) => parts.push(format!("Location: {}, line {}", file, line)),
            (Some(file), None) => parts.push(format!("File: {}", file)),
            (None, Some(line)) => parts.push(format!("Line: {}", line)),
            (None, None) => {}
        }

        if let Some(ref content) = self.content {
            parts.push(format!("Content: {}", content));
        }

        if let Some(ref state) = self.state {
            parts.push(format!("State: {}", state));
        }

        if let Some(ref hint) = self.hint {
            parts.push(format!("Hint: {}", hint));
        }

        if !parts.is_empty() {
            write!(f, "\n{}", parts.join("\n"))
        } else {
            Ok(())
        }
    }
}

/// Errors that can occur while parsing, composing or scheduling LDraw models
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading a file or indexing a library
    ///
    /// **Error Code**: E1001
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// A part referenced during geometry composition has no backing file
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - The part library root is not configured or is incomplete
    /// - A typo in the referenced file name
    ///
    /// **Suggestions**:
    /// - Configure a resolver with `ParserConfig::with_resolver`
    /// - Embed the part in the model file with `0 FILE <name>.dat`
    #[error("[E1002] Unresolved part file: {0}")]
    UnresolvedPartFile(String),

    /// Wrong token count or an unparsable field
    ///
    /// **Error Code**: E2001
    #[error("[E2001] Malformed line: {message}{context}")]
    MalformedLine {
        /// What was wrong with the line
        message: String,
        /// Where the line came from
        context: ErrorContext,
    },

    /// Command code outside the known range
    ///
    /// **Error Code**: E2002
    ///
    /// Only raised when the parser runs in strict mode; otherwise the line is
    /// logged and skipped.
    #[error("[E2002] Unknown command code {code}{context}")]
    UnknownCommandCode {
        /// The leading token as written
        code: String,
        /// Where the line came from
        context: ErrorContext,
    },

    /// A placement line was routed to a model, but no model is active
    ///
    /// **Error Code**: E2003
    #[error("[E2003] No active model for placement{context}")]
    NoActiveModel {
        /// Where the line came from
        context: ErrorContext,
    },

    /// A placement or geometry line was routed to a part, but no part is active
    ///
    /// **Error Code**: E2004
    #[error("[E2004] No active part{context}")]
    NoActivePart {
        /// Where the line came from
        context: ErrorContext,
    },

    /// A name was inserted into the model store twice
    ///
    /// **Error Code**: E3001
    ///
    /// Names are classified as exactly one of model, top-level part or
    /// nested-only part. Reaching this error means a caller bypassed the
    /// registration helpers on [`crate::ModelStore`].
    #[error("[E3001] Duplicate registration: {0}")]
    DuplicateRegistration(String),

    /// A coordinate transform could not be inverted
    ///
    /// **Error Code**: E3002
    #[error("[E3002] Singular transform: {0}")]
    SingularTransform(String),

    /// Extraction requested a root that is not in the schedule
    ///
    /// **Error Code**: E4001
    #[error("[E4001] Unknown schedule root: {0}")]
    UnknownScheduleRoot(String),

    /// Submodels reference each other in a cycle
    ///
    /// **Error Code**: E4002
    #[error("[E4002] Cyclic submodel references: {0}")]
    SubmodelCycle(String),
}

impl Error {
    /// Create a MalformedLine error
    pub fn malformed(message: impl Into<String>, context: ErrorContext) -> Self {
        Error::MalformedLine {
            message: message.into(),
            context,
        }
    }

    /// Create a MalformedLine error for a token count mismatch
    ///
    /// # Arguments
    /// * `command` - Human-readable command name (e.g. "triangle")
    /// * `expected` - Description of the accepted count (e.g. "exactly 11")
    /// * `found` - Number of tokens on the line
    pub fn token_count(command: &str, expected: &str, found: usize, context: ErrorContext) -> Self {
        Error::malformed(
            format!(
                "{} line needs {} tokens, found {}",
                command, expected, found
            ),
            context,
        )
    }

    /// Context attached to a line-level error, if any
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::MalformedLine { context, .. }
            | Error::UnknownCommandCode { context, .. }
            | Error::NoActiveModel { context }
            | Error::NoActivePart { context } => Some(context),
            _ => None,
        }
    }
}

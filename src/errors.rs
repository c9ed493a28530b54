//! Error types for schema building and parsing.

use std::fmt;

use crate::value::Value;

/// Error type returned by user callbacks (formatters and resolvers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced when building a [crate::schema::Parser] from its declarations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Structural declaration error (duplicate name, missing termination mode, ...).
    #[error("invalid schema: {detail}")]
    InvalidSchema { detail: String },
    /// Declared field kind or width is not supported.
    #[error("unsupported type for field `{field}`: {detail}")]
    UnsupportedType { field: String, detail: String },
    /// A JSON schema definition could not be read.
    #[cfg(feature = "serde")]
    #[error("invalid schema definition: {0}")]
    Definition(#[from] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        SchemaError::InvalidSchema {
            detail: detail.into(),
        }
    }
}

/// Byte and bit position inside the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset from the start of the input.
    pub offset: usize,
    /// Bit inside the byte at `offset`, 0 = most significant. Non-zero only inside a bit run.
    pub bit: u8,
}

impl Position {
    pub fn new(offset: usize, bit: u8) -> Self {
        Position { offset, bit }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bit == 0 {
            write!(f, "byte {}", self.offset)
        } else {
            write!(f, "byte {} bit {}", self.offset, self.bit)
        }
    }
}

/// What went wrong during [crate::schema::Parser::parse].
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// A fixed or resolved size needs more bytes than the input holds.
    #[error("out of bounds: needed {needed} byte(s), {available} available")]
    OutOfBounds { needed: usize, available: usize },
    /// A dynamic argument names a field that is not decoded in the current scope.
    #[error("unresolved reference `{reference}`")]
    UnresolvedReference { reference: String },
    /// The field's assertion did not hold.
    #[error("assertion failed for value {value:?}")]
    AssertionFailed { value: Value },
    /// A value could not be used the way the schema requires.
    #[error("unsupported type: {detail}")]
    UnsupportedType { detail: String },
    /// A choice tag matched no alternative and no default was declared.
    #[error("no choice for tag {tag}")]
    UnknownChoice { tag: i64 },
    /// A formatter or resolver callback failed.
    #[error("callback failed: {0}")]
    Callback(#[source] BoxError),
}

/// Error returned by [crate::schema::Parser::parse]: the failing field, where it failed, and why.
#[derive(Debug, thiserror::Error)]
#[error("field `{field}` at {position}: {kind}")]
pub struct ParseError {
    /// Dotted path of the failing field, e.g. `header.flags` or `items[2].len`.
    pub field: String,
    pub position: Position,
    #[source]
    pub kind: ErrorKind,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, position: Position) -> Self {
        ParseError {
            field: String::new(),
            position,
            kind,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Prefixes the field path with `scope`, the name of the enclosing field.
    pub(crate) fn within(mut self, scope: &str) -> Self {
        if scope.is_empty() {
            return self;
        }
        self.field = match (self.field.is_empty(), self.field.starts_with('[')) {
            (true, _) => scope.to_string(),
            (false, true) => format!("{scope}{}", self.field),
            (false, false) => format!("{scope}.{}", self.field),
        };
        self
    }

    /// Prefixes the field path with an array index.
    pub(crate) fn at_index(mut self, index: usize) -> Self {
        self.field = if self.field.is_empty() {
            format!("[{index}]")
        } else {
            format!("[{index}].{}", self.field)
        };
        self
    }
}

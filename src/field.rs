//! Field declarations: the immutable description of one field of a schema.

use std::{fmt, sync::Arc};

use crate::{
    errors::BoxError,
    primitive::{Endian, Primitive},
    resolver::Arg,
    schema::Parser,
    string::Encoding,
    value::{Record, Value},
};

/// Turns a decoded value into the value stored in the record.
pub type Formatter = Arc<dyn Fn(Value) -> Result<Value, BoxError> + Send + Sync>;

/// Predicate over a decoded value and the record decoded so far.
pub type Predicate = Arc<dyn Fn(&Value, &Record) -> bool + Send + Sync>;

/// Predicate over a single byte, used to terminate buffers.
pub type BytePredicate = Arc<dyn Fn(u8) -> bool + Send + Sync>;

/// A single declared field.
#[derive(Clone)]
pub struct FieldSpec {
    /// Key in the result record. Anonymous nest/choice fields merge into the parent record.
    pub name: Option<String>,
    pub kind: FieldKind,
    /// Applied to the raw decoded value before the assertion.
    pub formatter: Option<Formatter>,
    pub assertion: Option<Assertion>,
}

impl FieldSpec {
    pub fn new(name: Option<String>, kind: FieldKind) -> Self {
        FieldSpec {
            name,
            kind,
            formatter: None,
            assertion: None,
        }
    }

    /// Name used in error paths and logs.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("formatter", &self.formatter.is_some())
            .field("assertion", &self.assertion)
            .finish()
    }
}

/// What a field decodes and how.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Primitive { kind: Primitive, endian: Endian },
    /// Unsigned bit field of 1..=32 bits, part of a bit run.
    Bits { width: u8, endian: Endian },
    Str(StringOptions),
    Buf(BufferOptions),
    Nest(Parser),
    Choice(ChoiceOptions),
    Array(ArrayOptions),
    /// Moves the byte cursor by a signed amount without decoding.
    Seek(Arg),
    /// Decodes an element at an absolute offset, then restores the cursor.
    Pointer(PointerOptions),
    /// Stores the current byte offset.
    SaveOffset,
}

impl FieldKind {
    /// Whether the field produces a value that a formatter or assertion can act on.
    pub(crate) fn produces_value(&self) -> bool {
        !matches!(self, FieldKind::Seek(_))
    }
}

/// A sub-schema used by arrays, choices and pointers: a primitive or a full parser.
#[derive(Debug, Clone)]
pub enum Element {
    /// A primitive; `None` endianness means the builder's default at declaration time.
    Primitive(Primitive, Option<Endian>),
    Parser(Parser),
}

impl From<Primitive> for Element {
    fn from(kind: Primitive) -> Self {
        Element::Primitive(kind, None)
    }
}

impl From<Parser> for Element {
    fn from(parser: Parser) -> Self {
        Element::Parser(parser)
    }
}

/// Check applied to a (possibly formatted) value.
#[derive(Clone)]
pub enum Assertion {
    Predicate(Predicate),
    Equals(Value),
}

impl fmt::Debug for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::Predicate(_) => f.write_str("Predicate(<callback>)"),
            Assertion::Equals(v) => f.debug_tuple("Equals").field(v).finish(),
        }
    }
}

impl Assertion {
    pub(crate) fn holds(&self, value: &Value, record: &Record) -> bool {
        match self {
            Assertion::Predicate(p) => p(value, record),
            Assertion::Equals(expected) => expected.matches(value),
        }
    }
}

/// Options of a string field.
///
/// Modes in priority order: `zero_terminated`, `greedy`, `length`.
#[derive(Debug, Clone, Default)]
pub struct StringOptions {
    pub length: Option<Arg>,
    pub zero_terminated: bool,
    pub greedy: bool,
    pub strip_null: bool,
    pub encoding: Encoding,
}

impl StringOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(mut self, length: impl Into<Arg>) -> Self {
        self.length = Some(length.into());
        self
    }

    pub fn zero_terminated(mut self) -> Self {
        self.zero_terminated = true;
        self
    }

    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    pub fn strip_null(mut self) -> Self {
        self.strip_null = true;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Where a buffer ends when it has no length.
#[derive(Clone)]
pub enum Until {
    /// All remaining input.
    Eof,
    /// Up to the first byte matching the predicate; that byte is consumed but not returned.
    Byte(BytePredicate),
}

impl fmt::Debug for Until {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Until::Eof => f.write_str("Eof"),
            Until::Byte(_) => f.write_str("Byte(<callback>)"),
        }
    }
}

/// Options of a buffer field.
#[derive(Debug, Clone, Default)]
pub struct BufferOptions {
    pub length: Option<Arg>,
    pub read_until: Option<Until>,
    /// Copy the span instead of sharing the input allocation.
    pub clone: bool,
}

impl BufferOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(mut self, length: impl Into<Arg>) -> Self {
        self.length = Some(length.into());
        self
    }

    pub fn read_until_eof(mut self) -> Self {
        self.read_until = Some(Until::Eof);
        self
    }

    pub fn read_until<F>(mut self, pred: F) -> Self
    where
        F: Fn(u8) -> bool + Send + Sync + 'static,
    {
        self.read_until = Some(Until::Byte(Arc::new(pred)));
        self
    }

    pub fn clone_bytes(mut self) -> Self {
        self.clone = true;
        self
    }
}

/// Options of a choice field.
#[derive(Debug, Clone)]
pub struct ChoiceOptions {
    pub tag: Arg,
    pub choices: Vec<(i64, Element)>,
    pub default_choice: Option<Element>,
}

impl ChoiceOptions {
    pub fn new(tag: impl Into<Arg>) -> Self {
        ChoiceOptions {
            tag: tag.into(),
            choices: Vec::new(),
            default_choice: None,
        }
    }

    pub fn choice(mut self, tag: i64, element: impl Into<Element>) -> Self {
        self.choices.push((tag, element.into()));
        self
    }

    pub fn default_choice(mut self, element: impl Into<Element>) -> Self {
        self.default_choice = Some(element.into());
        self
    }
}

/// How many elements an array holds.
#[derive(Clone)]
pub enum ArrayLength {
    /// A fixed or resolved element count.
    Count(Arg),
    /// Elements are decoded until this many bytes are consumed.
    Bytes(Arg),
    /// Elements are decoded until the predicate returns true for the last one (which is kept).
    Until(Predicate),
    /// Elements are decoded until the input is exhausted.
    Eof,
}

impl fmt::Debug for ArrayLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayLength::Count(arg) => f.debug_tuple("Count").field(arg).finish(),
            ArrayLength::Bytes(arg) => f.debug_tuple("Bytes").field(arg).finish(),
            ArrayLength::Until(_) => f.write_str("Until(<callback>)"),
            ArrayLength::Eof => f.write_str("Eof"),
        }
    }
}

/// Options of an array field.
#[derive(Debug, Clone)]
pub struct ArrayOptions {
    pub element: Element,
    pub length: Option<ArrayLength>,
    /// Produce a record keyed by this field of each element instead of a list.
    pub key: Option<String>,
}

impl ArrayOptions {
    pub fn new(element: impl Into<Element>) -> Self {
        ArrayOptions {
            element: element.into(),
            length: None,
            key: None,
        }
    }

    pub fn length(mut self, count: impl Into<Arg>) -> Self {
        self.length = Some(ArrayLength::Count(count.into()));
        self
    }

    pub fn length_in_bytes(mut self, bytes: impl Into<Arg>) -> Self {
        self.length = Some(ArrayLength::Bytes(bytes.into()));
        self
    }

    pub fn read_until<F>(mut self, pred: F) -> Self
    where
        F: Fn(&Value, &Record) -> bool + Send + Sync + 'static,
    {
        self.length = Some(ArrayLength::Until(Arc::new(pred)));
        self
    }

    pub fn read_until_eof(mut self) -> Self {
        self.length = Some(ArrayLength::Eof);
        self
    }

    pub fn key(mut self, field: impl Into<String>) -> Self {
        self.key = Some(field.into());
        self
    }
}

/// Options of a pointer field.
#[derive(Debug, Clone)]
pub struct PointerOptions {
    /// Absolute byte offset of the element.
    pub offset: Arg,
    pub element: Element,
}

impl PointerOptions {
    pub fn new(offset: impl Into<Arg>, element: impl Into<Element>) -> Self {
        PointerOptions {
            offset: offset.into(),
            element: element.into(),
        }
    }
}

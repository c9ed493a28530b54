//! Parser: a compiled, immutable schema used to parse byte buffers into [Record]s.

use std::{collections::HashSet, fmt, sync::Arc};

use bytes::Bytes;

use crate::{
    builder::ParserBuilder,
    compiled::CompiledField,
    cursor::Cursor,
    errors::{ParseError, SchemaError},
    field::{BufferOptions, Element, FieldKind, FieldSpec, StringOptions},
    primitive::Endian,
    value::Record,
};

/// A compiled schema. Build one with [Parser::start] (or [Parser::compile]), then call
/// [Parser::parse] as often as needed.
///
/// Cloning is cheap and a parser can be shared between threads: every parse owns its own cursor
/// and result record.
#[derive(Clone)]
pub struct Parser {
    inner: Arc<Inner>,
}

struct Inner {
    specs: Vec<FieldSpec>,
    fields: Vec<CompiledField>,
    /// Names this parser contributes to the namespace it is run in.
    names: Vec<String>,
    /// Bits of the leading bit fields, which join a bit run active when the parser is entered.
    leading_bits: usize,
}

impl Parser {
    /// Starts declaring a new schema.
    pub fn start() -> ParserBuilder {
        ParserBuilder::new()
    }

    /// Validates `specs` and compiles them. Primitive array/choice elements without an explicit
    /// endianness use `default_endian`.
    pub fn compile(specs: Vec<FieldSpec>, default_endian: Endian) -> Result<Self, SchemaError> {
        let names = validate(&specs)?;

        let fields = (0..specs.len())
            .map(|i| CompiledField::compile(&specs[i], run_bits(&specs[i..]), default_endian))
            .collect();
        let leading_bits = run_bits(&specs);

        tracing::debug!(fields = specs.len(), leading_bits, "compiled parser");

        Ok(Parser {
            inner: Arc::new(Inner {
                specs,
                fields,
                names,
                leading_bits,
            }),
        })
    }

    /// The declarations this parser was compiled from, in order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.inner.specs
    }

    /// Parses `data`. The input is copied once; byte spans in the result share that copy.
    pub fn parse(&self, data: &[u8]) -> Result<Record, ParseError> {
        self.parse_bytes(Bytes::copy_from_slice(data))
    }

    /// Parses `data` without copying it; byte spans in the result are views into `data` unless
    /// the buffer field asks for a copy.
    pub fn parse_bytes(&self, data: Bytes) -> Result<Record, ParseError> {
        tracing::debug!(len = data.len(), fields = self.inner.fields.len(), "parse started");

        let mut cursor = Cursor::new(&data);
        let mut record = Record::new();

        match self.run(&mut cursor, &mut record) {
            Ok(()) => {
                tracing::debug!(consumed = cursor.offset(), "parse finished");
                Ok(record)
            }
            Err(err) => {
                tracing::debug!(field = %err.field, position = %err.position, error = %err.kind, "parse failed");
                Err(err)
            }
        }
    }

    /// Runs every field against `cursor`, storing results in `record`.
    pub(crate) fn run(&self, cursor: &mut Cursor<'_>, record: &mut Record) -> Result<(), ParseError> {
        for field in &self.inner.fields {
            field.run(cursor, record)?;
        }
        Ok(())
    }

    pub(crate) fn leading_bits(&self) -> usize {
        self.inner.leading_bits
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.inner.names
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("fields", &self.inner.specs)
            .finish()
    }
}

/// Bits of the run starting at `specs[0]`: consecutive bit fields, plus the leading bit fields
/// of a directly following nest.
fn run_bits(specs: &[FieldSpec]) -> usize {
    let mut total = 0;
    for spec in specs {
        match &spec.kind {
            FieldKind::Bits { width, .. } => total += usize::from(*width),
            FieldKind::Nest(parser) => return total + parser.leading_bits(),
            _ => break,
        }
    }
    total
}

/// Checks the declarations and returns the names they contribute to the enclosing namespace.
fn validate(specs: &[FieldSpec]) -> Result<Vec<String>, SchemaError> {
    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let mut claim = |name: &str| {
        if seen.insert(name.to_string()) {
            names.push(name.to_string());
            Ok(())
        } else {
            Err(SchemaError::invalid(format!("duplicate field name `{name}`")))
        }
    };

    for spec in specs {
        validate_kind(spec)?;

        if spec.formatter.is_some() || spec.assertion.is_some() {
            if !spec.kind.produces_value() {
                return Err(SchemaError::invalid(format!(
                    "field `{}` cannot carry a formatter or assertion",
                    spec.label()
                )));
            }
            if spec.name.is_none() && matches!(spec.kind, FieldKind::Nest(_) | FieldKind::Choice(_)) {
                return Err(SchemaError::invalid(
                    "inline nest or choice cannot carry a formatter or assertion",
                ));
            }
        }

        match (&spec.name, &spec.kind) {
            (Some(name), _) if name.is_empty() => {
                return Err(SchemaError::invalid("field name must not be empty"));
            }
            (Some(name), _) => claim(name)?,
            (None, FieldKind::Nest(parser)) => {
                for name in parser.names() {
                    claim(name)?;
                }
            }
            (None, FieldKind::Choice(options)) => {
                // Alternatives are exclusive, so they may share names with each other.
                let mut merged: Vec<&String> = Vec::new();
                let alternatives = options
                    .choices
                    .iter()
                    .map(|(_, element)| element)
                    .chain(options.default_choice.as_ref());
                for element in alternatives {
                    let Element::Parser(parser) = element else {
                        return Err(SchemaError::invalid(
                            "inline choice alternatives must be parsers; name the choice to store a primitive",
                        ));
                    };
                    for name in parser.names() {
                        if !merged.contains(&name) {
                            merged.push(name);
                        }
                    }
                }
                for name in merged {
                    claim(name)?;
                }
            }
            (None, _) => {}
        }
    }

    Ok(names)
}

fn validate_kind(spec: &FieldSpec) -> Result<(), SchemaError> {
    match &spec.kind {
        FieldKind::Bits { width, .. } if !(1..=32).contains(width) => {
            Err(SchemaError::UnsupportedType {
                field: spec.label().to_string(),
                detail: format!("bit field width {width} is outside 1..=32"),
            })
        }
        FieldKind::Str(StringOptions {
            length: None,
            zero_terminated: false,
            greedy: false,
            ..
        }) => Err(SchemaError::invalid(format!(
            "string `{}` needs a length, zero_terminated or greedy",
            spec.label()
        ))),
        FieldKind::Buf(BufferOptions {
            length: None,
            read_until: None,
            ..
        }) => Err(SchemaError::invalid(format!(
            "buffer `{}` needs a length or read_until",
            spec.label()
        ))),
        FieldKind::Array(options) => {
            if options.length.is_none() {
                return Err(SchemaError::invalid(format!(
                    "array `{}` needs a length, length_in_bytes or read_until",
                    spec.label()
                )));
            }
            if options.key.is_some() && !matches!(options.element, Element::Parser(_)) {
                return Err(SchemaError::invalid(format!(
                    "keyed array `{}` needs a parser element",
                    spec.label()
                )));
            }
            Ok(())
        }
        FieldKind::Choice(options) if options.choices.is_empty() && options.default_choice.is_none() => {
            Err(SchemaError::invalid(format!(
                "choice `{}` has no alternatives",
                spec.label()
            )))
        }
        _ => Ok(()),
    }
}

//! Compilation of [FieldSpec]s into closures, and their execution against a [Cursor].

use crate::{
    buffer::read_buffer,
    cursor::Cursor,
    errors::{ErrorKind, ParseError},
    field::{
        ArrayLength, ArrayOptions, Assertion, ChoiceOptions, Element, FieldKind, FieldSpec,
        Formatter, PointerOptions,
    },
    primitive::{Endian, Primitive},
    schema::Parser,
    string::read_string,
    value::{Record, Value},
};

/// Decodes one field. `None` means the field stored nothing itself (seek, inline nest/choice).
type Decode =
    Box<dyn Fn(&mut Cursor<'_>, &mut Record) -> Result<Option<Value>, ParseError> + Send + Sync>;

/// A field ready to run: its decoder closure plus the hooks applied to the decoded value.
pub(crate) struct CompiledField {
    name: Option<String>,
    decode: Decode,
    formatter: Option<Formatter>,
    assertion: Option<Assertion>,
}

impl CompiledField {
    /// Compiles `spec`. `run_bits` is the size of the bit run a bit field starts when no run is active.
    pub(crate) fn compile(spec: &FieldSpec, run_bits: usize, default_endian: Endian) -> Self {
        CompiledField {
            name: spec.name.clone(),
            decode: compile_kind(&spec.kind, spec.name.is_some(), run_bits, default_endian),
            formatter: spec.formatter.clone(),
            assertion: spec.assertion.clone(),
        }
    }

    pub(crate) fn run(&self, cursor: &mut Cursor<'_>, record: &mut Record) -> Result<(), ParseError> {
        let label = self.name.as_deref().unwrap_or("");
        let start = cursor.position();
        tracing::trace!(field = label, offset = start.offset, bit = start.bit, "decoding field");

        let Some(raw) = (self.decode)(cursor, record).map_err(|err| err.within(label))? else {
            return Ok(());
        };

        let value = match &self.formatter {
            Some(formatter) => formatter(raw)
                .map_err(|err| ParseError::new(ErrorKind::Callback(err), start).within(label))?,
            None => raw,
        };

        if let Some(assertion) = &self.assertion
            && !assertion.holds(&value, record)
        {
            return Err(ParseError::new(ErrorKind::AssertionFailed { value }, start).within(label));
        }

        match &self.name {
            Some(name) => record.insert(name.clone(), value),
            // Anonymous scalars are padding.
            None => {
                if let Value::Record(fields) = value {
                    record.merge(fields);
                }
            }
        }

        Ok(())
    }
}

/// A compiled array/choice/pointer element.
#[derive(Debug, Clone)]
enum CompiledElement {
    Primitive(Primitive, Endian),
    Parser(Parser),
}

impl CompiledElement {
    fn new(element: &Element, default_endian: Endian) -> Self {
        match element {
            Element::Primitive(kind, endian) => {
                CompiledElement::Primitive(*kind, endian.unwrap_or(default_endian))
            }
            Element::Parser(parser) => CompiledElement::Parser(parser.clone()),
        }
    }

    /// Decodes one element. Sub-parsers get a fresh scope.
    fn decode(&self, cursor: &mut Cursor<'_>) -> Result<Value, ParseError> {
        match self {
            CompiledElement::Primitive(kind, endian) => {
                cursor.end_run();
                cursor.read_primitive(*kind, *endian)
            }
            CompiledElement::Parser(parser) => {
                let mut record = Record::new();
                parser.run(cursor, &mut record)?;
                cursor.end_run();
                Ok(Value::Record(record))
            }
        }
    }

    /// Decodes one element into `record` directly, for inline choices.
    fn decode_into(&self, cursor: &mut Cursor<'_>, record: &mut Record) -> Result<Option<Value>, ParseError> {
        match self {
            CompiledElement::Primitive(..) => self.decode(cursor).map(Some),
            CompiledElement::Parser(parser) => {
                parser.run(cursor, record)?;
                cursor.end_run();
                Ok(None)
            }
        }
    }
}

fn compile_kind(kind: &FieldKind, named: bool, run_bits: usize, default_endian: Endian) -> Decode {
    match kind {
        FieldKind::Primitive { kind, endian } => {
            let (kind, endian) = (*kind, *endian);
            Box::new(move |cursor, _| {
                cursor.end_run();
                cursor.read_primitive(kind, endian).map(Some)
            })
        }
        FieldKind::Bits { width, endian } => {
            let (width, endian) = (usize::from(*width), *endian);
            Box::new(move |cursor, _| {
                cursor
                    .read_bits(width, endian, run_bits)
                    .map(|bits| Some(Value::U64(bits)))
            })
        }
        FieldKind::Str(options) => {
            let options = options.clone();
            Box::new(move |cursor, record| {
                cursor.end_run();
                read_string(cursor, &options, record).map(|text| Some(Value::Str(text)))
            })
        }
        FieldKind::Buf(options) => {
            let options = options.clone();
            Box::new(move |cursor, record| {
                cursor.end_run();
                read_buffer(cursor, &options, record).map(|bytes| Some(Value::Bytes(bytes)))
            })
        }
        // Nesting keeps the active bit run: leading bit fields of the sub-parser continue it.
        FieldKind::Nest(parser) => {
            let parser = parser.clone();
            if named {
                Box::new(move |cursor, _| {
                    let mut fields = Record::new();
                    parser.run(cursor, &mut fields)?;
                    Ok(Some(Value::Record(fields)))
                })
            } else {
                Box::new(move |cursor, record| {
                    parser.run(cursor, record)?;
                    Ok(None)
                })
            }
        }
        FieldKind::Choice(options) => compile_choice(options, named, default_endian),
        FieldKind::Array(options) => compile_array(options, default_endian),
        FieldKind::Seek(by) => {
            let by = by.clone();
            Box::new(move |cursor, record| {
                cursor.end_run();
                let delta = by.resolve(record).map_err(|kind| cursor.error(kind))?;
                cursor.seek_by(delta)?;
                Ok(None)
            })
        }
        FieldKind::Pointer(options) => compile_pointer(options, default_endian),
        FieldKind::SaveOffset => Box::new(|cursor, _| {
            cursor.end_run();
            Ok(Some(Value::U64(cursor.offset() as u64)))
        }),
    }
}

fn compile_choice(options: &ChoiceOptions, named: bool, default_endian: Endian) -> Decode {
    let tag = options.tag.clone();
    let choices: Vec<(i64, CompiledElement)> = options
        .choices
        .iter()
        .map(|(key, element)| (*key, CompiledElement::new(element, default_endian)))
        .collect();
    let default_choice = options
        .default_choice
        .as_ref()
        .map(|element| CompiledElement::new(element, default_endian));

    Box::new(move |cursor, record| {
        cursor.end_run();
        let key = tag.resolve(record).map_err(|kind| cursor.error(kind))?;
        let element = choices
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, element)| element)
            .or(default_choice.as_ref())
            .ok_or_else(|| cursor.error(ErrorKind::UnknownChoice { tag: key }))?;

        if named {
            element.decode(cursor).map(Some)
        } else {
            element.decode_into(cursor, record)
        }
    })
}

fn compile_array(options: &ArrayOptions, default_endian: Endian) -> Decode {
    let element = CompiledElement::new(&options.element, default_endian);
    let length = options.length.clone();
    let key = options.key.clone();

    Box::new(move |cursor, record| {
        cursor.end_run();
        let mut items = Vec::new();

        match &length {
            Some(ArrayLength::Count(count)) => {
                let count = count.resolve_len(record).map_err(|kind| cursor.error(kind))?;
                for index in 0..count {
                    items.push(element.decode(cursor).map_err(|err| err.at_index(index))?);
                }
            }
            Some(ArrayLength::Bytes(size)) => {
                let size = size.resolve_len(record).map_err(|kind| cursor.error(kind))?;
                if size > cursor.remaining() {
                    return Err(cursor.error(ErrorKind::OutOfBounds {
                        needed: size,
                        available: cursor.remaining(),
                    }));
                }
                let end = cursor.offset() + size;
                while cursor.offset() < end {
                    let value = decode_progressing(&element, cursor, items.len())?;
                    items.push(value);
                }
            }
            Some(ArrayLength::Until(pred)) => loop {
                let value = decode_progressing(&element, cursor, items.len())?;
                let done = pred(&value, record);
                items.push(value);
                if done {
                    break;
                }
            },
            Some(ArrayLength::Eof) => {
                while cursor.remaining() > 0 {
                    let value = decode_progressing(&element, cursor, items.len())?;
                    items.push(value);
                }
            }
            None => {
                return Err(cursor.error(ErrorKind::UnsupportedType {
                    detail: "array has no length".to_string(),
                }));
            }
        }

        match &key {
            Some(key) => keyed(items, key).map_err(|kind| cursor.error(kind)).map(Some),
            None => Ok(Some(Value::Array(items))),
        }
    })
}

/// Decodes an element of an open-ended array, failing if it consumed no input.
fn decode_progressing(
    element: &CompiledElement,
    cursor: &mut Cursor<'_>,
    index: usize,
) -> Result<Value, ParseError> {
    let before = cursor.offset();
    let value = element.decode(cursor).map_err(|err| err.at_index(index))?;
    if cursor.offset() == before {
        return Err(cursor
            .error(ErrorKind::UnsupportedType {
                detail: "array element consumed no input".to_string(),
            })
            .at_index(index));
    }
    Ok(value)
}

fn keyed(items: Vec<Value>, key: &str) -> Result<Value, ErrorKind> {
    let mut out = Record::new();
    for item in items {
        let name = item
            .as_record()
            .and_then(|fields| fields.get(key))
            .and_then(Value::key_text)
            .ok_or_else(|| ErrorKind::UnsupportedType {
                detail: format!("array element has no integer or string key `{key}`"),
            })?;
        out.insert(name, item);
    }
    Ok(Value::Record(out))
}

fn compile_pointer(options: &PointerOptions, default_endian: Endian) -> Decode {
    let offset = options.offset.clone();
    let element = CompiledElement::new(&options.element, default_endian);

    Box::new(move |cursor, record| {
        cursor.end_run();
        let target = offset.resolve_len(record).map_err(|kind| cursor.error(kind))?;
        let saved = cursor.offset();
        cursor.seek_to(target)?;
        let value = element.decode(cursor)?;
        cursor.seek_to(saved)?;
        Ok(Some(value))
    })
}

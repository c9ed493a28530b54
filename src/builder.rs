//! Fluent declaration surface for [Parser]s.

use std::sync::Arc;

use crate::{
    errors::{BoxError, SchemaError},
    field::{
        ArrayOptions, Assertion, BufferOptions, ChoiceOptions, Element, FieldKind, FieldSpec,
        PointerOptions, StringOptions,
    },
    primitive::{Endian, Primitive},
    resolver::Arg,
    schema::Parser,
    value::{Record, Value},
};

/// Accumulates field declarations in order. Each method consumes the builder and returns it
/// extended by one field; [ParserBuilder::build] validates and compiles the result.
///
/// ```
/// use bincraft::{Encoding, Parser, StringOptions, Value};
///
/// let parser = Parser::start()
///     .uint8("length")
///     .string("msg", StringOptions::new().length("length").encoding(Encoding::Utf8))
///     .build()
///     .unwrap();
///
/// let record = parser.parse(b"\x05hello").unwrap();
/// assert_eq!(record["msg"], Value::from("hello"));
/// ```
#[derive(Debug, Default)]
pub struct ParserBuilder {
    specs: Vec<FieldSpec>,
    endian: Endian,
    errors: Vec<SchemaError>,
}

macro_rules! primitive_methods {
    ($($default:ident, $le:ident, $be:ident => $kind:ident;)+) => {
        $(
            /// Declares the primitive with the current default endianness.
            pub fn $default(self, name: impl Into<String>) -> Self {
                let endian = self.endian;
                self.primitive(name, Primitive::$kind, endian)
            }

            pub fn $le(self, name: impl Into<String>) -> Self {
                self.primitive(name, Primitive::$kind, Endian::Little)
            }

            pub fn $be(self, name: impl Into<String>) -> Self {
                self.primitive(name, Primitive::$kind, Endian::Big)
            }
        )+
    };
}

macro_rules! bit_methods {
    ($($method:ident => $width:literal),+ $(,)?) => {
        $(
            pub fn $method(self, name: impl Into<String>) -> Self {
                self.bits(name, $width)
            }
        )+
    };
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default endianness for primitives and bit fields declared from now on.
    pub fn endianness(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    #[cfg(feature = "serde")]
    pub(crate) fn default_endian(&self) -> Endian {
        self.endian
    }

    /// Same as [ParserBuilder::endianness].
    pub fn endianess(self, endian: Endian) -> Self {
        self.endianness(endian)
    }

    /// Appends a hand-made declaration.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.specs.push(spec);
        self
    }

    fn push(self, name: Option<String>, kind: FieldKind) -> Self {
        self.field(FieldSpec::new(name, kind))
    }

    pub fn primitive(self, name: impl Into<String>, kind: Primitive, endian: Endian) -> Self {
        self.push(Some(name.into()), FieldKind::Primitive { kind, endian })
    }

    pub fn uint8(self, name: impl Into<String>) -> Self {
        self.primitive(name, Primitive::U8, Endian::Big)
    }

    pub fn int8(self, name: impl Into<String>) -> Self {
        self.primitive(name, Primitive::I8, Endian::Big)
    }

    primitive_methods! {
        uint16, uint16le, uint16be => U16;
        int16, int16le, int16be => I16;
        uint32, uint32le, uint32be => U32;
        int32, int32le, int32be => I32;
        uint64, uint64le, uint64be => U64;
        int64, int64le, int64be => I64;
        float, floatle, floatbe => F32;
        double, doublele, doublebe => F64;
    }

    /// Declares an unsigned bit field of `width` bits (1..=32).
    pub fn bits(self, name: impl Into<String>, width: u8) -> Self {
        let endian = self.endian;
        self.push(Some(name.into()), FieldKind::Bits { width, endian })
    }

    bit_methods! {
        bit1 => 1, bit2 => 2, bit3 => 3, bit4 => 4, bit5 => 5, bit6 => 6, bit7 => 7, bit8 => 8,
        bit9 => 9, bit10 => 10, bit11 => 11, bit12 => 12, bit13 => 13, bit14 => 14, bit15 => 15,
        bit16 => 16, bit17 => 17, bit18 => 18, bit19 => 19, bit20 => 20, bit21 => 21, bit22 => 22,
        bit23 => 23, bit24 => 24, bit25 => 25, bit26 => 26, bit27 => 27, bit28 => 28, bit29 => 29,
        bit30 => 30, bit31 => 31, bit32 => 32,
    }

    pub fn string(self, name: impl Into<String>, options: StringOptions) -> Self {
        self.push(Some(name.into()), FieldKind::Str(options))
    }

    pub fn buffer(self, name: impl Into<String>, options: BufferOptions) -> Self {
        self.push(Some(name.into()), FieldKind::Buf(options))
    }

    /// Moves the byte cursor by `by` bytes (negative moves back) without decoding.
    pub fn seek(self, by: impl Into<Arg>) -> Self {
        self.push(None, FieldKind::Seek(by.into()))
    }

    /// Runs `parser` at the current position and stores its record under `name`.
    pub fn nest(self, name: impl Into<String>, parser: Parser) -> Self {
        self.push(Some(name.into()), FieldKind::Nest(parser))
    }

    /// Runs `parser` at the current position, merging its fields into this record.
    pub fn nest_inline(self, parser: Parser) -> Self {
        self.push(None, FieldKind::Nest(parser))
    }

    pub fn choice(self, name: impl Into<String>, options: ChoiceOptions) -> Self {
        let options = self.pin_choice(options);
        self.push(Some(name.into()), FieldKind::Choice(options))
    }

    /// A choice whose selected parser's fields are merged into this record. Every alternative
    /// must be a parser.
    pub fn choice_inline(self, options: ChoiceOptions) -> Self {
        let options = self.pin_choice(options);
        self.push(None, FieldKind::Choice(options))
    }

    pub fn array(self, name: impl Into<String>, mut options: ArrayOptions) -> Self {
        options.element = self.pin(options.element);
        self.push(Some(name.into()), FieldKind::Array(options))
    }

    /// Decodes `options.element` at an absolute offset, then returns to the current position.
    pub fn pointer(self, name: impl Into<String>, mut options: PointerOptions) -> Self {
        options.element = self.pin(options.element);
        self.push(Some(name.into()), FieldKind::Pointer(options))
    }

    /// Stores the current byte offset under `name`.
    pub fn save_offset(self, name: impl Into<String>) -> Self {
        self.push(Some(name.into()), FieldKind::SaveOffset)
    }

    /// Transforms the value of the last declared field before it is stored.
    pub fn formatter<F>(self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.modify_last("formatter", |spec| spec.formatter = Some(Arc::new(f)))
    }

    /// Fails the parse unless `pred` holds for the last declared field's value.
    pub fn assert<F>(self, pred: F) -> Self
    where
        F: Fn(&Value, &Record) -> bool + Send + Sync + 'static,
    {
        self.modify_last("assert", |spec| {
            spec.assertion = Some(Assertion::Predicate(Arc::new(pred)))
        })
    }

    /// Fails the parse unless the last declared field's value equals `expected`.
    pub fn assert_eq(self, expected: impl Into<Value>) -> Self {
        let expected = expected.into();
        self.modify_last("assert_eq", |spec| {
            spec.assertion = Some(Assertion::Equals(expected))
        })
    }

    fn modify_last(mut self, what: &str, f: impl FnOnce(&mut FieldSpec)) -> Self {
        match self.specs.last_mut() {
            Some(spec) => f(spec),
            None => self
                .errors
                .push(SchemaError::invalid(format!("{what} without a preceding field"))),
        }
        self
    }

    /// Fixes the endianness of a primitive element to the current default.
    fn pin(&self, element: Element) -> Element {
        match element {
            Element::Primitive(kind, None) => Element::Primitive(kind, Some(self.endian)),
            other => other,
        }
    }

    fn pin_choice(&self, mut options: ChoiceOptions) -> ChoiceOptions {
        options.choices = options
            .choices
            .into_iter()
            .map(|(tag, element)| (tag, self.pin(element)))
            .collect();
        options.default_choice = options.default_choice.map(|element| self.pin(element));
        options
    }

    /// Validates the declarations and compiles them into an immutable [Parser].
    pub fn build(self) -> Result<Parser, SchemaError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        Parser::compile(self.specs, self.endian)
    }
}

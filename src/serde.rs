//! JSON-deserializable schema description.
//!
//! These types describe a schema the same way the builder does, so a schema can ship as a JSON
//! file with your application and be compiled into a [Parser] at startup. Callbacks (formatters,
//! predicates, resolver functions) cannot be expressed here; use the builder for those.
//!
//! ```
//! use bincraft::{Parser, Value};
//!
//! let parser = Parser::from_json(r#"{
//!     "endian": "little",
//!     "fields": [
//!         { "type": "primitive", "name": "len", "kind": "uint8" },
//!         { "type": "string", "name": "msg", "length": "len" }
//!     ]
//! }"#).unwrap();
//!
//! let record = parser.parse(b"\x02hi").unwrap();
//! assert_eq!(record["msg"], Value::from("hi"));
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    builder::ParserBuilder,
    errors::SchemaError,
    field::{ArrayOptions, BufferOptions, ChoiceOptions, Element, PointerOptions, StringOptions},
    primitive::{Endian, Primitive},
    resolver::Arg,
    schema::Parser,
    string::Encoding,
};

/// Byte order.
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum EndianDef {
    Little,
    #[default]
    Big,
}

impl From<EndianDef> for Endian {
    fn from(value: EndianDef) -> Self {
        match value {
            EndianDef::Little => Endian::Little,
            EndianDef::Big => Endian::Big,
        }
    }
}

/// Primitive type names.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveDef {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Uint64,
    Int64,
    Float,
    Double,
}

impl From<PrimitiveDef> for Primitive {
    fn from(value: PrimitiveDef) -> Self {
        match value {
            PrimitiveDef::Uint8 => Primitive::U8,
            PrimitiveDef::Int8 => Primitive::I8,
            PrimitiveDef::Uint16 => Primitive::U16,
            PrimitiveDef::Int16 => Primitive::I16,
            PrimitiveDef::Uint32 => Primitive::U32,
            PrimitiveDef::Int32 => Primitive::I32,
            PrimitiveDef::Uint64 => Primitive::U64,
            PrimitiveDef::Int64 => Primitive::I64,
            PrimitiveDef::Float => Primitive::F32,
            PrimitiveDef::Double => Primitive::F64,
        }
    }
}

/// Text encodings.
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum EncodingDef {
    #[default]
    Utf8,
    Ascii,
    Latin1,
    Hex,
    Utf16le,
}

impl From<EncodingDef> for Encoding {
    fn from(value: EncodingDef) -> Self {
        match value {
            EncodingDef::Utf8 => Encoding::Utf8,
            EncodingDef::Ascii => Encoding::Ascii,
            EncodingDef::Latin1 => Encoding::Latin1,
            EncodingDef::Hex => Encoding::Hex,
            EncodingDef::Utf16le => Encoding::Utf16Le,
        }
    }
}

/// A dynamic argument: a number, or the name of an earlier field.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum ArgDef {
    Literal(i64),
    Field(String),
}

impl From<ArgDef> for Arg {
    fn from(value: ArgDef) -> Self {
        match value {
            ArgDef::Literal(v) => Arg::Literal(v),
            ArgDef::Field(name) => Arg::Field(name),
        }
    }
}

/// Top-level schema definition: default endianness plus the ordered fields.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SchemaDef {
    #[serde(default)]
    pub endian: EndianDef,
    pub fields: Vec<FieldDef>,
}

/// Element of an array, choice alternative or pointer target.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "snake_case")]
pub enum ElementDef {
    /// A primitive; endianness defaults to the schema's.
    Primitive {
        kind: PrimitiveDef,
        #[serde(default)]
        endian: Option<EndianDef>,
    },
    /// A nested schema, decoded into its own record.
    Schema(Box<SchemaDef>),
}

/// One alternative of a choice.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AlternativeDef {
    pub tag: i64,
    pub element: ElementDef,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldDef {
    Primitive {
        name: String,
        kind: PrimitiveDef,
        #[serde(default)]
        endian: Option<EndianDef>,
        /// Fails the parse unless the value equals this integer.
        #[serde(default)]
        expect: Option<i64>,
    },
    Bits {
        name: String,
        width: u8,
        #[serde(default)]
        expect: Option<i64>,
    },
    #[serde(rename = "string")]
    Str {
        name: String,
        #[serde(default)]
        length: Option<ArgDef>,
        #[serde(default)]
        zero_terminated: bool,
        #[serde(default)]
        greedy: bool,
        #[serde(default)]
        strip_null: bool,
        #[serde(default)]
        encoding: EncodingDef,
    },
    Buffer {
        name: String,
        #[serde(default)]
        length: Option<ArgDef>,
        /// Read to the end of the input when no length is given.
        #[serde(default)]
        read_until_eof: bool,
        /// Read up to (and consume) this terminator byte when no length is given.
        #[serde(default)]
        terminator: Option<u8>,
        #[serde(default)]
        clone: bool,
    },
    Seek {
        by: ArgDef,
    },
    Nest {
        /// Omitted: the nested fields are merged into the parent record.
        #[serde(default)]
        name: Option<String>,
        schema: Box<SchemaDef>,
    },
    Choice {
        #[serde(default)]
        name: Option<String>,
        tag: ArgDef,
        choices: Vec<AlternativeDef>,
        #[serde(default)]
        default_choice: Option<ElementDef>,
    },
    Array {
        name: String,
        element: ElementDef,
        #[serde(default)]
        length: Option<ArgDef>,
        #[serde(default)]
        length_in_bytes: Option<ArgDef>,
        #[serde(default)]
        read_until_eof: bool,
        #[serde(default)]
        key: Option<String>,
    },
    Pointer {
        name: String,
        offset: ArgDef,
        element: ElementDef,
    },
    SaveOffset {
        name: String,
    },
}

impl ElementDef {
    fn build(self) -> Result<Element, SchemaError> {
        Ok(match self {
            ElementDef::Primitive { kind, endian } => {
                Element::Primitive(kind.into(), endian.map(Into::into))
            }
            ElementDef::Schema(schema) => Element::Parser(schema.build()?),
        })
    }
}

impl FieldDef {
    fn declare(self, builder: ParserBuilder) -> Result<ParserBuilder, SchemaError> {
        let builder = match self {
            FieldDef::Primitive {
                name,
                kind,
                endian,
                expect,
            } => {
                let endian = endian.map_or(builder.default_endian(), Endian::from);
                let builder = builder.primitive(name, kind.into(), endian);
                match expect {
                    Some(expected) => builder.assert(move |value, _| value.as_i64() == Some(expected)),
                    None => builder,
                }
            }
            FieldDef::Bits {
                name,
                width,
                expect,
            } => {
                let builder = builder.bits(name, width);
                match expect {
                    Some(expected) => builder.assert(move |value, _| value.as_i64() == Some(expected)),
                    None => builder,
                }
            }
            FieldDef::Str {
                name,
                length,
                zero_terminated,
                greedy,
                strip_null,
                encoding,
            } => builder.string(
                name,
                StringOptions {
                    length: length.map(Into::into),
                    zero_terminated,
                    greedy,
                    strip_null,
                    encoding: encoding.into(),
                },
            ),
            FieldDef::Buffer {
                name,
                length,
                read_until_eof,
                terminator,
                clone,
            } => {
                let mut options = BufferOptions::new();
                if let Some(length) = length {
                    options = options.length(length);
                }
                if read_until_eof {
                    options = options.read_until_eof();
                }
                if let Some(terminator) = terminator {
                    options = options.read_until(move |b| b == terminator);
                }
                if clone {
                    options = options.clone_bytes();
                }
                builder.buffer(name, options)
            }
            FieldDef::Seek { by } => builder.seek(by),
            FieldDef::Nest { name, schema } => {
                let parser = schema.build()?;
                match name {
                    Some(name) => builder.nest(name, parser),
                    None => builder.nest_inline(parser),
                }
            }
            FieldDef::Choice {
                name,
                tag,
                choices,
                default_choice,
            } => {
                let mut options = ChoiceOptions::new(tag);
                for alternative in choices {
                    options = options.choice(alternative.tag, alternative.element.build()?);
                }
                if let Some(element) = default_choice {
                    options = options.default_choice(element.build()?);
                }
                match name {
                    Some(name) => builder.choice(name, options),
                    None => builder.choice_inline(options),
                }
            }
            FieldDef::Array {
                name,
                element,
                length,
                length_in_bytes,
                read_until_eof,
                key,
            } => {
                let mut options = ArrayOptions::new(element.build()?);
                options = match (length, length_in_bytes, read_until_eof) {
                    (Some(count), None, false) => options.length(count),
                    (None, Some(bytes), false) => options.length_in_bytes(bytes),
                    (None, None, true) => options.read_until_eof(),
                    (None, None, false) => options,
                    _ => {
                        return Err(SchemaError::invalid(format!(
                            "array `{name}` declares more than one length mode"
                        )));
                    }
                };
                if let Some(key) = key {
                    options = options.key(key);
                }
                builder.array(name, options)
            }
            FieldDef::Pointer {
                name,
                offset,
                element,
            } => builder.pointer(name, PointerOptions::new(offset, element.build()?)),
            FieldDef::SaveOffset { name } => builder.save_offset(name),
        };
        Ok(builder)
    }
}

impl SchemaDef {
    /// Compiles the definition into a [Parser].
    pub fn build(self) -> Result<Parser, SchemaError> {
        let mut builder = ParserBuilder::new().endianness(self.endian.into());
        for field in self.fields {
            builder = field.declare(builder)?;
        }
        builder.build()
    }
}

impl TryFrom<SchemaDef> for Parser {
    type Error = SchemaError;

    fn try_from(value: SchemaDef) -> Result<Self, Self::Error> {
        value.build()
    }
}

impl Parser {
    /// Reads a [SchemaDef] from JSON and compiles it.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let def: SchemaDef = serde_json::from_str(json)?;
        def.build()
    }
}

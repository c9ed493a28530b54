//! # bincraft
//!
//! A declarative binary parser. Compose typed field declarations (integers, floats, bit fields,
//! strings, byte spans, nested records, choices and arrays) into a [Parser], then parse byte
//! buffers into ordered [Record]s.
//!
//! Declarations are compiled once into a list of closures; parsing walks that list with a fresh
//! cursor, so one parser can be reused for any number of buffers, from any number of threads.
//!
//! ## Example
//!
//! ```
//! use bincraft::{Parser, Value};
//!
//! let parser = Parser::start()
//!     .uint8("a")
//!     .int16le("b")
//!     .uint32be("c")
//!     .build()
//!     .unwrap();
//!
//! let record = parser.parse(&[0x00, 0xd2, 0x04, 0x00, 0xbc, 0x61, 0x4e]).unwrap();
//! assert_eq!(record["a"], Value::U64(0));
//! assert_eq!(record["b"], Value::I64(1234));
//! assert_eq!(record["c"], Value::U64(12345678));
//! ```
//!
//! Lengths, counts, offsets and choice tags are [Arg]s: a literal, the name of a field decoded
//! earlier in the same record, or a callback over the record decoded so far.

pub mod bits;
mod buffer;
pub mod builder;
mod compiled;
mod cursor;
pub mod errors;
pub mod field;
pub mod primitive;
pub mod resolver;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod string;
pub mod value;

pub use builder::ParserBuilder;
pub use bytes::Bytes;
pub use errors::{BoxError, ErrorKind, ParseError, Position, SchemaError};
pub use field::{
    ArrayLength, ArrayOptions, Assertion, BufferOptions, ChoiceOptions, Element, FieldKind,
    FieldSpec, PointerOptions, StringOptions, Until,
};
pub use primitive::{Endian, Primitive};
pub use resolver::Arg;
pub use schema::Parser;
pub use string::Encoding;
pub use value::{Record, Value};

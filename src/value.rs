//! Decoded values and the ordered record a parse produces.

use std::ops::Index;

use bytes::Bytes;

/// A value produced by decoding one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unsigned integers and bit fields.
    U64(u64),
    /// Signed integers.
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    /// Raw byte span, either a view into the input or an independent copy.
    Bytes(Bytes),
    /// Result of a named nest or of a sub-parser element.
    Record(Record),
    Array(Vec<Value>),
}

impl Value {
    /// Integer view of the value, if it is an integer that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::U64(v) => i64::try_from(*v).ok(),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            Value::I64(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Value::U64(_) => "u64",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Record(_) => "record",
            Value::Array(_) => "array",
        }
    }

    /// Text used as a record key when an array is keyed by one of its element fields.
    pub(crate) fn key_text(&self) -> Option<String> {
        match self {
            Value::U64(v) => Some(v.to_string()),
            Value::I64(v) => Some(v.to_string()),
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Equality where integers compare by numeric value regardless of signedness.
    pub(crate) fn matches(&self, other: &Value) -> bool {
        match (self.as_integer(), other.as_integer()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    fn as_integer(&self) -> Option<i128> {
        match self {
            Value::U64(v) => Some(i128::from(*v)),
            Value::I64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )+
    };
}

value_from!(U64: u8, u16, u32, u64);
value_from!(I64: i8, i16, i32, i64);
value_from!(F32: f32);
value_from!(F64: f64);
value_from!(Str: String, &str);
value_from!(Bytes: Bytes, Vec<u8>);
value_from!(Record: Record);
value_from!(Array: Vec<Value>);

/// Ordered mapping from field name to decoded value.
///
/// Entries keep declaration order. Field names are unique within one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Looks up a dotted path such as `header.length`, descending through nested records.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut value = self.get(parts.next()?)?;
        for part in parts {
            value = value.as_record()?.get(part)?;
        }
        Some(value)
    }

    /// Integer value of `name`, if present and integral.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.get_path(name).and_then(Value::as_i64)
    }

    /// Inserts `value` under `name`, replacing an earlier value with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub(crate) fn merge(&mut self, other: Record) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }
}

impl Index<&str> for Record {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        match self.get(name) {
            Some(value) => value,
            None => panic!("no field `{name}` in record"),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Record {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(feature = "serde")]
mod serialize {
    use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

    use super::{Record, Value};

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Value::U64(v) => serializer.serialize_u64(*v),
                Value::I64(v) => serializer.serialize_i64(*v),
                Value::F32(v) => serializer.serialize_f32(*v),
                Value::F64(v) => serializer.serialize_f64(*v),
                Value::Str(s) => serializer.serialize_str(s),
                Value::Bytes(b) => serializer.serialize_bytes(b),
                Value::Record(r) => r.serialize(serializer),
                Value::Array(items) => {
                    let mut seq = serializer.serialize_seq(Some(items.len()))?;
                    for item in items {
                        seq.serialize_element(item)?;
                    }
                    seq.end()
                }
            }
        }
    }

    impl Serialize for Record {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (name, value) in self.iter() {
                map.serialize_entry(name, value)?;
            }
            map.end()
        }
    }
}

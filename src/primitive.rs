//! Fixed-width integer and float codecs.

use bytes::Buf;

use crate::value::Value;

/// Byte order of multi-byte primitives, and packing order of bit runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    Little,
    #[default]
    Big,
}

/// Fixed-width primitive field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl Primitive {
    /// Width in bytes.
    pub fn width(self) -> usize {
        match self {
            Primitive::U8 | Primitive::I8 => 1,
            Primitive::U16 | Primitive::I16 => 2,
            Primitive::U32 | Primitive::I32 | Primitive::F32 => 4,
            Primitive::U64 | Primitive::I64 | Primitive::F64 => 8,
        }
    }

    /// Decodes a value from the first [`Primitive::width`] bytes of `data`.
    ///
    /// Returns `None` if `data` is too short.
    pub fn decode(self, mut data: &[u8], endian: Endian) -> Option<Value> {
        if data.len() < self.width() {
            return None;
        }

        let value = match (self, endian) {
            (Primitive::U8, _) => Value::U64(data.get_u8().into()),
            (Primitive::I8, _) => Value::I64(data.get_i8().into()),
            (Primitive::U16, Endian::Little) => Value::U64(data.get_u16_le().into()),
            (Primitive::U16, Endian::Big) => Value::U64(data.get_u16().into()),
            (Primitive::I16, Endian::Little) => Value::I64(data.get_i16_le().into()),
            (Primitive::I16, Endian::Big) => Value::I64(data.get_i16().into()),
            (Primitive::U32, Endian::Little) => Value::U64(data.get_u32_le().into()),
            (Primitive::U32, Endian::Big) => Value::U64(data.get_u32().into()),
            (Primitive::I32, Endian::Little) => Value::I64(data.get_i32_le().into()),
            (Primitive::I32, Endian::Big) => Value::I64(data.get_i32().into()),
            (Primitive::U64, Endian::Little) => Value::U64(data.get_u64_le()),
            (Primitive::U64, Endian::Big) => Value::U64(data.get_u64()),
            (Primitive::I64, Endian::Little) => Value::I64(data.get_i64_le()),
            (Primitive::I64, Endian::Big) => Value::I64(data.get_i64()),
            (Primitive::F32, Endian::Little) => Value::F32(data.get_f32_le()),
            (Primitive::F32, Endian::Big) => Value::F32(data.get_f32()),
            (Primitive::F64, Endian::Little) => Value::F64(data.get_f64_le()),
            (Primitive::F64, Endian::Big) => Value::F64(data.get_f64()),
        };

        Some(value)
    }
}

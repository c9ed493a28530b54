//! String codec: locating the bytes of a string field and turning them into text.

use std::fmt::Write;

use crate::{
    cursor::Cursor,
    errors::{ErrorKind, ParseError},
    field::StringOptions,
    value::Record,
};

/// Byte-to-text transform of a string field. Decoding never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8; invalid sequences become U+FFFD.
    #[default]
    Utf8,
    /// 7-bit ASCII; bytes above 0x7F become U+FFFD.
    Ascii,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// Lower-case hex digits, two per byte.
    Hex,
    /// UTF-16 little endian; unpaired surrogates become U+FFFD, an odd trailing byte is ignored.
    Utf16Le,
}

impl Encoding {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Ascii => bytes
                .iter()
                .map(|&b| {
                    if b.is_ascii() {
                        char::from(b)
                    } else {
                        char::REPLACEMENT_CHARACTER
                    }
                })
                .collect(),
            Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Encoding::Hex => {
                let mut out = String::with_capacity(bytes.len() * 2);
                for b in bytes {
                    let _ = write!(out, "{b:02x}");
                }
                out
            }
            Encoding::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }
}

/// Reads a string field at the cursor according to `options`.
pub(crate) fn read_string(
    cursor: &mut Cursor<'_>,
    options: &StringOptions,
    record: &Record,
) -> Result<String, ParseError> {
    let data = cursor.data();

    let bytes = if options.zero_terminated {
        match &options.length {
            // Fixed slot: the terminator is searched within the slot, the whole slot is consumed.
            Some(length) => {
                let length = length
                    .resolve_len(record)
                    .map_err(|kind| cursor.error(kind))?;
                let slot = &data[cursor.take(length)?];
                let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
                &slot[..end]
            }
            None => {
                let rest = &data[cursor.offset()..];
                let Some(end) = rest.iter().position(|&b| b == 0) else {
                    return Err(cursor.error(ErrorKind::OutOfBounds {
                        needed: rest.len() + 1,
                        available: rest.len(),
                    }));
                };
                let range = cursor.take(end + 1)?;
                &data[range.start..range.end - 1]
            }
        }
    } else if options.greedy {
        &data[cursor.take(cursor.remaining())?]
    } else if let Some(length) = &options.length {
        let length = length
            .resolve_len(record)
            .map_err(|kind| cursor.error(kind))?;
        &data[cursor.take(length)?]
    } else {
        return Err(cursor.error(ErrorKind::UnsupportedType {
            detail: "string has no length, zero terminator or greedy mode".to_string(),
        }));
    };

    let mut text = options.encoding.decode(bytes);
    if options.strip_null && !options.zero_terminated {
        let trimmed = text.trim_end_matches('\0').len();
        text.truncate(trimmed);
    }

    Ok(text)
}

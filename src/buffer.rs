//! Buffer codec: raw byte spans.

use bytes::Bytes;

use crate::{
    cursor::Cursor,
    errors::{ErrorKind, ParseError},
    field::{BufferOptions, Until},
    value::Record,
};

/// Reads a buffer field at the cursor according to `options`.
pub(crate) fn read_buffer(
    cursor: &mut Cursor<'_>,
    options: &BufferOptions,
    record: &Record,
) -> Result<Bytes, ParseError> {
    let range = match (&options.length, &options.read_until) {
        (Some(length), _) => {
            let length = length
                .resolve_len(record)
                .map_err(|kind| cursor.error(kind))?;
            cursor.take(length)?
        }
        (None, Some(Until::Eof)) => cursor.take(cursor.remaining())?,
        (None, Some(Until::Byte(pred))) => {
            let rest = &cursor.data()[cursor.offset()..];
            match rest.iter().position(|&b| pred(b)) {
                Some(end) => {
                    let range = cursor.take(end + 1)?;
                    range.start..range.end - 1
                }
                None => cursor.take(rest.len())?,
            }
        }
        (None, None) => {
            return Err(cursor.error(ErrorKind::UnsupportedType {
                detail: "buffer has neither length nor read_until".to_string(),
            }));
        }
    };

    Ok(cursor.bytes(range, options.clone))
}

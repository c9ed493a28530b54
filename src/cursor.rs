//! Per-parse read position: byte offset plus the state of the current bit run.

use std::ops::Range;

use bytes::Bytes;

use crate::{
    bits,
    errors::{ErrorKind, ParseError, Position},
    primitive::{Endian, Primitive},
    value::Value,
};

/// A run of consecutive bit fields sharing the bytes they were read from.
///
/// The run's bytes are treated as one big-endian integer `width` bits wide. Big-endian runs hand
/// out bits from the most significant end, little-endian runs from the least significant end.
#[derive(Debug, Clone, Copy)]
struct BitRun {
    start: usize,
    width: usize,
    declared: usize,
    consumed: usize,
    endian: Endian,
}

/// Read position over one input buffer. Created fresh for every parse.
pub(crate) struct Cursor<'a> {
    input: &'a Bytes,
    offset: usize,
    run: Option<BitRun>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a Bytes) -> Self {
        Cursor {
            input,
            offset: 0,
            run: None,
        }
    }

    pub(crate) fn data(&self) -> &'a [u8] {
        &self.input[..]
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn remaining(&self) -> usize {
        self.input.len() - self.offset
    }

    pub(crate) fn position(&self) -> Position {
        match self.run {
            Some(run) => Position::new(run.start + run.consumed / 8, (run.consumed % 8) as u8),
            None => Position::new(self.offset, 0),
        }
    }

    pub(crate) fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError::new(kind, self.position())
    }

    fn out_of_bounds(&self, needed: usize) -> ParseError {
        self.error(ErrorKind::OutOfBounds {
            needed,
            available: self.remaining(),
        })
    }

    /// Drops what is left of the current bit run. Byte-aligned fields call this first.
    pub(crate) fn end_run(&mut self) {
        self.run = None;
    }

    /// Consumes `n` bytes and returns their range in the input.
    pub(crate) fn take(&mut self, n: usize) -> Result<Range<usize>, ParseError> {
        if n > self.remaining() {
            return Err(self.out_of_bounds(n));
        }
        let start = self.offset;
        self.offset += n;
        Ok(start..self.offset)
    }

    /// Bytes of `range` as a view sharing the input allocation, or as an independent copy.
    pub(crate) fn bytes(&self, range: Range<usize>, clone: bool) -> Bytes {
        if clone {
            Bytes::copy_from_slice(&self.input[range])
        } else {
            self.input.slice(range)
        }
    }

    pub(crate) fn read_primitive(
        &mut self,
        kind: Primitive,
        endian: Endian,
    ) -> Result<Value, ParseError> {
        let range = self.take(kind.width())?;
        let data = self.data();
        kind.decode(&data[range], endian)
            .ok_or_else(|| self.out_of_bounds(kind.width()))
    }

    /// Moves the cursor by `delta` bytes. The result must stay within the input.
    pub(crate) fn seek_by(&mut self, delta: i64) -> Result<(), ParseError> {
        let target = i64::try_from(self.offset)
            .ok()
            .and_then(|offset| offset.checked_add(delta))
            .and_then(|target| usize::try_from(target).ok());
        match target {
            Some(target) if target <= self.input.len() => {
                self.offset = target;
                Ok(())
            }
            _ => Err(self.out_of_bounds(usize::try_from(delta).unwrap_or(0))),
        }
    }

    /// Moves the cursor to an absolute offset, which must be within the input.
    pub(crate) fn seek_to(&mut self, offset: usize) -> Result<(), ParseError> {
        if offset > self.input.len() {
            return Err(self.error(ErrorKind::OutOfBounds {
                needed: offset,
                available: self.input.len(),
            }));
        }
        self.offset = offset;
        Ok(())
    }

    /// Reads a `width`-bit field.
    ///
    /// Continues the active run when the field still fits in it, otherwise starts a new run of
    /// `run_bits` bits (this field plus the fields that follow it in the same run).
    pub(crate) fn read_bits(
        &mut self,
        width: usize,
        endian: Endian,
        run_bits: usize,
    ) -> Result<u64, ParseError> {
        let mut run = match self.run.take() {
            Some(run) if run.consumed + width <= run.declared => run,
            _ => self.start_run(run_bits.max(width), endian)?,
        };

        let at = match run.endian {
            Endian::Big => run.start * 8 + run.consumed,
            Endian::Little => run.start * 8 + run.width - run.consumed - width,
        };
        let value = match bits::read_bits_at(self.data(), at, width) {
            Some(value) => value,
            None => return Err(self.out_of_bounds(bits::bytes_for_bits(width))),
        };

        run.consumed += width;
        if run.consumed < run.declared {
            self.run = Some(run);
        }

        Ok(value)
    }

    fn start_run(&mut self, declared: usize, endian: Endian) -> Result<BitRun, ParseError> {
        let len = bits::bytes_for_bits(declared);
        let range = self.take(len)?;
        Ok(BitRun {
            start: range.start,
            width: len * 8,
            declared,
            consumed: 0,
            endian,
        })
    }
}

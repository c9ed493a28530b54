//! Low-level bit reads over byte slices.
//!
//! Bits are addressed in MSB-first order: bit 0 is the high bit of the first byte.

/// Reads a single bit at `bit_pos` (0 = MSB of first byte). Returns 0 or 1, or `None` past the end.
pub fn read_bit_at(data: &[u8], bit_pos: usize) -> Option<u8> {
    let byte = *data.get(bit_pos / 8)?;
    Some((byte >> (7 - bit_pos % 8)) & 1)
}

/// Reads `n` bits starting at `bit_pos` as an unsigned value (max 64 bits). MSB-first.
///
/// Returns `None` if the range runs past the end of `data` or `n` exceeds 64.
pub fn read_bits_at(data: &[u8], bit_pos: usize, n: usize) -> Option<u64> {
    if n > 64 || bit_pos.checked_add(n).is_none_or(|end| end > data.len() * 8) {
        return None;
    }

    let mut value = 0u64;
    let mut pos = bit_pos;

    // Whole bytes once aligned, single bits at the edges.
    while pos < bit_pos + n {
        let left = bit_pos + n - pos;
        if pos % 8 == 0 && left >= 8 {
            value = (value << 8) | u64::from(data[pos / 8]);
            pos += 8;
        } else {
            value = (value << 1) | u64::from(read_bit_at(data, pos)?);
            pos += 1;
        }
    }

    Some(value)
}

/// Number of whole bytes needed to hold `bits` bits.
pub fn bytes_for_bits(bits: usize) -> usize {
    bits.div_ceil(8)
}

// src/ingest/key.rs

/// Letters per word.
pub const WORD_LEN: usize = 5;

/// Sentinel appended after each tier. Shares a bit with every key, so it
/// never passes a disjointness test.
pub const POISON: u32 = u32::MAX;

/// One bit per letter present, bit `i` for `'a' + i`.
/// Repeated letters set the same bit again, so the popcount drops below 5.
/// Caller guarantees `w` is all `a..=z`.
#[inline(always)]
pub fn calc_key(w: &[u8; WORD_LEN]) -> u32 {
    (1u32 << (w[0] - b'a'))
        | (1u32 << (w[1] - b'a'))
        | (1u32 << (w[2] - b'a'))
        | (1u32 << (w[3] - b'a'))
        | (1u32 << (w[4] - b'a'))
}

/// True iff the key came from five distinct letters.
#[inline(always)]
pub fn is_valid(key: u32) -> bool {
    key.count_ones() == WORD_LEN as u32
}

#[inline(always)]
pub fn letter_bit(letter: u8) -> u32 {
    1u32 << (letter - b'a')
}

/// Lowest letter of a single-bit mask, `'?'` for an empty mask.
#[inline]
pub fn mask_letter(mask: u32) -> char {
    if mask == 0 {
        '?'
    } else {
        (b'a' + mask.trailing_zeros() as u8) as char
    }
}

use itertools::Itertools;

use crate::ingest::Prepared;
use crate::ingest::key::WORD_LEN;

/// Five words, each followed by one separator byte.
pub const RECORD_LEN: usize = WORD_LEN * (WORD_LEN + 1);

/// `a\tb\tc\td\te\n` with the words in byte order, or `None` if a key has no
/// word in the table.
pub fn format_record(prepared: &Prepared, keys: &[u32; WORD_LEN]) -> Option<[u8; RECORD_LEN]> {
    let mut words: [&[u8]; WORD_LEN] = [&[]; WORD_LEN];
    for (slot, &key) in words.iter_mut().zip(keys) {
        *slot = prepared.word(key)?;
    }
    words.sort_unstable();

    let mut rec = [0u8; RECORD_LEN];
    for (i, (dst, w)) in rec.chunks_exact_mut(WORD_LEN + 1).zip(words).enumerate() {
        dst[..WORD_LEN].copy_from_slice(w);
        dst[WORD_LEN] = if i + 1 == WORD_LEN { b'\n' } else { b'\t' };
    }
    Some(rec)
}

/// All solutions as sorted records, concatenated. Unresolvable ones are
/// skipped with a warning.
pub fn records(prepared: &Prepared, solutions: &[[u32; WORD_LEN]]) -> Vec<u8> {
    let mut missing = 0usize;
    let out: Vec<u8> = solutions
        .iter()
        .filter_map(|keys| {
            let rec = format_record(prepared, keys);
            if rec.is_none() {
                missing += 1;
            }
            rec
        })
        .sorted_unstable()
        .dedup()
        .flatten()
        .collect();
    if missing > 0 {
        eprintln!("[warn] {missing} solutions reference keys missing from the table");
    }
    out
}

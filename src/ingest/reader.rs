use std::sync::atomic::Ordering;

use super::Shared;
use super::key::{WORD_LEN, calc_key, is_valid};
use super::scan::ScanImpl;
use super::store::WordStore;
use crate::tiers::freq::LetterCounts;

/// Scan range for the chunk starting at `s`, or `None` past the end.
///
/// The range ends one byte past the nominal chunk so a line starting exactly
/// on the next chunk's start is still ours; every chunk but the first skips
/// the line it starts in, which the previous chunk owns.
pub fn chunk_range(buf: &[u8], s: usize, chunk: usize) -> Option<(usize, usize)> {
    let len = buf.len();
    if s > len {
        return None;
    }
    let e = (s + chunk + 1).min(len);
    let mut s = s;
    if s > 0 {
        s = match buf[s..e].iter().position(|&c| c == b'\n') {
            Some(i) => s + i + 1,
            None => e,
        };
    }
    Some((s, e))
}

/// Accepts one scanned word: keeps it if all five letters differ.
#[inline(always)]
pub fn process_five_word(word: &[u8; WORD_LEN], store: &WordStore, counts: &LetterCounts) {
    let key = calc_key(word);
    if is_valid(key) && store.push(word, key) {
        counts.bump(word);
    }
}

/// Scans `[s, e)` into the store, counting letters into `counts`.
pub fn find_words(
    scanner: ScanImpl,
    buf: &[u8],
    s: usize,
    e: usize,
    store: &WordStore,
    counts: &LetterCounts,
) {
    scanner.scan(buf, s, e, &mut |i| {
        if let Some(Ok(word)) = buf.get(i..i + WORD_LEN).map(<&[u8; WORD_LEN]>::try_from) {
            process_five_word(word, store, counts);
        }
    });
}

/// Reader loop: claim chunks until the buffer runs out, then check in.
pub(crate) fn file_reader(shared: &Shared, rn: usize) {
    let buf: &[u8] = &shared.input;
    let chunk = shared.chunk;
    let counts = &shared.counts[rn];

    loop {
        let s = shared.file_pos.fetch_add(chunk, Ordering::Relaxed);
        let Some((s, e)) = chunk_range(buf, s, chunk) else {
            break;
        };
        find_words(shared.scanner, buf, s, e, &shared.store, counts);
    }

    shared.readers_done.fetch_add(1, Ordering::Release);
}

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU32, Ordering};

use crossbeam_utils::CachePadded;

use super::{Frequency, LETTERS};
use crate::ingest::key::WORD_LEN;

/// One reader's letter counters. 32 slots rather than 26 so a padded block
/// covers whole cache lines.
#[derive(Default)]
pub struct LetterCounts([AtomicU32; 32]);

impl LetterCounts {
    /// Only the owning reader calls this, so load + store is enough.
    #[inline(always)]
    pub fn bump(&self, word: &[u8; WORD_LEN]) {
        for &c in word {
            let slot = &self.0[(c - b'a') as usize];
            slot.store(slot.load(Ordering::Relaxed) + 1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn get(&self, letter: usize) -> u32 {
        self.0[letter].load(Ordering::Acquire)
    }
}

/// Per-reader counters, each on its own cache lines.
pub type ReaderCounts = Box<[CachePadded<LetterCounts>]>;

pub fn reader_counts(readers: usize) -> ReaderCounts {
    (0..readers).map(|_| CachePadded::new(LetterCounts::default())).collect()
}

/// Fresh records: letter masks set, everything else zero.
pub fn frq_init() -> [Frequency; LETTERS] {
    let mut frq = [Frequency::default(); LETTERS];
    for (b, f) in frq.iter_mut().enumerate() {
        f.mask = 1u32 << b;
    }
    frq
}

/// Sums every reader's counters into canonical records, indexed by letter.
/// Call only after all readers are done.
pub fn merge(counts: &[CachePadded<LetterCounts>]) -> [Frequency; LETTERS] {
    let mut frq = frq_init();
    for (c, f) in frq.iter_mut().enumerate() {
        f.count = counts.iter().map(|r| r.get(c)).sum();
    }
    frq
}

/// Rarest first, with a zero count ranked after every nonzero count.
pub fn by_frequency_lo(a: &Frequency, b: &Frequency) -> CmpOrdering {
    match (a.count, b.count) {
        (x, y) if x == y => CmpOrdering::Equal,
        (0, _) => CmpOrdering::Greater,
        (_, 0) => CmpOrdering::Less,
        (x, y) => x.cmp(&y),
    }
}

/// Stable, so equal counts keep their incoming order.
pub fn sort_rarest_first(frq: &mut [Frequency]) {
    frq.sort_by(by_frequency_lo);
}

/// Recounts the letters of `frq` over `keys` and re-sorts them rarest first.
pub fn rescan_frequencies(frq: &mut [Frequency], keys: &[u32]) {
    let mut slot_of = [usize::MAX; LETTERS];
    for (i, f) in frq.iter_mut().enumerate() {
        slot_of[f.mask.trailing_zeros() as usize] = i;
        f.count = 0;
    }

    for &key in keys {
        let mut k = key;
        while k != 0 {
            let i = k.trailing_zeros() as usize;
            if let Some(f) = frq.get_mut(slot_of[i]) {
                f.count += 1;
            }
            k ^= 1u32 << i;
        }
    }

    sort_rarest_first(frq);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(letter: u8, count: u32) -> Frequency {
        Frequency {
            mask: 1 << (letter - b'a'),
            count,
            ..Frequency::default()
        }
    }

    fn letters(frq: &[Frequency]) -> String {
        frq.iter().map(|f| f.letter()).collect()
    }

    #[test]
    fn zero_counts_sort_last() {
        let mut frq = vec![rec(b'a', 0), rec(b'b', 5), rec(b'c', 1), rec(b'd', 0), rec(b'e', 3)];
        sort_rarest_first(&mut frq);
        assert_eq!(letters(&frq), "cebad");
    }

    #[test]
    fn ties_keep_input_order() {
        let mut frq = vec![rec(b'q', 2), rec(b'b', 2), rec(b'x', 1), rec(b'a', 2)];
        sort_rarest_first(&mut frq);
        assert_eq!(letters(&frq), "xqba");
    }

    #[test]
    fn merge_sums_all_readers() {
        let counts = reader_counts(3);
        counts[0].bump(b"tacos");
        counts[2].bump(b"brief");
        counts[1].bump(b"fjord");
        let frq = merge(&counts);
        for (i, f) in frq.iter().enumerate() {
            assert_eq!(f.mask, 1 << i);
        }
        assert_eq!(frq[(b'f' - b'a') as usize].count, 2);
        assert_eq!(frq[(b't' - b'a') as usize].count, 1);
        assert_eq!(frq[(b'z' - b'a') as usize].count, 0);
    }

    #[test]
    fn counters_do_not_share_cache_lines() {
        let counts = reader_counts(2);
        let a = &*counts[0] as *const LetterCounts as usize;
        let b = &*counts[1] as *const LetterCounts as usize;
        assert!(b - a >= 64);
        assert_eq!(a % 64, 0);
    }

    #[test]
    fn rescan_counts_only_given_keys() {
        let mut frq = vec![rec(b'a', 9), rec(b'b', 9), rec(b'c', 9)];
        let keys = [0b011u32, 0b010, 0b110 | (1 << 20)];
        rescan_frequencies(&mut frq, &keys);
        // a:1 b:3 c:1, bit 20 is not tracked here
        assert_eq!(letters(&frq), "acb");
        assert_eq!(frq.iter().map(|f| f.count).collect::<Vec<_>>(), vec![1, 1, 3]);
    }
}

use std::ops::Range;

use crate::ingest::key::{POISON, mask_letter};

pub mod freq;
pub mod partition;

pub use partition::setup_frequency_sets;

pub const LETTERS: usize = 26;

/// One letter's record. `start`/`len` index the shared key array; the
/// `toff*` offsets are relative to `start`.
///
/// Layout of a tier after splitting on `tm1`/`tm2`:
/// `[0, toff1)` has both, `[toff1, toff2)` tm1 only,
/// `[toff2, toff3)` neither, `[toff3, len)` tm2 only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frequency {
    pub mask: u32,
    pub count: u32,
    pub tm1: u32,
    pub tm2: u32,
    pub toff1: usize,
    pub toff2: usize,
    pub toff3: usize,
    pub start: usize,
    pub len: usize,
}

impl Frequency {
    pub fn letter(&self) -> char {
        mask_letter(self.mask)
    }

    /// Part of the tier (relative to `start`) that can still be disjoint
    /// from `used`, judged by `tm1`/`tm2` alone.
    #[inline]
    pub fn candidates(&self, used: u32) -> Range<usize> {
        match (used & self.tm1 != 0, used & self.tm2 != 0) {
            (false, false) => 0..self.len,
            (true, false) => self.toff2..self.len,
            (false, true) => self.toff1..self.toff3,
            (true, true) => self.toff2..self.toff3,
        }
    }
}

/// The key array after tiering, with its 26 records in tier order.
#[derive(Debug, Clone)]
pub struct Tiers {
    pub frq: [Frequency; LETTERS],
    /// Real keys plus `num_poison` sentinels after every tier.
    pub keys: Vec<u32>,
    pub nkeys: usize,
    pub num_poison: usize,
    /// Last tier position with keys, minus 3. May be negative.
    pub min_search_depth: i32,
}

impl Tiers {
    pub fn tier(&self, i: usize) -> &[u32] {
        let f = &self.frq[i];
        &self.keys[f.start..f.start + f.len]
    }

    /// Tier followed by its sentinels, for fixed-width reads.
    pub fn padded(&self, i: usize) -> &[u32] {
        let f = &self.frq[i];
        &self.keys[f.start..f.start + f.len + self.num_poison]
    }

    /// Keys of tier `i` that survive the `tm1`/`tm2` test for `used`.
    #[inline]
    pub fn candidates(&self, i: usize, used: u32) -> &[u32] {
        let f = &self.frq[i];
        let r = f.candidates(used);
        &self.keys[f.start + r.start..f.start + r.end]
    }

    /// Every non-sentinel key, tier by tier.
    pub fn real_keys(&self) -> impl Iterator<Item = u32> + '_ {
        (0..LETTERS).flat_map(move |i| self.tier(i).iter().copied())
    }

    pub fn poison_count(&self) -> usize {
        self.keys.iter().filter(|&&k| k == POISON).count()
    }
}

/// One line per tier on stderr.
pub fn debug_summary(tiers: &Tiers) {
    eprintln!(
        "[tiers] keys={} poison/tier={} min_search_depth={}",
        tiers.nkeys, tiers.num_poison, tiers.min_search_depth
    );
    for (i, f) in tiers.frq.iter().enumerate() {
        eprintln!(
            "    {:>2} {} count={:<5} start={:<5} len={:<5} tm1={} tm2={} toff=({}, {}, {})",
            i,
            f.letter(),
            f.count,
            f.start,
            f.len,
            mask_letter(f.tm1),
            mask_letter(f.tm2),
            f.toff1,
            f.toff2,
            f.toff3
        );
    }
}

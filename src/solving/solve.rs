use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::Solver;
use crate::ingest::Prepared;
use crate::ingest::key::WORD_LEN;
use crate::tiers::{LETTERS, Tiers};

const WORDS: usize = WORD_LEN;

/// Five pairwise disjoint keys covering 25 letters.
///
/// First-level choices are tier 0 keys, then tier 1 keys with tier 0's letter
/// skipped; workers claim them one at a time. Below the first level the
/// search walks the tiers in order and may skip one uncovered letter per
/// solution.
pub struct CliqueSolver {
    next: AtomicUsize,
    items: usize,
    first: usize,
    found: Mutex<Vec<[u32; WORDS]>>,
    pb: ProgressBar,
}

impl CliqueSolver {
    pub fn new(tiers: &Tiers, progress: bool) -> Self {
        let first = tiers.frq[0].len;
        let items = first + tiers.frq[1].len;
        let pb = if progress {
            let pb = ProgressBar::new(items as u64);
            if let Ok(style) =
                ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} first words {msg}")
            {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };
        Self {
            next: AtomicUsize::new(0),
            items,
            first,
            found: Mutex::new(Vec::new()),
            pb,
        }
    }

    pub fn items(&self) -> usize {
        self.items
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    /// Solutions found so far, in discovery order.
    pub fn solutions(&self) -> Vec<[u32; WORDS]> {
        self.found
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Solver for CliqueSolver {
    fn solve_work(&self, _worker: usize, prepared: &Prepared) {
        let tiers = &prepared.tiers;
        let mut chosen = [0u32; WORDS];
        let mut local = Vec::new();

        loop {
            let item = self.next.fetch_add(1, Ordering::Relaxed);
            if item >= self.items {
                break;
            }
            let (key, from, skipped) = if item < self.first {
                (tiers.tier(0)[item], 1, false)
            } else {
                (tiers.tier(1)[item - self.first], 2, true)
            };
            chosen[0] = key;
            search(tiers, key, 1, from, skipped, &mut chosen, &mut local);
            self.pb.inc(1);
        }

        if local.is_empty() {
            return;
        }
        let total = {
            let mut found = self.found.lock().unwrap_or_else(PoisonError::into_inner);
            found.extend_from_slice(&local);
            found.len()
        };
        self.pb.set_message(format!("{total} found"));
    }
}

/// Extends `chosen[..depth]` (letters `used`) from tier `from` onward.
fn search(
    tiers: &Tiers,
    used: u32,
    depth: usize,
    from: usize,
    skipped: bool,
    chosen: &mut [u32; WORDS],
    out: &mut Vec<[u32; WORDS]>,
) {
    if depth == WORDS {
        out.push(*chosen);
        return;
    }

    // first letter in tier order that no chosen word covers yet
    let Some(i) = (from..LETTERS).find(|&i| used & tiers.frq[i].mask == 0) else {
        return;
    };

    for &key in tiers.candidates(i, used) {
        if key & used == 0 {
            chosen[depth] = key;
            search(tiers, used | key, depth + 1, i + 1, skipped, chosen, out);
        }
    }

    if !skipped {
        search(tiers, used, depth, i + 1, true, chosen, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::key::calc_key;
    use crate::table::KeyTable;
    use crate::tiers::freq::frq_init;
    use crate::tiers::setup_frequency_sets;

    fn prepared(words: &[&[u8; 5]]) -> Prepared {
        let mut table = KeyTable::with_capacity(101);
        let mut keys = Vec::new();
        let mut text = Vec::new();
        let mut frq = frq_init();
        for (pos, w) in words.iter().enumerate() {
            let key = calc_key(w);
            text.extend_from_slice(&w[..]);
            if table.insert(key, pos as u32) != 0 {
                keys.push(key);
            }
            for &c in w.iter() {
                frq[(c - b'a') as usize].count += 1;
            }
        }
        Prepared {
            words: text,
            table,
            tiers: setup_frequency_sets(keys, frq, 8),
        }
    }

    fn run(p: &Prepared) -> Vec<[u32; WORDS]> {
        let solver = CliqueSolver::new(&p.tiers, false);
        solver.solve_work(0, p);
        solver.finish();
        solver.solutions()
    }

    #[test]
    fn finds_the_classic_quintuple() {
        let p = prepared(&[b"fjord", b"gucks", b"nymph", b"vibex", b"waltz", b"tacos", b"brief"]);
        let sols = run(&p);
        assert_eq!(sols.len(), 1);
        let mut got = sols[0];
        got.sort_unstable();
        let mut want = [b"fjord", b"gucks", b"nymph", b"vibex", b"waltz"].map(calc_key);
        want.sort_unstable();
        assert_eq!(got, want);
        let union = got.iter().fold(0, |a, &k| a | k);
        assert_eq!(union.count_ones(), 25);
    }

    #[test]
    fn four_words_are_not_enough() {
        let p = prepared(&[b"fjord", b"gucks", b"nymph", b"vibex"]);
        assert!(run(&p).is_empty());
    }

    #[test]
    fn anagrams_collapse_to_one_solution() {
        let p = prepared(&[b"fjord", b"gucks", b"nymph", b"vibex", b"waltz", b"waltz"]);
        assert_eq!(run(&p).len(), 1);
    }

    #[test]
    fn items_cover_the_first_two_tiers() {
        let p = prepared(&[b"fjord", b"gucks", b"nymph", b"vibex", b"waltz"]);
        let solver = CliqueSolver::new(&p.tiers, false);
        assert_eq!(solver.items(), p.tiers.frq[0].len + p.tiers.frq[1].len);
    }
}

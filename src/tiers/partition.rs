use super::freq::{rescan_frequencies, sort_rarest_first};
use super::{Frequency, LETTERS, Tiers};
use crate::ingest::key::POISON;

/// Tier position at which the remaining letters are recounted.
pub const RESCAN_AT: usize = 7;

/// Subtracted from the last non-empty tier position for the depth hint.
pub const SEARCH_DEPTH_OFFSET: i32 = 3;

/// Moves every element matching `pred` to the front by swapping.
/// Returns how many matched. Not stable.
#[inline]
pub fn partition_front(keys: &mut [u32], pred: impl Fn(u32) -> bool) -> usize {
    let mut kp = 0;
    for ks in 0..keys.len() {
        if pred(keys[ks]) {
            keys.swap(ks, kp);
            kp += 1;
        }
    }
    kp
}

/// Picks the two letters, other than the tier's own, that occur most often
/// in `tier`. Strictly greater wins, so ties go to the lower letter.
pub fn set_tms(f: &mut Frequency, tier: &[u32]) {
    let mut counts = [0u32; LETTERS];
    for &key in tier {
        let mut k = key;
        while k != 0 {
            let i = k.trailing_zeros() as usize;
            counts[i] += 1;
            k ^= 1u32 << i;
        }
    }
    counts[f.mask.trailing_zeros() as usize] = 0;

    let (mut cf1, mut cf2) = (0u32, 0u32);
    f.tm1 = 0;
    f.tm2 = 0;
    for (i, &cf) in counts.iter().enumerate() {
        if cf > cf1 {
            cf2 = cf1;
            f.tm2 = f.tm1;
            cf1 = cf;
            f.tm1 = 1 << i;
        } else if cf > cf2 {
            cf2 = cf;
            f.tm2 = 1 << i;
        }
    }
}

/// Splits a tier on `tm1`, then each half on `tm2`, setting the offsets.
fn split_tier(f: &mut Frequency, tier: &mut [u32]) {
    let (tm1, tm2) = (f.tm1, f.tm2);

    // tm1 first
    f.toff2 = partition_front(tier, |k| k & tm1 != 0);

    // inside tm1: tm2 then not
    f.toff1 = partition_front(&mut tier[..f.toff2], |k| k & tm2 != 0);

    // outside tm1: not tm2 then tm2
    f.toff3 = f.toff2 + partition_front(&mut tier[f.toff2..], |k| k & tm2 == 0);
}

/// Reorders the deduplicated `keys` into 26 tiers, rarest letter first.
///
/// Each tier takes every remaining key containing its letter and is followed
/// by `num_poison` sentinels. After the first `RESCAN_AT` tiers the remaining
/// letters are recounted over the keys that are still unassigned and sorted
/// rarest first again, not most common first: tiers stay ascending
/// throughout, and solvers must not expect a descending tail.
pub fn setup_frequency_sets(
    mut keys: Vec<u32>,
    mut frq: [Frequency; LETTERS],
    num_poison: usize,
) -> Tiers {
    let nkeys = keys.len();
    debug_assert!(keys.iter().all(|&k| k != 0 && k != POISON));
    keys.resize(nkeys + LETTERS * num_poison, 0);

    sort_rarest_first(&mut frq);

    // keys[kp..end] is still unassigned
    let mut kp = 0usize;
    let mut end = nkeys;
    let mut min_search_depth = 0i32;

    for i in 0..LETTERS {
        if i == RESCAN_AT {
            rescan_frequencies(&mut frq[i..], &keys[kp..end]);
        }

        let mask = frq[i].mask;
        let moved = partition_front(&mut keys[kp..end], |k| k & mask != 0);
        frq[i].start = kp;
        frq[i].len = moved;
        kp += moved;

        if moved > 0 {
            min_search_depth = i as i32 - SEARCH_DEPTH_OFFSET;
        }

        // shift the first unassigned key to the back, sentinel in its place
        for _ in 0..num_poison {
            debug_assert!(end < keys.len());
            keys[end] = keys[kp];
            keys[kp] = POISON;
            kp += 1;
            end += 1;
        }

        let (start, len) = (frq[i].start, frq[i].len);
        set_tms(&mut frq[i], &keys[start..start + len]);
    }
    debug_assert_eq!(kp, end, "keys left without a tier");

    for f in frq.iter_mut() {
        let (start, len) = (f.start, f.len);
        split_tier(f, &mut keys[start..start + len]);
    }

    Tiers {
        frq,
        keys,
        nkeys,
        num_poison,
        min_search_depth,
    }
}

use std::sync::atomic::{AtomicU8, AtomicU32, AtomicUsize, Ordering};

use super::key::WORD_LEN;

/// Append-only word text and key slots shared by all readers.
///
/// Positions come from one atomic counter, so every slot has exactly one
/// writer. A key slot stays 0 until its word text is in place; the consumer
/// spins on that.
pub struct WordStore {
    text: Box<[AtomicU8]>,
    keys: Box<[AtomicU32]>,
    claimed: AtomicUsize,
}

impl WordStore {
    pub fn with_capacity(words: usize) -> Self {
        Self {
            text: (0..words * WORD_LEN).map(|_| AtomicU8::new(0)).collect(),
            keys: (0..words).map(|_| AtomicU32::new(0)).collect(),
            claimed: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// Claims the next position and fills it. Returns false (word dropped)
    /// once the store is full.
    #[inline]
    pub fn push(&self, word: &[u8; WORD_LEN], key: u32) -> bool {
        let pos = self.claimed.fetch_add(1, Ordering::Relaxed);
        if pos >= self.capacity() {
            return false;
        }
        let base = pos * WORD_LEN;
        for (slot, &c) in self.text[base..base + WORD_LEN].iter().zip(word) {
            slot.store(c, Ordering::Relaxed);
        }
        self.keys[pos].store(key, Ordering::Release);
        true
    }

    /// Positions handed out so far that fit in the store.
    #[inline]
    pub fn produced(&self) -> usize {
        self.claimed.load(Ordering::Acquire).min(self.capacity())
    }

    /// Positions handed out, including dropped ones.
    #[inline]
    pub fn claimed(&self) -> usize {
        self.claimed.load(Ordering::Acquire)
    }

    /// Key at `pos`, 0 while its reader is still writing.
    #[inline]
    pub fn key(&self, pos: usize) -> u32 {
        self.keys[pos].load(Ordering::Acquire)
    }

    /// Copies the first `n` words into a plain byte arena (offset = pos * 5).
    /// Only meaningful after every reader is done.
    pub fn freeze(&self, n: usize) -> Vec<u8> {
        debug_assert!(n <= self.capacity());
        self.text[..n * WORD_LEN]
            .iter()
            .map(|c| c.load(Ordering::Acquire))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_fills_slots_in_claim_order() {
        let store = WordStore::with_capacity(4);
        assert_eq!(store.key(0), 0);
        assert!(store.push(b"tacos", 7));
        assert!(store.push(b"brief", 9));
        assert_eq!(store.produced(), 2);
        assert_eq!(store.key(1), 9);
        assert_eq!(store.freeze(2), b"tacosbrief".to_vec());
    }

    #[test]
    fn full_store_drops_words() {
        let store = WordStore::with_capacity(1);
        assert!(store.push(b"tacos", 7));
        assert!(!store.push(b"brief", 9));
        assert_eq!(store.claimed(), 2);
        assert_eq!(store.produced(), 1);
    }
}

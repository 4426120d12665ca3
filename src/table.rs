use crate::ingest::key::WORD_LEN;

/// Default table size. Prime, tuned for a few thousand unique keys.
pub const HASH_SIZE: usize = 30383;

/// Open addressing, linear probing, key -> byte offset of the word.
///
/// Keys and offsets live in separate arrays: clearing only touches the key
/// array, and probing only touches keys. A key of 0 marks an empty slot.
#[derive(Debug, Clone)]
pub struct KeyTable {
    keys: Box<[u32]>,
    offsets: Box<[u32]>,
    len: usize,
    collisions: u64,
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyTable {
    pub fn new() -> Self {
        Self::with_capacity(HASH_SIZE)
    }

    pub fn with_capacity(cap: usize) -> Self {
        assert!(cap > 0, "hash table needs at least one slot");
        Self {
            keys: vec![0u32; cap].into_boxed_slice(),
            offsets: vec![0u32; cap].into_boxed_slice(),
            len: 0,
            collisions: 0,
        }
    }

    /// Rebuilds a table from its raw arrays (snapshot loading).
    pub fn from_parts(keys: Vec<u32>, offsets: Vec<u32>) -> Option<Self> {
        if keys.is_empty() || keys.len() != offsets.len() {
            return None;
        }
        let len = keys.iter().filter(|&&k| k != 0).count();
        Some(Self {
            keys: keys.into_boxed_slice(),
            offsets: offsets.into_boxed_slice(),
            len,
            collisions: 0,
        })
    }

    #[inline(always)]
    fn home(&self, key: u32) -> usize {
        key as usize % self.keys.len()
    }

    /// Stores `pos * 5` under `key`. Returns the key, or 0 when the key is
    /// already present or every slot was probed. State is untouched on 0.
    pub fn insert(&mut self, key: u32, pos: u32) -> u32 {
        debug_assert!(key != 0);
        let cap = self.keys.len();
        let mut slot = self.home(key);
        let mut col = 0usize;
        loop {
            match self.keys[slot] {
                0 => break,
                k if k == key => return 0,
                _ => {}
            }
            col += 1;
            if col == cap {
                return 0;
            }
            slot += 1;
            if slot == cap {
                slot = 0;
            }
        }
        self.keys[slot] = key;
        self.offsets[slot] = pos * WORD_LEN as u32;
        self.len += 1;
        self.collisions += col as u64;
        key
    }

    /// Byte offset of the word stored under `key`.
    pub fn lookup(&self, key: u32) -> Option<usize> {
        let cap = self.keys.len();
        let mut slot = self.home(key);
        for _ in 0..cap {
            match self.keys[slot] {
                k if k == key => return Some(self.offsets[slot] as usize),
                0 => return None,
                _ => {}
            }
            slot += 1;
            if slot == cap {
                slot = 0;
            }
        }
        None
    }

    /// Word text for `key` out of a word arena.
    pub fn word<'a>(&self, key: u32, words: &'a [u8]) -> Option<&'a [u8]> {
        let off = self.lookup(key)?;
        words.get(off..off + WORD_LEN)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    pub fn is_full(&self) -> bool {
        self.len == self.keys.len()
    }

    /// Extra probes taken by inserts.
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    pub fn raw_keys(&self) -> &[u32] {
        &self.keys
    }

    pub fn raw_offsets(&self) -> &[u32] {
        &self.offsets
    }
}

use crate::ingest::scan::ScanImpl;
use crate::table::HASH_SIZE;

/// Virtual machines don't like too many readers.
pub const MAX_READERS: usize = 15;

/// Expected unique words. The word store holds three times this.
pub const MAX_WORDS: usize = 8192;

/// Read chunk sizes. The vector scanner has more setup per chunk.
pub const READ_CHUNK_SIMD: usize = 32768;
pub const READ_CHUNK_SCALAR: usize = 10240;

/// Sentinels after each tier; one 256-bit load of keys.
pub const NUM_POISON: usize = 8;

#[derive(Debug, Clone)]
pub struct Config {
    pub hash_size: usize,
    pub max_readers: usize,
    pub max_words: usize,
    /// `None` picks by scanner.
    pub read_chunk: Option<usize>,
    pub num_poison: usize,
    /// `None` asks the runtime.
    pub threads: Option<usize>,
    pub scanner: ScanImpl,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash_size: HASH_SIZE,
            max_readers: MAX_READERS,
            max_words: MAX_WORDS,
            read_chunk: None,
            num_poison: NUM_POISON,
            threads: None,
            scanner: ScanImpl::detect(),
        }
    }
}

fn env_usize(var: &str) -> Option<usize> {
    let raw = std::env::var(var).ok()?;
    if raw.trim().is_empty() {
        return None;
    }
    raw.trim().parse::<usize>().ok().filter(|&v| v > 0)
}

fn env_flag(var: &str) -> bool {
    matches!(
        std::env::var(var).as_deref().map(str::trim),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

impl Config {
    /// Defaults overridden by `WORDKEYS_*` variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_usize("WORDKEYS_HASH_SIZE") {
            cfg.hash_size = v;
        }
        if let Some(v) = env_usize("WORDKEYS_MAX_READERS") {
            cfg.max_readers = v;
        }
        if let Some(v) = env_usize("WORDKEYS_MAX_WORDS") {
            cfg.max_words = v;
        }
        cfg.read_chunk = env_usize("WORDKEYS_READ_CHUNK");
        // zero is a valid poison count
        if let Some(v) = std::env::var("WORDKEYS_POISON")
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            cfg.num_poison = v;
        }
        if env_flag("WORDKEYS_SCALAR") {
            cfg.scanner = ScanImpl::Scalar;
        }
        cfg
    }

    pub fn chunk(&self) -> usize {
        self.read_chunk
            .unwrap_or(match self.scanner {
                ScanImpl::Scalar => READ_CHUNK_SCALAR,
                #[cfg(target_arch = "x86_64")]
                ScanImpl::Avx2 => READ_CHUNK_SIMD,
            })
            .max(1)
    }

    /// Word store slots.
    pub fn store_capacity(&self) -> usize {
        self.max_words * 3
    }

    pub fn verbose() -> bool {
        env_flag("WORDKEYS_VERBOSE")
    }
}

use anyhow::{Context, Result, bail};
use memmap2::Mmap;
use std::fs::File;
use std::mem;
use std::ops::Deref;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;

pub mod key;
pub mod pool;
pub mod reader;
pub mod scan;
pub mod store;

use crate::config::Config;
use crate::runtime;
use crate::solving::Solver;
use crate::table::KeyTable;
use crate::tiers::freq::{self, ReaderCounts};
use crate::tiers::{Frequency, LETTERS, Tiers, setup_frequency_sets};
use crate::wait::{Gate, Spin};
use pool::{Plan, join_all, spawn_worker};
use scan::ScanImpl;
use store::WordStore;

// -------------------------------------------------------------------------------------
// Input buffer
// -------------------------------------------------------------------------------------

/// The word list, mapped from disk or held in memory.
pub enum Input {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Input {
    pub fn map(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        if len == 0 {
            return Ok(Input::Owned(Vec::new()));
        }
        // SAFETY: private read-only mapping of a file nobody writes during the run
        let map = unsafe { Mmap::map(&file) }.with_context(|| format!("mmap {}", path.display()))?;
        Ok(Input::Mapped(map))
    }
}

impl Deref for Input {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Input::Mapped(m) => m,
            Input::Owned(v) => v,
        }
    }
}

// -------------------------------------------------------------------------------------
// State shared with worker threads
// -------------------------------------------------------------------------------------

/// Solver run handed to the workers when the gate opens.
pub(crate) struct Job {
    pub(crate) prepared: Arc<Prepared>,
    pub(crate) solver: Arc<dyn Solver>,
}

pub(crate) struct Shared {
    pub(crate) input: Input,
    pub(crate) scanner: ScanImpl,
    pub(crate) chunk: usize,
    pub(crate) file_pos: AtomicUsize,
    pub(crate) readers_done: AtomicUsize,
    pub(crate) store: WordStore,
    pub(crate) counts: ReaderCounts,
    pub(crate) gate: Gate,
    pub(crate) job: OnceLock<Job>,
    pub(crate) spawned: Mutex<Vec<JoinHandle<()>>>,
}

/// Everything the solver reads. Immutable once built.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Word text, offset = position * 5.
    pub words: Vec<u8>,
    pub table: KeyTable,
    pub tiers: Tiers,
}

impl Prepared {
    /// First word seen with this key.
    pub fn word(&self, key: u32) -> Option<&[u8]> {
        self.table.word(key, &self.words)
    }
}

// -------------------------------------------------------------------------------------
// Pipeline
// -------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Readers may still be producing.
    Reading,
    /// Hash table and deduplicated keys are complete.
    Built,
    /// Keys are tiered.
    Tiered,
    /// Workers were released into the solver.
    Released,
}

/// One ingestion run, from mapping the file to releasing the solvers.
///
/// Entry points must be called in order: [`Pipeline::start`],
/// [`Pipeline::process_words`], [`Pipeline::setup_frequency_sets`],
/// [`Pipeline::start_solvers`]. Dropping the pipeline earlier sends the
/// workers home without solving.
pub struct Pipeline {
    shared: Arc<Shared>,
    plan: Plan,
    handles: Vec<JoinHandle<()>>,
    stage: Stage,
    hash_size: usize,
    table: Option<KeyTable>,
    keys: Vec<u32>,
    words: Vec<u8>,
    frq: [Frequency; LETTERS],
    tiers: Option<Tiers>,
}

impl Pipeline {
    /// Maps `path` and starts the readers.
    pub fn start(path: impl AsRef<Path>, cfg: &Config) -> Result<Self> {
        let input = Input::map(path.as_ref())?;
        Self::spawn_readers(input, cfg)
    }

    /// Same as [`Pipeline::start`] over an in-memory buffer.
    pub fn from_bytes(bytes: Vec<u8>, cfg: &Config) -> Result<Self> {
        Self::spawn_readers(Input::Owned(bytes), cfg)
    }

    fn spawn_readers(input: Input, cfg: &Config) -> Result<Self> {
        let chunk = cfg.chunk();
        let nthreads = cfg.threads.unwrap_or_else(runtime::worker_threads);
        let plan = Plan::new(input.len(), chunk, cfg.max_readers, nthreads);

        eprintln!(
            "[read] bytes={} readers={} threads={} chunk={} scanner={}",
            input.len(),
            plan.num_readers,
            plan.nthreads,
            chunk,
            cfg.scanner.name()
        );

        let shared = Arc::new(Shared {
            input,
            scanner: cfg.scanner,
            chunk,
            file_pos: AtomicUsize::new(0),
            readers_done: AtomicUsize::new(0),
            store: WordStore::with_capacity(cfg.store_capacity()),
            counts: freq::reader_counts(plan.num_readers),
            gate: Gate::default(),
            job: OnceLock::new(),
            spawned: Mutex::new(Vec::new()),
        });

        let mut pipeline = Pipeline {
            shared,
            plan,
            handles: Vec::new(),
            stage: Stage::Reading,
            hash_size: cfg.hash_size,
            table: None,
            keys: Vec::new(),
            words: Vec::new(),
            frq: freq::frq_init(),
            tiers: None,
        };

        // reader slot 0 belongs to the caller and is finished if it won't read
        if !plan.main_reads {
            pipeline.shared.readers_done.fetch_add(1, Ordering::Release);
        }

        for (worker, role) in plan.eager() {
            let h = spawn_worker(&pipeline.shared, worker, role)
                .with_context(|| format!("spawn worker {worker}"))?;
            pipeline.handles.push(h);
        }

        Ok(pipeline)
    }

    /// Reads on this thread if the plan says so, then drains new keys into
    /// the hash table until every reader is done. Returns the spin count.
    pub fn process_words(&mut self) -> Result<u64> {
        if self.stage != Stage::Reading {
            bail!("process_words called at stage {:?}", self.stage);
        }
        let shared = Arc::clone(&self.shared);

        if self.plan.main_reads {
            reader::file_reader(&shared, 0);
        }

        let mut table = KeyTable::with_capacity(self.hash_size);
        let mut keys: Vec<u32> = Vec::with_capacity(self.hash_size.min(shared.store.capacity()));
        let mut spin = Spin::new();
        let mut pos = 0usize;

        loop {
            if pos >= shared.store.produced() {
                if shared.readers_done.load(Ordering::Acquire) < self.plan.num_readers {
                    spin.pause();
                    continue;
                }
                // a word may have landed between the two checks
                if pos >= shared.store.produced() {
                    break;
                }
            }

            let key = spin.until(|| match shared.store.key(pos) {
                0 => None,
                k => Some(k),
            });

            if table.insert(key, pos as u32) != 0 {
                keys.push(key);
            }
            pos += 1;
        }

        if table.is_full() {
            eprintln!(
                "[warn] hash table full ({} slots); later unique words were dropped",
                table.capacity()
            );
        }
        let claimed = shared.store.claimed();
        if claimed > pos {
            eprintln!(
                "[warn] word store full; {} words dropped",
                claimed - pos
            );
        }

        self.words = shared.store.freeze(pos);
        self.frq = freq::merge(&shared.counts);
        self.keys = keys;
        self.table = Some(table);
        self.stage = Stage::Built;
        Ok(spin.spins())
    }

    /// Tiers the deduplicated keys, `num_poison` sentinels after each tier.
    pub fn setup_frequency_sets(&mut self, num_poison: usize) -> Result<&Tiers> {
        if self.stage != Stage::Built {
            bail!("setup_frequency_sets called at stage {:?}", self.stage);
        }
        let keys = mem::take(&mut self.keys);
        let tiers = setup_frequency_sets(keys, self.frq, num_poison);
        self.stage = Stage::Tiered;
        Ok(self.tiers.insert(tiers))
    }

    /// Opens the gate for every worker, runs worker 0's share here, and
    /// returns once all workers have finished.
    pub fn start_solvers(mut self, solver: Arc<dyn Solver>) -> Result<Arc<Prepared>> {
        if self.stage != Stage::Tiered {
            bail!("start_solvers called at stage {:?}", self.stage);
        }
        let (Some(table), Some(tiers)) = (self.table.take(), self.tiers.take()) else {
            bail!("pipeline lost its tables before solving");
        };
        let prepared = Arc::new(Prepared {
            words: mem::take(&mut self.words),
            table,
            tiers,
        });

        if self
            .shared
            .job
            .set(Job {
                prepared: Arc::clone(&prepared),
                solver: Arc::clone(&solver),
            })
            .is_err()
        {
            bail!("solver job already published");
        }
        self.shared.gate.open();
        self.stage = Stage::Released;

        solver.solve_work(0, &prepared);
        join_all(&self.shared, &mut self.handles);
        Ok(prepared)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    pub fn table(&self) -> Option<&KeyTable> {
        self.table.as_ref()
    }

    /// Deduplicated keys in discovery order (until tiered).
    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    pub fn words(&self) -> &[u8] {
        &self.words
    }

    /// Merged letter counts, indexed by letter.
    pub fn frequencies(&self) -> &[Frequency; LETTERS] {
        &self.frq
    }

    pub fn tiers(&self) -> Option<&Tiers> {
        self.tiers.as_ref()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shared.gate.abandon();
        join_all(&self.shared, &mut self.handles);
    }
}

pub mod io;
pub mod solve;
pub mod types;

pub use io::*;
pub use solve::CliqueSolver;
pub use types::{RECORD_LEN, format_record, records};

use crate::ingest::Prepared;

/// Work a released worker runs. Every worker calls `solve_work` once with
/// its own index; worker 0 is the thread that opened the gate.
pub trait Solver: Send + Sync {
    fn solve_work(&self, worker: usize, prepared: &Prepared);
}

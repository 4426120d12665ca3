//! Worker threads.
//!
//! Each worker is created once and serves both reading and solving.
//! Bootstrap runs in two steps: the caller creates the readers and one
//! spawner (phase 1), and the spawner creates the remaining solver-only
//! workers (phase 2). Every worker then waits at the start gate and runs the
//! solver with its own index.

use std::io;
use std::sync::{Arc, PoisonError};
use std::thread::{self, JoinHandle};

use super::Shared;
use super::reader::file_reader;
use crate::wait::GateState;

/// What a worker does before it waits at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Reader,
    /// Creates workers `index + 1..upto` as solvers.
    Spawner { upto: usize },
    Solver,
}

/// Thread layout for one run. Worker 0 is the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub nthreads: usize,
    pub num_readers: usize,
    /// The caller reads chunks itself before draining.
    pub main_reads: bool,
}

impl Plan {
    pub fn new(len: usize, chunk: usize, max_readers: usize, nthreads: usize) -> Self {
        let nthreads = nthreads.max(1);
        let num_readers = (len / (chunk.max(1) << 3))
            .min(max_readers)
            .min(nthreads)
            .max(1);
        Self {
            nthreads,
            num_readers,
            main_reads: num_readers <= 3,
        }
    }

    /// Phase 1 threads, by worker index.
    pub fn eager(&self) -> Vec<(usize, Role)> {
        let mut out: Vec<(usize, Role)> = (1..self.num_readers).map(|i| (i, Role::Reader)).collect();
        if self.num_readers < self.nthreads {
            out.push((
                self.num_readers,
                Role::Spawner {
                    upto: self.nthreads,
                },
            ));
        }
        out
    }
}

pub(crate) fn spawn_worker(
    shared: &Arc<Shared>,
    worker: usize,
    role: Role,
) -> io::Result<JoinHandle<()>> {
    let shared = Arc::clone(shared);
    thread::Builder::new()
        .name(format!("wordkeys-worker-{worker}"))
        .spawn(move || work_pool(shared, worker, role))
}

fn work_pool(shared: Arc<Shared>, worker: usize, role: Role) {
    match role {
        Role::Reader => file_reader(&shared, worker),
        Role::Spawner { upto } => {
            let mut handles = Vec::with_capacity(upto.saturating_sub(worker + 1));
            for i in worker + 1..upto {
                match spawn_worker(&shared, i, Role::Solver) {
                    Ok(h) => handles.push(h),
                    Err(err) => {
                        eprintln!("[threads] warn: worker {i} not started ({err})");
                        break;
                    }
                }
            }
            shared
                .spawned
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(handles);
        }
        Role::Solver => {}
    }

    if shared.gate.wait() == GateState::Solve {
        if let Some(job) = shared.job.get() {
            job.solver.solve_work(worker, &job.prepared);
        }
    }
}

/// Joins phase 1 threads, then whatever the spawner created.
/// The gate must have left `Closed` already.
pub(crate) fn join_all(shared: &Shared, eager: &mut Vec<JoinHandle<()>>) {
    for h in eager.drain(..) {
        if h.join().is_err() {
            eprintln!("[threads] warn: a worker panicked");
        }
    }
    let spawned: Vec<JoinHandle<()>> = shared
        .spawned
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .drain(..)
        .collect();
    for h in spawned {
        if h.join().is_err() {
            eprintln!("[threads] warn: a worker panicked");
        }
    }
}

use std::sync::OnceLock;

/// Not much to gain past this many threads.
pub const MAX_THREADS: usize = 20;

#[derive(Debug, Clone)]
pub struct ThreadConfig {
    pub count: usize,
    pub source: String,
}

/// First positive hint among `keys`, capped at [`MAX_THREADS`].
fn parse_env_threads(
    keys: &[&str],
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<ThreadConfig> {
    for &key in keys {
        if let Some(v) = lookup(key) {
            if let Ok(val) = v.trim().parse::<usize>() {
                if val > 0 {
                    let count = val.min(MAX_THREADS);
                    let source = if count < val {
                        format!("{key}={val}, capped")
                    } else {
                        key.to_string()
                    };
                    return Some(ThreadConfig { count, source });
                }
            }
        }
    }
    None
}

/// CPUs currently online.
pub fn online_cpus() -> usize {
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if n > 0 {
        return n as usize;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Worker threads for `ncpus` CPUs.
pub fn thread_policy(ncpus: usize) -> usize {
    match ncpus {
        0 | 1 => 1,
        2..=4 => ncpus,
        5..=8 => ncpus - 1,
        _ => (ncpus - 2).min(MAX_THREADS),
    }
}

fn detect_thread_config() -> ThreadConfig {
    const ENV_HINTS: [&str; 5] = [
        "WORDKEYS_THREADS",
        "SLURM_CPUS_PER_TASK",
        "SLURM_CPUS_ON_NODE",
        "PBS_NP",
        "OMP_NUM_THREADS",
    ];

    if let Some(cfg) = parse_env_threads(&ENV_HINTS, |k| std::env::var(k).ok()) {
        return cfg;
    }

    let cpus = online_cpus();
    ThreadConfig {
        count: thread_policy(cpus),
        source: format!("{cpus} cpus online"),
    }
}

/// Detected once per process.
pub fn worker_threads() -> usize {
    static CFG: OnceLock<ThreadConfig> = OnceLock::new();
    CFG.get_or_init(|| {
        let cfg = detect_thread_config();
        eprintln!("[threads] workers = {} (hint: {})", cfg.count, cfg.source);
        cfg
    })
    .count
}

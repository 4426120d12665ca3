use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use wordkeys::solving::{self, CliqueSolver};
use wordkeys::tiers::debug_summary;
use wordkeys::{Config, Pipeline};

struct Args {
    input: PathBuf,
    output: PathBuf,
    snapshot: Option<PathBuf>,
}

fn usage() -> ! {
    eprintln!("usage: wordkeys <words.txt> [solutions.txt]");
    std::process::exit(1);
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let first = args.next().unwrap_or_else(|| usage());
    if first == "-h" || first == "--help" {
        usage();
    }

    let input = PathBuf::from(first);
    if !input.exists() {
        bail!("input {:?} does not exist", input);
    }

    let output = if let Some(explicit) = args.next() {
        PathBuf::from(explicit)
    } else if let Ok(from_env) = env::var("WORDKEYS_OUT") {
        PathBuf::from(from_env)
    } else {
        PathBuf::from("solutions.txt")
    };

    let snapshot = env::var("WORDKEYS_SNAPSHOT")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    Ok(Args {
        input,
        output,
        snapshot,
    })
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let cfg = Config::from_env();
    let verbose = Config::verbose();

    let t0 = Instant::now();
    let mut pipeline = Pipeline::start(&args.input, &cfg)?;
    let t_start = t0.elapsed();

    let spins = pipeline.process_words()?;
    let t_read = t0.elapsed();
    if let Some(table) = pipeline.table() {
        eprintln!(
            "[hash] unique={} collisions={} words={} spins={}",
            table.len(),
            table.collisions(),
            pipeline.words().len() / 5,
            spins
        );
    }

    let tiers = pipeline.setup_frequency_sets(cfg.num_poison)?;
    eprintln!(
        "[tiers] keys={} min_search_depth={}",
        tiers.nkeys, tiers.min_search_depth
    );
    if verbose {
        debug_summary(tiers);
    }
    let solver = Arc::new(CliqueSolver::new(tiers, true));
    let t_tiers = t0.elapsed();

    let prepared = pipeline.start_solvers(solver.clone())?;
    solver.finish();
    let t_solve = t0.elapsed();

    if let Some(path) = &args.snapshot {
        match solving::save_snapshot(path, &prepared) {
            Ok(()) => eprintln!("[solve] prepared snapshot cached at {}", path.display()),
            Err(err) => eprintln!("[warn] snapshot not saved: {err:#}"),
        }
    }

    let solutions = solver.solutions();
    eprintln!("[solve] {} solutions", solutions.len());
    let records = solving::records(&prepared, &solutions);
    if let Err(err) = solving::emit_solutions(&args.output, &records) {
        eprintln!("[warn] {err:#}");
    }

    eprintln!(
        "[time] start={:?} read={:?} tiers={:?} solve={:?} total={:?}",
        t_start,
        t_read - t_start,
        t_tiers - t_read,
        t_solve - t_tiers,
        t0.elapsed()
    );
    Ok(())
}

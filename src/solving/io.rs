use anyhow::{Context, Result, bail};
use ndarray::Array1;
use ndarray_npy::{NpzReader, NpzWriter, ReadableElement, WritableElement};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, Write};
use std::path::Path;

use crate::ingest::Prepared;
use crate::table::KeyTable;
use crate::tiers::{Frequency, LETTERS, Tiers};

/// Writes all of `buf`, retrying short writes and `Interrupted`.
pub fn write_all_retrying<W: Write>(w: &mut W, mut buf: &[u8]) -> std::io::Result<()> {
    while !buf.is_empty() {
        match w.write(buf) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    ErrorKind::WriteZero,
                    format!("{} bytes left unwritten", buf.len()),
                ));
            }
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Writes solution records to `path`. An existing longer file is cut to
/// the new length; failing to cut it is only a warning.
pub fn emit_solutions(path: &Path, records: &[u8]) -> Result<()> {
    let mut f = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;

    let old_len = f
        .metadata()
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    if old_len > records.len() as u64 {
        if let Err(err) = f.set_len(records.len() as u64) {
            eprintln!("[warn] could not truncate {}: {err}", path.display());
        }
    }

    write_all_retrying(&mut f, records).with_context(|| format!("write {}", path.display()))?;
    eprintln!(
        "[emit] {} records to {}",
        records.len() / super::RECORD_LEN,
        path.display()
    );
    Ok(())
}

// -------------------------------------------------------------------------------------
// Prepared snapshot (.npz)
// -------------------------------------------------------------------------------------

fn read_arr<T: ReadableElement + Clone, R: Read + Seek>(
    npz: &mut NpzReader<R>,
    name: &str,
) -> Result<Vec<T>> {
    let arr: Array1<T> = npz
        .by_name(name)
        .with_context(|| format!("missing {}", name))?;
    Ok(arr.to_vec())
}

fn add_arr<T: WritableElement + Clone, W: Write + Seek>(
    npz: &mut NpzWriter<W>,
    name: &str,
    data: Vec<T>,
) -> Result<()> {
    npz.add_array(name, &Array1::from_vec(data))
        .with_context(|| format!("write {}", name))?;
    Ok(())
}

fn tier_field<T>(frq: &[Frequency; LETTERS], f: impl Fn(&Frequency) -> T) -> Vec<T> {
    frq.iter().map(f).collect()
}

pub fn save_snapshot(path: &Path, p: &Prepared) -> Result<()> {
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut npz = NpzWriter::new(f);
    let t = &p.tiers;

    add_arr(
        &mut npz,
        "meta.npy",
        vec![t.nkeys as u64, t.num_poison as u64],
    )?;
    add_arr(&mut npz, "meta_min_search_depth.npy", vec![t.min_search_depth])?;
    add_arr(&mut npz, "keys.npy", t.keys.clone())?;

    add_arr(&mut npz, "tier_mask.npy", tier_field(&t.frq, |f| f.mask))?;
    add_arr(&mut npz, "tier_count.npy", tier_field(&t.frq, |f| f.count))?;
    add_arr(&mut npz, "tier_tm1.npy", tier_field(&t.frq, |f| f.tm1))?;
    add_arr(&mut npz, "tier_tm2.npy", tier_field(&t.frq, |f| f.tm2))?;
    add_arr(&mut npz, "tier_toff1.npy", tier_field(&t.frq, |f| f.toff1 as u64))?;
    add_arr(&mut npz, "tier_toff2.npy", tier_field(&t.frq, |f| f.toff2 as u64))?;
    add_arr(&mut npz, "tier_toff3.npy", tier_field(&t.frq, |f| f.toff3 as u64))?;
    add_arr(&mut npz, "tier_start.npy", tier_field(&t.frq, |f| f.start as u64))?;
    add_arr(&mut npz, "tier_len.npy", tier_field(&t.frq, |f| f.len as u64))?;

    add_arr(&mut npz, "table_keys.npy", p.table.raw_keys().to_vec())?;
    add_arr(&mut npz, "table_offsets.npy", p.table.raw_offsets().to_vec())?;
    add_arr(&mut npz, "words.npy", p.words.clone())?;

    npz.finish().context("finish npz")?;
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<Prepared> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut npz = NpzReader::new(f).context("read npz")?;

    let meta: Vec<u64> = read_arr(&mut npz, "meta.npy")?;
    let &[nkeys, num_poison] = meta.as_slice() else {
        bail!("meta.npy: expected 2 entries, got {}", meta.len());
    };
    let depth: Vec<i32> = read_arr(&mut npz, "meta_min_search_depth.npy")?;
    let Some(&min_search_depth) = depth.first() else {
        bail!("meta_min_search_depth.npy is empty");
    };
    let keys: Vec<u32> = read_arr(&mut npz, "keys.npy")?;

    let mask: Vec<u32> = read_arr(&mut npz, "tier_mask.npy")?;
    let count: Vec<u32> = read_arr(&mut npz, "tier_count.npy")?;
    let tm1: Vec<u32> = read_arr(&mut npz, "tier_tm1.npy")?;
    let tm2: Vec<u32> = read_arr(&mut npz, "tier_tm2.npy")?;
    let toff1: Vec<u64> = read_arr(&mut npz, "tier_toff1.npy")?;
    let toff2: Vec<u64> = read_arr(&mut npz, "tier_toff2.npy")?;
    let toff3: Vec<u64> = read_arr(&mut npz, "tier_toff3.npy")?;
    let start: Vec<u64> = read_arr(&mut npz, "tier_start.npy")?;
    let len: Vec<u64> = read_arr(&mut npz, "tier_len.npy")?;

    for (name, n) in [
        ("mask", mask.len()),
        ("count", count.len()),
        ("tm1", tm1.len()),
        ("tm2", tm2.len()),
        ("toff1", toff1.len()),
        ("toff2", toff2.len()),
        ("toff3", toff3.len()),
        ("start", start.len()),
        ("len", len.len()),
    ] {
        if n != LETTERS {
            bail!("tier_{name}.npy: expected {LETTERS} entries, got {n}");
        }
    }

    let mut frq = [Frequency::default(); LETTERS];
    for (i, f) in frq.iter_mut().enumerate() {
        *f = Frequency {
            mask: mask[i],
            count: count[i],
            tm1: tm1[i],
            tm2: tm2[i],
            toff1: toff1[i] as usize,
            toff2: toff2[i] as usize,
            toff3: toff3[i] as usize,
            start: start[i] as usize,
            len: len[i] as usize,
        };
        if f.start + f.len > keys.len() || f.toff3 > f.len {
            bail!("tier {i} out of range of keys.npy");
        }
    }

    let table_keys: Vec<u32> = read_arr(&mut npz, "table_keys.npy")?;
    let table_offsets: Vec<u32> = read_arr(&mut npz, "table_offsets.npy")?;
    let table = KeyTable::from_parts(table_keys, table_offsets)
        .context("table_keys.npy / table_offsets.npy do not form a table")?;
    let words: Vec<u8> = read_arr(&mut npz, "words.npy")?;

    Ok(Prepared {
        words,
        table,
        tiers: Tiers {
            frq,
            keys,
            nkeys: nkeys as usize,
            num_poison: num_poison as usize,
            min_search_depth,
        },
    })
}

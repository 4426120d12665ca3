#![allow(dead_code)]

use ahash::AHashSet;
use rand::Rng;
use rand::rngs::StdRng;

use wordkeys::Config;
use wordkeys::ingest::key::{calc_key, is_valid};
use wordkeys::ingest::scan::ScanImpl;

pub fn config(threads: usize, chunk: usize, scanner: ScanImpl) -> Config {
    Config {
        threads: Some(threads),
        read_chunk: Some(chunk),
        scanner,
        ..Config::default()
    }
}

/// Words a sequential line-by-line reading accepts, in file order.
pub fn expected_words(buf: &[u8]) -> Vec<[u8; 5]> {
    let mut out = Vec::new();
    for line in buf.split(|&c| c == b'\n') {
        if line.len() < 5 || !line[..5].iter().all(u8::is_ascii_lowercase) {
            continue;
        }
        if line.len() > 5 && line[5].is_ascii_lowercase() {
            continue;
        }
        let w = [line[0], line[1], line[2], line[3], line[4]];
        if is_valid(calc_key(&w)) {
            out.push(w);
        }
    }
    out
}

pub fn expected_keys(buf: &[u8]) -> AHashSet<u32> {
    expected_words(buf).iter().map(calc_key).collect()
}

/// A word list with valid words, repeats, anagrams and junk lines.
pub fn random_list(rng: &mut StdRng, lines: usize) -> Vec<u8> {
    const JUNK: &[u8] = b"ABZ09 ,.-'\t\xc3\xa9";
    let mut buf = Vec::new();
    for _ in 0..lines {
        let len = match rng.gen_range(0..10) {
            0 => rng.gen_range(0..5),
            1 => rng.gen_range(6..45),
            _ => 5,
        };
        for _ in 0..len {
            if rng.gen_range(0..30) == 0 {
                buf.push(JUNK[rng.gen_range(0..JUNK.len())]);
            } else {
                buf.push(b'a' + rng.gen_range(0..26u8));
            }
        }
        if rng.gen_range(0..15) == 0 {
            buf.extend_from_slice(b"\r");
        }
        buf.push(b'\n');
    }
    buf
}

mod common;

use ahash::AHashSet;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::Write;

use common::{config, expected_keys, expected_words, random_list};
use wordkeys::ingest::key::calc_key;
use wordkeys::ingest::scan::ScanImpl;
use wordkeys::{Config, Pipeline, Stage};

fn letter(c: u8) -> usize {
    (c - b'a') as usize
}

#[test]
fn tacos_and_brief() {
    let cfg = config(2, 64, ScanImpl::Scalar);
    let mut p = Pipeline::from_bytes(b"tacos\nbrief\nhello\ntacos\ncoats\n".to_vec(), &cfg).unwrap();
    p.process_words().unwrap();
    assert_eq!(p.stage(), Stage::Built);

    assert_eq!(p.keys(), &[calc_key(b"tacos"), calc_key(b"brief")]);
    // anagrams and repeats are stored, then deduplicated by key
    assert_eq!(p.words(), b"tacosbrieftacoscoats");
    let table = p.table().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.word(calc_key(b"coats"), p.words()), Some(&b"tacos"[..]));

    let frq = p.frequencies();
    assert_eq!(frq[letter(b't')].count, 3);
    assert_eq!(frq[letter(b'b')].count, 1);
    assert_eq!(frq[letter(b'h')].count, 0);

    let tiers = p.setup_frequency_sets(8).unwrap();
    assert_eq!(tiers.nkeys, 2);
    assert_eq!(tiers.poison_count(), 26 * 8);
    let mut got: Vec<u32> = tiers.real_keys().collect();
    got.sort_unstable();
    let mut want = vec![calc_key(b"tacos"), calc_key(b"brief")];
    want.sort_unstable();
    assert_eq!(got, want);
}

#[test]
fn two_words_count_each_letter_once() {
    let cfg = config(4, 16, ScanImpl::detect());
    let mut p = Pipeline::from_bytes(b"tacos\nbrief\n".to_vec(), &cfg).unwrap();
    p.process_words().unwrap();

    assert_eq!(p.keys().len(), 2);
    assert!(p.keys().iter().all(|k| k.count_ones() == 5));
    assert_eq!(p.table().unwrap().collisions(), 0);
    for (i, f) in p.frequencies().iter().enumerate() {
        let c = b'a' + i as u8;
        let want = u32::from(b"tacosbrief".contains(&c));
        assert_eq!(f.count, want, "letter {}", c as char);
    }
}

#[test]
fn many_readers_match_a_sequential_read() {
    let mut rng = StdRng::seed_from_u64(7);
    let buf = random_list(&mut rng, 4000);
    let want = expected_keys(&buf);
    let nwords = expected_words(&buf).len();

    for scanner in [ScanImpl::Scalar, ScanImpl::detect()] {
        for chunk in [64, 100, 333, 512] {
            let cfg = config(8, chunk, scanner);
            let mut p = Pipeline::from_bytes(buf.clone(), &cfg).unwrap();
            assert!(p.plan().num_readers > 3, "chunk {chunk} should spread reading");
            p.process_words().unwrap();

            assert_eq!(p.words().len(), nwords * 5, "chunk {chunk} {scanner:?}");
            let got: AHashSet<u32> = p.keys().iter().copied().collect();
            assert_eq!(got.len(), p.keys().len(), "duplicate key published");
            assert_eq!(got, want, "chunk {chunk} {scanner:?}");
        }
    }
}

#[test]
fn tiny_chunks_split_every_word() {
    let buf = b"tacos\nbrief\nxx\nwaltz\nzzzzz\nvibex\nfjordss\nnymph".to_vec();
    let want = expected_keys(&buf);
    assert_eq!(want.len(), 5);

    for chunk in 1..20 {
        for threads in [1, 4] {
            let cfg = config(threads, chunk, ScanImpl::Scalar);
            let mut p = Pipeline::from_bytes(buf.clone(), &cfg).unwrap();
            p.process_words().unwrap();
            let got: AHashSet<u32> = p.keys().iter().copied().collect();
            assert_eq!(got, want, "chunk {chunk} threads {threads}");
            assert_eq!(p.words().len(), 25, "chunk {chunk} threads {threads}");
        }
    }
}

#[test]
fn reads_a_mapped_file() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(b"fjord\ngucks\nnymph\nvibex\nwaltz\n").unwrap();
    f.flush().unwrap();

    let cfg = config(3, 4, ScanImpl::detect());
    let mut p = Pipeline::start(f.path(), &cfg).unwrap();
    p.process_words().unwrap();
    assert_eq!(p.keys().len(), 5);
    assert_eq!(p.table().unwrap().word(calc_key(b"nymph"), p.words()), Some(&b"nymph"[..]));
}

#[test]
fn empty_file_yields_nothing() {
    let f = tempfile::NamedTempFile::new().unwrap();
    let cfg = config(4, 16, ScanImpl::Scalar);
    let mut p = Pipeline::start(f.path(), &cfg).unwrap();
    p.process_words().unwrap();
    assert!(p.keys().is_empty());
    let tiers = p.setup_frequency_sets(8).unwrap();
    assert_eq!(tiers.nkeys, 0);
    assert!(tiers.frq.iter().all(|f| f.len == 0));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(2, 16, ScanImpl::Scalar);
    assert!(Pipeline::start(dir.path().join("absent.txt"), &cfg).is_err());
}

#[test]
fn entry_points_must_run_in_order() {
    let cfg = config(4, 16, ScanImpl::Scalar);
    let mut p = Pipeline::from_bytes(b"tacos\n".to_vec(), &cfg).unwrap();
    assert!(p.setup_frequency_sets(8).is_err());
    p.process_words().unwrap();
    assert!(p.process_words().is_err());
    // dropped before solving: workers must still come home
    drop(p);
}

#[test]
fn full_table_drops_later_keys() {
    let cfg = Config {
        hash_size: 2,
        ..config(1, 1024, ScanImpl::Scalar)
    };
    let mut p = Pipeline::from_bytes(b"tacos\nbrief\nwaltz\nnymph\n".to_vec(), &cfg).unwrap();
    p.process_words().unwrap();
    let table = p.table().unwrap();
    assert!(table.is_full());
    assert_eq!(p.keys(), &[calc_key(b"tacos"), calc_key(b"brief")]);
}

#[test]
fn full_store_drops_words() {
    let cfg = Config {
        max_words: 1,
        ..config(1, 1024, ScanImpl::Scalar)
    };
    let mut p = Pipeline::from_bytes(b"tacos\nbrief\nwaltz\nnymph\nvibex\n".to_vec(), &cfg).unwrap();
    p.process_words().unwrap();
    assert_eq!(p.words(), b"tacosbriefwaltz");
    assert_eq!(p.keys().len(), 3);
}

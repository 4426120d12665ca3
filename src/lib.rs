//! Concurrent ingestion of five-letter word lists.
//!
//! Readers scan a mapped word list in parallel and publish every word whose
//! five letters differ. The main thread deduplicates the letter-set keys
//! through an open-addressing table, and the keys are then split into 26
//! tiers by letter, rarest first, for a disjoint-set search.

pub mod config;
pub mod ingest;
pub mod runtime;
pub mod solving;
pub mod table;
pub mod tiers;
pub mod wait;

pub use config::Config;
pub use ingest::{Pipeline, Prepared, Stage};

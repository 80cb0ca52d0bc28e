//! Test organization:
//! - bucket.rs: global token bucket behavior against a manual clock
//! - keyed.rs: bounded per-key pool and LRU eviction

mod bucket;
mod keyed;

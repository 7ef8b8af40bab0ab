// File: src/lib.rs
//
// Library interface for Frame Duel.
// Exposes the two frame implementations under test, the timing and
// reporting harness, and the data generator for integration testing.

pub mod benchmarks;
pub mod config;
pub mod data;
pub mod errors;
pub mod frame;

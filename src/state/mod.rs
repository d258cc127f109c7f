//! State module for tracking run progress
//!
//! A harvest run moves through a fixed sequence of phases:
//!
//! `Start → ResolvingIndex → Batching → ProcessingBatch(1..=n) → Done`
//!
//! with `Failed` reachable only while the index is being resolved.

mod run_phase;

pub use run_phase::RunPhase;

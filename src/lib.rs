//! Checkpoint-based outcome tracking for trading signals
//!
//! See [`pipeline`] for the architecture overview.

pub mod pipeline;

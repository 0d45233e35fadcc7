//! Bounded in-memory sample history.
//!
//! # Data Flow
//! ```text
//! poll loop (single producer per site)
//!     → buffer.rs add() (evicts oldest when full)
//!
//! global monitor / raw writer / external readers
//!     → buffer.rs range() (ordered copy, never a torn element)
//! ```
//!
//! # Design Decisions
//! - Fixed capacity, FIFO eviction, insertion order preserved
//! - Range queries drop out-of-range elements, they are never clamped
//! - Readers receive owned copies and never hold the lock after returning

pub mod buffer;

pub use buffer::{HistoryBuffer, HistoryError, Keyed};

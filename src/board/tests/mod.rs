//! Board module tests.
//!
//! Tests are organized into separate files by category:
//! - `fen.rs` - FEN parsing and emission
//! - `search.rs` - enumeration, best-move search, move application
//! - `status.rs` - check, checkmate and stalemate probes
//! - `proptest.rs` - property-based tests

mod proptest;
mod status;

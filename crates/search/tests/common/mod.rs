//! Test infrastructure for model search.
//!
//! Fixture entities modelled on a small catalogue: `mock_model` rows owned by
//! `other_mock_model` rows and tagged through a pivot table, plus an
//! in-memory SQLite database holding the same shape.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod harness;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use harness::*;

//! # amchunk testkit
//!
//! Test utilities for the amchunk crates.
//!
//! This crate provides:
//! - Builders for document and change chunks
//! - Property-based test generators using proptest
//! - Golden listing comparisons
//! - Fuzz testing harnesses
//! - Hex test vectors
//!
//! ## Usage
//!
//! ```rust
//! use amchunk_testkit::prelude::*;
//!
//! let chunk = ChangeBuilder::new(vec![0xaa]).seq(1).message("hello").build();
//! fuzz_annotate(&chunk);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod golden;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::golden::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use golden::*;
pub use vectors::*;

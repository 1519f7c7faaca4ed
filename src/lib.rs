//
// Copyright (c) The armor-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! ARMOR compares two revisions of a C/C++ public header and reports
//! every change to the declared API surface.
//!
//! The pipeline parses each revision with the libclang front-end (raw
//! bindings from [clang-sys]), projects the declarations into a
//! position-independent tree of API nodes keyed by stable identifiers,
//! diffs the two trees into a tagged difference tree, and renders the
//! result as human-readable change rows with a compatibility verdict.
//!
//! [clang-sys]: https://crates.io/crates/clang-sys
//!
//! ## Design Goals
//! * Keep the front-end behind a narrow contract so any parser exposing
//!   declarations, USRs and type queries can host the core
//! * The difference tree is a pure value: nothing in it borrows from the
//!   parsed contexts
//! * Deterministic output for identical inputs and options

mod error;
mod utils;

pub mod builder;
pub mod context;
pub mod describe;
pub mod diff;
pub mod frontend;
pub mod logging;
pub mod node;
pub mod report;

pub use crate::error::{Error, Result};

// Re-export the raw FFI bindings for convenience.
pub use clang_sys as ffi;

//! Segmented-memory virtual machine for the Patito quadruple IR.
//!
//! This crate owns the data model shared between compilation and
//! execution -- [`address`]'s tagged [`Address`](address::Address),
//! the [`quad`] IR, the [`tables`] built up while compiling -- plus the
//! [`memory`] compaction pass and [`interpreter`] loop that actually run
//! a compiled program. `patito-compiler` depends on this crate and
//! builds a [`output::CompileOutput`] using these same types; `patitoc`
//! wires the two together.

pub mod address;
pub mod constants;
pub mod error;
pub mod interpreter;
pub mod memory;
pub mod output;
pub mod quad;
pub mod tables;
pub mod value;

pub use error::RuntimeError;
pub use interpreter::{execute, execute_with_memory};
pub use output::CompileOutput;

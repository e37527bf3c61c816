//! Lexes, parses, and emits quadruple IR for the Patito teaching
//! language (spec.md). [`compile`] is the single entry point: given
//! source text it returns the artifacts `patito_vm::execute` runs, plus
//! any non-fatal diagnostics collected along the way, or a
//! [`CompileError`] on the first fatal error.
//!
//! The pipeline is a pest grammar (`grammar/patito.pest`) feeding a
//! tree-walking [`Emitter`](emitter::Emitter), the same split the
//! teacher crate (`vasm`) uses between its grammar file and
//! `instructions.rs`/`data.rs`.

mod cube;
pub mod emitter;
pub mod error;
mod lexer;
mod parser;

pub use error::{CompileError, Diagnostic, Diagnostics};
pub use parser::compile;

//! Fatal and non-fatal errors raised while compiling a Patito program.
//!
//! Spec §7 groups error kinds by phase. Syntactic errors surface as the
//! underlying `pest::error::Error`, the same design the teacher's
//! `vasm::Error::Parse(ParseError::Pest(..))` uses. Semantic fatal
//! errors get one variant each; semantic non-fatal errors (duplicate
//! declaration) and lexical warnings (invalid character) go through
//! [`Diagnostics`] instead, since they don't abort compilation.

use crate::parser::Rule;
use patito_vm::address::{Segment, ValueType};
use patito_vm::quad::DoublePatch;
use patito_vm::tables::SegmentExhausted;
use std::error::Error;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum CompileError {
    /// §7 syntactic: unexpected token, reported with line/column by pest.
    Syntax(Box<pest::error::Error<Rule>>),
    /// §7 semantic (fatal): a name used in an expression or assignment
    /// was never declared.
    UndeclaredVariable { name: String, line: usize },
    /// §7 semantic (fatal): operand types reject the operator under the
    /// semantic cube (§4.2).
    TypeMismatchExpr {
        left: ValueType,
        right: ValueType,
        op: &'static str,
        line: usize,
    },
    /// §4.4: assignment requires the RHS type to equal the destination's
    /// declared type exactly -- no cube coercion (§9 open question ii).
    TypeMismatchAssign {
        dst_type: ValueType,
        src_type: ValueType,
        line: usize,
    },
    /// §4.5/§4.6: an `if`/`do-while` condition did not evaluate to `bool`.
    NonBoolCondition { found: ValueType, line: usize },
    /// §4.3: a pending unary minus applied to a `bool` operand.
    NegateBool { line: usize },
    /// §4.3: a closing `)` with no matching `(` marker on the operator
    /// stack, or the marker popped was not `(`.
    UnbalancedParenthesis { line: usize },
    /// §4.5 back-patch invariant: a jump quadruple's slot was already
    /// filled when a second patch was attempted. A compiler bug.
    DoublePatch(usize),
    /// §4.8: the operand/operator/jump stacks were not all empty at the
    /// final reduction.
    PendingQuadruples,
    /// §3: a variable or constant segment ran out of the 1000 addresses
    /// available to it.
    SegmentExhausted(Segment),
}

impl From<pest::error::Error<Rule>> for CompileError {
    fn from(err: pest::error::Error<Rule>) -> CompileError {
        CompileError::Syntax(Box::new(err))
    }
}

impl From<DoublePatch> for CompileError {
    fn from(err: DoublePatch) -> CompileError {
        CompileError::DoublePatch(err.0)
    }
}

impl From<SegmentExhausted> for CompileError {
    fn from(err: SegmentExhausted) -> CompileError {
        CompileError::SegmentExhausted(err.0)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::Syntax(err) => write!(f, "{}", err),
            CompileError::UndeclaredVariable { name, line } => {
                write!(f, "line {}: undeclared variable '{}'", line, name)
            }
            CompileError::TypeMismatchExpr { left, right, op, line } => write!(
                f,
                "line {}: type mismatch: cannot apply '{}' to {} and {}",
                line, op, left, right
            ),
            CompileError::TypeMismatchAssign { dst_type, src_type, line } => write!(
                f,
                "line {}: cannot assign value of type {} to variable of type {}",
                line, src_type, dst_type
            ),
            CompileError::NonBoolCondition { found, line } => write!(
                f,
                "line {}: condition must be bool, found {}",
                line, found
            ),
            CompileError::NegateBool { line } => {
                write!(f, "line {}: cannot apply unary minus to a bool value", line)
            }
            CompileError::UnbalancedParenthesis { line } => {
                write!(f, "line {}: unbalanced parenthesis", line)
            }
            CompileError::DoublePatch(index) => write!(
                f,
                "compiler bug: quadruple {} was back-patched twice",
                index
            ),
            CompileError::PendingQuadruples => {
                write!(f, "pending quadruples: stacks were not empty at end of program")
            }
            CompileError::SegmentExhausted(segment) => {
                write!(f, "address segment {:?} is exhausted", segment)
            }
        }
    }
}

impl Error for CompileError {}

/// A non-fatal message produced during a compile: a lexical warning or a
/// duplicate declaration. Spec §7: duplicate declaration "is reported,
/// original entry retained, compilation continues"; invalid character
/// "warn with character, line, column; skip the offending character and
/// continue lexing".
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    InvalidChar { ch: char, line: usize, column: usize },
    DuplicateDeclaration { name: String, line: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Diagnostic::InvalidChar { ch, line, column } => write!(
                f,
                "line {}, column {}: invalid character '{}'",
                line, column, ch
            ),
            Diagnostic::DuplicateDeclaration { name, line } => write!(
                f,
                "line {}: variable '{}' already declared",
                line, name
            ),
        }
    }
}

/// Accumulates [`Diagnostic`]s over the course of one compile.
#[derive(Default, Clone, Debug)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

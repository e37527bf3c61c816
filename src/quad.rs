//! The quadruple intermediate representation.
//!
//! Spec §3 models a quadruple as an untyped four-tuple `(op, left,
//! right, result)` with per-opcode rules about which slots are present.
//! Rather than carry that union-by-convention through the VM, `Quad` is
//! a proper sum type: each variant only has the fields its opcode
//! actually uses, so "which slots does a `print` quad populate" is
//! answered by the type checker instead of a runtime convention.

use crate::address::Address;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompareOp {
    Gt,
    Lt,
    Ne,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ne => "!=",
        };
        write!(f, "{}", s)
    }
}

/// An index into the quadruple list. Used as both a `Goto*` target and,
/// before back-patching, as a handle for [`Quadruples::patch`].
pub type QuadIndex = usize;

#[derive(Clone, Copy, Debug)]
pub enum Quad {
    Arith {
        op: ArithOp,
        left: Address,
        right: Address,
        result: Address,
    },
    /// Unary minus. `left` is always absent in spec terms; modeled here
    /// by simply having no `left` field at all.
    Negate {
        operand: Address,
        result: Address,
    },
    Compare {
        op: CompareOp,
        left: Address,
        right: Address,
        result: Address,
    },
    Assign {
        src: Address,
        dst: Address,
    },
    Goto {
        target: Option<QuadIndex>,
    },
    GotoF {
        cond: Address,
        target: Option<QuadIndex>,
    },
    GotoT {
        cond: Address,
        target: Option<QuadIndex>,
    },
    PrintValue {
        value: Address,
    },
    PrintNewline,
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Quad::Arith { op, left, right, result } => {
                write!(f, "{} {} {} {}", op, left, right, result)
            }
            Quad::Negate { operand, result } => write!(f, "- _ {} {}", operand, result),
            Quad::Compare { op, left, right, result } => {
                write!(f, "{} {} {} {}", op, left, right, result)
            }
            Quad::Assign { src, dst } => write!(f, "= {} _ {}", src, dst),
            Quad::Goto { target } => write!(f, "Goto _ _ {}", fmt_target(*target)),
            Quad::GotoF { cond, target } => write!(f, "GotoF {} _ {}", cond, fmt_target(*target)),
            Quad::GotoT { cond, target } => write!(f, "GotoT {} _ {}", cond, fmt_target(*target)),
            Quad::PrintValue { value } => write!(f, "print {} _ _", value),
            Quad::PrintNewline => write!(f, "print _ _ _"),
        }
    }
}

fn fmt_target(target: Option<QuadIndex>) -> String {
    match target {
        Some(t) => t.to_string(),
        None => "?".to_owned(),
    }
}

/// A compiler bug: an attempt to back-patch a jump quadruple whose
/// target slot was already filled (spec §4.5: "a quadruple is patched
/// exactly once; attempting to patch a slot already filled is a
/// compiler bug and fatal").
#[derive(Clone, Copy, Debug)]
pub struct DoublePatch(pub QuadIndex);

/// The ordered, append-mostly list of emitted quadruples.
#[derive(Default, Clone)]
pub struct Quadruples(Vec<Quad>);

impl Quadruples {
    pub fn new() -> Quadruples {
        Quadruples::default()
    }

    /// Appends `quad`, returning the index it was assigned.
    pub fn push(&mut self, quad: Quad) -> QuadIndex {
        self.0.push(quad);
        self.0.len() - 1
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: QuadIndex) -> Option<&Quad> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.0.iter()
    }

    /// Fills in the `target` of the jump quadruple at `index`.
    ///
    /// # Errors
    /// Returns [`DoublePatch`] if `index` does not refer to a jump quad,
    /// or its target slot is already `Some`.
    pub fn patch(&mut self, index: QuadIndex, target: QuadIndex) -> Result<(), DoublePatch> {
        let slot = match self.0.get_mut(index) {
            Some(Quad::Goto { target: t }) => t,
            Some(Quad::GotoF { target: t, .. }) => t,
            Some(Quad::GotoT { target: t, .. }) => t,
            _ => return Err(DoublePatch(index)),
        };
        if slot.is_some() {
            return Err(DoublePatch(index));
        }
        *slot = Some(target);
        Ok(())
    }
}

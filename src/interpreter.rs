//! The interpreter loop: fetch a quadruple, translate its operands,
//! execute it, advance (or jump) the program counter.

use crate::error::RuntimeError;
use crate::memory::{Memory, Storage};
use crate::output::CompileOutput;
use crate::quad::Quad;
use crate::value::Cell;
use std::io::Write;

fn as_int(cell: &Cell) -> i64 {
    match cell {
        Cell::Int(v) => *v,
        other => panic!("expected int cell, found {:?}", other),
    }
}

fn as_float(cell: &Cell) -> f64 {
    match cell {
        Cell::Float(v) => *v,
        other => panic!("expected float cell, found {:?}", other),
    }
}

fn as_bool(cell: &Cell) -> bool {
    match cell {
        Cell::Bool(v) => *v,
        other => panic!("expected bool cell, found {:?}", other),
    }
}

/// Numeric value of an `int` or `float` cell, widened to `f64`, for use
/// where the result type (e.g. a comparison) doesn't depend on which of
/// the two it was.
fn as_numeric(cell: &Cell) -> f64 {
    match cell {
        Cell::Int(v) => *v as f64,
        Cell::Float(v) => *v,
        other => panic!("expected numeric cell, found {:?}", other),
    }
}

/// Runs `output`'s quadruples to completion against a fresh memory
/// image, writing `print` output to `stdout`.
///
/// `stdout` is a generic [`Write`] rather than the hard-wired process
/// standard output so tests can capture output into a `Vec<u8>`, the
/// same rationale the teacher crate has for keeping `Storage` a trait
/// rather than a single concrete memory type.
pub fn execute<W: Write>(output: &CompileOutput, stdout: &mut W) -> Result<(), RuntimeError> {
    let mut memory = Memory::build(output);
    run_loop(output, &mut memory, stdout)
}

/// Like [`execute`], but also hands back the final [`Memory`] image
/// instead of discarding it, for `patitoc --dump-memory` (mirroring
/// `Virtual_Machine.print_memory` in original_source/Virtual_Machine.py).
pub fn execute_with_memory<W: Write>(
    output: &CompileOutput,
    stdout: &mut W,
) -> Result<Memory, RuntimeError> {
    let mut memory = Memory::build(output);
    run_loop(output, &mut memory, stdout)?;
    Ok(memory)
}

fn run_loop<W: Write>(
    output: &CompileOutput,
    memory: &mut Memory,
    stdout: &mut W,
) -> Result<(), RuntimeError> {
    let mut pc: usize = 0;

    while pc < output.quadruples.len() {
        let quad = *output.quadruples.get(pc).expect("pc in range");
        let mut jumped = false;

        match quad {
            Quad::Arith { op, left, right, result } => {
                let l = memory.read(left)?.clone();
                let r = memory.read(right)?.clone();
                let value = eval_arith(op, &l, &r, result.segment);
                memory.write(result, value)?;
            }
            Quad::Negate { operand, result } => {
                let v = memory.read(operand)?.clone();
                let negated = match v {
                    Cell::Int(n) => Cell::Int(-n),
                    Cell::Float(n) => Cell::Float(-n),
                    other => panic!("expected numeric cell, found {:?}", other),
                };
                memory.write(result, negated)?;
            }
            Quad::Compare { op, left, right, result } => {
                let l = as_numeric(memory.read(left)?);
                let r = as_numeric(memory.read(right)?);
                let truth = match op {
                    crate::quad::CompareOp::Gt => l > r,
                    crate::quad::CompareOp::Lt => l < r,
                    crate::quad::CompareOp::Ne => l != r,
                };
                memory.write(result, Cell::Bool(truth))?;
            }
            Quad::Assign { src, dst } => {
                let value = memory.read(src)?.clone();
                memory.write(dst, value)?;
            }
            Quad::Goto { target } => {
                pc = target.ok_or(RuntimeError::UnresolvedJump)?;
                jumped = true;
            }
            Quad::GotoF { cond, target } => {
                if !as_bool(memory.read(cond)?) {
                    pc = target.ok_or(RuntimeError::UnresolvedJump)?;
                    jumped = true;
                }
            }
            Quad::GotoT { cond, target } => {
                if as_bool(memory.read(cond)?) {
                    pc = target.ok_or(RuntimeError::UnresolvedJump)?;
                    jumped = true;
                }
            }
            Quad::PrintValue { value } => {
                let cell = memory.read(value)?;
                write!(stdout, "{}", cell).expect("write to stdout succeeds");
            }
            Quad::PrintNewline => {
                writeln!(stdout).expect("write to stdout succeeds");
            }
        }

        if jumped {
            if pc > output.quadruples.len() {
                return Err(RuntimeError::JumpOutOfRange(pc));
            }
        } else {
            pc += 1;
        }
    }

    Ok(())
}

fn eval_arith(op: crate::quad::ArithOp, left: &Cell, right: &Cell, result_segment: crate::address::Segment) -> Cell {
    use crate::address::Segment;
    use crate::quad::ArithOp;

    // Division always lands in the float segment (spec §4.2: "/: always
    // `float`"), even for two int operands.
    if op == ArithOp::Div {
        return Cell::Float(as_numeric(left) / as_numeric(right));
    }

    match result_segment {
        Segment::Int => {
            let l = as_int(left);
            let r = as_int(right);
            Cell::Int(match op {
                ArithOp::Add => l + r,
                ArithOp::Sub => l - r,
                ArithOp::Mul => l * r,
                ArithOp::Div => unreachable!("handled above"),
            })
        }
        Segment::Float => {
            let l = as_numeric(left);
            let r = as_numeric(right);
            Cell::Float(match op {
                ArithOp::Add => l + r,
                ArithOp::Sub => l - r,
                ArithOp::Mul => l * r,
                ArithOp::Div => unreachable!("handled above"),
            })
        }
        other => panic!("arithmetic result segment must be int or float, found {:?}", other),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::address::{Address, Segment, VarType};
    use crate::output::SegmentUsage;
    use crate::quad::{ArithOp, CompareOp, Quad, Quadruples};
    use crate::tables::{ConstantTable, SegmentCounters, VariableTable};

    fn run(build: impl FnOnce(&mut Quadruples, &mut ConstantTable, &mut SegmentCounters)) -> String {
        let mut counters = SegmentCounters::new();
        let mut constants = ConstantTable::new();
        let mut quadruples = Quadruples::new();
        build(&mut quadruples, &mut constants, &mut counters);

        let output = CompileOutput {
            quadruples,
            variables: VariableTable::new(),
            constants,
            segment_usage: SegmentUsage::from_counters(&counters),
        };

        let mut out = Vec::new();
        execute(&output, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn addition_and_print() {
        let text = run(|quads, consts, counters| {
            let a = consts.intern_int(2, counters).unwrap();
            let b = consts.intern_int(3, counters).unwrap();
            let sum = counters.alloc(Segment::Int).unwrap();
            quads.push(Quad::Arith { op: ArithOp::Add, left: a, right: b, result: sum });
            quads.push(Quad::PrintValue { value: sum });
            quads.push(Quad::PrintNewline);
        });
        assert_eq!(text, "5\n");
    }

    #[test]
    fn int_division_is_float() {
        let text = run(|quads, consts, counters| {
            let a = consts.intern_int(7, counters).unwrap();
            let b = consts.intern_int(2, counters).unwrap();
            let q = counters.alloc(Segment::Float).unwrap();
            quads.push(Quad::Arith { op: ArithOp::Div, left: a, right: b, result: q });
            quads.push(Quad::PrintValue { value: q });
        });
        assert_eq!(text, "3.5");
    }

    #[test]
    fn comparison_and_conditional_jump() {
        let text = run(|quads, consts, counters| {
            let five = consts.intern_int(5, counters).unwrap();
            let three = consts.intern_int(3, counters).unwrap();
            let cond = counters.alloc(Segment::Bool).unwrap();
            quads.push(Quad::Compare { op: CompareOp::Gt, left: five, right: three, result: cond });
            let goto_f = quads.push(Quad::GotoF { cond, target: None });
            quads.push(Quad::PrintValue { value: five });
            let end = quads.len();
            quads.patch(goto_f, end).unwrap();
        });
        assert_eq!(text, "5");
    }

    #[test]
    fn do_while_loop_back_edge() {
        let text = run(|quads, consts, counters| {
            let zero = consts.intern_int(0, counters).unwrap();
            let one = consts.intern_int(1, counters).unwrap();
            let three = consts.intern_int(3, counters).unwrap();
            let i = counters.alloc(Segment::Int).unwrap();
            quads.push(Quad::Assign { src: zero, dst: i });

            let loop_start = quads.len();
            quads.push(Quad::PrintValue { value: i });
            let next = counters.alloc(Segment::Int).unwrap();
            quads.push(Quad::Arith { op: ArithOp::Add, left: i, right: one, result: next });
            quads.push(Quad::Assign { src: next, dst: i });

            let cond = counters.alloc(Segment::Bool).unwrap();
            quads.push(Quad::Compare { op: CompareOp::Lt, left: i, right: three, result: cond });
            quads.push(Quad::GotoT { cond, target: Some(loop_start) });
        });
        assert_eq!(text, "012");
    }

    #[test]
    fn unresolved_jump_is_a_runtime_error() {
        let mut counters = SegmentCounters::new();
        let mut quadruples = Quadruples::new();
        quadruples.push(Quad::Goto { target: None });
        let output = CompileOutput {
            quadruples,
            variables: VariableTable::new(),
            constants: ConstantTable::new(),
            segment_usage: SegmentUsage::from_counters(&counters),
        };
        let mut out = Vec::new();
        assert_eq!(execute(&output, &mut out), Err(RuntimeError::UnresolvedJump));
        let _ = &mut counters;
    }
}

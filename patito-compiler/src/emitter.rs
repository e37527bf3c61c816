//! The quadruple emitter: the object spec §9 calls for ("Re-architect as
//! a single `Compiler` value owning tables, stacks, counters, and the
//! quadruple buffer"). `Emitter` owns one compilation's variable table,
//! constant table, segment counters, quadruple buffer, and the three
//! transient stacks (operand, operator, jump). `crate::parser::compile`
//! walks the parse tree and calls one `Emitter` method per grammar
//! production in spec §4.3-§4.8; no type or address logic lives in the
//! walker itself.

use crate::cube::{self, CubeOp};
use crate::error::{CompileError, Diagnostic, Diagnostics};
use patito_vm::address::{Address, ValueType, VarType};
use patito_vm::output::{CompileOutput, SegmentUsage};
use patito_vm::quad::{ArithOp, CompareOp, Quad, Quadruples};
use patito_vm::tables::{ConstantTable, SegmentCounters, VariableTable};

/// An entry on the operator stack: a binary operator, a `(` grouping
/// marker, the `=` of an in-progress assignment, or the `cout` sentinel
/// bracketing a print statement (spec §3's "operator stack").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Operator {
    Arith(ArithOp),
    Compare(CompareOp),
    Assign,
    LParen,
    Cout,
}

fn op_symbol(op: Operator) -> &'static str {
    match op {
        Operator::Arith(ArithOp::Add) => "+",
        Operator::Arith(ArithOp::Sub) => "-",
        Operator::Arith(ArithOp::Mul) => "*",
        Operator::Arith(ArithOp::Div) => "/",
        Operator::Compare(CompareOp::Gt) => ">",
        Operator::Compare(CompareOp::Lt) => "<",
        Operator::Compare(CompareOp::Ne) => "!=",
        Operator::Assign => "=",
        Operator::LParen => "(",
        Operator::Cout => "cout",
    }
}

type Operand = (Address, ValueType);

/// Owns everything spec §3 calls for in one compilation: the tables, the
/// segment counters, the quadruple buffer, and the three transient
/// stacks.
pub struct Emitter {
    variables: VariableTable,
    constants: ConstantTable,
    counters: SegmentCounters,
    quadruples: Quadruples,
    operand_stack: Vec<Operand>,
    operator_stack: Vec<Operator>,
    jump_stack: Vec<usize>,
    pending_negate: bool,
    diagnostics: Diagnostics,
}

impl Emitter {
    pub fn new() -> Emitter {
        Emitter {
            variables: VariableTable::new(),
            constants: ConstantTable::new(),
            counters: SegmentCounters::new(),
            quadruples: Quadruples::new(),
            operand_stack: Vec::new(),
            operator_stack: Vec::new(),
            jump_stack: Vec::new(),
            pending_negate: false,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Routes a diagnostic produced outside the emitter (currently only
    /// the lexical pre-scan's invalid-character warnings) into the same
    /// collector `declare` uses for duplicate-declaration warnings.
    pub fn record_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    // -- §4.1 declarations --------------------------------------------

    /// `ID` inside a `var` declaration list. Spec §4.1: duplicate name is
    /// non-fatal, original entry preserved.
    pub fn declare(&mut self, name: &str, line: usize) {
        if self.variables.declare(name).is_err() {
            self.diagnostics.push(Diagnostic::DuplicateDeclaration {
                name: name.to_owned(),
                line,
            });
        }
    }

    /// The `: <type> ;` that closes a declaration batch: every entry
    /// still `Pending` gets `ty` and the next address in its segment.
    pub fn close_decl_group(&mut self, ty: VarType) -> Result<(), CompileError> {
        self.variables.resolve_pending(ty, &mut self.counters)?;
        Ok(())
    }

    // -- §4.3 expression evaluation -------------------------------------

    /// An identifier used as an operand (not the destination of an
    /// assignment). Spec §4.3: "resolve address and type... then push
    /// `(address, type)`... If a pending unary-minus flag is set, first
    /// emit the negate quad... and push the temp instead."
    pub fn push_identifier_operand(&mut self, name: &str, line: usize) -> Result<(), CompileError> {
        let (ty, addr) = self
            .variables
            .lookup(name)
            .ok_or_else(|| CompileError::UndeclaredVariable { name: name.to_owned(), line })?;
        self.push_operand_applying_negate(addr, ty.into(), line)
    }

    pub fn push_int_literal(&mut self, value: i64, line: usize) -> Result<(), CompileError> {
        let addr = self.constants.intern_int(value, &mut self.counters)?;
        self.push_operand_applying_negate(addr, ValueType::Int, line)
    }

    pub fn push_float_literal(&mut self, value: f64, line: usize) -> Result<(), CompileError> {
        let addr = self.constants.intern_float(value, &mut self.counters)?;
        self.push_operand_applying_negate(addr, ValueType::Float, line)
    }

    fn push_operand_applying_negate(
        &mut self,
        addr: Address,
        ty: ValueType,
        line: usize,
    ) -> Result<(), CompileError> {
        if !self.pending_negate {
            self.operand_stack.push((addr, ty));
            return Ok(());
        }
        self.pending_negate = false;
        if ty == ValueType::Bool {
            return Err(CompileError::NegateBool { line });
        }
        let result = self.counters.alloc(ty.segment())?;
        self.quadruples.push(Quad::Negate { operand: addr, result });
        self.operand_stack.push((result, ty));
        Ok(())
    }

    /// A leading `-` in `factor`'s optional sign. A leading `+` is a
    /// no-op and has no corresponding call.
    pub fn set_pending_negate(&mut self) {
        self.pending_negate = true;
    }

    pub fn push_add_op(&mut self, op: ArithOp) {
        self.operator_stack.push(Operator::Arith(op));
    }

    pub fn push_compare_op(&mut self, op: CompareOp) {
        self.operator_stack.push(Operator::Compare(op));
    }

    /// `(` grouping marker: blocks reductions across it (spec §4.3).
    pub fn open_paren(&mut self) {
        self.operator_stack.push(Operator::LParen);
    }

    /// Closing `)`: pops the marker, fatal if it isn't there.
    pub fn close_paren(&mut self, line: usize) -> Result<(), CompileError> {
        match self.operator_stack.pop() {
            Some(Operator::LParen) => Ok(()),
            _ => Err(CompileError::UnbalancedParenthesis { line }),
        }
    }

    /// Reduction point after `term`: pop `+`/`-` and reduce if on top.
    pub fn reduce_exp_level(&mut self, line: usize) -> Result<(), CompileError> {
        self.reduce_if_top_matches(
            |op| matches!(op, Operator::Arith(ArithOp::Add) | Operator::Arith(ArithOp::Sub)),
            line,
        )
    }

    /// Reduction point after `factor`: pop `*`/`/` and reduce if on top.
    pub fn reduce_term_level(&mut self, line: usize) -> Result<(), CompileError> {
        self.reduce_if_top_matches(
            |op| matches!(op, Operator::Arith(ArithOp::Mul) | Operator::Arith(ArithOp::Div)),
            line,
        )
    }

    /// Reduction point after `exp`: pop a relational operator and reduce
    /// if on top.
    pub fn reduce_expression_level(&mut self, line: usize) -> Result<(), CompileError> {
        self.reduce_if_top_matches(|op| matches!(op, Operator::Compare(_)), line)
    }

    fn reduce_if_top_matches(
        &mut self,
        matches_level: impl Fn(&Operator) -> bool,
        line: usize,
    ) -> Result<(), CompileError> {
        let top_matches = self.operator_stack.last().map(&matches_level).unwrap_or(false);
        if !top_matches {
            return Ok(());
        }
        let op = self.operator_stack.pop().expect("checked non-empty above");
        let (r_addr, r_ty) = self.operand_stack.pop().expect("operand stack underflow");
        let (l_addr, l_ty) = self.operand_stack.pop().expect("operand stack underflow");

        let cube_op = match op {
            Operator::Arith(a) => CubeOp::Arith(a),
            Operator::Compare(c) => CubeOp::Compare(c),
            _ => unreachable!("only arithmetic/compare operators reach this point"),
        };

        let result_ty = cube::lookup(l_ty, r_ty, cube_op).ok_or(CompileError::TypeMismatchExpr {
            left: l_ty,
            right: r_ty,
            op: op_symbol(op),
            line,
        })?;
        let result = self.counters.alloc(result_ty.segment())?;

        let quad = match op {
            Operator::Arith(a) => Quad::Arith { op: a, left: l_addr, right: r_addr, result },
            Operator::Compare(c) => Quad::Compare { op: c, left: l_addr, right: r_addr, result },
            _ => unreachable!(),
        };
        self.quadruples.push(quad);
        self.operand_stack.push((result, result_ty));
        Ok(())
    }

    // -- §4.4 assignment --------------------------------------------------

    pub fn begin_assign(&mut self, name: &str, line: usize) -> Result<(), CompileError> {
        let (ty, addr) = self
            .variables
            .lookup(name)
            .ok_or_else(|| CompileError::UndeclaredVariable { name: name.to_owned(), line })?;
        self.operand_stack.push((addr, ty.into()));
        self.operator_stack.push(Operator::Assign);
        Ok(())
    }

    pub fn end_assign(&mut self, line: usize) -> Result<(), CompileError> {
        match self.operator_stack.pop() {
            Some(Operator::Assign) => {}
            _ => return Err(CompileError::UnbalancedParenthesis { line }),
        }
        let (src_addr, src_ty) = self.operand_stack.pop().expect("rhs operand missing");
        let (dst_addr, dst_ty) = self.operand_stack.pop().expect("destination operand missing");
        if src_ty != dst_ty {
            return Err(CompileError::TypeMismatchAssign {
                dst_type: dst_ty,
                src_type: src_ty,
                line,
            });
        }
        self.quadruples.push(Quad::Assign { src: src_addr, dst: dst_addr });
        Ok(())
    }

    // -- §4.5 conditionals --------------------------------------------

    /// After `( expr )` of an `if`: pop the bool condition, emit an
    /// unfilled `GotoF`, push its index on the jump stack.
    pub fn close_if_condition(&mut self, line: usize) -> Result<(), CompileError> {
        let (addr, ty) = self.operand_stack.pop().expect("condition operand missing");
        if ty != ValueType::Bool {
            return Err(CompileError::NonBoolCondition { found: ty, line });
        }
        let idx = self.quadruples.push(Quad::GotoF { cond: addr, target: None });
        self.jump_stack.push(idx);
        Ok(())
    }

    /// At `else`: emit an unconditional `Goto`, patch the prior `GotoF`
    /// to land just after it, and track the new `Goto` for the closing
    /// `;` to patch.
    pub fn begin_else(&mut self) -> Result<(), CompileError> {
        let goto_idx = self.quadruples.push(Quad::Goto { target: None });
        let prior = self.jump_stack.pop().expect("jump stack underflow");
        self.quadruples.patch(prior, self.quadruples.len())?;
        self.jump_stack.push(goto_idx);
        Ok(())
    }

    /// At the closing `;` of `condition`: patch the top jump-stack entry
    /// to the current quadruple count.
    pub fn close_condition(&mut self) -> Result<(), CompileError> {
        let idx = self.jump_stack.pop().expect("jump stack underflow");
        self.quadruples.patch(idx, self.quadruples.len())?;
        Ok(())
    }

    // -- §4.6 do-while --------------------------------------------------

    /// At the `do` keyword: remember the loop's entry index.
    pub fn begin_do(&mut self) {
        self.jump_stack.push(self.quadruples.len());
    }

    /// After `( expr )` of `while`: pop the bool condition and emit the
    /// back-edge `GotoT` to the loop's entry index.
    pub fn close_do_while_condition(&mut self, line: usize) -> Result<(), CompileError> {
        let (addr, ty) = self.operand_stack.pop().expect("condition operand missing");
        if ty != ValueType::Bool {
            return Err(CompileError::NonBoolCondition { found: ty, line });
        }
        let target = self.jump_stack.pop().expect("jump stack underflow");
        self.quadruples.push(Quad::GotoT { cond: addr, target: Some(target) });
        Ok(())
    }

    // -- §4.7 print -------------------------------------------------------

    pub fn begin_print(&mut self) {
        self.operator_stack.push(Operator::Cout);
    }

    pub fn print_string(&mut self, value: &str) -> Result<(), CompileError> {
        let addr = self.constants.intern_string(value, &mut self.counters)?;
        self.quadruples.push(Quad::PrintValue { value: addr });
        Ok(())
    }

    pub fn print_expression_item(&mut self) {
        let (addr, _) = self.operand_stack.pop().expect("print operand missing");
        self.quadruples.push(Quad::PrintValue { value: addr });
    }

    pub fn end_print(&mut self, line: usize) -> Result<(), CompileError> {
        match self.operator_stack.pop() {
            Some(Operator::Cout) => {}
            _ => return Err(CompileError::UnbalancedParenthesis { line }),
        }
        self.quadruples.push(Quad::PrintNewline);
        Ok(())
    }

    // -- §4.8 / finalization ----------------------------------------------

    /// Checks spec §4.8's end-of-program invariant and hands over the
    /// compiled artifacts. The error side carries the diagnostics
    /// collected up to this point too (e.g. a duplicate-declaration
    /// warning recorded earlier in the same compile), since a pending
    /// stack is still worth reporting alongside whatever non-fatal
    /// warnings preceded it.
    pub fn finish(self) -> Result<(CompileOutput, Diagnostics), (CompileError, Diagnostics)> {
        if !self.operand_stack.is_empty()
            || !self.operator_stack.is_empty()
            || !self.jump_stack.is_empty()
        {
            return Err((CompileError::PendingQuadruples, self.diagnostics));
        }
        debug_assert!(
            self.variables.all_resolved(),
            "variable table invariant I2 violated: a declared variable was never assigned a type"
        );
        let segment_usage = SegmentUsage::from_counters(&self.counters);
        let output = CompileOutput {
            quadruples: self.quadruples,
            variables: self.variables,
            constants: self.constants,
            segment_usage,
        };
        Ok((output, self.diagnostics))
    }

    /// Extracts the diagnostics collected so far, discarding everything
    /// else. Used by `compile` to attach diagnostics to a fatal
    /// `CompileError` raised before `finish` ever runs (spec §8 S6: a
    /// duplicate-declaration warning and a later fatal error must both
    /// surface from the same compile).
    pub(crate) fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    #[cfg(test)]
    fn into_quadruples(self) -> Quadruples {
        self.quadruples
    }
}

impl Default for Emitter {
    fn default() -> Emitter {
        Emitter::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn precedence_emits_multiply_quad_before_add_quad() {
        // 2 + 3 * 4: the term-level reduction for '*' must run before
        // the exp-level reduction for '+' sees its right operand.
        let mut e = Emitter::new();
        e.push_int_literal(2, 1).unwrap();
        e.push_add_op(ArithOp::Add);
        e.push_int_literal(3, 1).unwrap();
        e.push_add_op(ArithOp::Mul);
        e.push_int_literal(4, 1).unwrap();
        e.reduce_term_level(1).unwrap(); // 3 * 4
        e.reduce_exp_level(1).unwrap(); // 2 + (3*4)

        let quads = e.into_quadruples();
        assert_eq!(quads.len(), 2);
        match quads.get(0).unwrap() {
            Quad::Arith { op: ArithOp::Mul, .. } => {}
            other => panic!("expected Mul first, got {:?}", other),
        }
        match quads.get(1).unwrap() {
            Quad::Arith { op: ArithOp::Add, .. } => {}
            other => panic!("expected Add second, got {:?}", other),
        }
    }

    #[test]
    fn undeclared_variable_is_fatal() {
        let mut e = Emitter::new();
        let err = e.push_identifier_operand("missing", 7).unwrap_err();
        assert_eq!(
            err,
            CompileError::UndeclaredVariable { name: "missing".to_owned(), line: 7 }
        );
    }

    #[test]
    fn unary_minus_emits_negate_before_use() {
        let mut e = Emitter::new();
        e.set_pending_negate();
        e.push_int_literal(5, 1).unwrap();
        let quads = e.into_quadruples();
        assert_eq!(quads.len(), 1);
        match quads.get(0).unwrap() {
            Quad::Negate { .. } => {}
            other => panic!("expected Negate, got {:?}", other),
        }
    }

    #[test]
    fn negating_a_bool_operand_is_an_error() {
        let mut e = Emitter::new();
        e.push_int_literal(1, 1).unwrap();
        e.push_compare_op(CompareOp::Gt);
        e.push_int_literal(0, 1).unwrap();
        e.reduce_expression_level(1).unwrap();
        e.set_pending_negate();
        let (addr, ty) = e.operand_stack.pop().unwrap();
        assert_eq!(ty, ValueType::Bool);
        let err = e.push_operand_applying_negate(addr, ty, 9).unwrap_err();
        assert_eq!(err, CompileError::NegateBool { line: 9 });
    }

    #[test]
    fn pending_quadruples_at_finish_is_fatal() {
        let mut e = Emitter::new();
        e.push_int_literal(1, 1).unwrap();
        let (err, _diagnostics) = e.finish().unwrap_err();
        assert_eq!(err, CompileError::PendingQuadruples);
    }

    #[test]
    fn do_while_back_edge_targets_loop_entry() {
        let mut e = Emitter::new();
        e.declare("i", 1);
        e.close_decl_group(VarType::Int).unwrap();

        e.begin_assign("i", 1).unwrap();
        e.push_int_literal(0, 1).unwrap();
        e.end_assign(1).unwrap();

        e.begin_do();

        e.push_identifier_operand("i", 2).unwrap();
        e.push_compare_op(CompareOp::Lt);
        e.push_int_literal(3, 2).unwrap();
        e.reduce_expression_level(2).unwrap();
        e.close_do_while_condition(2).unwrap();

        let quads = e.into_quadruples();
        match quads.get(quads.len() - 1).unwrap() {
            Quad::GotoT { target: Some(t), .. } => assert_eq!(*t, 1),
            other => panic!("expected GotoT targeting loop entry, got {:?}", other),
        }
    }

}

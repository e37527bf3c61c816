//! The parse driver: walks a pest parse tree and calls one [`Emitter`]
//! method per grammar production, in the source's left-to-right order.
//! This is the "grammar-driven parse driver" spec §2 calls an external
//! collaborator -- it lives in this crate because the crate has to run
//! standalone, but per spec §9's "Grammar-action callbacks" note, it
//! makes no semantic decisions of its own: everything type- or
//! address-related happens inside `Emitter`.

use crate::emitter::Emitter;
use crate::error::{CompileError, Diagnostics};
use crate::lexer;
use patito_vm::address::VarType;
use patito_vm::output::CompileOutput;
use patito_vm::quad::{ArithOp, CompareOp};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar/patito.pest"]
pub struct PatitoParser;

fn line_of(pair: &Pair<Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

/// Compiles `source` to quadruple IR plus the tables it references.
/// Spec §6: "given source text, return `(quadruples, variable-table,
/// constant-table)` or an error."
///
/// The `Err` side carries whatever [`Diagnostics`] (lexical warnings,
/// duplicate-declaration warnings) were collected before the fatal
/// error, alongside it -- so a compile that both warns and then fails
/// fatally (spec §8 S6) surfaces both, rather than losing the warnings
/// when the emitter that held them is dropped on an early return.
pub fn compile(source: &str) -> Result<(CompileOutput, Diagnostics), (CompileError, Diagnostics)> {
    let (sanitized, lexical_diagnostics) = lexer::prescan(source);

    let mut emitter = Emitter::new();
    for diagnostic in lexical_diagnostics {
        emitter.record_diagnostic(diagnostic);
    }

    let mut pairs = match PatitoParser::parse(Rule::program, &sanitized) {
        Ok(pairs) => pairs,
        Err(err) => return Err((CompileError::from(err), emitter.into_diagnostics())),
    };
    let program_pair = pairs.next().expect("program rule always produces one pair");

    if let Err(err) = walk_program(program_pair, &mut emitter) {
        return Err((err, emitter.into_diagnostics()));
    }

    emitter.finish()
}

fn walk_program(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let mut inner = pair.into_inner();
    let _name = inner.next().expect("identifier"); // program name, unused semantically
    let mut next = inner.next().expect("vars or body");
    if next.as_rule() == Rule::vars {
        walk_vars(next, emitter)?;
        next = inner.next().expect("body");
    }
    walk_body(next, emitter)
}

fn walk_vars(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let decl_group = pair.into_inner().next().expect("decl_group");
    walk_decl_group(decl_group, emitter)
}

fn walk_decl_group(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let mut names = Vec::new();
    let mut var_type_pair = None;
    let mut tail = None;

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::identifier => names.push(item),
            Rule::var_type => var_type_pair = Some(item),
            Rule::decl_group => tail = Some(item),
            other => unreachable!("unexpected rule in decl_group: {:?}", other),
        }
    }

    for name in &names {
        emitter.declare(name.as_str(), line_of(name));
    }

    let ty = match var_type_pair.expect("decl_group always has a type").as_str() {
        "int" => VarType::Int,
        "float" => VarType::Float,
        other => unreachable!("unexpected var_type: {}", other),
    };
    emitter.close_decl_group(ty)?;

    if let Some(tail) = tail {
        walk_decl_group(tail, emitter)?;
    }
    Ok(())
}

fn walk_body(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    for statement in pair.into_inner() {
        walk_statement(statement, emitter)?;
    }
    Ok(())
}

fn walk_statement(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let inner = pair.into_inner().next().expect("one statement variant");
    match inner.as_rule() {
        Rule::assign => walk_assign(inner, emitter),
        Rule::condition => walk_condition(inner, emitter),
        Rule::cycle => walk_cycle(inner, emitter),
        Rule::print => walk_print(inner, emitter),
        other => unreachable!("unexpected statement variant: {:?}", other),
    }
}

fn walk_assign(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("destination identifier");
    emitter.begin_assign(name.as_str(), line_of(&name))?;
    let expression = inner.next().expect("rhs expression");
    walk_expression(expression, emitter)?;
    emitter.end_assign(line)
}

fn walk_condition(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let expression = inner.next().expect("condition expression");
    walk_expression(expression, emitter)?;
    emitter.close_if_condition(line)?;

    let if_body = inner.next().expect("if body");
    walk_body(if_body, emitter)?;

    if let Some(else_body) = inner.next() {
        emitter.begin_else()?;
        walk_body(else_body, emitter)?;
    }

    emitter.close_condition()
}

fn walk_cycle(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    emitter.begin_do();

    let body = inner.next().expect("loop body");
    walk_body(body, emitter)?;

    let expression = inner.next().expect("while condition expression");
    walk_expression(expression, emitter)?;
    emitter.close_do_while_condition(line)
}

fn walk_print(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let line = line_of(&pair);
    emitter.begin_print();
    for item in pair.into_inner() {
        walk_print_item(item, emitter)?;
    }
    emitter.end_print(line)
}

fn walk_print_item(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let inner = pair.into_inner().next().expect("string or expression");
    match inner.as_rule() {
        Rule::string_literal => {
            let text = inner.as_str();
            let unquoted = &text[1..text.len() - 1];
            emitter.print_string(unquoted)
        }
        Rule::expression => {
            walk_expression(inner, emitter)?;
            emitter.print_expression_item();
            Ok(())
        }
        other => unreachable!("unexpected print_item variant: {:?}", other),
    }
}

fn walk_expression(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let exp = inner.next().expect("first exp");
    walk_exp(exp, emitter)?;

    if let Some(rel_op) = inner.next() {
        let op = match rel_op.as_str() {
            ">" => CompareOp::Gt,
            "<" => CompareOp::Lt,
            "!=" => CompareOp::Ne,
            other => unreachable!("unexpected rel_op: {}", other),
        };
        emitter.push_compare_op(op);
        let rhs = inner.next().expect("rhs exp after relational operator");
        walk_exp(rhs, emitter)?;
    }
    emitter.reduce_expression_level(line)
}

fn walk_exp(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let first = inner.next().expect("first term");
    walk_term(first, emitter)?;

    loop {
        let op_pair = match inner.next() {
            Some(p) => p,
            None => break,
        };
        let op = match op_pair.as_str() {
            "+" => ArithOp::Add,
            "-" => ArithOp::Sub,
            other => unreachable!("unexpected add_op: {}", other),
        };
        emitter.push_add_op(op);
        let term = inner.next().expect("term after add_op");
        walk_term(term, emitter)?;
        emitter.reduce_exp_level(line)?;
    }
    Ok(())
}

fn walk_term(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let first = inner.next().expect("first factor");
    walk_factor(first, emitter)?;

    loop {
        let op_pair = match inner.next() {
            Some(p) => p,
            None => break,
        };
        let op = match op_pair.as_str() {
            "*" => ArithOp::Mul,
            "/" => ArithOp::Div,
            other => unreachable!("unexpected mul_op: {}", other),
        };
        emitter.push_add_op(op);
        let factor = inner.next().expect("factor after mul_op");
        walk_factor(factor, emitter)?;
        emitter.reduce_term_level(line)?;
    }
    Ok(())
}

fn walk_factor(pair: Pair<Rule>, emitter: &mut Emitter) -> Result<(), CompileError> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner().peekable();
    let first = inner.next().expect("factor is never empty");

    if first.as_rule() == Rule::expression {
        emitter.open_paren();
        walk_expression(first, emitter)?;
        return emitter.close_paren(line);
    }

    let operand_pair = if first.as_rule() == Rule::sign {
        if first.as_str() == "-" {
            emitter.set_pending_negate();
        }
        inner.next().expect("operand after sign")
    } else {
        first
    };

    walk_operand(operand_pair, emitter, line)
}

fn walk_operand(pair: Pair<Rule>, emitter: &mut Emitter, line: usize) -> Result<(), CompileError> {
    let inner = pair.into_inner().next().expect("identifier or literal");
    match inner.as_rule() {
        Rule::identifier => emitter.push_identifier_operand(inner.as_str(), line_of(&inner)),
        Rule::float_literal => {
            let value: f64 = inner.as_str().parse().expect("pest validated float syntax");
            emitter.push_float_literal(value, line)
        }
        Rule::int_literal => {
            let value: i64 = inner.as_str().parse().expect("pest validated int syntax");
            emitter.push_int_literal(value, line)
        }
        other => unreachable!("unexpected operand variant: {:?}", other),
    }
}

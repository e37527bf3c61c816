//! End-to-end compile-then-run tests for the six scenarios spec §8 names
//! (S1-S6), asserting on captured stdout byte-for-byte. Same shape as
//! `vasm`'s `assemble_loop`/`non_contiguous_instructions` tests: build
//! from a literal source string, run the whole pipeline, compare.

fn run(source: &str) -> String {
    let (output, _diagnostics) = patito_compiler::compile(source).expect("compile should succeed");
    let mut stdout = Vec::new();
    patito_vm::execute(&output, &mut stdout).expect("execution should succeed");
    String::from_utf8(stdout).expect("program output is valid utf-8")
}

#[test]
fn s1_arithmetic_and_assignment() {
    let source = "program p; var a,b: int; { a = 2 + 3 * 4; b = a; cout(b); } end";
    assert_eq!(run(source), "14\n");
}

#[test]
fn s2_float_promotion_and_division() {
    let source = "program p; var x: float; { x = 7 / 2; cout(x); } end";
    assert_eq!(run(source), "3.5\n");
}

#[test]
fn s3_if_else() {
    let source = "program p; var n: int; { n = 5; if (n > 3) { cout(\"big\"); } else { cout(\"small\"); }; cout(n); } end";
    assert_eq!(run(source), "big\n5\n");
}

#[test]
fn s4_do_while_loop() {
    let source = "program p; var i: int; { i = 0; do { cout(i); i = i + 1; } while (i < 3); } end";
    assert_eq!(run(source), "0\n1\n2\n");
}

#[test]
fn s5_unary_minus() {
    let source = "program p; var a: int; { a = -5 + 2; cout(a); } end";
    assert_eq!(run(source), "-3\n");
}

#[test]
fn s6_duplicate_declaration_then_undeclared_use() {
    let source = "program p; var a, a: int; { b = 1; } end";
    match patito_compiler::compile(source) {
        Ok(_) => panic!("expected a fatal undeclared-variable error"),
        Err((err, diagnostics)) => {
            assert_eq!(
                err,
                patito_compiler::CompileError::UndeclaredVariable {
                    name: "b".to_owned(),
                    line: 1,
                }
            );
            let reported_duplicate = diagnostics.iter().any(|d| {
                matches!(
                    d,
                    patito_compiler::Diagnostic::DuplicateDeclaration { name, .. } if name == "a"
                )
            });
            assert!(
                reported_duplicate,
                "expected the duplicate declaration of 'a' to be reported \
                 alongside the fatal undeclared-variable error"
            );
        }
    }
}

#[test]
fn whole_number_float_division_prints_trailing_decimal() {
    let source = "program p; var x: float; { x = 4 / 2; cout(x); } end";
    assert_eq!(run(source), "2.0\n");
}

#[test]
fn invalid_character_is_skipped_with_a_warning_not_a_syntax_error() {
    let source = "program p; var a: int; { a = 1 @ + 2; cout(a); } end";
    let (output, diagnostics) = patito_compiler::compile(source).expect("compile should succeed");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d, patito_compiler::Diagnostic::InvalidChar { ch: '@', .. })));
    let mut stdout = Vec::new();
    patito_vm::execute(&output, &mut stdout).expect("execution should succeed");
    assert_eq!(String::from_utf8(stdout).unwrap(), "3\n");
}

#[test]
fn empty_vars_section_compiles_and_runs() {
    let source = "program p; { cout(\"hi\"); } end";
    assert_eq!(run(source), "hi\n");
}

#[test]
fn if_without_else_emits_a_single_goto_f() {
    let source = "program p; var n: int; { n = 1; if (n > 0) { cout(n); }; } end";
    let (output, _) = patito_compiler::compile(source).unwrap();
    let goto_f_count = output
        .quadruples
        .iter()
        .filter(|q| matches!(q, patito_vm::quad::Quad::GotoF { .. }))
        .count();
    let goto_count = output
        .quadruples
        .iter()
        .filter(|q| matches!(q, patito_vm::quad::Quad::Goto { .. }))
        .count();
    assert_eq!(goto_f_count, 1);
    assert_eq!(goto_count, 0);
}

#[test]
fn if_with_else_emits_goto_f_and_goto_both_patched() {
    let source = "program p; var n: int; { n = 1; if (n > 0) { cout(n); } else { cout(0); }; } end";
    let (output, _) = patito_compiler::compile(source).unwrap();
    for quad in output.quadruples.iter() {
        match quad {
            patito_vm::quad::Quad::GotoF { target, .. } => assert!(target.is_some()),
            patito_vm::quad::Quad::Goto { target } => assert!(target.is_some()),
            _ => {}
        }
    }
}

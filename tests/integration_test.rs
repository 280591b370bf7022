// ABOUTME: End-to-end tests exercising the full tokenizer -> comment filter
// -> parser -> evaluator pipeline, from source text to final value.

use tiny_lang::builtins::BuiltinRegistry;
use tiny_lang::comments::strip_comments;
use tiny_lang::env::Environment;
use tiny_lang::error::TinyError;
use tiny_lang::eval::{eval_program, NullDiagnostics};
use tiny_lang::lexer::tokenize;
use tiny_lang::parser::parse;
use tiny_lang::value::Value;

fn run(src: &str) -> Result<Value, TinyError> {
    let tokens = strip_comments(tokenize(src)?)?;
    let program = parse(&tokens)?;
    let mut env = Environment::new();
    let builtins = BuiltinRegistry::new();
    eval_program(&program, &mut env, &builtins, &NullDiagnostics)
}

#[test]
fn scenario_1_simple_arithmetic() {
    assert!(matches!(run("x := 3; y := 4; x + y"), Ok(Value::Int(7))));
}

#[test]
fn scenario_2_for_loop_accumulates_sum() {
    let result = run("s := 0; for (i := 1; i <= 5; i := i + 1) do s := s + i end; s");
    assert!(matches!(result, Ok(Value::Int(15))));
}

#[test]
fn scenario_3_function_call() {
    assert!(matches!(
        run("func add(a,b) => return a + b end; add(2,3)"),
        Ok(Value::Int(5))
    ));
}

#[test]
fn scenario_4_closure_captures_outer_binding() {
    let result = run("func mk(x) => func inner() => return x end end; f := mk(42); f()");
    assert!(matches!(result, Ok(Value::Int(42))));
}

#[test]
fn scenario_5_array_cell_arithmetic() {
    let result = run("a := array(3, 0); a[0] := 1; a[1] := 2; a[2] := a[0] + a[1]; a[2]");
    assert!(matches!(result, Ok(Value::Int(3))));
}

#[test]
fn scenario_6_boolean_logic() {
    let result = run("if True andalso not False then 1 else 0 end");
    assert!(matches!(result, Ok(Value::Int(1))));
}

#[test]
fn recursive_fibonacci() {
    let src = "func f(n) => if n < 2 then return n else return f(n-1) + f(n-2) end end; f(10)";
    assert!(matches!(run(src), Ok(Value::Int(55))));
}

#[test]
fn array_identity_aliasing() {
    let result = run("a := array(3, 0); b := a; b[0] := 7; a[0]");
    assert!(matches!(result, Ok(Value::Int(7))));
}

#[test]
fn array_independence_on_nested_init() {
    let result = run("m := array(2, array(3, 0)); m[0][0] := 9; m[1][0]");
    assert!(matches!(result, Ok(Value::Int(0))));
}

#[test]
fn comment_neutrality_does_not_change_result() {
    let plain = run("x := 1 + 2; x").unwrap();
    let commented = run("<* setup *> x := 1 <* increment *> + 2; x <* done *>").unwrap();
    assert!(matches!((plain, commented), (Value::Int(3), Value::Int(3))));
}

#[test]
fn unbalanced_comment_is_an_error() {
    let result = run("x := 1 *> + 2");
    assert!(matches!(result, Err(TinyError::CommentError { .. })));
}

#[test]
fn malformed_program_is_a_parse_error() {
    let result = run("x := := 1");
    assert!(matches!(result, Err(TinyError::ParseError)));
}

#[test]
fn builtins_are_available_without_declaration() {
    assert!(matches!(run("len(array(5, 0))"), Ok(Value::Int(5))));
}

#[test]
fn string_and_double_literals_evaluate() {
    assert!(matches!(run("3.5 + 1.5"), Ok(Value::Double(n)) if n == 5.0));
    assert!(matches!(run("\"hi\""), Ok(Value::Str(s)) if s == "hi"));
}

#[test]
fn while_loop_runs_until_condition_false() {
    let result = run("i := 0; while i < 3 do i := i + 1 end; i");
    assert!(matches!(result, Ok(Value::Int(3))));
}

#[test]
fn division_by_zero_is_reported() {
    assert!(matches!(run("1 / 0"), Err(TinyError::DivideByZero { .. })));
}

#[test]
fn floor_division_and_modulo_match_python_semantics_for_negative_divisors() {
    assert!(matches!(run("7 div -2"), Ok(Value::Int(-4))));
    assert!(matches!(run("7 % -2"), Ok(Value::Int(-1))));
}

#[test]
fn out_of_bounds_index_is_reported() {
    assert!(matches!(
        run("a := array(2, 0); a[9]"),
        Err(TinyError::IndexError { .. })
    ));
}

#[test]
fn calling_an_undefined_function_is_a_name_error() {
    assert!(matches!(run("does_not_exist()"), Err(TinyError::NameError(_))));
}

// ABOUTME: End-to-end tests exercising the full scanner -> parser -> evaluator pipeline

use interp::env::Environment;
use interp::eval::eval_program;
use interp::parser::Parser;
use interp::value::Value;

fn run(src: &str) -> Value {
    let mut parser = Parser::new(src);
    let program = parser.parse_program();
    assert!(parser.errors().is_empty(), "parse errors: {:?}", parser.errors());
    let env = Environment::root();
    eval_program(&program, &env).unwrap_or_else(|e| panic!("runtime error: {}", e))
}

#[test]
fn arithmetic_precedence_and_explicit_return() {
    assert_eq!(run("var x = 2 + 3 * 4; return x;"), Value::Number(14.0));
}

#[test]
fn recursive_factorial_via_self_reference() {
    let src = "
        fn fact(n) {
            if (n < 2) {
                return 1
            } else {
                return n * fact(n - 1)
            }
        }
        return fact(6);
    ";
    assert_eq!(run(src), Value::Number(720.0));
}

#[test]
fn closures_capture_their_defining_environment() {
    let src = "
        fn make_adder(x) {
            return fn(y) { return x + y; };
        }
        var add5 = make_adder(5);
        return add5(0) + add5(5) - 5;
    ";
    assert_eq!(run(src), Value::Number(5.0));
}

#[test]
fn array_indexing_combined_with_len() {
    let src = "var a = [1, 2, 3, 4, 5]; return a[2] + len(a);";
    assert_eq!(run(src), Value::Number(23.0));
}

#[test]
fn string_concatenation_via_plus() {
    let src = r#"return "foo" + "bar";"#;
    assert_eq!(run(src), Value::String("foobar".into()));
}

#[test]
fn early_return_short_circuits_enclosing_function() {
    let src = "
        fn clamp_to_one(x) {
            if (x > 1) {
                return 1
            }
            return x;
        }
        return clamp_to_one(5) - clamp_to_one(0);
    ";
    assert_eq!(run(src), Value::Number(1.0));
}

#[test]
fn truthiness_contract_matches_falsey_set() {
    assert_eq!(run("return 0 if false else 1;"), Value::Number(1.0));
    assert_eq!(run(r#"return "truthy" if "" else "falsey";"#), Value::String("truthy".into()));
    assert_eq!(run("return 1 if [] else 2;"), Value::Number(1.0));
}

#[test]
fn single_assignment_overwrites_the_outer_binding_through_a_call() {
    let src = "
        var counter = 0;
        fn increment() { counter = counter + 1; }
        increment();
        increment();
        return counter;
    ";
    assert_eq!(run(src), Value::Number(2.0));
}

#[test]
fn nan_poisons_arithmetic_and_never_equals_itself() {
    assert_eq!(run("return NaN == NaN;"), Value::Boolean(false));
    assert_eq!(run("return (1 + NaN) == NaN;"), Value::Boolean(false));
}

#[test]
fn infinity_matrix_same_sign_addition_and_opposite_sign_subtraction() {
    assert_eq!(run("return Inf + Inf;"), Value::Infinity(1));
    assert_eq!(run("return Inf - (-Inf);"), Value::Infinity(1));
}

#[test]
fn runtime_error_reports_undefined_variable() {
    let mut parser = Parser::new("return missing;");
    let program = parser.parse_program();
    let env = Environment::root();
    let err = eval_program(&program, &env).unwrap_err();
    assert!(err.message.contains("missing"));
}

#[test]
fn parser_accumulates_an_error_for_invalid_assignment_target() {
    let mut parser = Parser::new("1 = 2;");
    parser.parse_program();
    assert!(!parser.errors().is_empty());
}

// ABOUTME: Native functions registered into the root environment

use crate::ast::CallExpression;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::Value;
use std::io::Write;
use std::rc::Rc;

/// Registers every native function. Declaring into an existing binding is
/// harmless (same name, same value each time), so callers may invoke this
/// more than once against the same root environment.
pub fn register(env: &Rc<Environment>) {
    env.declare("len", Value::NativeFunction(len));
    env.declare("print", Value::NativeFunction(print));
    env.declare("prompt", Value::NativeFunction(prompt));
}

fn call_error(call_node: &CallExpression, message: impl Into<String>) -> RuntimeError {
    RuntimeError::new(call_node.token.line, call_node.token.column, message)
        .with_node(call_node.to_string())
}

/// Extends the string-only original to also cover arrays, per this
/// language's array support.
fn len(call_node: &CallExpression, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(call_error(
            call_node,
            format!("len expects 1 argument, got {}", args.len()),
        ));
    }
    match &args[0] {
        Value::String(s) => Ok(Value::Number(s.len() as f64)),
        Value::Array(items) => Ok(Value::Number(items.len() as f64)),
        other => Err(call_error(
            call_node,
            format!("cannot get length of type '{}'", other.type_name()),
        )
        .with_hint("len only accepts a String or an Array")),
    }
}

/// Joins arguments with `", "` using their display form and a trailing
/// newline, then returns `Nil`.
fn print(_call_node: &CallExpression, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut stdout = std::io::stdout();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            let _ = write!(stdout, ", ");
        }
        let _ = write!(stdout, "{}", arg);
    }
    let _ = writeln!(stdout);
    Ok(Value::Nil)
}

/// Writes its single string argument without a trailing newline, then
/// reads and returns one line of input as a String.
fn prompt(call_node: &CallExpression, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(call_error(
            call_node,
            format!("prompt expects 1 argument, got {}", args.len()),
        ));
    }
    let message = match &args[0] {
        Value::String(s) => s.clone(),
        other => {
            return Err(call_error(
                call_node,
                format!("prompt message must be a String, got {}", other.type_name()),
            ))
        }
    };

    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "{}", message);
    let _ = stdout.flush();

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| call_error(call_node, format!("failed to read input: {}", e)))?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::String(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenKind};

    fn dummy_call() -> CallExpression {
        let tok = Token::new(TokenKind::LParen, "(", 1, 1);
        CallExpression {
            token: tok.clone(),
            function: Box::new(crate::ast::Expression::Nil(crate::ast::NilLiteral { token: tok })),
            arguments: Vec::new(),
        }
    }

    #[test]
    fn len_reports_string_byte_length() {
        let call = dummy_call();
        let result = len(&call, &[Value::String("hello".into())]).unwrap();
        assert_eq!(result, Value::Number(5.0));
    }

    #[test]
    fn len_reports_array_element_count() {
        let call = dummy_call();
        let arr = Value::Array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        let result = len(&call, &[arr]).unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn len_rejects_unsupported_types() {
        let call = dummy_call();
        assert!(len(&call, &[Value::Number(1.0)]).is_err());
    }

    #[test]
    fn print_returns_nil() {
        let call = dummy_call();
        let result = print(&call, &[Value::Number(1.0), Value::String("x".into())]).unwrap();
        assert_eq!(result, Value::Nil);
    }

    #[test]
    fn register_binds_every_native_function() {
        let env = Environment::root();
        register(&env);
        assert!(matches!(env.get("len"), Some(Value::NativeFunction(_))));
        assert!(matches!(env.get("print"), Some(Value::NativeFunction(_))));
        assert!(matches!(env.get("prompt"), Some(Value::NativeFunction(_))));
    }
}

// ABOUTME: Tree-walking evaluator mapping AST nodes onto runtime values

use crate::ast::*;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::token::TokenKind;
use crate::value::Value;
use std::rc::Rc;

/// The two control-flow sentinels spec'd alongside ordinary values. Kept
/// outside `Value` so the type system enforces that neither can ever be
/// written into an environment slot — `Environment::get`/`declare`/`set_local`
/// only ever see `Value`. `Error` rides the native `Result::Err` channel;
/// `Return` stays an explicit variant to model non-local function return.
#[derive(Debug, Clone)]
pub enum Flow {
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Flow {
    fn from(err: RuntimeError) -> Self {
        Flow::Error(err)
    }
}

pub type EvalResult = Result<Value, Flow>;

/// Evaluates a whole program. A top-level `Return` unwraps to its inner
/// value; a top-level runtime error is handed back for the driver to
/// render. Built-ins are (re-)registered on every call, which is cheap and
/// idempotent, so a REPL can call this once per line against one
/// long-lived root environment.
pub fn eval_program(program: &Program, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    crate::builtins::register(env);
    let mut result = Value::Nil;
    for statement in &program.statements {
        match eval_statement(statement, env) {
            Ok(value) => result = value,
            Err(Flow::Return(value)) => return Ok(value),
            Err(Flow::Error(err)) => return Err(err),
        }
    }
    Ok(result)
}

/// Iterates statements; any `Flow` is returned without unwrapping so it can
/// bubble through enclosing blocks up to the nearest function-call boundary
/// or the program top.
fn eval_block(statements: &[Statement], env: &Rc<Environment>) -> EvalResult {
    let mut result = Value::Nil;
    for statement in statements {
        result = eval_statement(statement, env)?;
    }
    Ok(result)
}

fn eval_statement(statement: &Statement, env: &Rc<Environment>) -> EvalResult {
    match statement {
        Statement::Var(s) => eval_var_statement(s, env),
        Statement::Return(s) => {
            let value = eval_expression(&s.value, env)?;
            Err(Flow::Return(value))
        }
        Statement::Expression(s) => eval_expression(&s.expression, env),
        Statement::Block(s) => eval_block(&s.statements, env),
        Statement::If(s) => eval_if_statement(s, env),
        Statement::BatchAssignment(s) => eval_batch_assignment(s, env),
        Statement::FunctionDeclaration(s) => eval_function_declaration(s, env),
    }
}

/// Fails with a redeclaration error if any name already exists in the
/// *local* scope; outer shadowing is permitted. The value expression is
/// evaluated exactly once and bound to every name.
fn eval_var_statement(stmt: &VarStatement, env: &Rc<Environment>) -> EvalResult {
    for name in &stmt.names {
        if env.does_exist(&name.name) {
            return Err(RuntimeError::new(
                name.line(),
                name.column(),
                format!("'{}' is already declared in this scope", name.name),
            )
            .with_node(name.to_string())
            .into());
        }
    }
    let value = eval_expression(&stmt.value, env)?;
    for name in &stmt.names {
        env.declare(name.name.clone(), value.clone());
    }
    Ok(value)
}

/// Every assignee must already exist somewhere on the chain; the single
/// evaluated RHS is written to each name's *local* slot, which can shadow an
/// outer binding of the same name rather than mutating it in place.
fn eval_batch_assignment(stmt: &BatchAssignmentStatement, env: &Rc<Environment>) -> EvalResult {
    for name in &stmt.names {
        if env.get(&name.name).is_none() {
            return Err(RuntimeError::new(
                name.line(),
                name.column(),
                format!("undefined variable: {}", name.name),
            )
            .with_node(name.to_string())
            .into());
        }
    }
    let value = eval_expression(&stmt.value, env)?;
    for name in &stmt.names {
        env.set_local(&name.name, value.clone());
    }
    Ok(value)
}

fn eval_function_declaration(stmt: &FunctionDeclarationStatement, env: &Rc<Environment>) -> EvalResult {
    let function = Value::Function {
        params: stmt.parameters.clone(),
        body: stmt.body.clone(),
        env: env.clone(),
        name: Some(stmt.name.name.clone()),
    };
    Ok(env.declare(stmt.name.name.clone(), function))
}

fn eval_if_statement(stmt: &IfStatement, env: &Rc<Environment>) -> EvalResult {
    let condition = eval_expression(&stmt.condition, env)?;
    if condition.is_truthy() {
        eval_statement(&stmt.consequence, env)
    } else if let Some(alt) = &stmt.alternative {
        eval_statement(alt, env)
    } else {
        Ok(Value::Nil)
    }
}

fn eval_expression(expr: &Expression, env: &Rc<Environment>) -> EvalResult {
    match expr {
        Expression::Number(n) => Ok(Value::Number(n.value)),
        Expression::Str(s) => Ok(Value::String(s.value.clone())),
        Expression::Boolean(b) => Ok(Value::Boolean(b.value)),
        Expression::Nil(_) => Ok(Value::Nil),
        Expression::NaN(_) => Ok(Value::NaN),
        Expression::Infinity(_) => Ok(Value::Infinity(1)),
        Expression::Identifier(id) => env.get(&id.name).ok_or_else(|| {
            RuntimeError::new(id.line(), id.column(), format!("undefined variable: {}", id.name))
                .with_node(id.to_string())
                .into()
        }),
        Expression::Unary(u) => eval_unary_expression(u, env),
        Expression::Binary(b) => eval_binary_expression(b, env),
        Expression::Ternary(t) => eval_ternary_expression(t, env),
        Expression::Assignment(a) => eval_assignment_expression(a, env),
        Expression::FunctionLiteral(f) => Ok(Value::Function {
            params: f.parameters.clone(),
            body: f.body.clone(),
            env: env.clone(),
            name: None,
        }),
        Expression::Call(c) => eval_call_expression(c, env),
        Expression::ArrayLiteral(a) => eval_array_literal(a, env),
        Expression::Index(i) => eval_index_expression(i, env),
    }
}

fn eval_ternary_expression(expr: &TernaryExpression, env: &Rc<Environment>) -> EvalResult {
    let condition = eval_expression(&expr.condition, env)?;
    if condition.is_truthy() {
        eval_expression(&expr.consequence, env)
    } else {
        eval_expression(&expr.alternative, env)
    }
}

/// Overwrites wherever the identifier already resolves on the chain; errors
/// if it resolves nowhere.
fn eval_assignment_expression(expr: &AssignmentExpression, env: &Rc<Environment>) -> EvalResult {
    let value = eval_expression(&expr.value, env)?;
    if env.assign(&expr.name.name, value.clone()) {
        Ok(value)
    } else {
        Err(RuntimeError::new(
            expr.name.line(),
            expr.name.column(),
            format!("undefined variable: {}", expr.name.name),
        )
        .with_node(expr.to_string())
        .into())
    }
}

fn eval_unary_expression(expr: &UnaryExpression, env: &Rc<Environment>) -> EvalResult {
    let right = eval_expression(&expr.right, env)?;
    match expr.operator.kind {
        TokenKind::Bang => Ok(Value::Boolean(!right.is_truthy())),
        TokenKind::Minus => match right {
            Value::Number(n) => Ok(Value::Number(-n)),
            Value::Infinity(sign) => Ok(Value::Infinity(-sign)),
            Value::NaN => Ok(Value::NaN),
            other => Err(RuntimeError::new(
                expr.token.line,
                expr.token.column,
                format!("cannot negate a value of type {}", other.type_name()),
            )
            .with_node(expr.to_string())
            .into()),
        },
        other => unreachable!("unary parselet never produces operator {}", other),
    }
}

fn eval_binary_expression(expr: &BinaryExpression, env: &Rc<Environment>) -> EvalResult {
    let left = eval_expression(&expr.left, env)?;
    let right = eval_expression(&expr.right, env)?;
    let op = expr.operator.kind;

    // NaN poisons before any Inf/Num type dispatch happens.
    if matches!(left, Value::NaN) || matches!(right, Value::NaN) {
        return Ok(eval_nan_binary(op));
    }

    match (&left, &right) {
        (Value::Infinity(l), Value::Infinity(r)) => Ok(eval_inf_inf(op, *l, *r)),
        (Value::Infinity(l), Value::Number(r)) => Ok(eval_inf_num(op, *l, *r)),
        (Value::Number(l), Value::Infinity(r)) => Ok(eval_num_inf(op, *l, *r)),
        (Value::Number(l), Value::Number(r)) => Ok(eval_numeric_binary(op, *l, *r)),
        (Value::String(l), Value::String(r)) if op == TokenKind::Plus => {
            Ok(Value::String(format!("{}{}", l, r)))
        }
        _ => Err(RuntimeError::new(
            expr.token.line,
            expr.token.column,
            format!(
                "unsupported operand types for {}: {} and {}",
                op,
                left.type_name(),
                right.type_name()
            ),
        )
        .with_node(expr.to_string())
        .into()),
    }
}

fn eval_nan_binary(op: TokenKind) -> Value {
    use TokenKind::*;
    match op {
        Equal | Less | Greater | LessEqual | GreaterEqual => Value::Boolean(false),
        NotEqual => Value::Boolean(true),
        _ => Value::NaN,
    }
}

fn sign_from_number(n: f64) -> i8 {
    if n.is_sign_negative() {
        -1
    } else {
        1
    }
}

fn normalize(result: f64) -> Value {
    if result.is_nan() {
        Value::NaN
    } else if result.is_infinite() {
        Value::Infinity(if result > 0.0 { 1 } else { -1 })
    } else {
        Value::Number(result)
    }
}

fn eval_numeric_binary(op: TokenKind, l: f64, r: f64) -> Value {
    use TokenKind::*;
    match op {
        Plus => normalize(l + r),
        Minus => normalize(l - r),
        Star => normalize(l * r),
        Slash => normalize(l / r),
        Caret => normalize(l.powf(r)),
        Less => Value::Boolean(l < r),
        Greater => Value::Boolean(l > r),
        LessEqual => Value::Boolean(l <= r),
        GreaterEqual => Value::Boolean(l >= r),
        Equal => Value::Boolean(l == r),
        NotEqual => Value::Boolean(l != r),
        _ => Value::NaN,
    }
}

fn eval_inf_inf(op: TokenKind, l: i8, r: i8) -> Value {
    use TokenKind::*;
    match op {
        Plus => {
            if l == r {
                Value::Infinity(l)
            } else {
                Value::NaN
            }
        }
        Minus => {
            if l == r {
                Value::NaN
            } else {
                Value::Infinity(l)
            }
        }
        Star => Value::Infinity(l * r),
        Slash => Value::NaN,
        Caret => {
            if r < 0 {
                Value::Number(0.0)
            } else {
                Value::Infinity(1)
            }
        }
        Equal => Value::Boolean(l == r),
        NotEqual => Value::Boolean(l != r),
        Less => Value::Boolean(l < r),
        Greater => Value::Boolean(l > r),
        LessEqual => Value::Boolean(l <= r),
        GreaterEqual => Value::Boolean(l >= r),
        _ => Value::NaN,
    }
}

fn eval_inf_num(op: TokenKind, inf: i8, num: f64) -> Value {
    use TokenKind::*;
    match op {
        Plus => Value::Infinity(inf),
        Minus => Value::Infinity(inf),
        Star => {
            if num == 0.0 {
                Value::NaN
            } else {
                Value::Infinity(inf * sign_from_number(num))
            }
        }
        Slash => {
            if num == 0.0 {
                Value::Infinity(inf)
            } else {
                Value::Infinity(inf * sign_from_number(num))
            }
        }
        Caret => {
            if num == 0.0 {
                Value::Number(1.0)
            } else if num < 0.0 {
                Value::Number(0.0)
            } else if inf < 0 && num != num.floor() {
                Value::NaN
            } else if inf < 0 && (num as i64) % 2 == 0 {
                Value::Infinity(1)
            } else {
                Value::Infinity(inf)
            }
        }
        Equal => Value::Boolean(false),
        NotEqual => Value::Boolean(true),
        Less => Value::Boolean(inf < 0),
        Greater => Value::Boolean(inf > 0),
        LessEqual => Value::Boolean(inf < 0),
        GreaterEqual => Value::Boolean(inf > 0),
        _ => Value::NaN,
    }
}

fn eval_num_inf(op: TokenKind, num: f64, inf: i8) -> Value {
    use TokenKind::*;
    match op {
        Plus => Value::Infinity(inf),
        Minus => Value::Infinity(-inf),
        Star => {
            if num == 0.0 {
                Value::NaN
            } else {
                Value::Infinity(inf * sign_from_number(num))
            }
        }
        Slash => Value::Number(0.0_f64.copysign(num)),
        Caret => {
            let abs_num = num.abs();
            if num == 0.0 {
                if inf > 0 {
                    Value::Number(0.0)
                } else {
                    Value::Infinity(1)
                }
            } else if abs_num == 1.0 {
                if num == 1.0 {
                    Value::Number(1.0)
                } else {
                    Value::NaN
                }
            } else if inf > 0 {
                if abs_num < 1.0 {
                    Value::Number(0.0)
                } else {
                    Value::Infinity(sign_from_number(num))
                }
            } else if abs_num < 1.0 {
                Value::Infinity(1)
            } else {
                Value::Number(0.0)
            }
        }
        Equal => Value::Boolean(false),
        NotEqual => Value::Boolean(true),
        Less => Value::Boolean(inf > 0),
        Greater => Value::Boolean(inf < 0),
        LessEqual => Value::Boolean(inf > 0),
        GreaterEqual => Value::Boolean(inf < 0),
        _ => Value::NaN,
    }
}

fn eval_array_literal(expr: &ArrayLiteral, env: &Rc<Environment>) -> EvalResult {
    let mut elements = Vec::with_capacity(expr.elements.len());
    for element in &expr.elements {
        elements.push(eval_expression(element, env)?);
    }
    Ok(Value::Array(elements))
}

fn eval_index_expression(expr: &IndexExpression, env: &Rc<Environment>) -> EvalResult {
    let target = eval_expression(&expr.target, env)?;
    let index = eval_expression(&expr.index, env)?;
    match (&target, &index) {
        (Value::Array(items), Value::Number(n)) => {
            let i = *n as i64;
            if i < 0 || i as usize >= items.len() {
                Err(RuntimeError::new(
                    expr.token.line,
                    expr.token.column,
                    format!("index {} out of bounds for array of length {}", i, items.len()),
                )
                .with_node(expr.to_string())
                .into())
            } else {
                Ok(items[i as usize].clone())
            }
        }
        _ => Err(RuntimeError::new(
            expr.token.line,
            expr.token.column,
            format!(
                "cannot index a value of type {} with a value of type {}",
                target.type_name(),
                index.type_name()
            ),
        )
        .with_node(expr.to_string())
        .into()),
    }
}

fn eval_call_expression(expr: &CallExpression, env: &Rc<Environment>) -> EvalResult {
    let callee = match expr.function.as_ref() {
        Expression::Identifier(id) => env.get(&id.name).ok_or_else(|| {
            Flow::from(
                RuntimeError::new(id.line(), id.column(), format!("undefined variable: {}", id.name))
                    .with_node(id.to_string()),
            )
        })?,
        other => eval_expression(other, env)?,
    };

    let mut args = Vec::with_capacity(expr.arguments.len());
    for arg in &expr.arguments {
        args.push(eval_expression(arg, env)?);
    }

    apply_function(&callee, expr, &args)
}

fn apply_function(callee: &Value, call_node: &CallExpression, args: &[Value]) -> EvalResult {
    match callee {
        Value::Function { params, body, env: captured, .. } => {
            if params.len() != args.len() {
                return Err(RuntimeError::new(
                    call_node.token.line,
                    call_node.token.column,
                    format!("expected {} argument(s), got {}", params.len(), args.len()),
                )
                .with_node(call_node.to_string())
                .into());
            }
            let frame = Environment::with_outer(captured.clone());
            for (param, arg) in params.iter().zip(args.iter()) {
                frame.declare(param.name.clone(), arg.clone());
            }
            match eval_block(&body.statements, &frame) {
                Ok(value) => Ok(value),
                Err(Flow::Return(value)) => Ok(value),
                Err(err @ Flow::Error(_)) => Err(err),
            }
        }
        Value::NativeFunction(native) => {
            native(call_node, args).map_err(Flow::Error)
        }
        other => Err(RuntimeError::new(
            call_node.token.line,
            call_node.token.column,
            format!("cannot call a value of type {}", other.type_name()),
        )
        .with_node(call_node.to_string())
        .into()),
    }
}

use tracing::debug;

use crate::parser::{self, Expr};
use crate::types::{EvalError, Session, Value};

/// Something that executes a completed statement.
///
/// The shell owns the [`Session`] and passes it in on every call; the
/// evaluator keeps no session state of its own.
pub trait Evaluator {
    fn evaluate(&mut self, session: &mut Session, text: &str) -> Result<Value, EvalError>;
}

impl<F> Evaluator for F
where
    F: FnMut(&mut Session, &str) -> Result<Value, EvalError>,
{
    fn evaluate(&mut self, session: &mut Session, text: &str) -> Result<Value, EvalError> {
        self(session, text)
    }
}

/// The built-in evaluator: integers, booleans, arrays, variables and
/// `if`/`unless`/`begin` blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Calculator
    }
}

impl Evaluator for Calculator {
    fn evaluate(&mut self, session: &mut Session, text: &str) -> Result<Value, EvalError> {
        let program = parser::parse(text)?;
        debug!(statements = program.len(), "evaluating");
        eval_body(session, &program)
    }
}

// ========== Tree walking ==========

/// Value of the last statement, or `nil` for an empty body.
fn eval_body(session: &mut Session, body: &[Expr]) -> Result<Value, EvalError> {
    let mut last = Value::Nil;
    for expr in body {
        last = eval_expr(session, expr)?;
    }
    Ok(last)
}

fn eval_expr(session: &mut Session, expr: &Expr) -> Result<Value, EvalError> {
    match expr {
        Expr::Lit(v) => Ok(v.clone()),
        Expr::Var(name) => session.vars.get(name).cloned().ok_or_else(|| {
            EvalError::new(
                "NameError",
                format!("undefined local variable or method '{}'", name),
            )
        }),
        Expr::Assign(name, value) => {
            let v = eval_expr(session, value)?;
            session.vars.insert(name.clone(), v.clone());
            Ok(v)
        }
        Expr::Array(items) => items
            .iter()
            .map(|item| eval_expr(session, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Unary(op, operand) => {
            let v = eval_expr(session, operand)?;
            match (*op, v) {
                ("!", v) => Ok(Value::Bool(!v.is_truthy())),
                ("-", Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(overflow),
                (op, v) => Err(EvalError::new(
                    "NoMethodError",
                    format!("undefined method '{}@' for {}", op, v.type_name()),
                )),
            }
        }
        Expr::Binary("&&", lhs, rhs) => {
            let l = eval_expr(session, lhs)?;
            if l.is_truthy() {
                eval_expr(session, rhs)
            } else {
                Ok(l)
            }
        }
        Expr::Binary("||", lhs, rhs) => {
            let l = eval_expr(session, lhs)?;
            if l.is_truthy() {
                Ok(l)
            } else {
                eval_expr(session, rhs)
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = eval_expr(session, lhs)?;
            let r = eval_expr(session, rhs)?;
            binary_op(op, l, r)
        }
        Expr::If(arms, otherwise) => {
            for (cond, body) in arms {
                if eval_expr(session, cond)?.is_truthy() {
                    return eval_body(session, body);
                }
            }
            match otherwise {
                Some(body) => eval_body(session, body),
                None => Ok(Value::Nil),
            }
        }
        Expr::Block(body) => eval_body(session, body),
    }
}

fn overflow() -> EvalError {
    EvalError::new("RangeError", "integer overflow")
}

fn binary_op(op: &str, l: Value, r: Value) -> Result<Value, EvalError> {
    match (op, l, r) {
        ("==", l, r) => Ok(Value::Bool(l == r)),
        ("!=", l, r) => Ok(Value::Bool(l != r)),
        ("+", Value::Array(mut a), Value::Array(b)) => {
            a.extend(b);
            Ok(Value::Array(a))
        }
        (op, Value::Int(a), Value::Int(b)) => int_op(op, a, b),
        (_, Value::Int(_), r) => Err(EvalError::new(
            "TypeError",
            format!("{} can't be coerced into Integer", r.type_name()),
        )),
        (op, l, _) => Err(EvalError::new(
            "NoMethodError",
            format!("undefined method '{}' for {}", op, l.type_name()),
        )),
    }
}

fn int_op(op: &str, a: i64, b: i64) -> Result<Value, EvalError> {
    let checked = |v: Option<i64>| v.map(Value::Int).ok_or_else(overflow);
    match op {
        "+" => checked(a.checked_add(b)),
        "-" => checked(a.checked_sub(b)),
        "*" => checked(a.checked_mul(b)),
        "/" | "%" if b == 0 => Err(EvalError::new("ZeroDivisionError", "divided by 0")),
        "/" => checked(floor_div(a, b)),
        "%" => checked(floor_mod(a, b)),
        "<" => Ok(Value::Bool(a < b)),
        "<=" => Ok(Value::Bool(a <= b)),
        ">" => Ok(Value::Bool(a > b)),
        ">=" => Ok(Value::Bool(a >= b)),
        _ => Err(EvalError::new(
            "NoMethodError",
            format!("undefined method '{}' for Integer", op),
        )),
    }
}

/// Integer division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

/// Remainder with the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

//! Stateless filter math.
//!
//! Numeric semantics:
//! - **Arithmetic**: `plus`, `minus`, `times`, `divided by` (division by zero is unknown)
//! - **Logic**: `and`, `or`, `xor`, `nand`, `not`; non-zero is true, results are 1 or 0
//! - **Comparison**: `equals`, `not equals`, `less than`, `greater than`
//! - **Absolute value**
//!
//! Arrays are handled element-wise; a scalar operand is broadcast against an
//! array. Any unknown or non-finite result is `None`.
//!
//! Image filters pass the payload through unchanged; the device performs the
//! actual image processing.

use fl_core::{Real, Tolerances, nearly_equal};
use fl_graph::{FilterKind, Value};

fn truth(v: Real) -> bool {
    v != 0.0
}

fn flag(b: bool) -> Real {
    if b { 1.0 } else { 0.0 }
}

fn finite(v: Real) -> Option<Real> {
    v.is_finite().then_some(v)
}

/// Apply a single-input numeric filter to one number.
pub fn apply_unary(kind: FilterKind, x: Real) -> Option<Real> {
    match kind {
        FilterKind::Not => Some(flag(!truth(x))),
        FilterKind::AbsoluteValue => finite(x.abs()),
        _ => None,
    }
}

/// Apply a two-input numeric filter to a pair of numbers.
pub fn apply_binary(kind: FilterKind, a: Real, b: Real, tol: Tolerances) -> Option<Real> {
    match kind {
        FilterKind::Plus => finite(a + b),
        FilterKind::Minus => finite(a - b),
        FilterKind::Times => finite(a * b),
        FilterKind::DividedBy => {
            if b == 0.0 {
                None
            } else {
                finite(a / b)
            }
        }
        FilterKind::And => Some(flag(truth(a) && truth(b))),
        FilterKind::Or => Some(flag(truth(a) || truth(b))),
        FilterKind::Xor => Some(flag(truth(a) != truth(b))),
        FilterKind::Nand => Some(flag(!(truth(a) && truth(b)))),
        FilterKind::Equals => Some(flag(nearly_equal(a, b, tol))),
        FilterKind::NotEquals => Some(flag(!nearly_equal(a, b, tol))),
        FilterKind::LessThan => Some(flag(a < b)),
        FilterKind::GreaterThan => Some(flag(a > b)),
        _ => None,
    }
}

fn map_unary(kind: FilterKind, v: &Value) -> Option<Value> {
    match v {
        Value::Number(x) => apply_unary(kind, *x).map(Value::Number),
        Value::Array(xs) => xs
            .iter()
            .map(|x| apply_unary(kind, *x))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        Value::Image(_) => None,
    }
}

fn map_binary(kind: FilterKind, a: &Value, b: &Value, tol: Tolerances) -> Option<Value> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => apply_binary(kind, *x, *y, tol).map(Value::Number),
        (Value::Array(xs), Value::Number(y)) => xs
            .iter()
            .map(|x| apply_binary(kind, *x, *y, tol))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (Value::Number(x), Value::Array(ys)) => ys
            .iter()
            .map(|y| apply_binary(kind, *x, *y, tol))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (Value::Array(xs), Value::Array(ys)) if xs.len() == ys.len() => xs
            .iter()
            .zip(ys)
            .map(|(x, y)| apply_binary(kind, *x, *y, tol))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        _ => None,
    }
}

/// Evaluate a stateless filter over its input values. Moving averages keep
/// per-block state and are evaluated by the `Evaluator` instead.
pub fn evaluate(kind: FilterKind, inputs: &[Option<Value>], tol: Tolerances) -> Option<Value> {
    match kind {
        FilterKind::Blur | FilterKind::Brightness => match inputs.first() {
            Some(Some(v @ Value::Image(_))) => Some(v.clone()),
            _ => None,
        },
        FilterKind::SimpleMovingAverage | FilterKind::ExponentialMovingAverage => None,
        k if k.is_unary() => inputs.first()?.as_ref().and_then(|v| map_unary(k, v)),
        k => {
            let a = inputs.first()?.as_ref()?;
            let b = inputs.get(1)?.as_ref()?;
            map_binary(k, a, b, tol)
        }
    }
}

//! Binary, unary and comparison operators on runtime values.
//!
//! Dispatch is a direct match on the operand pair. Integer arithmetic is
//! checked, so overflow is an `OverflowError` instead of a wrap. Division
//! follows Python: `/` always yields a float, `//` and `%` floor toward
//! negative infinity. Bools take part in arithmetic as 0 and 1.

use std::cmp::Ordering;

use sling_ir::{BinaryOp, CompareOp, UnaryOp};
use sling_value::errors::{
    division_by_zero, integer_overflow, modulo_by_zero, type_error, unsupported_operand,
    value_error,
};
use sling_value::{EvalError, EvalResult, Value};

/// Longest sequence `*` may build.
const MAX_REPEAT_LEN: usize = 1 << 28;

/// Numeric view of an operand.
#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Num> {
        match value {
            Value::Int(n) => Some(Num::Int(*n)),
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    #[expect(clippy::cast_precision_loss, reason = "mixed arithmetic widens to float")]
    fn to_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(f) => f,
        }
    }
}

#[inline]
fn checked_arith(result: Option<i64>, op_name: &'static str) -> EvalResult {
    result.map(Value::Int).ok_or_else(|| integer_overflow(op_name))
}

fn unsupported(left: &Value, right: &Value, op: BinaryOp) -> EvalError {
    unsupported_operand(op.as_symbol(), left.type_name(), right.type_name())
}

/// Evaluate `left op right`.
pub fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    if let (Some(l), Some(r)) = (Num::of(left), Num::of(right)) {
        return match (l, r) {
            (Num::Int(a), Num::Int(b)) => eval_int_binary(a, b, op),
            _ => eval_float_binary(l.to_f64(), r.to_f64(), op)
                .unwrap_or_else(|| Err(unsupported(left, right, op))),
        };
    }
    match (left, right, op) {
        (Value::Str(a), Value::Str(b), BinaryOp::Add) => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::string(joined))
        }
        (Value::Str(s), Value::Int(n), BinaryOp::Mul)
        | (Value::Int(n), Value::Str(s), BinaryOp::Mul) => {
            let count = repeat_count(*n, s.len())?;
            Ok(Value::string(s.repeat(count)))
        }
        (Value::List(a), Value::List(b), BinaryOp::Add) => {
            let mut items = a.read().clone();
            items.extend(b.read().iter().cloned());
            Ok(Value::list(items))
        }
        (Value::List(items), Value::Int(n), BinaryOp::Mul)
        | (Value::Int(n), Value::List(items), BinaryOp::Mul) => {
            let items = items.read().clone();
            let count = repeat_count(*n, items.len())?;
            Ok(Value::list(repeat_items(&items, count)))
        }
        (Value::Tuple(a), Value::Tuple(b), BinaryOp::Add) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (Value::Tuple(items), Value::Int(n), BinaryOp::Mul)
        | (Value::Int(n), Value::Tuple(items), BinaryOp::Mul) => {
            let count = repeat_count(*n, items.len())?;
            Ok(Value::tuple(repeat_items(items, count)))
        }
        _ => Err(unsupported(left, right, op)),
    }
}

/// Repetition count for `seq * n`; negative counts give an empty result.
fn repeat_count(n: i64, len: usize) -> Result<usize, EvalError> {
    let count = usize::try_from(n.max(0)).unwrap_or(usize::MAX);
    match len.checked_mul(count) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(count),
        _ => Err(value_error("repeated sequence is too large")),
    }
}

fn repeat_items(items: &[Value], count: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend_from_slice(items);
    }
    out
}

fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Add => checked_arith(a.checked_add(b), "addition"),
        BinaryOp::Sub => checked_arith(a.checked_sub(b), "subtraction"),
        BinaryOp::Mul => checked_arith(a.checked_mul(b), "multiplication"),
        BinaryOp::Div => {
            if b == 0 {
                return Err(division_by_zero());
            }
            Ok(Value::Float(Num::Int(a).to_f64() / Num::Int(b).to_f64()))
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(division_by_zero());
            }
            checked_arith(floor_div(a, b), "division")
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(modulo_by_zero());
            }
            Ok(Value::Int(floor_mod(a, b)))
        }
        BinaryOp::Pow => int_pow(a, b),
        BinaryOp::BitAnd => Ok(Value::Int(a & b)),
        BinaryOp::BitOr => Ok(Value::Int(a | b)),
        BinaryOp::BitXor => Ok(Value::Int(a ^ b)),
        BinaryOp::Shl => shift_left(a, b),
        BinaryOp::Shr => shift_right(a, b),
    }
}

fn floor_div(a: i64, b: i64) -> Option<i64> {
    let quotient = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

/// Remainder with the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a.checked_rem(b).unwrap_or(0);
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

fn int_pow(base: i64, exp: i64) -> EvalResult {
    if exp >= 0 {
        let result = u32::try_from(exp).ok().and_then(|e| base.checked_pow(e));
        return checked_arith(result, "exponentiation");
    }
    if base == 0 {
        return Err(EvalError::exception(
            "ZeroDivisionError",
            "0.0 cannot be raised to a negative power",
        ));
    }
    Ok(Value::Float(
        Num::Int(base).to_f64().powf(Num::Int(exp).to_f64()),
    ))
}

fn shift_left(a: i64, b: i64) -> EvalResult {
    if b < 0 {
        return Err(value_error("negative shift count"));
    }
    if a == 0 {
        return Ok(Value::Int(0));
    }
    let shifted = u32::try_from(b)
        .ok()
        .filter(|&s| s < 64)
        .map(|s| (a << s, s))
        .filter(|&(r, s)| r >> s == a)
        .map(|(r, _)| r);
    checked_arith(shifted, "left shift")
}

fn shift_right(a: i64, b: i64) -> EvalResult {
    if b < 0 {
        return Err(value_error("negative shift count"));
    }
    match u32::try_from(b) {
        Ok(s) if s < 64 => Ok(Value::Int(a >> s)),
        _ => Ok(Value::Int(if a < 0 { -1 } else { 0 })),
    }
}

/// Float arithmetic; `None` for operators floats do not support.
fn eval_float_binary(a: f64, b: f64, op: BinaryOp) -> Option<EvalResult> {
    let result = match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div if b == 0.0 => Err(EvalError::exception(
            "ZeroDivisionError",
            "float division by zero",
        )),
        BinaryOp::Div => Ok(Value::Float(a / b)),
        BinaryOp::FloorDiv if b == 0.0 => Err(EvalError::exception(
            "ZeroDivisionError",
            "float floor division by zero",
        )),
        BinaryOp::FloorDiv => Ok(Value::Float((a / b).floor())),
        BinaryOp::Mod if b == 0.0 => Err(EvalError::exception(
            "ZeroDivisionError",
            "float modulo",
        )),
        BinaryOp::Mod => {
            let r = a % b;
            Ok(Value::Float(if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }))
        }
        BinaryOp::Pow => Ok(Value::Float(a.powf(b))),
        BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::Shl
        | BinaryOp::Shr => return None,
    };
    Some(result)
}

/// Evaluate a unary operator.
pub fn evaluate_unary(operand: &Value, op: UnaryOp) -> EvalResult {
    match (op, operand) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => checked_arith(n.checked_neg(), "negation"),
        (UnaryOp::Neg, Value::Bool(b)) => Ok(Value::Int(-i64::from(*b))),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Value::Int(_) | Value::Float(_)) => Ok(operand.clone()),
        (UnaryOp::Pos, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
        (UnaryOp::Invert, Value::Int(n)) => Ok(Value::Int(!n)),
        (UnaryOp::Invert, Value::Bool(b)) => Ok(Value::Int(!i64::from(*b))),
        _ => Err(type_error(format!(
            "bad operand type for unary {}: '{}'",
            op.as_symbol(),
            operand.type_name()
        ))),
    }
}

/// Ordering for `<`-family comparisons.
///
/// `Ok(None)` means the values are comparable but unordered (NaN).
/// Sequences compare lexicographically.
pub fn partial_order(left: &Value, right: &Value, symbol: &str) -> Result<Option<Ordering>, EvalError> {
    if let (Some(l), Some(r)) = (Num::of(left), Num::of(right)) {
        return Ok(match (l, r) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            _ => l.to_f64().partial_cmp(&r.to_f64()),
        });
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some((**a).cmp(&**b))),
        (Value::List(a), Value::List(b)) => {
            let (a, b) = (a.read().clone(), b.read().clone());
            sequence_order(&a, &b, symbol)
        }
        (Value::Tuple(a), Value::Tuple(b)) => sequence_order(a, b, symbol),
        _ => Err(type_error(format!(
            "'{symbol}' not supported between instances of '{}' and '{}'",
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn sequence_order(a: &[Value], b: &[Value], symbol: &str) -> Result<Option<Ordering>, EvalError> {
    for (x, y) in a.iter().zip(b) {
        if !x.equals(y) {
            return partial_order(x, y, symbol);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

/// Evaluate one comparison link.
pub fn evaluate_compare(left: &Value, right: &Value, op: CompareOp) -> Result<bool, EvalError> {
    let ordered = |accept: fn(Ordering) -> bool| -> Result<bool, EvalError> {
        Ok(partial_order(left, right, op.as_symbol())?.is_some_and(accept))
    };
    match op {
        CompareOp::Eq => Ok(left.equals(right)),
        CompareOp::NotEq => Ok(!left.equals(right)),
        CompareOp::Lt => ordered(Ordering::is_lt),
        CompareOp::LtEq => ordered(Ordering::is_le),
        CompareOp::Gt => ordered(Ordering::is_gt),
        CompareOp::GtEq => ordered(Ordering::is_ge),
        CompareOp::In => contains(right, left),
        CompareOp::NotIn => contains(right, left).map(|found| !found),
        CompareOp::Is => Ok(left.is_same(right)),
        CompareOp::IsNot => Ok(!left.is_same(right)),
    }
}

/// Membership test for `item in container`.
pub(crate) fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(&**needle)),
            other => Err(type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => {
            let items = items.read().clone();
            Ok(items.iter().any(|v| v.equals(item)))
        }
        Value::Tuple(items) => Ok(items.iter().any(|v| v.equals(item))),
        Value::Dict(map) => {
            let key = item.dict_key()?;
            Ok(map.read().contains_key(&key))
        }
        other => Err(type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests;

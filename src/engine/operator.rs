// SPDX-License-Identifier: MIT

//! Operator semantics over already-evaluated operands
//!
//! Both entry points are pure: they look only at the operator and the operand
//! values, and every failure is a typed [`EvalError`].

use super::ast::{BinaryOp, UnaryOp};
use super::value::{Value, ValueType};
use crate::error::{EvalError, Side};
use regex::Regex;
use std::cmp::Ordering;

/// Apply a unary operator
pub fn apply_unary(op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => {
            let b = boolean(op.symbol(), Side::Operand, operand)?;
            Ok(Value::Bool(!b))
        }
    }
}

/// Apply a binary operator
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        BinaryOp::Lt => compare(op, left, right, Ordering::is_lt),
        BinaryOp::Lte => compare(op, left, right, Ordering::is_le),
        BinaryOp::Gt => compare(op, left, right, Ordering::is_gt),
        BinaryOp::Gte => compare(op, left, right, Ordering::is_ge),
        BinaryOp::And => logical(op, left, right, |a, b| a && b),
        BinaryOp::Or => logical(op, left, right, |a, b| a || b),
        BinaryOp::Xor => logical(op, left, right, |a, b| a != b),
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Mod
        | BinaryOp::Pow => arithmetic(op, left, right),
        BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::Shl
        | BinaryOp::Shr => bitwise(op, left, right),
        BinaryOp::In => membership(left, right),
        BinaryOp::Contains => contains(left, right),
        BinaryOp::StartsWith => string_predicate(op, left, right, |s, p| s.starts_with(p)),
        BinaryOp::EndsWith => string_predicate(op, left, right, |s, p| s.ends_with(p)),
        BinaryOp::Matches => matches_pattern(left, right),
    }
}

fn type_mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch {
        operator: op.symbol(),
        left: left.value_type(),
        right: right.value_type(),
    }
}

fn boolean(operator: &'static str, side: Side, value: &Value) -> Result<bool, EvalError> {
    value.as_bool().ok_or(EvalError::NonBooleanOperand {
        operator,
        side,
        found: value.value_type(),
    })
}

fn logical(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    combine: fn(bool, bool) -> bool,
) -> Result<Value, EvalError> {
    let a = boolean(op.symbol(), Side::Left, left)?;
    let b = boolean(op.symbol(), Side::Right, right)?;
    Ok(Value::Bool(combine(a, b)))
}

fn compare(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    accept: fn(Ordering) -> bool,
) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ if left.is_integer() && right.is_integer() => left
            .as_i128()
            .zip(right.as_i128())
            .map(|(a, b)| a.cmp(&b)),
        _ if left.is_numeric() && right.is_numeric() => left
            .as_f64()
            .zip(right.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b)),
        _ => return Err(type_mismatch(op, left, right)),
    };
    // NaN is unordered: every ordering comparison with it is false
    Ok(Value::Bool(ordering.is_some_and(accept)))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if op == BinaryOp::Add && (left.as_str().is_some() || right.as_str().is_some()) {
        return Ok(Value::String(format!("{}{}", left, right)));
    }

    let negative_exponent = op == BinaryOp::Pow && right.as_i128().is_some_and(|e| e < 0);
    if !negative_exponent {
        if let Some(result) = same_width_integers(op, left, right) {
            return result;
        }
    }

    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => float_arithmetic(op, a, b).map(Value::Float64),
        _ => Err(type_mismatch(op, left, right)),
    }
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> Result<f64, EvalError> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Sub => Ok(a - b),
        BinaryOp::Mul => Ok(a * b),
        BinaryOp::Div if b == 0.0 => Err(EvalError::DivisionByZero),
        BinaryOp::Div => Ok(a / b),
        BinaryOp::Mod if b == 0.0 => Err(EvalError::ModuloByZero),
        BinaryOp::Mod => Ok(a % b),
        BinaryOp::Pow => Ok(a.powf(b)),
        _ => Err(EvalError::TypeMismatch {
            operator: op.symbol(),
            left: ValueType::Float64,
            right: ValueType::Float64,
        }),
    }
}

fn bitwise(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    same_width_integers(op, left, right).unwrap_or_else(|| Err(type_mismatch(op, left, right)))
}

/// Integer arithmetic when both operands have the same integer type, `None` otherwise
fn same_width_integers(op: BinaryOp, left: &Value, right: &Value) -> Option<Result<Value, EvalError>> {
    macro_rules! dispatch {
        ($($variant:ident),*) => {
            match (left, right) {
                $(
                    (Value::$variant(a), Value::$variant(b)) => {
                        Some(integer_op(op, *a, *b).map(Value::$variant))
                    }
                )*
                _ => None,
            }
        };
    }

    dispatch!(Int8, Int16, Int32, Int64, Uint8, Uint16, Uint32, Uint64)
}

/// Checked operations shared by every integer width
trait Integer: Copy + PartialEq {
    const ZERO: Self;
    const TYPE: ValueType;

    fn checked_add(self, rhs: Self) -> Option<Self>;
    fn checked_sub(self, rhs: Self) -> Option<Self>;
    fn checked_mul(self, rhs: Self) -> Option<Self>;
    fn checked_div(self, rhs: Self) -> Option<Self>;
    fn checked_rem(self, rhs: Self) -> Option<Self>;
    fn checked_pow(self, rhs: Self) -> Option<Self>;
    fn checked_shl(self, rhs: Self) -> Option<Self>;
    fn checked_shr(self, rhs: Self) -> Option<Self>;
    fn bit_and(self, rhs: Self) -> Self;
    fn bit_or(self, rhs: Self) -> Self;
    fn bit_xor(self, rhs: Self) -> Self;
}

macro_rules! impl_integer {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl Integer for $ty {
                const ZERO: Self = 0;
                const TYPE: ValueType = ValueType::$tag;

                fn checked_add(self, rhs: Self) -> Option<Self> {
                    <$ty>::checked_add(self, rhs)
                }
                fn checked_sub(self, rhs: Self) -> Option<Self> {
                    <$ty>::checked_sub(self, rhs)
                }
                fn checked_mul(self, rhs: Self) -> Option<Self> {
                    <$ty>::checked_mul(self, rhs)
                }
                fn checked_div(self, rhs: Self) -> Option<Self> {
                    <$ty>::checked_div(self, rhs)
                }
                fn checked_rem(self, rhs: Self) -> Option<Self> {
                    <$ty>::checked_rem(self, rhs)
                }
                fn checked_pow(self, rhs: Self) -> Option<Self> {
                    u32::try_from(rhs).ok().and_then(|exp| <$ty>::checked_pow(self, exp))
                }
                fn checked_shl(self, rhs: Self) -> Option<Self> {
                    u32::try_from(rhs).ok().and_then(|n| <$ty>::checked_shl(self, n))
                }
                fn checked_shr(self, rhs: Self) -> Option<Self> {
                    u32::try_from(rhs).ok().and_then(|n| <$ty>::checked_shr(self, n))
                }
                fn bit_and(self, rhs: Self) -> Self {
                    self & rhs
                }
                fn bit_or(self, rhs: Self) -> Self {
                    self | rhs
                }
                fn bit_xor(self, rhs: Self) -> Self {
                    self ^ rhs
                }
            }
        )*
    };
}

impl_integer! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
}

fn integer_op<T: Integer>(op: BinaryOp, a: T, b: T) -> Result<T, EvalError> {
    let overflow = || EvalError::Overflow {
        operator: op.symbol(),
    };

    match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow),
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow),
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow),
        BinaryOp::Div if b == T::ZERO => Err(EvalError::DivisionByZero),
        BinaryOp::Div => a.checked_div(b).ok_or_else(overflow),
        BinaryOp::Mod if b == T::ZERO => Err(EvalError::ModuloByZero),
        BinaryOp::Mod => a.checked_rem(b).ok_or_else(overflow),
        BinaryOp::Pow => a.checked_pow(b).ok_or_else(overflow),
        BinaryOp::BitAnd => Ok(a.bit_and(b)),
        BinaryOp::BitOr => Ok(a.bit_or(b)),
        BinaryOp::BitXor => Ok(a.bit_xor(b)),
        BinaryOp::Shl => a.checked_shl(b).ok_or_else(overflow),
        BinaryOp::Shr => a.checked_shr(b).ok_or_else(overflow),
        _ => Err(EvalError::TypeMismatch {
            operator: op.symbol(),
            left: T::TYPE,
            right: T::TYPE,
        }),
    }
}

fn membership(needle: &Value, haystack: &Value) -> Result<Value, EvalError> {
    let found = match haystack {
        Value::Array(items) | Value::Set(items) => items.iter().any(|item| item == needle),
        Value::Map(entries) | Value::Struct(entries) => {
            needle.as_str().is_some_and(|key| entries.contains_key(key))
        }
        Value::String(text) => needle.as_str().is_some_and(|s| text.contains(s)),
        _ => return Err(type_mismatch(BinaryOp::In, needle, haystack)),
    };
    Ok(Value::Bool(found))
}

fn contains(left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Array(items) | Value::Set(items), _) => {
            Ok(Value::Bool(items.iter().any(|item| item == right)))
        }
        (Value::String(text), Value::String(part)) => Ok(Value::Bool(text.contains(part.as_str()))),
        _ => Err(type_mismatch(BinaryOp::Contains, left, right)),
    }
}

fn string_predicate(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    test: fn(&str, &str) -> bool,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::String(text), Value::String(part)) => Ok(Value::Bool(test(text, part))),
        _ => Err(type_mismatch(op, left, right)),
    }
}

fn matches_pattern(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (Value::String(text), Value::String(pattern)) = (left, right) else {
        return Err(type_mismatch(BinaryOp::Matches, left, right));
    };
    let regex = Regex::new(pattern).map_err(|e| EvalError::InvalidPattern {
        pattern: pattern.clone(),
        message: e.to_string(),
    })?;
    Ok(Value::Bool(regex.is_match(text)))
}

use crate::value::Value;
use std::cmp::Ordering;

///
/// Numeric view used for cross-variant comparisons.
///

#[derive(Clone, Copy)]
enum Numeric {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl Numeric {
    const fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(Self::Int(*v)),
            Value::Uint(v) => Some(Self::Uint(*v)),
            Value::Float(v) => Some(Self::Float(*v)),
            _ => None,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn cmp(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(&b)),
            (Self::Uint(a), Self::Uint(b)) => Some(a.cmp(&b)),
            (Self::Int(a), Self::Uint(b)) => Some(match u64::try_from(a) {
                Ok(a) => a.cmp(&b),
                Err(_) => Ordering::Less,
            }),
            (Self::Uint(a), Self::Int(b)) => Some(match u64::try_from(b) {
                Ok(b) => a.cmp(&b),
                Err(_) => Ordering::Greater,
            }),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(&b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(b as f64)),
            (Self::Float(a), Self::Uint(b)) => a.partial_cmp(&(b as f64)),
            (Self::Int(a), Self::Float(b)) => (a as f64).partial_cmp(&b),
            (Self::Uint(a), Self::Float(b)) => (a as f64).partial_cmp(&b),
        }
    }
}

///
/// Equality with numeric widening.
///
/// `Null` equals only `Null`. Returns `None` for mismatched, incomparable
/// variants so callers can decide how an invalid comparison evaluates.
///
#[must_use]
pub fn compare_eq(left: &Value, right: &Value) -> Option<bool> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(true),
        (Value::Null, _) | (_, Value::Null) => Some(false),
        (Value::Bool(a), Value::Bool(b)) => Some(a == b),
        (Value::Text(a), Value::Text(b)) => Some(a == b),
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return Some(false);
            }
            for (x, y) in a.iter().zip(b) {
                if !compare_eq(x, y)? {
                    return Some(false);
                }
            }
            Some(true)
        }
        _ => {
            let (a, b) = (Numeric::of(left)?, Numeric::of(right)?);
            a.cmp(b).map(Ordering::is_eq)
        }
    }
}

///
/// Ordering with numeric widening.
///
/// Comparisons involving `Null`, lists, or mismatched variants are not
/// ordered and return `None`.
///
#[must_use]
pub fn compare_order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        _ => Numeric::of(left)?.cmp(Numeric::of(right)?),
    }
}

/// Total comparator used when sorting rows.
///
/// Ordering rules:
/// 1. Canonical variant rank (`Null` sorts first)
/// 2. Variant-specific comparison for same-ranked values
///
/// Numeric variants share one rank so `Int(2)` sorts before `Float(2.5)`.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = rank(left).cmp(&rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    match (left, right) {
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b) {
                let ord = canonical_cmp(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
        (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
        _ => compare_order(left, right).unwrap_or(Ordering::Equal),
    }
}

const fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Uint(_) | Value::Float(_) => 2,
        Value::Text(_) => 3,
        Value::List(_) => 4,
    }
}

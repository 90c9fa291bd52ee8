use crate::{
    error::ErrorClass,
    expr::ast::{BinaryOp, Expr, Lambda, Method, Param, UnaryOp},
    model::{FieldKind, FieldType},
    traits::FieldValues,
    value::{Value, compare_eq, compare_order},
};
use std::cmp::Ordering;
use thiserror::Error as ThisError;

///
/// EvalError
///
/// Shape failures while evaluating an AST. Invalid comparisons are not
/// errors; they evaluate as non-matches.
///

#[derive(Debug, ThisError)]
pub enum EvalError {
    #[error("lambda over {expected} applied to a {found} record")]
    ParameterMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("parameter `{name}` is not bound")]
    UnboundParameter { name: &'static str },

    #[error("unknown field '{field}' on {record}")]
    UnknownField { record: &'static str, field: String },

    #[error("expected {expected}, found `{found}`")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("cannot convert {value} to {ty} without loss")]
    LossyConversion { value: Value, ty: FieldType },

    #[error("null value unwrapped in `{expr}`")]
    NullUnwrap { expr: String },

    #[error("arithmetic overflow in `{expr}`")]
    Overflow { expr: String },

    #[error("division by zero in `{expr}`")]
    DivideByZero { expr: String },

    #[error("unsupported expression `{expr}`")]
    Unsupported { expr: String },
}

impl EvalError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Unsupported { .. } => ErrorClass::Unsupported,
            _ => ErrorClass::InvariantViolation,
        }
    }

    fn type_mismatch(expected: &'static str, found: &Operand<'_>) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.describe(),
        }
    }
}

///
/// Operand
///
/// Intermediate result: a scalar, a (possibly null) nested record, or a
/// record collection.
///

enum Operand<'r> {
    Value(Value),
    Record(Option<&'r dyn FieldValues>),
    Records(Vec<&'r dyn FieldValues>),
}

impl Operand<'_> {
    fn describe(&self) -> String {
        match self {
            Self::Value(v) => v.to_string(),
            Self::Record(Some(r)) => r.schema().path.to_string(),
            Self::Record(None) => "null record".to_string(),
            Self::Records(rows) => format!("{} records", rows.len()),
        }
    }

    fn into_value(self, expected: &'static str) -> Result<Value, EvalError> {
        match self {
            Self::Value(v) => Ok(v),
            Self::Record(None) => Ok(Value::Null),
            other => Err(EvalError::type_mismatch(expected, &other)),
        }
    }
}

// parameter bindings, innermost last
type Env<'r> = Vec<(Param, &'r dyn FieldValues)>;

///
/// Evaluate a predicate lambda against one record.
///
/// `Null` results are non-matches.
///
pub fn predicate(lambda: &Lambda, record: &dyn FieldValues) -> Result<bool, EvalError> {
    let value = apply(lambda, record)?.into_value("bool")?;

    truthy(&value)
}

///
/// Evaluate a selector lambda against one record, producing a scalar.
///
pub fn selector(lambda: &Lambda, record: &dyn FieldValues) -> Result<Value, EvalError> {
    apply(lambda, record)?.into_value("scalar")
}

fn apply<'r>(lambda: &Lambda, record: &'r dyn FieldValues) -> Result<Operand<'r>, EvalError> {
    if record.schema() != lambda.param.schema {
        return Err(EvalError::ParameterMismatch {
            expected: lambda.param.schema.path,
            found: record.schema().path,
        });
    }

    let mut env: Env<'r> = vec![(lambda.param, record)];
    eval(&lambda.body, &mut env)
}

fn truthy(value: &Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        other => Err(EvalError::TypeMismatch {
            expected: "bool",
            found: other.to_string(),
        }),
    }
}

fn eval<'r>(expr: &Expr, env: &mut Env<'r>) -> Result<Operand<'r>, EvalError> {
    match expr {
        Expr::Parameter(param) => env
            .iter()
            .rev()
            .find(|(p, _)| p == param)
            .map(|(_, record)| Operand::Record(Some(*record)))
            .ok_or(EvalError::UnboundParameter { name: param.name }),

        Expr::Field { base, name, owner } => {
            let base = eval(base, env)?;
            eval_field(base, name, *owner)
        }

        Expr::Binary { op, left, right } => eval_binary(expr, *op, left, right, env),

        Expr::Unary { op, operand } => {
            let value = eval(operand, env)?.into_value("scalar")?;
            eval_unary(expr, *op, value).map(Operand::Value)
        }

        Expr::Constant(value) => Ok(Operand::Value(value.clone())),

        Expr::Call {
            method,
            target,
            args,
        } => {
            let target = eval(target, env)?;
            eval_call(expr, *method, target, args, env).map(Operand::Value)
        }

        Expr::Lambda(_) => Err(EvalError::Unsupported {
            expr: expr.to_string(),
        }),
    }
}

fn eval_field<'r>(
    base: Operand<'r>,
    name: &str,
    owner: Option<&'static crate::model::SchemaModel>,
) -> Result<Operand<'r>, EvalError> {
    let (schema, record) = match base {
        Operand::Record(Some(record)) => (record.schema(), Some(record)),
        Operand::Record(None) => match owner {
            Some(schema) => (schema, None),
            None => return Ok(Operand::Value(Value::Null)),
        },
        other => return Err(EvalError::type_mismatch("record", &other)),
    };

    let field = schema.field(name).ok_or_else(|| EvalError::UnknownField {
        record: schema.path,
        field: name.to_string(),
    })?;

    // null propagates through nested access
    let Some(record) = record else {
        return Ok(match field.ty.kind {
            FieldKind::Record(_) => Operand::Record(None),
            FieldKind::Records(_) => Operand::Records(Vec::new()),
            _ => Operand::Value(Value::Null),
        });
    };

    Ok(match field.ty.kind {
        FieldKind::Record(_) => Operand::Record(record.get_record(name)),
        FieldKind::Records(_) => Operand::Records(record.get_records(name).unwrap_or_default()),
        _ => Operand::Value(record.get_value(name).unwrap_or(Value::Null)),
    })
}

fn eval_binary<'r>(
    expr: &Expr,
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    env: &mut Env<'r>,
) -> Result<Operand<'r>, EvalError> {
    // short-circuit
    if op.is_logical() {
        let l = truthy(&eval(left, env)?.into_value("bool")?)?;
        let result = match (op, l) {
            (BinaryOp::And, false) => false,
            (BinaryOp::Or, true) => true,
            _ => truthy(&eval(right, env)?.into_value("bool")?)?,
        };
        return Ok(Operand::Value(Value::Bool(result)));
    }

    let l = eval(left, env)?.into_value("scalar")?;
    let r = eval(right, env)?.into_value("scalar")?;

    // invalid comparisons are non-matches
    let value = match op {
        BinaryOp::Eq => Value::Bool(compare_eq(&l, &r).unwrap_or(false)),
        BinaryOp::Ne => Value::Bool(compare_eq(&l, &r).is_some_and(|v| !v)),
        BinaryOp::Lt => Value::Bool(compare_order(&l, &r).is_some_and(Ordering::is_lt)),
        BinaryOp::Lte => Value::Bool(compare_order(&l, &r).is_some_and(Ordering::is_le)),
        BinaryOp::Gt => Value::Bool(compare_order(&l, &r).is_some_and(Ordering::is_gt)),
        BinaryOp::Gte => Value::Bool(compare_order(&l, &r).is_some_and(Ordering::is_ge)),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            arithmetic(expr, op, &l, &r)?
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("logical operators handled above"),
    };

    Ok(Operand::Value(value))
}

#[expect(clippy::cast_precision_loss)]
fn arithmetic(expr: &Expr, op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let overflow = || EvalError::Overflow {
        expr: expr.to_string(),
    };

    match (l, r) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),

        (Value::Text(a), Value::Text(b)) if op == BinaryOp::Add => {
            Ok(Value::Text(format!("{a}{b}")))
        }

        (Value::Int(a), Value::Int(b)) => {
            if op == BinaryOp::Div && *b == 0 {
                return Err(EvalError::DivideByZero {
                    expr: expr.to_string(),
                });
            }
            let out = match op {
                BinaryOp::Add => a.checked_add(*b),
                BinaryOp::Sub => a.checked_sub(*b),
                BinaryOp::Mul => a.checked_mul(*b),
                _ => a.checked_div(*b),
            };
            out.map(Value::Int).ok_or_else(overflow)
        }

        (Value::Uint(a), Value::Uint(b)) => {
            if op == BinaryOp::Div && *b == 0 {
                return Err(EvalError::DivideByZero {
                    expr: expr.to_string(),
                });
            }
            let out = match op {
                BinaryOp::Add => a.checked_add(*b),
                BinaryOp::Sub => a.checked_sub(*b),
                BinaryOp::Mul => a.checked_mul(*b),
                _ => a.checked_div(*b),
            };
            out.map(Value::Uint).ok_or_else(overflow)
        }

        (Value::Int(_), Value::Uint(_)) | (Value::Uint(_), Value::Int(_)) => {
            let a = l.cast(FieldType::new(FieldKind::Int)).ok_or_else(overflow)?;
            let b = r.cast(FieldType::new(FieldKind::Int)).ok_or_else(overflow)?;
            arithmetic(expr, op, &a, &b)
        }

        _ if l.is_numeric() && r.is_numeric() => {
            let as_f64 = |v: &Value| match v {
                Value::Int(i) => *i as f64,
                Value::Uint(u) => *u as f64,
                Value::Float(f) => *f,
                _ => f64::NAN,
            };
            let (a, b) = (as_f64(l), as_f64(r));
            Ok(Value::Float(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                _ => a / b,
            }))
        }

        _ => Err(EvalError::TypeMismatch {
            expected: "numeric operands",
            found: format!("{l} {} {r}", op.symbol()),
        }),
    }
}

fn eval_unary(expr: &Expr, op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => match value {
            Value::Null => Ok(Value::Null),
            other => Ok(Value::Bool(!truthy(&other)?)),
        },
        UnaryOp::Neg => match value {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow {
                expr: expr.to_string(),
            }),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Uint(u) => i64::try_from(u)
                .ok()
                .and_then(i64::checked_neg)
                .map(Value::Int)
                .ok_or(EvalError::Overflow {
                    expr: expr.to_string(),
                }),
            other => Err(EvalError::TypeMismatch {
                expected: "numeric",
                found: other.to_string(),
            }),
        },
        UnaryOp::Convert(ty) => value
            .cast(ty)
            .ok_or(EvalError::LossyConversion { value, ty }),
        UnaryOp::Unwrap => {
            if value.is_null() {
                Err(EvalError::NullUnwrap {
                    expr: expr.to_string(),
                })
            } else {
                Ok(value)
            }
        }
    }
}

fn eval_call<'r>(
    expr: &Expr,
    method: Method,
    target: Operand<'r>,
    args: &[Expr],
    env: &mut Env<'r>,
) -> Result<Value, EvalError> {
    match method {
        Method::Any | Method::All => {
            let lambda = match args {
                [] => None,
                [Expr::Lambda(lambda)] => Some(lambda.as_ref()),
                _ => {
                    return Err(EvalError::Unsupported {
                        expr: expr.to_string(),
                    });
                }
            };
            let rows = match target {
                Operand::Records(rows) => rows,
                Operand::Record(None) | Operand::Value(Value::Null) => Vec::new(),
                Operand::Value(Value::List(items)) if lambda.is_none() => {
                    return Ok(Value::Bool(method == Method::All || !items.is_empty()));
                }
                other => return Err(EvalError::type_mismatch("record collection", &other)),
            };

            let Some(lambda) = lambda else {
                return Ok(Value::Bool(method == Method::All || !rows.is_empty()));
            };

            for row in rows {
                env.push((lambda.param, row));
                let matched = eval(&lambda.body, env).and_then(|v| truthy(&v.into_value("bool")?));
                env.pop();

                match (method, matched?) {
                    (Method::Any, true) => return Ok(Value::Bool(true)),
                    (Method::All, false) => return Ok(Value::Bool(false)),
                    _ => {}
                }
            }

            Ok(Value::Bool(method == Method::All))
        }

        Method::Count => match target {
            Operand::Records(rows) => Ok(Value::Int(len_i64(rows.len()))),
            Operand::Value(Value::List(items)) => Ok(Value::Int(len_i64(items.len()))),
            Operand::Value(Value::Null) | Operand::Record(None) => Ok(Value::Null),
            other => Err(EvalError::type_mismatch("collection", &other)),
        },

        Method::Contains | Method::StartsWith | Method::EndsWith => {
            let [arg] = args else {
                return Err(EvalError::Unsupported {
                    expr: expr.to_string(),
                });
            };
            let needle = eval(arg, env)?.into_value("scalar")?;
            let haystack = target.into_value("text or list")?;

            // invalid pairs are non-matches
            let matched = match (method, &haystack, &needle) {
                (Method::Contains, Value::Text(s), Value::Text(n)) => s.contains(n.as_str()),
                (Method::Contains, Value::List(items), n) => items
                    .iter()
                    .any(|item| compare_eq(item, n).unwrap_or(false)),
                (Method::StartsWith, Value::Text(s), Value::Text(n)) => s.starts_with(n.as_str()),
                (Method::EndsWith, Value::Text(s), Value::Text(n)) => s.ends_with(n.as_str()),
                _ => false,
            };

            Ok(Value::Bool(matched))
        }
    }
}

fn len_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

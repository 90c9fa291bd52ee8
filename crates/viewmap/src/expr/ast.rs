use crate::{
    model::{FieldKind, FieldType, SchemaModel},
    value::Value,
};
use std::fmt;

///
/// Expression AST
///
/// Closed representation of predicate and selector functions written
/// against a record schema. Nodes carry the static schema they were built
/// against so translation and path resolution never need a live record.
///
/// Interpretation happens in later passes:
///
/// - path resolution (mapping registration)
/// - translation (Model <-> Entity)
/// - evaluation (reference engine / repository collaborator)
///

///
/// Param
///
/// Lambda parameter bound to one record schema.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Param {
    pub name: &'static str,
    pub schema: &'static SchemaModel,
}

impl Param {
    #[must_use]
    pub const fn new(name: &'static str, schema: &'static SchemaModel) -> Self {
        Self { name, schema }
    }
}

///
/// BinaryOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Lte | Self::Gt | Self::Gte
        )
    }

    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

///
/// UnaryOp
///
/// `Convert` and `Unwrap` are type-only wrappers (widening casts and
/// nullable `.Value` access); translation strips them.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryOp {
    Not,
    Neg,
    Convert(FieldType),
    Unwrap,
}

impl UnaryOp {
    #[must_use]
    pub const fn is_conversion(self) -> bool {
        matches!(self, Self::Convert(_) | Self::Unwrap)
    }
}

///
/// Method
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    /// Collection has an element (optionally matching a lambda).
    Any,
    /// Every element matches a lambda.
    All,
    /// Text substring or list membership.
    Contains,
    StartsWith,
    EndsWith,
    Count,
}

impl Method {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::All => "all",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Count => "count",
        }
    }
}

///
/// Expr
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Parameter(Param),
    Field {
        base: Box<Self>,
        name: &'static str,
        /// Schema declaring `name`; `None` when the base is not a record.
        owner: Option<&'static SchemaModel>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Self>,
    },
    Constant(Value),
    Call {
        method: Method,
        target: Box<Self>,
        args: Vec<Self>,
    },
    Lambda(Box<Lambda>),
}

impl Expr {
    /// Static type of this node.
    ///
    /// Unknown fields and lambdas are typed as nullable `Any`. Scalars read
    /// through a nullable record become nullable.
    #[must_use]
    pub fn ty(&self) -> FieldType {
        match self {
            Self::Parameter(param) => FieldType::new(FieldKind::Record(param.schema)),
            Self::Field { base, name, owner } => {
                let Some(field) = owner.and_then(|schema| schema.field(name)) else {
                    return FieldType::nullable(FieldKind::Any);
                };
                let base = base.ty();
                if base.nullable && matches!(base.kind, FieldKind::Record(_)) {
                    field.ty.as_nullable()
                } else {
                    field.ty
                }
            }
            Self::Binary { op, left, right } => {
                if op.is_comparison() || op.is_logical() {
                    return FieldType::bool();
                }
                let (l, r) = (left.ty(), right.ty());
                let kind = match (l.kind, r.kind) {
                    (FieldKind::Float, _) | (_, FieldKind::Float) => FieldKind::Float,
                    _ => l.kind,
                };
                FieldType {
                    kind,
                    nullable: l.nullable || r.nullable,
                }
            }
            Self::Unary { op, operand } => match op {
                UnaryOp::Not => FieldType::bool(),
                UnaryOp::Neg => operand.ty(),
                UnaryOp::Convert(ty) => *ty,
                UnaryOp::Unwrap => operand.ty().as_required(),
            },
            Self::Constant(value) => value.field_type(),
            Self::Call { method, .. } => match method {
                Method::Count => FieldType::new(FieldKind::Int),
                _ => FieldType::bool(),
            },
            Self::Lambda(_) => FieldType::nullable(FieldKind::Any),
        }
    }

    /// Drop `Convert`/`Unwrap` wrappers around this node.
    #[must_use]
    pub fn strip_conversions(&self) -> &Self {
        let mut expr = self;
        while let Self::Unary { op, operand } = expr {
            if !op.is_conversion() {
                break;
            }
            expr = operand;
        }
        expr
    }

    /// Field names of a chain rooted directly at `param`, outermost last.
    ///
    /// Conversion wrappers inside the chain are transparent. Returns `None`
    /// for anything that is not a pure field chain on `param`, including
    /// `param` itself.
    #[must_use]
    pub fn field_chain(&self, param: &Param) -> Option<Vec<&'static str>> {
        let mut names = Vec::new();
        let mut expr = self.strip_conversions();

        loop {
            match expr {
                Self::Field { base, name, .. } => {
                    names.push(*name);
                    expr = base.strip_conversions();
                }
                Self::Parameter(p) if p == param && !names.is_empty() => {
                    names.reverse();
                    return Some(names);
                }
                _ => return None,
            }
        }
    }

    /// True when `param` occurs anywhere in this tree.
    #[must_use]
    pub fn references(&self, param: &Param) -> bool {
        match self {
            Self::Parameter(p) => p == param,
            Self::Field { base, .. } => base.references(param),
            Self::Binary { left, right, .. } => left.references(param) || right.references(param),
            Self::Unary { operand, .. } => operand.references(param),
            Self::Constant(_) => false,
            Self::Call { target, args, .. } => {
                target.references(param) || args.iter().any(|a| a.references(param))
            }
            Self::Lambda(lambda) => lambda.body.references(param),
        }
    }

    #[must_use]
    pub const fn as_constant(&self) -> Option<&Value> {
        match self {
            Self::Constant(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter(param) => f.write_str(param.name),
            Self::Field { base, name, .. } => write!(f, "{base}.{name}"),
            Self::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Self::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{operand}"),
                UnaryOp::Neg => write!(f, "-{operand}"),
                UnaryOp::Convert(ty) => write!(f, "({operand} as {ty})"),
                UnaryOp::Unwrap => write!(f, "{operand}.unwrap()"),
            },
            Self::Constant(value) => write!(f, "{value}"),
            Self::Call {
                method,
                target,
                args,
            } => {
                write!(f, "{target}.{}(", method.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Lambda(lambda) => write!(f, "{lambda}"),
        }
    }
}

///
/// Lambda
///
/// One-parameter function: a predicate when the body is boolean, a
/// selector otherwise.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Lambda {
    pub param: Param,
    pub body: Expr,
}

impl Lambda {
    #[must_use]
    pub const fn schema(&self) -> &'static SchemaModel {
        self.param.schema
    }

    /// Literal `true`/`false` body, if any.
    #[must_use]
    pub const fn constant_bool(&self) -> Option<bool> {
        match &self.body {
            Expr::Constant(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{}| {}", self.param.name, self.body)
    }
}

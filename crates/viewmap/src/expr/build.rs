use crate::{
    expr::ast::{BinaryOp, Expr, Lambda, Method, Param, UnaryOp},
    model::{FieldType, SchemaModel},
    traits::Record,
    value::Value,
};
use std::ops::{BitAnd, BitOr, Not};

// element schema used when a collection method targets a non-record value;
// any field access on it fails during translation or evaluation
static UNTYPED: SchemaModel = SchemaModel {
    path: "<untyped>",
    fields: &[],
};

///
/// Literal constant.
///
#[must_use]
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Constant(value.into())
}

impl Lambda {
    /// Build a lambda over `T` with the parameter named `x`.
    #[must_use]
    pub fn of<T: Record>(f: impl FnOnce(Expr) -> Expr) -> Self {
        Self::new::<T>("x", f)
    }

    /// Build a lambda over `T` with an explicit parameter name.
    #[must_use]
    pub fn new<T: Record>(name: &'static str, f: impl FnOnce(Expr) -> Expr) -> Self {
        Self::over(Param::new(name, T::MODEL), f)
    }

    /// Build a lambda over an explicit parameter.
    #[must_use]
    pub fn over(param: Param, f: impl FnOnce(Expr) -> Expr) -> Self {
        let body = f(Expr::Parameter(param));

        Self { param, body }
    }

    /// `|param| value`
    #[must_use]
    pub fn constant(param: Param, value: impl Into<Value>) -> Self {
        Self {
            param,
            body: lit(value),
        }
    }
}

impl Expr {
    /// Field access; the owner schema is taken from this node's type.
    /// Borrows so one parameter can be used in several places.
    #[must_use]
    pub fn field(&self, name: &'static str) -> Self {
        Self::Field {
            base: Box::new(self.clone()),
            name,
            owner: self.ty().record_schema(),
        }
    }

    /// Dotted field chain, e.g. `x.path("role.name")`.
    #[must_use]
    pub fn path(&self, dotted: &'static str) -> Self {
        dotted
            .split('.')
            .fold(self.clone(), |base, name| base.field(name))
    }

    fn binary(self, op: BinaryOp, rhs: impl Into<Self>) -> Self {
        Self::Binary {
            op,
            left: Box::new(self),
            right: Box::new(rhs.into()),
        }
    }

    fn unary(self, op: UnaryOp) -> Self {
        Self::Unary {
            op,
            operand: Box::new(self),
        }
    }

    fn call(self, method: Method, args: Vec<Self>) -> Self {
        Self::Call {
            method,
            target: Box::new(self),
            args,
        }
    }

    // element parameter for a collection method on this node
    fn element_param(&self, name: &'static str) -> Param {
        Param::new(name, self.ty().records_schema().unwrap_or(&UNTYPED))
    }

    #[must_use]
    pub fn eq(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Eq, rhs)
    }

    #[must_use]
    pub fn ne(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Ne, rhs)
    }

    #[must_use]
    pub fn lt(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Lt, rhs)
    }

    #[must_use]
    pub fn lte(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Lte, rhs)
    }

    #[must_use]
    pub fn gt(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Gt, rhs)
    }

    #[must_use]
    pub fn gte(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Gte, rhs)
    }

    #[must_use]
    pub fn and(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::And, rhs)
    }

    #[must_use]
    pub fn or(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Or, rhs)
    }

    #[must_use]
    pub fn plus(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Add, rhs)
    }

    #[must_use]
    pub fn minus(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Sub, rhs)
    }

    #[must_use]
    pub fn times(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Mul, rhs)
    }

    #[must_use]
    pub fn divided_by(self, rhs: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Div, rhs)
    }

    #[must_use]
    pub fn negate(self) -> Self {
        self.unary(UnaryOp::Neg)
    }

    #[must_use]
    pub fn is_null(self) -> Self {
        self.eq(Value::Null)
    }

    #[must_use]
    pub fn is_not_null(self) -> Self {
        self.ne(Value::Null)
    }

    /// Explicit conversion node.
    #[must_use]
    pub fn convert(self, ty: FieldType) -> Self {
        self.unary(UnaryOp::Convert(ty))
    }

    /// Nullable value access.
    #[must_use]
    pub fn unwrap_value(self) -> Self {
        self.unary(UnaryOp::Unwrap)
    }

    /// `target.any()`: the collection is non-empty.
    #[must_use]
    pub fn any_element(self) -> Self {
        self.call(Method::Any, Vec::new())
    }

    /// `target.any(|name| ..)`
    #[must_use]
    pub fn any(self, name: &'static str, f: impl FnOnce(Self) -> Self) -> Self {
        let lambda = Lambda::over(self.element_param(name), f);
        self.call(Method::Any, vec![Self::Lambda(Box::new(lambda))])
    }

    /// `target.all(|name| ..)`
    #[must_use]
    pub fn all(self, name: &'static str, f: impl FnOnce(Self) -> Self) -> Self {
        let lambda = Lambda::over(self.element_param(name), f);
        self.call(Method::All, vec![Self::Lambda(Box::new(lambda))])
    }

    #[must_use]
    pub fn contains(self, item: impl Into<Self>) -> Self {
        self.call(Method::Contains, vec![item.into()])
    }

    #[must_use]
    pub fn starts_with(self, prefix: impl Into<Self>) -> Self {
        self.call(Method::StartsWith, vec![prefix.into()])
    }

    #[must_use]
    pub fn ends_with(self, suffix: impl Into<Self>) -> Self {
        self.call(Method::EndsWith, vec![suffix.into()])
    }

    #[must_use]
    pub fn count(self) -> Self {
        self.call(Method::Count, Vec::new())
    }
}

impl BitAnd for Expr {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for Expr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl Not for Expr {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.unary(UnaryOp::Not)
    }
}

///
/// From conversions
///

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Constant(value)
    }
}

impl From<Lambda> for Expr {
    fn from(lambda: Lambda) -> Self {
        Self::Lambda(Box::new(lambda))
    }
}

macro_rules! impl_from_constant {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Self::Constant(Value::from(v))
                }
            }
        )*
    };
}

impl_from_constant!(bool, i32, i64, u32, u64, f64, String, &str);

impl<T: Into<Value>> From<Option<T>> for Expr {
    fn from(v: Option<T>) -> Self {
        Self::Constant(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Expr {
    fn from(v: Vec<T>) -> Self {
        Self::Constant(Value::from(v))
    }
}

mod compare;


use crate::model::{FieldKind, FieldType};
use serde::{Deserialize, Serialize};
use std::fmt;

// re-exports
pub use compare::{canonical_cmp, compare_eq, compare_order};

///
/// CONSTANTS
///

const F64_SAFE_I64: i64 = 1i64 << 53;
const F64_SAFE_U64: u64 = 1u64 << 53;

///
/// Value
///
/// Dynamic value flowing through predicates, projections and writes.
///
/// Null → the field's value is Option::None (i.e., SQL NULL).
/// List → only produced by constants (captured collections); record fields
///         never surface as values.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    List(Vec<Self>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Uint(_) | Self::Float(_))
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Static type of this value, as seen by expression type inference.
    /// `Null` is typed as a nullable `Any`.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match self {
            Self::Null => FieldType::nullable(FieldKind::Any),
            Self::Bool(_) => FieldType::new(FieldKind::Bool),
            Self::Int(_) => FieldType::new(FieldKind::Int),
            Self::Uint(_) => FieldType::new(FieldKind::Uint),
            Self::Float(_) => FieldType::new(FieldKind::Float),
            Self::Text(_) => FieldType::new(FieldKind::Text),
            Self::List(_) => FieldType::new(FieldKind::List),
        }
    }

    ///
    /// Convert this value to `ty`.
    ///
    /// Numeric conversions widen freely and narrow only when lossless;
    /// `Null` converts to anything. Returns `None` when the conversion
    /// is not defined or would lose information.
    ///
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn cast(&self, ty: FieldType) -> Option<Self> {
        if self.is_null() {
            return Some(Self::Null);
        }

        match (ty.kind, self) {
            (FieldKind::Any, v) => Some(v.clone()),

            (FieldKind::Bool, Self::Bool(_))
            | (FieldKind::Int, Self::Int(_))
            | (FieldKind::Uint, Self::Uint(_))
            | (FieldKind::Float, Self::Float(_))
            | (FieldKind::Text, Self::Text(_))
            | (FieldKind::List, Self::List(_)) => Some(self.clone()),

            (FieldKind::Int, Self::Uint(v)) => i64::try_from(*v).ok().map(Self::Int),
            (FieldKind::Int, Self::Float(f)) => {
                (f.fract() == 0.0 && f.abs() <= F64_SAFE_I64 as f64).then(|| Self::Int(*f as i64))
            }
            (FieldKind::Uint, Self::Int(v)) => u64::try_from(*v).ok().map(Self::Uint),
            (FieldKind::Uint, Self::Float(f)) => (f.fract() == 0.0
                && *f >= 0.0
                && *f <= F64_SAFE_U64 as f64)
                .then(|| Self::Uint(*f as u64)),
            (FieldKind::Float, Self::Int(v)) => {
                (v.unsigned_abs() <= F64_SAFE_U64).then(|| Self::Float(*v as f64))
            }
            (FieldKind::Float, Self::Uint(v)) => {
                (*v <= F64_SAFE_U64).then(|| Self::Float(*v as f64))
            }

            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}u"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

///
/// From conversions
///

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(<$target>::from(v))
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Uint as u64,
    u16 => Uint as u64,
    u32 => Uint as u64,
    u64 => Uint as u64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Text as String,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

use crate::model::schema::SchemaModel;
use std::fmt;

///
/// FieldModel
/// Runtime field metadata used by path resolution and translation.
///

#[derive(Debug)]
pub struct FieldModel {
    /// Field name as used in expressions.
    pub name: &'static str,
    /// Static type of the field.
    pub ty: FieldType,
}

///
/// FieldType
///
/// Static type of a field or expression node. `nullable` marks optional
/// scalar fields (`Option<T>`) and is always set for single-record fields.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldType {
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldType {
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn nullable(kind: FieldKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    #[must_use]
    pub const fn record(schema: &'static SchemaModel) -> Self {
        Self::nullable(FieldKind::Record(schema))
    }

    #[must_use]
    pub const fn records(schema: &'static SchemaModel) -> Self {
        Self::new(FieldKind::Records(schema))
    }

    #[must_use]
    pub const fn bool() -> Self {
        Self::new(FieldKind::Bool)
    }

    /// Same kind, made nullable.
    #[must_use]
    pub const fn as_nullable(self) -> Self {
        Self::nullable(self.kind)
    }

    /// Same kind, nullability dropped.
    #[must_use]
    pub const fn as_required(self) -> Self {
        Self::new(self.kind)
    }

    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self.kind, FieldKind::Any)
    }

    /// Nullable numeric scalar (`Option<i64>`, `Option<f64>`, ...).
    #[must_use]
    pub const fn is_nullable_numeric(&self) -> bool {
        self.nullable && self.kind.is_numeric()
    }

    /// Single record schema, when this is a record-valued field.
    #[must_use]
    pub const fn record_schema(&self) -> Option<&'static SchemaModel> {
        match self.kind {
            FieldKind::Record(schema) => Some(schema),
            _ => None,
        }
    }

    /// Element schema, when this is a record collection.
    #[must_use]
    pub const fn records_schema(&self) -> Option<&'static SchemaModel> {
        match self.kind {
            FieldKind::Records(schema) => Some(schema),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable && !matches!(self.kind, FieldKind::Record(_)) {
            write!(f, "Option<{}>", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

///
/// FieldKind
///
/// Minimal type surface needed by translation and evaluation.
/// Scalars align with `Value` variants; `Record`/`Records` point at the
/// nested schema so paths can be walked without a live instance.
///

#[derive(Clone, Copy, Eq, PartialEq)]
pub enum FieldKind {
    /// Unconstrained; never coerced.
    Any,
    Bool,
    Int,
    Uint,
    Float,
    Text,
    /// Captured constant collections.
    List,

    Record(&'static SchemaModel),
    Records(&'static SchemaModel),
}

impl FieldKind {
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Uint | Self::Float)
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::Record(_) | Self::Records(_))
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record(schema) => write!(f, "Record({})", schema.path),
            Self::Records(schema) => write!(f, "Records({})", schema.path),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("i64"),
            Self::Uint => f.write_str("u64"),
            Self::Float => f.write_str("f64"),
            Self::Text => f.write_str("String"),
            Self::List => f.write_str("List"),
            Self::Record(schema) => f.write_str(schema.path),
            Self::Records(schema) => write!(f, "Vec<{}>", schema.path),
        }
    }
}

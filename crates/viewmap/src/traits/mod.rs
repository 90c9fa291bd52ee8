#[cfg(test)]
mod tests;

use crate::{
    model::{FieldKind, FieldType, SchemaModel},
    value::Value,
};
use std::fmt::Debug;
use thiserror::Error as ThisError;

// ============================================================================
// RECORDS
// ============================================================================
//
// Models, entities and composite views are all records: static schema plus
// dynamic field access. `record!` implements both traits.
//

///
/// Record
///
/// A concrete, owned record type with a static schema descriptor.
///

pub trait Record: FieldValues + Clone + Debug + Default + Send + Sync + 'static {
    const MODEL: &'static SchemaModel;
}

///
/// FieldValues
///
/// Object-safe field access used by path reads/writes, projection and the
/// reference evaluator.
///
/// Scalar fields surface as `Value`; nested records surface as trait
/// objects so paths can be walked without knowing concrete types.
///

pub trait FieldValues {
    fn schema(&self) -> &'static SchemaModel;

    /// Scalar field value. `None` for unknown or non-scalar fields.
    fn get_value(&self, field: &str) -> Option<Value>;

    /// Write a scalar field through its typed setter.
    fn set_value(&mut self, field: &str, value: &Value) -> Result<(), FieldWriteError>;

    /// Nested single record. `None` for unknown fields or a null record.
    fn get_record(&self, field: &str) -> Option<&dyn FieldValues>;

    /// Nested single record, allocating a default one when null.
    fn get_record_mut(&mut self, field: &str) -> Option<&mut dyn FieldValues>;

    /// Nested record collection.
    fn get_records(&self, field: &str) -> Option<Vec<&dyn FieldValues>>;
}

///
/// FieldWriteError
///

#[derive(Debug, ThisError)]
pub enum FieldWriteError {
    #[error("unknown field '{field}' on {record}")]
    UnknownField {
        record: &'static str,
        field: String,
    },

    #[error("cannot write {value} into {record}.{field}")]
    TypeMismatch {
        record: &'static str,
        field: String,
        value: Value,
    },

    #[error("field {record}.{field} is not a scalar and cannot be written")]
    NotWritable {
        record: &'static str,
        field: String,
    },
}

impl FieldWriteError {
    #[must_use]
    pub fn unknown_field(record: &'static str, field: &str) -> Self {
        Self::UnknownField {
            record,
            field: field.to_string(),
        }
    }

    #[must_use]
    pub fn type_mismatch(record: &'static str, field: &str, value: &Value) -> Self {
        Self::TypeMismatch {
            record,
            field: field.to_string(),
            value: value.clone(),
        }
    }

    #[must_use]
    pub fn not_writable(record: &'static str, field: &str) -> Self {
        Self::NotWritable {
            record,
            field: field.to_string(),
        }
    }
}

// ============================================================================
// FIELD VALUES
// ============================================================================

///
/// FieldValue
///
/// Conversion boundary between Rust scalar field types and `Value`.
/// `KIND` is the static type recorded in the schema descriptor.
///

pub trait FieldValue {
    const KIND: FieldType;

    fn to_value(&self) -> Value;

    #[must_use]
    fn from_value(value: &Value) -> Option<Self>
    where
        Self: Sized;
}

impl FieldValue for String {
    const KIND: FieldType = FieldType::new(FieldKind::Text);

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: FieldType = T::KIND.as_nullable();

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }

        T::from_value(value).map(Some)
    }
}

// impl_field_value
// numeric conversions go through Value::cast so lossless widening is accepted
macro_rules! impl_field_value {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl FieldValue for $type {
                const KIND: FieldType = FieldType::new(FieldKind::$variant);

                fn to_value(&self) -> Value {
                    Value::$variant((*self).into())
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value.cast(Self::KIND)? {
                        Value::$variant(v) => v.try_into().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_field_value!(
    i32 => Int,
    i64 => Int,
    u32 => Uint,
    u64 => Uint,
    f64 => Float,
    bool => Bool,
);

// record
/// Declare a record type together with its `Record` and `FieldValues` impls.
///
/// Scalar fields come first; nested single records go in an optional
/// `records { .. }` section (stored as `Option<T>`) and nested collections
/// in an optional `lists { .. }` section (stored as `Vec<T>`). Fields take
/// the struct's visibility.
///
/// ```ignore
/// record! {
///     pub struct User as "User" {
///         id: i64,
///         name: Option<String>;
///         records { role: Role }
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident as $path:literal {
            $( $field:ident : $ty:ty ),* $(,)?
            $( ; records { $( $rfield:ident : $rty:ty ),* $(,)? } )?
            $( ; lists { $( $lfield:ident : $lty:ty ),* $(,)? } )?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq)]
        $vis struct $name {
            $( $vis $field: $ty, )*
            $($( $vis $rfield: Option<$rty>, )*)?
            $($( $vis $lfield: Vec<$lty>, )*)?
        }

        impl $crate::traits::Record for $name {
            const MODEL: &'static $crate::model::SchemaModel = &$crate::model::SchemaModel {
                path: $path,
                fields: &[
                    $(
                        $crate::model::FieldModel {
                            name: stringify!($field),
                            ty: <$ty as $crate::traits::FieldValue>::KIND,
                        },
                    )*
                    $($(
                        $crate::model::FieldModel {
                            name: stringify!($rfield),
                            ty: $crate::model::FieldType::record(
                                <$rty as $crate::traits::Record>::MODEL,
                            ),
                        },
                    )*)?
                    $($(
                        $crate::model::FieldModel {
                            name: stringify!($lfield),
                            ty: $crate::model::FieldType::records(
                                <$lty as $crate::traits::Record>::MODEL,
                            ),
                        },
                    )*)?
                ],
            };
        }

        impl $crate::traits::FieldValues for $name {
            fn schema(&self) -> &'static $crate::model::SchemaModel {
                <Self as $crate::traits::Record>::MODEL
            }

            fn get_value(&self, field: &str) -> Option<$crate::value::Value> {
                match field {
                    $( stringify!($field) => Some($crate::traits::FieldValue::to_value(&self.$field)), )*
                    _ => None,
                }
            }

            fn set_value(
                &mut self,
                field: &str,
                value: &$crate::value::Value,
            ) -> Result<(), $crate::traits::FieldWriteError> {
                let path = <Self as $crate::traits::Record>::MODEL.path;
                let _ = value;

                match field {
                    $(
                        stringify!($field) => {
                            self.$field = <$ty as $crate::traits::FieldValue>::from_value(value)
                                .ok_or_else(|| {
                                    $crate::traits::FieldWriteError::type_mismatch(path, field, value)
                                })?;
                            Ok(())
                        }
                    )*
                    _ if <Self as $crate::traits::Record>::MODEL.has_field(field) => {
                        Err($crate::traits::FieldWriteError::not_writable(path, field))
                    }
                    _ => Err($crate::traits::FieldWriteError::unknown_field(path, field)),
                }
            }

            fn get_record(&self, field: &str) -> Option<&dyn $crate::traits::FieldValues> {
                match field {
                    $($(
                        stringify!($rfield) => self
                            .$rfield
                            .as_ref()
                            .map(|r| r as &dyn $crate::traits::FieldValues),
                    )*)?
                    _ => None,
                }
            }

            fn get_record_mut(
                &mut self,
                field: &str,
            ) -> Option<&mut dyn $crate::traits::FieldValues> {
                match field {
                    $($(
                        stringify!($rfield) => Some(
                            self.$rfield.get_or_insert_with(Default::default)
                                as &mut dyn $crate::traits::FieldValues,
                        ),
                    )*)?
                    _ => None,
                }
            }

            fn get_records(&self, field: &str) -> Option<Vec<&dyn $crate::traits::FieldValues>> {
                match field {
                    $($(
                        stringify!($lfield) => Some(
                            self.$lfield
                                .iter()
                                .map(|r| r as &dyn $crate::traits::FieldValues)
                                .collect(),
                        ),
                    )*)?
                    _ => None,
                }
            }
        }
    };
}

use crate::model::field::FieldModel;
use std::fmt;

///
/// SchemaModel
/// Static, macro-generated runtime descriptor for one record type.
///

pub struct SchemaModel {
    /// Record name used in diagnostics and error messages.
    pub path: &'static str,
    /// Ordered field list.
    pub fields: &'static [FieldModel],
}

impl SchemaModel {
    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

// schema identity is the record path
impl PartialEq for SchemaModel {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for SchemaModel {}

impl fmt::Debug for SchemaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaModel")
            .field("path", &self.path)
            .field(
                "fields",
                &self.fields.iter().map(|f| f.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for SchemaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

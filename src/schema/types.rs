//! Field specifications and the derived fixed-length layout
//!
//! Record length for a schema is
//! `sum(len(name) + length + 4 + 2 + 2) - 2 + 2 + 1` over all fields:
//! four quotes around key and value, `": "` after the key, `", "` between
//! pairs (none after the last), the enclosing braces and the trailing newline.

use serde::{Deserialize, Serialize};

use crate::errors::{FlatDbError, FlatDbResult};

/// Byte budget used when a field specification omits `length`
pub const DEFAULT_FIELD_LENGTH: usize = 255;

/// Name of the implicit identifier field
pub const ID_FIELD: &str = "id";

/// Byte budget of the implicit identifier field
pub const ID_FIELD_LENGTH: usize = 10;

/// Quotes around key and value
const QUOTE_OVERHEAD: usize = 4;
/// `": "` after each key
const COLON_OVERHEAD: usize = 2;
/// `", "` between pairs
const SEPARATOR_OVERHEAD: usize = 2;
/// `{` and `}`
const BRACE_OVERHEAD: usize = 2;
/// Trailing `\n`
const NEWLINE_OVERHEAD: usize = 1;

/// Caller-facing field specification.
///
/// Deserializes from `{"name": "title", "length": 100, "index": true}`;
/// `length`, `default` and `index` are optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name, unique within a schema
    pub name: String,
    /// Byte budget of the encoded value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    /// Value used when a record omits the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Whether the field takes part in the inverted word index
    #[serde(default)]
    pub index: bool,
}

impl FieldSpec {
    /// Create a spec with the default length, no default value, not indexed
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: None,
            default: None,
            index: false,
        }
    }

    /// Set the byte budget
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark the field as indexed
    pub fn indexed(mut self) -> Self {
        self.index = true;
        self
    }
}

/// A resolved schema field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    length: usize,
    default: Option<String>,
    indexed: bool,
}

impl Field {
    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte budget of the encoded value
    pub fn length(&self) -> usize {
        self.length
    }

    /// Default value, empty when none was given
    pub fn default_value(&self) -> &str {
        self.default.as_deref().unwrap_or("")
    }

    /// Whether the field is indexed
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Bytes this field contributes to the record, separator included
    fn footprint(&self) -> usize {
        self.name.len() + self.length + QUOTE_OVERHEAD + COLON_OVERHEAD + SEPARATOR_OVERHEAD
    }
}

/// Ordered field layout with the implicit `id` field appended last.
///
/// Immutable once built; the record length is computed once here and
/// every encode and every slot offset relies on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
    record_length: usize,
}

impl Schema {
    /// Build a schema from caller field specifications.
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` when a field is named `id`, a name is
    /// empty, repeated or contains characters JSON would escape, or a
    /// length is zero.
    pub fn build<I>(specs: I) -> FlatDbResult<Self>
    where
        I: IntoIterator<Item = FieldSpec>,
    {
        let mut fields: Vec<Field> = Vec::new();

        for spec in specs {
            validate_name(&spec.name)?;

            if spec.name == ID_FIELD {
                return Err(FlatDbError::schema_violation(format!(
                    "Field name '{}' is reserved",
                    ID_FIELD
                )));
            }

            if fields.iter().any(|f| f.name == spec.name) {
                return Err(FlatDbError::schema_violation(format!(
                    "Field {} is defined more than once",
                    spec.name
                )));
            }

            let length = spec.length.unwrap_or(DEFAULT_FIELD_LENGTH);
            if length == 0 {
                return Err(FlatDbError::schema_violation(format!(
                    "Field {} must have a positive length",
                    spec.name
                )));
            }

            fields.push(Field {
                name: spec.name,
                length,
                default: spec.default,
                indexed: spec.index,
            });
        }

        fields.push(Field {
            name: ID_FIELD.to_string(),
            length: ID_FIELD_LENGTH,
            default: None,
            indexed: false,
        });

        let record_length = Self::compute_record_length(&fields);

        Ok(Self {
            fields,
            record_length,
        })
    }

    fn compute_record_length(fields: &[Field]) -> usize {
        let body: usize = fields.iter().map(Field::footprint).sum();
        body - SEPARATOR_OVERHEAD + BRACE_OVERHEAD + NEWLINE_OVERHEAD
    }

    /// Fields in encoding order, `id` last
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of a field in encoding order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Whether the schema defines `name`
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Indexed fields in schema order
    pub fn indexed_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.indexed)
    }

    /// Fixed byte length of every slot
    pub fn record_length(&self) -> usize {
        self.record_length
    }
}

/// Names are written into every slot verbatim, so anything JSON escapes
/// would make the slot longer than the computed record length.
fn validate_name(name: &str) -> FlatDbResult<()> {
    if name.is_empty() {
        return Err(FlatDbError::schema_violation("Field name must not be empty"));
    }
    if name
        .chars()
        .any(|c| c == '"' || c == '\\' || (c as u32) < 0x20)
    {
        return Err(FlatDbError::schema_violation(format!(
            "Field name {:?} contains characters that require escaping",
            name
        )));
    }
    Ok(())
}

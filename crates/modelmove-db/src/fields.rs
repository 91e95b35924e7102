//! Field and column definitions.
//!
//! A [`FieldDef`] captures everything the migration engine needs to know
//! about a column: its type, constraints, and default. Relational field
//! types carry their target as an `"app_label.model"` string. That string is
//! the part of a field's on-disk representation that changes when a model
//! moves between apps, even though the database-level constraint only cares
//! about the table and column.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Behavior when a referenced object is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnDelete {
    /// Delete all related objects (CASCADE).
    Cascade,
    /// Prevent deletion if related objects exist (RESTRICT).
    Protect,
    /// Set the foreign key to NULL.
    SetNull,
    /// Set the foreign key to its default value.
    SetDefault,
    /// Take no action (may cause integrity errors).
    DoNothing,
}

/// The type of a model field.
///
/// Equality is structural and includes relational targets, so two foreign
/// keys pointing at the same model under different app labels compare
/// unequal. The change detector relies on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    /// Auto-incrementing 32-bit integer primary key.
    AutoField,
    /// Auto-incrementing 64-bit integer primary key.
    BigAutoField,
    /// Variable-length string with a max length.
    CharField,
    /// Unlimited-length text.
    TextField,
    /// 32-bit signed integer.
    IntegerField,
    /// 64-bit signed integer.
    BigIntegerField,
    /// 64-bit floating-point number.
    FloatField,
    /// Fixed-precision decimal number.
    DecimalField {
        /// Maximum total digits.
        max_digits: u32,
        /// Digits after the decimal point.
        decimal_places: u32,
    },
    /// Boolean (true/false).
    BooleanField,
    /// Date without time.
    DateField,
    /// Date and time.
    DateTimeField,
    /// UUID field.
    UuidField,
    /// JSON data.
    JsonField,
    /// Email address (CharField with email validation).
    EmailField,
    /// Slug (URL-friendly string).
    SlugField,
    /// Many-to-one relationship.
    ForeignKey {
        /// The target model reference (e.g. "auth.user").
        to: String,
        /// Behavior when the referenced object is deleted.
        on_delete: OnDelete,
        /// The name used for the reverse relation.
        related_name: Option<String>,
    },
    /// One-to-one relationship (unique foreign key).
    OneToOneField {
        /// The target model reference.
        to: String,
        /// Behavior when the referenced object is deleted.
        on_delete: OnDelete,
        /// The name used for the reverse relation.
        related_name: Option<String>,
    },
    /// Many-to-many relationship (via intermediate table).
    ManyToManyField {
        /// The target model reference.
        to: String,
        /// Optional explicit intermediate ("through") model.
        through: Option<String>,
        /// The name used for the reverse relation.
        related_name: Option<String>,
    },
}

impl FieldType {
    /// Returns `true` if this is a relational type (FK, O2O, M2M).
    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            Self::ForeignKey { .. } | Self::OneToOneField { .. } | Self::ManyToManyField { .. }
        )
    }

    /// Returns the `"app_label.model"` target of a relational type.
    pub fn relation_target(&self) -> Option<&str> {
        match self {
            Self::ForeignKey { to, .. }
            | Self::OneToOneField { to, .. }
            | Self::ManyToManyField { to, .. } => Some(to),
            _ => None,
        }
    }
}

/// Complete definition of a model field.
///
/// Fully serializable so it can live inside migration files and model
/// declaration files alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// The field name.
    pub name: String,
    /// The database column name.
    pub column: String,
    /// The field type.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether NULL is allowed.
    #[serde(default)]
    pub null: bool,
    /// Whether a UNIQUE constraint is applied.
    #[serde(default)]
    pub unique: bool,
    /// Whether a database index should be created.
    #[serde(default)]
    pub db_index: bool,
    /// Maximum character length.
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Default value.
    #[serde(default)]
    pub default: Option<Value>,
}

impl FieldDef {
    /// Creates a new field definition with sensible defaults.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let column = name.clone();
        Self {
            name,
            column,
            field_type,
            primary_key: false,
            null: false,
            unique: false,
            db_index: false,
            max_length: None,
            default: None,
        }
    }

    /// Sets the database column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Marks this field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values.
    pub fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Marks this field as having a UNIQUE constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks this field as having a database index.
    pub fn db_index(mut self) -> Self {
        self.db_index = true;
        self
    }

    /// Sets the maximum character length.
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets the default value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Returns `true` if this is a relational field (FK, O2O, M2M).
    pub fn is_relation(&self) -> bool {
        self.field_type.is_relation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_def_new() {
        let f = FieldDef::new("title", FieldType::CharField);
        assert_eq!(f.name, "title");
        assert_eq!(f.column, "title");
        assert!(!f.primary_key);
        assert!(!f.null);
        assert!(f.default.is_none());
    }

    #[test]
    fn test_field_def_builder() {
        let f = FieldDef::new("email", FieldType::EmailField)
            .column("email_addr")
            .unique()
            .db_index()
            .max_length(254)
            .nullable()
            .default(Value::String(String::new()));
        assert_eq!(f.column, "email_addr");
        assert!(f.unique);
        assert!(f.db_index);
        assert_eq!(f.max_length, Some(254));
        assert!(f.null);
    }

    #[test]
    fn test_is_relation() {
        let fk = FieldDef::new(
            "author",
            FieldType::ForeignKey {
                to: "auth.user".into(),
                on_delete: OnDelete::Cascade,
                related_name: None,
            },
        );
        assert!(fk.is_relation());
        assert_eq!(fk.field_type.relation_target(), Some("auth.user"));

        let text = FieldDef::new("title", FieldType::CharField);
        assert!(!text.is_relation());
        assert_eq!(text.field_type.relation_target(), None);
    }

    #[test]
    fn test_relation_target_in_equality() {
        let a = FieldType::ForeignKey {
            to: "base_app.testmodel".into(),
            on_delete: OnDelete::Cascade,
            related_name: None,
        };
        let b = FieldType::ForeignKey {
            to: "target_app.testmodel".into(),
            on_delete: OnDelete::Cascade,
            related_name: None,
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_serde_roundtrip_fk() {
        let f = FieldDef::new(
            "test_fk",
            FieldType::ForeignKey {
                to: "base_app.testmodel".into(),
                on_delete: OnDelete::Cascade,
                related_name: Some("fk_models".into()),
            },
        )
        .nullable();
        let json = serde_json::to_string(&f).unwrap();
        let back: FieldDef = serde_json::from_str(&json).unwrap();
        assert_eq!(f, back);
    }

    #[test]
    fn test_serde_roundtrip_decimal() {
        let f = FieldDef::new(
            "price",
            FieldType::DecimalField {
                max_digits: 10,
                decimal_places: 2,
            },
        );
        let json = serde_json::to_string(&f).unwrap();
        let back: FieldDef = serde_json::from_str(&json).unwrap();
        assert_eq!(f, back);
    }
}

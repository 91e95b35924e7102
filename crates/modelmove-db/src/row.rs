//! Generic query result rows.

use modelmove_core::{ModelMoveError, ModelMoveResult};

use crate::value::Value;

/// A single result row: column names paired with values.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Returns the value for the given column, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Returns the value for the given column as a string.
    pub fn get_string(&self, column: &str) -> ModelMoveResult<String> {
        match self.get(column) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(ModelMoveError::DatabaseError(format!(
                "Missing '{column}' column"
            ))),
        }
    }

    /// Returns the value for the given column as a 64-bit integer.
    pub fn get_i64(&self, column: &str) -> ModelMoveResult<i64> {
        match self.get(column) {
            Some(Value::Int(i)) => Ok(*i),
            Some(other) => Err(ModelMoveError::DatabaseError(format!(
                "Column '{column}' is not an integer: {other}"
            ))),
            None => Err(ModelMoveError::DatabaseError(format!(
                "Missing '{column}' column"
            ))),
        }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        Row::new(
            vec!["app".into(), "name".into(), "id".into()],
            vec![
                Value::String("blog".into()),
                Value::String("0001_initial".into()),
                Value::Int(1),
            ],
        )
    }

    #[test]
    fn test_get() {
        let row = sample_row();
        assert_eq!(row.get("app"), Some(&Value::String("blog".into())));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_get_string() {
        let row = sample_row();
        assert_eq!(row.get_string("app").unwrap(), "blog");
        assert!(row.get_string("missing").is_err());
    }

    #[test]
    fn test_get_i64() {
        let row = sample_row();
        assert_eq!(row.get_i64("id").unwrap(), 1);
        assert!(row.get_i64("app").is_err());
    }

    #[test]
    fn test_len() {
        let row = sample_row();
        assert_eq!(row.len(), 3);
        assert!(!row.is_empty());
    }
}

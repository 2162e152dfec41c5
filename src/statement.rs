//! Structured statement data handed over by the SQL front end.
//!
//! The front end tokenizes `CREATE TABLE` and `INSERT INTO` text into the
//! plain data types below. This module turns that data into a [`TableSchema`]
//! and, for inserts, into a [`Row`] ready for a slotted page.

use crate::access::{Cell, Row};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: &'static str },

    #[error("Unknown column type: {0}")]
    UnknownColumnType(String),

    #[error("Table '{0}' has no columns")]
    NoColumns(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Statement targets table '{actual}', expected '{expected}'")]
    TableMismatch { expected: String, actual: String },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Invalid {column_type:?} literal for column '{column}': {literal}")]
    InvalidLiteral {
        column: String,
        column_type: ColumnType,
        literal: String,
    },
}

pub type StatementResult<T> = Result<T, StatementError>;

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Text,
    Bool,
}

impl FromStr for ColumnType {
    type Err = StatementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(ColumnType::Int),
            "text" => Ok(ColumnType::Text),
            "bool" | "boolean" => Ok(ColumnType::Bool),
            _ => Err(StatementError::UnknownColumnType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Output of `CREATE TABLE name (col type, ...);`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableData {
    pub table_name: String,
    pub columns: Vec<Column>,
}

/// Output of `INSERT INTO name (cols) VALUES (literals);`. Literals keep the
/// quoting they had in the statement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertData {
    pub table_name: String,
    pub pairs: Vec<(String, String)>,
}

impl InsertData {
    pub fn new<N, V>(table_name: impl Into<String>, pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            table_name: table_name.into(),
            pairs: pairs
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

/// Letter or underscore first, then letters, digits or underscores.
pub fn validate_identifier(name: &str) -> StatementResult<()> {
    let invalid = |reason| StatementError::InvalidIdentifier {
        name: name.to_string(),
        reason,
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("identifier cannot be empty")),
        Some(c) if !(c.is_alphabetic() || c == '_') => {
            return Err(invalid("identifier must start with a letter or underscore"))
        }
        Some(_) => {}
    }
    if chars.any(|c| !(c.is_alphanumeric() || c == '_')) {
        return Err(invalid(
            "identifier can only contain letters, digits, or underscores",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn from_create(data: &CreateTableData) -> StatementResult<Self> {
        validate_identifier(&data.table_name)?;
        if data.columns.is_empty() {
            return Err(StatementError::NoColumns(data.table_name.clone()));
        }
        for (i, column) in data.columns.iter().enumerate() {
            validate_identifier(&column.name)?;
            if data.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(StatementError::DuplicateColumn(column.name.clone()));
            }
        }

        Ok(Self {
            table_name: data.table_name.clone(),
            columns: data.columns.clone(),
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Build a row in schema column order. Columns the insert leaves out are
    /// stored as NULL.
    pub fn build_row(&self, insert: &InsertData) -> StatementResult<Row> {
        if insert.table_name != self.table_name {
            return Err(StatementError::TableMismatch {
                expected: self.table_name.clone(),
                actual: insert.table_name.clone(),
            });
        }

        let mut cells: Vec<Option<Cell>> = vec![None; self.columns.len()];
        for (name, literal) in &insert.pairs {
            let index = self
                .column_index(name)
                .ok_or_else(|| StatementError::UnknownColumn(name.clone()))?;
            if cells[index].is_some() {
                return Err(StatementError::DuplicateColumn(name.clone()));
            }
            cells[index] = Some(parse_literal(&self.columns[index], literal)?);
        }

        Ok(Row::new(
            cells
                .into_iter()
                .map(|cell| cell.unwrap_or(Cell::Null))
                .collect(),
        ))
    }
}

fn parse_literal(column: &Column, literal: &str) -> StatementResult<Cell> {
    let literal = literal.trim();
    if literal.eq_ignore_ascii_case("null") {
        return Ok(Cell::Null);
    }

    let invalid = || StatementError::InvalidLiteral {
        column: column.name.clone(),
        column_type: column.column_type,
        literal: literal.to_string(),
    };

    match column.column_type {
        ColumnType::Int => literal.parse::<i64>().map(Cell::Int64).map_err(|_| invalid()),
        ColumnType::Text => unquote(literal)
            .map(|s| Cell::Text(s.to_string()))
            .ok_or_else(invalid),
        ColumnType::Bool => match literal.to_ascii_lowercase().as_str() {
            "true" => Ok(Cell::Bool(true)),
            "false" => Ok(Cell::Bool(false)),
            _ => Err(invalid()),
        },
    }
}

fn unquote(literal: &str) -> Option<&str> {
    ['"', '\''].iter().find_map(|&q| {
        literal
            .strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn users() -> CreateTableData {
        CreateTableData {
            table_name: "users".to_string(),
            columns: vec![
                Column::new("id", ColumnType::Int),
                Column::new("username", ColumnType::Text),
                Column::new("email", ColumnType::Text),
                Column::new("active", ColumnType::Bool),
            ],
        }
    }

    #[test]
    fn test_column_type_from_str() -> Result<()> {
        assert_eq!("INT".parse::<ColumnType>()?, ColumnType::Int);
        assert_eq!("integer".parse::<ColumnType>()?, ColumnType::Int);
        assert_eq!("Text".parse::<ColumnType>()?, ColumnType::Text);
        assert_eq!("BOOLEAN".parse::<ColumnType>()?, ColumnType::Bool);
        assert!("float".parse::<ColumnType>().is_err());
        Ok(())
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("_tmp2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("user-name").is_err());
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let mut data = users();
        data.columns.push(Column::new("id", ColumnType::Text));
        assert_eq!(
            TableSchema::from_create(&data),
            Err(StatementError::DuplicateColumn("id".to_string()))
        );
    }

    #[test]
    fn test_schema_rejects_empty_table() {
        let data = CreateTableData {
            table_name: "empty".to_string(),
            columns: vec![],
        };
        assert!(matches!(
            TableSchema::from_create(&data),
            Err(StatementError::NoColumns(_))
        ));
    }

    #[test]
    fn test_build_row() -> Result<()> {
        let schema = TableSchema::from_create(&users())?;
        let insert = InsertData::new(
            "users",
            [
                ("email", "\"test@test.com\""),
                ("id", "1"),
                ("username", "'john_doe'"),
                ("active", "TRUE"),
            ],
        );

        let row = schema.build_row(&insert)?;
        assert_eq!(
            row,
            Row::new(vec![
                Cell::Int64(1),
                Cell::from("john_doe"),
                Cell::from("test@test.com"),
                Cell::Bool(true),
            ])
        );
        Ok(())
    }

    #[test]
    fn test_build_row_fills_nulls() -> Result<()> {
        let schema = TableSchema::from_create(&users())?;
        let insert = InsertData::new("users", [("id", "-7"), ("email", "null")]);

        let row = schema.build_row(&insert)?;
        assert_eq!(
            row,
            Row::new(vec![Cell::Int64(-7), Cell::Null, Cell::Null, Cell::Null])
        );
        Ok(())
    }

    #[test]
    fn test_build_row_errors() -> Result<()> {
        let schema = TableSchema::from_create(&users())?;

        let wrong_table = InsertData::new("orders", [("id", "1")]);
        assert!(matches!(
            schema.build_row(&wrong_table),
            Err(StatementError::TableMismatch { .. })
        ));

        let unknown = InsertData::new("users", [("age", "30")]);
        assert_eq!(
            schema.build_row(&unknown),
            Err(StatementError::UnknownColumn("age".to_string()))
        );

        let twice = InsertData::new("users", [("id", "1"), ("id", "2")]);
        assert!(matches!(
            schema.build_row(&twice),
            Err(StatementError::DuplicateColumn(_))
        ));

        let bad_int = InsertData::new("users", [("id", "one")]);
        assert!(matches!(
            schema.build_row(&bad_int),
            Err(StatementError::InvalidLiteral { .. })
        ));

        let unquoted_text = InsertData::new("users", [("username", "john")]);
        assert!(matches!(
            schema.build_row(&unquoted_text),
            Err(StatementError::InvalidLiteral { .. })
        ));

        let bad_bool = InsertData::new("users", [("active", "yes")]);
        assert!(matches!(
            schema.build_row(&bad_bool),
            Err(StatementError::InvalidLiteral { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"a b\""), Some("a b"));
        assert_eq!(unquote("'x'"), Some("x"));
        assert_eq!(unquote("\"\""), Some(""));
        assert_eq!(unquote("\"mixed'"), None);
        assert_eq!(unquote("\""), None);
    }
}

//! Read-only introspection of the player table.
//!
//! The DDL and the distinct team names are read once when a session's agent is built
//! and never refreshed; a changed dataset means building a new session.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::info;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaContext {
    table: String,
    table_ddl: String,
    valid_values: Vec<String>,
}

impl SchemaContext {
    pub fn new(table: impl Into<String>, table_ddl: impl Into<String>, valid_values: Vec<String>) -> Self {
        Self {
            table: table.into(),
            table_ddl: table_ddl.into(),
            valid_values,
        }
    }

    /// Open `db_path` read-only and read the table's `CREATE` statement plus the distinct
    /// non-null values of `group_column`, sorted.
    pub fn load(db_path: impl AsRef<Path>, table: &str, group_column: &str) -> Result<Self, ConfigError> {
        let path = db_path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Schema(format!("database not found: {}", path.display())));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Self::from_connection(&conn, table, group_column)
    }

    pub fn from_connection(conn: &Connection, table: &str, group_column: &str) -> Result<Self, ConfigError> {
        let table_ddl: Option<String> = conn
            .query_row(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .optional()?;
        let table_ddl = table_ddl.ok_or_else(|| ConfigError::Schema(format!("table not found: {}", table)))?;

        let sql = format!(
            "SELECT DISTINCT {col} FROM {tbl} WHERE {col} IS NOT NULL ORDER BY {col}",
            col = quote_ident(group_column),
            tbl = quote_ident(table),
        );
        let mut stmt = conn.prepare(&sql)?;
        let valid_values = stmt
            .query_map([], |row| row.get::<_, rusqlite::types::Value>(0))?
            .map(|value| value.map(value_to_string))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Loaded schema for {}: {} distinct {} values",
            table,
            valid_values.len(),
            group_column
        );
        Ok(Self {
            table: table.to_string(),
            table_ddl,
            valid_values,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn table_ddl(&self) -> &str {
        &self.table_ddl
    }

    pub fn valid_values(&self) -> &[String] {
        &self.valid_values
    }
}

/// Double-quote an SQLite identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn value_to_string(value: rusqlite::types::Value) -> String {
    use rusqlite::types::Value;
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a small player table in a temp file; returns the file handle to keep it alive.
    pub(crate) fn sample_db() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let conn = Connection::open(file.path()).unwrap();
        conn.execute_batch(
            "CREATE TABLE all_players_with_details (
                 \"Player Name\" TEXT,
                 \"Position\" TEXT,
                 \"Team Name\" TEXT
             );
             INSERT INTO all_players_with_details VALUES ('Bukayo Saka', 'Forward', 'Arsenal');
             INSERT INTO all_players_with_details VALUES ('Gabriel Jesus', 'Forward', 'Arsenal');
             INSERT INTO all_players_with_details VALUES ('Bruno Fernandes', 'Midfielder', 'Manchester United');
             INSERT INTO all_players_with_details VALUES ('Unknown', 'Defender', NULL);",
        )
        .unwrap();
        file
    }

    #[test]
    fn test_loads_ddl_and_distinct_teams() {
        let db = sample_db();
        let schema = SchemaContext::load(db.path(), "all_players_with_details", "Team Name").unwrap();
        assert!(schema.table_ddl().starts_with("CREATE TABLE all_players_with_details"));
        assert!(schema.table_ddl().contains("\"Team Name\" TEXT"));
        assert_eq!(schema.valid_values(), &["Arsenal".to_string(), "Manchester United".to_string()]);
    }

    #[test]
    fn test_missing_table_is_config_error() {
        let db = sample_db();
        let err = SchemaContext::load(db.path(), "fixtures", "Team Name").unwrap_err();
        assert!(matches!(err, ConfigError::Schema(msg) if msg.contains("fixtures")));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = SchemaContext::load("/nonexistent/league.db", "t", "c").unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)));
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("Team Name"), "\"Team Name\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::agent_interface::DatabaseAgent;
use crate::agent::input_types::{CompletionRequest, Message};
use crate::agent::stateless_llm::StatelessLLMInterface;
use crate::error::AgentError;

const SQL_WRITER_SYSTEM: &str = "You translate questions into SQLite. \
    Reply with exactly one read-only SELECT statement (a WITH clause is allowed) that answers \
    the request below. Quote column names containing spaces with double quotes. \
    Do not explain, do not add markdown.";

const ANSWER_SYSTEM: &str = "You turn database query results into the final answer requested below. \
    Follow every guideline in the request. Use only the rows provided.";

/// Default database agent: one LLM-written read-only query against SQLite, then one LLM
/// call to shape the rows into the requested answer.
pub struct SqlToolAgent {
    llm: Arc<dyn StatelessLLMInterface>,
    db_path: PathBuf,
    max_tokens: u32,
    timeout: Duration,
}

impl SqlToolAgent {
    pub fn new(
        llm: Arc<dyn StatelessLLMInterface>,
        db_path: impl Into<PathBuf>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        let db_path = db_path.into();
        info!("SqlToolAgent initialized: db_path={:?}", db_path);
        Self {
            llm,
            db_path,
            max_tokens,
            timeout,
        }
    }

    async fn write_query(&self, prompt: &str) -> Result<String, AgentError> {
        let request = CompletionRequest::new(
            vec![Message::system(SQL_WRITER_SYSTEM), Message::user(prompt)],
            self.max_tokens,
            self.timeout,
        )
        .with_temperature(0.0);
        let reply = self.llm.chat_completion(request).await?;
        let sql = extract_sql(&reply);
        ensure_read_only(&sql)?;
        Ok(sql)
    }

    async fn answer(&self, prompt: &str, sql: &str, rows: &[Value]) -> Result<String, AgentError> {
        let rows_json = serde_json::to_string(rows).map_err(|e| AgentError::Invocation(e.to_string()))?;
        let request = CompletionRequest::new(
            vec![
                Message::system(ANSWER_SYSTEM),
                Message::user(prompt),
                Message::assistant(format!("SQL: {}", sql)),
                Message::user(format!(
                    "Query returned {} rows as JSON records:\n{}\nGive the final answer now.",
                    rows.len(),
                    rows_json
                )),
            ],
            self.max_tokens,
            self.timeout,
        )
        .with_temperature(0.0);
        Ok(self.llm.chat_completion(request).await?)
    }
}

#[async_trait]
impl DatabaseAgent for SqlToolAgent {
    async fn invoke(&self, prompt: &str) -> Result<Value, AgentError> {
        let sql = self.write_query(prompt).await?;
        debug!("SqlToolAgent query: {}", sql);

        let db_path = self.db_path.clone();
        let query = sql.clone();
        let rows = tokio::task::spawn_blocking(move || run_read_only_query(&db_path, &query))
            .await
            .map_err(|e| AgentError::Invocation(format!("query task failed: {}", e)))??;
        debug!("SqlToolAgent fetched {} rows", rows.len());

        let output = self.answer(prompt, &sql, &rows).await?;
        Ok(serde_json::json!({ "output": output }))
    }
}

/// Strip code fences and a trailing semicolon from a model-written query.
pub fn extract_sql(reply: &str) -> String {
    let trimmed = reply.trim();
    let inner = trimmed
        .strip_prefix("```sqlite")
        .or_else(|| trimmed.strip_prefix("```sql"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let inner = inner.strip_suffix("```").unwrap_or(inner).trim();
    inner.trim_end_matches(';').trim().to_string()
}

/// Accept a single SELECT or WITH statement only. Semicolons inside quoted literals or
/// identifiers are fine; one that ends a statement is not.
pub fn ensure_read_only(sql: &str) -> Result<(), AgentError> {
    let lowered = sql.trim_start().to_lowercase();
    if !(lowered.starts_with("select") || lowered.starts_with("with")) {
        return Err(AgentError::Query(format!("only SELECT statements are allowed: {}", sql)));
    }
    if has_statement_separator(sql) {
        return Err(AgentError::Query("multiple statements are not allowed".to_string()));
    }
    Ok(())
}

fn has_statement_separator(sql: &str) -> bool {
    let mut quote: Option<char> = None;
    for c in sql.chars() {
        match (quote, c) {
            // A doubled quote ('') closes and reopens, which leaves the state unchanged
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, ';') => return true,
            _ => {}
        }
    }
    false
}

/// Run `sql` on a read-only connection and return each row as a JSON record keyed by column name.
pub fn run_read_only_query(db_path: &std::path::Path, sql: &str) -> Result<Vec<Value>, AgentError> {
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Map::new();
        for (i, column) in columns.iter().enumerate() {
            record.insert(column.clone(), value_ref_to_json(row.get_ref(i)?));
        }
        records.push(Value::Object(record));
    }
    Ok(records)
}

fn value_ref_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}

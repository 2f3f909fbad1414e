use crate::chat_history::HistoryEntry;
use crate::schema::SchemaContext;

/// Assemble the database agent's instructions for one question.
///
/// The schema DDL and every valid team name are embedded verbatim so the agent can map
/// colloquial names to canonical ones. The history block only appears when `history`
/// is non-empty.
pub fn build_sql_prompt(user_query: &str, schema: &SchemaContext, history: &[&HistoryEntry]) -> String {
    let mut history_context = String::new();
    if !history.is_empty() {
        history_context.push_str("Previous conversation for context:\n");
        for entry in history {
            history_context.push_str(&format!(
                "User: {}\nAssistant: {}\n",
                entry.user_query,
                entry.response.to_prompt_text()
            ));
        }
        history_context.push_str("\nConsider this context for the current question.\n");
    }

    format!(
        "You are an expert Premier League SQL agent for the 2025/2026 season. \
         You understand football culture, player information, and common terminology.\n\
         You have access to the '{table}' table with this schema:\n\
         {ddl}\n\
         Valid team names in the database are:\n\
         {teams}\n\
         Guidelines:\n\
         1. Map team references to official club names from the list above (e.g., 'Man U' -> 'Manchester United', 'Spurs' -> 'Tottenham Hotspur').\n\
         2. Resolve ambiguous team names or positions against the valid values before running SQL.\n\
         3. Use synonyms for positions (e.g., 'striker' -> 'forward', 'centre-back' -> 'defender').\n\
         4. Return only relevant columns based on the user's request. Default to player name, position, and team unless specified otherwise.\n\
         5. Do not truncate or limit results unless the user explicitly asks for a bounded set (e.g., 'top 10 players').\n\
         6. Return the final answer as a single JSON object whose keys reflect the user's request. Use arrays for lists and arrays of objects for tabular data.\n\
         7. Output only that JSON object: no prose, no markdown, no code fences. It must be directly parseable.\n\
         8. Avoid verbose or unnecessary fields in the response.\n\
         {history_context}User query: {user_query}",
        table = schema.table(),
        ddl = schema.table_ddl(),
        teams = schema.valid_values().join(", "),
        history_context = history_context,
        user_query = user_query,
    )
}

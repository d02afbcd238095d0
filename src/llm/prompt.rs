//! Prompt builder for SQL translation.

use crate::models::{DatabaseType, TranslationRequest};

/// Fill the translation template with the dialect, schema summary and question.
///
/// The output constraints are only instructions; completions are still
/// cleaned by [`crate::sql::extract_sql`] because models do not always obey.
pub fn build_prompt(dialect: DatabaseType, request: &TranslationRequest) -> String {
    format!(
        "Given the following question, write a SQL query for {dialect} that answers it. \
         Return ONLY the SQL query and nothing else.\n\
         \n\
         **Critical instructions:**\n\
         1. Return ONLY the SQL command.\n\
         2. Do not include explanatory text such as \"Here is the query:\".\n\
         3. Do not wrap the query in markdown code blocks such as ```sql.\n\
         \n\
         Using the table schema below, write a SQL query that answers the user's question.\n\
         \n\
         Schema:\n\
         {schema}\n\
         \n\
         Question: {question}\n\
         Your SQL query:",
        dialect = dialect.display_name(),
        schema = request.schema_text.trim_end(),
        question = request.question.trim(),
    )
}

//! Integration tests for the question pipeline.
//!
//! The completion backend and the statement runner are replaced with
//! in-test mocks, so no server or network is needed.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use talk_to_sql::error::{AppError, AppResult};
use talk_to_sql::format::{NO_RESULTS_MESSAGE, ResultFormatter};
use talk_to_sql::llm::CompletionBackend;
use talk_to_sql::models::{DatabaseType, RawResult, SqlCandidate, TranslationRequest};
use talk_to_sql::pipeline::{Pipeline, StatementRunner};

/// Backend that returns a canned completion and remembers the prompt.
struct MockBackend {
    completion: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    fn answering(completion: &str) -> Self {
        Self {
            completion: Ok(completion.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            completion: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.completion {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(AppError::translation(message.clone())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Runner that returns a canned raw result and records what it was given.
struct MockRunner {
    raw: &'static str,
    executed: Mutex<Vec<String>>,
}

impl MockRunner {
    fn returning(raw: &'static str) -> Self {
        Self {
            raw,
            executed: Mutex::new(Vec::new()),
        }
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatementRunner for MockRunner {
    async fn run(&self, candidate: &SqlCandidate) -> AppResult<RawResult> {
        self.executed
            .lock()
            .unwrap()
            .push(candidate.as_str().to_string());
        Ok(RawResult::from(self.raw))
    }

    fn dialect(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }
}

const USERS_SCHEMA: &str = "CREATE TABLE \"users\" (\n\t\"id\" integer,\n\t\"name\" text\n)";

#[tokio::test]
async fn test_count_question_end_to_end() {
    let backend = Arc::new(MockBackend::answering(
        "```sql\nSELECT COUNT(*) FROM users;\n```",
    ));
    let pipeline = Pipeline::new(backend.clone(), ResultFormatter::default());
    let runner = MockRunner::returning("42");

    let run = pipeline
        .run(
            &runner,
            TranslationRequest::new("How many users are there?", USERS_SCHEMA),
        )
        .await;

    let prompt = backend.last_prompt().expect("backend was called");
    assert!(prompt.contains("How many users are there?"));
    assert!(prompt.contains("users"));
    assert!(prompt.contains("PostgreSQL"));

    assert_eq!(runner.executed(), vec!["SELECT COUNT(*) FROM users;"]);
    assert_eq!(run.sql.as_deref(), Some("SELECT COUNT(*) FROM users;"));
    assert_eq!(run.answer.as_deref(), Some("42"));
    assert!(run.error.is_none());
}

#[tokio::test]
async fn test_row_list_answer() {
    let backend = Arc::new(MockBackend::answering("SELECT name FROM users"));
    let pipeline = Pipeline::new(backend, ResultFormatter::default());
    let runner = MockRunner::returning("[('Alice',), ('Bob',)]");

    let run = pipeline
        .run(&runner, TranslationRequest::new("Who are the users?", USERS_SCHEMA))
        .await;

    assert_eq!(run.answer.as_deref(), Some("- Alice\n- Bob"));
}

#[tokio::test]
async fn test_empty_result_answer() {
    let backend = Arc::new(MockBackend::answering("SELECT name FROM users WHERE false"));
    let pipeline = Pipeline::new(backend, ResultFormatter::default());
    let runner = MockRunner::returning("[]");

    let run = pipeline
        .run(&runner, TranslationRequest::new("Anyone?", USERS_SCHEMA))
        .await;

    assert_eq!(run.answer.as_deref(), Some(NO_RESULTS_MESSAGE));
}

#[tokio::test]
async fn test_all_columns_formatter() {
    let backend = Arc::new(MockBackend::answering("SELECT name, age FROM users"));
    let pipeline = Pipeline::new(backend, ResultFormatter::new(true));
    let runner = MockRunner::returning("[('Alice', 30), ('Bob', None)]");

    let run = pipeline
        .run(&runner, TranslationRequest::new("Ages?", USERS_SCHEMA))
        .await;

    assert_eq!(run.answer.as_deref(), Some("- Alice | 30\n- Bob | None"));
}

#[tokio::test]
async fn test_backend_failure_halts_before_execution() {
    let backend = Arc::new(MockBackend::failing("quota exceeded"));
    let pipeline = Pipeline::new(backend, ResultFormatter::default());
    let runner = MockRunner::returning("42");

    let run = pipeline
        .run(
            &runner,
            TranslationRequest::new("How many users are there?", USERS_SCHEMA),
        )
        .await;

    assert!(run.sql.is_none(), "no SQL is shown after a translation failure");
    assert!(run.answer.is_none());
    let error = run.error.expect("error is surfaced");
    assert!(error.starts_with("Translation failed"));
    assert!(error.contains("quota exceeded"));
    assert!(run.suggestion.is_some());
    assert!(runner.executed().is_empty());
}

#[tokio::test]
async fn test_prose_only_completion_still_runs() {
    // Cleanup is textual; the server is the one that rejects non-SQL
    let backend = Arc::new(MockBackend::answering("I cannot answer that."));
    let pipeline = Pipeline::new(backend, ResultFormatter::default());
    let runner = MockRunner::returning("[]");

    let run = pipeline
        .run(&runner, TranslationRequest::new("?", USERS_SCHEMA))
        .await;

    assert_eq!(runner.executed(), vec!["I cannot answer that."]);
    assert_eq!(run.sql.as_deref(), Some("I cannot answer that."));
}

#[tokio::test]
async fn test_translate_returns_clean_candidate() {
    let backend = Arc::new(MockBackend::answering(
        "Here you go:\n```postgresql\nSELECT 1\n```\nHope it helps!",
    ));
    let pipeline = Pipeline::new(backend, ResultFormatter::default());
    let candidate = pipeline
        .translate(DatabaseType::MySQL, &TranslationRequest::new("one", "schema"))
        .await
        .unwrap();
    assert_eq!(candidate.as_str(), "SELECT 1");
}

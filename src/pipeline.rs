//! One question, one run: prompt, completion, extraction, execution, formatting.
//!
//! Stages run strictly in order and the first failure ends the run. The
//! returned [`PipelineRun`] always carries the question; it carries the SQL
//! once extraction succeeded and the answer only when every stage succeeded.

use crate::db::executor::QueryExecutor;
use crate::db::pool::DbPool;
use crate::error::{AppError, AppResult};
use crate::format::ResultFormatter;
use crate::llm::{CompletionBackend, build_prompt};
use crate::models::{DatabaseType, PipelineRun, RawResult, SqlCandidate, TranslationRequest};
use crate::sql::extract_sql;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Executes a candidate statement.
#[async_trait]
pub trait StatementRunner: Send + Sync {
    async fn run(&self, candidate: &SqlCandidate) -> AppResult<RawResult>;

    fn dialect(&self) -> DatabaseType;

    /// Release the underlying connections.
    async fn close(&self) {}
}

/// Runs statements on a database pool.
#[derive(Debug, Clone)]
pub struct DatabaseRunner {
    executor: QueryExecutor,
    pool: DbPool,
}

impl DatabaseRunner {
    pub fn new(executor: QueryExecutor, pool: DbPool) -> Self {
        Self { executor, pool }
    }
}

#[async_trait]
impl StatementRunner for DatabaseRunner {
    async fn run(&self, candidate: &SqlCandidate) -> AppResult<RawResult> {
        self.executor.execute(&self.pool, candidate).await
    }

    fn dialect(&self) -> DatabaseType {
        self.pool.db_type()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(Clone)]
pub struct Pipeline {
    backend: Arc<dyn CompletionBackend>,
    formatter: ResultFormatter,
}

impl Pipeline {
    pub fn new(backend: Arc<dyn CompletionBackend>, formatter: ResultFormatter) -> Self {
        Self { backend, formatter }
    }

    /// Prompt the backend and extract a candidate statement.
    pub async fn translate(
        &self,
        dialect: DatabaseType,
        request: &TranslationRequest,
    ) -> AppResult<SqlCandidate> {
        let prompt = build_prompt(dialect, request);
        debug!(
            backend = self.backend.name(),
            prompt_chars = prompt.len(),
            "Requesting completion"
        );
        let completion = self.backend.complete(&prompt).await?;
        extract_sql(&completion)
    }

    /// Answer one question.
    ///
    /// Never fails: stage errors are recorded in the returned run.
    pub async fn run(
        &self,
        runner: &dyn StatementRunner,
        request: TranslationRequest,
    ) -> PipelineRun {
        let start = Instant::now();
        let mut run = PipelineRun {
            question: request.question.clone(),
            ..PipelineRun::default()
        };

        let candidate = match self.translate(runner.dialect(), &request).await {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(error = %e, "Translation failed");
                record_error(&mut run, e);
                return run;
            }
        };
        info!(sql = %candidate, "Generated SQL");
        run.sql = Some(candidate.as_str().to_string());

        let raw = match runner.run(&candidate).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Execution failed");
                record_error(&mut run, e);
                return run;
            }
        };

        let answer = self.formatter.format(&raw);
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Question answered"
        );
        run.answer = Some(answer);
        run
    }
}

fn record_error(run: &mut PipelineRun, err: AppError) {
    run.suggestion = err.suggestion().map(str::to_string);
    run.sql_state = err.sql_state().map(str::to_string);
    run.error = Some(err.to_string());
}

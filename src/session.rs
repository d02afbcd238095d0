//! Session context.
//!
//! Holds everything one user has built up: the server connection with its
//! catalog, the selected database with its schema, and the last question.
//! Every operation replaces state wholesale. A failed operation leaves the
//! state it found untouched, except `connect_server`, which always drops the
//! previous server first.
//!
//! Questions are answered outside the session lock: [`Session::prepare_question`]
//! captures what the pipeline needs, and [`Session::finish_question`] stores
//! the result only if nothing changed in the meantime. The newest question wins.

use crate::config::{PipelineOptions, PoolOptions};
use crate::db::{DbPool, QueryExecutor, SchemaInspector, describe_schema, list_databases};
use crate::diagram::SchemaDiagram;
use crate::error::{AppError, AppResult};
use crate::format::ResultFormatter;
use crate::llm::CompletionBackend;
use crate::models::{
    ConnectionTarget, DatabaseCatalog, PipelineRun, SchemaGraph, TranslationRequest,
};
use crate::pipeline::{DatabaseRunner, Pipeline, StatementRunner};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Session shared by every tool call of the running server.
///
/// Connect, select and disconnect hold the lock for their whole run. Questions
/// only take it to start and to store their result.
pub type SharedSession = Arc<Mutex<Session>>;

/// A connected server and its catalog.
pub struct ServerConnection {
    pub target: ConnectionTarget,
    pool: DbPool,
    pub catalog: DatabaseCatalog,
}

/// The database questions are asked against.
pub struct SelectedDatabase {
    pub name: String,
    runner: Arc<dyn StatementRunner>,
    pub graph: SchemaGraph,
    /// Summary handed to the model with every question.
    pub schema_text: String,
    pub diagram: SchemaDiagram,
}

pub struct Session {
    pool_options: PoolOptions,
    options: PipelineOptions,
    executor: QueryExecutor,
    pipeline: Pipeline,
    server: Option<ServerConnection>,
    selected: Option<SelectedDatabase>,
    last_run: Option<PipelineRun>,
    /// Bumped by every state change and every new question.
    epoch: u64,
}

/// Everything needed to answer one question, detached from the session.
pub struct PendingQuestion {
    epoch: u64,
    database: String,
    pipeline: Pipeline,
    runner: Arc<dyn StatementRunner>,
    request: TranslationRequest,
}

impl PendingQuestion {
    pub async fn answer(&self) -> PipelineRun {
        let run = self
            .pipeline
            .run(self.runner.as_ref(), self.request.clone())
            .await;
        if let Some(error) = &run.error {
            warn!(database = %self.database, error = %error, "Question not answered");
        }
        run
    }
}

impl Session {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        pool_options: PoolOptions,
        options: PipelineOptions,
    ) -> Self {
        Self {
            executor: QueryExecutor::with_defaults(options.query_timeout, options.row_limit),
            pipeline: Pipeline::new(backend, ResultFormatter::new(options.all_columns)),
            pool_options,
            options,
            server: None,
            selected: None,
            last_run: None,
            epoch: 0,
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn server(&self) -> Option<&ServerConnection> {
        self.server.as_ref()
    }

    pub fn catalog(&self) -> Option<&DatabaseCatalog> {
        self.server.as_ref().map(|s| &s.catalog)
    }

    pub fn selected(&self) -> Option<&SelectedDatabase> {
        self.selected.as_ref()
    }

    pub fn last_run(&self) -> Option<&PipelineRun> {
        self.last_run.as_ref()
    }

    fn advance(&mut self) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch
    }

    /// Connect at server level and load the catalog.
    ///
    /// The previous server and database are dropped first, so on failure the
    /// session is left disconnected with an empty catalog.
    pub async fn connect_server(
        &mut self,
        target: ConnectionTarget,
    ) -> AppResult<&DatabaseCatalog> {
        self.disconnect().await;

        let server_target = ConnectionTarget {
            database: None,
            ..target
        };
        let pool = DbPool::connect(&server_target, &self.pool_options).await?;
        let catalog = match list_databases(&pool).await {
            Ok(catalog) => catalog,
            Err(e) => {
                pool.close().await;
                return Err(e);
            }
        };

        info!(
            engine = %server_target.engine,
            host = %server_target.host,
            databases = catalog.len(),
            "Connected to server"
        );
        self.advance();
        let server = self.server.insert(ServerConnection {
            target: server_target,
            pool,
            catalog,
        });
        Ok(&server.catalog)
    }

    /// Open `name`, introspect it and make it the current database.
    ///
    /// The current selection stays in place until the new one is complete.
    pub async fn select_database(&mut self, name: &str) -> AppResult<&SelectedDatabase> {
        let server = self.server.as_ref().ok_or(AppError::NoServer)?;
        if !server.catalog.contains(name) {
            return Err(AppError::invalid_input(format!(
                "Database '{}' is not in the catalog of this server",
                name
            )));
        }

        let target = server.target.with_database(name);
        let pool = DbPool::connect(&target, &self.pool_options).await?;
        let graph = match SchemaInspector::inspect(&pool, name).await {
            Ok(graph) => graph,
            Err(e) => {
                pool.close().await;
                return Err(e);
            }
        };
        let schema_text = describe_schema(
            &pool,
            &graph,
            self.options.sample_rows,
            self.options.query_timeout,
        )
        .await;
        let diagram = SchemaDiagram::from_graph(&graph);
        let runner = Arc::new(DatabaseRunner::new(self.executor.clone(), pool));

        if let Some(previous) = self.selected.take() {
            previous.runner.close().await;
        }
        self.last_run = None;
        self.advance();
        info!(
            database = %name,
            tables = graph.tables.len(),
            "Database selected"
        );
        Ok(self.selected.insert(SelectedDatabase {
            name: name.to_string(),
            runner,
            graph,
            schema_text,
            diagram,
        }))
    }

    /// Capture a question against the selected database.
    ///
    /// Clears the previous run. Errors only when there is nothing to ask against.
    pub fn prepare_question(&mut self, question: &str) -> AppResult<PendingQuestion> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::invalid_input("Question must not be empty"));
        }
        if self.server.is_none() {
            return Err(AppError::NoServer);
        }
        let selected = self.selected.as_ref().ok_or(AppError::NoDatabaseSelected)?;

        let database = selected.name.clone();
        let runner = Arc::clone(&selected.runner);
        let request = TranslationRequest::new(question, selected.schema_text.clone());

        self.last_run = None;
        Ok(PendingQuestion {
            epoch: self.advance(),
            database,
            pipeline: self.pipeline.clone(),
            runner,
            request,
        })
    }

    /// Store the run of a prepared question.
    ///
    /// Returns false, keeping nothing, when the session was changed or a newer
    /// question was started after `pending` was prepared.
    pub fn finish_question(&mut self, pending: &PendingQuestion, run: PipelineRun) -> bool {
        if pending.epoch != self.epoch {
            debug!(database = %pending.database, "Session moved on; run not kept");
            return false;
        }
        self.last_run = Some(run);
        true
    }

    /// Answer a question against the selected database.
    ///
    /// Stage failures are part of the returned run, not an `Err`.
    pub async fn ask(&mut self, question: &str) -> AppResult<&PipelineRun> {
        let pending = self.prepare_question(question)?;
        let run = pending.answer().await;
        Ok(self.last_run.insert(run))
    }

    /// Close every pool and forget all state.
    pub async fn disconnect(&mut self) {
        if let Some(selected) = self.selected.take() {
            selected.runner.close().await;
        }
        if let Some(server) = self.server.take() {
            server.pool.close().await;
            info!(host = %server.target.host, "Disconnected");
        }
        self.last_run = None;
        self.advance();
    }
}

/// Answer a question on a shared session without holding its lock meanwhile.
pub async fn ask_shared(session: &SharedSession, question: &str) -> AppResult<PipelineRun> {
    let pending = session.lock().await.prepare_question(question)?;
    let run = pending.answer().await;
    session.lock().await.finish_question(&pending, run.clone());
    Ok(run)
}

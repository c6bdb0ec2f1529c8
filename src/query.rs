//! Execution coordinator
//!
//! A [`Query`] collects statement providers and runs them on one connection
//! taken from its adapter. Every statement is checked and rendered before the
//! connection is acquired, so a programming mistake never leaves a half-run
//! transaction behind.
//!
//! With a single pending statement the coordinator runs it directly. With
//! several, write statements that render to the same SQL text are grouped
//! into one batch (one prepared statement, one parameter row per member) in
//! first-seen order, and row-returning statements run afterwards one by one.
//! Per-statement outcomes go to each provider's `after_query` callback, the
//! aggregate outcome is available through [`Query::succeeded`].

use crate::database::adapter::{DatabaseAdapter, DatabaseConnection};
use crate::database::config::QueryDefaults;
use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::{Error, ErrorChain, ErrorContext, Result};
use crate::result_set::ResultSet;
use crate::statements::{CompiledStatement, QueryOutcome, QueryProvider, RenderContext};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Flags shared with a [`QueryHandle`] while the query runs on a task
#[derive(Debug, Default)]
struct ExecutionFlags {
    executed: AtomicBool,
    succeeded: AtomicBool,
}

impl ExecutionFlags {
    fn reset(&self) {
        self.executed.store(false, Ordering::SeqCst);
        self.succeeded.store(false, Ordering::SeqCst);
    }

    fn finish(&self, succeeded: bool) {
        self.succeeded.store(succeeded, Ordering::SeqCst);
        self.executed.store(true, Ordering::SeqCst);
    }
}

/// A statement checked and rendered ahead of dispatch
struct PlannedStatement {
    index: usize,
    compiled: Option<CompiledStatement>,
    returns_rows: bool,
    follow_ups: Vec<CompiledStatement>,
}

struct Plan {
    statements: Vec<PlannedStatement>,
    single: bool,
    /// False once a statement was rejected as incompatible
    ok: bool,
}

struct BatchMember {
    index: usize,
    params: Vec<SqlValue>,
    follow_ups: Vec<CompiledStatement>,
}

/// Ordered list of statements executed together against one adapter
pub struct Query {
    adapter: Arc<dyn DatabaseAdapter>,
    use_transaction: bool,
    preserve_queries: bool,
    quote_identifiers: bool,
    pending: Vec<Box<dyn QueryProvider>>,
    flags: Arc<ExecutionFlags>,
}

impl Query {
    pub fn new(adapter: Arc<dyn DatabaseAdapter>) -> Self {
        Self::with_defaults(adapter, QueryDefaults::default())
    }

    /// Coordinator configured from loaded [`QueryDefaults`]
    pub fn with_defaults(adapter: Arc<dyn DatabaseAdapter>, defaults: QueryDefaults) -> Self {
        Self {
            adapter,
            use_transaction: defaults.use_transaction,
            preserve_queries: defaults.preserve_queries,
            quote_identifiers: defaults.quote_identifiers,
            pending: Vec::new(),
            flags: Arc::new(ExecutionFlags::default()),
        }
    }

    /// Wrap every execution in one transaction (default: on)
    pub fn use_transaction(mut self, enabled: bool) -> Self {
        self.use_transaction = enabled;
        self
    }

    /// Keep the pending statements after `execute()` (default: off)
    pub fn preserve_queries(mut self, enabled: bool) -> Self {
        self.preserve_queries = enabled;
        self
    }

    /// Quote identifiers in every rendered statement (default: off)
    pub fn quote_identifiers(mut self, enabled: bool) -> Self {
        self.quote_identifiers = enabled;
        self
    }

    pub fn add<P>(&mut self, provider: P) -> &mut Self
    where
        P: QueryProvider + 'static,
    {
        self.pending.push(Box::new(provider));
        self
    }

    pub fn add_boxed(&mut self, provider: Box<dyn QueryProvider>) -> &mut Self {
        self.pending.push(provider);
        self
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn adapter(&self) -> &Arc<dyn DatabaseAdapter> {
        &self.adapter
    }

    /// Whether the last `execute()` reached the end of dispatch
    pub fn executed(&self) -> bool {
        self.flags.executed.load(Ordering::SeqCst)
    }

    /// Whether every statement of the last `execute()` completed
    pub fn succeeded(&self) -> bool {
        self.flags.succeeded.load(Ordering::SeqCst)
    }

    /// Run every pending statement.
    ///
    /// Statement failures are reported through callbacks and
    /// [`succeeded`](Self::succeeded). The returned error is either a
    /// configuration problem found before any I/O, or
    /// [`Error::NotExecutable`] when the connection or transaction control
    /// failed.
    pub async fn execute(&mut self) -> Result<()> {
        self.flags.reset();
        if self.pending.is_empty() {
            log::debug!("No pending statements to execute");
            return Ok(());
        }

        let result = self.run().await;
        if !self.preserve_queries {
            self.pending.clear();
        }
        result
    }

    /// Run the query on a tokio task
    pub fn spawn(mut self) -> QueryHandle {
        let flags = self.flags.clone();
        let task = tokio::spawn(async move {
            let result = self.execute().await;
            (self, result)
        });
        QueryHandle { flags, task }
    }

    async fn run(&mut self) -> Result<()> {
        if !self.adapter.connected() {
            return Err(Error::NotConnected);
        }
        let driver = self.adapter.driver_type();
        let plan = self.prepare(driver)?;

        let mut conn = match self
            .adapter
            .connection()
            .await
            .with_context(|| format!("Failed to acquire a {} connection", driver))
        {
            Ok(conn) => conn,
            Err(e) => {
                log::error!("{}", ErrorChain::new(&e));
                return Err(e.not_executable());
            }
        };
        let outcome = self.dispatch(conn.as_mut(), plan).await;
        let closed = conn.close().await;

        let succeeded = match outcome {
            Ok(succeeded) => {
                if let Err(e) = closed {
                    log::warn!("Failed to release {} connection: {}", driver, e);
                }
                succeeded
            }
            Err(e) => {
                if let Err(close_err) = closed {
                    log::warn!("Failed to release {} connection: {}", driver, close_err);
                }
                log::error!("Query execution aborted: {}", ErrorChain::new(&e));
                return Err(e.not_executable());
            }
        };

        self.flags.finish(succeeded);
        Ok(())
    }

    /// Check and render every pending statement without touching a connection
    fn prepare(&mut self, driver: DriverType) -> Result<Plan> {
        let ctx = RenderContext::new(driver).quote_identifiers(self.quote_identifiers);
        let single = self.pending.len() == 1;
        let mut statements = Vec::with_capacity(self.pending.len());
        let mut ok = true;

        for (index, provider) in self.pending.iter_mut().enumerate() {
            let rendered = if provider.compatibility(driver) {
                provider.render(&ctx)
            } else {
                // Render anyway for the precise reason; fall back to a generic one
                match provider.render(&ctx) {
                    Err(e) if e.is_compatibility() => Err(e),
                    _ => Err(Error::incompatible(driver, provider.kind().to_string())),
                }
            };

            let compiled = match rendered {
                Ok(compiled) => compiled,
                Err(e) if e.is_compatibility() && !single => {
                    log::warn!("Skipping {} statement: {}", provider.kind(), e);
                    provider.hooks().notify(&QueryOutcome::failure(e.to_string()));
                    ok = false;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if self.use_transaction && !provider.transactional(driver) {
                return Err(Error::config(format!(
                    "{} cannot run inside a transaction on {}; disable use_transaction",
                    provider.kind(),
                    driver
                )));
            }

            let follow_ups = if compiled.is_some() {
                provider
                    .follow_ups(driver)?
                    .iter()
                    .map(|follow_up| follow_up.render(&ctx))
                    .filter_map(|rendered| rendered.transpose())
                    .collect::<Result<Vec<_>>>()?
            } else {
                Vec::new()
            };

            statements.push(PlannedStatement {
                index,
                compiled,
                returns_rows: provider.returns_rows(),
                follow_ups,
            });
        }

        Ok(Plan {
            statements,
            single,
            ok,
        })
    }

    /// Run the plan inside the transaction scope. Errors are fatal.
    async fn dispatch(&mut self, conn: &mut dyn DatabaseConnection, plan: Plan) -> Result<bool> {
        if self.use_transaction {
            conn.set_auto_commit(false)
                .await
                .context("Failed to open transaction")?;
        }

        let mut succeeded = plan.ok;
        if plan.single {
            for planned in plan.statements {
                succeeded &= self.run_one(conn, planned).await;
            }
        } else {
            succeeded &= self.run_batched(conn, plan.statements).await;
        }

        if self.use_transaction {
            if succeeded {
                log::debug!("Committing transaction");
                conn.commit().await.context("Failed to commit transaction")?;
            } else {
                log::debug!("Rolling back transaction");
                conn.rollback()
                    .await
                    .context("Failed to roll back transaction")?;
            }
            conn.set_auto_commit(true)
                .await
                .context("Failed to restore auto-commit")?;
        }
        Ok(succeeded)
    }

    async fn run_one(&mut self, conn: &mut dyn DatabaseConnection, planned: PlannedStatement) -> bool {
        let PlannedStatement {
            index,
            compiled,
            returns_rows,
            follow_ups,
        } = planned;
        let Some(compiled) = compiled else {
            self.skip(index);
            return true;
        };

        let outcome = if returns_rows {
            match conn.fetch_all(&compiled.sql, compiled.params).await {
                Ok(rows) => {
                    let count = rows.len() as u64;
                    let mut result_set = ResultSet::new(rows);
                    self.pending[index].hooks().deliver(&mut result_set);
                    Ok(count)
                }
                Err(e) => Err(e),
            }
        } else {
            conn.execute(&compiled.sql, compiled.params)
                .await
                .map(|result| result.rows_affected)
        };

        let outcome = match outcome {
            Ok(count) => run_follow_ups(conn, &follow_ups).await.map(|_| count),
            Err(e) => Err(e),
        };
        self.report(index, &compiled.sql, outcome)
    }

    async fn run_batched(
        &mut self,
        conn: &mut dyn DatabaseConnection,
        statements: Vec<PlannedStatement>,
    ) -> bool {
        let mut buckets: IndexMap<String, Vec<BatchMember>> = IndexMap::new();
        let mut selects = Vec::new();

        for planned in statements {
            match planned.compiled {
                None => self.skip(planned.index),
                Some(compiled) if planned.returns_rows => selects.push(PlannedStatement {
                    compiled: Some(compiled),
                    ..planned
                }),
                Some(compiled) => buckets.entry(compiled.sql).or_default().push(BatchMember {
                    index: planned.index,
                    params: compiled.params,
                    follow_ups: planned.follow_ups,
                }),
            }
        }

        let mut succeeded = true;
        for (sql, members) in buckets {
            let (members, rows): (Vec<_>, Vec<_>) = members
                .into_iter()
                .map(|member| ((member.index, member.follow_ups), member.params))
                .unzip();
            log::debug!("Executing batch of {} statement(s): {}", rows.len(), sql);

            match conn.execute_batch(&sql, rows).await {
                Ok(results) => {
                    for ((index, follow_ups), result) in members.into_iter().zip(results) {
                        let outcome = run_follow_ups(conn, &follow_ups)
                            .await
                            .map(|_| result.rows_affected);
                        succeeded &= self.report(index, &sql, outcome);
                    }
                }
                Err(e) => {
                    log::warn!("Batch failed: {} ({})", sql, e);
                    let outcome = QueryOutcome::failure(e.to_string());
                    for (index, _) in members {
                        self.pending[index].hooks().notify(&outcome);
                    }
                    succeeded = false;
                }
            }
        }

        for planned in selects {
            succeeded &= self.run_one(conn, planned).await;
        }
        succeeded
    }

    fn skip(&mut self, index: usize) {
        let provider = &mut self.pending[index];
        log::warn!("Skipping {} statement: nothing to execute", provider.kind());
        provider
            .hooks()
            .notify(&QueryOutcome::failure("statement rendered no SQL"));
    }

    fn report(&mut self, index: usize, sql: &str, outcome: Result<u64>) -> bool {
        let hooks = self.pending[index].hooks();
        match outcome {
            Ok(rows_affected) => {
                hooks.notify(&QueryOutcome::success(rows_affected));
                true
            }
            Err(e) => {
                let chain = ErrorChain::new(&e);
                log::warn!("Statement failed: {} ({})", sql, chain);
                hooks.notify(&QueryOutcome::failure(chain.to_string()));
                false
            }
        }
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("adapter", &self.adapter.name())
            .field("use_transaction", &self.use_transaction)
            .field("preserve_queries", &self.preserve_queries)
            .field("quote_identifiers", &self.quote_identifiers)
            .field("pending", &self.pending.len())
            .field("flags", &self.flags)
            .finish()
    }
}

async fn run_follow_ups(
    conn: &mut dyn DatabaseConnection,
    follow_ups: &[CompiledStatement],
) -> Result<()> {
    for statement in follow_ups {
        log::debug!("Running follow-up: {}", statement.sql);
        conn.execute(&statement.sql, statement.params.clone())
            .await
            .with_context(|| format!("Deferred statement failed: {}", statement.sql))?;
    }
    Ok(())
}

/// Handle to a query running on a tokio task
#[derive(Debug)]
pub struct QueryHandle {
    flags: Arc<ExecutionFlags>,
    task: JoinHandle<(Query, Result<()>)>,
}

impl QueryHandle {
    pub fn executed(&self) -> bool {
        self.flags.executed.load(Ordering::SeqCst)
    }

    pub fn succeeded(&self) -> bool {
        self.flags.succeeded.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for completion and get the query back with its result
    pub async fn wait(self) -> Result<(Query, Result<()>)> {
        self.task
            .await
            .map_err(|e| Error::internal(format!("Query task did not complete: {}", e)))
    }

    /// Cancel the task. An open transaction is discarded with its connection.
    pub fn abort(&self) {
        self.task.abort();
    }
}

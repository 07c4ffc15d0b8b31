use super::client::GenericClient;
use super::config::EngineConfig;
use super::placeholder::{Segment, Template};
use super::sql_for_log;
use crate::engine::{Dialect, QueryEngine, QueryHandle};
use crate::error::{FragError, FragResult};
use crate::param::Param;
use std::collections::HashMap;
use std::fmt::Write as _;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// PostgreSQL query engine.
///
/// Compiles text with `:name` placeholders into `$1, $2, ...` SQL:
/// - [`Dialect::Managed`]: a collection parameter expands to one placeholder
///   per element, so `id in (:ids)` becomes `id in ($1, $2, $3)`. An empty
///   collection renders `NULL`.
/// - [`Dialect::Native`]: every parameter is one placeholder and collections
///   are sent as arrays, e.g. `id = any(:ids)`.
///
/// Compilation only scans placeholders, quotes and comments. SQL syntax is
/// checked by the server, so a malformed statement finalizes successfully and
/// fails with [`FragError::QueryCompilation`] when it is executed.
#[derive(Debug, Clone, Default)]
pub struct PgEngine {
    config: EngineConfig,
}

impl PgEngine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl QueryEngine for PgEngine {
    type Handle = PgQuery;

    fn compile_managed(&self, text: &str) -> FragResult<PgQuery> {
        PgQuery::compile(Dialect::Managed, text, self.config.clone())
    }

    fn compile_native(&self, text: &str) -> FragResult<PgQuery> {
        PgQuery::compile(Dialect::Native, text, self.config.clone())
    }
}

/// A compiled query with named bindings, ready to execute.
#[derive(Debug, Clone)]
pub struct PgQuery {
    dialect: Dialect,
    template: Template,
    bindings: HashMap<String, Param>,
    retained: HashMap<String, Param>,
    config: EngineConfig,
}

impl PgQuery {
    fn compile(dialect: Dialect, text: &str, config: EngineConfig) -> FragResult<Self> {
        Ok(Self {
            dialect,
            template: Template::parse(text)?,
            bindings: HashMap::new(),
            retained: HashMap::new(),
            config,
        })
    }

    /// The dialect this query was compiled for.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Distinct placeholder names, in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        self.template.names()
    }

    /// The value bound to placeholder `name`.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.bindings.get(name)
    }

    /// A value accepted through [`QueryHandle::bind_detached`] whose
    /// placeholder is not in the text. It is kept but never sent.
    pub fn retained(&self, name: &str) -> Option<&Param> {
        self.retained.get(name)
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> FragResult<String> {
        self.render().map(|(sql, _)| sql)
    }

    /// Parameter refs compatible with `tokio-postgres`, in placeholder order.
    pub fn params_ref(&self) -> FragResult<Vec<&(dyn ToSql + Sync)>> {
        self.render().map(|(_, params)| params)
    }

    fn render(&self) -> FragResult<(String, Vec<&(dyn ToSql + Sync)>)> {
        let mut out = String::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();

        for seg in self.template.segments() {
            let name = match seg {
                Segment::Raw(s) => {
                    out.push_str(s);
                    continue;
                }
                Segment::Named(name) => name.as_str(),
            };

            if !positions.contains_key(name) {
                let value = self
                    .bindings
                    .get(name)
                    .ok_or_else(|| FragError::unbound_parameter(name))?;
                let assigned: Vec<usize> = match (self.dialect, value.elements()) {
                    (Dialect::Managed, Some(items)) => items
                        .iter()
                        .map(|item| {
                            params.push(item.as_ref() as &(dyn ToSql + Sync));
                            params.len()
                        })
                        .collect(),
                    _ => {
                        params.push(value.as_sql());
                        vec![params.len()]
                    }
                };
                positions.insert(name, assigned);
            }

            match positions.get(name).map(Vec::as_slice) {
                Some([]) | None => out.push_str("NULL"),
                Some(idxs) => {
                    for (i, idx) in idxs.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        let _ = write!(&mut out, "${idx}");
                    }
                }
            }
        }

        Ok((out, params))
    }

    fn log_sql(&self, sql: &str, param_count: usize) {
        if !self.config.log_sql {
            return;
        }
        let sql = sql_for_log(sql, self.config.max_sql_length);
        tracing::debug!(
            target: "fragsql.sql",
            dialect = ?self.dialect,
            param_count,
            sql = %sql,
        );
    }

    /// Execute with timeout if configured.
    async fn with_timeout<T, F>(&self, future: F) -> FragResult<T>
    where
        F: std::future::Future<Output = FragResult<T>>,
    {
        match self.config.query_timeout {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| FragError::Timeout(timeout))?,
            None => future.await,
        }
    }

    /// Execute the query and return all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> FragResult<Vec<Row>> {
        let (sql, params) = self.render()?;
        self.log_sql(&sql, params.len());
        self.with_timeout(conn.query(&sql, &params)).await
    }

    /// Execute the query and return the first row.
    ///
    /// Returns `FragError::NotFound` if no rows are returned.
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> FragResult<Row> {
        let (sql, params) = self.render()?;
        self.log_sql(&sql, params.len());
        self.with_timeout(conn.query_one(&sql, &params)).await
    }

    /// Execute the query and return the first row, if any.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> FragResult<Option<Row>> {
        let (sql, params) = self.render()?;
        self.log_sql(&sql, params.len());
        self.with_timeout(conn.query_opt(&sql, &params)).await
    }

    /// Execute the statement and return the number of affected rows.
    pub async fn execute(&self, conn: &impl GenericClient) -> FragResult<u64> {
        let (sql, params) = self.render()?;
        self.log_sql(&sql, params.len());
        self.with_timeout(conn.execute(&sql, &params)).await
    }
}

impl QueryHandle for PgQuery {
    fn bind(mut self, name: &str, value: Param) -> FragResult<Self> {
        if !self.template.contains(name) {
            return Err(FragError::unknown_parameter(name));
        }
        self.bindings.insert(name.to_string(), value);
        Ok(self)
    }

    fn bind_detached(mut self, name: &str, value: Param) -> FragResult<Self> {
        if self.template.contains(name) {
            return self.bind(name, value);
        }
        self.retained.insert(name.to_string(), value);
        Ok(self)
    }
}

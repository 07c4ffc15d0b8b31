//! PostgreSQL engine over `tokio-postgres`.
//!
//! [`PgEngine`] is the default [`QueryEngine`](crate::QueryEngine): it turns
//! `:name` placeholders into `$n` parameters and runs the result on any
//! [`GenericClient`].
//!
//! # Example
//!
//! ```ignore
//! use fragsql::{FragmentAssembler, PgEngine};
//!
//! let mut q = FragmentAssembler::new("select * from users where 1=1");
//! q.append(" and id in (:ids)", "ids", vec![1_i64, 2, 3]);
//!
//! let query = q.finalize_managed(&PgEngine::new())?;
//! assert_eq!(query.to_sql()?, "select * from users where 1=1 and id in ($1, $2, $3)");
//! let rows = query.fetch_all(&client).await?;
//! ```

mod client;
mod config;
mod placeholder;
mod query;

#[cfg(test)]
mod tests;

pub use client::GenericClient;
pub use config::EngineConfig;
pub use query::{PgEngine, PgQuery};

use std::borrow::Cow;

/// SQL as it appears in log events: cut to `max_bytes` with a `...` suffix,
/// or unchanged if it fits (or `max_bytes` is `None`).
pub(crate) fn sql_for_log(sql: &str, max_bytes: Option<usize>) -> Cow<'_, str> {
    match max_bytes {
        Some(max) if sql.len() > max => {
            Cow::Owned(format!("{}...", truncate_sql_bytes(sql, max)))
        }
        _ => Cow::Borrowed(sql),
    }
}

/// Truncate `sql` to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

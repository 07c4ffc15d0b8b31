//! # fragsql
//!
//! Conditional query-fragment assembly with named parameters.
//!
//! Optional filters usually turn into a pile of `if value is set` checks, done
//! twice: once when concatenating SQL and once when binding parameters. Query
//! layers also reject empty collection parameters, so `in (:ids)` with an
//! empty list needs yet another special case.
//!
//! [`FragmentAssembler`] does both sides at once. Each fragment is appended
//! together with its parameter; `NULL` and empty collections are *absent* and
//! the fragment is dropped (or, with [`AbsentPolicy::UnionCompare`], rewritten
//! to compare against the empty set).
//!
//! ```ignore
//! use fragsql::{AbsentPolicy, PgEngine, assemble};
//!
//! let rows = assemble("select * from efficiency_template et where 1=1")
//!     .append(" and et.contract in (:contracts)", "contracts", contracts)
//!     .append(" and et.product in (:products)", "products", products)
//!     .finalize_managed(&PgEngine::new())?
//!     .fetch_all(&client)
//!     .await?;
//! ```
//!
//! The assembled text is handed to a [`QueryEngine`]. [`PgEngine`] is the
//! PostgreSQL implementation over `tokio-postgres`; other engines implement
//! [`QueryEngine`] and [`QueryHandle`].

pub mod assembler;
pub mod engine;
pub mod error;
pub mod param;
pub mod pg;
pub mod policy;

pub use assembler::{Binding, FragmentAssembler, assemble};
pub use engine::{Dialect, QueryEngine, QueryHandle};
pub use error::{FragError, FragResult};
pub use param::{BoxedValue, IntoParam, Param, Presence};
pub use pg::{EngineConfig, GenericClient, PgEngine, PgQuery};
pub use policy::{ALWAYS_FALSE, ALWAYS_TRUE, AbsentPolicy, rewrite_empty_membership};

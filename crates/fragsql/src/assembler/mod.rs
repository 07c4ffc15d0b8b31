//! Conditional query assembly.
//!
//! `FragmentAssembler` replaces hand-written `if value is set { append clause }`
//! chains. Each fragment is appended together with the parameter it uses, and
//! is kept or dropped depending on whether that parameter is present.
//!
//! # Example
//!
//! ```ignore
//! use fragsql::{PgEngine, assemble};
//!
//! let rows = assemble("select id, title from tasks where 1=1")
//!     .append(" and status in (:statuses)", "statuses", statuses)
//!     .append(" and assignee = :assignee", "assignee", assignee)
//!     .push(" order by id")
//!     .finalize_managed(&PgEngine::new())?
//!     .fetch_all(&client)
//!     .await?;
//! ```

use crate::engine::{Dialect, QueryEngine, QueryHandle};
use crate::error::FragResult;
use crate::param::{IntoParam, Param};
use crate::policy::{AbsentPolicy, rewrite_empty_membership};
use std::borrow::Cow;
use std::collections::HashMap;


/// A parameter recorded by the assembler.
#[derive(Debug, Clone)]
pub struct Binding {
    value: Param,
    detached: bool,
}

impl Binding {
    /// The bound value.
    pub fn value(&self) -> &Param {
        &self.value
    }

    /// `true` if the fragment was rewritten and its placeholder is no longer
    /// in the text.
    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

/// Accumulates query text and named parameter bindings.
///
/// Text is append-only; fragments appear in the order they were accepted.
/// Each instance is meant for one query build: finalizing does not clear the
/// state, so reusing an instance carries its bindings over.
#[derive(Debug, Clone, Default)]
pub struct FragmentAssembler {
    text: String,
    bindings: HashMap<String, Binding>,
    policy: AbsentPolicy,
}

/// Start assembling a query from `initial_text`.
pub fn assemble(initial_text: impl Into<String>) -> FragmentAssembler {
    FragmentAssembler::new(initial_text)
}

impl FragmentAssembler {
    /// Create an assembler starting with `initial_text`.
    pub fn new(initial_text: impl Into<String>) -> Self {
        Self {
            text: initial_text.into(),
            bindings: HashMap::new(),
            policy: AbsentPolicy::Omit,
        }
    }

    /// Create an assembler with empty text.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the policy used by subsequent [`append`](Self::append) calls.
    ///
    /// Fragments already appended are not revisited.
    pub fn set_policy(&mut self, policy: AbsentPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Append a fragment unconditionally, without a parameter.
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.text.push_str(fragment);
        self
    }

    /// Append `fragment` with `value` bound to `key`, if `value` is present.
    ///
    /// Present values (anything but `NULL` or an empty collection) are bound
    /// and the fragment is appended verbatim. For absent values:
    /// - [`AbsentPolicy::Omit`]: nothing happens.
    /// - [`AbsentPolicy::UnionCompare`]: `<column> in (:key)` becomes `1 = 0`
    ///   and `<column> not in (:key)` becomes `1 = 1`; the rewritten fragment
    ///   is appended and the value is still recorded.
    pub fn append(&mut self, fragment: &str, key: &str, value: impl IntoParam) -> &mut Self {
        let value = value.into_param();

        if !value.is_absent() {
            return self.bind_and_push(fragment, key, value, false);
        }

        match self.policy {
            AbsentPolicy::Omit => {
                tracing::debug!(
                    target: "fragsql.assemble",
                    key,
                    "omitting fragment for absent parameter"
                );
                self
            }
            AbsentPolicy::UnionCompare => {
                let rewritten = rewrite_empty_membership(fragment, key);
                if matches!(rewritten, Cow::Borrowed(_)) {
                    tracing::warn!(
                        target: "fragsql.assemble",
                        key,
                        fragment,
                        "fragment has no `[not] in (:key)` predicate; appending unchanged"
                    );
                } else {
                    tracing::debug!(
                        target: "fragsql.assemble",
                        key,
                        fragment = %rewritten,
                        "rewrote membership against empty parameter"
                    );
                }
                self.bind_and_push(&rewritten, key, value, true)
            }
        }
    }

    /// Append `fragment` and bind `value` to `key` unconditionally, even if
    /// `value` is `NULL` or empty.
    pub fn append_nullable(
        &mut self,
        fragment: &str,
        key: &str,
        value: impl IntoParam,
    ) -> &mut Self {
        self.bind_and_push(fragment, key, value.into_param(), false)
    }

    fn bind_and_push(
        &mut self,
        fragment: &str,
        key: &str,
        value: Param,
        detached: bool,
    ) -> &mut Self {
        self.bindings
            .insert(key.to_string(), Binding { value, detached });
        self.text.push_str(fragment);
        self
    }

    /// The text assembled so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The current policy.
    pub fn policy(&self) -> AbsentPolicy {
        self.policy
    }

    /// The binding recorded for `name`.
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// The value bound to `name`.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.bindings.get(name).map(Binding::value)
    }

    /// Iterate over all bindings, in no particular order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// `true` if no parameter is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Consume the assembler, returning its text and bindings.
    pub fn into_parts(self) -> (String, HashMap<String, Binding>) {
        (self.text, self.bindings)
    }

    /// Compile the text with the engine's managed query language and bind
    /// every parameter.
    pub fn finalize_managed<E: QueryEngine>(&self, engine: &E) -> FragResult<E::Handle> {
        self.finalize(engine, Dialect::Managed)
    }

    /// Compile the text as native SQL and bind every parameter.
    pub fn finalize_native<E: QueryEngine>(&self, engine: &E) -> FragResult<E::Handle> {
        self.finalize(engine, Dialect::Native)
    }

    fn finalize<E: QueryEngine>(&self, engine: &E, dialect: Dialect) -> FragResult<E::Handle> {
        tracing::trace!(
            target: "fragsql.assemble",
            ?dialect,
            param_count = self.bindings.len(),
            "finalizing assembled query"
        );

        let mut handle = engine.compile(dialect, &self.text)?;
        for (name, binding) in &self.bindings {
            let value = binding.value.clone();
            handle = if binding.detached {
                handle.bind_detached(name, value)?
            } else {
                handle.bind(name, value)?
            };
        }
        Ok(handle)
    }
}

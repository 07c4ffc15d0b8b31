//! The query engine the assembled text is handed to.
//!
//! An engine compiles query text into a handle and accepts named bindings on
//! that handle. [`FragmentAssembler`](crate::FragmentAssembler) never executes
//! anything itself; its `finalize_*` methods are the only point of contact.

use crate::error::FragResult;
use crate::param::Param;

/// Which of the engine's two languages the text is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// The engine's managed query language. Collection parameters are
    /// expanded by the engine.
    Managed,
    /// Raw SQL understood directly by the database.
    Native,
}

/// A query engine able to compile managed and native query text.
pub trait QueryEngine {
    /// The prepared, not-yet-executed query produced by compilation.
    type Handle: QueryHandle;

    /// Compile text written in the managed query language.
    fn compile_managed(&self, text: &str) -> FragResult<Self::Handle>;

    /// Compile text written in the native SQL dialect.
    fn compile_native(&self, text: &str) -> FragResult<Self::Handle>;

    /// Compile `text` for the given dialect.
    fn compile(&self, dialect: Dialect, text: &str) -> FragResult<Self::Handle> {
        match dialect {
            Dialect::Managed => self.compile_managed(text),
            Dialect::Native => self.compile_native(text),
        }
    }
}

/// A compiled query accepting named parameter bindings.
pub trait QueryHandle: Sized {
    /// Bind `value` to the placeholder `name`.
    ///
    /// Fails with [`FragError::UnknownParameter`](crate::FragError::UnknownParameter)
    /// if the compiled text has no such placeholder.
    fn bind(self, name: &str, value: Param) -> FragResult<Self>;

    /// Bind a value whose placeholder may have been rewritten out of the text.
    ///
    /// Engines that reject unused names should accept and retain the value
    /// here. The default implementation is [`QueryHandle::bind`].
    fn bind_detached(self, name: &str, value: Param) -> FragResult<Self> {
        self.bind(name, value)
    }
}

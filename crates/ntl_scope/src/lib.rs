//! ntl_scope: Scope analysis for NTL.
//!
//! Two passes over the AST: a hoist pass that pre-declares function, class,
//! enum, macro and namespace names in each scope, then a visit pass that
//! declares the remaining binding forms and resolves every identifier
//! reference against the scope chain. All scope errors accumulate; the
//! driver aborts the pipeline before codegen if any are present.

mod analyzer;
mod builtins;
mod scope;

pub use analyzer::{analyze, Analyzer};
pub use builtins::GLOBALS;
pub use scope::{Binding, BindingKind, ScopeArena, ScopeId};

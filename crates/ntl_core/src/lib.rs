//! ntl_core: Source positions and text utilities.
//!
//! The bottom crate of the workspace. Everything that needs to talk about
//! "where in the source" goes through [`Span`]; diagnostic rendering reads
//! source lines through [`SourceText`].

pub mod span;
pub mod text;

pub use span::Span;
pub use text::SourceText;

//! ntl_ast: Token and AST definitions for the NTL compiler.
//!
//! The AST is a strict tree of sum types, one variant per node kind, each
//! node carrying a line/column [`ntl_core::Span`]. Nodes reference children
//! through arena-allocated references; the parser owns the arena.

pub mod node;
pub mod token;

pub use node::*;
pub use token::{Token, TokenKind, TokenValue, TemplatePart, KEYWORDS};

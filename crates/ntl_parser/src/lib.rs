//! ntl_parser: Recursive-descent parser for NTL.
//!
//! Consumes the lexer's token vector through a position cursor and builds an
//! arena-allocated AST. Any unexpected token aborts the parse with a single
//! parse-phase diagnostic at the offending token's location.

mod parser;
mod precedence;

pub use parser::Parser;

use bumpalo::Bump;
use ntl_ast::{Expression, SourceFile};
use ntl_diagnostics::Diagnostic;

/// Lex and parse a whole source file into the given arena.
pub fn parse<'a>(
    arena: &'a Bump,
    file_name: &str,
    source: &str,
) -> Result<&'a SourceFile<'a>, Diagnostic> {
    let tokens = ntl_lexer::tokenize(file_name, source)?;
    Parser::new(arena, file_name, tokens).parse_source_file()
}

/// Lex and parse a single expression, used for template-embedded spans.
pub fn parse_expression_source<'a>(
    arena: &'a Bump,
    file_name: &str,
    source: &str,
) -> Result<&'a Expression<'a>, Diagnostic> {
    let tokens = ntl_lexer::tokenize(file_name, source)?;
    Parser::new(arena, file_name, tokens).parse_single_expression()
}

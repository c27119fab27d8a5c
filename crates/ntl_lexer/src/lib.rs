//! ntl_lexer: Lexer/tokenizer for NTL source code.
//!
//! Converts source text into a token vector terminated by an EOF sentinel.
//! Handles:
//! - Numeric literals (hex/binary/octal/decimal, exponents, bigint `n`,
//!   digit-group underscores)
//! - Single- and double-quoted strings; double-quoted strings expand `{...}`
//!   embedded expressions into template parts
//! - Backtick templates with `${...}` embedded expressions
//! - Line (`//`), block (`/* */`) and hash (`#`) comments

mod lexer;

pub use lexer::Lexer;

use ntl_ast::Token;
use ntl_diagnostics::Diagnostic;

/// Tokenize a whole source text. On failure returns the single lex-phase
/// diagnostic that aborted the scan.
pub fn tokenize(file_name: &str, source: &str) -> Result<Vec<Token>, Diagnostic> {
    Lexer::new(file_name, source).tokenize()
}

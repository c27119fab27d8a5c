//! ntl_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Every stage of the pipeline produces [`Diagnostic`] values and accumulates
//! them in a [`DiagnosticList`]; the driver concatenates the per-stage lists.
//! Rendering (source excerpt, caret underline, suggestion blocks) lives in
//! [`render`], fuzzy similar-name search in [`suggest`], and the translation
//! of host JavaScript engine errors in [`translate`].

pub mod render;
pub mod suggest;
pub mod translate;

use ntl_core::Span;
use std::fmt;

/// The pipeline stage a diagnostic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Lex,
    Parse,
    Scope,
    Type,
    Compile,
    Runtime,
    Resolve,
    Macro,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Lex => "lex",
            Phase::Parse => "parse",
            Phase::Scope => "scope",
            Phase::Type => "type",
            Phase::Compile => "compile",
            Phase::Runtime => "runtime",
            Phase::Resolve => "resolve",
            Phase::Macro => "macro",
        };
        write!(f, "{}", label)
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Stable code tags attached to diagnostics that tooling matches on.
pub mod codes {
    pub const UNDEF_VAR: &str = "UNDEF_VAR";
    pub const UNDEF_FUNC: &str = "UNDEF_FUNC";
    pub const CONST_REASSIGN: &str = "CONST_REASSIGN";
    pub const TYPE_MISMATCH: &str = "TYPE_MISMATCH";
    pub const NOT_FUNCTION: &str = "NOT_FUNCTION";
    pub const NULL_ACCESS: &str = "NULL_ACCESS";
    pub const DUP_PARAM: &str = "DUP_PARAM";
    pub const DUP_DECL: &str = "DUP_DECL";
    pub const UNKNOWN_MODULE: &str = "UNKNOWN_MODULE";
    pub const STACK_OVERFLOW: &str = "STACK_OVERFLOW";
}

/// A name in scope that is close to a misspelled reference, with the line it
/// was declared on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarName {
    pub name: String,
    pub declared_line: u32,
}

/// A pair of code snippets showing the mistake and the fix.
#[derive(Debug, Clone)]
pub struct Example {
    pub bad: String,
    pub good: String,
}

/// A realized diagnostic with location and presentation payload.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
    pub code: Option<&'static str>,
    pub file: Option<String>,
    pub span: Option<Span>,
    /// Names in scope similar to the offending one.
    pub similar: Vec<SimilarName>,
    /// Numbered fix suggestions, rendered in order.
    pub suggestions: Vec<String>,
    /// Optional bad/good example pair.
    pub example: Option<Example>,
}

impl Diagnostic {
    pub fn error(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            severity: Severity::Error,
            message: message.into(),
            code: None,
            file: None,
            span: None,
            similar: Vec::new(),
            suggestions: Vec::new(),
            example: None,
        }
    }

    pub fn warning(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(phase, message)
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_similar(mut self, similar: Vec<SimilarName>) -> Self {
        self.similar = similar;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_example(mut self, bad: impl Into<String>, good: impl Into<String>) -> Self {
        self.example = Some(Example {
            bad: bad.into(),
            good: good.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}", file)?;
            if let Some(span) = self.span {
                write!(f, ":{}", span)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{} {}", self.phase, self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// A collection of diagnostics accumulated during compilation.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticList {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticList {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| !d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticList) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Split into (errors, warnings), preserving order within each.
    pub fn partition(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        self.diagnostics.into_iter().partition(Diagnostic::is_error)
    }

    /// Sort by file then line then column.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            let file_cmp = a.file.cmp(&b.file);
            if file_cmp != std::cmp::Ordering::Equal {
                return file_cmp;
            }
            let a_pos = a.span.map(|s| (s.line, s.column)).unwrap_or((0, 0));
            let b_pos = b.span.map(|s| (s.line, s.column)).unwrap_or((0, 0));
            a_pos.cmp(&b_pos)
        });
    }
}

impl IntoIterator for DiagnosticList {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl FromIterator<Diagnostic> for DiagnosticList {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            diagnostics: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_file_span_and_code() {
        let d = Diagnostic::error(Phase::Scope, "x is not defined")
            .with_code(codes::UNDEF_VAR)
            .with_file("main.ntl")
            .with_span(Span::new(4, 12));
        assert_eq!(
            d.to_string(),
            "main.ntl:4:12: scope error[UNDEF_VAR]: x is not defined"
        );
    }

    #[test]
    fn list_counts_by_severity() {
        let mut list = DiagnosticList::new();
        list.add(Diagnostic::error(Phase::Parse, "bad"));
        list.add(Diagnostic::warning(Phase::Type, "iffy"));
        assert!(list.has_errors());
        assert_eq!(list.error_count(), 1);
        assert_eq!(list.warning_count(), 1);
    }

    #[test]
    fn sort_orders_by_position() {
        let mut list = DiagnosticList::new();
        list.add(Diagnostic::error(Phase::Parse, "b").with_span(Span::new(9, 1)));
        list.add(Diagnostic::error(Phase::Parse, "a").with_span(Span::new(2, 5)));
        list.sort();
        assert_eq!(list.diagnostics()[0].message, "a");
    }
}

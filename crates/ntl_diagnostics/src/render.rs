//! Terminal rendering of diagnostics.
//!
//! A rendered diagnostic is a block of up to six regions: header, location,
//! source excerpt with a caret underline, explanation, numbered suggestions,
//! similar names, and an optional bad/good example pair.

use crate::{Diagnostic, Severity};
use ntl_core::SourceText;
use std::fmt::Write;

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// How many lines of context to show around the offending line.
const EXCERPT_CONTEXT: u32 = 2;

/// Whether diagnostics should be colored: requires a terminal on stderr and
/// no `NO_COLOR` in the environment.
pub fn use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    stderr_is_terminal()
}

fn stderr_is_terminal() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::isatty(2) != 0 }
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Render one diagnostic to a string. `source` is the text of the file the
/// diagnostic points into, when available.
pub fn render(diag: &Diagnostic, source: Option<&str>, color: bool) -> String {
    let mut out = String::new();
    let (mark, label) = match diag.severity {
        Severity::Error => (if color { RED } else { "" }, "Error"),
        Severity::Warning => (if color { YELLOW } else { "" }, "Warning"),
    };
    let reset = if color { RESET } else { "" };
    let bold = if color { BOLD } else { "" };
    let cyan = if color { CYAN } else { "" };
    let gray = if color { GRAY } else { "" };

    // Header: severity, phase label, code tag.
    let _ = write!(out, "{}{}{} [{}]", bold, mark, label, diag.phase);
    if let Some(code) = diag.code {
        let _ = write!(out, " {}", code);
    }
    let _ = writeln!(out, "{}: {}", reset, diag.message);

    // Location line.
    if let Some(span) = diag.span {
        let file = diag.file.as_deref().unwrap_or("<input>");
        let _ = writeln!(out, "{}  at {}:{}{}", gray, file, span, reset);
    }
    let _ = writeln!(out);

    // Source excerpt with caret underline.
    if let (Some(span), Some(source)) = (diag.span, source) {
        let text = SourceText::new(source);
        let lines = text.excerpt(span.line, EXCERPT_CONTEXT);
        let width = lines
            .iter()
            .map(|(n, _)| n.to_string().len())
            .max()
            .unwrap_or(1);
        for (number, line) in lines {
            let offending = number == span.line;
            let pointer = if offending { ">" } else { " " };
            let line_color = if offending { mark } else { gray };
            let _ = writeln!(
                out,
                "{} {:>width$} | {}{}{}",
                pointer,
                number,
                line_color,
                line,
                reset,
                width = width
            );
            if offending {
                let pad = span.column.saturating_sub(1) as usize;
                let _ = writeln!(
                    out,
                    "  {:>width$} | {}{}^{}",
                    "",
                    " ".repeat(pad),
                    mark,
                    reset,
                    width = width
                );
            }
        }
        let _ = writeln!(out);
    }

    // Numbered suggestions.
    if !diag.suggestions.is_empty() {
        let _ = writeln!(out, "{}Suggestions:{}", cyan, reset);
        for (i, suggestion) in diag.suggestions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, suggestion);
        }
        let _ = writeln!(out);
    }

    // Similar names in scope.
    if !diag.similar.is_empty() {
        let _ = writeln!(out, "{}Similar names in scope:{}", cyan, reset);
        for similar in &diag.similar {
            let _ = writeln!(
                out,
                "  - {} {}(declared on line {}){}",
                similar.name, gray, similar.declared_line, reset
            );
        }
        let _ = writeln!(out);
    }

    // Bad/good example.
    if let Some(ref example) = diag.example {
        let _ = writeln!(out, "{}Example:{}", cyan, reset);
        let _ = writeln!(out, "  {}wrong:{} {}", mark, reset, example.bad);
        let _ = writeln!(out, "  {}right:{} {}", cyan, reset, example.good);
        let _ = writeln!(out);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codes, Diagnostic, Phase};
    use ntl_core::Span;

    #[test]
    fn plain_render_has_all_regions() {
        let diag = Diagnostic::error(Phase::Scope, "'usrname' is not defined")
            .with_code(codes::UNDEF_VAR)
            .with_file("main.ntl")
            .with_span(Span::new(2, 8))
            .with_suggestion("Declare it: val usrname = ...")
            .with_similar(vec![crate::SimilarName {
                name: "username".to_string(),
                declared_line: 1,
            }]);
        let source = "val username = \"x\"\nreturn usrname\n";
        let rendered = render(&diag, Some(source), false);
        assert!(rendered.contains("Error [scope] UNDEF_VAR"));
        assert!(rendered.contains("at main.ntl:2:8"));
        assert!(rendered.contains("return usrname"));
        assert!(rendered.contains("^"));
        assert!(rendered.contains("Suggestions:"));
        assert!(rendered.contains("Similar names in scope:"));
        assert!(rendered.contains("declared on line 1"));
    }

    #[test]
    fn caret_is_under_the_column() {
        let diag = Diagnostic::error(Phase::Parse, "unexpected token")
            .with_span(Span::new(1, 5));
        let rendered = render(&diag, Some("val x = ;"), false);
        let caret_line = rendered
            .lines()
            .find(|l| l.contains('^'))
            .expect("caret line");
        // "  1 | val x = ;" puts source column 1 at text column 7;
        // column 5 therefore lands the caret at text column 11.
        assert_eq!(caret_line.find('^'), Some(10));
    }

    #[test]
    fn example_pair_renders_both_sides() {
        let diag = Diagnostic::error(Phase::Scope, "print is not defined")
            .with_example("print(\"Hello\")", "console.log(\"Hello\")");
        let rendered = render(&diag, None, false);
        assert!(rendered.contains("wrong: print(\"Hello\")"));
        assert!(rendered.contains("right: console.log(\"Hello\")"));
    }
}

//! Lexer integration tests.
//!
//! Verifies tokenization of the NTL surface syntax.

use ntl_ast::{TemplatePart, TokenKind, TokenValue};
use ntl_lexer::tokenize;

/// Helper: tokenize and strip the EOF sentinel.
fn scan(source: &str) -> Vec<ntl_ast::Token> {
    let mut tokens = tokenize("test.ntl", source).expect("lex failure");
    let eof = tokens.pop().expect("missing EOF sentinel");
    assert_eq!(eof.kind, TokenKind::Eof);
    tokens
}

fn scan_kinds(source: &str) -> Vec<TokenKind> {
    scan(source).into_iter().map(|t| t.kind).collect()
}

#[test]
fn empty_source_is_just_eof() {
    let tokens = tokenize("test.ntl", "").unwrap();
    assert_eq!(tokens.len(), 1);
    assert!(tokens[0].is_eof());
}

#[test]
fn keywords_and_identifiers() {
    let tokens = scan("val greeting fn ifset username spawn");
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::Keyword,
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::Keyword,
        ]
    );
    assert_eq!(tokens[1].text(), "greeting");
}

#[test]
fn numeric_literal_formats() {
    let tokens = scan("42 3.14 1e3 2.5e-2 0xFF 0b1010 0o77 1_000_000");
    let values: Vec<f64> = tokens
        .iter()
        .map(|t| match &t.value {
            TokenValue::Number(n) => *n,
            other => panic!("expected number, got {:?}", other),
        })
        .collect();
    assert_eq!(values, vec![42.0, 3.14, 1000.0, 0.025, 255.0, 10.0, 63.0, 1_000_000.0]);
}

#[test]
fn bigint_literals_keep_their_digits() {
    let tokens = scan("123n 0xFFn");
    assert_eq!(tokens[0].value, TokenValue::BigInt("123".to_string()));
    assert_eq!(tokens[1].value, TokenValue::BigInt("0xFF".to_string()));
}

#[test]
fn plain_strings() {
    let tokens = scan(r#""hello" 'world'"#);
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].text(), "hello");
    assert_eq!(tokens[1].text(), "world");
}

#[test]
fn string_escapes() {
    let tokens = scan(r#""a\nb\t\x41B\u{1F600}""#);
    assert_eq!(tokens[0].text(), "a\nb\tAB\u{1F600}");
}

#[test]
fn double_quoted_interpolation_becomes_template() {
    let tokens = scan(r#""Hello, {name}!""#);
    assert_eq!(tokens[0].kind, TokenKind::Template);
    match &tokens[0].value {
        TokenValue::Template(parts) => {
            assert_eq!(
                parts,
                &vec![
                    TemplatePart::Text("Hello, ".to_string()),
                    TemplatePart::Expr("name".to_string()),
                    TemplatePart::Text("!".to_string()),
                ]
            );
        }
        other => panic!("expected template, got {:?}", other),
    }
}

#[test]
fn single_quoted_strings_do_not_interpolate() {
    let tokens = scan("'Hello, {name}!'");
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].text(), "Hello, {name}!");
}

#[test]
fn backtick_template_with_nested_braces() {
    let tokens = scan("`sum: ${f({a: 1})}`");
    match &tokens[0].value {
        TokenValue::Template(parts) => {
            assert_eq!(parts.len(), 2);
            assert_eq!(parts[1], TemplatePart::Expr("f({a: 1})".to_string()));
        }
        other => panic!("expected template, got {:?}", other),
    }
}

#[test]
fn template_may_start_or_end_with_expression() {
    let tokens = scan("`${a}mid${b}`");
    match &tokens[0].value {
        TokenValue::Template(parts) => {
            assert!(matches!(parts[0], TemplatePart::Expr(_)));
            assert!(matches!(parts[2], TemplatePart::Expr(_)));
        }
        other => panic!("expected template, got {:?}", other),
    }
}

#[test]
fn greedy_operator_scan() {
    let tokens = scan("=== !== >>> ?. ... :: |> => -> ??= ** ++");
    let texts: Vec<_> = tokens.iter().map(|t| t.text().to_string()).collect();
    assert_eq!(
        texts,
        vec!["===", "!==", ">>>", "?.", "...", "::", "|>", "=>", "->", "??=", "**", "++"]
    );
    assert!(tokens.iter().all(|t| t.kind == TokenKind::Operator));
}

#[test]
fn punctuation_set() {
    let kinds = scan_kinds("{ } ( ) [ ] , . ;");
    assert!(kinds.iter().all(|k| *k == TokenKind::Punct));
}

#[test]
fn comments_are_skipped() {
    let tokens = scan("a // line\nb /* block\nstill */ c # hash\nd");
    let texts: Vec<_> = tokens.iter().map(|t| t.text().to_string()).collect();
    assert_eq!(texts, vec!["a", "b", "c", "d"]);
}

#[test]
fn line_and_column_tracking() {
    let tokens = scan("val x\n  fn y");
    assert_eq!((tokens[0].span.line, tokens[0].span.column), (1, 1));
    assert_eq!((tokens[1].span.line, tokens[1].span.column), (1, 5));
    assert_eq!((tokens[2].span.line, tokens[2].span.column), (2, 3));
    assert_eq!((tokens[3].span.line, tokens[3].span.column), (2, 6));
}

#[test]
fn unterminated_string_is_a_lex_error() {
    let err = tokenize("test.ntl", "\"oops").unwrap_err();
    assert_eq!(err.phase, ntl_diagnostics::Phase::Lex);
    assert!(err.message.contains("unterminated"));
}

#[test]
fn unexpected_character_is_a_lex_error() {
    let err = tokenize("test.ntl", "val x = §").unwrap_err();
    assert!(err.message.contains("unexpected character"));
}

#[test]
fn token_round_trip_relexes_identically() {
    // Concatenating token texts with whitespace and re-lexing yields an
    // equivalent stream (for sources without template expressions).
    let source = "fn add(a, b) { return a + b ** 2 }";
    let first = scan(source);
    let joined: Vec<String> = first
        .iter()
        .map(|t| match &t.value {
            TokenValue::Str(s) => s.clone(),
            TokenValue::Number(n) => n.to_string(),
            TokenValue::BigInt(d) => format!("{}n", d),
            _ => String::new(),
        })
        .collect();
    let second = scan(&joined.join(" "));
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.value, b.value);
    }
}

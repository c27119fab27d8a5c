//! The NTL lexer.
//!
//! A deterministic scan over the source characters with a mutable
//! position/line/column cursor. Template-embedded expressions are captured as
//! raw source spans with brace-depth tracking; the parser re-parses them.

use ntl_ast::{TemplatePart, Token, TokenKind, TokenValue, KEYWORDS};
use ntl_core::Span;
use ntl_diagnostics::{Diagnostic, Phase};

/// Multi-character operators, longest first so greedy matching is correct.
const MULTI_OPERATORS: &[&str] = &[
    "===", "!==", "<<=", ">>=", "**=", "&&=", "||=", "??=", ">>>", "...",
    "==", "!=", "<=", ">=", "&&", "||", "??", "|>", "=>", "->", "++", "--",
    "+=", "-=", "*=", "/=", "%=", "**", "<<", ">>", "?.", "::",
];

/// Single-character operators, tried after the multi-character table.
const SINGLE_OPERATORS: &[char] = &[
    '=', '+', '-', '*', '/', '%', '<', '>', '!', '~', '&', '|', '^', '?',
    ':', '@',
];

const PUNCTUATION: &[char] = &['{', '}', '(', ')', '[', ']', ',', '.', ';'];

pub struct Lexer<'s> {
    file_name: &'s str,
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
}

impl<'s> Lexer<'s> {
    pub fn new(file_name: &'s str, source: &'s str) -> Self {
        Self {
            file_name,
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    /// Scan the whole input. The returned vector always ends with exactly one
    /// EOF sentinel token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        loop {
            self.skip_trivia();
            if self.is_eof() {
                break;
            }
            self.scan_token()?;
        }
        let span = self.span();
        self.tokens.push(Token::eof(span));
        Ok(self.tokens)
    }

    // ========================================================================
    // Cursor
    // ========================================================================

    #[inline]
    fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    #[inline]
    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Advance one character, tracking line and column.
    fn bump(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    #[inline]
    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn error(&self, span: Span, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(Phase::Lex, message)
            .with_file(self.file_name)
            .with_span(span)
    }

    // ========================================================================
    // Trivia
    // ========================================================================

    fn skip_trivia(&mut self) {
        loop {
            match self.current() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.current() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.current() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    while !self.is_eof() {
                        if self.current() == Some('*') && self.peek_at(1) == Some('/') {
                            self.bump();
                            self.bump();
                            break;
                        }
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    // ========================================================================
    // Token dispatch
    // ========================================================================

    fn scan_token(&mut self) -> Result<(), Diagnostic> {
        let span = self.span();
        let ch = self.current().expect("scan_token past EOF");

        if ch.is_ascii_alphabetic() || ch == '_' || ch == '$' {
            self.scan_identifier(span);
            return Ok(());
        }
        if ch.is_ascii_digit() {
            return self.scan_number(span);
        }
        match ch {
            '"' | '\'' => self.scan_string(span, ch),
            '`' => self.scan_backtick_template(span),
            _ => self.scan_operator_or_punct(span),
        }
    }

    fn push(&mut self, kind: TokenKind, value: TokenValue, span: Span) {
        self.tokens.push(Token::new(kind, value, span));
    }

    // ========================================================================
    // Identifiers and keywords
    // ========================================================================

    fn scan_identifier(&mut self, span: Span) {
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = if KEYWORDS.contains(&text.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.push(kind, TokenValue::Str(text), span);
    }

    // ========================================================================
    // Numbers
    // ========================================================================

    fn scan_number(&mut self, span: Span) -> Result<(), Diagnostic> {
        let mut raw = String::new();

        if self.current() == Some('0') {
            match self.peek_at(1) {
                Some('x') | Some('X') => return self.scan_radix_number(span, 16),
                Some('b') | Some('B') => return self.scan_radix_number(span, 2),
                Some('o') | Some('O') => return self.scan_radix_number(span, 8),
                _ => {}
            }
        }

        self.consume_digits(&mut raw);
        let mut is_float = false;
        if self.current() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            raw.push('.');
            self.bump();
            self.consume_digits(&mut raw);
        }
        if matches!(self.current(), Some('e') | Some('E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(1), Some('+') | Some('-')) {
                lookahead = 2;
            }
            if self.peek_at(lookahead).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                raw.push('e');
                self.bump();
                if matches!(self.current(), Some('+') | Some('-')) {
                    raw.push(self.current().unwrap());
                    self.bump();
                }
                self.consume_digits(&mut raw);
            }
        }

        if self.current() == Some('n') && !is_float {
            self.bump();
            self.push(TokenKind::Number, TokenValue::BigInt(raw), span);
            return Ok(());
        }

        let value: f64 = raw
            .parse()
            .map_err(|_| self.error(span, format!("invalid number literal '{}'", raw)))?;
        self.push(TokenKind::Number, TokenValue::Number(value), span);
        Ok(())
    }

    /// `0x...` / `0b...` / `0o...`, with optional bigint `n` suffix.
    fn scan_radix_number(&mut self, span: Span, radix: u32) -> Result<(), Diagnostic> {
        let prefix_char = self.peek_at(1).unwrap();
        self.bump();
        self.bump();
        let mut digits = String::new();
        while let Some(c) = self.current() {
            if c == '_' {
                self.bump();
                continue;
            }
            if c.is_digit(radix) {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            return Err(self.error(span, format!("missing digits after '0{}'", prefix_char)));
        }
        if self.current() == Some('n') {
            self.bump();
            let raw = format!("0{}{}", prefix_char, digits);
            self.push(TokenKind::Number, TokenValue::BigInt(raw), span);
            return Ok(());
        }
        let value = u128::from_str_radix(&digits, radix)
            .map_err(|_| self.error(span, format!("invalid base-{} literal", radix)))?;
        self.push(TokenKind::Number, TokenValue::Number(value as f64), span);
        Ok(())
    }

    fn consume_digits(&mut self, out: &mut String) {
        while let Some(c) = self.current() {
            if c == '_' {
                self.bump();
                continue;
            }
            if c.is_ascii_digit() {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
    }

    // ========================================================================
    // Strings and templates
    // ========================================================================

    /// Quoted string. Double-quoted strings expand `{...}` embeddings into
    /// template parts; single-quoted strings do not.
    fn scan_string(&mut self, span: Span, quote: char) -> Result<(), Diagnostic> {
        self.bump();
        let interpolate = quote == '"';
        let mut parts: Vec<TemplatePart> = Vec::new();
        let mut text = String::new();

        loop {
            let Some(c) = self.current() else {
                return Err(self.error(span, "unterminated string literal"));
            };
            match c {
                c if c == quote => {
                    self.bump();
                    break;
                }
                '\n' => return Err(self.error(span, "unterminated string literal")),
                '\\' => {
                    self.bump();
                    let escaped = self.scan_escape(span)?;
                    text.push_str(&escaped);
                }
                '{' if interpolate => {
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    }
                    self.bump();
                    let expr = self.capture_embedded(span, '{', '}')?;
                    parts.push(TemplatePart::Expr(expr));
                }
                _ => {
                    text.push(c);
                    self.bump();
                }
            }
        }

        if parts.is_empty() {
            self.push(TokenKind::String, TokenValue::Str(text), span);
        } else {
            if !text.is_empty() {
                parts.push(TemplatePart::Text(text));
            }
            self.push(TokenKind::Template, TokenValue::Template(parts), span);
        }
        Ok(())
    }

    /// Backtick template with `${...}` embeddings. Always a template token,
    /// even without embeddings.
    fn scan_backtick_template(&mut self, span: Span) -> Result<(), Diagnostic> {
        self.bump();
        let mut parts: Vec<TemplatePart> = Vec::new();
        let mut text = String::new();

        loop {
            let Some(c) = self.current() else {
                return Err(self.error(span, "unterminated template literal"));
            };
            match c {
                '`' => {
                    self.bump();
                    break;
                }
                '\\' => {
                    self.bump();
                    let escaped = self.scan_escape(span)?;
                    text.push_str(&escaped);
                }
                '$' if self.peek_at(1) == Some('{') => {
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    }
                    self.bump();
                    self.bump();
                    let expr = self.capture_embedded(span, '{', '}')?;
                    parts.push(TemplatePart::Expr(expr));
                }
                _ => {
                    text.push(c);
                    self.bump();
                }
            }
        }

        if !text.is_empty() {
            parts.push(TemplatePart::Text(text));
        }
        self.push(TokenKind::Template, TokenValue::Template(parts), span);
        Ok(())
    }

    /// Capture the raw source of an embedded expression, with depth tracking
    /// for nested braces. The opening delimiter has been consumed; the
    /// closing one is consumed here but excluded from the capture.
    fn capture_embedded(
        &mut self,
        start: Span,
        open: char,
        close: char,
    ) -> Result<String, Diagnostic> {
        let mut depth = 1u32;
        let mut raw = String::new();
        loop {
            let Some(c) = self.current() else {
                return Err(self.error(start, "unterminated embedded expression"));
            };
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    self.bump();
                    return Ok(raw);
                }
            }
            raw.push(c);
            self.bump();
        }
    }

    /// One escape sequence; the backslash has been consumed.
    fn scan_escape(&mut self, start: Span) -> Result<String, Diagnostic> {
        let Some(c) = self.bump() else {
            return Err(self.error(start, "unterminated string literal"));
        };
        let s = match c {
            'n' => "\n".to_string(),
            't' => "\t".to_string(),
            'r' => "\r".to_string(),
            '0' => "\0".to_string(),
            '\\' => "\\".to_string(),
            '"' => "\"".to_string(),
            '\'' => "'".to_string(),
            '`' => "`".to_string(),
            '{' => "{".to_string(),
            '$' => "$".to_string(),
            'x' => {
                let code = self.scan_hex_digits(start, 2)?;
                char::from_u32(code)
                    .map(|c| c.to_string())
                    .ok_or_else(|| self.error(start, "invalid \\x escape"))?
            }
            'u' => {
                if self.current() == Some('{') {
                    self.bump();
                    let mut digits = String::new();
                    while let Some(c) = self.current() {
                        if c == '}' {
                            break;
                        }
                        digits.push(c);
                        self.bump();
                    }
                    if self.current() != Some('}') {
                        return Err(self.error(start, "unterminated \\u{...} escape"));
                    }
                    self.bump();
                    let code = u32::from_str_radix(&digits, 16)
                        .map_err(|_| self.error(start, "invalid \\u{...} escape"))?;
                    char::from_u32(code)
                        .map(|c| c.to_string())
                        .ok_or_else(|| self.error(start, "invalid \\u{...} escape"))?
                } else {
                    let code = self.scan_hex_digits(start, 4)?;
                    char::from_u32(code)
                        .map(|c| c.to_string())
                        .ok_or_else(|| self.error(start, "invalid \\u escape"))?
                }
            }
            other => other.to_string(),
        };
        Ok(s)
    }

    fn scan_hex_digits(&mut self, start: Span, count: usize) -> Result<u32, Diagnostic> {
        let mut digits = String::new();
        for _ in 0..count {
            let Some(c) = self.current() else {
                return Err(self.error(start, "unterminated escape sequence"));
            };
            if !c.is_ascii_hexdigit() {
                return Err(self.error(start, "invalid hexadecimal escape"));
            }
            digits.push(c);
            self.bump();
        }
        u32::from_str_radix(&digits, 16)
            .map_err(|_| self.error(start, "invalid hexadecimal escape"))
    }

    // ========================================================================
    // Operators and punctuation
    // ========================================================================

    fn scan_operator_or_punct(&mut self, span: Span) -> Result<(), Diagnostic> {
        for op in MULTI_OPERATORS {
            if self.matches_at(op) {
                for _ in 0..op.chars().count() {
                    self.bump();
                }
                self.push(TokenKind::Operator, TokenValue::Str((*op).to_string()), span);
                return Ok(());
            }
        }
        let ch = self.current().unwrap();
        if PUNCTUATION.contains(&ch) {
            self.bump();
            self.push(TokenKind::Punct, TokenValue::Str(ch.to_string()), span);
            return Ok(());
        }
        if SINGLE_OPERATORS.contains(&ch) {
            self.bump();
            self.push(TokenKind::Operator, TokenValue::Str(ch.to_string()), span);
            return Ok(());
        }
        Err(self.error(span, format!("unexpected character '{}'", ch)))
    }

    fn matches_at(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }
}

//! The NTL parser implementation.
//!
//! A recursive descent parser over the lexer's token vector. The cursor only
//! moves forward; lookahead beyond two tokens is limited to arrow-function
//! disambiguation, which scans for the `)` matching an open paren.

use bumpalo::Bump;
use ntl_ast::*;
use ntl_core::Span;
use ntl_diagnostics::{Diagnostic, Phase};

use crate::precedence::{binary_op_of, ASSIGN_OPERATORS};

type PResult<T> = Result<T, Diagnostic>;

pub struct Parser<'a> {
    arena: &'a Bump,
    file_name: String,
    tokens: Vec<Token>,
    pos: usize,
    /// Suppresses the postfix `as` cast while parsing an `ifset` subject,
    /// where `as` introduces the alias instead.
    no_as: bool,
}

impl<'a> Parser<'a> {
    pub fn new(arena: &'a Bump, file_name: &str, tokens: Vec<Token>) -> Self {
        debug_assert!(matches!(tokens.last(), Some(t) if t.is_eof()));
        Self {
            arena,
            file_name: file_name.to_string(),
            tokens,
            pos: 0,
            no_as: false,
        }
    }

    /// Parse a whole source file.
    pub fn parse_source_file(mut self) -> PResult<&'a SourceFile<'a>> {
        let statements = self.parse_statements_until_eof()?;
        Ok(self.arena.alloc(SourceFile {
            file_name: self.file_name.clone(),
            statements,
        }))
    }

    /// Parse exactly one expression spanning the whole input. Used for
    /// template-embedded expression spans and the REPL's expression echo.
    pub fn parse_single_expression(mut self) -> PResult<&'a Expression<'a>> {
        let expr = self.parse_expression()?;
        if !self.at().is_eof() {
            return Err(self.error_here(format!(
                "unexpected {} after expression",
                self.at().describe()
            )));
        }
        Ok(expr)
    }

    // ========================================================================
    // Token cursor
    // ========================================================================

    #[inline]
    fn at(&self) -> &Token {
        &self.tokens[self.pos]
    }

    #[inline]
    fn peek(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    #[inline]
    fn span(&self) -> Span {
        self.at().span
    }

    fn at_kw(&self, kw: &str) -> bool {
        self.at().is_keyword(kw)
    }

    fn at_op(&self, op: &str) -> bool {
        self.at().is_operator(op)
    }

    fn at_punct(&self, punct: &str) -> bool {
        self.at().is_punct(punct)
    }

    fn eat_kw(&mut self, kw: &str) -> PResult<Span> {
        if self.at_kw(kw) {
            Ok(self.advance().span)
        } else {
            Err(self.error_here(format!("expected '{}', found {}", kw, self.at().describe())))
        }
    }

    fn eat_op(&mut self, op: &str) -> PResult<Span> {
        if self.at_op(op) {
            Ok(self.advance().span)
        } else {
            Err(self.error_here(format!("expected '{}', found {}", op, self.at().describe())))
        }
    }

    fn eat_punct(&mut self, punct: &str) -> PResult<Span> {
        if self.at_punct(punct) {
            Ok(self.advance().span)
        } else {
            Err(self.error_here(format!(
                "expected '{}', found {}",
                punct,
                self.at().describe()
            )))
        }
    }

    fn eat_if_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_if_kw(&mut self, kw: &str) -> bool {
        if self.at_kw(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_if_punct(&mut self, punct: &str) -> bool {
        if self.at_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Semicolons are optional statement terminators.
    fn eat_semi(&mut self) {
        self.eat_if_punct(";");
    }

    /// Whether a line break separates the current token from the previous
    /// one. Drives the return/yield same-line operand heuristic.
    fn is_line_end(&self) -> bool {
        if self.pos == 0 {
            return false;
        }
        self.tokens[self.pos].span.line > self.tokens[self.pos - 1].span.line
    }

    fn error_here(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(Phase::Parse, message)
            .with_file(self.file_name.clone())
            .with_span(self.span())
    }

    fn ident(&mut self) -> PResult<Identifier> {
        if self.at().kind == TokenKind::Identifier {
            let token = self.advance();
            Ok(Identifier {
                span: token.span,
                name: token.text().to_string(),
            })
        } else {
            Err(self.error_here(format!(
                "expected identifier, found {}",
                self.at().describe()
            )))
        }
    }

    /// An identifier or keyword used as a name (after `.`, member names).
    fn name_like(&mut self) -> PResult<Identifier> {
        match self.at().kind {
            TokenKind::Identifier | TokenKind::Keyword => {
                let token = self.advance();
                Ok(Identifier {
                    span: token.span,
                    name: token.text().to_string(),
                })
            }
            _ => Err(self.error_here(format!(
                "expected name, found {}",
                self.at().describe()
            ))),
        }
    }

    #[inline]
    fn alloc<T>(&self, value: T) -> &'a T {
        self.arena.alloc(value)
    }

    fn alloc_slice<T>(&self, vec: Vec<T>) -> &'a [T] {
        self.arena.alloc_slice_fill_iter(vec)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statements_until_eof(&mut self) -> PResult<&'a [Statement<'a>]> {
        let mut statements = Vec::new();
        while !self.at().is_eof() {
            statements.push(self.parse_statement()?);
        }
        Ok(self.alloc_slice(statements))
    }

    fn parse_block(&mut self) -> PResult<&'a Block<'a>> {
        let span = self.eat_punct("{")?;
        let mut statements = Vec::new();
        while !self.at_punct("}") {
            if self.at().is_eof() {
                return Err(self.error_here("unterminated block, expected '}'"));
            }
            statements.push(self.parse_statement()?);
        }
        self.eat_punct("}")?;
        Ok(self.alloc(Block {
            span,
            statements: self.alloc_slice(statements),
        }))
    }

    /// Wrap a single expression into a one-statement block so match and
    /// select arms have one downstream shape.
    fn expr_block(&mut self, expr: &'a Expression<'a>) -> &'a Block<'a> {
        let span = expr.span();
        let stmt = Statement::Expr(self.alloc(ExprStmt { span, expr }));
        self.alloc(Block {
            span,
            statements: self.alloc_slice(vec![stmt]),
        })
    }

    fn parse_statement(&mut self) -> PResult<Statement<'a>> {
        if self.at_op("@") {
            return self.parse_decorated_statement();
        }
        if self.at_punct("{") {
            return Ok(Statement::Block(self.parse_block()?));
        }
        if self.at().kind == TokenKind::Keyword {
            let kw = self.at().text().to_string();
            return match kw.as_str() {
                "val" | "const" => self.parse_var_statement(true, false),
                "var" | "let" => self.parse_var_statement(false, false),
                "immutable" => {
                    self.advance();
                    if !self.at_kw("val") && !self.at_kw("const") {
                        return Err(self.error_here("expected 'val' after 'immutable'"));
                    }
                    self.parse_var_statement(true, true)
                }
                "fn" => {
                    let decl = self.parse_fn_decl(false, &[])?;
                    Ok(Statement::Fn(decl))
                }
                "async" => {
                    if self.peek(1).is_keyword("fn") {
                        self.advance();
                        let decl = self.parse_fn_decl(true, &[])?;
                        Ok(Statement::Fn(decl))
                    } else {
                        self.parse_expression_statement()
                    }
                }
                "abstract" => {
                    self.advance();
                    if !self.at_kw("class") {
                        return Err(self.error_here("expected 'class' after 'abstract'"));
                    }
                    let decl = self.parse_class_decl(&[], true)?;
                    Ok(Statement::Class(decl))
                }
                "class" => {
                    let decl = self.parse_class_decl(&[], false)?;
                    Ok(Statement::Class(decl))
                }
                "interface" => self.parse_interface(),
                "trait" => self.parse_trait(),
                "type" | "alias" => self.parse_type_alias(),
                "enum" => self.parse_enum(),
                "namespace" | "module" => self.parse_namespace(),
                "macro" => self.parse_macro(),
                "using" => self.parse_using(),
                "if" => Ok(Statement::If(self.parse_if()?)),
                "unless" => self.parse_unless(),
                "while" => self.parse_while(),
                "do" => self.parse_do_while(),
                "for" => self.parse_for(),
                "loop" => self.parse_loop(),
                "return" => self.parse_return(),
                "throw" | "raise" => self.parse_throw(),
                "try" => self.parse_try(),
                "match" => self.parse_match(),
                "break" => {
                    let span = self.advance().span;
                    self.eat_semi();
                    Ok(Statement::Break(self.alloc(BreakStmt { span })))
                }
                "continue" => {
                    let span = self.advance().span;
                    self.eat_semi();
                    Ok(Statement::Continue(self.alloc(ContinueStmt { span })))
                }
                "ifset" => self.parse_ifset(),
                "spawn" => self.parse_spawn(),
                "select" => self.parse_select(),
                "import" => self.parse_import(),
                "export" => self.parse_export(),
                "require" => {
                    if self.peek(1).is_punct("(") && self.peek(2).is_keyword("ntl") {
                        self.parse_ntl_require()
                    } else {
                        self.parse_expression_statement()
                    }
                }
                _ => self.parse_expression_statement(),
            };
        }
        if self.at().kind == TokenKind::Identifier
            && self.at().text() == "declare"
            && self.peek(1).kind == TokenKind::Keyword
        {
            let span = self.advance().span;
            let inner = self.parse_statement()?;
            return Ok(Statement::Declare(self.alloc(DeclareStmt {
                span,
                inner: self.alloc(inner),
            })));
        }
        self.parse_expression_statement()
    }

    fn parse_expression_statement(&mut self) -> PResult<Statement<'a>> {
        let expr = self.parse_expression()?;
        self.eat_semi();
        Ok(Statement::Expr(self.alloc(ExprStmt {
            span: expr.span(),
            expr,
        })))
    }

    /// `@dec ...` at statement level binds to the following function, async
    /// function, or class; anything else is a decorated expression.
    fn parse_decorated_statement(&mut self) -> PResult<Statement<'a>> {
        let mut decorators = Vec::new();
        while self.at_op("@") {
            decorators.push(self.parse_decorator()?);
        }
        if self.at_kw("fn") {
            let decl = self.parse_fn_decl(false, &decorators)?;
            return Ok(Statement::Fn(decl));
        }
        if self.at_kw("async") && self.peek(1).is_keyword("fn") {
            self.advance();
            let decl = self.parse_fn_decl(true, &decorators)?;
            return Ok(Statement::Fn(decl));
        }
        if self.at_kw("class") || (self.at_kw("abstract") && self.peek(1).is_keyword("class")) {
            let is_abstract = self.eat_if_kw("abstract");
            let decl = self.parse_class_decl(&decorators, is_abstract)?;
            return Ok(Statement::Class(decl));
        }
        // Decorated expression statement: wrap innermost-first.
        let mut expr = self.parse_expression()?;
        for decorator in decorators.into_iter().rev() {
            let span = decorator.span;
            expr = self.alloc(Expression::Decorated(self.alloc(DecoratedExpr {
                span,
                decorator,
                expr,
            })));
        }
        self.eat_semi();
        Ok(Statement::Expr(self.alloc(ExprStmt {
            span: expr.span(),
            expr,
        })))
    }

    fn parse_decorator(&mut self) -> PResult<Decorator<'a>> {
        let span = self.eat_op("@")?;
        let mut name = self.ident()?.name;
        while self.at_punct(".") && self.peek(1).kind == TokenKind::Identifier {
            self.advance();
            name.push('.');
            name.push_str(&self.ident()?.name);
        }
        let args = if self.at_punct("(") {
            Some(self.parse_arguments()?)
        } else {
            None
        };
        Ok(Decorator { span, name, args })
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    fn parse_var_statement(&mut self, constant: bool, immutable: bool) -> PResult<Statement<'a>> {
        let span = self.advance().span; // val/var/let/const
        let first = self.parse_var_declarator(span, constant, immutable)?;
        if !self.at_punct(",") {
            self.eat_semi();
            return Ok(Statement::Var(self.alloc(first)));
        }
        let mut decls = vec![first];
        while self.eat_if_punct(",") {
            let decl_span = self.span();
            decls.push(self.parse_var_declarator(decl_span, constant, immutable)?);
        }
        self.eat_semi();
        Ok(Statement::MultiVar(self.alloc(MultiVarDecl {
            span,
            decls: self.alloc_slice(decls),
        })))
    }

    fn parse_var_declarator(
        &mut self,
        span: Span,
        constant: bool,
        immutable: bool,
    ) -> PResult<VarDecl<'a>> {
        let target = self.parse_binding_target()?;
        let ty = if self.eat_if_op(":") {
            Some(self.parse_type_expr()?)
        } else {
            None
        };
        let init = if self.eat_if_op("=") {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        Ok(VarDecl {
            span,
            target,
            ty,
            init,
            constant,
            immutable,
        })
    }

    fn parse_fn_decl(
        &mut self,
        is_async: bool,
        decorators: &[Decorator<'a>],
    ) -> PResult<&'a FnDecl<'a>> {
        let span = self.eat_kw("fn")?;
        let is_generator = self.eat_if_op("*");
        let name = self.ident()?;
        let generics = self.parse_generics_raw()?;
        let params = self.parse_params()?;
        let return_ty = self.parse_return_type()?;
        let body = self.parse_block()?;
        let decorators = self.alloc_slice(decorators.iter().map(clone_decorator).collect::<Vec<_>>());
        Ok(self.alloc(FnDecl {
            span,
            name,
            generics,
            params,
            return_ty,
            body,
            is_async,
            is_generator,
            decorators,
        }))
    }

    /// Optional `-> T` (or `=> T`) return annotation.
    fn parse_return_type(&mut self) -> PResult<Option<TypeExpr>> {
        if self.eat_if_op("->") || self.eat_if_op("=>") {
            Ok(Some(self.parse_type_expr()?))
        } else {
            Ok(None)
        }
    }

    /// Raw generic parameter text, e.g. `<T, U extends V>`; erased later.
    fn parse_generics_raw(&mut self) -> PResult<Option<String>> {
        if !self.at_op("<") {
            return Ok(None);
        }
        self.advance();
        let mut depth = 1u32;
        let mut parts: Vec<String> = Vec::new();
        while depth > 0 {
            if self.at().is_eof() {
                return Err(self.error_here("unterminated generic parameter list"));
            }
            if self.at_op("<") {
                depth += 1;
                parts.push(self.advance().text().to_string());
                continue;
            }
            let text = self.at().text().to_string();
            let closes = match text.as_str() {
                ">" => 1u32,
                ">>" => 2,
                ">>>" => 3,
                _ => 0,
            };
            if closes == 0 || closes < depth {
                depth -= closes;
                parts.push(self.advance().text().to_string());
            } else if closes == depth {
                self.advance();
                depth = 0;
            } else {
                // The token closes this list and part of an enclosing one;
                // leave the remainder in the stream.
                let rest = &text[..(closes - depth) as usize];
                let span = self.span();
                self.tokens[self.pos] = Token::new(
                    TokenKind::Operator,
                    TokenValue::Str(rest.to_string()),
                    span,
                );
                depth = 0;
            }
        }
        Ok(Some(parts.join(" ")))
    }

    fn parse_class_decl(
        &mut self,
        decorators: &[Decorator<'a>],
        is_abstract: bool,
    ) -> PResult<&'a ClassDecl<'a>> {
        let span = self.eat_kw("class")?;
        let name = self.ident()?;
        let generics = self.parse_generics_raw()?;
        let superclass = if self.eat_if_kw("extends") {
            Some(self.parse_dotted_path()?)
        } else {
            None
        };
        let mut implements = Vec::new();
        if self.eat_if_kw("implements") {
            implements.push(self.parse_dotted_path()?);
            while self.eat_if_punct(",") {
                implements.push(self.parse_dotted_path()?);
            }
        }
        self.eat_punct("{")?;
        let mut members = Vec::new();
        while !self.at_punct("}") {
            if self.at().is_eof() {
                return Err(self.error_here("unterminated class body"));
            }
            members.push(self.parse_class_member()?);
        }
        self.eat_punct("}")?;
        let decorators = self.alloc_slice(decorators.iter().map(clone_decorator).collect::<Vec<_>>());
        Ok(self.alloc(ClassDecl {
            span,
            name,
            generics,
            superclass,
            implements,
            members: self.alloc_slice(members),
            decorators,
            is_abstract,
        }))
    }

    fn parse_class_member(&mut self) -> PResult<ClassMember<'a>> {
        let span = self.span();
        let mut visibility = Visibility::Public;
        let mut is_static = false;
        let mut is_async = false;
        let mut is_readonly = false;
        loop {
            if self.at_kw("public") {
                self.advance();
                visibility = Visibility::Public;
            } else if self.at_kw("private") {
                self.advance();
                visibility = Visibility::Private;
            } else if self.at_kw("protected") {
                self.advance();
                visibility = Visibility::Protected;
            } else if self.at_kw("static") {
                self.advance();
                is_static = true;
            } else if self.at_kw("readonly") {
                self.advance();
                is_readonly = true;
            } else if self.at_kw("async") {
                self.advance();
                is_async = true;
            } else if self.at_kw("abstract") || self.at_kw("override") {
                self.advance();
            } else {
                break;
            }
        }

        let mut kind = MemberKind::Method;
        if (self.at_kw("get") || self.at_kw("set"))
            && (self.peek(1).kind == TokenKind::Identifier
                || self.peek(1).kind == TokenKind::Keyword)
        {
            kind = if self.at_kw("get") {
                MemberKind::Getter
            } else {
                MemberKind::Setter
            };
            self.advance();
        }
        self.eat_if_kw("fn");
        let name = self.name_like()?;

        if self.at_punct("(") {
            let params = self.parse_params()?;
            let return_ty = self.parse_return_type()?;
            let body = if self.at_punct("{") {
                Some(self.parse_block()?)
            } else {
                // Abstract methods and trait requirements have no body.
                self.eat_semi();
                None
            };
            Ok(ClassMember {
                span,
                name,
                kind,
                params,
                return_ty,
                ty: None,
                init: None,
                body,
                is_static,
                is_async,
                is_readonly,
                visibility,
            })
        } else {
            let ty = if self.eat_if_op(":") {
                Some(self.parse_type_expr()?)
            } else {
                None
            };
            let init = if self.eat_if_op("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            self.eat_semi();
            Ok(ClassMember {
                span,
                name,
                kind: MemberKind::Field,
                params: &[],
                return_ty: None,
                ty,
                init,
                body: None,
                is_static,
                is_async: false,
                is_readonly,
                visibility,
            })
        }
    }

    fn parse_interface(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("interface")?;
        let name = self.ident()?;
        let _generics = self.parse_generics_raw()?;
        let mut extends = Vec::new();
        if self.eat_if_kw("extends") {
            extends.push(self.parse_dotted_path()?);
            while self.eat_if_punct(",") {
                extends.push(self.parse_dotted_path()?);
            }
        }
        self.eat_punct("{")?;
        let mut members = Vec::new();
        while !self.at_punct("}") {
            if self.at().is_eof() {
                return Err(self.error_here("unterminated interface body"));
            }
            let member_name = self.name_like()?;
            self.eat_if_op("?");
            let ty_text = if self.at_punct("(") {
                let params = self.capture_balanced("(", ")")?;
                let ret = if self.eat_if_op("->") || self.eat_if_op("=>") {
                    format!(" -> {}", self.parse_type_expr()?.text)
                } else {
                    String::new()
                };
                format!("({}){}", params, ret)
            } else {
                self.eat_op(":")?;
                self.parse_type_expr()?.text
            };
            members.push((member_name, ty_text));
            if !self.eat_if_punct(";") {
                self.eat_if_punct(",");
            }
        }
        self.eat_punct("}")?;
        Ok(Statement::Interface(self.alloc(InterfaceDecl {
            span,
            name,
            extends,
            members,
        })))
    }

    fn parse_trait(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("trait")?;
        let name = self.ident()?;
        self.eat_punct("{")?;
        let mut members = Vec::new();
        while !self.at_punct("}") {
            if self.at().is_eof() {
                return Err(self.error_here("unterminated trait body"));
            }
            members.push(self.parse_class_member()?);
        }
        self.eat_punct("}")?;
        Ok(Statement::Trait(self.alloc(TraitDecl {
            span,
            name,
            members: self.alloc_slice(members),
        })))
    }

    fn parse_type_alias(&mut self) -> PResult<Statement<'a>> {
        let span = self.advance().span; // type / alias
        let name = self.ident()?;
        let generics = self.parse_generics_raw()?;
        self.eat_op("=")?;

        // Algebraic sum detection: `type R = Ok(v) | Err(e)`.
        let target = if self.at().kind == TokenKind::Identifier && self.peek(1).is_punct("(") {
            let mut variants = Vec::new();
            loop {
                let variant_span = self.span();
                let variant_name = self.ident()?;
                let mut fields = Vec::new();
                if self.eat_if_punct("(") {
                    while !self.at_punct(")") {
                        fields.push(self.capture_variant_field()?);
                        if !self.eat_if_punct(",") {
                            break;
                        }
                    }
                    self.eat_punct(")")?;
                }
                variants.push(VariantDef {
                    span: variant_span,
                    name: variant_name,
                    fields,
                });
                if !self.eat_if_op("|") {
                    break;
                }
            }
            TypeAliasTarget::Algebraic(self.alloc_slice(variants))
        } else {
            TypeAliasTarget::Plain(self.parse_type_expr()?)
        };
        self.eat_semi();
        Ok(Statement::TypeAlias(self.alloc(TypeAliasDecl {
            span,
            name,
            generics,
            target,
        })))
    }

    /// One variant field's raw text, up to the next `,` or `)`.
    fn capture_variant_field(&mut self) -> PResult<String> {
        let mut depth = 0u32;
        let mut parts: Vec<String> = Vec::new();
        loop {
            if self.at().is_eof() {
                return Err(self.error_here("unterminated variant field list"));
            }
            if depth == 0 && (self.at_punct(",") || self.at_punct(")")) {
                break;
            }
            if self.at_punct("(") || self.at_punct("[") || self.at_punct("{") {
                depth += 1;
            } else if self.at_punct(")") || self.at_punct("]") || self.at_punct("}") {
                depth = depth.saturating_sub(1);
            }
            parts.push(self.advance().text().to_string());
        }
        Ok(parts.join(" "))
    }

    fn parse_enum(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("enum")?;
        let name = self.ident()?;
        self.eat_punct("{")?;
        let mut members = Vec::new();
        while !self.at_punct("}") {
            let member_span = self.span();
            let member_name = self.name_like()?;
            let value = if self.eat_if_op("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            members.push(EnumMember {
                span: member_span,
                name: member_name,
                value,
            });
            if !self.eat_if_punct(",") {
                break;
            }
        }
        self.eat_punct("}")?;
        Ok(Statement::Enum(self.alloc(EnumDecl {
            span,
            name,
            members: self.alloc_slice(members),
        })))
    }

    fn parse_namespace(&mut self) -> PResult<Statement<'a>> {
        let span = self.advance().span; // namespace / module
        let name = self.ident()?;
        let body = self.parse_block()?;
        Ok(Statement::Namespace(self.alloc(NamespaceDecl {
            span,
            name,
            body,
        })))
    }

    fn parse_macro(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("macro")?;
        let name = self.ident()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(Statement::Macro(self.alloc(MacroDecl {
            span,
            name,
            params,
            body,
        })))
    }

    fn parse_using(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("using")?;
        let name = self.ident()?;
        self.eat_op("=")?;
        let init = self.parse_assignment()?;
        self.eat_semi();
        Ok(Statement::Using(self.alloc(UsingDecl { span, name, init })))
    }

    fn parse_ntl_require(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("require")?;
        self.eat_punct("(")?;
        self.eat_kw("ntl")?;
        let mut modules = Vec::new();
        while self.eat_if_punct(",") {
            let token = self.advance();
            match token.kind {
                TokenKind::Identifier | TokenKind::Keyword => modules.push(Identifier {
                    span: token.span,
                    name: token.text().to_string(),
                }),
                _ => {
                    return Err(self.error_here("expected module name in require(ntl, ...)"));
                }
            }
        }
        self.eat_punct(")")?;
        self.eat_semi();
        Ok(Statement::NtlRequire(self.alloc(NtlRequire { span, modules })))
    }

    // ------------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------------

    fn parse_if(&mut self) -> PResult<&'a IfStmt<'a>> {
        let span = self.advance().span; // if / elif
        let cond = self.parse_expression()?;
        let then_block = self.parse_block()?;
        let alternate = if self.at_kw("elif") {
            let nested = self.parse_if()?;
            Some(&*self.alloc(Statement::If(nested)))
        } else if self.eat_if_kw("else") {
            if self.at_kw("if") {
                let nested = self.parse_if()?;
                Some(&*self.alloc(Statement::If(nested)))
            } else {
                let block = self.parse_block()?;
                Some(&*self.alloc(Statement::Block(block)))
            }
        } else {
            None
        };
        Ok(self.alloc(IfStmt {
            span,
            cond,
            then_block,
            alternate,
        }))
    }

    fn parse_unless(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("unless")?;
        let cond = self.parse_expression()?;
        let body = self.parse_block()?;
        let alternate = if self.eat_if_kw("else") {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Statement::Unless(self.alloc(UnlessStmt {
            span,
            cond,
            body,
            alternate,
        })))
    }

    fn parse_while(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("while")?;
        let cond = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Statement::While(self.alloc(WhileStmt { span, cond, body })))
    }

    fn parse_do_while(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("do")?;
        let body = self.parse_block()?;
        self.eat_kw("while")?;
        let cond = self.parse_expression()?;
        self.eat_semi();
        Ok(Statement::DoWhile(self.alloc(DoWhileStmt {
            span,
            body,
            cond,
        })))
    }

    fn parse_for(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("for")?;
        let parens = self.eat_if_punct("(");
        let constant = if self.at_kw("val") || self.at_kw("const") {
            self.advance();
            true
        } else if self.at_kw("var") || self.at_kw("let") {
            self.advance();
            false
        } else {
            true
        };
        let binding = self.parse_binding_target()?;
        let is_of = if self.eat_if_kw("of") {
            true
        } else {
            self.eat_kw("in")?;
            false
        };
        let expr = self.parse_expression()?;
        if parens {
            self.eat_punct(")")?;
        }
        let body = self.parse_block()?;
        if is_of {
            Ok(Statement::ForOf(self.alloc(ForOfStmt {
                span,
                binding,
                constant,
                iterable: expr,
                body,
            })))
        } else {
            Ok(Statement::ForIn(self.alloc(ForInStmt {
                span,
                binding,
                constant,
                object: expr,
                body,
            })))
        }
    }

    fn parse_loop(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("loop")?;
        let body = self.parse_block()?;
        Ok(Statement::Loop(self.alloc(LoopStmt { span, body })))
    }

    fn parse_return(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("return")?;
        let value = if self.is_line_end()
            || self.at_punct("}")
            || self.at_punct(";")
            || self.at().is_eof()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.eat_semi();
        Ok(Statement::Return(self.alloc(ReturnStmt { span, value })))
    }

    fn parse_throw(&mut self) -> PResult<Statement<'a>> {
        let span = self.advance().span; // throw / raise
        let value = self.parse_expression()?;
        self.eat_semi();
        Ok(Statement::Throw(self.alloc(ThrowStmt { span, value })))
    }

    fn parse_try(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("try")?;
        let block = self.parse_block()?;
        let catch = if self.at_kw("catch") {
            let catch_span = self.advance().span;
            let param = if self.eat_if_punct("(") {
                let name = self.ident()?;
                self.eat_punct(")")?;
                Some(name)
            } else if self.at().kind == TokenKind::Identifier {
                Some(self.ident()?)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause {
                span: catch_span,
                param,
                body,
            })
        } else {
            None
        };
        let finally = if self.eat_if_kw("finally") {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Statement::Try(self.alloc(TryStmt {
            span,
            block,
            catch,
            finally,
        })))
    }

    fn parse_match(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("match")?;
        let subject = self.parse_expression()?;
        self.eat_punct("{")?;
        let mut cases = Vec::new();
        while !self.at_punct("}") {
            if self.at().is_eof() {
                return Err(self.error_here("unterminated match block"));
            }
            let case_span = self.span();
            let patterns = if self.at_kw("default") || self.at_kw("else") {
                self.advance();
                vec![MatchPattern::Wildcard]
            } else {
                self.eat_kw("case")?;
                let mut patterns = vec![self.parse_match_pattern()?];
                while self.eat_if_op("|") {
                    patterns.push(self.parse_match_pattern()?);
                }
                patterns
            };
            let guard = if self.eat_if_kw("when") {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.eat_op("=>")?;
            let body = if self.at_punct("{") {
                self.parse_block()?
            } else {
                let expr = self.parse_expression()?;
                self.expr_block(expr)
            };
            self.eat_if_punct(",");
            cases.push(MatchCase {
                span: case_span,
                patterns,
                guard,
                body,
            });
        }
        self.eat_punct("}")?;
        Ok(Statement::Match(self.alloc(MatchStmt {
            span,
            subject,
            cases: self.alloc_slice(cases),
        })))
    }

    fn parse_match_pattern(&mut self) -> PResult<MatchPattern<'a>> {
        let span = self.span();
        match self.at().kind {
            TokenKind::Number => {
                let token = self.advance();
                let (value, bigint) = match token.value {
                    TokenValue::Number(n) => (n, None),
                    TokenValue::BigInt(d) => (0.0, Some(d)),
                    _ => (0.0, None),
                };
                let lit = Expression::Number(self.alloc(NumberLit { span, value, bigint }));
                Ok(MatchPattern::Literal(self.alloc(lit)))
            }
            TokenKind::String => {
                let token = self.advance();
                let lit = Expression::String(self.alloc(StringLit {
                    span,
                    value: token.text().to_string(),
                }));
                Ok(MatchPattern::Literal(self.alloc(lit)))
            }
            TokenKind::Operator if self.at_op("-") => {
                self.advance();
                if self.at().kind != TokenKind::Number {
                    return Err(self.error_here("expected number after '-' in pattern"));
                }
                let token = self.advance();
                let value = match token.value {
                    TokenValue::Number(n) => -n,
                    _ => 0.0,
                };
                let lit = Expression::Number(self.alloc(NumberLit {
                    span,
                    value,
                    bigint: None,
                }));
                Ok(MatchPattern::Literal(self.alloc(lit)))
            }
            TokenKind::Keyword => {
                let text = self.at().text().to_string();
                match text.as_str() {
                    "true" | "false" => {
                        self.advance();
                        let lit = Expression::Bool(self.alloc(BoolLit {
                            span,
                            value: text == "true",
                        }));
                        Ok(MatchPattern::Literal(self.alloc(lit)))
                    }
                    "null" => {
                        self.advance();
                        Ok(MatchPattern::Literal(self.alloc(Expression::Null(span))))
                    }
                    "undefined" => {
                        self.advance();
                        Ok(MatchPattern::Literal(self.alloc(Expression::Undefined(span))))
                    }
                    _ => Err(self.error_here(format!(
                        "unexpected keyword '{}' in match pattern",
                        text
                    ))),
                }
            }
            TokenKind::Identifier => {
                let name = self.ident()?;
                if name.name == "_" {
                    return Ok(MatchPattern::Wildcard);
                }
                if self.at_punct("(") {
                    self.advance();
                    let mut fields = Vec::new();
                    while !self.at_punct(")") {
                        fields.push(self.parse_match_pattern()?);
                        if !self.eat_if_punct(",") {
                            break;
                        }
                    }
                    self.eat_punct(")")?;
                    return Ok(MatchPattern::Variant { name, fields });
                }
                if self.at_punct(".") {
                    let mut path = name.name;
                    while self.eat_if_punct(".") {
                        path.push('.');
                        path.push_str(&self.name_like()?.name);
                    }
                    return Ok(MatchPattern::EnumVal(path));
                }
                Ok(MatchPattern::Binding(name))
            }
            TokenKind::Punct if self.at_punct("[") => {
                self.advance();
                let mut items = Vec::new();
                while !self.at_punct("]") {
                    items.push(self.parse_match_pattern()?);
                    if !self.eat_if_punct(",") {
                        break;
                    }
                }
                self.eat_punct("]")?;
                Ok(MatchPattern::Array(items))
            }
            TokenKind::Punct if self.at_punct("{") => {
                self.advance();
                let mut props = Vec::new();
                while !self.at_punct("}") {
                    let key = self.name_like()?;
                    let sub = if self.eat_if_op(":") {
                        Some(self.parse_match_pattern()?)
                    } else {
                        None
                    };
                    props.push((key, sub));
                    if !self.eat_if_punct(",") {
                        break;
                    }
                }
                self.eat_punct("}")?;
                Ok(MatchPattern::Object(props))
            }
            _ => Err(self.error_here(format!(
                "expected match pattern, found {}",
                self.at().describe()
            ))),
        }
    }

    fn parse_ifset(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("ifset")?;
        let saved = self.no_as;
        self.no_as = true;
        let subject = self.parse_expression();
        self.no_as = saved;
        let subject = subject?;
        let alias = if self.eat_if_kw("as") {
            Some(self.ident()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let alternate = if self.eat_if_kw("else") {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Statement::IfSet(self.alloc(IfSetStmt {
            span,
            subject,
            alias,
            body,
            alternate,
        })))
    }

    fn parse_spawn(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("spawn")?;
        let expr = self.parse_expression()?;
        self.eat_semi();
        Ok(Statement::Spawn(self.alloc(SpawnStmt { span, expr })))
    }

    fn parse_select(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("select")?;
        self.eat_punct("{")?;
        let mut arms = Vec::new();
        while !self.at_punct("}") {
            if self.at().is_eof() {
                return Err(self.error_here("unterminated select block"));
            }
            let arm_span = self.eat_kw("case")?;
            let binding = self.ident()?;
            self.eat_op("=")?;
            let receive = self.parse_expression()?;
            self.eat_op("=>")?;
            let body = if self.at_punct("{") {
                self.parse_block()?
            } else {
                let expr = self.parse_expression()?;
                self.expr_block(expr)
            };
            self.eat_if_punct(",");
            arms.push(SelectArm {
                span: arm_span,
                binding,
                receive,
                body,
            });
        }
        self.eat_punct("}")?;
        Ok(Statement::Select(self.alloc(SelectStmt {
            span,
            arms: self.alloc_slice(arms),
        })))
    }

    fn parse_import(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("import")?;
        if self.at().kind == TokenKind::String {
            let source = self.advance().text().to_string();
            self.eat_semi();
            return Ok(Statement::Import(self.alloc(ImportDecl {
                span,
                default: None,
                namespace: None,
                named: Vec::new(),
                source,
            })));
        }
        let mut default = None;
        let mut namespace = None;
        let mut named = Vec::new();
        loop {
            if self.at_punct("{") {
                self.advance();
                while !self.at_punct("}") {
                    let name = self.name_like()?;
                    let alias = if self.eat_if_kw("as") {
                        Some(self.ident()?)
                    } else {
                        None
                    };
                    named.push(ImportSpecifier { name, alias });
                    if !self.eat_if_punct(",") {
                        break;
                    }
                }
                self.eat_punct("}")?;
            } else if self.at_op("*") {
                self.advance();
                self.eat_kw("as")?;
                namespace = Some(self.ident()?);
            } else {
                default = Some(self.ident()?);
            }
            if !self.eat_if_punct(",") {
                break;
            }
        }
        self.eat_kw("from")?;
        if self.at().kind != TokenKind::String {
            return Err(self.error_here("expected module path string after 'from'"));
        }
        let source = self.advance().text().to_string();
        self.eat_semi();
        Ok(Statement::Import(self.alloc(ImportDecl {
            span,
            default,
            namespace,
            named,
            source,
        })))
    }

    fn parse_export(&mut self) -> PResult<Statement<'a>> {
        let span = self.eat_kw("export")?;
        if self.at_punct("{") {
            self.advance();
            let mut names = Vec::new();
            while !self.at_punct("}") {
                let name = self.ident()?;
                let alias = if self.eat_if_kw("as") {
                    Some(self.ident()?)
                } else {
                    None
                };
                names.push((name, alias));
                if !self.eat_if_punct(",") {
                    break;
                }
            }
            self.eat_punct("}")?;
            self.eat_semi();
            return Ok(Statement::Export(self.alloc(ExportDecl {
                span,
                decl: None,
                names,
                default: None,
            })));
        }
        if self.eat_if_kw("default") {
            let expr = self.parse_expression()?;
            self.eat_semi();
            return Ok(Statement::Export(self.alloc(ExportDecl {
                span,
                decl: None,
                names: Vec::new(),
                default: Some(expr),
            })));
        }
        let inner = self.parse_statement()?;
        Ok(Statement::Export(self.alloc(ExportDecl {
            span,
            decl: Some(self.alloc(inner)),
            names: Vec::new(),
            default: None,
        })))
    }

    // ========================================================================
    // Binding patterns and parameters
    // ========================================================================

    fn parse_binding_target(&mut self) -> PResult<BindingTarget<'a>> {
        if self.at_punct("{") {
            let pattern = self.parse_object_pattern()?;
            return Ok(BindingTarget::Pattern(
                self.alloc(BindingPattern::Object(pattern)),
            ));
        }
        if self.at_punct("[") {
            let pattern = self.parse_array_pattern()?;
            return Ok(BindingTarget::Pattern(
                self.alloc(BindingPattern::Array(pattern)),
            ));
        }
        if self.at_kw("this") {
            let token = self.advance();
            return Ok(BindingTarget::Name(Identifier {
                span: token.span,
                name: "this".to_string(),
            }));
        }
        Ok(BindingTarget::Name(self.ident()?))
    }

    fn parse_object_pattern(&mut self) -> PResult<ObjectPattern<'a>> {
        let span = self.eat_punct("{")?;
        let mut props = Vec::new();
        let mut rest = None;
        while !self.at_punct("}") {
            if self.eat_if_op("...") {
                rest = Some(self.ident()?);
                self.eat_if_punct(",");
                continue;
            }
            let key = self.name_like()?;
            let mut alias = None;
            let mut nested = None;
            if self.eat_if_op(":") {
                if self.at_punct("{") {
                    let pattern = self.parse_object_pattern()?;
                    nested = Some(&*self.alloc(BindingPattern::Object(pattern)));
                } else if self.at_punct("[") {
                    let pattern = self.parse_array_pattern()?;
                    nested = Some(&*self.alloc(BindingPattern::Array(pattern)));
                } else {
                    alias = Some(self.ident()?);
                }
            }
            let default = if self.eat_if_op("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            props.push(ObjectPatternProp {
                key,
                alias,
                nested,
                default,
            });
            if !self.eat_if_punct(",") {
                break;
            }
        }
        self.eat_punct("}")?;
        Ok(ObjectPattern { span, props, rest })
    }

    fn parse_array_pattern(&mut self) -> PResult<ArrayPattern<'a>> {
        let span = self.eat_punct("[")?;
        let mut items = Vec::new();
        let mut expect_item = true;
        while !self.at_punct("]") {
            if self.at_punct(",") {
                if expect_item {
                    items.push(None);
                }
                self.advance();
                expect_item = true;
                continue;
            }
            let rest = self.eat_if_op("...");
            let target = self.parse_binding_target()?;
            let default = if self.eat_if_op("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            items.push(Some(ArrayPatternItem {
                target,
                default,
                rest,
            }));
            expect_item = false;
        }
        self.eat_punct("]")?;
        Ok(ArrayPattern { span, items })
    }

    fn parse_params(&mut self) -> PResult<&'a [Param<'a>]> {
        self.eat_punct("(")?;
        let mut params = Vec::new();
        while !self.at_punct(")") {
            let span = self.span();
            let rest = self.eat_if_op("...");
            let target = self.parse_binding_target()?;
            let ty = if self.eat_if_op(":") {
                Some(self.parse_type_expr()?)
            } else {
                None
            };
            let default = if self.eat_if_op("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            params.push(Param {
                span,
                target,
                ty,
                default,
                rest,
            });
            if !self.eat_if_punct(",") {
                break;
            }
        }
        self.eat_punct(")")?;
        Ok(self.alloc_slice(params))
    }

    fn parse_dotted_path(&mut self) -> PResult<String> {
        let mut path = self.ident()?.name;
        while self.at_punct(".") && self.peek(1).kind == TokenKind::Identifier {
            self.advance();
            path.push('.');
            path.push_str(&self.ident()?.name);
        }
        Ok(path)
    }

    // ========================================================================
    // Type expressions
    // ========================================================================

    /// Parse a type expression, retaining it as normalized printed text.
    fn parse_type_expr(&mut self) -> PResult<TypeExpr> {
        let span = self.span();
        let text = self.parse_type_union_text()?;
        Ok(TypeExpr { span, text })
    }

    fn parse_type_union_text(&mut self) -> PResult<String> {
        let mut text = self.parse_type_postfix_text()?;
        loop {
            let joiner = if self.at_op("|") {
                " | "
            } else if self.at_op("&") {
                " & "
            } else {
                break;
            };
            self.advance();
            text.push_str(joiner);
            text.push_str(&self.parse_type_postfix_text()?);
        }
        Ok(text)
    }

    fn parse_type_postfix_text(&mut self) -> PResult<String> {
        let mut text = self.parse_type_primary_text()?;
        loop {
            if self.at_punct("[") && self.peek(1).is_punct("]") {
                self.advance();
                self.advance();
                text.push_str("[]");
            } else if self.at_op("?") {
                self.advance();
                text.push('?');
            } else {
                break;
            }
        }
        Ok(text)
    }

    fn parse_type_primary_text(&mut self) -> PResult<String> {
        // Prefix operators.
        for prefix in ["typeof", "keyof", "infer"] {
            if self.at_kw(prefix) {
                self.advance();
                return Ok(format!("{} {}", prefix, self.parse_type_primary_text()?));
            }
        }
        // Function type or grouped type.
        if self.at_punct("(") {
            self.advance();
            let mut params = Vec::new();
            while !self.at_punct(")") {
                if self.at().kind == TokenKind::Identifier && self.peek(1).is_operator(":") {
                    let name = self.ident()?.name;
                    self.advance();
                    params.push(format!("{}: {}", name, self.parse_type_union_text()?));
                } else {
                    params.push(self.parse_type_union_text()?);
                }
                if !self.eat_if_punct(",") {
                    break;
                }
            }
            self.eat_punct(")")?;
            if self.eat_if_op("->") || self.eat_if_op("=>") {
                let ret = self.parse_type_union_text()?;
                return Ok(format!("({}) -> {}", params.join(", "), ret));
            }
            return Ok(format!("({})", params.join(", ")));
        }
        // Object type.
        if self.at_punct("{") {
            self.advance();
            let mut fields = Vec::new();
            while !self.at_punct("}") {
                let name = self.name_like()?.name;
                self.eat_if_op("?");
                self.eat_op(":")?;
                fields.push(format!("{}: {}", name, self.parse_type_union_text()?));
                if !self.eat_if_punct(";") {
                    self.eat_if_punct(",");
                }
            }
            self.eat_punct("}")?;
            return Ok(format!("{{ {} }}", fields.join("; ")));
        }
        // Tuple type.
        if self.at_punct("[") {
            self.advance();
            let mut elems = Vec::new();
            while !self.at_punct("]") {
                elems.push(self.parse_type_union_text()?);
                if !self.eat_if_punct(",") {
                    break;
                }
            }
            self.eat_punct("]")?;
            return Ok(format!("[{}]", elems.join(", ")));
        }
        // Literal types.
        if self.at().kind == TokenKind::String {
            let token = self.advance();
            return Ok(format!("\"{}\"", token.text()));
        }
        if self.at().kind == TokenKind::Number {
            let token = self.advance();
            return Ok(match token.value {
                TokenValue::Number(n) => format_number(n),
                TokenValue::BigInt(d) => format!("{}n", d),
                _ => "0".to_string(),
            });
        }
        // Named type with optional dotted path and generic arguments.
        if self.at().kind == TokenKind::Identifier || self.at().kind == TokenKind::Keyword {
            let mut name = self.name_like()?.name;
            while self.at_punct(".")
                && (self.peek(1).kind == TokenKind::Identifier
                    || self.peek(1).kind == TokenKind::Keyword)
            {
                self.advance();
                name.push('.');
                name.push_str(&self.name_like()?.name);
            }
            if self.at_op("<") {
                self.advance();
                let mut args = vec![self.parse_type_union_text()?];
                while self.eat_if_punct(",") {
                    args.push(self.parse_type_union_text()?);
                }
                self.eat_close_angle()?;
                return Ok(format!("{}<{}>", name, args.join(", ")));
            }
            return Ok(name);
        }
        Err(self.error_here(format!(
            "expected type, found {}",
            self.at().describe()
        )))
    }

    /// Consume one `>` of a generic argument list, splitting `>>`/`>>>`/`>=`
    /// tokens produced by the greedy lexer.
    fn eat_close_angle(&mut self) -> PResult<()> {
        let span = self.span();
        let remainder = match self.at().text() {
            ">" => None,
            ">>" => Some(">"),
            ">>>" => Some(">>"),
            ">=" => Some("="),
            _ => {
                return Err(self.error_here(format!(
                    "expected '>', found {}",
                    self.at().describe()
                )))
            }
        };
        match remainder {
            None => {
                self.advance();
            }
            Some(rest) => {
                self.tokens[self.pos] = Token::new(
                    TokenKind::Operator,
                    TokenValue::Str(rest.to_string()),
                    Span::new(span.line, span.column + 1),
                );
            }
        }
        Ok(())
    }

    /// Raw text between balanced delimiters, starting at `open`.
    fn capture_balanced(&mut self, open: &str, close: &str) -> PResult<String> {
        self.eat_punct(open)?;
        let mut depth = 1u32;
        let mut parts: Vec<String> = Vec::new();
        loop {
            if self.at().is_eof() {
                return Err(self.error_here(format!("expected '{}'", close)));
            }
            if self.at_punct(open) {
                depth += 1;
            } else if self.at_punct(close) {
                depth -= 1;
                if depth == 0 {
                    self.advance();
                    break;
                }
            }
            parts.push(self.advance().text().to_string());
        }
        Ok(parts.join(" "))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub(crate) fn parse_expression(&mut self) -> PResult<&'a Expression<'a>> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> PResult<&'a Expression<'a>> {
        let left = self.parse_ternary()?;
        if self.at().kind == TokenKind::Operator
            && ASSIGN_OPERATORS.contains(&self.at().text())
        {
            let op = self.advance().text().to_string();
            let value = self.parse_assignment()?;
            return Ok(self.alloc(Expression::Assign(self.alloc(AssignExpr {
                span: left.span(),
                op,
                target: left,
                value,
            }))));
        }
        Ok(left)
    }

    fn parse_ternary(&mut self) -> PResult<&'a Expression<'a>> {
        let cond = self.parse_binary(1)?;
        if self.at_op("?") {
            self.advance();
            let then_expr = self.parse_assignment()?;
            self.eat_op(":")?;
            let else_expr = self.parse_assignment()?;
            return Ok(self.alloc(Expression::Ternary(self.alloc(TernaryExpr {
                span: cond.span(),
                cond,
                then_expr,
                else_expr,
            }))));
        }
        Ok(cond)
    }

    /// Precedence climbing over the binary operator ladder.
    fn parse_binary(&mut self, min_prec: u8) -> PResult<&'a Expression<'a>> {
        let mut left = self.parse_unary()?;
        loop {
            let Some(op) = binary_op_of(self.at()) else {
                break;
            };
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_min = if op.right_assoc() { prec } else { prec + 1 };
            let right = self.parse_binary(next_min)?;
            left = self.alloc(Expression::Binary(self.alloc(BinaryExpr {
                span: left.span(),
                op,
                left,
                right,
            })));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<&'a Expression<'a>> {
        let span = self.span();
        if self.at().kind == TokenKind::Operator {
            let op = match self.at().text() {
                "!" => Some(UnaryOp::Not),
                "~" => Some(UnaryOp::BitNot),
                "-" => Some(UnaryOp::Neg),
                "+" => Some(UnaryOp::Pos),
                "++" => Some(UnaryOp::Inc),
                "--" => Some(UnaryOp::Dec),
                _ => None,
            };
            if let Some(op) = op {
                self.advance();
                let operand = self.parse_unary()?;
                return Ok(self.alloc(Expression::Unary(self.alloc(UnaryExpr {
                    span,
                    op,
                    operand,
                    prefix: true,
                }))));
            }
            if self.at_op("...") {
                self.advance();
                let operand = self.parse_unary()?;
                return Ok(self.alloc(Expression::Spread(
                    self.alloc(SpreadExpr { span, operand }),
                )));
            }
        }
        if self.at_kw("typeof") || self.at_kw("void") {
            let op = if self.at_kw("typeof") {
                UnaryOp::TypeOf
            } else {
                UnaryOp::Void
            };
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.alloc(Expression::Unary(self.alloc(UnaryExpr {
                span,
                op,
                operand,
                prefix: true,
            }))));
        }
        // `delete` is not reserved; recognize it only before an obvious operand.
        if self.at().kind == TokenKind::Identifier
            && self.at().text() == "delete"
            && (self.peek(1).kind == TokenKind::Identifier || self.peek(1).is_keyword("this"))
        {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.alloc(Expression::Unary(self.alloc(UnaryExpr {
                span,
                op: UnaryOp::Delete,
                operand,
                prefix: true,
            }))));
        }
        if self.at_kw("await") {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.alloc(Expression::Await(
                self.alloc(AwaitExpr { span, operand }),
            )));
        }
        if self.at_kw("yield") {
            self.advance();
            let delegate = self.eat_if_op("*");
            let operand = if self.is_line_end()
                || self.at_punct("}")
                || self.at_punct(")")
                || self.at_punct("]")
                || self.at_punct(";")
                || self.at_punct(",")
                || self.at().is_eof()
            {
                None
            } else {
                Some(self.parse_assignment()?)
            };
            return Ok(self.alloc(Expression::Yield(self.alloc(YieldExpr {
                span,
                operand,
                delegate,
            }))));
        }
        if self.at_kw("have") {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.alloc(Expression::Have(
                self.alloc(HaveExpr { span, operand }),
            )));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<&'a Expression<'a>> {
        let mut expr = self.parse_call_member()?;
        loop {
            if self.at_op("++") || self.at_op("--") {
                let op = if self.at_op("++") {
                    UnaryOp::Inc
                } else {
                    UnaryOp::Dec
                };
                let span = self.advance().span;
                expr = self.alloc(Expression::Unary(self.alloc(UnaryExpr {
                    span,
                    op,
                    operand: expr,
                    prefix: false,
                })));
            } else if self.at_kw("as") && !self.no_as {
                self.advance();
                let ty = self.parse_type_expr()?;
                expr = self.alloc(Expression::Cast(self.alloc(CastExpr {
                    span: expr.span(),
                    expr,
                    ty,
                    op: CastOp::As,
                })));
            } else if self.at_kw("satisfies") {
                self.advance();
                let ty = self.parse_type_expr()?;
                expr = self.alloc(Expression::Cast(self.alloc(CastExpr {
                    span: expr.span(),
                    expr,
                    ty,
                    op: CastOp::Satisfies,
                })));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_call_member(&mut self) -> PResult<&'a Expression<'a>> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.at_punct(".") {
                let span = self.advance().span;
                let property = self.name_like()?;
                expr = self.alloc(Expression::Member(self.alloc(MemberExpr {
                    span,
                    object: expr,
                    property: MemberProp::Name(property),
                    optional: false,
                })));
            } else if self.at_op("?.") {
                let span = self.advance().span;
                if self.at_punct("(") {
                    let args = self.parse_arguments()?;
                    expr = self.alloc(Expression::Call(self.alloc(CallExpr {
                        span,
                        callee: expr,
                        args,
                        optional: true,
                    })));
                } else if self.at_punct("[") {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.eat_punct("]")?;
                    expr = self.alloc(Expression::Member(self.alloc(MemberExpr {
                        span,
                        object: expr,
                        property: MemberProp::Computed(index),
                        optional: true,
                    })));
                } else {
                    let property = self.name_like()?;
                    expr = self.alloc(Expression::Member(self.alloc(MemberExpr {
                        span,
                        object: expr,
                        property: MemberProp::Name(property),
                        optional: true,
                    })));
                }
            } else if self.at_punct("(") {
                let span = expr.span();
                let args = self.parse_arguments()?;
                expr = self.alloc(Expression::Call(self.alloc(CallExpr {
                    span,
                    callee: expr,
                    args,
                    optional: false,
                })));
            } else if self.at_punct("[") {
                let span = self.advance().span;
                let index = self.parse_expression()?;
                self.eat_punct("]")?;
                expr = self.alloc(Expression::Member(self.alloc(MemberExpr {
                    span,
                    object: expr,
                    property: MemberProp::Computed(index),
                    optional: false,
                })));
            } else if self.at_op("::") {
                let span = self.advance().span;
                let method = self.name_like()?;
                expr = self.alloc(Expression::Bind(self.alloc(BindExpr {
                    span,
                    object: expr,
                    method,
                })));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> PResult<&'a [Expression<'a>]> {
        self.eat_punct("(")?;
        let mut args = Vec::new();
        while !self.at_punct(")") {
            let arg = self.parse_assignment()?;
            args.push(*arg);
            if !self.eat_if_punct(",") {
                break;
            }
        }
        self.eat_punct(")")?;
        Ok(self.alloc_slice(args))
    }

    fn parse_primary(&mut self) -> PResult<&'a Expression<'a>> {
        let span = self.span();
        match self.at().kind {
            TokenKind::Number => {
                let token = self.advance();
                let (value, bigint) = match token.value {
                    TokenValue::Number(n) => (n, None),
                    TokenValue::BigInt(digits) => (0.0, Some(digits)),
                    _ => (0.0, None),
                };
                Ok(self.alloc(Expression::Number(self.alloc(NumberLit {
                    span,
                    value,
                    bigint,
                }))))
            }
            TokenKind::String => {
                let token = self.advance();
                Ok(self.alloc(Expression::String(self.alloc(StringLit {
                    span,
                    value: token.text().to_string(),
                }))))
            }
            TokenKind::Template => {
                let token = self.advance();
                self.parse_template_literal(token)
            }
            TokenKind::Keyword => self.parse_keyword_primary(),
            TokenKind::Identifier => {
                if self.peek(1).is_operator("=>") {
                    return self.parse_ident_arrow(false);
                }
                let name = self.ident()?;
                Ok(self.alloc(Expression::Ident(self.alloc(name))))
            }
            TokenKind::Operator => {
                if self.at_op("@") {
                    let decorator = self.parse_decorator()?;
                    let inner = self.parse_unary()?;
                    return Ok(self.alloc(Expression::Decorated(self.alloc(DecoratedExpr {
                        span,
                        decorator,
                        expr: inner,
                    }))));
                }
                Err(self.error_here(format!(
                    "unexpected {} in expression",
                    self.at().describe()
                )))
            }
            TokenKind::Punct => {
                if self.at_punct("(") {
                    return self.parse_paren_or_arrow(false);
                }
                if self.at_punct("[") {
                    return self.parse_array_literal();
                }
                if self.at_punct("{") {
                    return self.parse_object_literal();
                }
                Err(self.error_here(format!(
                    "unexpected {} in expression",
                    self.at().describe()
                )))
            }
            TokenKind::Eof => Err(self.error_here("unexpected end of input in expression")),
        }
    }

    fn parse_keyword_primary(&mut self) -> PResult<&'a Expression<'a>> {
        let span = self.span();
        let kw = self.at().text().to_string();
        match kw.as_str() {
            "true" | "false" => {
                self.advance();
                Ok(self.alloc(Expression::Bool(self.alloc(BoolLit {
                    span,
                    value: kw == "true",
                }))))
            }
            "null" => {
                self.advance();
                Ok(self.alloc(Expression::Null(span)))
            }
            "undefined" => {
                self.advance();
                Ok(self.alloc(Expression::Undefined(span)))
            }
            "this" => {
                self.advance();
                Ok(self.alloc(Expression::This(span)))
            }
            "super" => {
                self.advance();
                Ok(self.alloc(Expression::Super(span)))
            }
            "channel" => {
                self.advance();
                self.eat_punct("(")?;
                self.eat_punct(")")?;
                Ok(self.alloc(Expression::Channel(span)))
            }
            "fn" => self.parse_fn_expr(false),
            "async" => {
                self.advance();
                if self.at_kw("fn") {
                    return self.parse_fn_expr(true);
                }
                if self.at_punct("(") {
                    return self.parse_paren_or_arrow(true);
                }
                if self.at().kind == TokenKind::Identifier && self.peek(1).is_operator("=>") {
                    return self.parse_ident_arrow(true);
                }
                Err(self.error_here("expected 'fn', '(' or parameter after 'async'"))
            }
            "new" => {
                self.advance();
                let mut callee = self.parse_primary()?;
                while self.at_punct(".") {
                    let dot_span = self.advance().span;
                    let property = self.name_like()?;
                    callee = self.alloc(Expression::Member(self.alloc(MemberExpr {
                        span: dot_span,
                        object: callee,
                        property: MemberProp::Name(property),
                        optional: false,
                    })));
                }
                let args = if self.at_punct("(") {
                    self.parse_arguments()?
                } else {
                    &[]
                };
                Ok(self.alloc(Expression::New(self.alloc(NewExpr {
                    span,
                    callee,
                    args,
                }))))
            }
            "require" => {
                self.advance();
                self.eat_punct("(")?;
                let arg = self.parse_assignment()?;
                self.eat_punct(")")?;
                Ok(self.alloc(Expression::Require(
                    self.alloc(RequireExpr { span, arg }),
                )))
            }
            "match" | "if" | "while" | "for" => Err(self.error_here(format!(
                "'{}' is a statement and cannot be used as an expression",
                kw
            ))),
            _ => Err(self.error_here(format!(
                "unexpected keyword '{}' in expression",
                kw
            ))),
        }
    }

    fn parse_fn_expr(&mut self, is_async: bool) -> PResult<&'a Expression<'a>> {
        let span = self.eat_kw("fn")?;
        let is_generator = self.eat_if_op("*");
        let name = if self.at().kind == TokenKind::Identifier {
            Some(self.ident()?)
        } else {
            None
        };
        let params = self.parse_params()?;
        let return_ty = if self.eat_if_op("->") {
            Some(self.parse_type_expr()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(self.alloc(Expression::Function(self.alloc(FnExpr {
            span,
            name,
            params,
            return_ty,
            body,
            is_async,
            is_generator,
        }))))
    }

    /// `x => body` single-parameter arrow; the identifier is at the cursor.
    fn parse_ident_arrow(&mut self, is_async: bool) -> PResult<&'a Expression<'a>> {
        let name = self.ident()?;
        let span = name.span;
        let param = Param {
            span,
            target: BindingTarget::Name(name),
            ty: None,
            default: None,
            rest: false,
        };
        self.eat_op("=>")?;
        let body = self.parse_arrow_body()?;
        Ok(self.alloc(Expression::Arrow(self.alloc(ArrowFn {
            span,
            params: self.alloc_slice(vec![param]),
            return_ty: None,
            body,
            is_async,
        }))))
    }

    /// At `(`: either an arrow function's parameter list or a parenthesized
    /// (possibly sequence) expression. Disambiguated by scanning ahead with
    /// paren/bracket depth for the matching `)` followed by `=>` or `->`.
    fn parse_paren_or_arrow(&mut self, is_async: bool) -> PResult<&'a Expression<'a>> {
        if is_async || self.paren_starts_arrow() {
            let span = self.span();
            let params = self.parse_params()?;
            let return_ty = if self.eat_if_op("->") {
                Some(self.parse_type_expr()?)
            } else {
                None
            };
            self.eat_op("=>")?;
            let body = self.parse_arrow_body()?;
            return Ok(self.alloc(Expression::Arrow(self.alloc(ArrowFn {
                span,
                params,
                return_ty,
                body,
                is_async,
            }))));
        }
        let span = self.eat_punct("(")?;
        let first = self.parse_assignment()?;
        if self.at_punct(",") {
            let mut exprs = vec![*first];
            while self.eat_if_punct(",") {
                let next = self.parse_assignment()?;
                exprs.push(*next);
            }
            self.eat_punct(")")?;
            return Ok(self.alloc(Expression::Sequence(self.alloc(SequenceExpr {
                span,
                exprs: self.alloc_slice(exprs),
            }))));
        }
        self.eat_punct(")")?;
        Ok(first)
    }

    fn parse_arrow_body(&mut self) -> PResult<ArrowBody<'a>> {
        if self.at_punct("{") {
            Ok(ArrowBody::Block(self.parse_block()?))
        } else {
            Ok(ArrowBody::Expr(self.parse_assignment()?))
        }
    }

    fn paren_starts_arrow(&self) -> bool {
        debug_assert!(self.at_punct("("));
        let mut depth = 1i32;
        let mut i = self.pos + 1;
        while i < self.tokens.len() {
            let token = &self.tokens[i];
            if token.is_eof() {
                return false;
            }
            if token.is_punct("(") || token.is_punct("[") {
                depth += 1;
            } else if token.is_punct(")") || token.is_punct("]") {
                depth -= 1;
                if depth == 0 {
                    let next = self.tokens.get(i + 1);
                    return matches!(
                        next,
                        Some(t) if t.is_operator("=>") || t.is_operator("->")
                    );
                }
            }
            i += 1;
        }
        false
    }

    fn parse_array_literal(&mut self) -> PResult<&'a Expression<'a>> {
        let span = self.eat_punct("[")?;
        let mut elements = Vec::new();
        while !self.at_punct("]") {
            let element = self.parse_assignment()?;
            elements.push(*element);
            if !self.eat_if_punct(",") {
                break;
            }
        }
        self.eat_punct("]")?;
        Ok(self.alloc(Expression::Array(self.alloc(ArrayLit {
            span,
            elements: self.alloc_slice(elements),
        }))))
    }

    fn parse_object_literal(&mut self) -> PResult<&'a Expression<'a>> {
        let span = self.eat_punct("{")?;
        let mut props = Vec::new();
        while !self.at_punct("}") {
            props.push(self.parse_object_prop()?);
            if !self.eat_if_punct(",") {
                break;
            }
        }
        self.eat_punct("}")?;
        Ok(self.alloc(Expression::Object(self.alloc(ObjectLit {
            span,
            props: self.alloc_slice(props),
        }))))
    }

    fn parse_object_prop(&mut self) -> PResult<ObjectProp<'a>> {
        if self.at_op("...") {
            self.advance();
            let expr = self.parse_assignment()?;
            return Ok(ObjectProp::Spread(expr));
        }
        let is_async = self.at_kw("async")
            && (self.peek(1).kind == TokenKind::Identifier
                || self.peek(1).kind == TokenKind::Keyword)
            && !self.peek(1).is_operator(":");
        if is_async {
            self.advance();
        }
        let mut kind = MemberKind::Method;
        if (self.at_kw("get") || self.at_kw("set"))
            && (self.peek(1).kind == TokenKind::Identifier
                || self.peek(1).kind == TokenKind::Keyword)
            && !self.peek(1).is_punct("(")
        {
            kind = if self.at_kw("get") {
                MemberKind::Getter
            } else {
                MemberKind::Setter
            };
            self.advance();
        }
        let key = self.parse_prop_key()?;
        if self.at_punct("(") {
            let params = self.parse_params()?;
            let body = self.parse_block()?;
            return Ok(ObjectProp::Method {
                key,
                kind,
                params,
                body,
                is_async,
            });
        }
        if self.eat_if_op(":") {
            let value = self.parse_assignment()?;
            return Ok(ObjectProp::KeyValue { key, value });
        }
        match key {
            PropKey::Name(name) => Ok(ObjectProp::Shorthand(name)),
            _ => Err(self.error_here("expected ':' after property key")),
        }
    }

    fn parse_prop_key(&mut self) -> PResult<PropKey<'a>> {
        let span = self.span();
        match self.at().kind {
            TokenKind::String => {
                let token = self.advance();
                Ok(PropKey::String(StringLit {
                    span,
                    value: token.text().to_string(),
                }))
            }
            TokenKind::Number => {
                let token = self.advance();
                let text = match token.value {
                    TokenValue::Number(n) => format_number(n),
                    TokenValue::BigInt(d) => d,
                    _ => "0".to_string(),
                };
                Ok(PropKey::Name(Identifier { span, name: text }))
            }
            TokenKind::Punct if self.at_punct("[") => {
                self.advance();
                let expr = self.parse_assignment()?;
                self.eat_punct("]")?;
                Ok(PropKey::Computed(expr))
            }
            TokenKind::Identifier | TokenKind::Keyword => {
                let name = self.name_like()?;
                Ok(PropKey::Name(name))
            }
            _ => Err(self.error_here(format!(
                "expected property key, found {}",
                self.at().describe()
            ))),
        }
    }

    /// Re-parse the raw expression spans captured inside a template token.
    /// Sub-expression positions are mapped to the template's own span.
    fn parse_template_literal(&mut self, token: Token) -> PResult<&'a Expression<'a>> {
        let span = token.span;
        let raw = match token.value {
            TokenValue::Template(parts) => parts,
            TokenValue::Str(text) => vec![TemplatePart::Text(text)],
            _ => Vec::new(),
        };
        let mut parts = Vec::new();
        for part in &raw {
            match part {
                TemplatePart::Text(text) => parts.push(TemplateElem::Text(text.clone())),
                TemplatePart::Expr(source) => {
                    let mut tokens = ntl_lexer::tokenize(&self.file_name, source)?;
                    for sub in &mut tokens {
                        sub.span = span;
                    }
                    let sub_parser = Parser::new(self.arena, &self.file_name, tokens);
                    let expr = sub_parser.parse_single_expression()?;
                    parts.push(TemplateElem::Expr(expr));
                }
            }
        }
        Ok(self.alloc(Expression::Template(self.alloc(TemplateLit {
            span,
            parts: self.alloc_slice(parts),
            raw,
        }))))
    }
}

fn clone_decorator<'a>(d: &Decorator<'a>) -> Decorator<'a> {
    Decorator {
        span: d.span,
        name: d.name.clone(),
        args: d.args,
    }
}

/// Print an f64 the way JavaScript prints integral numbers.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

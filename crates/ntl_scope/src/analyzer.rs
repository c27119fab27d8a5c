//! The scope analyzer.
//!
//! Walks the AST twice per scope: a hoist pass that pre-declares function,
//! class, enum, macro and namespace names (including decorated and exported
//! forms), then a visit pass that declares every other binding form and
//! resolves identifier references.

use crate::builtins::GLOBALS;
use crate::scope::{BindingKind, ScopeArena, ScopeId};
use ntl_ast::*;
use ntl_diagnostics::{codes, suggest, Diagnostic, Phase, SimilarName};

/// Analyze a source file. Returns every scope diagnostic; errors and
/// warnings are mixed and the caller partitions them.
pub fn analyze(source_file: &SourceFile<'_>) -> Vec<Diagnostic> {
    let mut analyzer = Analyzer::new(&source_file.file_name);
    analyzer.run(source_file);
    analyzer.diagnostics
}

pub struct Analyzer {
    arena: ScopeArena,
    current: ScopeId,
    file_name: String,
    diagnostics: Vec<Diagnostic>,
}

impl Analyzer {
    pub fn new(file_name: &str) -> Self {
        let mut arena = ScopeArena::new();
        let root = arena.push(None);
        for name in GLOBALS {
            arena.declare(root, name, BindingKind::Builtin, 0);
        }
        Self {
            arena,
            current: root,
            file_name: file_name.to_string(),
            diagnostics: Vec::new(),
        }
    }

    pub fn run(&mut self, source_file: &SourceFile<'_>) {
        self.hoist_statements(source_file.statements);
        for stmt in source_file.statements {
            self.visit_statement(stmt);
        }
    }

    fn enter_scope(&mut self) {
        self.current = self.arena.push(Some(self.current));
    }

    fn exit_scope(&mut self) {
        self.current = self
            .arena
            .parent(self.current)
            .expect("exited the root scope");
    }

    fn declare(&mut self, name: &str, kind: BindingKind, line: u32) {
        if kind == BindingKind::Param && self.arena.declared_here(self.current, name) {
            self.diagnostics.push(
                Diagnostic::error(
                    Phase::Scope,
                    format!("duplicate parameter name '{}'", name),
                )
                .with_code(codes::DUP_PARAM)
                .with_file(self.file_name.clone())
                .with_span(ntl_core::Span::new(line, 1)),
            );
        }
        self.arena.declare(self.current, name, kind, line);
    }

    fn declare_ident(&mut self, ident: &Identifier, kind: BindingKind) {
        self.declare(&ident.name, kind, ident.span.line);
    }

    // ========================================================================
    // Hoisting
    // ========================================================================

    /// Pre-declare hoisted names at the current scope level. Export,
    /// declare, and decorated forms hoist the declaration they wrap.
    fn hoist_statements(&mut self, statements: &[Statement<'_>]) {
        for stmt in statements {
            self.hoist_statement(stmt);
        }
    }

    fn hoist_statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::Fn(decl) => self.declare_ident(&decl.name, BindingKind::Fn),
            Statement::Class(decl) => self.declare_ident(&decl.name, BindingKind::Class),
            Statement::Enum(decl) => self.declare_ident(&decl.name, BindingKind::Enum),
            Statement::Macro(decl) => self.declare_ident(&decl.name, BindingKind::Macro),
            Statement::Namespace(decl) => {
                self.declare_ident(&decl.name, BindingKind::Namespace)
            }
            Statement::Export(decl) => {
                if let Some(inner) = decl.decl {
                    self.hoist_statement(inner);
                }
            }
            Statement::Declare(decl) => self.hoist_statement(decl.inner),
            _ => {}
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn visit_statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::Var(decl) => self.visit_var_decl(decl),
            Statement::MultiVar(multi) => {
                for decl in multi.decls {
                    self.visit_var_decl(decl);
                }
            }
            Statement::Fn(decl) => self.visit_fn_decl(decl),
            Statement::Class(decl) => self.visit_class_decl(decl),
            Statement::Interface(_) | Statement::TypeAlias(_) => {}
            Statement::Trait(decl) => {
                for member in decl.members {
                    if let Some(body) = member.body {
                        self.visit_function_like(member.params, body);
                    }
                }
            }
            Statement::Enum(decl) => {
                for member in decl.members {
                    if let Some(value) = member.value {
                        self.visit_expression(value);
                    }
                }
            }
            Statement::Namespace(decl) => {
                self.enter_scope();
                self.hoist_statements(decl.body.statements);
                for stmt in decl.body.statements {
                    self.visit_statement(stmt);
                }
                self.exit_scope();
            }
            Statement::Macro(decl) => self.visit_function_like(decl.params, decl.body),
            Statement::Using(decl) => {
                self.visit_expression(decl.init);
                self.declare_ident(&decl.name, BindingKind::Const);
            }
            Statement::Declare(decl) => {
                // Ambient: declare the names, skip the bodies.
                self.declare_ambient(decl.inner);
            }
            Statement::NtlRequire(req) => {
                for module in &req.modules {
                    self.declare_ident(module, BindingKind::Import);
                }
            }
            Statement::Block(block) => self.visit_block(block),
            Statement::If(stmt) => {
                self.visit_expression(stmt.cond);
                self.visit_block(stmt.then_block);
                if let Some(alt) = stmt.alternate {
                    self.visit_statement(alt);
                }
            }
            Statement::Unless(stmt) => {
                self.visit_expression(stmt.cond);
                self.visit_block(stmt.body);
                if let Some(alt) = stmt.alternate {
                    self.visit_block(alt);
                }
            }
            Statement::While(stmt) => {
                self.visit_expression(stmt.cond);
                self.visit_block(stmt.body);
            }
            Statement::DoWhile(stmt) => {
                self.visit_block(stmt.body);
                self.visit_expression(stmt.cond);
            }
            Statement::ForOf(stmt) => {
                self.enter_scope();
                self.visit_expression(stmt.iterable);
                self.declare_binding_target(&stmt.binding, stmt.constant);
                self.visit_block(stmt.body);
                self.exit_scope();
            }
            Statement::ForIn(stmt) => {
                self.enter_scope();
                self.visit_expression(stmt.object);
                self.declare_binding_target(&stmt.binding, stmt.constant);
                self.visit_block(stmt.body);
                self.exit_scope();
            }
            Statement::Loop(stmt) => self.visit_block(stmt.body),
            Statement::Return(stmt) => {
                if let Some(value) = stmt.value {
                    self.visit_expression(value);
                }
            }
            Statement::Throw(stmt) => self.visit_expression(stmt.value),
            Statement::Try(stmt) => {
                self.visit_block(stmt.block);
                if let Some(catch) = &stmt.catch {
                    self.enter_scope();
                    if let Some(param) = &catch.param {
                        self.declare_ident(param, BindingKind::Param);
                    }
                    self.visit_block(catch.body);
                    self.exit_scope();
                }
                if let Some(finally) = stmt.finally {
                    self.visit_block(finally);
                }
            }
            Statement::Match(stmt) => {
                self.visit_expression(stmt.subject);
                for case in stmt.cases {
                    self.enter_scope();
                    for pattern in &case.patterns {
                        self.declare_pattern_captures(pattern);
                    }
                    if let Some(guard) = case.guard {
                        self.visit_expression(guard);
                    }
                    self.visit_block(case.body);
                    self.exit_scope();
                }
            }
            Statement::Break(_) | Statement::Continue(_) => {}
            Statement::Expr(stmt) => self.visit_expression(stmt.expr),
            Statement::IfSet(stmt) => {
                self.visit_expression(stmt.subject);
                self.enter_scope();
                if let Some(alias) = &stmt.alias {
                    self.declare_ident(alias, BindingKind::Const);
                }
                self.visit_block(stmt.body);
                self.exit_scope();
                if let Some(alt) = stmt.alternate {
                    self.visit_block(alt);
                }
            }
            Statement::Spawn(stmt) => self.visit_expression(stmt.expr),
            Statement::Select(stmt) => {
                for arm in stmt.arms {
                    self.visit_expression(arm.receive);
                    self.enter_scope();
                    self.declare_ident(&arm.binding, BindingKind::Const);
                    self.visit_block(arm.body);
                    self.exit_scope();
                }
            }
            Statement::Import(decl) => {
                if let Some(default) = &decl.default {
                    self.declare_ident(default, BindingKind::Import);
                }
                if let Some(namespace) = &decl.namespace {
                    self.declare_ident(namespace, BindingKind::Import);
                }
                for spec in &decl.named {
                    let local = spec.alias.as_ref().unwrap_or(&spec.name);
                    self.declare_ident(local, BindingKind::Import);
                }
            }
            Statement::Export(decl) => {
                if let Some(inner) = decl.decl {
                    self.visit_statement(inner);
                }
                for (name, _alias) in &decl.names {
                    self.reference(name, false);
                }
                if let Some(default) = decl.default {
                    self.visit_expression(default);
                }
            }
        }
    }

    fn declare_ambient(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::Var(decl) => self.declare_binding_target(&decl.target, decl.constant),
            Statement::Fn(decl) => self.declare_ident(&decl.name, BindingKind::Fn),
            Statement::Class(decl) => self.declare_ident(&decl.name, BindingKind::Class),
            Statement::Enum(decl) => self.declare_ident(&decl.name, BindingKind::Enum),
            Statement::Namespace(decl) => {
                self.declare_ident(&decl.name, BindingKind::Namespace)
            }
            _ => {}
        }
    }

    fn visit_var_decl(&mut self, decl: &VarDecl<'_>) {
        if let Some(init) = decl.init {
            self.visit_expression(init);
        }
        self.declare_binding_target(&decl.target, decl.constant);
    }

    fn declare_binding_target(&mut self, target: &BindingTarget<'_>, constant: bool) {
        let kind = if constant {
            BindingKind::Const
        } else {
            BindingKind::Var
        };
        match target {
            BindingTarget::Name(name) => self.declare_ident(name, kind),
            BindingTarget::Pattern(pattern) => self.declare_pattern(pattern, kind),
        }
    }

    fn declare_pattern(&mut self, pattern: &BindingPattern<'_>, kind: BindingKind) {
        match pattern {
            BindingPattern::Object(object) => {
                for prop in &object.props {
                    if let Some(default) = prop.default {
                        self.visit_expression(default);
                    }
                    if let Some(nested) = prop.nested {
                        self.declare_pattern(nested, kind);
                    } else if let Some(alias) = &prop.alias {
                        self.declare_ident(alias, kind);
                    } else {
                        self.declare_ident(&prop.key, kind);
                    }
                }
                if let Some(rest) = &object.rest {
                    self.declare_ident(rest, kind);
                }
            }
            BindingPattern::Array(array) => {
                for item in array.items.iter().flatten() {
                    if let Some(default) = item.default {
                        self.visit_expression(default);
                    }
                    match &item.target {
                        BindingTarget::Name(name) => self.declare_ident(name, kind),
                        BindingTarget::Pattern(nested) => self.declare_pattern(nested, kind),
                    }
                }
            }
        }
    }

    /// Match pattern captures become const bindings within the arm.
    fn declare_pattern_captures(&mut self, pattern: &MatchPattern<'_>) {
        match pattern {
            MatchPattern::Binding(name) => self.declare_ident(name, BindingKind::Const),
            MatchPattern::Variant { fields, .. } => {
                for field in fields {
                    self.declare_pattern_captures(field);
                }
            }
            MatchPattern::Array(items) => {
                for item in items {
                    self.declare_pattern_captures(item);
                }
            }
            MatchPattern::Object(props) => {
                for (key, sub) in props {
                    match sub {
                        Some(pattern) => self.declare_pattern_captures(pattern),
                        None => self.declare_ident(key, BindingKind::Const),
                    }
                }
            }
            MatchPattern::Literal(_) | MatchPattern::Wildcard | MatchPattern::EnumVal(_) => {}
        }
    }

    fn visit_fn_decl(&mut self, decl: &FnDecl<'_>) {
        for decorator in decl.decorators {
            self.reference_decorator(decorator);
        }
        self.visit_function_like(decl.params, decl.body);
    }

    fn visit_function_like(&mut self, params: &[Param<'_>], body: &Block<'_>) {
        self.enter_scope();
        self.declare_params(params);
        self.hoist_statements(body.statements);
        for stmt in body.statements {
            self.visit_statement(stmt);
        }
        self.exit_scope();
    }

    fn declare_params(&mut self, params: &[Param<'_>]) {
        for param in params {
            if let Some(default) = param.default {
                self.visit_expression(default);
            }
            match &param.target {
                BindingTarget::Name(name) => {
                    self.declare(&name.name, BindingKind::Param, name.span.line)
                }
                BindingTarget::Pattern(pattern) => {
                    self.declare_pattern(pattern, BindingKind::Param)
                }
            }
        }
    }

    fn visit_class_decl(&mut self, decl: &ClassDecl<'_>) {
        for decorator in decl.decorators {
            self.reference_decorator(decorator);
        }
        if let Some(superclass) = &decl.superclass {
            self.reference_path(superclass, decl.span.line);
        }
        self.enter_scope();
        self.declare("this", BindingKind::Param, decl.span.line);
        for member in decl.members {
            if let Some(init) = member.init {
                self.visit_expression(init);
            }
            if let Some(body) = member.body {
                self.visit_function_like(member.params, body);
            }
        }
        self.exit_scope();
    }

    /// Decorators reference their root name as a value.
    fn reference_decorator(&mut self, decorator: &Decorator<'_>) {
        let root = decorator.name.split('.').next().unwrap_or(&decorator.name);
        self.reference_name(root, decorator.span, false);
        if let Some(args) = decorator.args {
            for arg in args {
                self.visit_expression(arg);
            }
        }
    }

    fn reference_path(&mut self, path: &str, line: u32) {
        let root = path.split('.').next().unwrap_or(path);
        self.reference_name(root, ntl_core::Span::new(line, 1), false);
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn visit_expression(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::Number(_)
            | Expression::String(_)
            | Expression::Bool(_)
            | Expression::Null(_)
            | Expression::Undefined(_)
            | Expression::This(_)
            | Expression::Super(_)
            | Expression::Channel(_) => {}
            Expression::Ident(ident) => self.reference(ident, false),
            Expression::Template(template) => {
                for part in template.parts {
                    if let TemplateElem::Expr(expr) = part {
                        self.visit_expression(expr);
                    }
                }
            }
            Expression::Array(array) => {
                for element in array.elements {
                    self.visit_expression(element);
                }
            }
            Expression::Object(object) => {
                for prop in object.props {
                    match prop {
                        ObjectProp::KeyValue { key, value } => {
                            if let PropKey::Computed(computed) = key {
                                self.visit_expression(computed);
                            }
                            self.visit_expression(value);
                        }
                        ObjectProp::Shorthand(name) => self.reference(name, false),
                        ObjectProp::Spread(expr) => self.visit_expression(expr),
                        ObjectProp::Method {
                            key, params, body, ..
                        } => {
                            if let PropKey::Computed(computed) = key {
                                self.visit_expression(computed);
                            }
                            self.visit_function_like(params, body);
                        }
                    }
                }
            }
            Expression::Function(func) => {
                self.enter_scope();
                // A named function expression can call itself.
                if let Some(name) = &func.name {
                    self.declare_ident(name, BindingKind::Fn);
                }
                self.declare_params(func.params);
                self.hoist_statements(func.body.statements);
                for stmt in func.body.statements {
                    self.visit_statement(stmt);
                }
                self.exit_scope();
            }
            Expression::Arrow(arrow) => {
                self.enter_scope();
                self.declare_params(arrow.params);
                match &arrow.body {
                    ArrowBody::Block(block) => {
                        self.hoist_statements(block.statements);
                        for stmt in block.statements {
                            self.visit_statement(stmt);
                        }
                    }
                    ArrowBody::Expr(expr) => self.visit_expression(expr),
                }
                self.exit_scope();
            }
            Expression::Member(member) => {
                self.visit_expression(member.object);
                if let MemberProp::Computed(index) = &member.property {
                    self.visit_expression(index);
                }
            }
            Expression::Call(call) => {
                match call.callee {
                    Expression::Ident(ident) => self.reference(ident, true),
                    other => self.visit_expression(other),
                }
                for arg in call.args {
                    self.visit_expression(arg);
                }
            }
            Expression::New(new) => {
                self.visit_expression(new.callee);
                for arg in new.args {
                    self.visit_expression(arg);
                }
            }
            Expression::Unary(unary) => self.visit_expression(unary.operand),
            Expression::Binary(binary) => {
                self.visit_expression(binary.left);
                self.visit_expression(binary.right);
            }
            Expression::Assign(assign) => {
                self.check_const_reassignment(assign);
                self.visit_expression(assign.target);
                self.visit_expression(assign.value);
            }
            Expression::Ternary(ternary) => {
                self.visit_expression(ternary.cond);
                self.visit_expression(ternary.then_expr);
                self.visit_expression(ternary.else_expr);
            }
            Expression::Await(await_expr) => self.visit_expression(await_expr.operand),
            Expression::Yield(yield_expr) => {
                if let Some(operand) = yield_expr.operand {
                    self.visit_expression(operand);
                }
            }
            Expression::Spread(spread) => self.visit_expression(spread.operand),
            Expression::Sequence(seq) => {
                for expr in seq.exprs {
                    self.visit_expression(expr);
                }
            }
            Expression::Bind(bind) => self.visit_expression(bind.object),
            Expression::Have(have) => self.visit_expression(have.operand),
            Expression::Require(require) => self.visit_expression(require.arg),
            Expression::Decorated(decorated) => {
                self.reference_decorator(&decorated.decorator);
                self.visit_expression(decorated.expr);
            }
            Expression::Cast(cast) => self.visit_expression(cast.expr),
        }
    }

    fn check_const_reassignment(&mut self, assign: &AssignExpr<'_>) {
        let Expression::Ident(ident) = assign.target else {
            return;
        };
        if let Some(binding) = self.arena.lookup(self.current, &ident.name) {
            if binding.kind == BindingKind::Const {
                self.diagnostics.push(
                    Diagnostic::error(
                        Phase::Scope,
                        format!("cannot reassign '{}': it was declared with val", ident.name),
                    )
                    .with_code(codes::CONST_REASSIGN)
                    .with_file(self.file_name.clone())
                    .with_span(ident.span)
                    .with_suggestion(format!(
                        "Declare '{}' with var if it needs to change",
                        ident.name
                    )),
                );
            }
        }
    }

    // ========================================================================
    // Reference resolution
    // ========================================================================

    fn reference(&mut self, ident: &Identifier, is_callee: bool) {
        self.reference_name(&ident.name, ident.span, is_callee);
    }

    fn reference_name(&mut self, name: &str, span: ntl_core::Span, is_callee: bool) {
        if self.arena.mark_used(self.current, name).is_some() {
            return;
        }
        self.diagnostics.push(self.undeclared(name, span, is_callee));
    }

    fn undeclared(&self, name: &str, span: ntl_core::Span, is_callee: bool) -> Diagnostic {
        if is_callee && (name == "print" || name == "println") {
            return Diagnostic::error(
                Phase::Scope,
                format!("'{}' is not defined", name),
            )
            .with_code(codes::UNDEF_FUNC)
            .with_file(self.file_name.clone())
            .with_span(span)
            .with_suggestion("Use the host console: console.log(...)")
            .with_suggestion(format!("Define an alias once: val {} = console.log", name))
            .with_suggestion("Use the logger module: require(ntl, logger) then logger.info(...)")
            .with_example(format!("{}(\"Hello\")", name), "console.log(\"Hello\")");
        }

        let candidates: Vec<SimilarName> = self
            .arena
            .visible_names(self.current)
            .into_iter()
            .map(|(name, line)| SimilarName {
                name,
                declared_line: line,
            })
            .collect();
        let similar = suggest::find_similar(name, &candidates);

        Diagnostic::error(Phase::Scope, format!("'{}' is not defined", name))
            .with_code(codes::UNDEF_VAR)
            .with_file(self.file_name.clone())
            .with_span(span)
            .with_similar(similar)
            .with_suggestion(format!("Declare it before use: val {} = ...", name))
            .with_suggestion("Pass it as a parameter to the enclosing function")
            .with_suggestion("Check the spelling; names are case-sensitive")
    }

    fn visit_block(&mut self, block: &Block<'_>) {
        self.enter_scope();
        self.hoist_statements(block.statements);
        for stmt in block.statements {
            self.visit_statement(stmt);
        }
        self.exit_scope();
    }
}

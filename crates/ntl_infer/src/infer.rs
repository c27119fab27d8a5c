//! The inference walk.
//!
//! `infer_stmt`/`infer_expr` compute a type for every node, binding names in
//! a stack of environments. Each environment frame is two-level: one map for
//! value bindings, one for type names.

use crate::types::{Literal, Type};
use indexmap::IndexMap;
use ntl_ast::*;
use ntl_core::Span;
use ntl_diagnostics::{codes, Diagnostic, Phase, Severity};
use rustc_hash::FxHashMap;

/// Array methods surfaced on member access; all typed `any` except `length`.
const ARRAY_METHODS: &[&str] = &[
    "map", "filter", "reduce", "forEach", "push", "pop", "shift", "unshift",
    "slice", "splice", "concat", "join", "indexOf", "includes", "find",
    "findIndex", "some", "every", "sort", "reverse", "flat", "flatMap",
    "fill", "keys", "values", "entries",
];

/// Same pattern for string values.
const STRING_METHODS: &[&str] = &[
    "charAt", "charCodeAt", "codePointAt", "concat", "includes", "endsWith",
    "indexOf", "lastIndexOf", "match", "normalize", "padEnd", "padStart",
    "repeat", "replace", "replaceAll", "search", "slice", "split",
    "startsWith", "substring", "toLowerCase", "toUpperCase", "trim",
    "trimStart", "trimEnd", "at",
];

/// Functions with more parameters than this draw a warning.
const PARAM_COUNT_LIMIT: usize = 6;

/// Infer a source file. Returns type diagnostics; in non-strict mode all of
/// them are warnings.
pub fn infer(source_file: &SourceFile<'_>, strict: bool) -> Vec<Diagnostic> {
    let mut inferer = Inferer::new(&source_file.file_name, strict);
    inferer.run(source_file);
    inferer.diagnostics
}

struct Frame {
    values: FxHashMap<String, Type>,
    types: FxHashMap<String, Type>,
}

impl Frame {
    fn new() -> Self {
        Self {
            values: FxHashMap::default(),
            types: FxHashMap::default(),
        }
    }
}

pub struct Inferer {
    frames: Vec<Frame>,
    strict: bool,
    file_name: String,
    diagnostics: Vec<Diagnostic>,
}

impl Inferer {
    pub fn new(file_name: &str, strict: bool) -> Self {
        let mut inferer = Self {
            frames: vec![Frame::new()],
            strict,
            file_name: file_name.to_string(),
            diagnostics: Vec::new(),
        };
        inferer.install_builtins();
        inferer
    }

    pub fn run(&mut self, source_file: &SourceFile<'_>) {
        for stmt in source_file.statements {
            self.infer_stmt(stmt);
        }
    }

    /// The shadow value environment for host globals. Everything in the
    /// scope analyzer's global set resolves; a handful of objects carry
    /// useful shapes.
    fn install_builtins(&mut self) {
        for name in ntl_scope::GLOBALS {
            self.bind_value(name, Type::Any);
        }

        let fn_any = || Type::Function {
            params: vec![(String::new(), Type::Any)],
            ret: Box::new(Type::Any),
        };
        let fn_ret = |ret: Type| Type::Function {
            params: vec![(String::new(), Type::Any)],
            ret: Box::new(ret),
        };

        let mut console = IndexMap::new();
        for method in ["log", "error", "warn", "info", "debug", "trace"] {
            console.insert(method.to_string(), fn_ret(Type::Void));
        }
        self.bind_value("console", Type::Object(console));

        let mut math = IndexMap::new();
        for constant in ["PI", "E", "LN2", "LN10", "SQRT2"] {
            math.insert(constant.to_string(), Type::number());
        }
        for method in [
            "abs", "max", "min", "floor", "ceil", "round", "trunc", "sqrt",
            "pow", "random", "sign", "log", "exp", "sin", "cos", "tan",
        ] {
            math.insert(method.to_string(), fn_ret(Type::number()));
        }
        self.bind_value("Math", Type::Object(math));

        let mut json = IndexMap::new();
        json.insert("stringify".to_string(), fn_ret(Type::string()));
        json.insert("parse".to_string(), fn_any());
        self.bind_value("JSON", Type::Object(json));

        let mut object = IndexMap::new();
        for method in ["keys", "values", "entries", "assign", "freeze", "create"] {
            object.insert(method.to_string(), fn_any());
        }
        self.bind_value("Object", Type::Object(object));

        let mut array = IndexMap::new();
        array.insert("isArray".to_string(), fn_ret(Type::boolean()));
        array.insert("from".to_string(), fn_any());
        array.insert("of".to_string(), fn_any());
        self.bind_value("Array", Type::Object(array));

        let mut promise = IndexMap::new();
        for method in ["resolve", "reject", "all", "race", "allSettled", "any"] {
            promise.insert(method.to_string(), fn_any());
        }
        self.bind_value("Promise", Type::Object(promise));

        let mut process = IndexMap::new();
        process.insert("argv".to_string(), Type::Array(Box::new(Type::string())));
        process.insert("env".to_string(), Type::Any);
        process.insert("exit".to_string(), fn_ret(Type::Void));
        process.insert("platform".to_string(), Type::string());
        self.bind_value("process", Type::Object(process));

        self.bind_value(
            "require",
            Type::Function {
                params: vec![("path".to_string(), Type::string())],
                ret: Box::new(Type::Any),
            },
        );
    }

    // ========================================================================
    // Environment
    // ========================================================================

    fn push_frame(&mut self) {
        self.frames.push(Frame::new());
    }

    fn pop_frame(&mut self) {
        self.frames.pop();
    }

    fn bind_value(&mut self, name: &str, ty: Type) {
        self.frames
            .last_mut()
            .expect("empty env stack")
            .values
            .insert(name.to_string(), ty);
    }

    fn bind_type(&mut self, name: &str, ty: Type) {
        self.frames
            .last_mut()
            .expect("empty env stack")
            .types
            .insert(name.to_string(), ty);
    }

    fn lookup_value(&self, name: &str) -> Option<&Type> {
        self.frames.iter().rev().find_map(|f| f.values.get(name))
    }

    fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.frames.iter().rev().find_map(|f| f.types.get(name))
    }

    /// Resolve named references inside an annotation against the type
    /// environment (class names, aliases). Primitive names were already
    /// handled by `Type::parse`.
    fn resolve(&self, ty: Type) -> Type {
        match ty {
            Type::Generic { ref name, ref args } if args.is_empty() => {
                match self.lookup_type(name) {
                    Some(found) => found.clone(),
                    None => ty,
                }
            }
            Type::Array(elem) => Type::Array(Box::new(self.resolve(*elem))),
            Type::Union(members) => {
                Type::union(members.into_iter().map(|m| self.resolve(m)).collect())
            }
            other => other,
        }
    }

    fn annotation(&self, ty: &TypeExpr) -> Type {
        self.resolve(Type::parse(&ty.text))
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn mismatch(&mut self, span: Span, target: &Type, source: &Type) {
        let severity = if self.strict {
            Severity::Error
        } else {
            Severity::Warning
        };
        let mut diag = Diagnostic {
            severity,
            ..Diagnostic::error(
                Phase::Type,
                format!(
                    "Type '{}' is not assignable to type '{}'",
                    source.print(),
                    target.print()
                ),
            )
        };
        diag = diag
            .with_code(codes::TYPE_MISMATCH)
            .with_file(self.file_name.clone())
            .with_span(span);
        self.diagnostics.push(diag);
    }

    fn warn(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::warning(Phase::Type, message)
                .with_file(self.file_name.clone())
                .with_span(span),
        );
    }

    fn check_param_count(&mut self, span: Span, count: usize) {
        if count > PARAM_COUNT_LIMIT {
            self.warn(
                span,
                format!(
                    "function takes {} parameters; consider grouping them into an options object",
                    count
                ),
            );
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn infer_stmt(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::Var(decl) => self.infer_var_decl(decl),
            Statement::MultiVar(multi) => {
                for decl in multi.decls {
                    self.infer_var_decl(decl);
                }
            }
            Statement::Fn(decl) => {
                let fn_ty = self.function_type(decl.params, decl.return_ty.as_ref());
                self.bind_value(&decl.name.name, fn_ty);
                self.check_param_count(decl.span, decl.params.len());
                self.infer_body(decl.params, decl.body.statements);
            }
            Statement::Class(decl) => self.infer_class(decl),
            Statement::Interface(decl) => {
                let mut fields = IndexMap::new();
                for (name, ty_text) in &decl.members {
                    fields.insert(name.name.clone(), self.resolve(Type::parse(ty_text)));
                }
                self.bind_type(&decl.name.name, Type::Object(fields));
            }
            Statement::Trait(decl) => {
                for member in decl.members {
                    if let Some(body) = member.body {
                        self.infer_body(member.params, body.statements);
                    }
                }
            }
            Statement::TypeAlias(decl) => match &decl.target {
                TypeAliasTarget::Plain(ty) => {
                    let parsed = self.annotation(ty);
                    self.bind_type(&decl.name.name, parsed);
                }
                // Algebraic variants are runtime-tagged carriers; they
                // check as `any`.
                TypeAliasTarget::Algebraic(_) => self.bind_type(&decl.name.name, Type::Any),
            },
            Statement::Enum(decl) => {
                let mut fields = IndexMap::new();
                for member in decl.members {
                    let ty = match member.value {
                        Some(Expression::String(_)) => Type::string(),
                        _ => Type::number(),
                    };
                    if let Some(value) = member.value {
                        self.infer_expr(value);
                    }
                    fields.insert(member.name.name.clone(), ty);
                }
                let ty = Type::Object(fields);
                self.bind_value(&decl.name.name, ty.clone());
                self.bind_type(&decl.name.name, ty);
            }
            Statement::Namespace(decl) => {
                self.bind_value(&decl.name.name, Type::Any);
                self.push_frame();
                for stmt in decl.body.statements {
                    self.infer_stmt(stmt);
                }
                self.pop_frame();
            }
            Statement::Macro(decl) => {
                self.bind_value(&decl.name.name, Type::Any);
                self.infer_body(decl.params, decl.body.statements);
            }
            Statement::Using(decl) => {
                let ty = self.infer_expr(decl.init);
                self.bind_value(&decl.name.name, ty);
            }
            Statement::Declare(decl) => match decl.inner {
                Statement::Var(var) => self.bind_target(&var.target, Type::Any),
                Statement::Fn(func) => self.bind_value(&func.name.name, Type::Any),
                Statement::Class(class) => self.bind_value(&class.name.name, Type::Any),
                _ => {}
            },
            Statement::NtlRequire(req) => {
                for module in &req.modules {
                    self.bind_value(&module.name, Type::Any);
                }
            }
            Statement::Import(decl) => {
                if let Some(default) = &decl.default {
                    self.bind_value(&default.name, Type::Any);
                }
                if let Some(namespace) = &decl.namespace {
                    self.bind_value(&namespace.name, Type::Any);
                }
                for spec in &decl.named {
                    let local = spec.alias.as_ref().unwrap_or(&spec.name);
                    self.bind_value(&local.name, Type::Any);
                }
            }
            Statement::Export(decl) => {
                if let Some(inner) = decl.decl {
                    self.infer_stmt(inner);
                }
                if let Some(default) = decl.default {
                    self.infer_expr(default);
                }
            }
            Statement::Block(block) => {
                self.push_frame();
                for stmt in block.statements {
                    self.infer_stmt(stmt);
                }
                self.pop_frame();
            }
            Statement::If(stmt) => {
                self.infer_expr(stmt.cond);
                self.infer_block(stmt.then_block);
                if let Some(alt) = stmt.alternate {
                    self.infer_stmt(alt);
                }
            }
            Statement::Unless(stmt) => {
                self.infer_expr(stmt.cond);
                self.infer_block(stmt.body);
                if let Some(alt) = stmt.alternate {
                    self.infer_block(alt);
                }
            }
            Statement::While(stmt) => {
                self.infer_expr(stmt.cond);
                self.infer_block(stmt.body);
            }
            Statement::DoWhile(stmt) => {
                self.infer_block(stmt.body);
                self.infer_expr(stmt.cond);
            }
            Statement::ForOf(stmt) => {
                let iterable = self.infer_expr(stmt.iterable);
                let element = match iterable {
                    Type::Array(elem) => *elem,
                    Type::Tuple(elems) => Type::union(elems),
                    Type::Primitive("string") => Type::string(),
                    _ => Type::Any,
                };
                self.push_frame();
                self.bind_target(&stmt.binding, element);
                self.infer_block(stmt.body);
                self.pop_frame();
            }
            Statement::ForIn(stmt) => {
                self.infer_expr(stmt.object);
                self.push_frame();
                self.bind_target(&stmt.binding, Type::string());
                self.infer_block(stmt.body);
                self.pop_frame();
            }
            Statement::Loop(stmt) => self.infer_block(stmt.body),
            Statement::Return(stmt) => {
                if let Some(value) = stmt.value {
                    self.infer_expr(value);
                }
            }
            Statement::Throw(stmt) => {
                self.infer_expr(stmt.value);
            }
            Statement::Try(stmt) => {
                if stmt.catch.is_none() && stmt.finally.is_none() {
                    self.warn(stmt.span, "try block has neither catch nor finally");
                }
                self.infer_block(stmt.block);
                if let Some(catch) = &stmt.catch {
                    self.push_frame();
                    if let Some(param) = &catch.param {
                        self.bind_value(&param.name, Type::Any);
                    }
                    self.infer_block(catch.body);
                    self.pop_frame();
                }
                if let Some(finally) = stmt.finally {
                    self.infer_block(finally);
                }
            }
            Statement::Match(stmt) => {
                self.infer_expr(stmt.subject);
                for case in stmt.cases {
                    self.push_frame();
                    for pattern in &case.patterns {
                        self.bind_pattern_captures(pattern);
                    }
                    if let Some(guard) = case.guard {
                        self.infer_expr(guard);
                    }
                    self.infer_block(case.body);
                    self.pop_frame();
                }
            }
            Statement::IfSet(stmt) => {
                let subject = self.infer_expr(stmt.subject);
                self.push_frame();
                if let Some(alias) = &stmt.alias {
                    self.bind_value(&alias.name, subject.non_nullish());
                }
                self.infer_block(stmt.body);
                self.pop_frame();
                if let Some(alt) = stmt.alternate {
                    self.infer_block(alt);
                }
            }
            Statement::Spawn(stmt) => {
                self.infer_expr(stmt.expr);
            }
            Statement::Select(stmt) => {
                for arm in stmt.arms {
                    self.infer_expr(arm.receive);
                    self.push_frame();
                    self.bind_value(&arm.binding.name, Type::Any);
                    self.infer_block(arm.body);
                    self.pop_frame();
                }
            }
            Statement::Break(_) | Statement::Continue(_) => {}
            Statement::Expr(stmt) => {
                self.infer_expr(stmt.expr);
            }
        }
    }

    fn infer_var_decl(&mut self, decl: &VarDecl<'_>) {
        let init_ty = decl.init.map(|init| self.infer_expr(init));
        let declared = decl.ty.as_ref().map(|ty| self.annotation(ty));
        if let (Some(target), Some(source)) = (&declared, &init_ty) {
            if !Type::assignable(target, source) {
                self.mismatch(decl.span, target, source);
            }
        }
        let final_ty = declared.or(init_ty).unwrap_or(Type::Any);
        self.bind_target(&decl.target, final_ty);
    }

    fn bind_target(&mut self, target: &BindingTarget<'_>, ty: Type) {
        match target {
            BindingTarget::Name(name) => self.bind_value(&name.name, ty),
            BindingTarget::Pattern(pattern) => self.bind_pattern(pattern),
        }
    }

    /// Destructured leaves bind `any`; per-leaf narrowing is out of scope.
    fn bind_pattern(&mut self, pattern: &BindingPattern<'_>) {
        match pattern {
            BindingPattern::Object(object) => {
                for prop in &object.props {
                    if let Some(nested) = prop.nested {
                        self.bind_pattern(nested);
                    } else if let Some(alias) = &prop.alias {
                        self.bind_value(&alias.name, Type::Any);
                    } else {
                        self.bind_value(&prop.key.name, Type::Any);
                    }
                }
                if let Some(rest) = &object.rest {
                    self.bind_value(&rest.name, Type::Any);
                }
            }
            BindingPattern::Array(array) => {
                for item in array.items.iter().flatten() {
                    self.bind_target(&item.target, Type::Any);
                }
            }
        }
    }

    fn bind_pattern_captures(&mut self, pattern: &MatchPattern<'_>) {
        match pattern {
            MatchPattern::Binding(name) => self.bind_value(&name.name, Type::Any),
            MatchPattern::Variant { fields, .. } => {
                for field in fields {
                    self.bind_pattern_captures(field);
                }
            }
            MatchPattern::Array(items) => {
                for item in items {
                    self.bind_pattern_captures(item);
                }
            }
            MatchPattern::Object(props) => {
                for (key, sub) in props {
                    match sub {
                        Some(pattern) => self.bind_pattern_captures(pattern),
                        None => self.bind_value(&key.name, Type::Any),
                    }
                }
            }
            MatchPattern::Literal(_) | MatchPattern::Wildcard | MatchPattern::EnumVal(_) => {}
        }
    }

    fn function_type(&self, params: &[Param<'_>], return_ty: Option<&TypeExpr>) -> Type {
        let params = params
            .iter()
            .map(|param| {
                let name = match &param.target {
                    BindingTarget::Name(name) => name.name.clone(),
                    BindingTarget::Pattern(_) => String::new(),
                };
                let ty = param
                    .ty
                    .as_ref()
                    .map(|t| self.annotation(t))
                    .unwrap_or(Type::Any);
                (name, ty)
            })
            .collect();
        let ret = return_ty
            .map(|t| self.annotation(t))
            .unwrap_or(Type::Any);
        Type::Function {
            params,
            ret: Box::new(ret),
        }
    }

    fn infer_body(&mut self, params: &[Param<'_>], statements: &[Statement<'_>]) {
        self.push_frame();
        for param in params {
            if let Some(default) = param.default {
                self.infer_expr(default);
            }
            let ty = param
                .ty
                .as_ref()
                .map(|t| self.annotation(t))
                .unwrap_or(Type::Any);
            self.bind_target(&param.target, ty);
        }
        for stmt in statements {
            self.infer_stmt(stmt);
        }
        self.pop_frame();
    }

    fn infer_block(&mut self, block: &Block<'_>) {
        self.push_frame();
        for stmt in block.statements {
            self.infer_stmt(stmt);
        }
        self.pop_frame();
    }

    fn infer_class(&mut self, decl: &ClassDecl<'_>) {
        let mut fields = IndexMap::new();
        let mut methods = IndexMap::new();
        for member in decl.members {
            match member.kind {
                MemberKind::Field => {
                    let ty = member
                        .ty
                        .as_ref()
                        .map(|t| self.annotation(t))
                        .or_else(|| member.init.map(|init| self.infer_expr(init)))
                        .unwrap_or(Type::Any);
                    fields.insert(member.name.name.clone(), ty);
                }
                _ => {
                    let ty = self.function_type(member.params, member.return_ty.as_ref());
                    methods.insert(member.name.name.clone(), ty);
                }
            }
        }
        let class_ty = Type::Class {
            name: decl.name.name.clone(),
            fields,
            methods,
        };
        self.bind_value(&decl.name.name, class_ty.clone());
        self.bind_type(&decl.name.name, class_ty.clone());

        self.push_frame();
        self.bind_value("this", class_ty);
        for member in decl.members {
            self.check_param_count(member.span, member.params.len());
            if let Some(body) = member.body {
                self.infer_body(member.params, body.statements);
            }
        }
        self.pop_frame();
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn infer_expr(&mut self, expr: &Expression<'_>) -> Type {
        match expr {
            Expression::Number(lit) => {
                if lit.bigint.is_some() {
                    Type::bigint()
                } else {
                    Type::number()
                }
            }
            Expression::String(_) => Type::string(),
            Expression::Template(template) => {
                for part in template.parts {
                    if let TemplateElem::Expr(expr) = part {
                        self.infer_expr(expr);
                    }
                }
                Type::string()
            }
            Expression::Bool(_) => Type::boolean(),
            Expression::Null(_) => Type::Null,
            Expression::Undefined(_) => Type::Undefined,
            Expression::This(_) => self
                .lookup_value("this")
                .cloned()
                .unwrap_or(Type::Any),
            Expression::Super(_) => Type::Any,
            Expression::Ident(ident) => match self.lookup_value(&ident.name) {
                Some(ty) => ty.clone(),
                None => {
                    // The scope pass already caught hard misses; in strict
                    // mode an unknown type is still worth a warning.
                    if self.strict {
                        self.warn(
                            ident.span,
                            format!("cannot determine the type of '{}'", ident.name),
                        );
                    }
                    Type::Any
                }
            },
            Expression::Array(array) => {
                let elems: Vec<Type> = array
                    .elements
                    .iter()
                    .map(|e| self.infer_expr(e))
                    .collect();
                Type::Array(Box::new(Type::union(elems)))
            }
            Expression::Object(object) => {
                let mut fields = IndexMap::new();
                for prop in object.props {
                    match prop {
                        ObjectProp::KeyValue { key, value } => {
                            let ty = self.infer_expr(value);
                            match key {
                                PropKey::Name(name) => {
                                    fields.insert(name.name.clone(), ty);
                                }
                                PropKey::String(s) => {
                                    fields.insert(s.value.clone(), ty);
                                }
                                PropKey::Computed(computed) => {
                                    self.infer_expr(computed);
                                }
                            }
                        }
                        ObjectProp::Shorthand(name) => {
                            let ty = self
                                .lookup_value(&name.name)
                                .cloned()
                                .unwrap_or(Type::Any);
                            fields.insert(name.name.clone(), ty);
                        }
                        ObjectProp::Spread(expr) => {
                            self.infer_expr(expr);
                        }
                        ObjectProp::Method {
                            key, params, body, ..
                        } => {
                            let ty = self.function_type(params, None);
                            if let PropKey::Name(name) = key {
                                fields.insert(name.name.clone(), ty);
                            }
                            self.infer_body(params, body.statements);
                        }
                    }
                }
                Type::Object(fields)
            }
            Expression::Function(func) => {
                let ty = self.function_type(func.params, func.return_ty.as_ref());
                self.check_param_count(func.span, func.params.len());
                self.infer_body(func.params, func.body.statements);
                ty
            }
            Expression::Arrow(arrow) => {
                let ty = self.function_type(arrow.params, arrow.return_ty.as_ref());
                self.check_param_count(arrow.span, arrow.params.len());
                match &arrow.body {
                    ArrowBody::Block(block) => self.infer_body(arrow.params, block.statements),
                    ArrowBody::Expr(expr) => {
                        self.push_frame();
                        for param in arrow.params {
                            let param_ty = param
                                .ty
                                .as_ref()
                                .map(|t| self.annotation(t))
                                .unwrap_or(Type::Any);
                            self.bind_target(&param.target, param_ty);
                        }
                        self.infer_expr(expr);
                        self.pop_frame();
                    }
                }
                ty
            }
            Expression::Member(member) => self.infer_member(member),
            Expression::Call(call) => {
                let callee_ty = self.infer_expr(call.callee);
                for arg in call.args {
                    self.infer_expr(arg);
                }
                match callee_ty {
                    Type::Function { ret, .. } => *ret,
                    class @ Type::Class { .. } => class,
                    _ => Type::Any,
                }
            }
            Expression::New(new) => {
                let callee_ty = self.infer_expr(new.callee);
                for arg in new.args {
                    self.infer_expr(arg);
                }
                match callee_ty {
                    class @ Type::Class { .. } => class,
                    _ => Type::Any,
                }
            }
            Expression::Unary(unary) => {
                self.infer_expr(unary.operand);
                match unary.op {
                    UnaryOp::TypeOf => Type::string(),
                    UnaryOp::Not => Type::boolean(),
                    UnaryOp::Void => Type::Undefined,
                    UnaryOp::Delete => Type::boolean(),
                    _ => Type::number(),
                }
            }
            Expression::Binary(binary) => self.infer_binary(binary),
            Expression::Assign(assign) => self.infer_assign(assign),
            Expression::Ternary(ternary) => {
                self.infer_expr(ternary.cond);
                let then_ty = self.infer_expr(ternary.then_expr);
                let else_ty = self.infer_expr(ternary.else_expr);
                Type::union(vec![then_ty, else_ty])
            }
            Expression::Await(await_expr) => {
                self.infer_expr(await_expr.operand);
                Type::Any
            }
            Expression::Yield(yield_expr) => {
                if let Some(operand) = yield_expr.operand {
                    self.infer_expr(operand);
                }
                Type::Any
            }
            Expression::Spread(spread) => {
                self.infer_expr(spread.operand);
                Type::Any
            }
            Expression::Sequence(seq) => {
                let mut last = Type::Any;
                for expr in seq.exprs {
                    last = self.infer_expr(expr);
                }
                last
            }
            Expression::Channel(_) => Type::Any,
            Expression::Bind(bind) => {
                self.infer_expr(bind.object);
                Type::Any
            }
            Expression::Have(have) => {
                self.infer_expr(have.operand);
                Type::boolean()
            }
            Expression::Require(require) => {
                self.infer_expr(require.arg);
                Type::Any
            }
            Expression::Decorated(decorated) => {
                if let Some(args) = decorated.decorator.args {
                    for arg in args {
                        self.infer_expr(arg);
                    }
                }
                self.infer_expr(decorated.expr);
                Type::Any
            }
            Expression::Cast(cast) => {
                let expr_ty = self.infer_expr(cast.expr);
                match cast.op {
                    CastOp::As => self.annotation(&cast.ty),
                    CastOp::Satisfies => expr_ty,
                }
            }
        }
    }

    fn infer_member(&mut self, member: &MemberExpr<'_>) -> Type {
        let object_ty = self.infer_expr(member.object);
        match &member.property {
            MemberProp::Computed(index) => {
                self.infer_expr(index);
                match object_ty {
                    Type::Array(elem) => *elem,
                    Type::Tuple(elems) => Type::union(elems),
                    _ => Type::Any,
                }
            }
            MemberProp::Name(name) => match &object_ty {
                Type::Object(fields) => {
                    fields.get(&name.name).cloned().unwrap_or(Type::Any)
                }
                Type::Class {
                    fields, methods, ..
                } => fields
                    .get(&name.name)
                    .or_else(|| methods.get(&name.name))
                    .cloned()
                    .unwrap_or(Type::Any),
                Type::Array(_) => {
                    if name.name == "length" {
                        Type::number()
                    } else if ARRAY_METHODS.contains(&name.name.as_str()) {
                        Type::Any
                    } else {
                        Type::Any
                    }
                }
                Type::Primitive("string") => {
                    if name.name == "length" {
                        Type::number()
                    } else if STRING_METHODS.contains(&name.name.as_str()) {
                        Type::Any
                    } else {
                        Type::Any
                    }
                }
                _ => Type::Any,
            },
        }
    }

    fn infer_binary(&mut self, binary: &BinaryExpr<'_>) -> Type {
        let left = self.infer_expr(binary.left);
        let right = self.infer_expr(binary.right);

        if binary.op == BinaryOp::Div {
            if let Expression::Number(n) = binary.right {
                if n.value == 0.0 && n.bigint.is_none() {
                    self.warn(binary.span, "division by literal zero");
                }
            }
        }

        match binary.op {
            BinaryOp::Add => {
                let is_string = |t: &Type| {
                    matches!(t, Type::Primitive("string"))
                        || matches!(t, Type::Literal(Literal::String(_)))
                };
                if is_string(&left) || is_string(&right) {
                    Type::string()
                } else if matches!(left, Type::Primitive("bigint"))
                    && matches!(right, Type::Primitive("bigint"))
                {
                    Type::bigint()
                } else {
                    Type::number()
                }
            }
            BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem
            | BinaryOp::Pow
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::UShr
            | BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor => Type::number(),
            BinaryOp::EqEq
            | BinaryOp::NotEq
            | BinaryOp::EqEqEq
            | BinaryOp::NotEqEq
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge
            | BinaryOp::In
            | BinaryOp::InstanceOf => Type::boolean(),
            BinaryOp::And | BinaryOp::Or => Type::union(vec![left, right]),
            BinaryOp::Nullish => Type::union(vec![left.non_nullish(), right]),
            BinaryOp::Pipeline => Type::Any,
        }
    }

    fn infer_assign(&mut self, assign: &AssignExpr<'_>) -> Type {
        if matches!(assign.value, Expression::Assign(_)) {
            self.warn(assign.span, "chained assignment obscures evaluation order");
        }
        let value_ty = self.infer_expr(assign.value);
        if assign.op == "=" {
            if let Expression::Ident(ident) = assign.target {
                if let Some(declared) = self.lookup_value(&ident.name).cloned() {
                    if !matches!(declared, Type::Any)
                        && !Type::assignable(&declared, &value_ty)
                    {
                        self.mismatch(ident.span, &declared, &value_ty);
                    }
                }
            }
        } else {
            self.infer_expr(assign.target);
        }
        value_ty
    }
}

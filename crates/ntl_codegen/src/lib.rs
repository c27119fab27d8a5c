//! ntl_codegen: AST to JavaScript output.
//!
//! Emits a newline-indented stream, two spaces per level, in CommonJS form;
//! the driver's ESM rewrite runs afterwards for module targets. Every
//! NTL-only construct lowers to portable JavaScript here; type-level
//! declarations (interface, trait, type alias, declare) emit nothing.

use ntl_ast::*;
use ntl_diagnostics::{codes, Diagnostic, Phase};
use std::path::PathBuf;

/// The closed set of bundled NTL module names.
pub const NTL_MODULES: &[&str] = &[
    "http", "fs", "crypto", "logger", "test", "ai", "game", "web", "obf",
];

/// The channel runtime helper, emitted once per file when `channel()` is
/// used. Single queue, FIFO for both values and pending receivers.
const CHANNEL_RUNTIME: &str = "\
function __ntl_channel() {
  const _queue = [];
  const _listeners = [];
  return {
    _queue,
    _listeners,
    send(value) {
      if (_listeners.length > 0) {
        _listeners.shift()(value);
      } else {
        _queue.push(value);
      }
    },
    receive() {
      if (_queue.length > 0) {
        return Promise.resolve(_queue.shift());
      }
      return new Promise((resolve) => {
        _listeners.push(resolve);
      });
    },
  };
}
";

/// Options the driver passes to the generator.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Directory the NTL builtin modules resolve against.
    pub module_dir: PathBuf,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            module_dir: PathBuf::from("modules"),
        }
    }
}

/// Generate JavaScript for a source file.
pub fn generate(
    source_file: &SourceFile<'_>,
    options: &EmitOptions,
) -> Result<String, Diagnostic> {
    let mut generator = CodeGenerator::new(&source_file.file_name, options.clone());
    for stmt in source_file.statements {
        generator.emit_statement(stmt)?;
    }
    // Host strict mode, so writes to frozen objects and val reassignments
    // that survive to runtime throw instead of failing silently.
    let mut out = String::from("\"use strict\";\n");
    if generator.uses_channel {
        out.push_str(CHANNEL_RUNTIME);
        out.push('\n');
    }
    out.push_str(&generator.out);
    Ok(out)
}

pub struct CodeGenerator {
    out: String,
    indent: usize,
    uses_channel: bool,
    temp_counter: u32,
    file_name: String,
    options: EmitOptions,
}

type EResult = Result<(), Diagnostic>;

impl CodeGenerator {
    pub fn new(file_name: &str, options: EmitOptions) -> Self {
        Self {
            out: String::with_capacity(4096),
            indent: 0,
            uses_channel: false,
            temp_counter: 0,
            file_name: file_name.to_string(),
            options,
        }
    }

    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn fresh_temp(&mut self, base: &str) -> String {
        self.temp_counter += 1;
        format!("__{}_{}", base, self.temp_counter)
    }

    fn internal_error(&self, span: ntl_core::Span, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(Phase::Compile, message)
            .with_file(self.file_name.clone())
            .with_span(span)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn emit_statement(&mut self, stmt: &Statement<'_>) -> EResult {
        match stmt {
            Statement::Var(decl) => self.emit_var_decl(decl),
            Statement::MultiVar(multi) => self.emit_multi_var(multi),
            Statement::Fn(decl) => self.emit_fn_decl(decl),
            Statement::Class(decl) => self.emit_class_decl(decl),
            // Type-level declarations have no runtime counterpart.
            Statement::Interface(_)
            | Statement::Trait(_)
            | Statement::TypeAlias(_)
            | Statement::Declare(_) => Ok(()),
            Statement::Enum(decl) => self.emit_enum(decl),
            Statement::Namespace(decl) => self.emit_namespace(decl),
            Statement::Macro(decl) => self.emit_macro(decl),
            Statement::Using(decl) => {
                self.write_indent();
                self.write("const ");
                self.write(&decl.name.name);
                self.write(" = ");
                self.emit_expr(decl.init)?;
                self.write(";\n");
                Ok(())
            }
            Statement::NtlRequire(req) => self.emit_ntl_require(req),
            Statement::Block(block) => {
                self.write_indent();
                self.emit_block(block)?;
                self.write("\n");
                Ok(())
            }
            Statement::If(stmt) => {
                self.write_indent();
                self.emit_if(stmt)?;
                self.write("\n");
                Ok(())
            }
            Statement::Unless(stmt) => {
                self.write_indent();
                self.write("if (!(");
                self.emit_expr(stmt.cond)?;
                self.write(")) ");
                self.emit_block(stmt.body)?;
                if let Some(alt) = stmt.alternate {
                    self.write(" else ");
                    self.emit_block(alt)?;
                }
                self.write("\n");
                Ok(())
            }
            Statement::While(stmt) => {
                self.write_indent();
                self.write("while (");
                self.emit_expr(stmt.cond)?;
                self.write(") ");
                self.emit_block(stmt.body)?;
                self.write("\n");
                Ok(())
            }
            Statement::DoWhile(stmt) => {
                self.write_indent();
                self.write("do ");
                self.emit_block(stmt.body)?;
                self.write(" while (");
                self.emit_expr(stmt.cond)?;
                self.write(");\n");
                Ok(())
            }
            Statement::ForOf(stmt) => {
                self.write_indent();
                self.write("for (");
                self.write(if stmt.constant { "const " } else { "let " });
                self.emit_binding_target(&stmt.binding)?;
                self.write(" of ");
                self.emit_expr(stmt.iterable)?;
                self.write(") ");
                self.emit_block(stmt.body)?;
                self.write("\n");
                Ok(())
            }
            Statement::ForIn(stmt) => {
                self.write_indent();
                self.write("for (");
                self.write(if stmt.constant { "const " } else { "let " });
                self.emit_binding_target(&stmt.binding)?;
                self.write(" in ");
                self.emit_expr(stmt.object)?;
                self.write(") ");
                self.emit_block(stmt.body)?;
                self.write("\n");
                Ok(())
            }
            Statement::Loop(stmt) => {
                self.write_indent();
                self.write("while (true) ");
                self.emit_block(stmt.body)?;
                self.write("\n");
                Ok(())
            }
            Statement::Return(stmt) => {
                self.write_indent();
                self.write("return");
                if let Some(value) = stmt.value {
                    self.write(" ");
                    self.emit_expr(value)?;
                }
                self.write(";\n");
                Ok(())
            }
            Statement::Throw(stmt) => {
                self.write_indent();
                self.write("throw ");
                self.emit_expr(stmt.value)?;
                self.write(";\n");
                Ok(())
            }
            Statement::Try(stmt) => self.emit_try(stmt),
            Statement::Match(stmt) => self.emit_match(stmt),
            Statement::Break(_) => {
                self.write_indent();
                self.write("break;\n");
                Ok(())
            }
            Statement::Continue(_) => {
                self.write_indent();
                self.write("continue;\n");
                Ok(())
            }
            Statement::Expr(stmt) => {
                self.write_indent();
                self.emit_expr(stmt.expr)?;
                self.write(";\n");
                Ok(())
            }
            Statement::IfSet(stmt) => self.emit_ifset(stmt),
            Statement::Spawn(stmt) => {
                self.write_indent();
                self.write("Promise.resolve().then(() => (");
                self.emit_expr(stmt.expr)?;
                self.write("));\n");
                Ok(())
            }
            Statement::Select(stmt) => self.emit_select(stmt),
            Statement::Import(decl) => self.emit_import(decl),
            Statement::Export(decl) => self.emit_export(decl),
        }
    }

    fn emit_var_decl(&mut self, decl: &VarDecl<'_>) -> EResult {
        self.write_indent();
        self.emit_var_declarator(decl)?;
        self.write(";\n");
        self.emit_freeze_if_immutable(decl)?;
        Ok(())
    }

    fn emit_var_declarator(&mut self, decl: &VarDecl<'_>) -> EResult {
        self.write(if decl.constant { "const " } else { "let " });
        self.emit_binding_target(&decl.target)?;
        if let Some(init) = decl.init {
            self.write(" = ");
            self.emit_expr(init)?;
        }
        Ok(())
    }

    fn emit_freeze_if_immutable(&mut self, decl: &VarDecl<'_>) -> EResult {
        if decl.immutable {
            if let BindingTarget::Name(name) = &decl.target {
                self.write_indent();
                self.write("Object.freeze(");
                self.write(&name.name);
                self.write(");\n");
            }
        }
        Ok(())
    }

    fn emit_multi_var(&mut self, multi: &MultiVarDecl<'_>) -> EResult {
        self.write_indent();
        for (i, decl) in multi.decls.iter().enumerate() {
            if i == 0 {
                self.emit_var_declarator(decl)?;
            } else {
                self.write(", ");
                self.emit_binding_target(&decl.target)?;
                if let Some(init) = decl.init {
                    self.write(" = ");
                    self.emit_expr(init)?;
                }
            }
        }
        self.write(";\n");
        for decl in multi.decls {
            self.emit_freeze_if_immutable(decl)?;
        }
        Ok(())
    }

    fn emit_fn_decl(&mut self, decl: &FnDecl<'_>) -> EResult {
        self.write_indent();
        if decl.is_async {
            self.write("async ");
        }
        self.write("function");
        if decl.is_generator {
            self.write("*");
        }
        self.write(" ");
        self.write(&decl.name.name);
        self.emit_params(decl.params)?;
        self.write(" ");
        self.emit_block(decl.body)?;
        self.write("\n");
        self.emit_decorator_applications(&decl.name.name, decl.decorators)?;
        Ok(())
    }

    /// `@dec fn f` lowers to the declaration followed by
    /// `f = dec(f, args...)` for each decorator in reverse order.
    fn emit_decorator_applications(
        &mut self,
        name: &str,
        decorators: &[Decorator<'_>],
    ) -> EResult {
        for decorator in decorators.iter().rev() {
            self.write_indent();
            self.write(name);
            self.write(" = ");
            self.write(&decorator.name);
            self.write("(");
            self.write(name);
            if let Some(args) = decorator.args {
                for arg in args {
                    self.write(", ");
                    self.emit_expr(arg)?;
                }
            }
            self.write(");\n");
        }
        Ok(())
    }

    fn emit_class_decl(&mut self, decl: &ClassDecl<'_>) -> EResult {
        self.write_indent();
        // Decorated classes must be reassignable.
        if !decl.decorators.is_empty() {
            self.write("let ");
            self.write(&decl.name.name);
            self.write(" = ");
        }
        self.write("class ");
        self.write(&decl.name.name);
        if let Some(superclass) = &decl.superclass {
            self.write(" extends ");
            self.write(superclass);
        }
        self.write(" {\n");
        self.indent += 1;
        for member in decl.members {
            self.emit_class_member(member)?;
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
        if !decl.decorators.is_empty() {
            self.write(";");
        }
        self.write("\n");
        self.emit_decorator_applications(&decl.name.name, decl.decorators)?;
        Ok(())
    }

    fn emit_class_member(&mut self, member: &ClassMember<'_>) -> EResult {
        match member.kind {
            MemberKind::Field => {
                self.write_indent();
                if member.is_static {
                    self.write("static ");
                }
                self.write(&member.name.name);
                if let Some(init) = member.init {
                    self.write(" = ");
                    self.emit_expr(init)?;
                }
                self.write(";\n");
            }
            MemberKind::Method | MemberKind::Getter | MemberKind::Setter => {
                let Some(body) = member.body else {
                    // Abstract methods and trait requirements are erased.
                    return Ok(());
                };
                self.write_indent();
                if member.is_static {
                    self.write("static ");
                }
                if member.is_async {
                    self.write("async ");
                }
                match member.kind {
                    MemberKind::Getter => self.write("get "),
                    MemberKind::Setter => self.write("set "),
                    _ => {}
                }
                // The `init` method is the constructor.
                if member.kind == MemberKind::Method && member.name.name == "init" {
                    self.write("constructor");
                } else {
                    self.write(&member.name.name);
                }
                self.emit_params(member.params)?;
                self.write(" ");
                self.emit_block(body)?;
                self.write("\n");
            }
        }
        Ok(())
    }

    /// Enums lower to a frozen object with auto-numbered members.
    fn emit_enum(&mut self, decl: &EnumDecl<'_>) -> EResult {
        self.write_indent();
        self.write("const ");
        self.write(&decl.name.name);
        self.write(" = Object.freeze({\n");
        self.indent += 1;
        let mut next_value = 0i64;
        for member in decl.members {
            self.write_indent();
            self.write(&member.name.name);
            self.write(": ");
            match member.value {
                Some(expr) => {
                    self.emit_expr(expr)?;
                    if let Expression::Number(n) = expr {
                        if n.bigint.is_none() && n.value.fract() == 0.0 {
                            next_value = n.value as i64 + 1;
                        }
                    }
                }
                None => {
                    self.write(&next_value.to_string());
                    next_value += 1;
                }
            }
            self.write(",\n");
        }
        self.indent -= 1;
        self.write_indent();
        self.write("});\n");
        Ok(())
    }

    /// Namespaces lower to an IIFE returning the names it declares.
    fn emit_namespace(&mut self, decl: &NamespaceDecl<'_>) -> EResult {
        self.write_indent();
        self.write("const ");
        self.write(&decl.name.name);
        self.write(" = (function () {\n");
        self.indent += 1;
        for stmt in decl.body.statements {
            self.emit_statement(stmt)?;
        }
        let names = declared_names(decl.body.statements);
        self.write_indent();
        self.write("return { ");
        self.write(&names.join(", "));
        self.write(" };\n");
        self.indent -= 1;
        self.write_indent();
        self.write("})();\n");
        Ok(())
    }

    /// Macros are not expanded at compile time; they lower to functions.
    fn emit_macro(&mut self, decl: &MacroDecl<'_>) -> EResult {
        self.write_indent();
        self.write("function ");
        self.write(&decl.name.name);
        self.emit_params(decl.params)?;
        self.write(" ");
        self.emit_block(decl.body)?;
        self.write("\n");
        Ok(())
    }

    fn emit_ntl_require(&mut self, req: &NtlRequire) -> EResult {
        for module in &req.modules {
            if !NTL_MODULES.contains(&module.name.as_str()) {
                return Err(Diagnostic::error(
                    Phase::Resolve,
                    format!(
                        "unknown NTL module '{}'; available modules are {}",
                        module.name,
                        NTL_MODULES.join(", ")
                    ),
                )
                .with_code(codes::UNKNOWN_MODULE)
                .with_file(self.file_name.clone())
                .with_span(module.span));
            }
            let path = self
                .options
                .module_dir
                .join(format!("{}.js", module.name));
            self.write_indent();
            self.write("const ");
            self.write(&module.name);
            self.write(" = require(");
            self.write(&quote_js_string(&path.to_string_lossy()));
            self.write(");\n");
        }
        Ok(())
    }

    fn emit_if(&mut self, stmt: &IfStmt<'_>) -> EResult {
        self.write("if (");
        self.emit_expr(stmt.cond)?;
        self.write(") ");
        self.emit_block(stmt.then_block)?;
        match stmt.alternate {
            Some(Statement::If(nested)) => {
                self.write(" else ");
                self.emit_if(nested)?;
            }
            Some(Statement::Block(block)) => {
                self.write(" else ");
                self.emit_block(block)?;
            }
            Some(other) => {
                return Err(self.internal_error(
                    other.span(),
                    "if alternate is neither a block nor a chained if",
                ));
            }
            None => {}
        }
        Ok(())
    }

    fn emit_try(&mut self, stmt: &TryStmt<'_>) -> EResult {
        self.write_indent();
        self.write("try ");
        self.emit_block(stmt.block)?;
        if let Some(catch) = &stmt.catch {
            self.write(" catch ");
            if let Some(param) = &catch.param {
                self.write("(");
                self.write(&param.name);
                self.write(") ");
            }
            self.emit_block(catch.body)?;
        }
        if let Some(finally) = stmt.finally {
            self.write(" finally ");
            self.emit_block(finally)?;
        }
        self.write("\n");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // match lowering
    // ------------------------------------------------------------------------

    /// A match lowers to a block with a fresh subject binding and an
    /// if/else-if cascade; each pattern compiles to a predicate plus
    /// binding statements inside the arm.
    fn emit_match(&mut self, stmt: &MatchStmt<'_>) -> EResult {
        let subject = self.fresh_temp("match");
        self.write_indent();
        self.write("{\n");
        self.indent += 1;
        self.write_indent();
        self.write("const ");
        self.write(&subject);
        self.write(" = ");
        self.emit_expr(stmt.subject)?;
        self.write(";\n");

        let mut first = true;
        for case in stmt.cases {
            let catch_all = case.guard.is_none()
                && case
                    .patterns
                    .iter()
                    .all(|p| matches!(p, MatchPattern::Wildcard | MatchPattern::Binding(_)));

            if first {
                self.write_indent();
            } else {
                self.write(" else ");
            }
            if catch_all && !first {
                self.emit_match_arm_body(case, &subject)?;
                break;
            }

            self.write("if (");
            let mut predicate = case
                .patterns
                .iter()
                .map(|p| self.pattern_predicate(p, &subject))
                .collect::<Result<Vec<_>, _>>()?
                .join(" || ");
            if case.patterns.len() > 1 {
                predicate = format!("({})", predicate);
            }
            if let Some(guard) = case.guard {
                let mut bindings = Vec::new();
                collect_pattern_bindings(&case.patterns[0], &subject, &mut bindings);
                let mut guard_text = String::new();
                std::mem::swap(&mut self.out, &mut guard_text);
                self.emit_expr(guard)?;
                std::mem::swap(&mut self.out, &mut guard_text);
                let prelude: String = bindings
                    .iter()
                    .map(|(name, path)| format!("const {} = {}; ", name, path))
                    .collect();
                predicate = format!(
                    "{} && (() => {{ {}return ({}); }})()",
                    predicate, prelude, guard_text
                );
            }
            self.write(&predicate);
            self.write(") ");
            self.emit_match_arm_body(case, &subject)?;
            first = false;
        }
        self.write("\n");
        self.indent -= 1;
        self.write_indent();
        self.write("}\n");
        Ok(())
    }

    fn emit_match_arm_body(&mut self, case: &MatchCase<'_>, subject: &str) -> EResult {
        self.write("{\n");
        self.indent += 1;
        let mut bindings = Vec::new();
        collect_pattern_bindings(&case.patterns[0], subject, &mut bindings);
        for (name, path) in &bindings {
            self.write_indent();
            self.write("const ");
            self.write(name);
            self.write(" = ");
            self.write(path);
            self.write(";\n");
        }
        for stmt in case.body.statements {
            self.emit_statement(stmt)?;
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
        Ok(())
    }

    /// The runtime condition under which a pattern matches `path`.
    fn pattern_predicate(
        &mut self,
        pattern: &MatchPattern<'_>,
        path: &str,
    ) -> Result<String, Diagnostic> {
        Ok(match pattern {
            MatchPattern::Wildcard | MatchPattern::Binding(_) => "true".to_string(),
            MatchPattern::Literal(lit) => {
                let mut text = String::new();
                std::mem::swap(&mut self.out, &mut text);
                self.emit_expr(lit)?;
                std::mem::swap(&mut self.out, &mut text);
                format!("{} === {}", path, text)
            }
            MatchPattern::EnumVal(dotted) => format!("{} === {}", path, dotted),
            MatchPattern::Variant { name, fields } => {
                let mut parts = vec![format!(
                    "{} && {}._tag === {}",
                    path,
                    path,
                    quote_js_string(&name.name)
                )];
                for (i, field) in fields.iter().enumerate() {
                    let field_path = format!("{}._{}", path, i);
                    let sub = self.pattern_predicate(field, &field_path)?;
                    if sub != "true" {
                        parts.push(sub);
                    }
                }
                parts.join(" && ")
            }
            MatchPattern::Array(items) => {
                let mut parts = vec![format!(
                    "Array.isArray({}) && {}.length >= {}",
                    path,
                    path,
                    items.len()
                )];
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    let sub = self.pattern_predicate(item, &item_path)?;
                    if sub != "true" {
                        parts.push(sub);
                    }
                }
                parts.join(" && ")
            }
            MatchPattern::Object(props) => {
                let mut parts = vec![format!(
                    "{} && typeof {} === \"object\"",
                    path, path
                )];
                for (key, sub) in props {
                    if let Some(sub_pattern) = sub {
                        let prop_path = format!("{}.{}", path, key.name);
                        let sub = self.pattern_predicate(sub_pattern, &prop_path)?;
                        if sub != "true" {
                            parts.push(sub);
                        }
                    }
                }
                parts.join(" && ")
            }
        })
    }

    // ------------------------------------------------------------------------
    // ifset / select
    // ------------------------------------------------------------------------

    fn emit_ifset(&mut self, stmt: &IfSetStmt<'_>) -> EResult {
        match &stmt.alias {
            Some(alias) => {
                self.write_indent();
                self.write("{\n");
                self.indent += 1;
                self.write_indent();
                self.write("const ");
                self.write(&alias.name);
                self.write(" = ");
                self.emit_expr(stmt.subject)?;
                self.write(";\n");
                self.write_indent();
                self.write("if (");
                self.write(&alias.name);
                self.write(" !== null && ");
                self.write(&alias.name);
                self.write(" !== undefined) ");
                self.emit_block(stmt.body)?;
                if let Some(alt) = stmt.alternate {
                    self.write(" else ");
                    self.emit_block(alt)?;
                }
                self.write("\n");
                self.indent -= 1;
                self.write_indent();
                self.write("}\n");
            }
            None => {
                // No alias, no rebinding: the body sees the original
                // expression.
                self.write_indent();
                self.write("if ((");
                self.emit_expr(stmt.subject)?;
                self.write(") !== null && (");
                self.emit_expr(stmt.subject)?;
                self.write(") !== undefined) ");
                self.emit_block(stmt.body)?;
                if let Some(alt) = stmt.alternate {
                    self.write(" else ");
                    self.emit_block(alt)?;
                }
                self.write("\n");
            }
        }
        Ok(())
    }

    /// `select` races every arm's receive, tagging each with its case
    /// index, then dispatches through an if-cascade.
    fn emit_select(&mut self, stmt: &SelectStmt<'_>) -> EResult {
        let result = self.fresh_temp("select");
        self.write_indent();
        self.write("{\n");
        self.indent += 1;
        self.write_indent();
        self.write("const ");
        self.write(&result);
        self.write(" = await Promise.race([\n");
        self.indent += 1;
        for (i, arm) in stmt.arms.iter().enumerate() {
            self.write_indent();
            self.write("(");
            self.emit_expr(arm.receive)?;
            self.write(&format!(").then((value) => ({{ index: {}, value }})),\n", i));
        }
        self.indent -= 1;
        self.write_indent();
        self.write("]);\n");
        for (i, arm) in stmt.arms.iter().enumerate() {
            self.write_indent();
            self.write(&format!("if ({}.index === {}) {{\n", result, i));
            self.indent += 1;
            self.write_indent();
            self.write("const ");
            self.write(&arm.binding.name);
            self.write(&format!(" = {}.value;\n", result));
            for stmt in arm.body.statements {
                self.emit_statement(stmt)?;
            }
            self.indent -= 1;
            self.write_indent();
            self.write("}\n");
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}\n");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // import / export (CommonJS; the driver rewrites for ESM targets)
    // ------------------------------------------------------------------------

    fn emit_import(&mut self, decl: &ImportDecl) -> EResult {
        let source = quote_js_string(&decl.source);
        if decl.default.is_none() && decl.namespace.is_none() && decl.named.is_empty() {
            self.write_indent();
            self.write(&format!("require({});\n", source));
            return Ok(());
        }
        if let Some(default) = &decl.default {
            self.write_indent();
            self.write(&format!("const {} = require({});\n", default.name, source));
        }
        if let Some(namespace) = &decl.namespace {
            self.write_indent();
            self.write(&format!("const {} = require({});\n", namespace.name, source));
        }
        if !decl.named.is_empty() {
            self.write_indent();
            let specs: Vec<String> = decl
                .named
                .iter()
                .map(|spec| match &spec.alias {
                    Some(alias) => format!("{}: {}", spec.name.name, alias.name),
                    None => spec.name.name.clone(),
                })
                .collect();
            self.write(&format!(
                "const {{ {} }} = require({});\n",
                specs.join(", "),
                source
            ));
        }
        Ok(())
    }

    fn emit_export(&mut self, decl: &ExportDecl<'_>) -> EResult {
        if let Some(inner) = decl.decl {
            self.emit_statement(inner)?;
            for name in declared_names(std::slice::from_ref(inner)) {
                self.write_indent();
                self.write(&format!("module.exports.{} = {};\n", name, name));
            }
            return Ok(());
        }
        if let Some(default) = decl.default {
            self.write_indent();
            self.write("module.exports = ");
            self.emit_expr(default)?;
            self.write(";\n");
            return Ok(());
        }
        for (name, alias) in &decl.names {
            let exported = alias.as_ref().unwrap_or(name);
            self.write_indent();
            self.write(&format!(
                "module.exports.{} = {};\n",
                exported.name, name.name
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Blocks, params, patterns
    // ========================================================================

    fn emit_block(&mut self, block: &Block<'_>) -> EResult {
        if block.statements.is_empty() {
            self.write("{}");
            return Ok(());
        }
        self.write("{\n");
        self.indent += 1;
        for stmt in block.statements {
            self.emit_statement(stmt)?;
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
        Ok(())
    }

    fn emit_params(&mut self, params: &[Param<'_>]) -> EResult {
        self.write("(");
        let mut first = true;
        for param in params {
            // `this` parameters are type-level only.
            if let BindingTarget::Name(name) = &param.target {
                if name.name == "this" {
                    continue;
                }
            }
            if !first {
                self.write(", ");
            }
            first = false;
            if param.rest {
                self.write("...");
            }
            self.emit_binding_target(&param.target)?;
            if let Some(default) = param.default {
                self.write(" = ");
                self.emit_expr(default)?;
            }
        }
        self.write(")");
        Ok(())
    }

    fn emit_binding_target(&mut self, target: &BindingTarget<'_>) -> EResult {
        match target {
            BindingTarget::Name(name) => {
                self.write(&name.name);
                Ok(())
            }
            BindingTarget::Pattern(pattern) => self.emit_binding_pattern(pattern),
        }
    }

    fn emit_binding_pattern(&mut self, pattern: &BindingPattern<'_>) -> EResult {
        match pattern {
            BindingPattern::Object(object) => {
                self.write("{ ");
                let mut first = true;
                for prop in &object.props {
                    if !first {
                        self.write(", ");
                    }
                    first = false;
                    self.write(&prop.key.name);
                    if let Some(nested) = prop.nested {
                        self.write(": ");
                        self.emit_binding_pattern(nested)?;
                    } else if let Some(alias) = &prop.alias {
                        self.write(": ");
                        self.write(&alias.name);
                    }
                    if let Some(default) = prop.default {
                        self.write(" = ");
                        self.emit_expr(default)?;
                    }
                }
                if let Some(rest) = &object.rest {
                    if !first {
                        self.write(", ");
                    }
                    self.write("...");
                    self.write(&rest.name);
                }
                self.write(" }");
                Ok(())
            }
            BindingPattern::Array(array) => {
                self.write("[");
                for (i, item) in array.items.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    match item {
                        None => {}
                        Some(item) => {
                            if item.rest {
                                self.write("...");
                            }
                            self.emit_binding_target(&item.target)?;
                            if let Some(default) = item.default {
                                self.write(" = ");
                                self.emit_expr(default)?;
                            }
                        }
                    }
                }
                self.write("]");
                Ok(())
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn emit_expr(&mut self, expr: &Expression<'_>) -> EResult {
        match expr {
            Expression::Number(lit) => {
                match &lit.bigint {
                    Some(digits) => {
                        self.write(digits);
                        self.write("n");
                    }
                    None => self.write(&format_number(lit.value)),
                }
                Ok(())
            }
            Expression::String(lit) => {
                self.write(&quote_js_string(&lit.value));
                Ok(())
            }
            Expression::Template(template) => self.emit_template(template),
            Expression::Bool(lit) => {
                self.write(if lit.value { "true" } else { "false" });
                Ok(())
            }
            Expression::Null(_) => {
                self.write("null");
                Ok(())
            }
            Expression::Undefined(_) => {
                self.write("undefined");
                Ok(())
            }
            Expression::This(_) => {
                self.write("this");
                Ok(())
            }
            Expression::Super(_) => {
                self.write("super");
                Ok(())
            }
            Expression::Ident(ident) => {
                self.write(&ident.name);
                Ok(())
            }
            Expression::Array(array) => {
                self.write("[");
                for (i, element) in array.elements.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.emit_expr(element)?;
                }
                self.write("]");
                Ok(())
            }
            Expression::Object(object) => self.emit_object(object),
            Expression::Function(func) => {
                if func.is_async {
                    self.write("async ");
                }
                self.write("function");
                if func.is_generator {
                    self.write("*");
                }
                if let Some(name) = &func.name {
                    self.write(" ");
                    self.write(&name.name);
                }
                self.emit_params(func.params)?;
                self.write(" ");
                self.emit_block(func.body)?;
                Ok(())
            }
            Expression::Arrow(arrow) => {
                if arrow.is_async {
                    self.write("async ");
                }
                // A single plain parameter needs no parentheses.
                match arrow.params {
                    [Param {
                        target: BindingTarget::Name(name),
                        default: None,
                        rest: false,
                        ..
                    }] => self.write(&name.name),
                    _ => self.emit_params(arrow.params)?,
                }
                self.write(" => ");
                match &arrow.body {
                    ArrowBody::Block(block) => self.emit_block(block)?,
                    ArrowBody::Expr(expr) => {
                        // Braces would read as a body; parenthesize objects.
                        if matches!(expr, Expression::Object(_) | Expression::Sequence(_)) {
                            self.write("(");
                            self.emit_expr(expr)?;
                            self.write(")");
                        } else {
                            self.emit_expr(expr)?;
                        }
                    }
                }
                Ok(())
            }
            Expression::Member(member) => {
                self.emit_callee(member.object)?;
                match &member.property {
                    MemberProp::Name(name) => {
                        self.write(if member.optional { "?." } else { "." });
                        self.write(&name.name);
                    }
                    MemberProp::Computed(index) => {
                        self.write(if member.optional { "?.[" } else { "[" });
                        self.emit_expr(index)?;
                        self.write("]");
                    }
                }
                Ok(())
            }
            Expression::Call(call) => {
                // `super.init(args)` is a direct base constructor call.
                if let Expression::Member(member) = call.callee {
                    if matches!(member.object, Expression::Super(_)) {
                        if let MemberProp::Name(name) = &member.property {
                            if name.name == "init" {
                                self.write("super");
                                self.emit_args(call.args)?;
                                return Ok(());
                            }
                        }
                    }
                }
                self.emit_callee(call.callee)?;
                if call.optional {
                    self.write("?.");
                }
                self.emit_args(call.args)?;
                Ok(())
            }
            Expression::New(new) => {
                self.write("new ");
                self.emit_callee(new.callee)?;
                self.emit_args(new.args)?;
                Ok(())
            }
            Expression::Unary(unary) => {
                if unary.prefix {
                    self.write(unary.op.as_str());
                    if unary.op.is_word() {
                        self.write(" ");
                    }
                    self.emit_operand(unary.operand)?;
                } else {
                    self.emit_operand(unary.operand)?;
                    self.write(unary.op.as_str());
                }
                Ok(())
            }
            Expression::Binary(binary) => self.emit_binary(binary),
            Expression::Assign(assign) => {
                self.emit_expr(assign.target)?;
                self.write(" ");
                self.write(&assign.op);
                self.write(" ");
                self.emit_expr(assign.value)?;
                Ok(())
            }
            Expression::Ternary(ternary) => {
                self.emit_operand(ternary.cond)?;
                self.write(" ? ");
                self.emit_expr(ternary.then_expr)?;
                self.write(" : ");
                self.emit_expr(ternary.else_expr)?;
                Ok(())
            }
            Expression::Await(await_expr) => {
                self.write("await ");
                self.emit_operand(await_expr.operand)?;
                Ok(())
            }
            Expression::Yield(yield_expr) => {
                self.write("yield");
                if yield_expr.delegate {
                    self.write("*");
                }
                if let Some(operand) = yield_expr.operand {
                    self.write(" ");
                    self.emit_expr(operand)?;
                }
                Ok(())
            }
            Expression::Spread(spread) => {
                self.write("...");
                self.emit_expr(spread.operand)?;
                Ok(())
            }
            Expression::Sequence(seq) => {
                self.write("(");
                for (i, expr) in seq.exprs.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.emit_expr(expr)?;
                }
                self.write(")");
                Ok(())
            }
            Expression::Channel(_) => {
                self.uses_channel = true;
                self.write("__ntl_channel()");
                Ok(())
            }
            Expression::Bind(bind) => {
                self.emit_callee(bind.object)?;
                self.write(".");
                self.write(&bind.method.name);
                self.write(".bind(");
                self.emit_callee(bind.object)?;
                self.write(")");
                Ok(())
            }
            Expression::Have(have) => {
                self.write("((");
                self.emit_expr(have.operand)?;
                self.write(") !== null && (");
                self.emit_expr(have.operand)?;
                self.write(") !== undefined)");
                Ok(())
            }
            Expression::Require(require) => {
                self.write("require(");
                self.emit_expr(require.arg)?;
                self.write(")");
                Ok(())
            }
            Expression::Decorated(decorated) => {
                self.write(&decorated.decorator.name);
                self.write("(");
                self.emit_expr(decorated.expr)?;
                if let Some(args) = decorated.decorator.args {
                    for arg in args {
                        self.write(", ");
                        self.emit_expr(arg)?;
                    }
                }
                self.write(")");
                Ok(())
            }
            // Casts are type-level and erase to their operand.
            Expression::Cast(cast) => self.emit_expr(cast.expr),
        }
    }

    fn emit_args(&mut self, args: &[Expression<'_>]) -> EResult {
        self.write("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.emit_expr(arg)?;
        }
        self.write(")");
        Ok(())
    }

    /// Emit an expression in callee/object position, parenthesizing the
    /// forms whose precedence is below member access.
    fn emit_callee(&mut self, expr: &Expression<'_>) -> EResult {
        let needs_parens = matches!(
            expr,
            Expression::Binary(_)
                | Expression::Ternary(_)
                | Expression::Assign(_)
                | Expression::Arrow(_)
                | Expression::Function(_)
                | Expression::Unary(_)
                | Expression::Await(_)
                | Expression::Yield(_)
                | Expression::Number(_)
                | Expression::Object(_)
                | Expression::Have(_)
                | Expression::Decorated(_)
        );
        if needs_parens {
            self.write("(");
            self.emit_expr(expr)?;
            self.write(")");
        } else {
            self.emit_expr(expr)?;
        }
        Ok(())
    }

    /// Emit an expression in unary-operand or ternary-condition position.
    fn emit_operand(&mut self, expr: &Expression<'_>) -> EResult {
        let needs_parens = matches!(
            expr,
            Expression::Binary(_) | Expression::Ternary(_) | Expression::Assign(_)
        );
        if needs_parens {
            self.write("(");
            self.emit_expr(expr)?;
            self.write(")");
        } else {
            self.emit_expr(expr)?;
        }
        Ok(())
    }

    /// Pipeline lowers to reverse application; other operators emit with
    /// parentheses where a child binds looser than its parent, or equally
    /// on the non-associative side, or where `??` meets `||`/`&&`.
    fn emit_binary(&mut self, binary: &BinaryExpr<'_>) -> EResult {
        if binary.op == BinaryOp::Pipeline {
            self.write("(");
            self.emit_expr(binary.right)?;
            self.write(")(");
            self.emit_expr(binary.left)?;
            self.write(")");
            return Ok(());
        }
        self.emit_binary_side(binary, binary.left, true)?;
        self.write(" ");
        self.write(binary.op.as_str());
        self.write(" ");
        self.emit_binary_side(binary, binary.right, false)?;
        Ok(())
    }

    fn emit_binary_side(
        &mut self,
        parent: &BinaryExpr<'_>,
        child: &Expression<'_>,
        is_left: bool,
    ) -> EResult {
        let needs_parens = match child {
            Expression::Binary(inner) => {
                let parent_prec = parent.op.precedence();
                let child_prec = inner.op.precedence();
                let nullish_mix = parent.op == BinaryOp::Nullish
                    && matches!(inner.op, BinaryOp::Or | BinaryOp::And)
                    || inner.op == BinaryOp::Nullish
                        && matches!(parent.op, BinaryOp::Or | BinaryOp::And);
                let assoc_side = if parent.op.right_assoc() { !is_left } else { is_left };
                child_prec < parent_prec
                    || (child_prec == parent_prec && !assoc_side)
                    || nullish_mix
            }
            Expression::Ternary(_)
            | Expression::Assign(_)
            | Expression::Arrow(_)
            | Expression::Yield(_) => true,
            _ => false,
        };
        if needs_parens {
            self.write("(");
            self.emit_expr(child)?;
            self.write(")");
        } else {
            self.emit_expr(child)?;
        }
        Ok(())
    }

    fn emit_object(&mut self, object: &ObjectLit<'_>) -> EResult {
        if object.props.is_empty() {
            self.write("{}");
            return Ok(());
        }
        self.write("{ ");
        let mut first = true;
        for prop in object.props {
            if !first {
                self.write(", ");
            }
            first = false;
            match prop {
                ObjectProp::KeyValue { key, value } => {
                    self.emit_prop_key(key)?;
                    self.write(": ");
                    self.emit_expr(value)?;
                }
                ObjectProp::Shorthand(name) => self.write(&name.name),
                ObjectProp::Spread(expr) => {
                    self.write("...");
                    self.emit_expr(expr)?;
                }
                ObjectProp::Method {
                    key,
                    kind,
                    params,
                    body,
                    is_async,
                } => {
                    if *is_async {
                        self.write("async ");
                    }
                    match kind {
                        MemberKind::Getter => self.write("get "),
                        MemberKind::Setter => self.write("set "),
                        _ => {}
                    }
                    self.emit_prop_key(key)?;
                    self.emit_params(params)?;
                    self.write(" ");
                    self.emit_block(body)?;
                }
            }
        }
        self.write(" }");
        Ok(())
    }

    fn emit_prop_key(&mut self, key: &PropKey<'_>) -> EResult {
        match key {
            PropKey::Name(name) => {
                self.write(&name.name);
                Ok(())
            }
            PropKey::String(s) => {
                self.write(&quote_js_string(&s.value));
                Ok(())
            }
            PropKey::Computed(expr) => {
                self.write("[");
                self.emit_expr(expr)?;
                self.write("]");
                Ok(())
            }
        }
    }

    fn emit_template(&mut self, template: &TemplateLit<'_>) -> EResult {
        self.write("`");
        for part in template.parts {
            match part {
                TemplateElem::Text(text) => {
                    self.write(&escape_template_text(text));
                }
                TemplateElem::Expr(expr) => {
                    self.write("${");
                    self.emit_expr(expr)?;
                    self.write("}");
                }
            }
        }
        self.write("`");
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Names a list of statements declares at its own level, for namespace
/// returns and export registration.
fn declared_names(statements: &[Statement<'_>]) -> Vec<String> {
    let mut names = Vec::new();
    for stmt in statements {
        match stmt {
            Statement::Var(decl) => collect_target_names(&decl.target, &mut names),
            Statement::MultiVar(multi) => {
                for decl in multi.decls {
                    collect_target_names(&decl.target, &mut names);
                }
            }
            Statement::Fn(decl) => names.push(decl.name.name.clone()),
            Statement::Class(decl) => names.push(decl.name.name.clone()),
            Statement::Enum(decl) => names.push(decl.name.name.clone()),
            Statement::Macro(decl) => names.push(decl.name.name.clone()),
            Statement::Namespace(decl) => names.push(decl.name.name.clone()),
            Statement::Using(decl) => names.push(decl.name.name.clone()),
            _ => {}
        }
    }
    names
}

fn collect_target_names(target: &BindingTarget<'_>, names: &mut Vec<String>) {
    match target {
        BindingTarget::Name(name) => names.push(name.name.clone()),
        BindingTarget::Pattern(pattern) => collect_pattern_names(pattern, names),
    }
}

fn collect_pattern_names(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match pattern {
        BindingPattern::Object(object) => {
            for prop in &object.props {
                if let Some(nested) = prop.nested {
                    collect_pattern_names(nested, names);
                } else if let Some(alias) = &prop.alias {
                    names.push(alias.name.clone());
                } else {
                    names.push(prop.key.name.clone());
                }
            }
            if let Some(rest) = &object.rest {
                names.push(rest.name.clone());
            }
        }
        BindingPattern::Array(array) => {
            for item in array.items.iter().flatten() {
                collect_target_names(&item.target, names);
            }
        }
    }
}

/// The `(name, access path)` pairs a match pattern binds.
fn collect_pattern_bindings(
    pattern: &MatchPattern<'_>,
    path: &str,
    out: &mut Vec<(String, String)>,
) {
    match pattern {
        MatchPattern::Binding(name) => out.push((name.name.clone(), path.to_string())),
        MatchPattern::Variant { fields, .. } => {
            for (i, field) in fields.iter().enumerate() {
                collect_pattern_bindings(field, &format!("{}._{}", path, i), out);
            }
        }
        MatchPattern::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_pattern_bindings(item, &format!("{}[{}]", path, i), out);
            }
        }
        MatchPattern::Object(props) => {
            for (key, sub) in props {
                let prop_path = format!("{}.{}", path, key.name);
                match sub {
                    Some(sub_pattern) => collect_pattern_bindings(sub_pattern, &prop_path, out),
                    None => out.push((key.name.clone(), prop_path)),
                }
            }
        }
        MatchPattern::Literal(_) | MatchPattern::Wildcard | MatchPattern::EnumVal(_) => {}
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

/// Double-quote a string with JavaScript escaping.
fn quote_js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn escape_template_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            c => out.push(c),
        }
    }
    out
}

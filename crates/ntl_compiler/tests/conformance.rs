//! Conformance scenarios for the whole pipeline.
//!
//! These are end-to-end expectations over compile_source: exact shapes in
//! the emitted JavaScript, diagnostic codes and positions, and the
//! documented behavior of every NTL-only construct.

use bumpalo::Bump;
use ntl_compiler::Compiler;
use ntl_config::CompilerOptions;
use ntl_diagnostics::codes;

fn compile_with(source: &str, options: CompilerOptions) -> (bool, String, Vec<ntl_diagnostics::Diagnostic>, Vec<ntl_diagnostics::Diagnostic>) {
    let arena = Bump::new();
    let compiler = Compiler::new(&arena, options);
    let output = compiler.compile_source("main.ntl", source);
    (
        output.success,
        output.code.unwrap_or_default(),
        output.errors,
        output.warnings,
    )
}

fn compile(source: &str) -> (bool, String, Vec<ntl_diagnostics::Diagnostic>, Vec<ntl_diagnostics::Diagnostic>) {
    compile_with(source, CompilerOptions::default())
}

// ============================================================================
// Scenario: hello
// ============================================================================

#[test]
fn hello_world() {
    let source = "val name: string = \"World\"\nfn greet(n: string) -> string { return `Hello, ${n}!` }\nconsole.log(greet(name))";
    let (success, code, errors, warnings) = compile(source);
    assert!(success, "errors: {:?}", errors);
    assert!(warnings.is_empty());
    assert_eq!(code.matches("const name = \"World\";").count(), 1);
    assert_eq!(code.matches("function greet(n)").count(), 1);
    assert_eq!(code.matches("console.log(greet(name));").count(), 1);
}

// ============================================================================
// Scenario: undeclared identifier
// ============================================================================

#[test]
fn undeclared_identifier() {
    let (success, _, errors, _) = compile("fn f() { return username }");
    assert!(!success);
    assert_eq!(errors.len(), 1);
    let d = &errors[0];
    assert_eq!(d.phase, ntl_diagnostics::Phase::Scope);
    assert_eq!(d.code, Some(codes::UNDEF_VAR));
    assert_eq!(d.span.unwrap().line, 1);
    assert_eq!(d.suggestions.len(), 3);
    assert!(d.similar.is_empty());
}

// ============================================================================
// Scenario: print redirect
// ============================================================================

#[test]
fn print_redirect() {
    let (success, _, errors, _) = compile("print(\"Hello\")");
    assert!(!success);
    assert_eq!(errors.len(), 1);
    let d = &errors[0];
    assert_eq!(d.code, Some(codes::UNDEF_FUNC));
    let example = d.example.as_ref().expect("bad/good example");
    assert_eq!(example.bad, "print(\"Hello\")");
    assert_eq!(example.good, "console.log(\"Hello\")");
    assert_eq!(d.suggestions.len(), 3);
    assert!(d.suggestions.iter().any(|s| s.contains("logger")));
}

// ============================================================================
// Scenario: match on algebraic type
// ============================================================================

#[test]
fn match_on_algebraic_type() {
    let source = "type Result = Ok(v) | Err(e)\nval r: Result = { _tag: \"Ok\", _0: 42 }\nmatch r { case Ok(x) => console.log(x) case Err(m) => console.log(m) }";
    let (success, code, errors, _) = compile(source);
    assert!(success, "errors: {:?}", errors);
    assert!(code.contains("const __match_1 = r;"));
    assert!(code.contains("_tag === \"Ok\""));
    assert!(code.contains("_tag === \"Err\""));
    assert!(code.contains("const x = __match_1._0;"));
    assert!(code.contains("const m = __match_1._0;"));
}

// ============================================================================
// Scenario: immutable freeze
// ============================================================================

#[test]
fn immutable_freeze() {
    let source = "immutable val c = { a: 1 }\nc.a = 2";
    let (success, code, errors, _) = compile(source);
    assert!(success, "errors: {:?}", errors);
    assert!(code.starts_with("\"use strict\";"));
    assert!(code.contains("Object.freeze(c);"));
    assert!(code.contains("c.a = 2;"));
}

// ============================================================================
// Scenario: pipeline
// ============================================================================

#[test]
fn pipeline_application() {
    let source = "val r = [1,2,3] |> (xs => xs.map(x => x*2)) |> (xs => xs.join(\",\"))";
    let (success, code, errors, _) = compile(source);
    assert!(success, "errors: {:?}", errors);
    // Nested reverse application, (right)(left), no precedence surprise.
    assert!(code.contains(
        "(xs => xs.join(\",\"))((xs => xs.map(x => x * 2))([1, 2, 3]))"
    ));
}

// ============================================================================
// Strict mode
// ============================================================================

#[test]
fn strict_mode_mismatch_is_fatal() {
    let options = CompilerOptions {
        strict: true,
        ..CompilerOptions::default()
    };
    let (success, _, errors, _) = compile_with("val x: number = \"hi\"", options);
    assert!(!success);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, Some(codes::TYPE_MISMATCH));
}

#[test]
fn strict_mode_any_is_compatible() {
    let options = CompilerOptions {
        strict: true,
        ..CompilerOptions::default()
    };
    let (success, _, errors, _) = compile_with("val x: any = \"hi\"", options);
    assert!(success, "errors: {:?}", errors);
}

#[test]
fn non_strict_skips_type_checking() {
    let (success, _, _, warnings) = compile("val x: number = \"hi\"");
    assert!(success);
    assert!(warnings.is_empty());
}

#[test]
fn typecheck_without_strict_warns() {
    let options = CompilerOptions {
        typecheck: true,
        ..CompilerOptions::default()
    };
    let (success, _, errors, warnings) = compile_with("val x: number = \"hi\"", options);
    assert!(success, "errors: {:?}", errors);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, Some(codes::TYPE_MISMATCH));
}

// ============================================================================
// Pipeline ordering and aborts
// ============================================================================

#[test]
fn lex_error_aborts_with_one_diagnostic() {
    let (success, _, errors, _) = compile("val s = \"unterminated");
    assert!(!success);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].phase, ntl_diagnostics::Phase::Lex);
}

#[test]
fn parse_error_aborts_before_scope() {
    let (success, _, errors, _) = compile("val = 3\nundeclared_name");
    assert!(!success);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].phase, ntl_diagnostics::Phase::Parse);
}

#[test]
fn scope_errors_accumulate() {
    let (success, _, errors, _) = compile("console.log(a)\nconsole.log(b)");
    assert!(!success);
    assert_eq!(errors.len(), 2);
}

#[test]
fn hoisting_allows_forward_calls() {
    let (success, _, errors, _) = compile("f()\nfn f() {}");
    assert!(success, "errors: {:?}", errors);
}

#[test]
fn val_reassignment_fails_compile() {
    let (success, _, errors, _) = compile("val x = 1\nx = 2");
    assert!(!success);
    assert_eq!(errors[0].code, Some(codes::CONST_REASSIGN));
}

// ============================================================================
// Targets and post-processing
// ============================================================================

#[test]
fn esm_target_rewrites_module_plumbing() {
    let options = CompilerOptions {
        target: ntl_config::Target::Esm,
        ..CompilerOptions::default()
    };
    let source = "import lib from \"./lib\"\nexport val answer = lib";
    let (success, code, errors, _) = compile_with(source, options);
    assert!(success, "errors: {:?}", errors);
    assert!(code.contains("import lib from \"./lib\";"));
    assert!(code.contains("export { answer };"));
    assert!(!code.contains("require("));
    assert!(!code.contains("module.exports"));
}

#[test]
fn minify_strips_structure_but_keeps_code() {
    let options = CompilerOptions {
        minify: true,
        ..CompilerOptions::default()
    };
    let (success, code, _, _) = compile_with("fn f() { return 1 }", options);
    assert!(success);
    assert!(!code.contains("\n\n"));
    assert!(!code.contains("  return"));
    assert!(code.contains("return 1;"));
}

#[test]
fn credits_banner_is_appended() {
    let options = CompilerOptions {
        credits: true,
        ..CompilerOptions::default()
    };
    let (_, code, _, _) = compile_with("val x = 1", options);
    assert!(code.contains("// Compiled by ntlc v"));
}

#[test]
fn stats_are_reported() {
    let arena = Bump::new();
    let compiler = Compiler::new(&arena, CompilerOptions::default());
    let output = compiler.compile_source("main.ntl", "val x = 1\nval y = 2\n");
    assert!(output.success);
    assert_eq!(output.stats.source_lines, 2);
    assert!(output.stats.source_chars >= 19);
    assert!(output.stats.output_chars > 0);
    assert!(output.ast.is_some());
}

// ============================================================================
// Concurrency constructs
// ============================================================================

#[test]
fn spawn_and_channel_compile_together() {
    let source = "val ch = channel()\nspawn ch.send(1)\nasync fn main() { select { case v = ch.receive() => console.log(v) } }";
    let (success, code, errors, _) = compile(source);
    assert!(success, "errors: {:?}", errors);
    assert!(code.contains("function __ntl_channel()"));
    assert!(code.contains("Promise.resolve().then(() => (ch.send(1)));"));
    assert!(code.contains("await Promise.race(["));
}

//! Scope analyzer integration tests.
//!
//! Tests the parse -> analyze pipeline: declaration forms, hoisting,
//! undeclared references with suggestions, and const reassignment.

use bumpalo::Bump;
use ntl_diagnostics::{codes, Diagnostic};
use ntl_scope::analyze;

/// Helper: parse and analyze, returning all scope diagnostics.
fn check(source: &str) -> Vec<Diagnostic> {
    let arena = Bump::new();
    let sf = ntl_parser::parse(&arena, "test.ntl", source).expect("parse failure");
    analyze(sf)
}

fn assert_clean(source: &str) {
    let diags = check(source);
    assert!(
        diags.is_empty(),
        "expected no diagnostics, got: {:?}",
        diags.iter().map(|d| d.message.clone()).collect::<Vec<_>>()
    );
}

// ============================================================================
// Declarations resolve
// ============================================================================

#[test]
fn declared_names_resolve() {
    assert_clean("val x = 1\nconsole.log(x)");
}

#[test]
fn builtins_are_predeclared() {
    assert_clean("console.log(Math.max(1, 2), JSON.stringify({}), process.argv)");
}

#[test]
fn params_and_nested_scopes() {
    assert_clean("fn add(a, b) { val sum = a + b\nreturn sum }");
}

#[test]
fn destructuring_declares_leaves() {
    assert_clean("val { a, b: c, d = 1, ...rest } = obj()\nfn obj() { return {} }\nconsole.log(a, c, d, rest)");
}

#[test]
fn array_pattern_declares_leaves() {
    assert_clean("val [first, , third] = [1, 2, 3]\nconsole.log(first, third)");
}

#[test]
fn ntl_require_declares_modules() {
    assert_clean("require(ntl, http, logger)\nhttp.get\nlogger.info");
}

#[test]
fn import_bindings_declare() {
    assert_clean("import def, { a, b as c }, * as ns from \"./m\"\nconsole.log(def, a, c, ns)");
}

#[test]
fn match_captures_bind_in_arm() {
    assert_clean(
        "val r = 1\nmatch r {\n  case Ok(x) => console.log(x)\n  case { kind, size: s } => console.log(kind, s)\n  case [a, b] => console.log(a, b)\n  default => console.log(r)\n}",
    );
}

#[test]
fn ifset_alias_binds_in_body() {
    assert_clean("val v = 1\nifset v as inner { console.log(inner) }");
}

#[test]
fn select_binding_is_scoped_to_arm() {
    assert_clean(
        "val ch = channel()\nselect { case msg = ch.receive() => console.log(msg) }",
    );
}

#[test]
fn catch_param_binds() {
    assert_clean("try { risky() } catch (e) { console.log(e) }\nfn risky() {}");
}

#[test]
fn class_methods_see_params() {
    assert_clean(
        "class Point { x = 0\n init(x) { this.x = x }\n len(s) { return s } }",
    );
}

// ============================================================================
// Hoisting
// ============================================================================

#[test]
fn functions_hoist_at_block_level() {
    assert_clean("f()\nfn f() {}");
}

#[test]
fn classes_enums_and_macros_hoist() {
    assert_clean("new C()\nval x = E\nm()\nclass C {}\nenum E { A }\nmacro m() {}");
}

#[test]
fn val_does_not_hoist() {
    let diags = check("f()\nval f = 1");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, Some(codes::UNDEF_VAR));
    assert_eq!(diags[0].span.unwrap().line, 1);
}

#[test]
fn exported_functions_hoist() {
    assert_clean("f()\nexport fn f() {}");
}

// ============================================================================
// Undeclared references
// ============================================================================

#[test]
fn undeclared_identifier_reports_at_use_site() {
    let diags = check("fn f() { return username }");
    assert_eq!(diags.len(), 1);
    let d = &diags[0];
    assert_eq!(d.code, Some(codes::UNDEF_VAR));
    assert_eq!(d.span.unwrap().line, 1);
    assert_eq!(d.suggestions.len(), 3);
    assert!(d.similar.is_empty());
}

#[test]
fn fuzzy_suggestion_finds_close_name() {
    let diags = check("val username = \"a\"\nconsole.log(usrname)");
    assert_eq!(diags.len(), 1);
    let d = &diags[0];
    assert_eq!(d.similar.len(), 1);
    assert_eq!(d.similar[0].name, "username");
    assert_eq!(d.similar[0].declared_line, 1);
}

#[test]
fn print_is_special_cased() {
    let diags = check("print(\"Hello\")");
    assert_eq!(diags.len(), 1);
    let d = &diags[0];
    assert_eq!(d.code, Some(codes::UNDEF_FUNC));
    assert_eq!(d.suggestions.len(), 3);
    assert!(d.suggestions.iter().any(|s| s.contains("logger")));
    let example = d.example.as_ref().expect("example pair");
    assert_eq!(example.bad, "print(\"Hello\")");
    assert_eq!(example.good, "console.log(\"Hello\")");
}

#[test]
fn println_is_special_cased_too() {
    let diags = check("println(1)");
    assert_eq!(diags[0].code, Some(codes::UNDEF_FUNC));
}

#[test]
fn print_as_plain_reference_is_undef_var() {
    let diags = check("val p = print");
    assert_eq!(diags[0].code, Some(codes::UNDEF_VAR));
}

#[test]
fn every_undeclared_name_is_reported() {
    let diags = check("console.log(a)\nconsole.log(b)\nconsole.log(c)");
    assert_eq!(diags.len(), 3);
}

#[test]
fn block_scoping_ends_at_the_brace() {
    let diags = check("{ val inner = 1 }\nconsole.log(inner)");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, Some(codes::UNDEF_VAR));
}

#[test]
fn shorthand_property_is_a_reference() {
    let diags = check("val o = { missing }");
    assert_eq!(diags.len(), 1);
}

#[test]
fn template_expressions_are_resolved() {
    let diags = check("val s = `value: ${missing}`");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, Some(codes::UNDEF_VAR));
}

#[test]
fn decorator_names_are_references() {
    let diags = check("@nope\nfn f() {}");
    assert_eq!(diags.len(), 1);
}

// ============================================================================
// Reassignment and parameters
// ============================================================================

#[test]
fn val_reassignment_is_an_error() {
    let diags = check("val x = 1\nx = 2");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, Some(codes::CONST_REASSIGN));
}

#[test]
fn var_reassignment_is_fine() {
    assert_clean("var x = 1\nx = 2");
}

#[test]
fn compound_assignment_to_val_is_an_error() {
    let diags = check("val total = 0\ntotal += 1");
    assert_eq!(diags[0].code, Some(codes::CONST_REASSIGN));
}

#[test]
fn duplicate_parameter_is_an_error() {
    let diags = check("fn f(a, a) {}");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, Some(codes::DUP_PARAM));
}

#[test]
fn shadowing_in_inner_scope_is_fine() {
    assert_clean("val x = 1\nfn f(x) { return x }");
}

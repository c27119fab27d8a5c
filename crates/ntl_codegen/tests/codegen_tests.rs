//! Code generator integration tests.
//!
//! Each test compiles a snippet through parse -> generate and checks the
//! emitted JavaScript shape.

use bumpalo::Bump;
use ntl_codegen::{generate, EmitOptions};

/// Helper: parse and emit with default options.
fn emit(source: &str) -> String {
    let arena = Bump::new();
    let sf = ntl_parser::parse(&arena, "test.ntl", source).expect("parse failure");
    generate(sf, &EmitOptions::default()).expect("emit failure")
}

fn emit_err(source: &str) -> ntl_diagnostics::Diagnostic {
    let arena = Bump::new();
    let sf = ntl_parser::parse(&arena, "test.ntl", source).expect("parse failure");
    generate(sf, &EmitOptions::default()).expect_err("expected emit failure")
}

#[test]
fn val_lowers_to_const_and_var_to_let() {
    let js = emit("val a = 1\nvar b = 2\nlet c = 3\nconst d = 4");
    assert!(js.contains("const a = 1;"));
    assert!(js.contains("let b = 2;"));
    assert!(js.contains("let c = 3;"));
    assert!(js.contains("const d = 4;"));
}

#[test]
fn output_is_strict_mode() {
    let js = emit("val a = 1");
    assert!(js.starts_with("\"use strict\";"));
}

#[test]
fn hello_program_shape() {
    let js = emit(
        "val name: string = \"World\"\nfn greet(n: string) -> string { return `Hello, ${n}!` }\nconsole.log(greet(name))",
    );
    assert_eq!(js.matches("const name = \"World\";").count(), 1);
    assert_eq!(js.matches("function greet(n)").count(), 1);
    assert_eq!(js.matches("console.log(greet(name));").count(), 1);
    assert!(!js.contains("string"));
}

#[test]
fn immutable_emits_freeze() {
    let js = emit("immutable val c = { a: 1 }");
    assert!(js.contains("const c = { a: 1 };"));
    assert!(js.contains("Object.freeze(c);"));
}

#[test]
fn class_init_becomes_constructor() {
    let js = emit("class P { x = 0\n init(x) { this.x = x }\n move(d) { this.x += d } }");
    assert!(js.contains("class P {"));
    assert!(js.contains("constructor(x) {"));
    assert!(js.contains("move(d) {"));
}

#[test]
fn super_init_becomes_super_call() {
    let js = emit("class C extends B { init(x) { super.init(x) } }");
    assert!(js.contains("super(x);"));
    assert!(!js.contains("super.init"));
}

#[test]
fn match_lowers_to_tag_cascade() {
    let js = emit(
        "type Result = Ok(v) | Err(e)\nval r: Result = { _tag: \"Ok\", _0: 42 }\nmatch r { case Ok(x) => console.log(x) case Err(m) => console.log(m) }",
    );
    assert!(js.contains("const __match_1 = r;"));
    assert!(js.contains("__match_1._tag === \"Ok\""));
    assert!(js.contains("__match_1._tag === \"Err\""));
    assert!(js.contains("const x = __match_1._0;"));
    assert!(js.contains("const m = __match_1._0;"));
    assert!(js.contains("} else if ("));
}

#[test]
fn match_default_is_plain_else() {
    let js = emit("match v { case 1 => a()\n default => b() }\nval v = 1\nfn a() {}\nfn b() {}");
    assert!(js.contains("if (__match_1 === 1)"));
    assert!(js.contains("} else {"));
}

#[test]
fn match_guard_sees_bindings() {
    let js = emit("match v { case Ok(x) when x > 0 => use(x) }\nval v = 1\nfn use(x) {}");
    assert!(js.contains("(() => { const x = __match_1._0; return (x > 0); })()"));
}

#[test]
fn match_array_and_object_patterns() {
    let js = emit("match v { case [a, _] => f(a) case { kind } => f(kind) }\nval v = 1\nfn f(x) {}");
    assert!(js.contains("Array.isArray(__match_1) && __match_1.length >= 2"));
    assert!(js.contains("typeof __match_1 === \"object\""));
    // Absent fields still bind, as undefined.
    assert!(js.contains("const kind = __match_1.kind;"));
}

#[test]
fn ifset_with_alias_binds_once() {
    let js = emit("ifset load() as cfg { use(cfg) } else { bail() }\nfn load() {}\nfn use(c) {}\nfn bail() {}");
    assert!(js.contains("const cfg = load();"));
    assert!(js.contains("if (cfg !== null && cfg !== undefined)"));
    assert!(js.contains("else {"));
}

#[test]
fn ifset_without_alias_tests_the_expression() {
    let js = emit("ifset cfg { use(cfg) }\nval cfg = 1\nfn use(c) {}");
    assert!(js.contains("if ((cfg) !== null && (cfg) !== undefined)"));
}

#[test]
fn unless_negates() {
    let js = emit("unless ready { wait() }\nval ready = true\nfn wait() {}");
    assert!(js.contains("if (!(ready))"));
}

#[test]
fn loop_is_while_true() {
    let js = emit("loop { tick() }\nfn tick() {}");
    assert!(js.contains("while (true)"));
}

#[test]
fn spawn_is_fire_and_forget_promise() {
    let js = emit("spawn work()\nfn work() {}");
    assert!(js.contains("Promise.resolve().then(() => (work()));"));
}

#[test]
fn channel_emits_runtime_once() {
    let js = emit("val a = channel()\nval b = channel()");
    assert_eq!(js.matches("function __ntl_channel()").count(), 1);
    assert_eq!(js.matches("__ntl_channel()").count(), 3);
    assert!(js.contains("_listeners.shift()(value)"));
}

#[test]
fn no_channel_no_runtime() {
    let js = emit("val a = 1");
    assert!(!js.contains("__ntl_channel"));
}

#[test]
fn select_races_tagged_cases() {
    let js = emit(
        "val ch = channel()\nval other = channel()\nasync fn go() { select { case v = ch.receive() => use(v) case w = other.receive() => use(w) } }\nfn use(x) {}",
    );
    assert!(js.contains("await Promise.race(["));
    assert!(js.contains("{ index: 0, value }"));
    assert!(js.contains("{ index: 1, value }"));
    assert!(js.contains("if (__select_1.index === 0) {"));
    assert!(js.contains("const v = __select_1.value;"));
}

#[test]
fn decorators_apply_in_reverse_order() {
    let js = emit("@memo(64)\n@trace\nfn slow(n) { return n }\nfn memo(f, n) {}\nfn trace(f) {}");
    let memo_at = js.find("slow = memo(slow, 64);").expect("memo application");
    let trace_at = js.find("slow = trace(slow);").expect("trace application");
    assert!(trace_at < memo_at, "reverse order: innermost decorator first");
}

#[test]
fn enum_lowering_with_auto_numbering() {
    let js = emit("enum Color { Red, Green = 10, Blue, Name = \"n\" }");
    assert!(js.contains("const Color = Object.freeze({"));
    assert!(js.contains("Red: 0,"));
    assert!(js.contains("Green: 10,"));
    assert!(js.contains("Blue: 11,"));
    assert!(js.contains("Name: \"n\","));
}

#[test]
fn interface_trait_alias_declare_are_elided() {
    let js = emit(
        "interface I { a: number }\ntrait T { fn m() { } }\ntype A = number\ndeclare val env: string\nval x = 1",
    );
    let body: Vec<&str> = js.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(body, vec!["\"use strict\";", "const x = 1;"]);
}

#[test]
fn pipeline_is_reverse_application() {
    let js = emit("val r = [1,2,3] |> (xs => xs.map(x => x*2)) |> (xs => xs.join(\",\"))");
    assert!(js.contains("const r = (xs => xs.join(\",\"))((xs => xs.map(x => x * 2))([1, 2, 3]));"));
}

#[test]
fn optional_chain_forms_survive() {
    let js = emit("val a = o?.b\nval c = o?.(1)\nval d = o?.[0]\nval o = null");
    assert!(js.contains("o?.b"));
    assert!(js.contains("o?.(1)"));
    assert!(js.contains("o?.[0]"));
}

#[test]
fn bigint_literal_keeps_suffix() {
    let js = emit("val big = 123n\nval hex = 0xFFn");
    assert!(js.contains("const big = 123n;"));
    assert!(js.contains("const hex = 0xFFn;"));
}

#[test]
fn template_literal_round_trips() {
    let js = emit("val s = `a ${x + 1} b`\nval x = 1");
    assert!(js.contains("`a ${x + 1} b`"));
}

#[test]
fn interpolated_string_becomes_template() {
    let js = emit("val s = \"Hello, {name}!\"\nval name = \"x\"");
    assert!(js.contains("`Hello, ${name}!`"));
}

#[test]
fn precedence_parentheses_only_where_needed() {
    let js = emit("val a = (1 + 2) * 3\nval b = 1 + 2 * 3\nval c = 1 - (2 - 3)");
    assert!(js.contains("const a = (1 + 2) * 3;"));
    assert!(js.contains("const b = 1 + 2 * 3;"));
    assert!(js.contains("const c = 1 - (2 - 3);"));
}

#[test]
fn nullish_mixed_with_logical_is_parenthesized() {
    let js = emit("val x = a ?? (b || c)\nval a = 1\nval b = 2\nval c = 3");
    assert!(js.contains("a ?? (b || c)"));
}

#[test]
fn ntl_require_resolves_known_modules() {
    let js = emit("require(ntl, http, logger)");
    assert!(js.contains("const http = require("));
    assert!(js.contains("http.js"));
    assert!(js.contains("const logger = require("));
}

#[test]
fn unknown_ntl_module_is_a_resolve_error() {
    let err = emit_err("require(ntl, nosuch)");
    assert_eq!(err.phase, ntl_diagnostics::Phase::Resolve);
    assert_eq!(err.code, Some(ntl_diagnostics::codes::UNKNOWN_MODULE));
}

#[test]
fn imports_lower_to_require() {
    let js = emit("import def, { a, b as c } from \"./lib\"");
    assert!(js.contains("const def = require(\"./lib\");"));
    assert!(js.contains("const { a, b: c } = require(\"./lib\");"));
}

#[test]
fn exports_register_on_module_exports() {
    let js = emit("export val answer = 42\nexport default answer");
    assert!(js.contains("const answer = 42;"));
    assert!(js.contains("module.exports.answer = answer;"));
    assert!(js.contains("module.exports = answer;"));
}

#[test]
fn method_bind_operator() {
    let js = emit("val log = console::log");
    assert!(js.contains("console.log.bind(console)"));
}

#[test]
fn have_checks_both_nullish_values() {
    let js = emit("val ok = have user\nval user = 1");
    assert!(js.contains("((user) !== null && (user) !== undefined)"));
}

#[test]
fn namespace_returns_declared_names() {
    let js = emit("namespace util { fn id(x) { return x }\nval zero = 0 }");
    assert!(js.contains("const util = (function () {"));
    assert!(js.contains("return { id, zero };"));
    assert!(js.contains("})();"));
}

#[test]
fn casts_are_erased() {
    let js = emit("val a = x as number\nval b = x satisfies Shape\nval x = 1");
    assert!(js.contains("const a = x;"));
    assert!(js.contains("const b = x;"));
}

#[test]
fn idempotent_over_reformatting() {
    // Reformatting the source (extra whitespace, semicolons) must not
    // change the output.
    let a = emit("val x=1\nfn f(a,b){return a+b}\nconsole.log(f(x,2))");
    let b = emit("val x = 1 ;\nfn f( a , b ) { return a + b ; }\nconsole.log( f( x, 2 ) ) ;");
    assert_eq!(a, b);
}

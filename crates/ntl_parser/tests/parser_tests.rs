//! Parser integration tests.
//!
//! Each test parses a snippet and inspects the resulting AST shape.

use bumpalo::Bump;
use ntl_ast::*;
use ntl_parser::parse;

/// Helper: parse source and run assertions against the statements.
fn with_ast(source: &str, f: impl FnOnce(&[Statement<'_>])) {
    let arena = Bump::new();
    let sf = parse(&arena, "test.ntl", source).expect("parse failure");
    f(sf.statements);
}

fn parse_err(source: &str) -> ntl_diagnostics::Diagnostic {
    let arena = Bump::new();
    parse(&arena, "test.ntl", source).expect_err("expected parse failure")
}

#[test]
fn val_with_annotation_and_init() {
    with_ast("val name: string = \"World\"", |stmts| {
        assert_eq!(stmts.len(), 1);
        let Statement::Var(decl) = &stmts[0] else {
            panic!("expected var decl");
        };
        assert!(decl.constant);
        assert!(!decl.immutable);
        assert_eq!(decl.ty.as_ref().unwrap().text, "string");
        let BindingTarget::Name(name) = &decl.target else {
            panic!("expected plain name");
        };
        assert_eq!(name.name, "name");
        assert!(matches!(decl.init, Some(Expression::String(_))));
    });
}

#[test]
fn multi_var_declaration() {
    with_ast("var a = 1, b = 2", |stmts| {
        let Statement::MultiVar(multi) = &stmts[0] else {
            panic!("expected multi var");
        };
        assert_eq!(multi.decls.len(), 2);
        assert!(!multi.decls[0].constant);
    });
}

#[test]
fn immutable_val() {
    with_ast("immutable val c = { a: 1 }", |stmts| {
        let Statement::Var(decl) = &stmts[0] else {
            panic!("expected var decl");
        };
        assert!(decl.immutable);
        assert!(decl.constant);
    });
}

#[test]
fn fn_decl_with_return_type() {
    with_ast("fn greet(n: string) -> string { return `Hello, ${n}!` }", |stmts| {
        let Statement::Fn(decl) = &stmts[0] else {
            panic!("expected fn decl");
        };
        assert_eq!(decl.name.name, "greet");
        assert_eq!(decl.params.len(), 1);
        assert_eq!(decl.params[0].ty.as_ref().unwrap().text, "string");
        assert_eq!(decl.return_ty.as_ref().unwrap().text, "string");
        assert!(!decl.is_async);
    });
}

#[test]
fn fn_decl_accepts_fat_arrow_return_type() {
    with_ast("fn f() => number { return 1 }", |stmts| {
        let Statement::Fn(decl) = &stmts[0] else {
            panic!("expected fn decl");
        };
        assert_eq!(decl.return_ty.as_ref().unwrap().text, "number");
    });
}

#[test]
fn precedence_mul_binds_tighter_than_add() {
    with_ast("val x = 1 + 2 * 3", |stmts| {
        let Statement::Var(decl) = &stmts[0] else { panic!() };
        let Some(Expression::Binary(add)) = decl.init else {
            panic!("expected binary init");
        };
        assert_eq!(add.op, BinaryOp::Add);
        let Expression::Binary(mul) = add.right else {
            panic!("expected mul on the right");
        };
        assert_eq!(mul.op, BinaryOp::Mul);
    });
}

#[test]
fn pow_is_right_associative() {
    with_ast("val x = 2 ** 3 ** 2", |stmts| {
        let Statement::Var(decl) = &stmts[0] else { panic!() };
        let Some(Expression::Binary(outer)) = decl.init else { panic!() };
        assert_eq!(outer.op, BinaryOp::Pow);
        assert!(matches!(outer.left, Expression::Number(_)));
        assert!(matches!(outer.right, Expression::Binary(_)));
    });
}

#[test]
fn pipeline_is_left_associative() {
    with_ast("val r = a |> f |> g", |stmts| {
        let Statement::Var(decl) = &stmts[0] else { panic!() };
        let Some(Expression::Binary(outer)) = decl.init else { panic!() };
        assert_eq!(outer.op, BinaryOp::Pipeline);
        let Expression::Binary(inner) = outer.left else {
            panic!("expected nested pipeline on the left");
        };
        assert_eq!(inner.op, BinaryOp::Pipeline);
    });
}

#[test]
fn optional_chain_forms() {
    with_ast("a?.b; a?.(1); a?.[0]", |stmts| {
        let Statement::Expr(first) = &stmts[0] else { panic!() };
        let Expression::Member(m) = first.expr else { panic!() };
        assert!(m.optional);
        let Statement::Expr(second) = &stmts[1] else { panic!() };
        let Expression::Call(c) = second.expr else { panic!() };
        assert!(c.optional);
        let Statement::Expr(third) = &stmts[2] else { panic!() };
        let Expression::Member(i) = third.expr else { panic!() };
        assert!(i.optional);
        assert!(matches!(i.property, MemberProp::Computed(_)));
    });
}

#[test]
fn arrow_disambiguation() {
    with_ast("val f = (a, b) => a + b; val g = (a + b) * 2", |stmts| {
        let Statement::Var(f) = &stmts[0] else { panic!() };
        assert!(matches!(f.init, Some(Expression::Arrow(_))));
        let Statement::Var(g) = &stmts[1] else { panic!() };
        assert!(matches!(g.init, Some(Expression::Binary(_))));
    });
}

#[test]
fn single_param_arrow() {
    with_ast("val double = x => x * 2", |stmts| {
        let Statement::Var(decl) = &stmts[0] else { panic!() };
        let Some(Expression::Arrow(arrow)) = decl.init else { panic!() };
        assert_eq!(arrow.params.len(), 1);
        assert!(matches!(arrow.body, ArrowBody::Expr(_)));
    });
}

#[test]
fn parenthesized_sequence() {
    with_ast("val x = (a, b, c)", |stmts| {
        let Statement::Var(decl) = &stmts[0] else { panic!() };
        let Some(Expression::Sequence(seq)) = decl.init else { panic!() };
        assert_eq!(seq.exprs.len(), 3);
    });
}

#[test]
fn object_destructuring_with_alias_and_default() {
    with_ast("val { a, b: c, d = 1, ...rest } = obj", |stmts| {
        let Statement::Var(decl) = &stmts[0] else { panic!() };
        let BindingTarget::Pattern(BindingPattern::Object(pattern)) = &decl.target else {
            panic!("expected object pattern");
        };
        assert_eq!(pattern.props.len(), 3);
        assert_eq!(pattern.props[1].alias.as_ref().unwrap().name, "c");
        assert!(pattern.props[2].default.is_some());
        assert_eq!(pattern.rest.as_ref().unwrap().name, "rest");
    });
}

#[test]
fn array_destructuring_with_hole() {
    with_ast("val [a, , b] = xs", |stmts| {
        let Statement::Var(decl) = &stmts[0] else { panic!() };
        let BindingTarget::Pattern(BindingPattern::Array(pattern)) = &decl.target else {
            panic!("expected array pattern");
        };
        assert_eq!(pattern.items.len(), 3);
        assert!(pattern.items[0].is_some());
        assert!(pattern.items[1].is_none());
        assert!(pattern.items[2].is_some());
    });
}

#[test]
fn algebraic_type_alias() {
    with_ast("type Result = Ok(v) | Err(e)", |stmts| {
        let Statement::TypeAlias(alias) = &stmts[0] else { panic!() };
        assert_eq!(alias.name.name, "Result");
        let TypeAliasTarget::Algebraic(variants) = &alias.target else {
            panic!("expected algebraic alias");
        };
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].name.name, "Ok");
        assert_eq!(variants[0].fields, vec!["v".to_string()]);
        assert_eq!(variants[1].name.name, "Err");
    });
}

#[test]
fn plain_type_alias() {
    with_ast("type Pair = [number, string]", |stmts| {
        let Statement::TypeAlias(alias) = &stmts[0] else { panic!() };
        let TypeAliasTarget::Plain(ty) = &alias.target else { panic!() };
        assert_eq!(ty.text, "[number, string]");
    });
}

#[test]
fn union_and_array_type_annotations() {
    with_ast("val x: number | string = 1; val y: Map<string, Array<number>> = m", |stmts| {
        let Statement::Var(x) = &stmts[0] else { panic!() };
        assert_eq!(x.ty.as_ref().unwrap().text, "number | string");
        let Statement::Var(y) = &stmts[1] else { panic!() };
        assert_eq!(y.ty.as_ref().unwrap().text, "Map<string, Array<number>>");
    });
}

#[test]
fn match_with_variants_guards_and_default() {
    let source = r#"
        match r {
            case Ok(x) when x > 0 => console.log(x)
            case Err(m) | Fail(m) => console.log(m)
            default => console.log("other")
        }
    "#;
    with_ast(source, |stmts| {
        let Statement::Match(m) = &stmts[0] else { panic!() };
        assert_eq!(m.cases.len(), 3);
        assert!(m.cases[0].guard.is_some());
        assert!(matches!(
            m.cases[0].patterns[0],
            MatchPattern::Variant { .. }
        ));
        assert_eq!(m.cases[1].patterns.len(), 2);
        assert!(matches!(m.cases[2].patterns[0], MatchPattern::Wildcard));
        // Expression bodies were normalized to one-statement blocks.
        assert_eq!(m.cases[0].body.statements.len(), 1);
    });
}

#[test]
fn match_literal_and_enum_patterns() {
    let source = r#"
        match v {
            case 1 | 2 => a()
            case "x" => b()
            case Color.Red => c()
            case [first, _] => d()
            case { kind, size: s } => e()
        }
    "#;
    with_ast(source, |stmts| {
        let Statement::Match(m) = &stmts[0] else { panic!() };
        assert!(matches!(m.cases[0].patterns[0], MatchPattern::Literal(_)));
        assert!(matches!(m.cases[1].patterns[0], MatchPattern::Literal(_)));
        assert!(
            matches!(&m.cases[2].patterns[0], MatchPattern::EnumVal(path) if path == "Color.Red")
        );
        let MatchPattern::Array(items) = &m.cases[3].patterns[0] else {
            panic!()
        };
        assert!(matches!(items[1], MatchPattern::Wildcard));
        let MatchPattern::Object(props) = &m.cases[4].patterns[0] else {
            panic!()
        };
        assert_eq!(props.len(), 2);
        assert!(props[0].1.is_none());
        assert!(props[1].1.is_some());
    });
}

#[test]
fn ifset_with_alias() {
    with_ast("ifset user.name as n { console.log(n) } else { console.log(\"anon\") }", |stmts| {
        let Statement::IfSet(stmt) = &stmts[0] else { panic!() };
        assert_eq!(stmt.alias.as_ref().unwrap().name, "n");
        assert!(stmt.alternate.is_some());
    });
}

#[test]
fn ifset_without_alias_keeps_subject() {
    with_ast("ifset config { use(config) }", |stmts| {
        let Statement::IfSet(stmt) = &stmts[0] else { panic!() };
        assert!(stmt.alias.is_none());
        assert!(matches!(stmt.subject, Expression::Ident(_)));
    });
}

#[test]
fn decorated_function() {
    with_ast("@memo(64)\n@trace\nfn slow(n) { return n }", |stmts| {
        let Statement::Fn(decl) = &stmts[0] else { panic!() };
        assert_eq!(decl.decorators.len(), 2);
        assert_eq!(decl.decorators[0].name, "memo");
        assert!(decl.decorators[0].args.is_some());
        assert_eq!(decl.decorators[1].name, "trace");
        assert!(decl.decorators[1].args.is_none());
    });
}

#[test]
fn spawn_select_channel() {
    let source = r#"
        val ch = channel()
        spawn worker(ch)
        select {
            case v = ch.receive() => console.log(v)
        }
    "#;
    with_ast(source, |stmts| {
        let Statement::Var(decl) = &stmts[0] else { panic!() };
        assert!(matches!(decl.init, Some(Expression::Channel(_))));
        assert!(matches!(stmts[1], Statement::Spawn(_)));
        let Statement::Select(select) = &stmts[2] else { panic!() };
        assert_eq!(select.arms.len(), 1);
        assert_eq!(select.arms[0].binding.name, "v");
    });
}

#[test]
fn ntl_require_statement() {
    with_ast("require(ntl, http, fs)", |stmts| {
        let Statement::NtlRequire(req) = &stmts[0] else { panic!() };
        let names: Vec<_> = req.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["http", "fs"]);
    });
}

#[test]
fn import_and_export_forms() {
    let source = r#"
        import def, { a, b as c } from "./lib"
        export val answer = 42
        export { answer as result }
        export default answer
    "#;
    with_ast(source, |stmts| {
        let Statement::Import(import) = &stmts[0] else { panic!() };
        assert_eq!(import.default.as_ref().unwrap().name, "def");
        assert_eq!(import.named.len(), 2);
        assert_eq!(import.named[1].alias.as_ref().unwrap().name, "c");
        assert_eq!(import.source, "./lib");
        let Statement::Export(export) = &stmts[1] else { panic!() };
        assert!(export.decl.is_some());
        let Statement::Export(names) = &stmts[2] else { panic!() };
        assert_eq!(names.names.len(), 1);
        let Statement::Export(default) = &stmts[3] else { panic!() };
        assert!(default.default.is_some());
    });
}

#[test]
fn class_with_init_fields_and_accessors() {
    let source = r#"
        class Point extends Base {
            x: number = 0
            private y = 0
            init(x, y) { this.x = x }
            static origin() { return new Point(0, 0) }
            get size() { return 2 }
        }
    "#;
    with_ast(source, |stmts| {
        let Statement::Class(class) = &stmts[0] else { panic!() };
        assert_eq!(class.superclass.as_deref(), Some("Base"));
        assert_eq!(class.members.len(), 5);
        assert_eq!(class.members[0].kind, MemberKind::Field);
        assert_eq!(class.members[1].visibility, Visibility::Private);
        assert_eq!(class.members[2].name.name, "init");
        assert!(class.members[3].is_static);
        assert_eq!(class.members[4].kind, MemberKind::Getter);
    });
}

#[test]
fn enum_with_mixed_values() {
    with_ast("enum Color { Red, Green = 10, Blue = \"b\" }", |stmts| {
        let Statement::Enum(decl) = &stmts[0] else { panic!() };
        assert_eq!(decl.members.len(), 3);
        assert!(decl.members[0].value.is_none());
        assert!(decl.members[1].value.is_some());
    });
}

#[test]
fn template_parts_are_reparsed() {
    with_ast("val s = `a ${x + 1} b`", |stmts| {
        let Statement::Var(decl) = &stmts[0] else { panic!() };
        let Some(Expression::Template(tpl)) = decl.init else { panic!() };
        assert_eq!(tpl.parts.len(), 3);
        assert!(matches!(tpl.parts[0], TemplateElem::Text(_)));
        let TemplateElem::Expr(Expression::Binary(b)) = &tpl.parts[1] else {
            panic!("expected parsed binary in template");
        };
        assert_eq!(b.op, BinaryOp::Add);
    });
}

#[test]
fn interpolated_double_quoted_string() {
    with_ast("val s = \"Hello, {name}!\"", |stmts| {
        let Statement::Var(decl) = &stmts[0] else { panic!() };
        let Some(Expression::Template(tpl)) = decl.init else { panic!() };
        assert_eq!(tpl.parts.len(), 3);
        assert!(matches!(tpl.parts[1], TemplateElem::Expr(_)));
    });
}

#[test]
fn cast_and_satisfies() {
    with_ast("val a = x as number; val b = y satisfies Shape", |stmts| {
        let Statement::Var(a) = &stmts[0] else { panic!() };
        let Some(Expression::Cast(cast)) = a.init else { panic!() };
        assert_eq!(cast.op, CastOp::As);
        assert_eq!(cast.ty.text, "number");
        let Statement::Var(b) = &stmts[1] else { panic!() };
        let Some(Expression::Cast(sat)) = b.init else { panic!() };
        assert_eq!(sat.op, CastOp::Satisfies);
    });
}

#[test]
fn method_binding_operator() {
    with_ast("val log = console::log", |stmts| {
        let Statement::Var(decl) = &stmts[0] else { panic!() };
        let Some(Expression::Bind(bind)) = decl.init else { panic!() };
        assert_eq!(bind.method.name, "log");
    });
}

#[test]
fn unless_and_loop_and_do_while() {
    let source = "unless ok { fail() } else { pass() }\nloop { tick() }\ndo { once() } while cond";
    with_ast(source, |stmts| {
        assert!(matches!(stmts[0], Statement::Unless(_)));
        assert!(matches!(stmts[1], Statement::Loop(_)));
        assert!(matches!(stmts[2], Statement::DoWhile(_)));
    });
}

#[test]
fn elif_chain_links_through_nested_if() {
    with_ast("if a { f() } elif b { g() } else { h() }", |stmts| {
        let Statement::If(stmt) = &stmts[0] else { panic!() };
        let Some(Statement::If(elif)) = stmt.alternate else {
            panic!("expected elif chain");
        };
        assert!(matches!(elif.alternate, Some(Statement::Block(_))));
    });
}

#[test]
fn return_heuristic_stops_at_line_end() {
    with_ast("fn f() {\n  return\n  g()\n}", |stmts| {
        let Statement::Fn(decl) = &stmts[0] else { panic!() };
        let Statement::Return(ret) = &decl.body.statements[0] else {
            panic!("expected return first");
        };
        assert!(ret.value.is_none());
        assert_eq!(decl.body.statements.len(), 2);
    });
}

#[test]
fn unexpected_token_aborts_with_location() {
    let err = parse_err("val x = ;");
    assert_eq!(err.phase, ntl_diagnostics::Phase::Parse);
    let span = err.span.unwrap();
    assert_eq!(span.line, 1);
    assert_eq!(span.column, 9);
}

#[test]
fn every_statement_has_a_position() {
    let source = "val a = 1\nfn f() { return a }\nclass C {}\nenum E { X }";
    with_ast(source, |stmts| {
        for (i, stmt) in stmts.iter().enumerate() {
            assert_eq!(stmt.span().line as usize, i + 1);
        }
    });
}

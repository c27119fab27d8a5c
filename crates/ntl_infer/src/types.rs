//! The type representation.
//!
//! A closed set of tags over primitives, literals, arrays, tuples, objects,
//! functions, classes, unions and generics. Unions are flattened and
//! deduplicated by printed form; a singleton union collapses to its element.

use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Any,
    Never,
    Unknown,
    Void,
    Null,
    Undefined,
    /// `number`, `string`, `boolean`, `bigint`, `symbol`, `object`.
    Primitive(&'static str),
    Literal(Literal),
    Array(Box<Type>),
    Tuple(Vec<Type>),
    Object(IndexMap<String, Type>),
    Function {
        params: Vec<(String, Type)>,
        ret: Box<Type>,
    },
    Class {
        name: String,
        fields: IndexMap<String, Type>,
        methods: IndexMap<String, Type>,
    },
    Union(Vec<Type>),
    Generic {
        name: String,
        args: Vec<Type>,
    },
}

impl Type {
    pub fn number() -> Type {
        Type::Primitive("number")
    }

    pub fn string() -> Type {
        Type::Primitive("string")
    }

    pub fn boolean() -> Type {
        Type::Primitive("boolean")
    }

    pub fn bigint() -> Type {
        Type::Primitive("bigint")
    }

    /// Derived printed form, used for display and union deduplication.
    pub fn print(&self) -> String {
        match self {
            Type::Any => "any".to_string(),
            Type::Never => "never".to_string(),
            Type::Unknown => "unknown".to_string(),
            Type::Void => "void".to_string(),
            Type::Null => "null".to_string(),
            Type::Undefined => "undefined".to_string(),
            Type::Primitive(name) => (*name).to_string(),
            Type::Literal(Literal::Number(n)) => print_number(*n),
            Type::Literal(Literal::String(s)) => format!("\"{}\"", s),
            Type::Literal(Literal::Bool(b)) => b.to_string(),
            Type::Array(elem) => match **elem {
                Type::Union(_) => format!("({})[]", elem.print()),
                _ => format!("{}[]", elem.print()),
            },
            Type::Tuple(elems) => {
                let inner: Vec<String> = elems.iter().map(Type::print).collect();
                format!("[{}]", inner.join(", "))
            }
            Type::Object(fields) => {
                if fields.is_empty() {
                    return "{}".to_string();
                }
                let inner: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.print()))
                    .collect();
                format!("{{ {} }}", inner.join("; "))
            }
            Type::Function { params, ret } => {
                let inner: Vec<String> = params
                    .iter()
                    .map(|(name, ty)| {
                        if name.is_empty() {
                            ty.print()
                        } else {
                            format!("{}: {}", name, ty.print())
                        }
                    })
                    .collect();
                format!("({}) -> {}", inner.join(", "), ret.print())
            }
            Type::Class { name, .. } => name.clone(),
            Type::Union(types) => {
                let inner: Vec<String> = types.iter().map(Type::print).collect();
                inner.join(" | ")
            }
            Type::Generic { name, args } => {
                if args.is_empty() {
                    name.clone()
                } else {
                    let inner: Vec<String> = args.iter().map(Type::print).collect();
                    format!("{}<{}>", name, inner.join(", "))
                }
            }
        }
    }

    /// Build a union: flatten nested unions, dedupe by printed form,
    /// collapse singletons. An `any` member swallows the union.
    pub fn union(types: Vec<Type>) -> Type {
        let mut flat = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut queue: std::collections::VecDeque<Type> = types.into();
        while let Some(ty) = queue.pop_front() {
            match ty {
                Type::Union(members) => {
                    for member in members {
                        queue.push_front(member);
                    }
                }
                other => {
                    if matches!(other, Type::Any) {
                        return Type::Any;
                    }
                    if seen.insert(other.print()) {
                        flat.push(other);
                    }
                }
            }
        }
        match flat.len() {
            0 => Type::Any,
            1 => flat.pop().unwrap(),
            _ => Type::Union(flat),
        }
    }

    /// The union of `self` with null and undefined filtered out; the type of
    /// the left side of `??` when it does produce a value.
    pub fn non_nullish(&self) -> Type {
        match self {
            Type::Null | Type::Undefined => Type::Never,
            Type::Union(members) => {
                let kept: Vec<Type> = members
                    .iter()
                    .filter(|m| !matches!(m, Type::Null | Type::Undefined))
                    .cloned()
                    .collect();
                if kept.is_empty() {
                    Type::Never
                } else {
                    Type::union(kept)
                }
            }
            other => other.clone(),
        }
    }

    /// Whether a value of `source` may be used where `target` is expected.
    pub fn assignable(target: &Type, source: &Type) -> bool {
        // `any` is bidirectionally compatible; `never` is a bottom.
        if matches!(target, Type::Any) || matches!(source, Type::Any) {
            return true;
        }
        if matches!(source, Type::Never) {
            return true;
        }
        if matches!(target, Type::Unknown) {
            return true;
        }
        if target.print() == source.print() {
            return true;
        }
        match (target, source) {
            (Type::Union(targets), Type::Union(sources)) => sources
                .iter()
                .all(|s| targets.iter().any(|t| Type::assignable(t, s))),
            (Type::Union(targets), source) => {
                targets.iter().any(|t| Type::assignable(t, source))
            }
            (target, Type::Union(sources)) => {
                sources.iter().all(|s| Type::assignable(target, s))
            }
            (Type::Primitive(name), Type::Literal(lit)) => {
                matches!(
                    (lit, *name),
                    (Literal::Number(_), "number")
                        | (Literal::String(_), "string")
                        | (Literal::Bool(_), "boolean")
                )
            }
            (Type::Array(t), Type::Array(s)) => Type::assignable(t, s),
            (Type::Array(t), Type::Tuple(elems)) => {
                elems.iter().all(|e| Type::assignable(t, e))
            }
            (Type::Tuple(targets), Type::Tuple(sources)) => {
                targets.len() == sources.len()
                    && targets
                        .iter()
                        .zip(sources)
                        .all(|(t, s)| Type::assignable(t, s))
            }
            (Type::Object(targets), Type::Object(sources)) => targets.iter().all(|(key, t)| {
                sources
                    .get(key)
                    .is_some_and(|s| Type::assignable(t, s))
            }),
            (Type::Object(targets), Type::Class { fields, methods, .. }) => {
                targets.iter().all(|(key, t)| {
                    fields
                        .get(key)
                        .or_else(|| methods.get(key))
                        .is_some_and(|s| Type::assignable(t, s))
                })
            }
            (
                Type::Function { params: tp, ret: tr },
                Type::Function { params: sp, ret: sr },
            ) => sp.len() <= tp.len() && Type::assignable(tr, sr),
            (Type::Class { name: t, .. }, Type::Class { name: s, .. }) => t == s,
            (Type::Generic { name: t, args: ta }, Type::Generic { name: s, args: sa }) => {
                t == s
                    && ta.len() == sa.len()
                    && ta.iter().zip(sa).all(|(a, b)| Type::assignable(a, b))
            }
            _ => false,
        }
    }

    /// Normalize an annotation's printed text into a structured type.
    pub fn parse(text: &str) -> Type {
        parse_type_text(text.trim())
    }
}

fn print_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// Annotation text normalization
// ============================================================================

/// Split `text` on `sep` at nesting depth zero.
fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut prev = '\0';
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '"' => {
                in_string = !in_string;
                current.push(c);
            }
            '(' | '[' | '{' | '<' if !in_string => {
                depth += 1;
                current.push(c);
            }
            // The `>` of an arrow (`->`/`=>`) is not a closing bracket.
            '>' if !in_string && (prev == '-' || prev == '=') => current.push(c),
            ')' | ']' | '}' | '>' if !in_string => {
                depth -= 1;
                current.push(c);
            }
            c if c == sep && depth == 0 && !in_string => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
        prev = c;
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

fn parse_type_text(text: &str) -> Type {
    let text = text.trim();
    if text.is_empty() {
        return Type::Any;
    }

    // Unions first, then intersections (folded to their first member's
    // object merge; NTL has no intersection tag).
    let union_parts = split_top_level(text, '|');
    if union_parts.len() > 1 {
        return Type::union(union_parts.iter().map(|p| parse_type_text(p)).collect());
    }
    let intersect_parts = split_top_level(text, '&');
    if intersect_parts.len() > 1 {
        let mut merged = IndexMap::new();
        for part in &intersect_parts {
            match parse_type_text(part) {
                Type::Object(fields) => merged.extend(fields),
                _ => return parse_type_text(&intersect_parts[0]),
            }
        }
        return Type::Object(merged);
    }

    // Suffixes.
    if let Some(base) = text.strip_suffix("[]") {
        return Type::Array(Box::new(parse_type_text(base)));
    }
    if let Some(base) = text.strip_suffix('?') {
        return Type::union(vec![parse_type_text(base), Type::Null, Type::Undefined]);
    }

    // Function type `(params) -> ret`.
    if text.starts_with('(') {
        if let Some(close) = matching_paren(text) {
            let params_text = &text[1..close];
            let rest = text[close + 1..].trim();
            if let Some(ret_text) = rest.strip_prefix("->").or_else(|| rest.strip_prefix("=>")) {
                let params = split_top_level(params_text, ',')
                    .into_iter()
                    .map(|p| match p.split_once(':') {
                        Some((name, ty)) => (name.trim().to_string(), parse_type_text(ty)),
                        None => (String::new(), parse_type_text(&p)),
                    })
                    .collect();
                return Type::Function {
                    params,
                    ret: Box::new(parse_type_text(ret_text)),
                };
            }
            if rest.is_empty() {
                return parse_type_text(params_text);
            }
        }
    }

    // Object type `{ a: T; b: U }`.
    if text.starts_with('{') && text.ends_with('}') {
        let inner = &text[1..text.len() - 1];
        let mut fields = IndexMap::new();
        for field in split_top_level(inner, ';') {
            let field = field.trim().trim_end_matches(',');
            if field.is_empty() {
                continue;
            }
            if let Some((name, ty)) = field.split_once(':') {
                fields.insert(name.trim().trim_end_matches('?').to_string(), parse_type_text(ty));
            }
        }
        return Type::Object(fields);
    }

    // Tuple type `[A, B]`.
    if text.starts_with('[') && text.ends_with(']') {
        let inner = &text[1..text.len() - 1];
        return Type::Tuple(
            split_top_level(inner, ',')
                .iter()
                .map(|p| parse_type_text(p))
                .collect(),
        );
    }

    // Literal types.
    if text.starts_with('"') && text.ends_with('"') && text.len() >= 2 {
        return Type::Literal(Literal::String(text[1..text.len() - 1].to_string()));
    }
    if let Ok(n) = text.parse::<f64>() {
        return Type::Literal(Literal::Number(n));
    }
    match text {
        "true" => return Type::Literal(Literal::Bool(true)),
        "false" => return Type::Literal(Literal::Bool(false)),
        "any" => return Type::Any,
        "never" => return Type::Never,
        "unknown" => return Type::Unknown,
        "void" => return Type::Void,
        "null" => return Type::Null,
        "undefined" => return Type::Undefined,
        "number" | "string" | "boolean" | "bigint" | "symbol" | "object" => {
            return Type::Primitive(match text {
                "number" => "number",
                "string" => "string",
                "boolean" => "boolean",
                "bigint" => "bigint",
                "symbol" => "symbol",
                _ => "object",
            });
        }
        _ => {}
    }

    // `typeof x` / `keyof T` / `infer T` are opaque here.
    if text.starts_with("typeof ") || text.starts_with("keyof ") || text.starts_with("infer ") {
        return Type::Any;
    }

    // Named type with optional generic arguments.
    if let Some(open) = text.find('<') {
        if text.ends_with('>') {
            let name = text[..open].trim().to_string();
            let args: Vec<Type> = split_top_level(&text[open + 1..text.len() - 1], ',')
                .iter()
                .map(|p| parse_type_text(p))
                .collect();
            if name == "Array" && args.len() == 1 {
                return Type::Array(Box::new(args.into_iter().next().unwrap()));
            }
            return Type::Generic { name, args };
        }
    }
    Type::Generic {
        name: text.to_string(),
        args: Vec::new(),
    }
}

/// Index of the `)` matching the `(` at position 0.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_flattens_and_dedupes_by_printed_form() {
        let u = Type::union(vec![
            Type::number(),
            Type::Union(vec![Type::string(), Type::number()]),
            Type::number(),
        ]);
        assert_eq!(u.print(), "number | string");
    }

    #[test]
    fn singleton_union_collapses() {
        let u = Type::union(vec![Type::number(), Type::number()]);
        assert_eq!(u, Type::number());
    }

    #[test]
    fn parse_primitives_and_arrays() {
        assert_eq!(Type::parse("number"), Type::number());
        assert_eq!(
            Type::parse("string[]"),
            Type::Array(Box::new(Type::string()))
        );
        assert_eq!(
            Type::parse("Array<number>"),
            Type::Array(Box::new(Type::number()))
        );
    }

    #[test]
    fn parse_union_and_optional() {
        assert_eq!(Type::parse("number | string").print(), "number | string");
        let opt = Type::parse("number?");
        assert_eq!(opt.print(), "number | null | undefined");
    }

    #[test]
    fn parse_function_type() {
        let f = Type::parse("(a: number, b: string) -> boolean");
        let Type::Function { params, ret } = f else {
            panic!("expected function type");
        };
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].0, "a");
        assert_eq!(*ret, Type::boolean());
    }

    #[test]
    fn parse_object_and_tuple() {
        let o = Type::parse("{ a: number; b: string }");
        let Type::Object(fields) = &o else { panic!() };
        assert_eq!(fields.len(), 2);
        let t = Type::parse("[number, string]");
        assert!(matches!(t, Type::Tuple(ref e) if e.len() == 2));
    }

    #[test]
    fn any_is_bidirectionally_compatible() {
        assert!(Type::assignable(&Type::Any, &Type::string()));
        assert!(Type::assignable(&Type::string(), &Type::Any));
    }

    #[test]
    fn literal_assigns_to_its_primitive() {
        assert!(Type::assignable(
            &Type::number(),
            &Type::Literal(Literal::Number(42.0))
        ));
        assert!(!Type::assignable(
            &Type::number(),
            &Type::Literal(Literal::String("x".into()))
        ));
    }

    #[test]
    fn union_target_accepts_any_member() {
        let target = Type::parse("number | string");
        assert!(Type::assignable(&target, &Type::string()));
        assert!(!Type::assignable(&target, &Type::boolean()));
    }

    #[test]
    fn union_source_requires_all_members() {
        let source = Type::parse("number | string");
        assert!(!Type::assignable(&Type::number(), &source));
        assert!(Type::assignable(&Type::parse("number | string | boolean"), &source));
    }

    #[test]
    fn object_width_subtyping() {
        let target = Type::parse("{ a: number }");
        let source = Type::parse("{ a: number; b: string }");
        assert!(Type::assignable(&target, &source));
        assert!(!Type::assignable(&source, &target));
    }

    #[test]
    fn string_is_not_number() {
        assert!(!Type::assignable(&Type::number(), &Type::string()));
    }

    #[test]
    fn non_nullish_strips_null_members() {
        let t = Type::parse("number | null | undefined");
        assert_eq!(t.non_nullish(), Type::number());
    }
}

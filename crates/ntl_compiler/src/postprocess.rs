//! Textual post-processing passes.
//!
//! The code generator always emits CommonJS; for ESM targets a second,
//! purely textual pass rewrites `require`/`module.exports` lines into
//! `import`/`export` form. The minifier strips blank lines and leading
//! indentation.

/// Rewrite CommonJS module plumbing into ECMAScript modules, line by line.
/// Lines that do not match a known shape pass through untouched.
pub fn rewrite_esm(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for line in code.lines() {
        out.push_str(&rewrite_esm_line(line));
        out.push('\n');
    }
    out
}

fn rewrite_esm_line(line: &str) -> String {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, body) = line.split_at(indent_len);

    // `const NAME = require("PATH");` / `const { a, b: c } = require("PATH");`
    if let Some(rest) = body.strip_prefix("const ") {
        if let Some((binding, tail)) = rest.split_once(" = require(") {
            if let Some(path) = tail.strip_suffix(");") {
                if binding.starts_with('{') {
                    let specs = binding
                        .trim_start_matches('{')
                        .trim_end_matches('}')
                        .trim()
                        .replace(": ", " as ");
                    return format!("{}import {{ {} }} from {};", indent, specs, path);
                }
                return format!("{}import {} from {};", indent, binding, path);
            }
        }
    }

    // Bare `require("PATH");`
    if let Some(tail) = body.strip_prefix("require(") {
        if let Some(path) = tail.strip_suffix(");") {
            return format!("{}import {};", indent, path);
        }
    }

    // `module.exports.NAME = VALUE;`
    if let Some(rest) = body.strip_prefix("module.exports.") {
        if let Some((exported, value)) = rest.split_once(" = ") {
            if let Some(local) = value.strip_suffix(';') {
                if exported == local {
                    return format!("{}export {{ {} }};", indent, local);
                }
                return format!("{}export {{ {} as {} }};", indent, local, exported);
            }
        }
    }

    // `module.exports = EXPR;`
    if let Some(rest) = body.strip_prefix("module.exports = ") {
        return format!("{}export default {}", indent, rest);
    }

    line.to_string()
}

/// Strip blank lines and leading indentation.
pub fn minify(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for line in code.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        out.push_str(trimmed);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_import_rewrite() {
        assert_eq!(
            rewrite_esm_line("const http = require(\"./http.js\");"),
            "import http from \"./http.js\";"
        );
    }

    #[test]
    fn named_import_rewrite_with_alias() {
        assert_eq!(
            rewrite_esm_line("const { a, b: c } = require(\"./lib\");"),
            "import { a, b as c } from \"./lib\";"
        );
    }

    #[test]
    fn bare_import_rewrite() {
        assert_eq!(
            rewrite_esm_line("require(\"./side-effect\");"),
            "import \"./side-effect\";"
        );
    }

    #[test]
    fn named_export_rewrite() {
        assert_eq!(
            rewrite_esm_line("module.exports.answer = answer;"),
            "export { answer };"
        );
        assert_eq!(
            rewrite_esm_line("module.exports.result = answer;"),
            "export { answer as result };"
        );
    }

    #[test]
    fn default_export_rewrite() {
        assert_eq!(
            rewrite_esm_line("module.exports = main;"),
            "export default main;"
        );
    }

    #[test]
    fn unrelated_lines_pass_through() {
        assert_eq!(rewrite_esm_line("const x = 1;"), "const x = 1;");
        assert_eq!(
            rewrite_esm_line("  console.log(require2());"),
            "  console.log(require2());"
        );
    }

    #[test]
    fn indentation_is_preserved() {
        assert_eq!(
            rewrite_esm_line("  const fs = require(\"fs\");"),
            "  import fs from \"fs\";"
        );
    }

    #[test]
    fn minify_strips_blanks_and_indent() {
        let code = "function f() {\n  return 1;\n}\n\nf();\n";
        assert_eq!(minify(code), "function f() {\nreturn 1;\n}\nf();\n");
    }
}

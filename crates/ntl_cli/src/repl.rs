//! The interactive prompt.
//!
//! Input is buffered until brackets balance, then the chunk compiles and the
//! emitted JavaScript is fed to a persistent host `node -i` process, so
//! bindings survive across inputs.

use anyhow::Context;
use bumpalo::Bump;
use ntl_compiler::{Compiler, VERSION};
use ntl_config::CompilerOptions;
use ntl_diagnostics::render::{render, use_color};
use std::io::{BufRead, Write};
use std::process::{Child, Command, Stdio};

pub fn run(options: CompilerOptions) -> anyhow::Result<i32> {
    println!("ntl repl v{} (.exit to quit)", VERSION);

    let mut host = spawn_host()?;
    let stdin = std::io::stdin();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "ntl> " } else { "...> " };
        print!("{}", prompt);
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let trimmed = line.trim();
        if buffer.is_empty() && (trimmed == ".exit" || trimmed == ".quit") {
            break;
        }
        buffer.push_str(&line);
        if bracket_depth(&buffer) > 0 {
            continue;
        }

        let chunk = std::mem::take(&mut buffer);
        if chunk.trim().is_empty() {
            continue;
        }
        evaluate(&chunk, &options, &mut host);
    }

    let _ = host.kill();
    Ok(0)
}

fn spawn_host() -> anyhow::Result<Child> {
    Command::new("node")
        .arg("-i")
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .context("failed to launch node; is it installed and on PATH?")
}

fn evaluate(chunk: &str, options: &CompilerOptions, host: &mut Child) {
    let arena = Bump::new();
    let compiler = Compiler::new(&arena, options.clone());
    let output = compiler.compile_source("repl", chunk);

    let color = use_color();
    for diag in output.errors.iter().chain(output.warnings.iter()) {
        eprint!("{}", render(diag, Some(chunk), color));
    }
    if !output.success {
        return;
    }

    let code = output.code.expect("successful compile has code");
    // The host REPL keeps its own context; skip the file prologue.
    let code = code.trim_start_matches("\"use strict\";\n");
    let failed = if let Some(stdin) = host.stdin.as_mut() {
        let failed = stdin.write_all(code.as_bytes()).is_err() || stdin.write_all(b"\n").is_err();
        if !failed {
            let _ = stdin.flush();
        }
        failed
    } else {
        false
    };
    if failed {
        eprintln!("host process is gone; restarting");
        if let Ok(fresh) = spawn_host() {
            *host = fresh;
        }
    }
}

/// Net bracket depth of a chunk, ignoring brackets inside strings, templates
/// and comments.
fn bracket_depth(text: &str) -> i32 {
    let mut depth = 0i32;
    let mut chars = text.chars().peekable();
    let mut in_string: Option<char> = None;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while let Some(c) = chars.next() {
        if in_line_comment {
            if c == '\n' {
                in_line_comment = false;
            }
            continue;
        }
        if in_block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_block_comment = false;
            }
            continue;
        }
        if let Some(quote) = in_string {
            if c == '\\' {
                chars.next();
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => in_string = Some(c),
            '#' => in_line_comment = true,
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                in_line_comment = true;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                in_block_comment = true;
            }
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_input_is_complete() {
        assert_eq!(bracket_depth("val x = 1"), 0);
        assert_eq!(bracket_depth("fn f() { return 1 }"), 0);
    }

    #[test]
    fn open_brackets_continue_the_chunk() {
        assert_eq!(bracket_depth("fn f() {"), 1);
        assert_eq!(bracket_depth("val a = [1, [2,"), 2);
    }

    #[test]
    fn brackets_in_strings_do_not_count() {
        assert_eq!(bracket_depth("val s = \"a { b\""), 0);
        assert_eq!(bracket_depth("val s = 'a ( b'"), 0);
    }

    #[test]
    fn brackets_in_comments_do_not_count() {
        assert_eq!(bracket_depth("val x = 1 // {{{"), 0);
        assert_eq!(bracket_depth("val x = 1 /* { */"), 0);
        assert_eq!(bracket_depth("# {\nval x = 1"), 0);
    }
}

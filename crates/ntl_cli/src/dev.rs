//! The development server.
//!
//! Serves a directory over HTTP: requests for `.js` files compile the
//! matching `.ntl` source on demand (the driver's mtime cache makes repeat
//! requests cheap and picks up edits), everything else is served from disk.

use anyhow::Context;
use bumpalo::Bump;
use ntl_compiler::{discover_sources, Compiler};
use ntl_config::CompilerOptions;
use ntl_diagnostics::render::{render, use_color};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;

pub fn serve(dir: &Path, port: u16, options: CompilerOptions) -> anyhow::Result<i32> {
    let arena = Bump::new();
    let compiler = Compiler::new(&arena, options);

    // Initial sweep so startup surfaces every diagnostic at once.
    let sources = discover_sources(dir, "dist");
    let mut failures = 0usize;
    for source in &sources {
        match compiler.compile_file(source) {
            Ok(output) if output.success => {}
            Ok(output) => {
                failures += 1;
                let text = std::fs::read_to_string(source).unwrap_or_default();
                for diag in &output.errors {
                    eprint!("{}", render(diag, Some(&text), use_color()));
                }
            }
            Err(err) => {
                failures += 1;
                eprintln!("error: {}", err);
            }
        }
    }
    eprintln!(
        "dev server: {} sources ({} failing) at http://127.0.0.1:{}/",
        sources.len(),
        failures,
        port
    );

    let listener = TcpListener::bind(("127.0.0.1", port))
        .with_context(|| format!("cannot bind port {}", port))?;
    for stream in listener.incoming() {
        let Ok(stream) = stream else { continue };
        if let Err(err) = handle(stream, dir, &compiler) {
            log::debug!("request failed: {}", err);
        }
    }
    Ok(0)
}

fn handle(mut stream: TcpStream, dir: &Path, compiler: &Compiler<'_>) -> anyhow::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    // Drain the headers; this server ignores them.
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 || header.trim().is_empty() {
            break;
        }
    }

    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .split('?')
        .next()
        .unwrap_or("/");

    let response = route(path, dir, compiler);
    stream.write_all(&response)?;
    Ok(())
}

fn route(path: &str, dir: &Path, compiler: &Compiler<'_>) -> Vec<u8> {
    let relative = path.trim_start_matches('/');
    if relative.contains("..") {
        return respond(403, "text/plain", b"forbidden");
    }

    if relative.is_empty() {
        let index = dir.join("index.html");
        if index.is_file() {
            return serve_file(&index);
        }
        return respond(200, "text/html", listing(dir).as_bytes());
    }

    // `.js` requests map back to `.ntl` sources and compile on demand.
    if relative.ends_with(".js") {
        let ntl_path = dir.join(Path::new(relative).with_extension("ntl"));
        if ntl_path.is_file() {
            return match compiler.compile_file(&ntl_path) {
                Ok(output) if output.success => {
                    respond(200, "text/javascript", output.code.unwrap_or_default().as_bytes())
                }
                Ok(output) => {
                    let body: String = output
                        .errors
                        .iter()
                        .map(|d| format!("// {}\n", d))
                        .collect();
                    respond(500, "text/javascript", body.as_bytes())
                }
                Err(err) => respond(500, "text/plain", err.to_string().as_bytes()),
            };
        }
    }

    let file = dir.join(relative);
    if file.is_file() {
        return serve_file(&file);
    }
    respond(404, "text/plain", b"not found")
}

fn serve_file(path: &Path) -> Vec<u8> {
    let mut body = Vec::new();
    match std::fs::File::open(path).and_then(|mut f| f.read_to_end(&mut body)) {
        Ok(_) => respond(200, content_type(path), &body),
        Err(_) => respond(500, "text/plain", b"cannot read file"),
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// A minimal directory listing linking each source to its compiled form.
fn listing(dir: &Path) -> String {
    let mut html = String::from("<!doctype html><title>ntl dev</title><h1>ntl dev server</h1><ul>");
    for source in discover_sources(dir, "dist") {
        if let Ok(relative) = source.strip_prefix(dir) {
            let js = relative.with_extension("js");
            let js = js.to_string_lossy();
            html.push_str(&format!("<li><a href=\"/{}\">{}</a></li>", js, js));
        }
    }
    html.push_str("</ul>");
    html
}

fn respond(status: u16, content_type: &str, body: &[u8]) -> Vec<u8> {
    let reason = match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    let mut out = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}; charset=utf-8\r\nContent-Length: {}\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n",
        status,
        reason,
        content_type,
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

//! ntlc: The NTL compiler CLI.
//!
//! Usage:
//!   ntlc <command> [file] [flags]
//!
//! Commands: run, build, check, watch, dev, repl, init, version.

use anyhow::{bail, Context};
use bumpalo::Bump;
use clap::{Parser as ClapParser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;
use ntl_compiler::{Compiler, VERSION};
use ntl_config::{CompilerOptions, Target};
use ntl_diagnostics::render::{render, use_color};
use ntl_diagnostics::translate::translate_host_error;
use ntl_diagnostics::Diagnostic;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process;
use std::time::SystemTime;

mod dev;
mod repl;

#[derive(ClapParser, Debug)]
#[command(
    name = "ntlc",
    about = "ntlc - The NTL to JavaScript compiler",
    disable_version_flag = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Print the compiler version.
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Compilation target.
    #[arg(long, global = true, value_name = "TARGET")]
    target: Option<String>,

    /// Escalate type-compatibility warnings to errors.
    #[arg(long, global = true)]
    strict: bool,

    /// Strip blank lines and indentation from the output.
    #[arg(long, global = true)]
    minify: bool,

    /// Accepted for compatibility; the obfuscator runs as a separate tool.
    #[arg(long, global = true)]
    obfuscate: bool,

    /// Disable tree shaking (which is disabled regardless).
    #[arg(long = "no-treeshake", global = true)]
    no_treeshake: bool,

    /// Append a generated-by banner to emitted output.
    #[arg(long, global = true)]
    credits: bool,

    /// Accepted for compatibility; source maps are not generated.
    #[arg(long = "source-map", global = true)]
    source_map: bool,

    /// Accepted for compatibility; file compiles are always mtime-cached.
    #[arg(long, global = true)]
    incremental: bool,

    /// Write output to this path instead of standard output.
    #[arg(short = 'o', long = "out", global = true, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Dev server port.
    #[arg(long, global = true, default_value_t = 3000)]
    port: u16,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a file and execute it on the host engine.
    Run { file: PathBuf },
    /// Compile a file or a whole project (build ntl.json).
    Build { file: PathBuf },
    /// Lex, parse, scope-check and typecheck without emitting.
    Check { file: PathBuf },
    /// Compile, then recompile on every change.
    Watch { file: PathBuf },
    /// Compile a directory and serve it over HTTP.
    Dev { dir: Option<PathBuf> },
    /// Interactive prompt with a persistent host context.
    Repl,
    /// Scaffold a new project.
    Init { dir: Option<PathBuf> },
    /// Print the compiler version and host info.
    Version,
}

fn main() {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Warn);
    builder.parse_default_env();
    builder.init();

    let cli = Cli::parse();
    if cli.version {
        print_version();
        return;
    }

    let code = match dispatch(&cli) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{:#}", err);
            eprintln!("error: {:#}", err);
            1
        }
    };
    process::exit(code);
}

fn dispatch(cli: &Cli) -> anyhow::Result<i32> {
    let options = build_options(cli)?;
    match &cli.command {
        Some(Command::Run { file }) => cmd_run(file, options),
        Some(Command::Build { file }) => cmd_build(file, options, cli.out.as_deref()),
        Some(Command::Check { file }) => cmd_check(file, options),
        Some(Command::Watch { file }) => cmd_watch(file, options),
        Some(Command::Dev { dir }) => {
            let dir = dir.clone().unwrap_or_else(|| PathBuf::from("."));
            dev::serve(&dir, cli.port, options)
        }
        Some(Command::Repl) => repl::run(options),
        Some(Command::Init { dir }) => cmd_init(dir.as_deref()),
        Some(Command::Version) => {
            print_version();
            Ok(0)
        }
        None => {
            // clap renders usage for `help`; plain `ntlc` gets the same.
            let _ = Cli::parse_from(["ntlc", "--help"]);
            Ok(0)
        }
    }
}

fn build_options(cli: &Cli) -> anyhow::Result<CompilerOptions> {
    let target = match &cli.target {
        Some(text) => text.parse::<Target>()?,
        None => Target::default(),
    };
    if cli.obfuscate {
        log::warn!("--obfuscate is handled by the separate obfuscator tool; ignoring");
    }
    Ok(CompilerOptions {
        target,
        strict: cli.strict,
        minify: cli.minify,
        tree_shake: !cli.no_treeshake,
        credits: cli.credits,
        source_map: cli.source_map,
        typecheck: false,
    })
}

fn print_version() {
    println!(
        "ntlc v{} ({} {})",
        VERSION,
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

// ============================================================================
// Diagnostics presentation
// ============================================================================

fn print_diagnostics(diags: &[Diagnostic], source: Option<&str>) {
    let color = use_color();
    for diag in diags {
        eprint!("{}", render(diag, source, color));
    }
}

fn report(output: &ntl_compiler::CompileOutput<'_>, source: &str) -> bool {
    print_diagnostics(&output.errors, Some(source));
    print_diagnostics(&output.warnings, Some(source));
    output.success
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(file: &Path, options: CompilerOptions) -> anyhow::Result<i32> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let arena = Bump::new();
    let compiler = Compiler::new(&arena, options);
    let output = compiler.compile_source(&file.to_string_lossy(), &source);
    if !report(&output, &source) {
        return Ok(1);
    }
    let code = output.code.expect("successful compile has code");

    let temp = std::env::temp_dir().join(format!("ntlc_run_{}.js", process::id()));
    std::fs::write(&temp, &code)
        .with_context(|| format!("cannot write {}", temp.display()))?;

    let mut child = process::Command::new("node")
        .arg(&temp)
        .stdin(process::Stdio::inherit())
        .stdout(process::Stdio::inherit())
        .stderr(process::Stdio::piped())
        .spawn()
        .context("failed to launch node; is it installed and on PATH?")?;

    // Stream stderr so runtime failures can be translated before display.
    let mut stderr_lines = Vec::new();
    if let Some(stderr) = child.stderr.take() {
        for line in BufReader::new(stderr).lines() {
            let line = line.unwrap_or_default();
            stderr_lines.push(line);
        }
    }
    let status = child.wait().context("node did not exit cleanly")?;
    let _ = std::fs::remove_file(&temp);

    if !status.success() {
        present_host_failure(&stderr_lines);
    } else {
        for line in &stderr_lines {
            eprintln!("{}", line);
        }
    }
    Ok(status.code().unwrap_or(1))
}

/// Find the engine's error message in a stderr dump and present it as an
/// NTL runtime diagnostic, keeping the rest as dim context.
fn present_host_failure(lines: &[String]) {
    let message = lines.iter().find_map(|line| {
        let trimmed = line.trim();
        for marker in [
            "TypeError: ",
            "ReferenceError: ",
            "RangeError: ",
            "SyntaxError: ",
            "Error: ",
        ] {
            if let Some(at) = trimmed.find(marker) {
                return Some(trimmed[at..].to_string());
            }
        }
        None
    });
    match message {
        Some(message) => {
            let diag = translate_host_error(&message);
            eprint!("{}", render(&diag, None, use_color()));
        }
        None => {
            for line in lines {
                eprintln!("{}", line);
            }
        }
    }
}

// ============================================================================
// build
// ============================================================================

fn cmd_build(file: &Path, options: CompilerOptions, out: Option<&Path>) -> anyhow::Result<i32> {
    let is_project = file
        .file_name()
        .is_some_and(|name| name == "ntl.json")
        || file.extension().is_some_and(|ext| ext == "json");
    if is_project {
        return cmd_build_project(file, options);
    }

    let source = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let arena = Bump::new();
    let compiler = Compiler::new(&arena, options);
    let output = compiler.compile_source(&file.to_string_lossy(), &source);
    if !report(&output, &source) {
        return Ok(1);
    }
    let code = output.code.expect("successful compile has code");
    match out {
        Some(path) => {
            std::fs::write(path, &code)
                .with_context(|| format!("cannot write {}", path.display()))?;
            eprintln!(
                "{} -> {} ({:.1}ms)",
                file.display(),
                path.display(),
                output.elapsed_ms
            );
        }
        None => print!("{}", code),
    }
    Ok(0)
}

fn cmd_build_project(config_path: &Path, options: CompilerOptions) -> anyhow::Result<i32> {
    let config = ntl_config::parse_config_file(config_path)
        .with_context(|| format!("cannot load {}", config_path.display()))?;
    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut merged = config.compiler_options.clone();
    // CLI flags override the project file.
    if options.strict {
        merged.strict = true;
    }
    if options.minify {
        merged.minify = true;
    }
    if options.credits {
        merged.credits = true;
    }
    if options.target != Target::default() {
        merged.target = options.target;
    }

    let arena = Bump::new();
    let compiler = Compiler::new(&arena, merged);
    let outcome = compiler.compile_project(&config, base_dir)?;
    for file in &outcome.files {
        let source = std::fs::read_to_string(&file.source).unwrap_or_default();
        print_diagnostics(&file.errors, Some(&source));
        print_diagnostics(&file.warnings, Some(&source));
    }
    eprintln!(
        "{}: {} compiled, {} failed ({:.1}ms)",
        config.name, outcome.succeeded, outcome.failed, outcome.elapsed_ms
    );
    Ok(if outcome.failed > 0 { 1 } else { 0 })
}

// ============================================================================
// check
// ============================================================================

fn cmd_check(file: &Path, mut options: CompilerOptions) -> anyhow::Result<i32> {
    options.typecheck = true;
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let arena = Bump::new();
    let compiler = Compiler::new(&arena, options);
    let output = compiler.compile_source(&file.to_string_lossy(), &source);
    print_diagnostics(&output.errors, Some(&source));
    print_diagnostics(&output.warnings, Some(&source));
    if output.success {
        println!("OK ({} lines, {:.1}ms)", output.stats.source_lines, output.elapsed_ms);
        Ok(0)
    } else {
        Ok(1)
    }
}

// ============================================================================
// watch
// ============================================================================

fn cmd_watch(file: &Path, options: CompilerOptions) -> anyhow::Result<i32> {
    let arena = Bump::new();
    let compiler = Compiler::new(&arena, options);

    let compile_once = |compiler: &Compiler<'_>| {
        match std::fs::read_to_string(file) {
            Ok(source) => {
                let output = compiler.compile_source(&file.to_string_lossy(), &source);
                if report(&output, &source) {
                    eprintln!("compiled {} ({:.1}ms)", file.display(), output.elapsed_ms);
                }
            }
            Err(err) => eprintln!("error: cannot read {}: {}", file.display(), err),
        }
    };

    compile_once(&compiler);
    eprintln!("watching {} for changes...", file.display());

    let mut last_modified = mtime_of(file);
    loop {
        std::thread::sleep(std::time::Duration::from_millis(500));
        let modified = mtime_of(file);
        if modified > last_modified {
            last_modified = modified;
            eprintln!();
            eprintln!("change detected, recompiling...");
            compile_once(&compiler);
        }
    }
}

fn mtime_of(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

// ============================================================================
// init
// ============================================================================

fn cmd_init(dir: Option<&Path>) -> anyhow::Result<i32> {
    let root = dir.unwrap_or(Path::new(".")).to_path_buf();
    let config_path = root.join("ntl.json");
    if config_path.exists() {
        bail!("an ntl.json file already exists in {}", root.display());
    }
    std::fs::create_dir_all(root.join("src"))?;

    let project_name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "app".to_string());

    std::fs::write(
        &config_path,
        format!(
            r#"{{
  "name": "{}",
  "version": "0.1.0",
  "src": "src",
  "dist": "dist",
  "compilerOptions": {{
    "target": "node",
    "strict": false,
    "minify": false,
    "treeShake": true,
    "credits": false
  }},
  "include": ["src/**/*.ntl"],
  "exclude": ["node_modules", "dist"]
}}
"#,
            project_name
        ),
    )?;

    std::fs::write(
        root.join("src/main.ntl"),
        "fn main() {\n    val greeting = \"Hello from NTL!\"\n    console.log(greeting)\n}\n\nmain()\n",
    )?;

    std::fs::write(
        root.join("package.json"),
        format!(
            r#"{{
  "name": "{}",
  "version": "0.1.0",
  "private": true,
  "scripts": {{
    "build": "ntlc build ntl.json",
    "start": "ntlc run src/main.ntl"
  }}
}}
"#,
            project_name
        ),
    )?;

    std::fs::write(root.join(".gitignore"), "node_modules/\ndist/\n")?;

    println!("scaffolded {} in {}", project_name, root.display());
    println!("  ntl.json");
    println!("  src/main.ntl");
    println!("  package.json");
    println!("  .gitignore");
    Ok(0)
}

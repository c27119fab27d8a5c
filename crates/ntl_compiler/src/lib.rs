//! ntl_compiler: Compiler orchestration.
//!
//! Runs the pipeline (lex -> parse -> scope -> infer -> codegen) for single
//! sources, caches file compiles by modification time, and drives whole
//! project builds. Target-specific post-processing (the ESM rewrite and the
//! whitespace minifier) happens here, after code generation.

mod postprocess;

pub use postprocess::{minify, rewrite_esm};

use bumpalo::Bump;
use ntl_ast::SourceFile;
use ntl_codegen::EmitOptions;
use ntl_config::{CompilerOptions, ProjectConfig, Target};
use ntl_diagnostics::Diagnostic;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use thiserror::Error;

/// The compiler's own version, for banners and `version` output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Counters reported with every successful compile.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileStats {
    pub source_lines: usize,
    pub source_chars: usize,
    pub output_chars: usize,
}

/// The result of one compile.
#[derive(Debug)]
pub struct CompileOutput<'a> {
    pub success: bool,
    pub code: Option<String>,
    /// Absent for cache hits, which skip the pipeline entirely.
    pub ast: Option<&'a SourceFile<'a>>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub elapsed_ms: f64,
    pub target: Target,
    pub stats: CompileStats,
}

struct CacheEntry {
    modified: SystemTime,
    code: String,
    warnings: Vec<Diagnostic>,
    stats: CompileStats,
}

/// Per-file outcome of a project build.
#[derive(Debug)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub output: Option<PathBuf>,
    pub success: bool,
    pub elapsed_ms: f64,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

/// Aggregate outcome of a project build.
#[derive(Debug, Default)]
pub struct ProjectOutcome {
    pub files: Vec<FileOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: f64,
}

/// The compiler. Owns nothing but options and the file cache; the AST arena
/// is borrowed from the caller so outputs can hand the AST back.
pub struct Compiler<'a> {
    arena: &'a Bump,
    pub options: CompilerOptions,
    module_dir: PathBuf,
    cache: RefCell<FxHashMap<PathBuf, CacheEntry>>,
}

impl<'a> Compiler<'a> {
    pub fn new(arena: &'a Bump, options: CompilerOptions) -> Self {
        Self {
            arena,
            options,
            module_dir: default_module_dir(),
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn with_module_dir(mut self, module_dir: PathBuf) -> Self {
        self.module_dir = module_dir;
        self
    }

    // ========================================================================
    // compile-source
    // ========================================================================

    /// Run the full pipeline over one source text. Each stage's diagnostics
    /// abort the pipeline before the next stage runs; warnings never abort.
    pub fn compile_source(&self, file_name: &str, source: &str) -> CompileOutput<'a> {
        let start = Instant::now();
        let target = self.options.target;

        let fail = |errors: Vec<Diagnostic>, warnings: Vec<Diagnostic>, start: Instant| {
            CompileOutput {
                success: false,
                code: None,
                ast: None,
                errors,
                warnings,
                elapsed_ms: elapsed_ms(start),
                target,
                stats: CompileStats::default(),
            }
        };

        // Lex + parse.
        let sf = match ntl_parser::parse(self.arena, file_name, source) {
            Ok(sf) => sf,
            Err(diag) => return fail(vec![diag], Vec::new(), start),
        };

        // Scope analysis: all errors accumulate.
        let (scope_errors, mut warnings): (Vec<_>, Vec<_>) = ntl_scope::analyze(sf)
            .into_iter()
            .partition(Diagnostic::is_error);
        if !scope_errors.is_empty() {
            return fail(scope_errors, warnings, start);
        }

        // Type inference, when strict checking or a check run asks for it.
        if self.options.strict || self.options.typecheck {
            let (type_errors, type_warnings): (Vec<_>, Vec<_>) =
                ntl_infer::infer(sf, self.options.strict)
                    .into_iter()
                    .partition(Diagnostic::is_error);
            warnings.extend(type_warnings);
            if !type_errors.is_empty() {
                return fail(type_errors, warnings, start);
            }
        }

        // Code generation.
        let emit_options = EmitOptions {
            module_dir: self.module_dir.clone(),
        };
        let mut code = match ntl_codegen::generate(sf, &emit_options) {
            Ok(code) => code,
            Err(diag) => return fail(vec![diag], warnings, start),
        };

        // Target post-processing.
        if target.is_esm() {
            code = rewrite_esm(&code);
        }
        if self.options.credits {
            code.push_str(&format!("// Compiled by ntlc v{}\n", VERSION));
        }
        if self.options.minify {
            code = minify(&code);
        }

        let stats = CompileStats {
            source_lines: source.lines().count(),
            source_chars: source.chars().count(),
            output_chars: code.chars().count(),
        };
        log::debug!(
            "compiled {}: {} lines -> {} chars in {:.2}ms",
            file_name,
            stats.source_lines,
            stats.output_chars,
            elapsed_ms(start)
        );
        CompileOutput {
            success: true,
            code: Some(code),
            ast: Some(sf),
            errors: Vec::new(),
            warnings,
            elapsed_ms: elapsed_ms(start),
            target,
            stats,
        }
    }

    // ========================================================================
    // compile-file
    // ========================================================================

    /// Compile a file, reusing the cached output when the modification time
    /// is unchanged.
    pub fn compile_file(&self, path: &Path) -> Result<CompileOutput<'a>, CompileError> {
        let canonical = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());
        let modified = std::fs::metadata(&canonical)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        if let Some(entry) = self.cache.borrow().get(&canonical) {
            if entry.modified == modified {
                log::debug!("cache hit for {}", canonical.display());
                return Ok(CompileOutput {
                    success: true,
                    code: Some(entry.code.clone()),
                    ast: None,
                    errors: Vec::new(),
                    warnings: entry.warnings.clone(),
                    elapsed_ms: 0.0,
                    target: self.options.target,
                    stats: entry.stats,
                });
            }
        }

        let source = std::fs::read_to_string(&canonical).map_err(|source| CompileError::Read {
            path: canonical.clone(),
            source,
        })?;
        let output = self.compile_source(&canonical.to_string_lossy(), &source);
        if output.success {
            self.cache.borrow_mut().insert(
                canonical,
                CacheEntry {
                    modified,
                    code: output.code.clone().unwrap_or_default(),
                    warnings: output.warnings.clone(),
                    stats: output.stats,
                },
            );
        }
        Ok(output)
    }

    /// Drop any cached entry for `path`; used by watch mode after errors.
    pub fn invalidate(&self, path: &Path) {
        let canonical = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());
        self.cache.borrow_mut().remove(&canonical);
    }

    // ========================================================================
    // compile-project
    // ========================================================================

    /// Compile every `.ntl` file under the project's src directory into its
    /// mirrored path under dist, with the extension rewritten to `.js`.
    pub fn compile_project(
        &self,
        config: &ProjectConfig,
        base_dir: &Path,
    ) -> Result<ProjectOutcome, CompileError> {
        let start = Instant::now();
        let src_dir = base_dir.join(&config.src);
        let dist_dir = base_dir.join(&config.dist);
        let mut outcome = ProjectOutcome::default();

        for source_path in discover_sources(&src_dir, &config.dist) {
            let relative = source_path
                .strip_prefix(&src_dir)
                .unwrap_or(&source_path)
                .to_path_buf();
            if !config.selects(&relative) && !config.selects(&source_path) {
                continue;
            }
            let result = self.compile_file(&source_path)?;
            let mut file_outcome = FileOutcome {
                source: source_path.clone(),
                output: None,
                success: result.success,
                elapsed_ms: result.elapsed_ms,
                errors: result.errors,
                warnings: result.warnings,
            };
            if let Some(code) = result.code {
                let out_path = dist_dir.join(relative.with_extension("js"));
                if let Some(parent) = out_path.parent() {
                    std::fs::create_dir_all(parent).map_err(|source| CompileError::Write {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                std::fs::write(&out_path, &code).map_err(|source| CompileError::Write {
                    path: out_path.clone(),
                    source,
                })?;
                file_outcome.output = Some(out_path);
            }
            if file_outcome.success {
                outcome.succeeded += 1;
            } else {
                outcome.failed += 1;
            }
            outcome.files.push(file_outcome);
        }
        outcome.elapsed_ms = elapsed_ms(start);
        log::info!(
            "project build: {} ok, {} failed in {:.1}ms",
            outcome.succeeded,
            outcome.failed,
            outcome.elapsed_ms
        );
        Ok(outcome)
    }
}

/// Recursively enumerate `.ntl` files, skipping dot-directories, the
/// dependency directory, and the output directory.
pub fn discover_sources(root: &Path, dist_name: &str) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            if entry.depth() == 0 {
                return true;
            }
            if entry.file_type().is_dir() {
                return !name.starts_with('.') && name != "node_modules" && name != dist_name;
            }
            true
        })
        .filter_map(Result::ok)
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "ntl")
        })
        .map(|entry| entry.into_path())
        .collect();
    sources.sort();
    sources
}

/// The directory bundled NTL modules resolve against: `modules/` beside the
/// installed compiler binary, falling back to the working directory.
pub fn default_module_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("modules")))
        .unwrap_or_else(|| PathBuf::from("modules"))
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

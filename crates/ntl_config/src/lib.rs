//! ntl_config: ntl.json parsing and compiler options.
//!
//! The project file mirrors the schema:
//!
//! ```json
//! { "name": "app", "version": "0.1.0", "src": "src", "dist": "dist",
//!   "compilerOptions": { "target": "node", "strict": false,
//!                        "minify": false, "treeShake": true,
//!                        "credits": false },
//!   "include": ["src/**/*.ntl"], "exclude": ["node_modules"] }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid ntl.json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown target '{0}', expected node|browser|deno|bun|esm|cjs")]
    UnknownTarget(String),
}

/// Compilation target. Module-system handling is the only behavioral
/// difference: `esm`, `browser` and `deno` outputs get the ESM rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Node,
    Browser,
    Deno,
    Bun,
    Esm,
    Cjs,
}

impl Target {
    /// Whether emitted output should use ECMAScript modules.
    pub fn is_esm(self) -> bool {
        matches!(self, Target::Esm | Target::Browser | Target::Deno)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Target::Node => "node",
            Target::Browser => "browser",
            Target::Deno => "deno",
            Target::Bun => "bun",
            Target::Esm => "esm",
            Target::Cjs => "cjs",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Target::Node),
            "browser" => Ok(Target::Browser),
            "deno" => Ok(Target::Deno),
            "bun" => Ok(Target::Bun),
            "esm" => Ok(Target::Esm),
            "cjs" => Ok(Target::Cjs),
            other => Err(ConfigError::UnknownTarget(other.to_string())),
        }
    }
}

/// Compiler options, from `ntl.json` or CLI flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    pub target: Target,
    pub strict: bool,
    pub minify: bool,
    /// Accepted for compatibility; dead-code elimination is not performed.
    pub tree_shake: bool,
    /// Append a generated-by banner to emitted output.
    pub credits: bool,
    /// Accepted for compatibility; source maps are not generated.
    pub source_map: bool,
    /// Run the type inferer even when `strict` is off (the `check`
    /// command).
    #[serde(default)]
    pub typecheck: bool,
}

/// The ntl.json project file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub name: String,
    pub version: String,
    pub src: String,
    pub dist: String,
    pub compiler_options: CompilerOptions,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            version: "0.1.0".to_string(),
            src: "src".to_string(),
            dist: "dist".to_string(),
            compiler_options: CompilerOptions::default(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl ProjectConfig {
    /// Whether a source path passes the include/exclude globs. An empty
    /// include list matches everything.
    pub fn selects(&self, path: &Path) -> bool {
        let as_text = path.to_string_lossy();
        let matches_any = |patterns: &[String]| {
            patterns.iter().any(|p| {
                glob::Pattern::new(p)
                    .map(|pattern| pattern.matches(&as_text))
                    .unwrap_or(false)
            })
        };
        if !self.include.is_empty() && !matches_any(&self.include) {
            return false;
        }
        !matches_any(&self.exclude)
    }
}

/// Parse an ntl.json document from a string.
pub fn parse_config(content: &str) -> Result<ProjectConfig, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

/// Parse an ntl.json file from disk.
pub fn parse_config_file(path: impl AsRef<Path>) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

//! Validated option records consumed by the pipeline.
//!
//! Configuration parsing lives in the binary; by the time these structs
//! exist the project root has been resolved and checked.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Identity of the project being mapped.
#[derive(Debug, Clone)]
pub struct BaseOptions {
    /// Absolute, resolved root of the source tree.
    pub full_root_path: PathBuf,
    /// The root exactly as configured (kept for display).
    pub project_root: String,
    /// Display name; also the internal-import prefix for the parsers.
    pub project_name: String,
}

/// Scan and parse configuration.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub base: BaseOptions,
    pub languages: Vec<Language>,
    pub exclusions: Vec<String>,
    /// Allowed file extensions, each with its leading dot.
    pub file_extensions: Vec<String>,
}

/// Rendering configuration.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub base: BaseOptions,
    pub format: RenderFormat,
    pub views: Vec<View>,
    pub save_location: PathBuf,
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    pub base: BaseOptions,
    pub backend: SnapshotBackend,
    pub snapshot_dir: String,
    pub snapshot_file: String,
}

/// A named rendering view: focus subtrees with recursion depth, plus
/// package names/paths to leave out.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    pub packages: Vec<Package>,
    pub ignore_packages: Vec<String>,
}

/// One focus subtree of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub path: String,
    pub depth: u32,
}

/// Languages with a dependency parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    CSharp,
    Go,
    Kotlin,
}

impl Language {
    pub fn from_name(raw: &str) -> Result<Language> {
        match raw.trim().to_lowercase().as_str() {
            "c#" | "csharp" | "cs" | "c-sharp" | "c sharp" => Ok(Language::CSharp),
            "go" | "golang" => Ok(Language::Go),
            "kotlin" | "kt" => Ok(Language::Kotlin),
            other => Err(Error::Config(format!("unsupported language: '{other}'"))),
        }
    }

    pub fn default_extensions(&self) -> &'static [&'static str] {
        match self {
            Language::CSharp => &[".cs"],
            Language::Go => &[".go"],
            Language::Kotlin => &[".kt", ".kts"],
        }
    }
}

/// Output format of the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    Json,
    PlantUml,
}

impl RenderFormat {
    pub fn from_name(raw: &str) -> Result<RenderFormat> {
        match raw.trim().to_lowercase().as_str() {
            "json" | "application/json" => Ok(RenderFormat::Json),
            "puml" | "plantuml" | "plant-uml" => Ok(RenderFormat::PlantUml),
            other => Err(Error::Config(format!("unsupported render format: '{other}'"))),
        }
    }
}

/// Where snapshots are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotBackend {
    Local,
    Git,
}

impl SnapshotBackend {
    pub fn from_name(raw: &str) -> Result<SnapshotBackend> {
        match raw.trim().to_lowercase().as_str() {
            "local" => Ok(SnapshotBackend::Local),
            "git" => Ok(SnapshotBackend::Git),
            other => Err(Error::Config(format!("unsupported snapshot backend: '{other}'"))),
        }
    }
}

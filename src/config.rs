//! Configuration loading: `arbor.json` → validated option records.
//!
//! Everything here either succeeds or is a fatal configuration error —
//! no scan or build work happens before the options are sound.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use arbor_core::{
    snapshot, BaseOptions, Error, Language, Package, ParserOptions, RenderFormat, RenderOptions,
    Result, SnapshotBackend, SnapshotOptions, View,
};
use serde::Deserialize;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "arbor.json";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigFile {
    project_root: Option<String>,
    root_folder: Option<String>,
    project_name: Option<String>,
    name: Option<String>,
    languages: Option<Vec<String>>,
    language: Option<String>,
    snapshot_manager: Option<String>,
    format: Option<String>,
    exclusions: Option<Vec<String>>,
    file_extensions: Option<Vec<String>>,
    snapshot_dir: Option<String>,
    snapshot_file: Option<String>,
    views: Option<BTreeMap<String, ViewConfig>>,
    save_location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ViewConfig {
    packages: Vec<PackageConfig>,
    ignore_packages: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageConfig {
    path: String,
    depth: Option<u32>,
}

/// All option records for one run.
pub struct LoadedOptions {
    pub base: BaseOptions,
    pub parser: ParserOptions,
    pub render: RenderOptions,
    pub snapshot: SnapshotOptions,
}

/// Load and validate the configuration.
pub async fn load(explicit_path: Option<PathBuf>) -> Result<LoadedOptions> {
    let config_file = match explicit_path {
        Some(path) => path,
        None => find_config_file(CONFIG_FILE)?,
    };

    let json = tokio::fs::read_to_string(&config_file)
        .await
        .map_err(|e| Error::Config(format!("cannot read {}: {e}", config_file.display())))?;
    let dto: ConfigFile = serde_json::from_str(&json)
        .map_err(|e| Error::Config(format!("cannot parse {}: {e}", config_file.display())))?;

    let base_dir = config_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let base = map_base_options(&dto, &base_dir)?;
    let parser = map_parser_options(&dto, &base)?;
    let render = map_render_options(&dto, &base_dir, &base)?;
    let snapshot = map_snapshot_options(&dto, &base)?;

    Ok(LoadedOptions {
        base,
        parser,
        render,
        snapshot,
    })
}

fn find_config_file(file_name: &str) -> Result<PathBuf> {
    let start = std::env::current_dir()?;
    let mut dir = Some(start.as_path());
    while let Some(current) = dir {
        let candidate = current.join(file_name);
        if candidate.is_file() {
            return Ok(candidate);
        }
        dir = current.parent();
    }
    Err(Error::Config(format!(
        "could not find '{file_name}' in {} or any parent directory",
        start.display()
    )))
}

fn map_base_options(dto: &ConfigFile, base_dir: &Path) -> Result<BaseOptions> {
    let project_root = dto
        .project_root
        .clone()
        .or_else(|| dto.root_folder.clone())
        .unwrap_or_default();

    let full_root_path = if project_root.is_empty() {
        base_dir.to_path_buf()
    } else {
        let configured = PathBuf::from(&project_root);
        if configured.is_absolute() {
            configured
        } else {
            base_dir.join(configured)
        }
    };

    if !full_root_path.is_dir() {
        return Err(Error::Config(format!(
            "projectRoot does not exist: {}",
            full_root_path.display()
        )));
    }

    let project_name = dto
        .project_name
        .clone()
        .or_else(|| dto.name.clone())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| {
            full_root_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        });

    Ok(BaseOptions {
        full_root_path,
        project_root,
        project_name,
    })
}

fn map_parser_options(dto: &ConfigFile, base: &BaseOptions) -> Result<ParserOptions> {
    let mut language_names: Vec<String> = dto.languages.clone().unwrap_or_default();
    if language_names.is_empty() {
        if let Some(single) = &dto.language {
            language_names.push(single.clone());
        }
    }
    if language_names.is_empty() {
        language_names.push("c#".to_string());
    }

    let languages = language_names
        .iter()
        .map(|name| Language::from_name(name))
        .collect::<Result<Vec<_>>>()?;

    let exclusions = dto
        .exclusions
        .clone()
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let file_extensions: Vec<String> = match &dto.file_extensions {
        Some(extensions) => extensions.iter().map(|e| normalize_extension(e)).collect(),
        None => languages
            .iter()
            .flat_map(|l| l.default_extensions())
            .map(|e| e.to_string())
            .collect(),
    };
    if file_extensions.is_empty() {
        return Err(Error::Config(
            "fileExtensions resolved to an empty list".to_string(),
        ));
    }

    Ok(ParserOptions {
        base: base.clone(),
        languages,
        exclusions,
        file_extensions,
    })
}

fn map_render_options(
    dto: &ConfigFile,
    base_dir: &Path,
    base: &BaseOptions,
) -> Result<RenderOptions> {
    let format = RenderFormat::from_name(dto.format.as_deref().unwrap_or("json"))?;

    let mut views: Vec<View> = dto
        .views
        .iter()
        .flatten()
        .map(|(name, view)| View {
            name: name.clone(),
            packages: view
                .packages
                .iter()
                .map(|p| Package {
                    path: p.path.clone(),
                    depth: p.depth.unwrap_or(0),
                })
                .collect(),
            ignore_packages: view.ignore_packages.clone(),
        })
        .collect();
    if views.is_empty() {
        views.push(View {
            name: "architecture".to_string(),
            packages: Vec::new(),
            ignore_packages: Vec::new(),
        });
    }

    let save_location = base_dir.join(dto.save_location.as_deref().unwrap_or("views"));

    Ok(RenderOptions {
        base: base.clone(),
        format,
        views,
        save_location,
    })
}

fn map_snapshot_options(dto: &ConfigFile, base: &BaseOptions) -> Result<SnapshotOptions> {
    let backend = SnapshotBackend::from_name(dto.snapshot_manager.as_deref().unwrap_or("local"))?;
    if backend == SnapshotBackend::Git {
        return Err(Error::Config(
            "the git snapshot backend is not available in this build; use \"local\"".to_string(),
        ));
    }

    Ok(SnapshotOptions {
        base: base.clone(),
        backend,
        snapshot_dir: dto
            .snapshot_dir
            .clone()
            .unwrap_or_else(|| snapshot::SNAPSHOT_DIR.to_string()),
        snapshot_file: dto
            .snapshot_file
            .clone()
            .unwrap_or_else(|| snapshot::SNAPSHOT_FILE.to_string()),
    })
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

//! Kotlin import scanner.
//!
//! Matches `import {root}.x.y` lines anchored on the project's root
//! package, tolerating an `as alias` tail.

use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;

use arbor_core::{check_cancelled, DependencyParser, ParserOptions, Result};

pub struct KotlinParser {
    import_line: Option<Regex>,
}

impl KotlinParser {
    pub fn new(options: &ParserOptions) -> Self {
        let root = options.base.project_name.trim();
        let import_line = if root.is_empty() {
            None
        } else {
            let pattern = format!(
                r"^\s*import\s+{}\.(.+?)(\s+as\s+\w+)?\s*$",
                regex::escape(root)
            );
            match Regex::new(&pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!("kotlin parser: bad import pattern: {e}");
                    None
                }
            }
        };
        KotlinParser { import_line }
    }
}

#[async_trait]
impl DependencyParser for KotlinParser {
    async fn parse_file_dependencies(
        &self,
        file: &Path,
        ct: &CancellationToken,
    ) -> Result<Vec<String>> {
        let Some(import_line) = &self.import_line else {
            return Ok(Vec::new());
        };

        let content = match tokio::fs::read_to_string(file).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("kotlin parser: failed to read {}: {e}", file.display());
                return Ok(Vec::new());
            }
        };

        let mut imports = Vec::new();
        for line in content.lines() {
            check_cancelled(ct)?;
            if let Some(caps) = import_line.captures(line) {
                let dep = caps[1].trim();
                if !dep.is_empty() {
                    imports.push(dep.to_string());
                }
            }
        }

        Ok(imports)
    }
}

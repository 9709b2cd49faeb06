//! C# using-directive scanner.
//!
//! Keeps only `using` directives inside the project's own root namespace
//! (`using {Project}.X.Y;`, including `using static` and alias forms) and
//! emits the namespace path below the root.

use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;

use arbor_core::{check_cancelled, DependencyParser, ParserOptions, Result};

pub struct CSharpParser {
    using_line: Option<Regex>,
}

impl CSharpParser {
    pub fn new(options: &ParserOptions) -> Self {
        let root = options.base.project_name.trim();
        let using_line = if root.is_empty() {
            None
        } else {
            let pattern = format!(
                r"^\s*using\s+(?:static\s+)?(?:\w+\s*=\s*)?{}\.([A-Za-z_][\w.]*)\s*;",
                regex::escape(root)
            );
            match Regex::new(&pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!("c# parser: bad using pattern: {e}");
                    None
                }
            }
        };
        CSharpParser { using_line }
    }
}

#[async_trait]
impl DependencyParser for CSharpParser {
    async fn parse_file_dependencies(
        &self,
        file: &Path,
        ct: &CancellationToken,
    ) -> Result<Vec<String>> {
        let Some(using_line) = &self.using_line else {
            return Ok(Vec::new());
        };

        let content = match tokio::fs::read_to_string(file).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("c# parser: failed to read {}: {e}", file.display());
                return Ok(Vec::new());
            }
        };

        let mut usings = Vec::new();
        for line in content.lines() {
            check_cancelled(ct)?;
            if let Some(caps) = using_line.captures(line) {
                usings.push(caps[1].to_string());
            }
        }

        Ok(usings)
    }
}

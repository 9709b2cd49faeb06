//! Go import scanner.
//!
//! Handles both single-line imports and `import ( ... )` blocks. Only
//! imports under the project's own module prefix count as internal
//! dependencies; the remainder of the import path becomes a dot-separated
//! identifier.

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use arbor_core::{check_cancelled, DependencyParser, ParserOptions, Result};

pub struct GoParser {
    import_prefix: String,
}

impl GoParser {
    pub fn new(options: &ParserOptions) -> Self {
        let name = options.base.project_name.trim();
        let import_prefix = if name.is_empty() {
            String::new()
        } else {
            format!("{}/", name.trim_end_matches('/'))
        };
        GoParser { import_prefix }
    }

    fn extract_from_line(&self, line: &str, deps: &mut Vec<String>) {
        let Some(first) = line.find('"') else {
            return;
        };
        let Some(second) = line[first + 1..].find('"') else {
            return;
        };
        let import_path = &line[first + 1..first + 1 + second];
        self.add_if_internal(import_path, deps);
    }

    fn add_if_internal(&self, import_path: &str, deps: &mut Vec<String>) {
        let Some(relative) = import_path.strip_prefix(&self.import_prefix) else {
            return;
        };
        if relative.is_empty() {
            return;
        }
        deps.push(relative.replace('/', "."));
    }
}

#[async_trait]
impl DependencyParser for GoParser {
    async fn parse_file_dependencies(
        &self,
        file: &Path,
        ct: &CancellationToken,
    ) -> Result<Vec<String>> {
        // Without a module prefix we cannot decide what is internal.
        if self.import_prefix.is_empty() {
            return Ok(Vec::new());
        }

        let content = match tokio::fs::read_to_string(file).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("go parser: failed to read {}: {e}", file.display());
                return Ok(Vec::new());
            }
        };

        let mut deps = Vec::new();
        let mut inside_block = false;

        for line in content.lines() {
            check_cancelled(ct)?;
            let trimmed = line.trim();

            if !inside_block {
                if !trimmed.starts_with("import") {
                    continue;
                }
                if !trimmed.contains('(') {
                    self.extract_from_line(trimmed, &mut deps);
                    continue;
                }
                inside_block = true;
                self.extract_from_line(trimmed, &mut deps);
                if trimmed.contains(')') {
                    inside_block = false;
                }
            } else if trimmed.starts_with(')') {
                inside_block = false;
            } else {
                self.extract_from_line(trimmed, &mut deps);
            }
        }

        Ok(deps)
    }
}

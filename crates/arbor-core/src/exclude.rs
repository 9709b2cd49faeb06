//! Exclusion rule compiler and matcher.
//!
//! Raw exclusion strings compile into three independent matcher lists:
//! directory prefixes (`"src/legacy/"`, `"Tests/"`), path segments
//! (`"bin"`, `"obj"`, `".git"`), and filename suffixes (`"*.dev.cs"`).
//! A path is excluded if any rule in any list matches.

/// Compiled exclusion rules.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    dir_prefixes: Vec<String>,
    segments: Vec<String>,
    file_suffixes: Vec<String>,
}

impl ExclusionRules {
    /// Compile raw pattern strings. Unparseable patterns never error; any
    /// entry that fits no other class becomes a segment rule.
    pub fn compile<S: AsRef<str>>(raw: &[S]) -> Self {
        let mut rules = ExclusionRules::default();

        for entry in raw {
            let mut pattern = entry.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }

            pattern = pattern.strip_prefix("**/").unwrap_or(pattern);

            let mut norm = pattern.replace('\\', "/");
            // A trailing bare '.' terminates a wildcard suffix literal.
            if norm.ends_with('.') {
                norm.pop();
            }

            if norm.ends_with('/') || norm.contains('/') {
                let mut p = norm.trim_start_matches("./").to_string();
                if !p.ends_with('/') {
                    p.push('/');
                }
                rules.dir_prefixes.push(p);
                continue;
            }

            // Exactly "*." — a single asterisk followed by a dot.
            if norm.starts_with("*.") {
                rules.file_suffixes.push(norm[1..].to_string());
                continue;
            }

            rules.segments.push(norm.trim_start_matches('.').to_string());
        }

        rules
    }

    /// Whether a root-relative path matches any compiled rule.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        let path = rel_path
            .replace('\\', "/")
            .trim_start_matches("./")
            .trim_end_matches('/')
            .to_string();

        let prefixed = format!("{path}/").to_lowercase();
        if self
            .dir_prefixes
            .iter()
            .any(|rule| prefixed.starts_with(&rule.to_lowercase()))
        {
            return true;
        }

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if self.segments.iter().any(|p| matches_suffix_pattern(segment, p)) {
                return true;
            }
        }

        let file_name = path.rsplit('/').next().unwrap_or(&path).to_lowercase();
        self.file_suffixes
            .iter()
            .any(|suffix| file_name.ends_with(&suffix.to_lowercase()))
    }
}

/// Exact match, unless the pattern carries asterisks — then the value must
/// end with the pattern stripped of its leading `*`s.
fn matches_suffix_pattern(value: &str, pattern: &str) -> bool {
    if !pattern.contains('*') {
        return value == pattern;
    }
    value.ends_with(pattern.trim_start_matches('*'))
}

//! Arbor Parsers — per-language dependency extraction
//!
//! Each parser reads one source file and returns the project-internal
//! modules it imports, as dot-separated identifiers relative to the
//! project root. Parsers never fail on unparseable input: they log and
//! return an empty list. Only cancellation is an error.

pub mod csharp;
pub mod go;
pub mod kotlin;


pub use arbor_core::DependencyParser;

use arbor_core::{Language, ParserOptions};

/// One parser per configured language, in configuration order. The graph
/// builder consults every parser for each file and unions the results.
pub fn parsers_for(options: &ParserOptions) -> Vec<Box<dyn DependencyParser>> {
    options
        .languages
        .iter()
        .map(|language| {
            let parser: Box<dyn DependencyParser> = match language {
                Language::CSharp => Box::new(csharp::CSharpParser::new(options)),
                Language::Go => Box::new(go::GoParser::new(options)),
                Language::Kotlin => Box::new(kotlin::KotlinParser::new(options)),
            };
            parser
        })
        .collect()
}

//! PlantUML renderer.
//!
//! Packages nest per the view's recursion depth; edges project each
//! package's aggregated dependency map onto the set of rendered packages.
//! The diff merge re-emits edge lines colored by their fate.

use std::collections::{BTreeMap, BTreeSet};

use arbor_core::{GraphEntity, RenderOptions, View};

use crate::{is_ignored, match_package, package_id, view_scopes, Renderer};

type EdgeCounts = BTreeMap<(String, String), i64>;

pub struct PlantUmlRenderer;

impl Renderer for PlantUmlRenderer {
    fn file_extension(&self) -> &'static str {
        "puml"
    }

    fn render_view(&self, graph: &GraphEntity, view: &View, _options: &RenderOptions) -> String {
        let scopes = view_scopes(graph, view);

        let mut package_names = Vec::new();
        let mut packages = String::new();
        for (entity, depth) in &scopes {
            packages.push_str(&package_tree(entity, view, *depth, &mut package_names));
        }

        let mut edges = EdgeCounts::new();
        for (entity, depth) in &scopes {
            collect_edges(entity, view, *depth, &package_names, &mut edges);
        }

        let mut out = String::new();
        out.push_str("@startuml\n");
        out.push_str("skinparam linetype ortho\n");
        out.push_str("skinparam backgroundColor GhostWhite\n");
        out.push_str(&format!("title {}\n", view.name));
        out.push_str(&packages);
        for ((from, to), count) in &edges {
            out.push_str(&format!("{from}-->{to} : {count}\n"));
        }
        out.push_str("@enduml\n");
        out
    }

    fn merge(&self, local: &str, remote: &str) -> String {
        let local_edges = edges_in_text(local);
        let remote_edges = edges_in_text(remote);

        let mut out = String::new();
        for line in local.lines() {
            if line == "@enduml" {
                break;
            }
            if parse_edge_line(line).is_none() {
                out.push_str(line);
                out.push('\n');
            }
        }

        let keys: BTreeSet<&(String, String)> =
            local_edges.keys().chain(remote_edges.keys()).collect();
        for key in keys {
            let (from, to) = key;
            match (local_edges.get(key), remote_edges.get(key)) {
                (Some(l), None) => out.push_str(&format!("{from}-[#green]->{to} : +{l}\n")),
                (None, Some(r)) => out.push_str(&format!("{from}-[#red]->{to} : -{r}\n")),
                (Some(l), Some(r)) if l == r => out.push_str(&format!("{from}-->{to} : {l}\n")),
                (Some(l), Some(r)) => {
                    out.push_str(&format!("{from}-->{to} : {l} ({:+})\n", l - r))
                }
                (None, None) => {}
            }
        }

        out.push_str("@enduml\n");
        out
    }
}

fn package_tree(entity: &GraphEntity, view: &View, depth: u32, names: &mut Vec<String>) -> String {
    if is_ignored(view, entity) {
        return String::new();
    }

    let alias = package_id(entity);
    names.push(alias.clone());

    let mut block = format!("package \"{}\" as {} {{\n", entity.name(), alias);
    if depth >= 1 {
        for child in entity.children().iter().filter(|c| !c.is_file()) {
            block.push_str(&package_tree(child, view, depth - 1, names));
        }
    }
    block.push_str("}\n");
    block
}

fn collect_edges(
    entity: &GraphEntity,
    view: &View,
    depth: u32,
    names: &[String],
    edges: &mut EdgeCounts,
) {
    if is_ignored(view, entity) {
        return;
    }

    let from = package_id(entity);
    if depth >= 1 {
        for child in entity.children() {
            if child.is_file() {
                project_dependencies(&from, child, names, edges);
            } else {
                collect_edges(child, view, depth - 1, names, edges);
            }
        }
    } else {
        project_dependencies(&from, entity, names, edges);
    }
}

fn project_dependencies(
    from: &str,
    entity: &GraphEntity,
    names: &[String],
    edges: &mut EdgeCounts,
) {
    for (dep, count) in entity.dependencies() {
        let Some(to) = match_package(names, dep) else {
            continue;
        };
        // Dependencies into one's own subtree are not edges.
        if to == from || to.starts_with(&format!("{from}.")) {
            continue;
        }
        *edges
            .entry((from.to_string(), to.to_string()))
            .or_insert(0) += i64::from(*count);
    }
}

fn edges_in_text(text: &str) -> EdgeCounts {
    let mut edges = EdgeCounts::new();
    for line in text.lines() {
        if let Some((from, to, count)) = parse_edge_line(line) {
            *edges.entry((from, to)).or_insert(0) += count;
        }
    }
    edges
}

fn parse_edge_line(line: &str) -> Option<(String, String, i64)> {
    let (from, rest) = line.split_once("-->")?;
    let (to, count) = rest.split_once(" : ")?;
    let from = from.trim();
    let to = to.trim();
    if from.is_empty() || to.is_empty() || from.contains(' ') || to.contains(' ') {
        return None;
    }
    let count = count.trim().parse::<i64>().ok()?;
    Some((from.to_string(), to.to_string(), count))
}

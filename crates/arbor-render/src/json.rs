//! JSON renderer.
//!
//! Emits `{title, packages, edges}` documents for visualization tooling.
//! Each edge carries the file-to-file relations it aggregates. The diff
//! merge rewrites edge states to CREATED/DELETED and annotates count
//! changes.

use std::collections::BTreeMap;

use arbor_core::{path, GraphEntity, RenderOptions, View};
use serde_json::{json, Value};

use crate::{is_ignored, Renderer};

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn render_view(&self, graph: &GraphEntity, view: &View, _options: &RenderOptions) -> String {
        // The packages of the document are the directory children of each
        // focus subtree, or of the root when no focus is configured.
        let scope_roots: Vec<&GraphEntity> = if view.packages.is_empty() {
            vec![graph]
        } else {
            view.packages
                .iter()
                .filter_map(|p| graph.find_by_path(&p.path))
                .collect()
        };

        let mut names = Vec::new();
        let mut packages = Vec::new();
        for root in &scope_roots {
            for child in package_children(root, view) {
                packages.push(json!({"name": child.name(), "state": "NEUTRAL"}));
                names.push(path::dot_separated(child.path()));
            }
        }

        let mut edges = Vec::new();
        for root in &scope_roots {
            for child in package_children(root, view) {
                edges.extend(edges_for_package(child, &names));
            }
        }

        let doc = json!({
            "title": view.name,
            "packages": packages,
            "edges": edges,
        });
        to_pretty(&doc)
    }

    fn merge(&self, local: &str, remote: &str) -> String {
        let Ok(mut local_doc) = serde_json::from_str::<Value>(local) else {
            return local.to_string();
        };
        let Ok(remote_doc) = serde_json::from_str::<Value>(remote) else {
            return local.to_string();
        };

        let local_edges = edge_index(&local_doc);
        let remote_edges = edge_index(&remote_doc);

        let mut merged_edges = Vec::new();
        for (key, edge) in &local_edges {
            let mut edge = edge.clone();
            let count = edge_count(&edge);
            match remote_edges.get(key) {
                None => {
                    edge["state"] = json!("CREATED");
                    edge["label"] = json!(format!("+{count}"));
                }
                Some(remote_edge) => {
                    let delta = count - edge_count(remote_edge);
                    if delta != 0 {
                        edge["label"] = json!(format!("{count} ({delta:+})"));
                    }
                }
            }
            merged_edges.push(edge);
        }
        for (key, edge) in &remote_edges {
            if !local_edges.contains_key(key) {
                let mut edge = edge.clone();
                let count = edge_count(&edge);
                edge["state"] = json!("DELETED");
                edge["label"] = json!(format!("-{count}"));
                merged_edges.push(edge);
            }
        }

        let local_packages = package_index(&local_doc);
        let remote_packages = package_index(&remote_doc);
        let mut merged_packages = Vec::new();
        for (name, package) in &local_packages {
            let mut package = package.clone();
            if !remote_packages.contains_key(name) {
                package["state"] = json!("CREATED");
            }
            merged_packages.push(package);
        }
        for (name, package) in &remote_packages {
            if !local_packages.contains_key(name) {
                let mut package = package.clone();
                package["state"] = json!("DELETED");
                merged_packages.push(package);
            }
        }

        local_doc["packages"] = Value::Array(merged_packages);
        local_doc["edges"] = Value::Array(merged_edges);
        to_pretty(&local_doc)
    }
}

fn package_children<'a>(
    root: &'a GraphEntity,
    view: &'a View,
) -> impl Iterator<Item = &'a GraphEntity> + 'a {
    root.children()
        .iter()
        .filter(move |c| !c.is_file() && !is_ignored(view, c))
}

fn edges_for_package(package: &GraphEntity, names: &[String]) -> Vec<Value> {
    let mut edges = Vec::new();
    for dep in package.dependencies().keys() {
        if !names.iter().any(|n| n == dep) {
            continue;
        }
        let relations = relations_for(package, dep);
        edges.push(json!({
            "state": "NEUTRAL",
            "fromPackage": package.name(),
            "toPackage": dep.rsplit('.').next().unwrap_or(dep),
            "label": relations.len().to_string(),
            "relations": relations,
        }));
    }
    edges
}

/// File-level origins of a package's dependency on `dep`: every leaf in
/// the subtree whose identifiers extend it.
fn relations_for(package: &GraphEntity, dep: &str) -> Vec<Value> {
    let mut relations = Vec::new();
    for entity in package.iter() {
        let GraphEntity::File(leaf) = entity else {
            continue;
        };
        for sub in leaf.dependencies.keys().filter(|s| s.starts_with(dep)) {
            relations.push(json!({
                "from_file": {"name": leaf.name, "path": leaf.path},
                "to_file": {
                    "name": sub.rsplit('.').next().unwrap_or(sub),
                    "path": sub,
                },
            }));
        }
    }
    relations
}

fn edge_index(doc: &Value) -> BTreeMap<(String, String), Value> {
    let mut index = BTreeMap::new();
    if let Some(edges) = doc.get("edges").and_then(Value::as_array) {
        for edge in edges {
            let from = edge.get("fromPackage").and_then(Value::as_str);
            let to = edge.get("toPackage").and_then(Value::as_str);
            if let (Some(from), Some(to)) = (from, to) {
                index.insert((from.to_string(), to.to_string()), edge.clone());
            }
        }
    }
    index
}

fn package_index(doc: &Value) -> BTreeMap<String, Value> {
    let mut index = BTreeMap::new();
    if let Some(packages) = doc.get("packages").and_then(Value::as_array) {
        for package in packages {
            if let Some(name) = package.get("name").and_then(Value::as_str) {
                index.insert(name.to_string(), package.clone());
            }
        }
    }
    index
}

fn edge_count(edge: &Value) -> i64 {
    edge.get("label")
        .and_then(Value::as_str)
        .and_then(|label| {
            label
                .trim_start_matches(['+', '-'])
                .split_whitespace()
                .next()
                .and_then(|n| n.parse::<i64>().ok())
        })
        .unwrap_or(0)
}

fn to_pretty(doc: &Value) -> String {
    match serde_json::to_string_pretty(doc) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("failed to serialize rendered view: {e}");
            "{}".to_string()
        }
    }
}

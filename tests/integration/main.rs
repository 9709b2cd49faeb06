//! Integration tests for Arbor
//!
//! Drive the full pipeline — scan, detect, build, persist, re-run — on a
//! real temporary Go project, the way `arbor update` wires it together.

use std::fs;
use std::path::Path;

use arbor_core::{
    project_changes, BaseOptions, CancellationToken, GraphBuilder, GraphEntity, Language,
    LocalSnapshotStore, ParserOptions, RenderFormat, RenderOptions, SnapshotBackend,
    SnapshotOptions, SnapshotStore, View,
};
use arbor_render::{renderer_for, Renderer};
use tempfile::TempDir;

const PROJECT: &str = "shop";

fn base_options(root: &Path) -> BaseOptions {
    BaseOptions {
        full_root_path: root.to_path_buf(),
        project_root: root.display().to_string(),
        project_name: PROJECT.to_string(),
    }
}

fn parser_options(root: &Path) -> ParserOptions {
    ParserOptions {
        base: base_options(root),
        languages: vec![Language::Go],
        exclusions: vec!["vendor".to_string()],
        file_extensions: vec![".go".to_string()],
    }
}

fn snapshot_options(root: &Path) -> SnapshotOptions {
    SnapshotOptions {
        base: base_options(root),
        backend: SnapshotBackend::Local,
        snapshot_dir: ".arbor".to_string(),
        snapshot_file: "snapshot.json".to_string(),
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let full = root.join(rel);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
}

fn seed_project(root: &Path) {
    write(
        root,
        "cart/cart.go",
        "package cart\n\nimport (\n\t\"fmt\"\n\t\"shop/pricing\"\n)\n",
    );
    write(
        root,
        "cart/checkout/checkout.go",
        "package checkout\n\nimport \"shop/pricing\"\n",
    );
    write(root, "pricing/pricing.go", "package pricing\n");
    write(
        root,
        "vendor/lib/lib.go",
        "package lib\n\nimport \"shop/pricing\"\n",
    );
}

async fn run_pipeline(root: &Path, save: bool) -> GraphEntity {
    let ct = CancellationToken::new();
    let parser_opts = parser_options(root);
    let snapshot_opts = snapshot_options(root);

    let snapshot = LocalSnapshotStore
        .load(&snapshot_opts, &ct)
        .await
        .unwrap();
    let changes = project_changes(&parser_opts, snapshot.as_ref(), &ct).unwrap();

    let parsers = arbor_parsers::parsers_for(&parser_opts);
    let builder = GraphBuilder::new(&parsers, &parser_opts.base);
    let graph = builder.build(&changes, snapshot, &ct).await.unwrap();

    if save {
        LocalSnapshotStore
            .save(&graph, &snapshot_opts, &ct)
            .await
            .unwrap();
    }
    graph
}

#[tokio::test]
async fn first_run_builds_the_full_graph() {
    let dir = TempDir::new().unwrap();
    seed_project(dir.path());

    let graph = run_pipeline(dir.path(), true).await;

    assert_eq!(graph.name(), PROJECT);
    assert!(graph.contains_path("./cart/cart.go"));
    assert!(graph.contains_path("./cart/checkout/checkout.go"));
    assert!(graph.contains_path("./pricing/pricing.go"));
    // Excluded directory never enters the graph.
    assert!(!graph.contains_path("./vendor/lib/lib.go"));

    // Parsed dependencies and their aggregates.
    let cart_leaf = graph.find_by_path("./cart/cart.go").unwrap();
    assert_eq!(cart_leaf.dependencies().get("pricing"), Some(&1));
    let cart_dir = graph.find_by_path("./cart/").unwrap();
    assert_eq!(cart_dir.dependencies().get("pricing"), Some(&2));
}

#[tokio::test]
async fn second_run_with_no_changes_reports_nothing() {
    let dir = TempDir::new().unwrap();
    seed_project(dir.path());

    let first = run_pipeline(dir.path(), true).await;

    let ct = CancellationToken::new();
    let parser_opts = parser_options(dir.path());
    let snapshot = LocalSnapshotStore
        .load(&snapshot_options(dir.path()), &ct)
        .await
        .unwrap();
    assert!(snapshot.is_some());

    let changes = project_changes(&parser_opts, snapshot.as_ref(), &ct).unwrap();
    assert!(changes.is_empty());

    // Building from an empty change set leaves the graph equivalent.
    let second = run_pipeline(dir.path(), false).await;
    let paths = |g: &GraphEntity| -> Vec<String> {
        g.iter().map(|e| e.path().to_lowercase()).collect()
    };
    let mut p1 = paths(&first);
    let mut p2 = paths(&second);
    p1.sort();
    p2.sort();
    assert_eq!(p1, p2);
}

#[tokio::test]
async fn reparsed_file_replaces_its_dependency_map() {
    let dir = TempDir::new().unwrap();
    seed_project(dir.path());
    run_pipeline(dir.path(), true).await;

    // Rewrite cart.go with a different import set and a strictly newer
    // mtime (the snapshot recorded whole seconds).
    write(
        dir.path(),
        "cart/cart.go",
        "package cart\n\nimport \"shop/inventory\"\n",
    );
    write(dir.path(), "inventory/inventory.go", "package inventory\n");
    let file = dir.path().join("cart/cart.go");
    let newer = std::time::SystemTime::now() + std::time::Duration::from_secs(5);
    fs::File::options()
        .write(true)
        .open(&file)
        .unwrap()
        .set_modified(newer)
        .unwrap();

    let graph = run_pipeline(dir.path(), true).await;

    let cart_leaf = graph.find_by_path("./cart/cart.go").unwrap();
    assert_eq!(cart_leaf.dependencies().get("inventory"), Some(&1));
    assert!(!cart_leaf.dependencies().contains_key("pricing"));

    // Aggregates follow: checkout.go still contributes pricing.
    let cart_dir = graph.find_by_path("./cart/").unwrap();
    assert_eq!(cart_dir.dependencies().get("pricing"), Some(&1));
    assert_eq!(cart_dir.dependencies().get("inventory"), Some(&1));
}

#[tokio::test]
async fn deleted_directory_disappears_from_the_graph() {
    let dir = TempDir::new().unwrap();
    seed_project(dir.path());
    run_pipeline(dir.path(), true).await;

    fs::remove_dir_all(dir.path().join("cart/checkout")).unwrap();

    let ct = CancellationToken::new();
    let snapshot = LocalSnapshotStore
        .load(&snapshot_options(dir.path()), &ct)
        .await
        .unwrap();
    let changes = project_changes(&parser_options(dir.path()), snapshot.as_ref(), &ct).unwrap();
    assert_eq!(
        changes.deleted_directories,
        vec!["./cart/checkout/".to_string()]
    );
    assert!(changes.deleted_files.is_empty());

    let graph = run_pipeline(dir.path(), true).await;
    assert!(!graph.contains_path("./cart/checkout/"));
    assert!(!graph.contains_path("./cart/checkout/checkout.go"));
    assert!(graph.contains_path("./cart/cart.go"));

    // Aggregates no longer count the deleted leaf.
    let cart_dir = graph.find_by_path("./cart/").unwrap();
    assert_eq!(cart_dir.dependencies().get("pricing"), Some(&1));
}

#[tokio::test]
async fn untouched_subtrees_survive_incremental_updates() {
    let dir = TempDir::new().unwrap();
    seed_project(dir.path());
    run_pipeline(dir.path(), true).await;

    // Add a new module; everything else is untouched.
    write(
        dir.path(),
        "billing/billing.go",
        "package billing\n\nimport \"shop/pricing\"\n",
    );

    let graph = run_pipeline(dir.path(), true).await;
    assert!(graph.contains_path("./billing/billing.go"));
    assert!(graph.contains_path("./cart/checkout/checkout.go"));
    assert!(graph.contains_path("./pricing/pricing.go"));
}

#[tokio::test]
async fn corrupt_snapshot_degrades_to_first_run() {
    let dir = TempDir::new().unwrap();
    seed_project(dir.path());
    run_pipeline(dir.path(), true).await;

    let snapshot_file = dir.path().join(".arbor/snapshot.json");
    fs::write(&snapshot_file, "definitely not json").unwrap();

    let graph = run_pipeline(dir.path(), true).await;
    assert!(graph.contains_path("./cart/cart.go"));
    assert!(graph.contains_path("./pricing/pricing.go"));
}

#[tokio::test]
async fn rendered_view_reflects_the_built_graph() {
    let dir = TempDir::new().unwrap();
    seed_project(dir.path());
    let graph = run_pipeline(dir.path(), true).await;

    let options = RenderOptions {
        base: base_options(dir.path()),
        format: RenderFormat::PlantUml,
        views: vec![View {
            name: "architecture".to_string(),
            packages: Vec::new(),
            ignore_packages: Vec::new(),
        }],
        save_location: dir.path().join("views"),
    };

    let renderer = renderer_for(options.format);
    let text = renderer.render_view(&graph, &options.views[0], &options);
    assert!(text.contains("package \"cart\" as cart {"));
    assert!(text.contains("cart-->pricing : 2"));
}

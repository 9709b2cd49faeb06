//! CLI command implementations

use std::path::PathBuf;

use arbor_core::{project_changes, CancellationToken, GraphBuilder};
use arbor_render::{render_diff_views_to_files, render_views_to_files, renderer_for};

use crate::config;

/// Cancellation token cancelled on ctrl-c.
fn interruptible_token() -> CancellationToken {
    let ct = CancellationToken::new();
    let signal_ct = ct.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; stopping");
            signal_ct.cancel();
        }
    });
    ct
}

/// Incremental update: detect changes, rebuild the affected subtrees,
/// render all views, persist the snapshot.
pub async fn update(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let options = config::load(config_path).await?;
    let ct = interruptible_token();

    let store = arbor_core::store_for(options.snapshot.backend)?;
    let snapshot = store.load(&options.snapshot, &ct).await?;
    let first_run = snapshot.is_none();

    let changes = project_changes(&options.parser, snapshot.as_ref(), &ct)?;
    tracing::info!(
        "{} changed directories, {} deleted files, {} deleted directories{}",
        changes.changed_files_by_directory.len(),
        changes.deleted_files.len(),
        changes.deleted_directories.len(),
        if first_run { " (first run)" } else { "" },
    );

    let parsers = arbor_parsers::parsers_for(&options.parser);
    let builder = GraphBuilder::new(&parsers, &options.base);
    let graph = builder.build(&changes, snapshot, &ct).await?;

    let renderer = renderer_for(options.render.format);
    render_views_to_files(renderer.as_ref(), &graph, &options.render).await?;

    store.save(&graph, &options.snapshot, &ct).await?;
    tracing::info!("update complete");
    Ok(())
}

/// Render diff views of the freshly built graph against the saved
/// snapshot. The snapshot is left untouched so the baseline survives.
pub async fn diff(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let options = config::load(config_path).await?;
    let ct = interruptible_token();

    let store = arbor_core::store_for(options.snapshot.backend)?;
    let snapshot = store.load(&options.snapshot, &ct).await?;

    let changes = project_changes(&options.parser, snapshot.as_ref(), &ct)?;
    let parsers = arbor_parsers::parsers_for(&options.parser);
    let builder = GraphBuilder::new(&parsers, &options.base);

    let renderer = renderer_for(options.render.format);
    match snapshot {
        Some(previous) => {
            let graph = builder.build(&changes, Some(previous.clone()), &ct).await?;
            render_diff_views_to_files(renderer.as_ref(), &graph, &previous, &options.render)
                .await?;
        }
        None => {
            tracing::warn!("no snapshot to diff against; rendering plain views");
            let graph = builder.build(&changes, None, &ct).await?;
            render_views_to_files(renderer.as_ref(), &graph, &options.render).await?;
        }
    }

    tracing::info!("diff complete");
    Ok(())
}

/// Remove the snapshot directory.
pub async fn clear(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let options = config::load(config_path).await?;
    let snapshot_dir = options
        .base
        .full_root_path
        .join(&options.snapshot.snapshot_dir);

    match tokio::fs::remove_dir_all(&snapshot_dir).await {
        Ok(()) => tracing::info!("removed {}", snapshot_dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("nothing to clear at {}", snapshot_dir.display());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

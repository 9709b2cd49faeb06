//! Snapshot persistence.
//!
//! The snapshot is the merge/diff baseline for the next run. An
//! unreadable or malformed snapshot is never fatal: it degrades to
//! first-run semantics.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::builder::upsert_child;
use crate::error::{check_cancelled, Result};
use crate::model::GraphEntity;
use crate::options::{SnapshotBackend, SnapshotOptions};

/// Default snapshot directory name.
pub const SNAPSHOT_DIR: &str = ".arbor";

/// Default snapshot file name.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEnvelope {
    version: String,
    generated_at: DateTime<Utc>,
    graph: GraphEntity,
}

/// Load/save contract for snapshot backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// The previous run's graph, or `None` when there is no usable
    /// snapshot.
    async fn load(
        &self,
        options: &SnapshotOptions,
        ct: &CancellationToken,
    ) -> Result<Option<GraphEntity>>;

    /// Persist `graph` as the baseline for the next run.
    async fn save(
        &self,
        graph: &GraphEntity,
        options: &SnapshotOptions,
        ct: &CancellationToken,
    ) -> Result<()>;
}

/// Select the store for the configured backend.
pub fn store_for(backend: SnapshotBackend) -> Result<Box<dyn SnapshotStore>> {
    match backend {
        SnapshotBackend::Local => Ok(Box::new(LocalSnapshotStore)),
        SnapshotBackend::Git => Err(crate::error::Error::Config(
            "the git snapshot backend is not available in this build; use \"local\"".to_string(),
        )),
    }
}

/// Snapshot file under the project root.
pub struct LocalSnapshotStore;

impl LocalSnapshotStore {
    fn snapshot_path(options: &SnapshotOptions) -> PathBuf {
        options
            .base
            .full_root_path
            .join(&options.snapshot_dir)
            .join(&options.snapshot_file)
    }
}

#[async_trait]
impl SnapshotStore for LocalSnapshotStore {
    async fn load(
        &self,
        options: &SnapshotOptions,
        ct: &CancellationToken,
    ) -> Result<Option<GraphEntity>> {
        check_cancelled(ct)?;

        let file = Self::snapshot_path(options);
        let json = match tokio::fs::read_to_string(&file).await {
            Ok(json) => json,
            Err(_) => {
                tracing::debug!("no snapshot at {}", file.display());
                return Ok(None);
            }
        };

        let envelope: SnapshotEnvelope = match serde_json::from_str(&json) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(
                    "malformed snapshot at {}: {e}; treating as absent",
                    file.display()
                );
                return Ok(None);
            }
        };

        if envelope.graph.is_file() {
            tracing::warn!("snapshot root is not a directory; treating as absent");
            return Ok(None);
        }

        tracing::debug!("loaded snapshot from {}", file.display());
        Ok(Some(envelope.graph))
    }

    async fn save(
        &self,
        graph: &GraphEntity,
        options: &SnapshotOptions,
        ct: &CancellationToken,
    ) -> Result<()> {
        check_cancelled(ct)?;

        let file = Self::snapshot_path(options);
        if let Some(dir) = file.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        // Fold the new graph into an existing on-disk snapshot when one
        // parses; a corrupt prior copy is simply overwritten.
        let merged = match self.load(options, ct).await? {
            Some(GraphEntity::Directory(mut existing_root)) => {
                if let GraphEntity::Directory(new_root) = graph.clone() {
                    for child in new_root.children {
                        upsert_child(&mut existing_root, child);
                    }
                    GraphEntity::Directory(existing_root)
                } else {
                    graph.clone()
                }
            }
            _ => graph.clone(),
        };

        let envelope = SnapshotEnvelope {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
            graph: merged,
        };

        let json = serde_json::to_string_pretty(&envelope)?;
        tokio::fs::write(&file, json).await?;
        tracing::debug!("snapshot saved to {}", file.display());
        Ok(())
    }
}

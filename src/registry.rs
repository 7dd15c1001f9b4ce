//! Run registry: id allocation, metadata lifecycle, and run listing.
//!
//! Run ids are `YYYYMMDD_HHMMSS_<topic-slug>` so a plain lexicographic sort of
//! the runs directory is creation order. The registry is the only component
//! that writes `meta.json`, and every status change is validated against the
//! state machine before it is persisted.

use chrono::Utc;

use crate::errors::PipelineError;
use crate::models::{Brief, Platform, RunMeta};
use crate::state::{self, RunStatus};
use crate::store::ArtifactStore;

pub const META_ARTIFACT: &str = "meta.json";

const SLUG_MAX_LEN: usize = 60;

/// Convert a topic to a filesystem-safe slug, limited to `max_len` characters.
pub fn slugify(topic: &str, max_len: usize) -> String {
    let slug: String = topic
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let truncated: String = slug.chars().take(max_len).collect();
    truncated.trim_end_matches('-').to_string()
}

/// Filter for [`RunRegistry::list`].
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub status: Option<RunStatus>,
    pub platform: Option<Platform>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RunRegistry {
    store: ArtifactStore,
}

impl RunRegistry {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// Allocate a fresh run id, create its workspace, and persist initial
    /// metadata with status `created`.
    ///
    /// Two runs created within the same second for the same topic get a
    /// numeric suffix rather than a collision.
    pub fn create(&self, brief: &Brief) -> Result<RunMeta, PipelineError> {
        let ts = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let slug = slugify(&brief.topic, SLUG_MAX_LEN);
        let base = if slug.is_empty() {
            ts
        } else {
            format!("{ts}_{slug}")
        };

        let mut run_id = base.clone();
        let mut attempt = 1u32;
        loop {
            match self.store.create_workspace(&run_id) {
                Ok(_) => break,
                Err(PipelineError::Io { source, .. })
                    if source.kind() == std::io::ErrorKind::AlreadyExists && attempt < 100 =>
                {
                    attempt += 1;
                    run_id = format!("{base}_{attempt}");
                }
                Err(e) => return Err(e),
            }
        }

        let meta = RunMeta::new(run_id, brief);
        self.save_meta(&meta)?;
        Ok(meta)
    }

    /// Resolve a user-supplied run reference: exact id first, then newest run
    /// whose id starts with the given prefix.
    pub fn resolve(&self, reference: &str) -> Result<String, PipelineError> {
        if self.store.run_dir(reference).is_dir() {
            return Ok(reference.to_string());
        }
        self.run_ids_newest_first()?
            .into_iter()
            .find(|id| id.starts_with(reference))
            .ok_or_else(|| PipelineError::RunNotFound(reference.to_string()))
    }

    pub fn get_meta(&self, run_id: &str) -> Result<RunMeta, PipelineError> {
        self.store
            .get_json(run_id, META_ARTIFACT)
            .map_err(|e| match e {
                PipelineError::ArtifactNotFound { run_id, .. } => {
                    PipelineError::RunNotFound(run_id)
                }
                other => other,
            })
    }

    pub fn save_meta(&self, meta: &RunMeta) -> Result<(), PipelineError> {
        self.store.put_json(&meta.run_id, META_ARTIFACT, meta)
    }

    /// Move a run to `new_status`, validating the edge against the state
    /// machine. Self-edges are allowed and just refresh `updated_at`.
    pub fn update_status(
        &self,
        meta: &mut RunMeta,
        new_status: RunStatus,
    ) -> Result<(), PipelineError> {
        if !state::transition_allowed(meta.status, new_status) {
            return Err(PipelineError::InvalidStatusChange {
                run_id: meta.run_id.clone(),
                from: meta.status,
                to: new_status,
            });
        }
        meta.status = new_status;
        meta.touch();
        self.save_meta(meta)
    }

    /// List runs newest first, optionally filtered by status or platform.
    /// Directories without a readable `meta.json` are skipped.
    pub fn list(&self, filter: &RunFilter) -> Result<Vec<RunMeta>, PipelineError> {
        let mut metas = Vec::new();
        for run_id in self.run_ids_newest_first()? {
            let Ok(meta) = self.get_meta(&run_id) else {
                tracing::debug!(run_id, "skipping run without readable meta.json");
                continue;
            };
            if filter.status.is_some_and(|status| meta.status != status) {
                continue;
            }
            if filter
                .platform
                .is_some_and(|platform| !meta.platform_targets.contains(&platform))
            {
                continue;
            }
            metas.push(meta);
            if filter.limit.is_some_and(|limit| metas.len() >= limit) {
                break;
            }
        }
        Ok(metas)
    }

    fn run_ids_newest_first(&self) -> Result<Vec<String>, PipelineError> {
        let root = self.store.root();
        if !root.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(root)
            .map_err(|e| PipelineError::io(format!("read {}", root.display()), e))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| PipelineError::io(format!("read {}", root.display()), e))?;
            if entry.path().is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        ids.reverse();
        Ok(ids)
    }
}

//! Filesystem-backed artifact store, one workspace directory per run.
//!
//! Writes go through a temp file in the destination directory followed by an
//! atomic rename, so a crash mid-write never leaves a corrupt or partial
//! artifact visible to readers. Artifact names are workspace-relative paths
//! (`meta.json`, `linkedin.md`, `prompts/linkedin_render.txt`); the store
//! knows nothing about their schemas.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::errors::PipelineError;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(run_id)
    }

    /// Create the workspace directory for a new run. Fails if it already
    /// exists so the registry can detect id collisions.
    pub fn create_workspace(&self, run_id: &str) -> Result<PathBuf, PipelineError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| PipelineError::io(format!("create {}", self.root.display()), e))?;
        let dir = self.run_dir(run_id);
        fs::create_dir(&dir)
            .map_err(|e| PipelineError::io(format!("create {}", dir.display()), e))?;
        Ok(dir)
    }

    /// Write an artifact durably: temp file in the destination directory,
    /// flushed, then renamed over the target.
    pub fn put_bytes(&self, run_id: &str, name: &str, bytes: &[u8]) -> Result<(), PipelineError> {
        let path = self.run_dir(run_id).join(name);
        let parent = path
            .parent()
            .ok_or_else(|| {
                PipelineError::io(
                    format!("resolve parent of {}", path.display()),
                    std::io::Error::other("artifact path has no parent"),
                )
            })?
            .to_path_buf();
        fs::create_dir_all(&parent)
            .map_err(|e| PipelineError::io(format!("create {}", parent.display()), e))?;

        let mut tmp = NamedTempFile::new_in(&parent)
            .map_err(|e| PipelineError::io(format!("create temp file in {}", parent.display()), e))?;
        tmp.write_all(bytes)
            .map_err(|e| PipelineError::io(format!("write {}", path.display()), e))?;
        tmp.flush()
            .map_err(|e| PipelineError::io(format!("flush {}", path.display()), e))?;
        tmp.persist(&path)
            .map_err(|e| PipelineError::io(format!("persist {}", path.display()), e.error))?;
        Ok(())
    }

    pub fn put_text(&self, run_id: &str, name: &str, text: &str) -> Result<(), PipelineError> {
        self.put_bytes(run_id, name, text.as_bytes())
    }

    pub fn put_json<T: Serialize>(
        &self,
        run_id: &str,
        name: &str,
        value: &T,
    ) -> Result<(), PipelineError> {
        let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| {
            PipelineError::io(format!("serialize {name}"), std::io::Error::other(e))
        })?;
        bytes.push(b'\n');
        self.put_bytes(run_id, name, &bytes)
    }

    pub fn get_bytes(&self, run_id: &str, name: &str) -> Result<Vec<u8>, PipelineError> {
        let path = self.run_dir(run_id).join(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PipelineError::ArtifactNotFound {
                    run_id: run_id.to_string(),
                    name: name.to_string(),
                })
            }
            Err(e) => Err(PipelineError::io(format!("read {}", path.display()), e)),
        }
    }

    pub fn get_text(&self, run_id: &str, name: &str) -> Result<String, PipelineError> {
        let bytes = self.get_bytes(run_id, name)?;
        String::from_utf8(bytes).map_err(|e| {
            PipelineError::io(
                format!("decode {name} as UTF-8"),
                std::io::Error::other(e),
            )
        })
    }

    pub fn get_json<T: DeserializeOwned>(
        &self,
        run_id: &str,
        name: &str,
    ) -> Result<T, PipelineError> {
        let bytes = self.get_bytes(run_id, name)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            PipelineError::io(format!("parse {name}"), std::io::Error::other(e))
        })
    }

    pub fn exists(&self, run_id: &str, name: &str) -> bool {
        self.run_dir(run_id).join(name).is_file()
    }

    /// Top-level artifact names present in the run workspace, sorted.
    pub fn list(&self, run_id: &str) -> Result<Vec<String>, PipelineError> {
        let dir = self.run_dir(run_id);
        if !dir.is_dir() {
            return Err(PipelineError::RunNotFound(run_id.to_string()));
        }
        let entries = fs::read_dir(&dir)
            .map_err(|e| PipelineError::io(format!("read {}", dir.display()), e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| PipelineError::io(format!("read {}", dir.display()), e))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatchRecord;
    use chrono::Utc;
    use tempfile::TempDir;

    fn store() -> (TempDir, ArtifactStore) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("runs"));
        (dir, store)
    }

    #[test]
    fn json_round_trip() {
        let (_guard, store) = store();
        store.create_workspace("run_a").unwrap();
        let record = PatchRecord {
            from_version: 1,
            to_version: 2,
            directive: "shorten intro".into(),
            model: "gpt-4o-mini".into(),
            changelog: "tightened the opening".into(),
            created_at: Utc::now(),
        };
        store.put_json("run_a", "linkedin_changelog.json", &vec![record.clone()]).unwrap();
        let back: Vec<PatchRecord> = store.get_json("run_a", "linkedin_changelog.json").unwrap();
        assert_eq!(back, vec![record]);
    }

    #[test]
    fn text_round_trip_and_overwrite() {
        let (_guard, store) = store();
        store.create_workspace("run_a").unwrap();
        store.put_text("run_a", "linkedin.md", "first body\n").unwrap();
        store.put_text("run_a", "linkedin.md", "second body\n").unwrap();
        assert_eq!(store.get_text("run_a", "linkedin.md").unwrap(), "second body\n");
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let (_guard, store) = store();
        store.create_workspace("run_a").unwrap();
        let err = store.get_text("run_a", "core.json").unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactNotFound { .. }));
    }

    #[test]
    fn first_write_creates_nested_dirs() {
        let (_guard, store) = store();
        store.create_workspace("run_a").unwrap();
        store
            .put_text("run_a", "prompts/linkedin_render.txt", "system prompt")
            .unwrap();
        assert!(store.exists("run_a", "prompts/linkedin_render.txt"));
    }

    #[test]
    fn list_returns_sorted_top_level_names() {
        let (_guard, store) = store();
        store.create_workspace("run_a").unwrap();
        store.put_text("run_a", "linkedin.md", "b").unwrap();
        store.put_text("run_a", "brief.json", "{}").unwrap();
        assert_eq!(
            store.list("run_a").unwrap(),
            vec!["brief.json".to_string(), "linkedin.md".to_string()]
        );
    }

    #[test]
    fn workspace_collision_is_an_error() {
        let (_guard, store) = store();
        store.create_workspace("run_a").unwrap();
        assert!(store.create_workspace("run_a").is_err());
    }
}

//! On-disk artifacts for pipeline runs.
//!
//! Each run writes a JSON result under `runs/` and, when an article was
//! produced, its markdown under `articles/`.

use anyhow::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::GeneratedArticle;
use crate::orchestrator::PipelineResult;

/// Writes run results and article markdown to an output directory.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at a directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the run result as pretty JSON. Returns the file path.
    pub fn save_result(&self, result: &PipelineResult) -> Result<PathBuf> {
        let dir = self.root.join("runs");
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.json", result.id));
        std::fs::write(&path, serde_json::to_string_pretty(result)?)?;
        Ok(path)
    }

    /// Load a run result by ID.
    pub fn load_result(&self, id: Uuid) -> Result<PipelineResult> {
        let path = self.root.join("runs").join(format!("{id}.json"));
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the article markdown under its slug. Returns the file path.
    pub fn save_article(&self, article: &GeneratedArticle) -> Result<PathBuf> {
        let dir = self.root.join("articles");
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.md", article.slug));
        std::fs::write(&path, &article.content_markdown)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PipelineStatus;
    use chrono::Utc;

    fn result() -> PipelineResult {
        PipelineResult {
            id: Uuid::new_v4(),
            status: PipelineStatus::Completed,
            topic: None,
            article: None,
            fact_check: None,
            publish: None,
            errors: Vec::new(),
            llm_cost_usd: 0.12,
            total_tokens: 3400,
            started_at: Utc::now(),
            duration_ms: 1500,
        }
    }

    #[test]
    fn test_save_and_load_result() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let result = result();
        let path = store.save_result(&result).unwrap();
        assert!(path.exists());

        let loaded = store.load_result(result.id).unwrap();
        assert_eq!(loaded.id, result.id);
        assert_eq!(loaded.status, PipelineStatus::Completed);
        assert_eq!(loaded.total_tokens, 3400);
    }

    #[test]
    fn test_missing_result_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(store.load_result(Uuid::new_v4()).is_err());
    }
}

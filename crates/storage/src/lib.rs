use async_trait::async_trait;
use pdfrender_core::RenderOutput;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use tracing::debug;

/// Where a finished render ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifacts {
    pub pdf: PathBuf,
    pub summaries: PathBuf,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn save(&self, name: &str, output: &RenderOutput) -> Result<SavedArtifacts>;
}

/// Writes `<name>.pdf` and `<name>.json` into one folder.
pub struct FsArtifactStore {
    pub folder: PathBuf,
}

impl FsArtifactStore {
    pub fn new(folder: impl AsRef<Path>) -> Result<Self> {
        let folder = folder.as_ref().to_path_buf();
        std::fs::create_dir_all(&folder)
            .with_context(|| format!("Failed to create output folder {}", folder.display()))?;
        Ok(Self { folder })
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn save(&self, name: &str, output: &RenderOutput) -> Result<SavedArtifacts> {
        let pdf = self.folder.join(format!("{}.pdf", name));
        let summaries = self.folder.join(format!("{}.json", name));
        tokio::fs::write(&pdf, &output.pdf)
            .await
            .with_context(|| format!("Failed to write {}", pdf.display()))?;
        tokio::fs::write(&summaries, &output.summaries_json)
            .await
            .with_context(|| format!("Failed to write {}", summaries.display()))?;
        debug!(pdf = %pdf.display(), summaries = %summaries.display(), "artifacts saved");
        Ok(SavedArtifacts { pdf, summaries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_pdf_and_summaries_side_by_side() {
        let temp = tempdir().unwrap();
        let store = FsArtifactStore::new(temp.path().join("out")).unwrap();
        let output = RenderOutput {
            summaries_json: br#"[{"url":"https://example.com/a.js","status":200,"statusText":"OK"}]"#.to_vec(),
            pdf: b"%PDF-1.4".to_vec(),
        };

        let saved = store.save("report", &output).await.unwrap();

        assert_eq!(saved.pdf, temp.path().join("out").join("report.pdf"));
        assert_eq!(std::fs::read(&saved.pdf).unwrap(), output.pdf);
        assert_eq!(std::fs::read(&saved.summaries).unwrap(), output.summaries_json);
    }

    #[tokio::test]
    async fn overwrites_previous_render() {
        let temp = tempdir().unwrap();
        let store = FsArtifactStore::new(temp.path()).unwrap();
        let first = RenderOutput { summaries_json: b"[]".to_vec(), pdf: b"first".to_vec() };
        let second = RenderOutput { summaries_json: b"[]".to_vec(), pdf: b"second".to_vec() };

        store.save("page", &first).await.unwrap();
        let saved = store.save("page", &second).await.unwrap();

        assert_eq!(std::fs::read(saved.pdf).unwrap(), b"second");
    }
}

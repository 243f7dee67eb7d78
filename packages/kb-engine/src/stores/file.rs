//! Filesystem-backed stores.
//!
//! Both stores rewrite whole files through a temp file and rename, so a crash
//! mid-write leaves the previous version intact.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::memory::MemoryIndex;
use crate::error::{EngineError, Result};
use crate::traits::artifacts::ArtifactStore;
use crate::traits::store::{IndexRecord, VectorIndex};
use crate::types::{chunk::Chunk, faq::FaqReport, summary::SectionSummaries};

/// Default logical collection name.
pub const DEFAULT_COLLECTION: &str = "knowledge_base";

const FAQ_FILE: &str = "faqs.json";
const EXECUTIVE_SUMMARY_FILE: &str = "executive_summary.txt";
const SECTION_SUMMARIES_FILE: &str = "summaries.json";

/// Write `bytes` to `path` atomically.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[derive(Serialize, Deserialize)]
struct CollectionFile {
    collection: String,
    records: Vec<IndexRecord>,
}

/// Vector index persisted as `<dir>/<collection>.json`.
///
/// Queries are served from memory; every mutation rewrites the file.
pub struct FileIndex {
    inner: MemoryIndex,
    path: PathBuf,
    collection: String,
}

impl FileIndex {
    /// Open (or create) a collection under `dir`.
    pub async fn open(dir: impl AsRef<Path>, collection: impl Into<String>) -> Result<Self> {
        let collection = collection.into();
        let path = dir.as_ref().join(format!("{}.json", collection));

        let inner = match read_optional(&path).await? {
            Some(bytes) => {
                let file: CollectionFile = serde_json::from_slice(&bytes)?;
                if file.collection != collection {
                    return Err(EngineError::Storage(format!(
                        "{} holds collection '{}', expected '{}'",
                        path.display(),
                        file.collection,
                        collection
                    )));
                }
                info!(path = %path.display(), chunks = file.records.len(), "Loaded vector index");
                MemoryIndex::from_records(file.records)
            }
            None => MemoryIndex::new(),
        };

        Ok(Self {
            inner,
            path,
            collection,
        })
    }

    /// Where the collection is persisted.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `records` to disk, then make them the live set.
    ///
    /// Memory is left untouched when the write fails.
    async fn commit(&self, records: IndexMap<String, IndexRecord>) -> Result<()> {
        let file = CollectionFile {
            collection: self.collection.clone(),
            records: records.values().cloned().collect(),
        };
        write_atomic(&self.path, &serde_json::to_vec(&file)?).await?;
        debug!(path = %self.path.display(), chunks = file.records.len(), "Persisted vector index");

        self.inner.replace(records);
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for FileIndex {
    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<()> {
        self.commit(self.inner.upserted(records)).await
    }

    async fn delete_source(&self, source_id: &str) -> Result<usize> {
        let (remaining, removed) = self.inner.without_source(source_id);
        if removed > 0 {
            self.commit(remaining).await?;
        }
        Ok(removed)
    }

    async fn get_all(&self) -> Result<Vec<Chunk>> {
        self.inner.get_all().await
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>> {
        Ok(self.inner.query_sync(vector, k))
    }

    async fn len(&self) -> Result<usize> {
        self.inner.len().await
    }
}

/// Artifacts written to fixed files under a data directory.
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn faq_path(&self) -> PathBuf {
        self.dir.join(FAQ_FILE)
    }

    pub fn executive_summary_path(&self) -> PathBuf {
        self.dir.join(EXECUTIVE_SUMMARY_FILE)
    }

    pub fn section_summaries_path(&self) -> PathBuf {
        self.dir.join(SECTION_SUMMARIES_FILE)
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn save_faq_report(&self, report: &FaqReport) -> Result<()> {
        write_atomic(&self.faq_path(), &serde_json::to_vec_pretty(report)?).await
    }

    async fn load_faq_report(&self) -> Result<Option<FaqReport>> {
        match read_optional(&self.faq_path()).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save_executive_summary(&self, summary: &str) -> Result<()> {
        write_atomic(&self.executive_summary_path(), summary.as_bytes()).await
    }

    async fn load_executive_summary(&self) -> Result<Option<String>> {
        Ok(read_optional(&self.executive_summary_path())
            .await?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    async fn load_section_summaries(&self) -> Result<SectionSummaries> {
        match read_optional(&self.section_summaries_path()).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(SectionSummaries::new()),
        }
    }

    async fn save_section_summaries(&self, summaries: &SectionSummaries) -> Result<()> {
        write_atomic(
            &self.section_summaries_path(),
            &serde_json::to_vec_pretty(summaries)?,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::faq::{AnswerMode, FaqItem, TopicFaqs};

    fn record(source: &str, seq: usize, vector: Vec<f32>) -> IndexRecord {
        IndexRecord {
            chunk: Chunk::new(source, seq, format!("{} {}", source, seq)),
            vector,
        }
    }

    #[tokio::test]
    async fn test_file_index_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let index = FileIndex::open(dir.path(), DEFAULT_COLLECTION).await.unwrap();
            index
                .upsert(vec![record("body", 0, vec![1.0, 0.0]), record("body", 1, vec![0.0, 1.0])])
                .await
                .unwrap();
            assert!(index.path().ends_with("knowledge_base.json"));
        }

        let reopened = FileIndex::open(dir.path(), DEFAULT_COLLECTION).await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 2);

        let hits = reopened.query(&[0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits[0].0.id, "body_1");
    }

    #[tokio::test]
    async fn test_file_index_delete_persists() {
        let dir = tempfile::tempdir().unwrap();
        let index = FileIndex::open(dir.path(), "docs").await.unwrap();
        index.upsert(vec![record("a", 0, vec![1.0]), record("b", 0, vec![1.0])]).await.unwrap();
        index.delete_source("a").await.unwrap();

        let reopened = FileIndex::open(dir.path(), "docs").await.unwrap();
        let all = reopened.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].source_id, "b");
    }

    #[tokio::test]
    async fn test_failed_write_leaves_index_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let index = FileIndex::open(&data, "docs").await.unwrap();
        index.upsert(vec![record("a", 0, vec![1.0])]).await.unwrap();

        // A plain file where the data directory was makes every write fail
        tokio::fs::remove_dir_all(&data).await.unwrap();
        tokio::fs::write(&data, b"").await.unwrap();

        assert!(index.upsert(vec![record("b", 0, vec![1.0])]).await.is_err());
        assert!(index.delete_source("a").await.is_err());

        let all = index.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "a_0");
    }

    #[tokio::test]
    async fn test_foreign_collection_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("docs.json"),
            r#"{"collection": "other", "records": []}"#,
        )
        .await
        .unwrap();

        let err = FileIndex::open(dir.path(), "docs").await.err().unwrap();
        assert!(matches!(err, EngineError::Storage(_)));
    }

    #[tokio::test]
    async fn test_artifacts_round_trip_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("data"));

        assert!(store.load_faq_report().await.unwrap().is_none());
        assert!(store.load_executive_summary().await.unwrap().is_none());
        assert!(store.load_section_summaries().await.unwrap().is_empty());

        let report = FaqReport::new(
            vec![TopicFaqs {
                topic: "Routing".into(),
                faqs: vec![FaqItem::generated("Routing", "q", "a", vec!["first-steps".into()], Some(0.1))],
            }],
            AnswerMode::Strict,
            &[false],
        );
        store.save_faq_report(&report).await.unwrap();
        store.save_executive_summary("Overview").await.unwrap();

        let mut sections = SectionSummaries::new();
        sections.insert("zeta".into(), "z".into());
        sections.insert("alpha".into(), "a".into());
        store.save_section_summaries(&sections).await.unwrap();

        assert_eq!(store.load_faq_report().await.unwrap(), Some(report));
        assert_eq!(store.load_executive_summary().await.unwrap().as_deref(), Some("Overview"));

        // Completion order is preserved, not sorted
        let loaded = store.load_section_summaries().await.unwrap();
        assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert!(!dir.path().join("data/summaries.json.tmp").exists());
    }
}

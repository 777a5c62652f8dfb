use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

const PAGE_EXTENSION: &str = "html";

/// Directory of raw registry pages, one `<id>.html` file per identifier.
///
/// Entries are only ever added. A page is written to a temporary file first
/// and renamed into place, so an interrupted run never leaves partial pages.
#[derive(Debug, Clone)]
pub struct PageCache {
    dir: PathBuf,
}

impl PageCache {
    /// Opens the cache, creating its directory if needed.
    pub fn create(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create page cache dir: {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Opens an existing cache.
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            anyhow::bail!("page cache directory does not exist: {}", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn page_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{id}.{PAGE_EXTENSION}"))
    }

    pub fn contains(&self, id: u64) -> bool {
        self.page_path(id).is_file()
    }

    pub fn read(&self, id: u64) -> anyhow::Result<String> {
        let path = self.page_path(id);
        std::fs::read_to_string(&path).with_context(|| format!("read cached page: {}", path.display()))
    }

    pub fn insert(&self, id: u64, html: &str) -> anyhow::Result<()> {
        let path = self.page_path(id);
        if path.exists() {
            anyhow::bail!("cached page already exists: {}", path.display());
        }

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("create temp page in: {}", self.dir.display()))?;
        tmp.write_all(html.as_bytes())
            .with_context(|| format!("write temp page for id {id}"))?;
        tmp.persist(&path)
            .with_context(|| format!("persist cached page: {}", path.display()))?;

        Ok(())
    }

    /// Identifiers of all cached pages, ascending.
    pub fn ids(&self) -> anyhow::Result<Vec<u64>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("read page cache dir: {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PAGE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.parse::<u64>() {
                Ok(id) => ids.push(id),
                Err(_) => tracing::debug!(path = %path.display(), "skipping non-numeric page file"),
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::cache::PageCache;
use crate::cli::DownloadArgs;
use crate::crawl::{dissertation_url, http_client};
use crate::extract;
use crate::formats::DownloadSummary;
use crate::page::ParsedPage;
use crate::table::Table;

/// Longest destination path accepted, in bytes (exclusive).
pub const MAX_PATH_BYTES: usize = 255;
pub const TEXT_EXTENSION: &str = "pdf";

/// Destination for a dissertation text: `<texts>/<speciality>/<title>.pdf`.
///
/// Path separators in the title become `_`, so the file always lands directly
/// in the speciality directory. The title then loses trailing characters until
/// the encoded path fits.
pub fn dissertation_path(texts_dir: &Path, speciality: &str, title: &str) -> anyhow::Result<PathBuf> {
    if speciality.is_empty()
        || speciality == "."
        || speciality == ".."
        || speciality.chars().any(std::path::is_separator)
    {
        anyhow::bail!("speciality {speciality:?} is not a plain directory name");
    }
    let dir = texts_dir.join(speciality);
    let mut name = file_stem(title);

    loop {
        if name.is_empty() {
            anyhow::bail!(
                "title {title:?} cannot fit under {MAX_PATH_BYTES} bytes in {}",
                dir.display()
            );
        }
        let path = dir.join(format!("{name}.{TEXT_EXTENSION}"));
        if path.parent() != Some(dir.as_path()) {
            anyhow::bail!("title {title:?} escapes {}", dir.display());
        }
        if path.as_os_str().len() < MAX_PATH_BYTES {
            return Ok(path);
        }
        name.pop();
    }
}

fn file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| if std::path::is_separator(c) || c == '\\' || c == '\0' { '_' } else { c })
        .collect()
}

/// Resolves and fetches one dissertation text.
pub struct Downloader {
    client: reqwest::blocking::Client,
    base_url: Url,
    delay: Duration,
}

impl Downloader {
    pub fn new(client: reqwest::blocking::Client, base_url: Url, delay: Duration) -> Self {
        Self {
            client,
            base_url,
            delay,
        }
    }

    fn get(&self, url: &Url) -> anyhow::Result<reqwest::blocking::Response> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("GET {url}"))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url}: status {status}");
        }
        Ok(response)
    }

    /// Follows the record page link to the intermediate page and reads the
    /// final link from its last script.
    pub fn resolve(&self, id: u64, page: &ParsedPage) -> anyhow::Result<Url> {
        let link = extract::download_link(page)
            .ok_or_else(|| anyhow::anyhow!("page {id} has no download link"))?;
        let page_url = dissertation_url(&self.base_url, id)?;
        let intermediate_url = page_url
            .join(&link)
            .with_context(|| format!("resolve download link {link:?}"))?;

        let response = self.get(&intermediate_url)?;
        let landed_url = response.url().clone();
        let body = response.text().context("read intermediate page")?;
        let intermediate = ParsedPage::parse(&body);

        let final_link = extract::script_link(&intermediate)
            .ok_or_else(|| anyhow::anyhow!("no link in last script of {landed_url}"))?;
        landed_url
            .join(&final_link)
            .with_context(|| format!("resolve final link {final_link:?}"))
    }

    pub fn fetch_to(&self, url: &Url, path: &Path) -> anyhow::Result<()> {
        let bytes = self.get(url)?.bytes().context("read document body")?;

        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("path must have parent: {}", path.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp document in: {}", dir.display()))?;
        tmp.write_all(&bytes).context("write document")?;
        tmp.persist(path)
            .with_context(|| format!("persist document: {}", path.display()))?;
        Ok(())
    }
}

/// Downloads the texts of every tabled record in `speciality`.
///
/// Existing files count as already downloaded. Failures are logged per record.
pub fn download_all(
    table: &Table,
    cache: &PageCache,
    texts_dir: &Path,
    speciality: &str,
    downloader: &Downloader,
) -> anyhow::Result<DownloadSummary> {
    let id_col = table.column_index("id")?;
    let speciality_col = table.column_index("speciality")?;
    let title_col = table.column_index("title")?;

    let mut summary = DownloadSummary::default();

    for row in &table.rows {
        if Table::cell(row, speciality_col) != speciality {
            continue;
        }
        let raw_id = Table::cell(row, id_col);
        let Ok(id) = raw_id.parse::<u64>() else {
            tracing::warn!(id = raw_id, "skipping row with invalid id");
            summary.failed += 1;
            continue;
        };

        let path = match dissertation_path(texts_dir, speciality, Table::cell(row, title_col)) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(id, error = %format!("{err:#}"), "cannot name dissertation file");
                summary.failed += 1;
                continue;
            }
        };
        if path.exists() {
            tracing::debug!(id, path = %path.display(), "already downloaded");
            summary.already_present += 1;
            continue;
        }

        let result = cache.read(id).and_then(|html| {
            let url = downloader.resolve(id, &ParsedPage::parse(&html))?;
            tracing::info!(id, path = %path.display(), "downloading");
            downloader.fetch_to(&url, &path)
        });
        match result {
            Ok(()) => summary.downloaded += 1,
            Err(err) => {
                tracing::warn!(id, error = %format!("{err:#}"), "download failed");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

pub fn run(args: DownloadArgs) -> anyhow::Result<DownloadSummary> {
    let cache = PageCache::open(&args.pages)?;
    let table = crate::table::read(Path::new(&args.stats)).context("load record table")?;
    let texts_dir = PathBuf::from(&args.texts);
    let speciality_dir = texts_dir.join(&args.speciality);
    std::fs::create_dir_all(&speciality_dir)
        .with_context(|| format!("create texts dir: {}", speciality_dir.display()))?;

    let base_url = Url::parse(&args.net.base_url).context("parse --base-url")?;
    let client = http_client(Duration::from_secs(args.net.timeout_secs))?;
    let downloader = Downloader::new(client, base_url, Duration::from_millis(args.net.delay_ms));

    tracing::info!(speciality = %args.speciality, out = %texts_dir.display(), "download: start");
    let summary = download_all(&table, &cache, &texts_dir, &args.speciality, &downloader)?;
    tracing::info!(
        downloaded = summary.downloaded,
        already_present = summary.already_present,
        failed = summary.failed,
        "download: done"
    );
    Ok(summary)
}

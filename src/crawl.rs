use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{ACCEPT, USER_AGENT};
use url::Url;

use crate::cache::PageCache;
use crate::cli::PullArgs;
use crate::formats::CrawlSummary;

/// Result of asking the remote registry for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Page(String),
    Miss(String),
}

/// Source of registry pages addressed by numeric identifier.
pub trait PageSource {
    fn fetch(&self, id: u64) -> Fetched;
}

#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::blocking::Client,
    base_url: Url,
    delay: Duration,
}

impl HttpPageSource {
    pub fn new(client: reqwest::blocking::Client, base_url: Url, delay: Duration) -> Self {
        Self {
            client,
            base_url,
            delay,
        }
    }

    pub fn page_url(&self, id: u64) -> anyhow::Result<Url> {
        dissertation_url(&self.base_url, id)
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, id: u64) -> Fetched {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let url = match self.page_url(id) {
            Ok(url) => url,
            Err(err) => return Fetched::Miss(format!("{err:#}")),
        };

        let response = match self.client.get(url.clone()).send() {
            Ok(response) => response,
            Err(err) => return Fetched::Miss(format!("GET {url}: {err}")),
        };

        let status = response.status();
        if !status.is_success() {
            return Fetched::Miss(format!("GET {url}: status {status}"));
        }

        match response.text() {
            Ok(text) => Fetched::Page(text),
            Err(err) => Fetched::Miss(format!("read body of {url}: {err}")),
        }
    }
}

/// URL of the registry page for `id`.
pub fn dissertation_url(base_url: &Url, id: u64) -> anyhow::Result<Url> {
    let mut url = base_url
        .join("dissertation/")
        .with_context(|| format!("join dissertation path onto {base_url}"))?;
    url.query_pairs_mut().append_pair("number", &id.to_string());
    Ok(url)
}

pub fn http_client(timeout: Duration) -> anyhow::Result<reqwest::blocking::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!("dissovet/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(
        ACCEPT,
        reqwest::header::HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );

    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers(headers)
        .build()
        .context("build http client")
}

/// Reads a newline-delimited identifier list, keeping file order.
pub fn read_ids(path: &Path) -> anyhow::Result<Vec<u64>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read identifier list: {}", path.display()))?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.trim()
                .parse::<u64>()
                .with_context(|| format!("{}:{}: invalid identifier {line:?}", path.display(), index + 1))
        })
        .collect()
}

/// Fetches every identifier not yet cached.
///
/// Misses are counted and logged; they never stop the sweep. Only a failure
/// to write the cache aborts.
pub fn crawl(
    ids: &[u64],
    cache: &PageCache,
    source: &dyn PageSource,
    progress: &ProgressBar,
) -> anyhow::Result<CrawlSummary> {
    let mut summary = CrawlSummary::default();

    for &id in ids {
        progress.inc(1);

        if cache.contains(id) {
            summary.pages_skipped += 1;
            continue;
        }

        match source.fetch(id) {
            Fetched::Page(html) => {
                cache
                    .insert(id, &html)
                    .with_context(|| format!("cache page {id}"))?;
                summary.pages_added += 1;
            }
            Fetched::Miss(reason) => {
                summary.pages_missing += 1;
                progress.set_message(format!("missing {} pages", summary.pages_missing));
                tracing::warn!(id, %reason, "dissertation page is not available");
            }
        }
    }

    Ok(summary)
}

pub fn run(args: PullArgs) -> anyhow::Result<CrawlSummary> {
    let ids = read_ids(Path::new(&args.numbers))?;
    let cache = PageCache::create(&args.pages).context("prepare page cache")?;
    let base_url = Url::parse(&args.net.base_url).context("parse --base-url")?;
    let client = http_client(Duration::from_secs(args.net.timeout_secs))?;
    let source = HttpPageSource::new(client, base_url, Duration::from_millis(args.net.delay_ms));

    let progress = ProgressBar::new(ids.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg} (eta {eta})")
            .context("progress bar template")?
            .progress_chars("=> "),
    );
    progress.set_message("missing 0 pages");

    tracing::info!(ids = ids.len(), pages = %cache.dir().display(), "pull: start");
    let summary = crawl(&ids, &cache, &source, &progress)?;
    progress.finish_and_clear();

    tracing::info!(
        added = summary.pages_added,
        missing = summary.pages_missing,
        skipped = summary.pages_skipped,
        "pull: done"
    );
    Ok(summary)
}

use std::path::PathBuf;

use anyhow::Context as _;

use crate::cache::PageCache;
use crate::cli::StatsArgs;
use crate::formats::DissertationRecord;
use crate::page::ParsedPage;
use crate::record::{build_record, order_by_defence};
use crate::stats;
use crate::table::Table;

/// Outcome of building records from every cached page.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Records with a defence date, most recently defended first.
    pub records: Vec<DissertationRecord>,
    /// Ids of pages that built but carry no defence date.
    pub undated: Vec<u64>,
    /// Ids of pages that could not be read or built, with the reason.
    pub failures: Vec<(u64, String)>,
    /// Trimmed mean of the written table's `interval` column.
    pub mean_interval: Option<f64>,
}

pub fn build_all(cache: &PageCache) -> anyhow::Result<BuildReport> {
    let mut report = BuildReport::default();
    let mut built = Vec::new();

    for id in cache.ids().context("list cached pages")? {
        let html = match cache.read(id) {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(id, error = %format!("{err:#}"), "skipping page that cannot be read");
                report.failures.push((id, format!("{err:#}")));
                continue;
            }
        };
        let mut page = ParsedPage::parse(&html);
        match build_record(&mut page, id) {
            Ok(record) => built.push(record),
            Err(err) => {
                tracing::warn!(id, error = %err, "skipping page that cannot be built");
                report.failures.push((id, err.to_string()));
            }
        }
    }

    let (ordered, undated) = order_by_defence(built);
    for record in &undated {
        tracing::warn!(id = record.id, "skipping record without defence date");
    }
    report.records = ordered;
    report.undated = undated.iter().map(|record| record.id).collect();

    Ok(report)
}

pub fn run(args: StatsArgs) -> anyhow::Result<BuildReport> {
    let cache = PageCache::open(&args.pages)?;
    let stats_path = PathBuf::from(&args.stats);

    tracing::info!(pages = %cache.dir().display(), "stats: build records");
    let mut report = build_all(&cache)?;

    tracing::info!(
        records = report.records.len(),
        undated = report.undated.len(),
        failed = report.failures.len(),
        out = %stats_path.display(),
        "stats: write table"
    );
    let table = Table::from_records(&report.records);
    crate::table::write(&stats_path, &table).context("write record table")?;
    report.mean_interval = stats::trimmed_mean(&stats::column_values(&table, "interval")?);

    Ok(report)
}

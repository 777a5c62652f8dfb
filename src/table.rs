use std::path::Path;

use anyhow::Context as _;

use crate::formats::{DATE_FORMAT, DissertationRecord};

pub const DELIMITER: u8 = b'\t';

pub const COLUMNS: [&str; 10] = [
    "id",
    "successful",
    "committee",
    "speciality",
    "title",
    "author",
    "supervisor",
    "uploaded",
    "defended",
    "interval",
];

/// Record table loaded as plain text cells, keyed by header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> anyhow::Result<usize> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| anyhow::anyhow!("table has no column {name:?}"))
    }

    /// Cell of `row` in column `index`; short rows read as empty.
    pub fn cell(row: &[String], index: usize) -> &str {
        row.get(index).map(String::as_str).unwrap_or_default()
    }

    pub fn from_records(records: &[DissertationRecord]) -> Self {
        Self {
            columns: COLUMNS.iter().map(|c| (*c).to_owned()).collect(),
            rows: records.iter().map(record_row).collect(),
        }
    }
}

fn record_row(record: &DissertationRecord) -> Vec<String> {
    let date = |date: Option<chrono::NaiveDate>| {
        date.map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    };

    vec![
        record.id.to_string(),
        record.outcome.as_cell().to_owned(),
        record.committee.clone().unwrap_or_default(),
        record.speciality.clone().unwrap_or_default(),
        record.title.clone(),
        record.author.clone(),
        record.supervisor.clone(),
        date(record.uploaded),
        date(record.defended),
        record
            .interval_days()
            .map(|days| days.to_string())
            .unwrap_or_default(),
    ]
}

pub fn write(path: &Path, table: &Table) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create table dir: {}", parent.display()))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_path(path)
        .with_context(|| format!("create table: {}", path.display()))?;

    writer
        .write_record(&table.columns)
        .context("write table header")?;
    for row in &table.rows {
        writer.write_record(row).context("write table row")?;
    }
    writer.flush().context("flush table")?;

    Ok(())
}

pub fn read(path: &Path) -> anyhow::Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("read table: {}", path.display()))?;

    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("read table header: {}", path.display()))?
        .iter()
        .map(str::to_owned)
        .collect();
    if columns.is_empty() {
        anyhow::bail!("table is empty: {}", path.display());
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read table row: {}", path.display()))?;
        rows.push(record.iter().map(str::to_owned).collect());
    }

    Ok(Table { columns, rows })
}

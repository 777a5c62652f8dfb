use chrono::NaiveDate;
use serde::Serialize;

/// Format of every date on the registry pages and in the record table.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Outcome of a defence as reported by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Successful,
    Unsuccessful,
    Unknown,
}

impl Outcome {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Outcome::Successful => Some(true),
            Outcome::Unsuccessful => Some(false),
            Outcome::Unknown => None,
        }
    }

    /// Cell value used in the record table.
    pub fn as_cell(self) -> &'static str {
        match self.as_bool() {
            Some(true) => "true",
            Some(false) => "false",
            None => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DissertationRecord {
    pub id: u64,
    pub outcome: Outcome,
    pub committee: Option<String>,
    pub speciality: Option<String>,
    pub title: String,
    pub author: String,
    pub supervisor: String,
    pub uploaded: Option<NaiveDate>,
    pub defended: Option<NaiveDate>,
}

impl DissertationRecord {
    /// Days between upload and defence. Derived on every call.
    pub fn interval_days(&self) -> Option<i64> {
        let uploaded = self.uploaded?;
        let defended = self.defended?;
        Some((defended - uploaded).num_days())
    }
}

/// One row of a ranked breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    pub rank: usize,
    pub value: String,
    pub count: usize,
    pub cumulative_count: usize,
    pub percentile: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages_added: usize,
    pub pages_missing: usize,
    pub pages_skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub already_present: usize,
    pub failed: usize,
}

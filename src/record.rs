use chrono::NaiveDate;

use crate::extract::{self, ExtractError};
use crate::formats::{DATE_FORMAT, DissertationRecord};
use crate::page::ParsedPage;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("invalid {field} date {value:?}")]
    InvalidDate {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Builds one record from a parsed page.
///
/// Label-based fields that are missing stay unset. Structural fields, unknown
/// status values and malformed dates fail the whole record.
pub fn build_record(page: &mut ParsedPage, id: u64) -> Result<DissertationRecord, RecordError> {
    let outcome = extract::status(page)?;
    let committee = extract::committee(page);
    let speciality = extract::speciality(page);
    let title = extract::title(page)?;
    let author = extract::author(page)?;
    let supervisor = extract::supervisor(page)?;
    let uploaded = extract::upload_date(page)
        .map(|value| parse_date("upload", value))
        .transpose()?;
    let defended = extract::defence_date(page)
        .map(|value| parse_date("defence", value))
        .transpose()?;

    Ok(DissertationRecord {
        id,
        outcome,
        committee,
        speciality,
        title,
        author,
        supervisor,
        uploaded,
        defended,
    })
}

pub fn parse_date(field: &'static str, value: String) -> Result<NaiveDate, RecordError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|source| {
        RecordError::InvalidDate {
            field,
            value,
            source,
        }
    })
}

/// Orders records by defence date, most recent first.
///
/// Records without a defence date cannot be placed and are returned separately.
pub fn order_by_defence(
    records: Vec<DissertationRecord>,
) -> (Vec<DissertationRecord>, Vec<DissertationRecord>) {
    let (mut dated, undated): (Vec<_>, Vec<_>) =
        records.into_iter().partition(|record| record.defended.is_some());
    dated.sort_by(|a, b| b.defended.cmp(&a.defended));
    (dated, undated)
}

use std::collections::HashMap;

use anyhow::Context as _;
use regex::Regex;

use crate::formats::RankedRow;
use crate::table::Table;

/// Groups rows by `column`, most frequent first.
///
/// Ties keep the order in which groups first appear. Empty cells form no
/// group. `percentile` is the running share of all counted rows.
pub fn rank(table: &Table, column: &str) -> anyhow::Result<Vec<RankedRow>> {
    let index = table.column_index(column)?;

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in &table.rows {
        let value = Table::cell(row, index);
        if value.is_empty() {
            continue;
        }
        let count = counts.entry(value).or_insert_with(|| {
            order.push(value);
            0
        });
        *count += 1;
    }

    let mut groups: Vec<(&str, usize)> = order
        .into_iter()
        .map(|value| (value, counts[value]))
        .collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1));

    let total: usize = groups.iter().map(|(_, count)| count).sum();
    let mut cumulative_count = 0;
    let ranked = groups
        .into_iter()
        .enumerate()
        .map(|(position, (value, count))| {
            cumulative_count += count;
            RankedRow {
                rank: position + 1,
                value: value.to_owned(),
                count,
                cumulative_count,
                percentile: cumulative_count as f64 / total as f64 * 100.0,
            }
        })
        .collect();

    Ok(ranked)
}

/// Rows whose `column` matches `pattern`, numbered from 1 in table order.
pub fn filter<'t>(
    table: &'t Table,
    column: &str,
    pattern: &Regex,
) -> anyhow::Result<Vec<(usize, &'t [String])>> {
    let index = table.column_index(column)?;

    Ok(table
        .rows
        .iter()
        .filter(|row| {
            let value = Table::cell(row, index);
            !value.is_empty() && pattern.is_match(value)
        })
        .enumerate()
        .map(|(position, row)| (position + 1, row.as_slice()))
        .collect())
}

/// Numeric values of `column`, skipping empty cells.
pub fn column_values(table: &Table, column: &str) -> anyhow::Result<Vec<f64>> {
    let index = table.column_index(column)?;
    table
        .rows
        .iter()
        .map(|row| Table::cell(row, index))
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<f64>()
                .with_context(|| format!("non-numeric {column} value {value:?}"))
        })
        .collect()
}

/// Linearly interpolated quantile of ascending `sorted` values.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = q.clamp(0.0, 1.0) * last as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Mean of the values lying within the 5th..=95th percentile band.
pub fn trimmed_mean(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let low = quantile(&sorted, 0.05)?;
    let high = quantile(&sorted, 0.95)?;
    let kept: Vec<f64> = sorted
        .into_iter()
        .filter(|value| (low..=high).contains(value))
        .collect();

    if kept.is_empty() {
        return None;
    }
    Some(kept.iter().sum::<f64>() / kept.len() as f64)
}

pub fn render_ranked(column: &str, rows: &[RankedRow]) -> String {
    let header = ["", column, "count", "percentile"].map(str::to_owned).to_vec();
    let body = rows
        .iter()
        .map(|row| {
            vec![
                row.rank.to_string(),
                row.value.clone(),
                row.count.to_string(),
                format!("{:.2}", row.percentile),
            ]
        })
        .collect::<Vec<_>>();
    render_grid(&header, &body)
}

pub fn render_matches(table: &Table, matches: &[(usize, &[String])]) -> String {
    let mut header = vec![String::new()];
    header.extend(table.columns.iter().cloned());
    let body = matches
        .iter()
        .map(|(position, row)| {
            let mut line = vec![position.to_string()];
            line.extend((0..table.columns.len()).map(|i| Table::cell(row, i).to_owned()));
            line
        })
        .collect::<Vec<_>>();
    render_grid(&header, &body)
}

/// Left-aligned text grid; cells are single-lined for display.
fn render_grid(header: &[String], body: &[Vec<String>]) -> String {
    let flatten = |cell: &str| cell.replace(['\n', '\r', '\t'], " ");
    let lines: Vec<Vec<String>> = std::iter::once(header)
        .chain(body.iter().map(Vec::as_slice))
        .map(|row| row.iter().map(|cell| flatten(cell.as_str())).collect())
        .collect();

    let mut widths = vec![0_usize; header.len()];
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for line in &lines {
        let cells = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(column: &str, values: &[&str]) -> Table {
        Table {
            columns: vec!["id".to_owned(), column.to_owned()],
            rows: values
                .iter()
                .enumerate()
                .map(|(i, v)| vec![(i + 1).to_string(), (*v).to_owned()])
                .collect(),
        }
    }

    #[test]
    fn rank_orders_by_count_with_stable_ties() -> anyhow::Result<()> {
        let table = table("speciality", &["b", "a", "a", "c", "b", "", "d", "a"]);

        let ranked = rank(&table, "speciality")?;

        let summary: Vec<(usize, &str, usize)> = ranked
            .iter()
            .map(|row| (row.rank, row.value.as_str(), row.count))
            .collect();
        assert_eq!(summary, vec![(1, "a", 3), (2, "b", 2), (3, "c", 1), (4, "d", 1)]);
        Ok(())
    }

    #[test]
    fn rank_percentiles_accumulate_to_hundred() -> anyhow::Result<()> {
        let table = table("committee", &["x", "y", "x", "z", "x", "y", "w"]);

        let ranked = rank(&table, "committee")?;

        for pair in ranked.windows(2) {
            assert!(pair[0].percentile <= pair[1].percentile);
        }
        let last = ranked.last().expect("non-empty ranking");
        assert_eq!(last.cumulative_count, ranked.iter().map(|r| r.count).sum::<usize>());
        assert!((last.percentile - 100.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn rank_of_unknown_column_fails() {
        assert!(rank(&table("speciality", &["a"]), "author").is_err());
    }

    #[test]
    fn filter_renumbers_matches_without_gaps() -> anyhow::Result<()> {
        let table = table("supervisor", &["Ivanov", "", "Petrov", "Ivanova", "Sidorov"]);
        let pattern = Regex::new("^Iva")?;

        let matches = filter(&table, "supervisor", &pattern)?;

        let positions: Vec<usize> = matches.iter().map(|(position, _)| *position).collect();
        let ids: Vec<&str> = matches.iter().map(|(_, row)| row[0].as_str()).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(ids, vec!["1", "4"]);
        Ok(())
    }

    #[test]
    fn empty_cells_never_match() -> anyhow::Result<()> {
        let table = table("author", &["", "", "x"]);
        let matches = filter(&table, "author", &Regex::new(".*")?)?;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, 1);
        Ok(())
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 0.5), Some(3.0));
        let high = quantile(&sorted, 0.95).expect("non-empty input");
        assert!((high - 4.8).abs() < 1e-9);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn trimmed_mean_ignores_outlier_magnitude() {
        let base: Vec<f64> = (1..=20).map(f64::from).collect();

        let with_outlier = |outlier: f64| {
            let mut values = base.clone();
            values.push(outlier);
            trimmed_mean(&values)
        };

        let moderate = with_outlier(1_000.0);
        let extreme = with_outlier(1_000_000.0);
        assert!(moderate.is_some());
        assert_eq!(moderate, extreme);
    }

    #[test]
    fn trimmed_mean_of_nothing_is_none() {
        assert_eq!(trimmed_mean(&[]), None);
        assert_eq!(trimmed_mean(&[7.0]), Some(7.0));
    }

    #[test]
    fn column_values_skip_empty_cells() -> anyhow::Result<()> {
        let intervals = table("interval", &["14", "", "30"]);
        assert_eq!(column_values(&intervals, "interval")?, vec![14.0, 30.0]);
        assert!(column_values(&table("interval", &["soon"]), "interval").is_err());
        Ok(())
    }

    #[test]
    fn ranked_rendering_aligns_columns() -> anyhow::Result<()> {
        let ranked = rank(&table("speciality", &["05.13.17", "05.13.17", "2.3.5"]), "speciality")?;

        let rendered = render_ranked("speciality", &ranked);

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "   speciality  count  percentile");
        assert_eq!(lines[1], "1  05.13.17    2      66.67");
        assert_eq!(lines[2], "2  2.3.5       1      100.00");
        Ok(())
    }
}

use std::io::Write;
use std::path::Path;

use anyhow::Context as _;
use regex::Regex;

use crate::cli::{MatchArgs, TopArgs};
use crate::stats;

pub fn top(column: &str, args: &TopArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let table = crate::table::read(Path::new(&args.stats)).context("load record table")?;
    let mut ranked = stats::rank(&table, column)?;
    ranked.truncate(args.n);

    if args.json {
        for row in &ranked {
            serde_json::to_writer(&mut *out, row).context("serialize ranked row")?;
            out.write_all(b"\n").context("write newline")?;
        }
    } else {
        out.write_all(stats::render_ranked(column, &ranked).as_bytes())
            .context("write ranking")?;
    }
    Ok(())
}

pub fn matches(column: &str, args: &MatchArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let pattern = Regex::new(&args.pattern).with_context(|| format!("parse --pattern {:?}", args.pattern))?;
    let table = crate::table::read(Path::new(&args.stats)).context("load record table")?;
    let found = stats::filter(&table, column, &pattern)?;
    tracing::debug!(column, matches = found.len(), "filtered record table");

    if args.json {
        for (position, row) in &found {
            let mut object = serde_json::Map::new();
            object.insert("index".to_owned(), serde_json::json!(position));
            for (index, name) in table.columns.iter().enumerate() {
                let cell = crate::table::Table::cell(row, index);
                object.insert(name.clone(), serde_json::Value::String(cell.to_owned()));
            }
            serde_json::to_writer(&mut *out, &object).context("serialize matching row")?;
            out.write_all(b"\n").context("write newline")?;
        }
    } else {
        out.write_all(stats::render_matches(&table, &found).as_bytes())
            .context("write matches")?;
    }
    Ok(())
}

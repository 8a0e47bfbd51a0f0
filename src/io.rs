use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use semspec::ParTableRow;

use crate::group::first_appearance;

pub fn read_table(path: &Path) -> Result<DataFrame> {
    let delimiter = detect_delimiter(path)?;
    if delimiter == b' ' {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        return read_table_whitespace(BufReader::new(file));
    }

    CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_null_values(Some(NullValues::AllColumns(vec![
                    "".into(),
                    "NA".into(),
                    ".".into(),
                ])))
                .with_missing_is_null(true),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("read {}", path.display()))
}

fn read_table_whitespace<R: Read>(reader: R) -> Result<DataFrame> {
    let mut reader = BufReader::new(reader);
    let mut header_line = String::new();
    reader.read_line(&mut header_line)?;
    if header_line.trim().is_empty() {
        return Err(anyhow::anyhow!("empty file"));
    }
    let headers: Vec<String> = header_line.split_whitespace().map(str::to_string).collect();
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        for (i, col) in columns.iter_mut().enumerate() {
            let value = parts
                .get(i)
                .filter(|v| !matches!(**v, "NA" | "."))
                .map(|v| v.to_string());
            col.push(value);
        }
    }

    let height = columns.first().map(Vec::len).unwrap_or(0);
    let cols: Vec<Column> = headers
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name.as_str().into(), values).into())
        .collect();
    Ok(DataFrame::new(height, cols)?)
}

fn detect_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut first = String::new();
    reader.read_line(&mut first)?;
    if first.contains('\t') {
        return Ok(b'\t');
    }
    if first.contains(',') {
        return Ok(b',');
    }
    Ok(b' ')
}

pub fn group_order(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let series = df
        .column(column)
        .with_context(|| format!("group column {column} missing"))?
        .as_series()
        .context("series")?
        .cast(&DataType::String)?;
    let values = series.str()?;
    Ok(first_appearance(values.into_iter().flatten()))
}

pub fn write_dataframe(df: &DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut csv = CsvWriter::new(&mut file).with_separator(b'\t');
    let mut df = df.clone();
    csv.finish(&mut df)?;
    Ok(())
}

pub fn write_text(text: &str, path: &Path) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    writeln!(file, "{text}")?;
    Ok(())
}

pub fn par_table_frame(rows: &[ParTableRow]) -> Result<DataFrame> {
    let text = |f: fn(&ParTableRow) -> String| rows.iter().map(f).collect::<Vec<_>>();
    let df = DataFrame::new(
        rows.len(),
        vec![
            Series::new("lhs".into(), text(|r| r.lhs.clone())).into(),
            Series::new("op".into(), text(|r| r.op.clone())).into(),
            Series::new("rhs".into(), text(|r| r.rhs.clone())).into(),
            Series::new(
                "group".into(),
                rows.iter().map(|r| r.group as u32).collect::<Vec<_>>(),
            )
            .into(),
            Series::new(
                "free".into(),
                rows.iter().map(|r| r.free as u32).collect::<Vec<_>>(),
            )
            .into(),
            Series::new(
                "label".into(),
                rows.iter().map(|r| r.label.clone()).collect::<Vec<_>>(),
            )
            .into(),
            Series::new(
                "ustart".into(),
                rows.iter().map(|r| r.ustart).collect::<Vec<_>>(),
            )
            .into(),
        ],
    )?;
    Ok(df)
}

//! Logged loaders and writers, one per external file format.
//!
//! Every operation logs PATH, SHAPE and elapsed TIME so a batch log reads
//! the same regardless of which extract a step touched.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::*;
use tracing::info;

use crate::errors::TableError;
use crate::spec::{ColumnType, DatSpec, FileSpec, FlatSpec};

fn require_exists(path: &Path) -> Result<(), TableError> {
    if !path.is_file() {
        return Err(TableError::NotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Load a comma-separated extract with a header row.
///
/// When the descriptor carries a column allow-list the result contains
/// exactly those columns, in file order, with the requested dtypes.
pub fn load_csv(spec: &FileSpec) -> Result<DataFrame, TableError> {
    let start = Instant::now();
    let path = spec.path();

    info!("--[tabular::load_csv]--------------------");
    info!("PATH  : {}", path.display());

    require_exists(&path)?;

    let df = CsvReader::from_path(&path)?
        .has_header(true)
        .with_separator(b',')
        .with_columns(spec.usecols.clone())
        .with_dtypes(Some(Arc::new(spec.dtype_schema())))
        .finish()?;

    info!("SHAPE : {:?}", df.shape());
    info!("TIME  : {:.2}[sec]", start.elapsed().as_secs_f64());

    Ok(df)
}

/// Write a table as CSV, optionally column-filtered and headerless.
pub fn write_csv(df: &DataFrame, spec: &FileSpec, header: bool) -> Result<(), TableError> {
    let start = Instant::now();
    let path = spec.path();

    info!("--[tabular::write_csv]--------------------");
    info!("PATH  : {}", path.display());

    let mut out = match &spec.outcols {
        Some(cols) => df.select(cols)?,
        None => df.clone(),
    };

    info!("SHAPE : {:?}", out.shape());

    let file = File::create(&path)?;
    CsvWriter::new(file)
        .include_header(header)
        .finish(&mut out)?;

    info!("TIME  : {:.2}[sec]", start.elapsed().as_secs_f64());

    Ok(())
}

/// Load a pipe-delimited, headerless extract. The descriptor supplies the
/// full column list and types; the allow-list is applied afterwards.
pub fn load_dat(spec: &DatSpec) -> Result<DataFrame, TableError> {
    let start = Instant::now();
    let path = spec.path();

    info!("--[tabular::load_dat]--------------------");
    info!("PATH  : {}", path.display());

    require_exists(&path)?;

    let mut df = CsvReader::from_path(&path)?
        .has_header(false)
        .with_separator(b'|')
        .with_schema(Some(Arc::new(spec.file_schema())))
        .finish()?;

    if let Some(cols) = &spec.usecols {
        df = df.select(cols)?;
    }

    info!("SHAPE : {:?}", df.shape());
    info!("TIME  : {:.2}[sec]", start.elapsed().as_secs_f64());

    Ok(df)
}

/// Load a fixed-width extract, one byte range per column.
pub fn load_flat(spec: &FlatSpec) -> Result<DataFrame, TableError> {
    let start = Instant::now();

    info!("--[tabular::load_flat]--------------------");
    info!("PATH  : {}", spec.path.display());

    require_exists(&spec.path)?;

    let content = std::fs::read_to_string(&spec.path)?;
    let mut raw: Vec<Vec<String>> = vec![Vec::new(); spec.names.len()];

    for (line_idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        for (col_idx, &(start_byte, end_byte)) in spec.colspecs.iter().enumerate() {
            let slice = line.get(start_byte..end_byte.min(line.len())).ok_or_else(|| {
                TableError::Parse(line_idx + 1, format!("column {} is not on a character boundary", col_idx + 1))
            })?;
            raw[col_idx].push(slice.trim().to_string());
        }
    }

    let mut columns = Vec::with_capacity(spec.names.len());
    for (col_idx, name) in spec.names.iter().enumerate() {
        let ty = spec
            .dtypes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| *ty)
            .unwrap_or(ColumnType::Str);
        columns.push(parse_column(name, &raw[col_idx], ty)?);
    }

    let df = DataFrame::new(columns)?;

    info!("SHAPE : {:?}", df.shape());
    info!("TIME  : {:.2}[sec]", start.elapsed().as_secs_f64());

    Ok(df)
}

fn parse_column(name: &str, values: &[String], ty: ColumnType) -> Result<Series, TableError> {
    match ty {
        ColumnType::Str => Ok(Series::new(name, values)),
        ColumnType::Int => {
            let parsed: Result<Vec<i64>, TableError> = values
                .iter()
                .enumerate()
                .map(|(row, v)| {
                    v.parse::<i64>()
                        .map_err(|_| TableError::Parse(row + 1, format!("column {name}: invalid integer '{v}'")))
                })
                .collect();
            Ok(Series::new(name, parsed?))
        }
        ColumnType::Float => {
            let parsed: Result<Vec<f64>, TableError> = values
                .iter()
                .enumerate()
                .map(|(row, v)| {
                    v.parse::<f64>()
                        .map_err(|_| TableError::Parse(row + 1, format!("column {name}: invalid float '{v}'")))
                })
                .collect();
            Ok(Series::new(name, parsed?))
        }
    }
}

/// Write a table in the binary serialized-table format (Arrow IPC).
///
/// Columns named in the descriptor's type map are coerced first, so a
/// read-back reproduces the declared dtypes exactly.
pub fn write_table(df: &DataFrame, spec: &FileSpec) -> Result<(), TableError> {
    let start = Instant::now();
    let path = spec.path();

    info!("--[tabular::write_table]--------------------");
    info!("PATH  : {}", path.display());

    let mut out = match &spec.outcols {
        Some(cols) => df.select(cols)?,
        None => df.clone(),
    };

    for (name, ty) in &spec.dtypes {
        let cast = out.column(name)?.cast(&ty.to_polars())?;
        out.with_column(cast)?;
    }

    info!("SHAPE : {:?}", out.shape());

    let file = File::create(&path)?;
    IpcWriter::new(file).finish(&mut out)?;

    info!("TIME  : {:.2}[sec]", start.elapsed().as_secs_f64());

    Ok(())
}

/// Read a table back from the binary serialized-table format.
pub fn load_table(spec: &FileSpec) -> Result<DataFrame, TableError> {
    let start = Instant::now();
    let path = spec.path();

    info!("--[tabular::load_table]--------------------");
    info!("PATH  : {}", path.display());

    require_exists(&path)?;

    let file = File::open(&path)?;
    let mut df = IpcReader::new(file).finish()?;

    if let Some(cols) = &spec.usecols {
        df = df.select(cols)?;
    }

    info!("SHAPE : {:?}", df.shape());
    info!("TIME  : {:.2}[sec]", start.elapsed().as_secs_f64());

    Ok(df)
}

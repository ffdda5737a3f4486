//! File-location descriptors
//!
//! A descriptor carries everything a loader needs: directory, file name,
//! an optional column allow-list and a per-column type map. Configurations
//! hold these as static values; jobs stamp a per-run or per-slice file name
//! onto a copy before handing it to the I/O layer.

use std::path::PathBuf;

use polars::prelude::{DataType, Field, Schema};

/// Column type as named by a configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Str,
    Int,
    Float,
}

impl ColumnType {
    pub fn to_polars(self) -> DataType {
        match self {
            ColumnType::Str => DataType::String,
            ColumnType::Int => DataType::Int64,
            ColumnType::Float => DataType::Float64,
        }
    }
}

/// Descriptor for a delimited file with a header row (CSV) or the binary
/// serialized-table format.
#[derive(Clone, Debug)]
pub struct FileSpec {
    pub dir: String,
    pub name: String,
    /// Columns to read; `None` reads everything.
    pub usecols: Option<Vec<String>>,
    /// Per-column type overrides applied at read time and coercions applied
    /// before a binary write.
    pub dtypes: Vec<(String, ColumnType)>,
    /// Columns to write; `None` writes everything.
    pub outcols: Option<Vec<String>>,
}

impl FileSpec {
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.name)
    }

    /// Copy of this spec with the file name stamped for one batch run.
    pub fn named(&self, name: impl Into<String>) -> Self {
        let mut spec = self.clone();
        spec.name = name.into();
        spec
    }

    pub(crate) fn dtype_schema(&self) -> Schema {
        Schema::from_iter(
            self.dtypes
                .iter()
                .map(|(name, ty)| Field::new(name, ty.to_polars())),
        )
    }
}

/// Descriptor for a pipe-delimited, headerless extract. `filecols` names
/// every column in file order; `usecols` selects the ones kept.
#[derive(Clone, Debug)]
pub struct DatSpec {
    pub dir: String,
    pub name: String,
    pub filecols: Vec<String>,
    pub dtypes: Vec<(String, ColumnType)>,
    pub usecols: Option<Vec<String>>,
}

impl DatSpec {
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.name)
    }

    pub(crate) fn file_schema(&self) -> Schema {
        Schema::from_iter(self.filecols.iter().map(|name| {
            let ty = self
                .dtypes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, ty)| ty.to_polars())
                .unwrap_or(DataType::String);
            Field::new(name, ty)
        }))
    }
}

/// Descriptor for a fixed-width extract. `colspecs` are byte ranges
/// `(start, end)` per column, end exclusive.
#[derive(Clone, Debug)]
pub struct FlatSpec {
    pub path: PathBuf,
    pub names: Vec<String>,
    pub colspecs: Vec<(usize, usize)>,
    pub dtypes: Vec<(String, ColumnType)>,
}

// src/process/mod.rs
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fmt,
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
};
use tracing::debug;

pub mod aggregate;
pub mod dataset;
pub mod date_parser;
pub mod policy;
pub mod records;
pub mod states;
pub mod utils;

/// Logical names of the three local source tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKey {
    Expire,
    Nga,
    Daily,
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TableKey::Expire => "expire",
            TableKey::Nga => "nga",
            TableKey::Daily => "daily",
        };
        f.write_str(s)
    }
}

/// Fixed registry from logical table key to file on disk.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    data_dir: PathBuf,
    expire: String,
    nga: String,
    daily: String,
}

impl SourceRegistry {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        expire: impl Into<String>,
        nga: impl Into<String>,
        daily: impl Into<String>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            expire: expire.into(),
            nga: nga.into(),
            daily: daily.into(),
        }
    }

    pub fn path(&self, key: TableKey) -> PathBuf {
        let name = match key {
            TableKey::Expire => &self.expire,
            TableKey::Nga => &self.nga,
            TableKey::Daily => &self.daily,
        };
        self.data_dir.join(name)
    }

    /// Load the table registered under `key` into typed rows.
    pub fn load<T: DeserializeOwned>(&self, key: TableKey) -> Result<Vec<T>> {
        let path = self.path(key);
        read_csv_file(&path).with_context(|| format!("loading `{}` table", key))
    }
}

/// Deserialize every row of a headed CSV from any reader.
pub fn read_csv<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in rdr.deserialize().enumerate() {
        let row: T = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Deserialize a headed CSV file.
pub fn read_csv_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let rows = read_csv(file).with_context(|| format!("reading {:?}", path))?;
    debug!(path = %path.display(), rows = rows.len(), "loaded csv");
    Ok(rows)
}

/// Write rows with a header line, creating parent directories as needed.
pub fn write_csv_file<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {:?}", parent))?;
    }
    let mut wtr = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("creating {:?}", path))?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("writing row to {:?}", path))?;
    }
    wtr.flush().with_context(|| format!("flushing {:?}", path))?;
    debug!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

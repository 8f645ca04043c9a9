use crate::errors::{AppError, AppResult};
use crate::models::RawRow;
use chrono::{DateTime, Local, NaiveDateTime};
use std::path::{Path, PathBuf};

pub trait HabitSource {
    fn modified_at(&self) -> AppResult<NaiveDateTime>;
    fn rows(&self) -> AppResult<Vec<RawRow>>;
}

#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HabitSource for CsvSource {
    fn modified_at(&self) -> AppResult<NaiveDateTime> {
        let modified = std::fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .map_err(|err| AppError::Io(format!("Failed to stat '{}': {}", self.path.display(), err)))?;
        Ok(DateTime::<Local>::from(modified).naive_local())
    }

    fn rows(&self) -> AppResult<Vec<RawRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;
        let rows = reader
            .deserialize::<RawRow>()
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(path = %self.path.display(), rows = rows.len(), "read habit log");
        Ok(rows)
    }
}

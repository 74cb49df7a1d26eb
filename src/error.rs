use std::path::PathBuf;

use thiserror::Error;

/// Failures from the films store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `films` table is missing; `init_schema` was never run on this database.
    #[error("schema not initialized: table `films` does not exist (run `ingest` first)")]
    SchemaNotInitialized,

    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.starts_with("no such table") => {
                Self::SchemaNotInitialized
            }
            _ => Self::Sqlite(err),
        }
    }
}

/// Failures loading the intermediate JSON file. Any of these aborts the ingest run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{} not found; run `film_scraper crawl` to generate it, or place the file there", .path.display())]
    MissingInput { path: PathBuf },

    #[error("{}: expected a JSON array of film objects, found {found}", .path.display())]
    NotAnArray { path: PathBuf, found: &'static str },

    #[error("{}: invalid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: could not encode JSON: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

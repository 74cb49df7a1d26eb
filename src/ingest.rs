use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::db;
use crate::error::IngestError;
use crate::parser::normalize::{normalize_all, RawRecord};

pub struct IngestSummary {
    pub loaded: usize,
    pub kept: usize,
    pub inserted: usize,
}

/// Read the intermediate file: a JSON array of loosely-shaped film objects.
/// Elements that are not objects become empty records and are dropped later.
pub fn load_json(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
    if !path.exists() {
        return Err(IngestError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| IngestError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(IngestError::NotAnArray {
                path: path.to_path_buf(),
                found: json_kind(&other),
            })
        }
    };

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item).unwrap_or_else(|e| {
                debug!("element {} is not a film object: {}", i, e);
                RawRecord::default()
            })
        })
        .collect())
}

/// Write any serializable list as pretty-printed UTF-8 JSON.
pub fn save_json<T: Serialize>(items: &[T], path: &Path) -> Result<(), IngestError> {
    let file = File::create(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_json(BufWriter::new(file), items, path)
}

/// Write failures surface as `Io`; only values serde cannot encode are `Encode`.
fn write_json<W: Write, T: Serialize>(mut out: W, items: &[T], path: &Path) -> Result<(), IngestError> {
    let io_err = |source: std::io::Error| IngestError::Io {
        path: path.to_path_buf(),
        source,
    };
    serde_json::to_writer_pretty(&mut out, items).map_err(|e| {
        if e.is_io() {
            io_err(e.into())
        } else {
            IngestError::Encode {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    out.write_all(b"\n").map_err(io_err)?;
    out.flush().map_err(io_err)?;
    Ok(())
}

/// Load, normalize and store one intermediate file.
pub fn run(conn: &Connection, path: &Path) -> Result<IngestSummary> {
    db::init_schema(conn)?;

    let raw = load_json(path)?;
    info!("Loaded {} records from {}", raw.len(), path.display());

    let mut kept = 0;
    let clean = normalize_all(&raw).inspect(|_| kept += 1);
    let inserted = db::upsert_films(conn, clean)?;
    info!("{} records valid, {} new rows", kept, inserted);

    Ok(IngestSummary {
        loaded: raw.len(),
        kept,
        inserted,
    })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{to_raw_records, FilmLink};

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    fn mem() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_json(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, IngestError::MissingInput { .. }));
    }

    #[test]
    fn object_is_not_an_array() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(&dir, "obj.json", r#"{"title": "A", "url": "http://x/1"}"#);
        match load_json(&p).unwrap_err() {
            IngestError::NotAnArray { found, .. } => assert_eq!(found, "an object"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(&dir, "bad.json", "[{");
        assert!(matches!(load_json(&p).unwrap_err(), IngestError::Json { .. }));
    }

    #[test]
    fn non_object_elements_are_dropped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            &dir,
            "mixed.json",
            r#"[42, "x", {"title": "A", "url": "http://x/a"}, null]"#,
        );
        let conn = mem();
        let s = run(&conn, &p).unwrap();
        assert_eq!((s.loaded, s.kept, s.inserted), (4, 1, 1));
    }

    #[test]
    fn scenario_two_films_one_bad_year() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            &dir,
            "films.json",
            r#"[{"title":"Movie A","url":"http://e/a","year":2001},
                {"title":"Movie B","url":"http://e/b","year":"bad"}]"#,
        );
        let conn = mem();
        let s = run(&conn, &p).unwrap();
        assert_eq!(s.inserted, 2);

        assert_eq!(db::count_by_year(&conn, 2001).unwrap(), 1);
        let undated: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM films WHERE year IS NULL AND title = 'Movie B'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(undated, 1);

        let titles: Vec<String> = db::list_by_year(&conn, 2001, 20)
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, ["Movie A"]);
    }

    #[test]
    fn rerun_inserts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            &dir,
            "films.json",
            r#"[{"title":"A","url":"http://x/1","year":2020},
                {"title":"A","url":"http://x/1","year":2020}]"#,
        );
        let conn = mem();
        assert_eq!(run(&conn, &p).unwrap().inserted, 1);
        let again = run(&conn, &p).unwrap();
        assert_eq!((again.kept, again.inserted), (2, 0));
        assert_eq!(db::total_count(&conn).unwrap(), 1);
    }

    #[test]
    fn saved_links_load_back_as_records() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("sample.json");
        let links = vec![FilmLink {
            title: "Amélie".into(),
            url: "https://en.wikipedia.org/wiki/Am%C3%A9lie".into(),
        }];
        save_json(&links, &p).unwrap();

        let text = std::fs::read_to_string(&p).unwrap();
        assert!(text.contains("Amélie"));

        let raw = load_json(&p).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].title.as_deref(), Some("Amélie"));
        assert!(raw[0].year.is_none());
    }

    #[test]
    fn write_failure_is_io_not_json() {
        let links = vec![FilmLink {
            title: "Shrek".into(),
            url: "https://en.wikipedia.org/wiki/Shrek".into(),
        }];
        let err = write_json(FullDisk, &links, Path::new("out.json")).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
        assert!(err.to_string().contains("no space left on device"));
        assert!(!err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn crawled_records_ingest_with_year_and_source() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("films_2001.json");
        let links = vec![
            FilmLink {
                title: "Shrek".into(),
                url: "https://en.wikipedia.org/wiki/Shrek".into(),
            },
            FilmLink {
                title: "Zoolander".into(),
                url: "https://en.wikipedia.org/wiki/Zoolander".into(),
            },
        ];
        save_json(&to_raw_records(&links, 2001), &p).unwrap();

        let conn = mem();
        let s = run(&conn, &p).unwrap();
        assert_eq!(s.inserted, 2);
        assert_eq!(db::count_by_year(&conn, 2001).unwrap(), 2);

        let sources: Vec<Option<String>> = conn
            .prepare("SELECT source FROM films ORDER BY id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(sources, [Some("wikipedia".to_string()), Some("wikipedia".to_string())]);
    }
}

use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::parser::CleanRecord;

pub type Result<T> = std::result::Result<T, StoreError>;

pub fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
    )?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS films (
            id     INTEGER PRIMARY KEY AUTOINCREMENT,
            title  TEXT NOT NULL,
            url    TEXT NOT NULL UNIQUE,
            year   INTEGER,
            source TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_films_year ON films(year);
        ",
    )?;
    Ok(())
}

// ── Writes ──

/// Insert films that are not already stored, keyed on `url`. Existing rows are
/// left untouched. Returns the number of rows actually added.
///
/// Only url collisions are skipped; any other constraint failure aborts the batch.
pub fn upsert_films<I>(conn: &Connection, records: I) -> Result<usize>
where
    I: IntoIterator<Item = CleanRecord>,
{
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO films (title, url, year, source) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(url) DO NOTHING",
        )?;
        for r in records {
            count += stmt.execute(params![r.title, r.url, r.year, r.source])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Reads ──

#[derive(Debug)]
pub struct FilmRow {
    pub title: String,
    pub url: String,
    pub year: Option<i64>,
}

impl FilmRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(FilmRow {
            title: row.get(0)?,
            url: row.get(1)?,
            year: row.get(2)?,
        })
    }
}

pub fn total_count(conn: &Connection) -> Result<usize> {
    Ok(conn.query_row("SELECT COUNT(*) FROM films", [], |r| r.get(0))?)
}

/// Smallest and largest non-null year; both `None` when there are none.
pub fn year_bounds(conn: &Connection) -> Result<(Option<i64>, Option<i64>)> {
    Ok(conn.query_row("SELECT MIN(year), MAX(year) FROM films", [], |r| {
        Ok((r.get(0)?, r.get(1)?))
    })?)
}

/// Years with the most films. Undated films form their own `None` bucket.
/// Ties go to the earlier year, with `None` first.
pub fn top_years(conn: &Connection, limit: usize) -> Result<Vec<(Option<i64>, usize)>> {
    let mut stmt = conn.prepare(
        "SELECT year, COUNT(*) AS cnt
         FROM films
         GROUP BY year
         ORDER BY cnt DESC, year ASC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Random rows for eyeballing the data. Not reproducible.
pub fn sample(conn: &Connection, n: usize) -> Result<Vec<FilmRow>> {
    let mut stmt = conn.prepare(
        "SELECT title, url, year FROM films ORDER BY RANDOM() LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([n as i64], FilmRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn count_by_year(conn: &Connection, year: i64) -> Result<usize> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM films WHERE year = ?1",
        [year],
        |r| r.get(0),
    )?)
}

pub fn list_by_year(conn: &Connection, year: i64, limit: usize) -> Result<Vec<FilmRow>> {
    let mut stmt = conn.prepare(
        "SELECT title, url, year
         FROM films
         WHERE year = ?1
         ORDER BY title ASC, id ASC
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![year, limit as i64], FilmRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub min_year: Option<i64>,
    pub max_year: Option<i64>,
    pub top_years: Vec<(Option<i64>, usize)>,
    pub sample: Vec<FilmRow>,
}

pub fn get_stats(conn: &Connection, top: usize, sample_size: usize) -> Result<Stats> {
    let (min_year, max_year) = year_bounds(conn)?;
    Ok(Stats {
        total: total_count(conn)?,
        min_year,
        max_year,
        top_years: top_years(conn, top)?,
        sample: sample(conn, sample_size)?,
    })
}

use std::fmt;
use std::io::{BufRead, Write};

use anyhow::Result;
use rusqlite::Connection;
use tracing::warn;

use crate::db::{self, FilmRow};
use crate::error::StoreError;

/// Films stored for one year: the full count plus the first `limit` by title.
pub struct YearReport {
    pub year: u32,
    pub count: usize,
    pub films: Vec<FilmRow>,
}

impl YearReport {
    /// No film matched the year.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl fmt::Display for YearReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Year: {}, Count: {}", self.year, self.count)?;
        if self.is_empty() {
            return write!(f, "No results.");
        }
        for (i, film) in self.films.iter().enumerate() {
            writeln!(f, "{}. {} - {}", i + 1, film.title, film.url)?;
        }
        Ok(())
    }
}

pub fn find_by_year(conn: &Connection, year: u32, limit: usize) -> Result<YearReport, StoreError> {
    let count = db::count_by_year(conn, year.into())?;
    let films = db::list_by_year(conn, year.into(), limit)?;
    Ok(YearReport { year, count, films })
}

#[derive(Debug, PartialEq, Eq)]
pub enum YearInput {
    Year(u32),
    Quit,
}

/// Parse one line typed at the prompt: `q` quits, otherwise an unsigned year.
pub fn parse_year_input(line: &str) -> Result<YearInput, String> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return Ok(YearInput::Quit);
    }
    if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
        return Err("Please enter a valid year (digits only).".to_string());
    }
    line.parse::<u32>()
        .map(YearInput::Year)
        .map_err(|_| format!("Year {} is out of range.", line))
}

/// Prompt for years until `q` or end of input. Bad input and failed lookups
/// are reported and the loop keeps going.
pub fn interactive<R: BufRead, W: Write>(
    conn: &Connection,
    mut input: R,
    mut out: W,
    limit: usize,
) -> Result<()> {
    writeln!(out, "=== Film lookup (SQLite) ===")?;
    let mut buf = Vec::new();
    loop {
        write!(out, "Enter a year (e.g. 2024), or q to quit: ")?;
        out.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(out)?;
            break;
        }
        // Undecodable bytes become U+FFFD and fail year validation.
        let line = String::from_utf8_lossy(&buf);

        match parse_year_input(&line) {
            Ok(YearInput::Quit) => {
                writeln!(out, "Bye.")?;
                break;
            }
            Ok(YearInput::Year(year)) => match find_by_year(conn, year, limit) {
                Ok(report) => writeln!(out, "\n{}", report)?,
                Err(e) => {
                    warn!("query for {} failed: {}", year, e);
                    writeln!(out, "Query failed: {}", e)?;
                }
            },
            Err(msg) => writeln!(out, "{}", msg)?,
        }
    }
    Ok(())
}

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.wikitable").unwrap());
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("i a[href^='/wiki/'], a[href^='/wiki/']").unwrap());

/// Link texts that show up in listing tables but are never films.
const DENYLIST: &[&str] = &["edit", "cite this page"];

/// One film candidate pulled from a listing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmLink {
    pub title: String,
    pub url: String,
}

/// Scan every `wikitable` on a year listing page and return at most `cap` films,
/// in document order. `origin` is prefixed to the site-relative hrefs.
pub fn extract(html: &str, origin: &str, cap: usize) -> Vec<FilmLink> {
    let mut films = Vec::new();
    if cap == 0 {
        return films;
    }

    let doc = Html::parse_document(html);
    for table in doc.select(&TABLE_SEL) {
        for row in table.select(&ROW_SEL) {
            let Some(film) = film_from_row(row, origin) else {
                continue;
            };
            films.push(film);
            if films.len() >= cap {
                return films;
            }
        }
    }

    films
}

/// First article link in the row, unless it is blank or denylisted.
fn film_from_row(row: ElementRef<'_>, origin: &str) -> Option<FilmLink> {
    let link = row.select(&LINK_SEL).next()?;

    let title: String = link.text().map(str::trim).collect();
    let href = link.value().attr("href").unwrap_or("");
    if title.is_empty() || href.is_empty() {
        return None;
    }

    let lower = title.to_lowercase();
    if DENYLIST.contains(&lower.as_str()) {
        return None;
    }

    Some(FilmLink {
        url: format!("{}{}", origin.trim_end_matches('/'), href),
        title,
    })
}

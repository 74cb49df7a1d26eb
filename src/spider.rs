use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::Settings;
use crate::parser::{listing, to_raw_records, FilmLink, RawRecord};

/// Everything one crawl produced: year-tagged records for ingestion and the
/// bare links for the diagnostic file.
pub struct CrawlOutput {
    pub records: Vec<RawRecord>,
    pub links: Vec<FilmLink>,
}

pub fn client(settings: &Settings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// GET a page; any non-2xx status is an error.
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String> {
    let html = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Bad status from {}", url))?
        .text()
        .await
        .with_context(|| format!("Failed to read body of {}", url))?;
    Ok(html)
}

/// Fetch one year's listing page and pull at most `limit` films from it.
/// Sleeps `sleep_ms` afterwards so consecutive years are spaced out.
pub async fn crawl_year(
    client: &reqwest::Client,
    settings: &Settings,
    year: u32,
    limit: usize,
) -> Result<Vec<FilmLink>> {
    let url = settings.year_url(year);
    info!("Fetching {}", url);
    let html = fetch_html(client, &url).await?;
    let films = listing::extract(&html, &settings.origin, limit);
    info!("{}: {} films", year, films.len());
    tokio::time::sleep(Duration::from_millis(settings.sleep_ms)).await;
    Ok(films)
}

/// Crawl each year in turn. A failed year aborts the whole crawl.
pub async fn crawl_years(
    settings: &Settings,
    years: &[u32],
    limit: usize,
) -> Result<CrawlOutput> {
    let client = client(settings)?;

    let pb = ProgressBar::new(years.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} years ({msg})")?
            .progress_chars("=> "),
    );

    let mut out = CrawlOutput {
        records: Vec::new(),
        links: Vec::new(),
    };
    for &year in years {
        pb.set_message(year.to_string());
        let films = crawl_year(&client, settings, year, limit)
            .await
            .with_context(|| format!("Crawl failed for {}", year))?;
        out.records.extend(to_raw_records(&films, year));
        out.links.extend(films);
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!("Crawled {} films", out.links.len());
    Ok(out)
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use ::config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

/// Runtime settings. Layered as: built-in defaults, then `films.toml` in the
/// working directory (optional), then `FILMS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    pub json_path: PathBuf,
    pub sample_path: PathBuf,
    pub year_url_template: String,
    pub origin: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub sleep_ms: u64,
    pub crawl_limit: usize,
    pub query_limit: usize,
    pub from_year: u32,
    pub to_year: u32,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::builder()?
            .add_source(File::with_name("films").required(false))
            .add_source(Environment::with_prefix("FILMS"))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    fn builder() -> Result<ConfigBuilder<::config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("db_path", "films.db")?
            .set_default("json_path", "films_2000_2024.json")?
            .set_default("sample_path", "sample.json")?
            .set_default(
                "year_url_template",
                "https://en.wikipedia.org/wiki/List_of_American_films_of_{year}",
            )?
            .set_default("origin", "https://en.wikipedia.org")?
            .set_default(
                "user_agent",
                "Mozilla/5.0 (film_scraper; +https://github.com/zzrr208/web-course-project)",
            )?
            .set_default("timeout_secs", 15)?
            .set_default("sleep_ms", 1000)?
            .set_default("crawl_limit", 10)?
            .set_default("query_limit", 20)?
            .set_default("from_year", 2000)?
            .set_default("to_year", 2024)?)
    }

    /// Listing page URL for one year.
    pub fn year_url(&self, year: u32) -> String {
        self.year_url_template.replace("{year}", &year.to_string())
    }
}

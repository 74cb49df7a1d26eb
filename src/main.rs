mod config;
mod db;
mod error;
mod ingest;
mod parser;
mod query;
mod spider;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "film_scraper", about = "Per-year film listings: crawl, store, look up")]
struct Cli {
    /// SQLite database file (default from settings: films.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch listing pages and write the intermediate JSON file
    Crawl {
        /// Crawl a single year (overrides --from/--to)
        #[arg(short, long)]
        year: Option<u32>,
        /// First year of the range
        #[arg(long)]
        from: Option<u32>,
        /// Last year of the range (inclusive)
        #[arg(long)]
        to: Option<u32>,
        /// Max films per year
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Intermediate file to write
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Diagnostic {title, url} file to write
        #[arg(long)]
        sample: Option<PathBuf>,
    },
    /// Load the intermediate JSON file into the database
    Ingest {
        /// Intermediate file to read
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Look up films by year (interactive when no year is given)
    Query {
        year: Option<u32>,
        /// Max films to list
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show database statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(db) = cli.db {
        settings.db_path = db;
    }

    let result = match cli.command {
        Commands::Crawl {
            year,
            from,
            to,
            limit,
            out,
            sample,
        } => {
            let (from, to) = match year {
                Some(y) => (y, y),
                None => (
                    from.unwrap_or(settings.from_year),
                    to.unwrap_or(settings.to_year),
                ),
            };
            if from > to {
                bail!("--from {} is after --to {}", from, to);
            }
            let years: Vec<u32> = (from..=to).collect();
            let limit = limit.unwrap_or(settings.crawl_limit);
            let out_path = out.unwrap_or_else(|| settings.json_path.clone());
            let sample_path = sample.unwrap_or_else(|| settings.sample_path.clone());

            let crawl = spider::crawl_years(&settings, &years, limit).await?;
            println!("Fetched: {}", crawl.links.len());
            for (i, film) in crawl.links.iter().enumerate() {
                println!("{} {} {}", i + 1, film.title, film.url);
            }

            ingest::save_json(&crawl.records, &out_path)?;
            println!("Saved {}", out_path.display());
            ingest::save_json(&crawl.links, &sample_path)?;
            println!("Saved {}", sample_path.display());
            Ok(())
        }
        Commands::Ingest { input } => {
            let input = input.unwrap_or_else(|| settings.json_path.clone());
            let conn = db::connect(&settings.db_path)
                .with_context(|| format!("Failed to open {}", settings.db_path.display()))?;
            let summary = ingest::run(&conn, &input)?;
            println!(
                "Loaded {} records ({} valid). Inserted new rows: {}",
                summary.loaded, summary.kept, summary.inserted
            );
            print_stats(&db::get_stats(&conn, 10, 5)?);
            Ok(())
        }
        Commands::Query { year, limit } => {
            let limit = limit.unwrap_or(settings.query_limit);
            let conn = db::connect(&settings.db_path)
                .with_context(|| format!("Failed to open {}", settings.db_path.display()))?;
            match year {
                Some(y) => {
                    println!("{}", query::find_by_year(&conn, y, limit)?);
                    Ok(())
                }
                None => {
                    let stdin = std::io::stdin();
                    query::interactive(&conn, stdin.lock(), std::io::stdout(), limit)
                }
            }
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)
                .with_context(|| format!("Failed to open {}", settings.db_path.display()))?;
            print_stats(&db::get_stats(&conn, 10, 5)?);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_stats(s: &db::Stats) {
    println!("Total rows in DB: {}", s.total);
    println!("Year range: {} - {}", or_none(s.min_year), or_none(s.max_year));

    println!("\nTop years by film count:");
    for (year, count) in &s.top_years {
        println!("{} {}", or_none(*year), count);
    }

    println!("\nSample rows:");
    for r in &s.sample {
        println!("- {} ({}) {}", r.title, or_none(r.year), r.url);
    }
}

fn or_none(v: Option<i64>) -> String {
    v.map(|y| y.to_string()).unwrap_or_else(|| "None".into())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

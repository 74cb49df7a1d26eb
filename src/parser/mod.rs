pub mod listing;
pub mod normalize;

pub use listing::FilmLink;
pub use normalize::{CleanRecord, RawRecord};

/// Provenance tag attached to everything the crawler produces.
pub const SOURCE_TAG: &str = "wikipedia";

/// Tag extracted links with their listing year, ready for the intermediate file.
pub fn to_raw_records(films: &[FilmLink], year: u32) -> Vec<RawRecord> {
    films
        .iter()
        .map(|f| RawRecord {
            title: Some(f.title.clone()),
            url: Some(f.url.clone()),
            year: Some(year.into()),
            source: Some(SOURCE_TAG.to_string()),
        })
        .collect()
}

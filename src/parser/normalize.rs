use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Loosely-shaped record as it arrives from the crawler or a hand-edited JSON
/// file. Any field may be missing or null; string fields that hold some other
/// JSON type are treated as missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Validated film ready for the store: title and url are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRecord {
    pub title: String,
    pub url: String,
    pub year: Option<i64>,
    pub source: Option<String>,
}

fn lenient_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

pub fn normalize(raw: &RawRecord) -> Option<CleanRecord> {
    let title = raw.title.as_deref().unwrap_or("").trim();
    let url = raw.url.as_deref().unwrap_or("").trim();
    if title.is_empty() || url.is_empty() {
        return None;
    }

    let source = raw
        .source
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(CleanRecord {
        title: title.to_string(),
        url: url.to_string(),
        year: raw.year.as_ref().and_then(parse_year),
        source,
    })
}

/// Lazily normalize a batch, keeping input order. Dropped records leave no gap.
pub fn normalize_all(records: &[RawRecord]) -> impl Iterator<Item = CleanRecord> + '_ {
    records.iter().filter_map(normalize)
}

/// Integer year from a JSON value: integers as-is, numeric strings after trimming,
/// finite floats truncated. Everything else is `None`.
pub fn parse_year(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

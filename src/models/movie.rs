use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fmt::Display};

const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
const BACKDROP_BASE_URL: &str = "https://image.tmdb.org/t/p/original";

/// Movie identifier as the backend emits it
///
/// Ids come out of pandas, so the same field may arrive as an integer, a
/// float (`862.0`) or a string depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MovieId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovieId::Int(id) => write!(f, "{}", id),
            MovieId::Float(id) if id.fract() == 0.0 => write!(f, "{}", *id as i64),
            MovieId::Float(id) => write!(f, "{}", id),
            MovieId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// A recommended or looked-up movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    #[serde(rename = "movieId", default, skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<MovieId>,
    #[serde(rename = "tmdbId", default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<MovieId>,
    #[serde(default)]
    pub title: String,
    /// Pipe-separated genre list, e.g. "Adventure|Comedy"
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub runtime: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub year: Option<f64>,
    #[serde(default)]
    pub randomization_applied: Option<bool>,
    /// Fields this client does not model explicitly
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Movie {
    /// Stable key for the movie: MovieLens id first, TMDB id otherwise
    pub fn key(&self) -> Option<String> {
        self.movie_id
            .as_ref()
            .or(self.tmdb_id.as_ref())
            .map(|id| id.to_string())
    }

    /// Title without the trailing " (YYYY)" MovieLens appends
    pub fn clean_title(&self) -> &str {
        match split_year_suffix(&self.title) {
            Some((title, _)) => title,
            None => self.title.trim(),
        }
    }

    /// Release year, from the explicit field or the title suffix
    pub fn release_year(&self) -> Option<i32> {
        self.year
            .map(|y| y as i32)
            .or_else(|| split_year_suffix(&self.title).map(|(_, year)| year))
    }

    pub fn genre_list(&self) -> Vec<&str> {
        self.genres
            .as_deref()
            .map(|g| {
                g.split('|')
                    .map(str::trim)
                    .filter(|s| !s.is_empty() && *s != "(no genres listed)")
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_ref()
            .map(|p| format!("{}{}", POSTER_BASE_URL, p))
    }

    pub fn backdrop_url(&self) -> Option<String> {
        self.backdrop_path
            .as_ref()
            .map(|p| format!("{}{}", BACKDROP_BASE_URL, p))
    }

    /// Runtime formatted as "2h 5m"
    pub fn formatted_runtime(&self) -> Option<String> {
        let minutes = self.runtime? as u64;
        if minutes == 0 {
            return None;
        }
        Some(format!("{}h {}m", minutes / 60, minutes % 60))
    }
}

fn split_year_suffix(title: &str) -> Option<(&str, i32)> {
    let trimmed = title.trim_end();
    let inner = trimmed.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let digits = &inner[open + 1..];
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year = digits.parse().ok()?;
    Some((inner[..open].trim_end(), year))
}

/// Accepts numbers, numeric strings and null
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::error::GradeError;

pub const DEFAULT_BASE_URL: &str = "https://www.gradescope.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Category label paired with its weight, in configuration order.
pub type Weights = Vec<(String, f64)>;

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl SiteConfig {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, GradeError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| GradeError::config("--base-url", format!("{base_url}: {err}")))?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(GradeError::config(
                "--base-url",
                format!("must be http/https: {base_url}"),
            ));
        }
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }

    /// Absolute URL for a site endpoint such as `courses/42`.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        format!("{base}/{endpoint}")
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Uses the given values, falling back to `GRADESCRAPE_EMAIL` and
    /// `GRADESCRAPE_PASSWORD`.
    pub fn resolve(email: Option<String>, password: Option<String>) -> Result<Self, GradeError> {
        let email = email
            .or_else(|| std::env::var("GRADESCRAPE_EMAIL").ok())
            .ok_or_else(|| GradeError::config("--email", "missing (or set GRADESCRAPE_EMAIL)"))?;
        let password = password
            .or_else(|| std::env::var("GRADESCRAPE_PASSWORD").ok())
            .ok_or_else(|| {
                GradeError::config("--password", "missing (or set GRADESCRAPE_PASSWORD)")
            })?;
        Ok(Self { email, password })
    }
}

/// Parses a `LABEL=WEIGHT` pair as given on the command line.
pub fn parse_weight(raw: &str) -> Result<(String, f64), GradeError> {
    let (label, weight) = raw
        .rsplit_once('=')
        .ok_or_else(|| GradeError::config("--weight", format!("expected LABEL=WEIGHT: {raw}")))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(GradeError::config(
            "--weight",
            format!("empty category label: {raw}"),
        ));
    }
    let weight = parse_weight_value(weight.trim())
        .ok_or_else(|| GradeError::config("--weight", format!("invalid weight: {raw}")))?;
    Ok((label.to_owned(), weight))
}

/// Reads a JSON object of `{"Homework": 0.4, ...}`; key order is kept.
pub fn load_weights(path: &Path) -> Result<Weights, GradeError> {
    let raw =
        std::fs::read_to_string(path).map_err(|err| GradeError::config(path, err.to_string()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|err| GradeError::config(path, format!("not valid JSON: {err}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| GradeError::config(path, "expected a JSON object of category weights"))?;

    let mut weights = Weights::new();
    for (label, weight) in object {
        let weight = weight.as_f64().filter(|w| w.is_finite()).ok_or_else(|| {
            GradeError::config(path, format!("weight for {label:?} is not a number"))
        })?;
        insert_weight(&mut weights, label.clone(), weight);
    }
    Ok(weights)
}

/// Adds a weight, replacing an earlier entry for the same label.
pub fn insert_weight(weights: &mut Weights, label: String, weight: f64) {
    match weights.iter_mut().find(|(existing, _)| *existing == label) {
        Some(entry) => entry.1 = weight,
        None => weights.push((label, weight)),
    }
}

fn parse_weight_value(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|w| w.is_finite())
}

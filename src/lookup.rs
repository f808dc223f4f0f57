//! What happens when "fetch weather" is clicked.
//!
//! [`Lookup::run`] does the I/O; [`decide_display`] turns its results into
//! the label text and has no side effects.

use crate::cache::{ForecastCache, ForecastRecord};
use crate::config::Config;
use crate::error::{CacheError, LookupFailure, SetupError};
use crate::weather::{self, Headline, JmaClient};
use std::fmt;

pub const PROMPT_TEXT: &str = "Please select a region.";
pub const UNAVAILABLE_TEXT: &str = "Could not retrieve the weather forecast.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Straight from the API, no cache in play.
    Live,
    /// From the API, and now stored in the cache.
    Fetched,
    /// Served from the cache row written at `timestamp`.
    Cached { timestamp: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayText {
    Prompt,
    Unavailable,
    Forecast {
        office: String,
        text: String,
        origin: Origin,
    },
}

impl DisplayText {
    pub fn is_forecast(&self) -> bool {
        matches!(self, Self::Forecast { .. })
    }
}

impl fmt::Display for DisplayText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayText::Prompt => f.write_str(PROMPT_TEXT),
            DisplayText::Unavailable => f.write_str(UNAVAILABLE_TEXT),
            DisplayText::Forecast {
                office,
                text,
                origin,
            } => match origin {
                Origin::Live => write!(f, "Forecast for {}: {}", office, text),
                Origin::Fetched => write!(f, "[From API]\nForecast for {}: {}", office, text),
                Origin::Cached { timestamp } => write!(
                    f,
                    "[From cache]\nForecast for {}: {}\nRetrieved at: {}",
                    office, text, timestamp
                ),
            },
        }
    }
}

/// Pick the label contents from a cache hit and/or an API result.
///
/// A cache hit wins outright. `cached_mode` only changes how an API result
/// is labelled.
pub fn decide_display(
    cache_hit: Option<ForecastRecord>,
    api_result: Option<Result<Headline, LookupFailure>>,
    cached_mode: bool,
) -> DisplayText {
    if let Some(record) = cache_hit {
        return DisplayText::Forecast {
            office: record.area_name,
            text: record.forecast_text,
            origin: Origin::Cached {
                timestamp: record.timestamp,
            },
        };
    }

    match api_result {
        Some(Ok(headline)) => DisplayText::Forecast {
            office: headline.office,
            text: headline.text,
            origin: if cached_mode {
                Origin::Fetched
            } else {
                Origin::Live
            },
        },
        Some(Err(_)) | None => DisplayText::Unavailable,
    }
}

// Cache calls can sit in rusqlite's busy timeout; they run on the blocking pool.
async fn on_blocking_pool<T, F>(cache: &ForecastCache, op: F) -> Result<T, CacheError>
where
    F: FnOnce(&ForecastCache) -> Result<T, CacheError> + Send + 'static,
    T: Send + 'static,
{
    let cache = cache.clone();
    tokio::task::spawn_blocking(move || op(&cache)).await?
}

/// Forecast lookup, optionally backed by the read-through cache.
#[derive(Debug, Clone)]
pub struct Lookup {
    client: JmaClient,
    cache: Option<ForecastCache>,
}

impl Lookup {
    pub fn new(client: JmaClient, cache: Option<ForecastCache>) -> Self {
        Self { client, cache }
    }

    /// API-only lookup.
    pub fn direct(config: &Config) -> Result<Self, SetupError> {
        Ok(Self::new(JmaClient::new(config)?, None))
    }

    /// Lookup that checks and fills the cache at `config.database_path`.
    pub fn cached(config: &Config) -> Result<Self, SetupError> {
        let client = JmaClient::new(config)?;
        let cache = ForecastCache::open(&config.database_path)?;
        tracing::info!("Forecast cache at {}", cache.path().display());
        Ok(Self::new(client, Some(cache)))
    }

    pub fn client(&self) -> &JmaClient {
        &self.client
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub async fn run(&self, selected: Option<&str>) -> DisplayText {
        let Some(code) = selected.filter(|code| !code.is_empty()) else {
            return DisplayText::Prompt;
        };

        if let Some(record) = self.cache_hit(code).await {
            tracing::info!("Serving {} from cache ({})", code, record.timestamp);
            return decide_display(Some(record), None, true);
        }

        let result = self.fetch_headline(code).await;
        match &result {
            Ok(headline) => {
                if let Some(cache) = &self.cache {
                    let (key, office, text) =
                        (code.to_string(), headline.office.clone(), headline.text.clone());
                    let stored =
                        on_blocking_pool(cache, move |c| c.append(&key, &office, &text)).await;
                    if let Err(e) = stored {
                        tracing::warn!("Could not cache forecast for {}: {}", code, e);
                    }
                }
            }
            Err(e) => tracing::warn!("No forecast for {}: {}", code, e),
        }

        decide_display(None, Some(result), self.is_cached())
    }

    async fn cache_hit(&self, code: &str) -> Option<ForecastRecord> {
        let cache = self.cache.as_ref()?;
        let key = code.to_string();
        on_blocking_pool(cache, move |c| c.latest_for(&key))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Cache read failed for {}: {}", code, e);
                None
            })
    }

    async fn fetch_headline(&self, code: &str) -> Result<Headline, LookupFailure> {
        let payload = self.client.fetch_forecast(code).await?;
        Ok(weather::headline(&payload)?)
    }
}

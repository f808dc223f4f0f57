use crate::config::Config;
use crate::error::{ExtractError, FetchError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::instrument;

// Region list (area.json)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaList {
    #[serde(default)]
    pub offices: BTreeMap<String, Office>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Office {
    pub name: String,
}

/// A selectable region: the office code and its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub code: String,
    pub name: String,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub fn regions_from(offices: &BTreeMap<String, Office>) -> Vec<Region> {
    offices
        .iter()
        .map(|(code, office)| Region {
            code: code.clone(),
            name: office.name.clone(),
        })
        .collect()
}

// Forecast ({code}.json) - an array of reports, element 0 is the short-term one
pub type ForecastPayload = Vec<ForecastReport>;

// Only the fields on the headline path; everything else in the payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    #[serde(rename = "publishingOffice", default)]
    pub publishing_office: Option<String>,
    #[serde(rename = "timeSeries", default)]
    pub time_series: Vec<TimeSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(default)]
    pub areas: Vec<AreaForecast>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaForecast {
    #[serde(default)]
    pub weathers: Option<Vec<String>>,
}

/// The office name and headline weather text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub office: String,
    pub text: String,
}

/// Reads `[0].publishingOffice` and `[0].timeSeries[0].areas[0].weathers[0]`.
pub fn headline(payload: &[ForecastReport]) -> Result<Headline, ExtractError> {
    let report = payload.first().ok_or(ExtractError::Empty)?;
    let office = report
        .publishing_office
        .clone()
        .ok_or_else(|| ExtractError::Malformed("publishingOffice".into()))?;

    let series = report
        .time_series
        .first()
        .ok_or_else(|| ExtractError::Malformed("timeSeries[0]".into()))?;
    let area = series
        .areas
        .first()
        .ok_or_else(|| ExtractError::Malformed("timeSeries[0].areas[0]".into()))?;
    let text = area
        .weathers
        .as_ref()
        .and_then(|w| w.first())
        .cloned()
        .ok_or_else(|| ExtractError::Malformed("timeSeries[0].areas[0].weathers[0]".into()))?;

    Ok(Headline { office, text })
}

/// Client for the two read-only JMA endpoints.
#[derive(Debug, Clone)]
pub struct JmaClient {
    client: reqwest::Client,
    config: Config,
}

impl JmaClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    #[instrument(skip(self), level = "info")]
    pub async fn list_regions(&self) -> Result<BTreeMap<String, Office>, FetchError> {
        let areas: AreaList = self.get_json(&self.config.area_list_url).await?;
        Ok(areas.offices)
    }

    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(&self, code: &str) -> Result<ForecastPayload, FetchError> {
        self.get_json(&self.config.forecast_url(code)).await
    }

    /// Region list, or an empty map if anything went wrong.
    pub async fn regions_or_empty(&self) -> BTreeMap<String, Office> {
        match self.list_regions().await {
            Ok(offices) => offices,
            Err(e) => {
                tracing::warn!("Could not load region list: {}", e);
                BTreeMap::new()
            }
        }
    }

    /// Forecast payload, or an empty one if anything went wrong.
    pub async fn forecast_or_empty(&self, code: &str) -> ForecastPayload {
        match self.fetch_forecast(code).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Could not load forecast for {}: {}", code, e);
                Vec::new()
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

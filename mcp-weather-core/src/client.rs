//! Client for the US National Weather Service API (api.weather.gov).

use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const NWS_API_BASE: &str = "https://api.weather.gov";
pub const USER_AGENT: &str = "weather-app/1.0";

/// Configuration for [`WeatherClient`].
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// Base URL of the NWS API, without trailing slash.
    pub api_base: String,
    /// NWS rejects requests without a User-Agent.
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_base: NWS_API_BASE.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// `GET /alerts` response (GeoJSON feature collection)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertsResponse {
    #[serde(default)]
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertFeature {
    #[serde(default)]
    pub properties: AlertProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertProperties {
    pub event: Option<String>,
    pub area_desc: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub headline: Option<String>,
}

/// `GET /points/{lat},{lon}` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PointsResponse {
    #[serde(default)]
    pub properties: PointsProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PointsProperties {
    /// URL of the gridpoint forecast for this location.
    pub forecast: Option<String>,
}

/// Gridpoint forecast response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub properties: ForecastProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ForecastProperties {
    #[serde(default)]
    pub periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    pub name: Option<String>,
    pub temperature: Option<f64>,
    pub temperature_unit: Option<String>,
    pub wind_speed: Option<String>,
    pub wind_direction: Option<String>,
    pub short_forecast: Option<String>,
}

#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_base: String,
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Active alerts for a two-letter state code.
    pub async fn alerts(&self, state: &str) -> Result<AlertsResponse> {
        let url = format!("{}/alerts?area={}", self.api_base, state);
        self.get_json(&url).await
    }

    /// Grid point metadata for a coordinate pair.
    pub async fn points(&self, latitude: f64, longitude: f64) -> Result<PointsResponse> {
        let url = format!("{}/points/{:.4},{:.4}", self.api_base, latitude, longitude);
        self.get_json(&url).await
    }

    /// Forecast from the URL returned by [`WeatherClient::points`].
    pub async fn forecast(&self, forecast_url: &str) -> Result<ForecastResponse> {
        self.get_json(forecast_url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = url, "NWS request");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/geo+json")
            .send()
            .await
            .with_context(|| format!("Failed to send NWS request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("NWS request to {url} failed with status {status}");
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse NWS response from {}", url))
    }
}

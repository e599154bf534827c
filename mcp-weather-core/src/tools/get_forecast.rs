//! Forecast for a coordinate pair, via the NWS grid point lookup.

use crate::client::{ForecastPeriod, WeatherClient};
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct GetForecastInput {
    #[validate(range(min = -90.0, max = 90.0))]
    #[schemars(description = "Latitude of the location")]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    #[schemars(description = "Longitude of the location")]
    pub longitude: f64,
}

pub fn format_period(period: &ForecastPeriod) -> String {
    let temperature = period
        .temperature
        .map(|t| t.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    format!(
        "{}:\nTemperature: {}°{}\nWind: {} {}\n{}\n---",
        period.name.as_deref().unwrap_or("Unknown"),
        temperature,
        period.temperature_unit.as_deref().unwrap_or("F"),
        period.wind_speed.as_deref().unwrap_or("Unknown"),
        period.wind_direction.as_deref().unwrap_or(""),
        period
            .short_forecast
            .as_deref()
            .unwrap_or("No forecast available"),
    )
}

pub async fn execute(
    client: &Arc<WeatherClient>,
    input: GetForecastInput,
) -> Result<Value, Error> {
    input
        .validate()
        .map_err(|e| Error::validation(format!("Validation failed: {}", e)))?;

    let (latitude, longitude) = (input.latitude, input.longitude);
    let reply = |text: String| {
        json!({
            "latitude": latitude,
            "longitude": longitude,
            "text": text
        })
    };

    let points = match client.points(latitude, longitude).await {
        Ok(points) => points,
        Err(e) => {
            tracing::warn!(latitude, longitude, error = %e, "Grid point request failed");
            return Ok(reply(format!(
                "Failed to retrieve grid point data for coordinates: {}, {}. This location may not be supported by the NWS API (only US locations are supported).",
                latitude, longitude
            )));
        }
    };

    let Some(forecast_url) = points.properties.forecast else {
        return Ok(reply(
            "Failed to get forecast URL from grid point data".to_string(),
        ));
    };

    let forecast = match client.forecast(&forecast_url).await {
        Ok(forecast) => forecast,
        Err(e) => {
            tracing::warn!(url = %forecast_url, error = %e, "Forecast request failed");
            return Ok(reply("Failed to retrieve forecast data".to_string()));
        }
    };

    let periods = forecast.properties.periods;
    if periods.is_empty() {
        return Ok(reply("No forecast periods available".to_string()));
    }

    let formatted: Vec<String> = periods.iter().map(format_period).collect();

    Ok(reply(format!(
        "Forecast for {}, {}:\n\n{}",
        latitude,
        longitude,
        formatted.join("\n")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_period() {
        let period = ForecastPeriod {
            name: Some("Tonight".to_string()),
            temperature: Some(54.0),
            temperature_unit: Some("F".to_string()),
            wind_speed: Some("5 to 10 mph".to_string()),
            wind_direction: Some("SW".to_string()),
            short_forecast: Some("Mostly Clear".to_string()),
        };
        assert_eq!(
            format_period(&period),
            "Tonight:\nTemperature: 54°F\nWind: 5 to 10 mph SW\nMostly Clear\n---"
        );
    }

    #[test]
    fn test_format_period_defaults() {
        let text = format_period(&ForecastPeriod::default());
        assert_eq!(
            text,
            "Unknown:\nTemperature: Unknown°F\nWind: Unknown \nNo forecast available\n---"
        );
    }

    #[test]
    fn test_coordinate_ranges() {
        let ok = GetForecastInput {
            latitude: 40.7128,
            longitude: -74.006,
        };
        assert!(ok.validate().is_ok());

        let bad_lat = GetForecastInput {
            latitude: 91.0,
            longitude: 0.0,
        };
        assert!(bad_lat.validate().is_err());

        let bad_lon = GetForecastInput {
            latitude: 0.0,
            longitude: -180.5,
        };
        assert!(bad_lon.validate().is_err());
    }
}

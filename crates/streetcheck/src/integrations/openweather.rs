use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{http_client, read_success};
use crate::config::{WeatherApiConfig, OPENWEATHER_BASE_URL};
use crate::dispatch::{Coordinates, WeatherCondition, WeatherObservation};
use crate::intake::{ProviderError, WeatherProvider};

const PROVIDER: &str = "openweather";

/// Current-weather client for the OpenWeather 2.5 API, metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(api_key: Option<String>) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, OPENWEATHER_BASE_URL)
    }

    pub fn with_base_url(
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(PROVIDER)?,
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_config(config: &WeatherApiConfig) -> Result<Self, ProviderError> {
        Self::with_base_url(config.api_key.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, location: Coordinates) -> Result<WeatherObservation, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential { provider: PROVIDER })?;

        let url = format!("{}/weather", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|err| ProviderError::Transport {
                provider: PROVIDER,
                message: err.to_string(),
            })?;

        let payload: WeatherResponse = read_success(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|err| ProviderError::Decode {
                provider: PROVIDER,
                message: err.to_string(),
            })?;

        let observation = payload.into_observation()?;
        debug!(
            temperature_celsius = observation.temperature_celsius,
            condition = observation.condition.label(),
            "fetched current weather"
        );
        Ok(observation)
    }
}

// Condition and wind feed the risk rules, so neither may be defaulted.
#[derive(Debug, Deserialize)]
struct WeatherResponse {
    weather: Vec<WeatherSummary>,
    main: MainReadings,
    wind: WindReadings,
}

#[derive(Debug, Deserialize)]
struct WeatherSummary {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
}

#[derive(Debug, Deserialize)]
struct WindReadings {
    speed: f64,
}

impl WeatherResponse {
    fn into_observation(self) -> Result<WeatherObservation, ProviderError> {
        let summary = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Decode {
                provider: PROVIDER,
                message: "weather summary list is empty".to_string(),
            })?;

        let mut observation = WeatherObservation::new(
            round_tenth(self.main.temp),
            round_tenth(self.main.feels_like),
            WeatherCondition::from_label(&summary.main),
            self.wind.speed,
        );
        observation.description = summary.description;
        Ok(observation)
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_maps_first_summary_and_rounds_temperatures() {
        let payload: WeatherResponse = serde_json::from_value(serde_json::json!({
            "weather": [
                { "main": "Snow", "description": "light snow" },
                { "main": "Mist", "description": "mist" }
            ],
            "main": { "temp": 1.26, "feels_like": -2.04, "humidity": 91 },
            "wind": { "speed": 6.2 }
        }))
        .expect("payload");

        let observation = payload.into_observation().expect("observation");
        assert_eq!(observation.temperature_celsius, 1.3);
        assert_eq!(observation.feels_like_celsius, -2.0);
        assert_eq!(observation.condition, WeatherCondition::Snow);
        assert_eq!(observation.description, "light snow");
        assert_eq!(observation.wind_speed_mps, 6.2);
    }

    #[test]
    fn missing_wind_fails_to_decode() {
        let payload = serde_json::from_value::<WeatherResponse>(serde_json::json!({
            "weather": [{ "main": "Clear", "description": "clear sky" }],
            "main": { "temp": 9.0, "feels_like": 8.0 }
        }));
        assert!(payload.is_err(), "wind is required");
    }

    #[test]
    fn empty_summary_list_is_a_decode_error() {
        let payload: WeatherResponse = serde_json::from_value(serde_json::json!({
            "weather": [],
            "main": { "temp": 9.0, "feels_like": 8.0 },
            "wind": { "speed": 12.0 }
        }))
        .expect("payload");

        match payload.into_observation() {
            Err(ProviderError::Decode { provider, .. }) => assert_eq!(provider, "openweather"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}

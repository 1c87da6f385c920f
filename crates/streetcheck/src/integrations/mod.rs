//! HTTP-backed collaborators for report intake.

pub mod geocoding;
pub mod openweather;

pub use geocoding::GoogleGeocoder;
pub use openweather::OpenWeatherClient;

use crate::intake::ProviderError;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

fn http_client(provider: &'static str) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|err| ProviderError::Transport {
            provider,
            message: err.to_string(),
        })
}

async fn read_success(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        provider,
        status: status.as_u16(),
        body,
    })
}

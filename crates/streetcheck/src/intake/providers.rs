use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dispatch::{Coordinates, WeatherObservation};

/// Current conditions for a point. Implementations must not retry; a failure
/// aborts the submission before anything is routed.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, location: Coordinates) -> Result<WeatherObservation, ProviderError>;
}

/// Reverse geocoding for a report point.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, location: Coordinates) -> Result<GeocodedAddress, ProviderError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodedAddress {
    pub formatted_address: String,
    pub city: String,
    pub county: String,
    pub country: String,
    #[serde(default)]
    pub postal_code: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} credential is not configured")]
    MissingCredential { provider: &'static str },
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} responded with status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("could not decode {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} returned no results")]
    NoResults { provider: &'static str },
}

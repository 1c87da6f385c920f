use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{http_client, read_success};
use crate::config::{GeocodingConfig, GOOGLE_GEOCODING_BASE_URL};
use crate::dispatch::Coordinates;
use crate::intake::{GeocodedAddress, Geocoder, ProviderError};

const PROVIDER: &str = "google_geocoding";

/// Reverse geocoder backed by the Google Maps Geocoding API.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleGeocoder {
    pub fn new(api_key: Option<String>) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, GOOGLE_GEOCODING_BASE_URL)
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

    pub fn from_config(config: &GeocodingConfig) -> Result<Self, ProviderError> {
        Self::with_base_url(config.api_key.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn reverse(&self, location: Coordinates) -> Result<GeocodedAddress, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential { provider: PROVIDER })?;

        let latlng = format!("{},{}", location.latitude, location.longitude);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("latlng", latlng.as_str()), ("key", api_key)])
            .send()
            .await
            .map_err(|err| ProviderError::Transport {
                provider: PROVIDER,
                message: err.to_string(),
            })?;

        let payload: GeocodeResponse = read_success(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|err| ProviderError::Decode {
                provider: PROVIDER,
                message: err.to_string(),
            })?;

        if payload.status != "OK" {
            return Err(ProviderError::NoResults { provider: PROVIDER });
        }
        payload
            .results
            .into_iter()
            .next()
            .map(GeocodeResult::into_address)
            .ok_or(ProviderError::NoResults { provider: PROVIDER })
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl AddressComponent {
    fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

impl GeocodeResult {
    fn into_address(self) -> GeocodedAddress {
        let mut address = GeocodedAddress {
            formatted_address: self.formatted_address,
            ..GeocodedAddress::default()
        };

        for component in self.address_components {
            if component.has_type("locality") {
                address.city = component.long_name;
            } else if component.has_type("administrative_area_level_1") {
                address.county = component.long_name;
            } else if component.has_type("country") {
                address.country = component.short_name;
            } else if component.has_type("postal_code") {
                address.postal_code = Some(component.long_name);
            }
        }

        address
    }
}

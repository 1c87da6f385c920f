use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use streetcheck::directory::{default_organisations, OrganisationImporter};
use streetcheck::dispatch::{Coordinates, Organisation, WeatherObservation};
use streetcheck::error::AppError;
use streetcheck::intake::{GeocodedAddress, Geocoder, ProviderError, WeatherProvider};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Organisations from the given CSV export, or the built-in seed.
pub(crate) fn load_organisations(path: Option<&Path>) -> Result<Vec<Organisation>, AppError> {
    match path {
        Some(path) => Ok(OrganisationImporter::from_path(path)?),
        None => {
            let organisations = default_organisations();
            info!(count = organisations.len(), "using built-in organisation directory");
            Ok(organisations)
        }
    }
}

/// Weather collaborator that always reports the same conditions.
pub(crate) struct FixedWeather(pub(crate) WeatherObservation);

#[async_trait]
impl WeatherProvider for FixedWeather {
    async fn current(&self, _location: Coordinates) -> Result<WeatherObservation, ProviderError> {
        Ok(self.0.clone())
    }
}

/// Geocoder that resolves every point to the same locality.
pub(crate) struct FixedGeocoder(pub(crate) GeocodedAddress);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn reverse(&self, _location: Coordinates) -> Result<GeocodedAddress, ProviderError> {
        Ok(self.0.clone())
    }
}

pub(crate) fn fixed_address(city: &str, county: &str) -> GeocodedAddress {
    GeocodedAddress {
        formatted_address: format!("{city}, {county}, Ireland"),
        city: city.to_string(),
        county: county.to_string(),
        country: "IE".to_string(),
        postal_code: None,
    }
}

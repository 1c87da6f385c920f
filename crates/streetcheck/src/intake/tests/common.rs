use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::directory::default_organisations;
use crate::dispatch::{Coordinates, RoutingPolicy, WeatherCondition, WeatherObservation};
use crate::intake::{
    intake_router, ContactPreference, GeocodedAddress, Geocoder, InMemoryStore, ProviderError,
    ReportIntakeService, ReportSubmission, WeatherProvider,
};

pub(super) const DUBLIN: Coordinates = Coordinates {
    latitude: 53.3498,
    longitude: -6.2603,
};
pub(super) const CORK: Coordinates = Coordinates {
    latitude: 51.8969,
    longitude: -8.4863,
};

pub(super) type TestService = ReportIntakeService<InMemoryStore, StubWeather, StubGeocoder>;

pub(super) struct StubWeather {
    observation: Option<WeatherObservation>,
    calls: AtomicUsize,
}

impl StubWeather {
    pub(super) fn returning(observation: WeatherObservation) -> Self {
        Self {
            observation: Some(observation),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            observation: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for StubWeather {
    async fn current(&self, _location: Coordinates) -> Result<WeatherObservation, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.observation.clone().ok_or(ProviderError::Status {
            provider: "openweather",
            status: 503,
            body: "upstream unavailable".to_string(),
        })
    }
}

pub(super) struct StubGeocoder {
    address: Option<GeocodedAddress>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    pub(super) fn returning(address: GeocodedAddress) -> Self {
        Self {
            address: Some(address),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            address: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn reverse(&self, _location: Coordinates) -> Result<GeocodedAddress, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.address.clone().ok_or(ProviderError::NoResults {
            provider: "google_geocoding",
        })
    }
}

pub(super) fn observation(
    temperature: f64,
    feels_like: f64,
    condition: WeatherCondition,
) -> WeatherObservation {
    let mut observation = WeatherObservation::new(temperature, feels_like, condition, 3.0);
    observation.description = condition.label().to_lowercase();
    observation
}

pub(super) fn address(city: &str, county: &str) -> GeocodedAddress {
    GeocodedAddress {
        formatted_address: format!("1 Main Street, {city}, Ireland"),
        city: city.to_string(),
        county: county.to_string(),
        country: "IE".to_string(),
        postal_code: None,
    }
}

pub(super) fn submission_at(point: Coordinates) -> ReportSubmission {
    ReportSubmission {
        latitude: point.latitude,
        longitude: point.longitude,
        gps_accuracy_meters: Some(12.0),
        notes: Some("Sleeping in doorway, no blanket".to_string()),
        has_photo: false,
        photo_url: None,
        contact_preference: ContactPreference::Phone,
        contact_name: Some("Aoife".to_string()),
        contact_phone: Some("087 555 0101".to_string()),
        contact_email: None,
        spotter_id: None,
    }
}

pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) store: InMemoryStore,
    pub(super) weather: Arc<StubWeather>,
    pub(super) geocoder: Arc<StubGeocoder>,
}

pub(super) fn harness(weather: StubWeather, geocoder: StubGeocoder) -> Harness {
    harness_with_store(
        InMemoryStore::with_organisations(default_organisations()),
        weather,
        geocoder,
    )
}

pub(super) fn harness_with_store(
    store: InMemoryStore,
    weather: StubWeather,
    geocoder: StubGeocoder,
) -> Harness {
    let weather = Arc::new(weather);
    let geocoder = Arc::new(geocoder);
    let service = Arc::new(ReportIntakeService::new(
        Arc::new(store.clone()),
        weather.clone(),
        geocoder.clone(),
        RoutingPolicy::default(),
    ));
    Harness {
        service,
        store,
        weather,
        geocoder,
    }
}

pub(super) fn dublin_red() -> Harness {
    harness(
        StubWeather::returning(observation(1.0, -2.0, WeatherCondition::Clear)),
        StubGeocoder::returning(address("Dublin", "County Dublin")),
    )
}

pub(super) fn router_for(harness: &Harness) -> axum::Router {
    intake_router(harness.service.clone())
}

pub(super) async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

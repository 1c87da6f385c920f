use crate::cli::ServeArgs;
use crate::infra::{load_organisations, AppState};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use streetcheck::config::AppConfig;
use streetcheck::error::AppError;
use streetcheck::intake::{InMemoryStore, ReportIntakeService};
use streetcheck::integrations::{GoogleGeocoder, OpenWeatherClient};
use streetcheck::telemetry;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    if config.weather.api_key.is_none() {
        warn!("OPENWEATHER_API_KEY is not set; report submissions will fail");
    }
    if config.geocoding.api_key.is_none() {
        warn!("GOOGLE_MAPS_API_KEY is not set; report submissions will fail");
    }

    let organisations = load_organisations(config.directory.organisations_csv.as_deref())?;
    let store = Arc::new(InMemoryStore::with_organisations(organisations));
    let weather = Arc::new(OpenWeatherClient::from_config(&config.weather)?);
    let geocoder = Arc::new(GoogleGeocoder::from_config(&config.geocoding)?);
    let intake_service = Arc::new(ReportIntakeService::new(
        store,
        weather,
        geocoder,
        config.routing.policy(),
    ));

    let app = with_intake_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "streetcheck intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

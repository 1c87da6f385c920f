use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::dispatch::{CoverageZone, OrganisationId, PriorityRegion, RoutingPolicy};

pub(crate) const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub(crate) const GOOGLE_GEOCODING_BASE_URL: &str =
    "https://maps.googleapis.com/maps/api/geocode/json";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the dispatch service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub routing: RoutingConfig,
    pub weather: WeatherApiConfig,
    pub geocoding: GeocodingConfig,
    pub directory: DirectoryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match non_empty_var("APP_LOG_FORMAT") {
            Some(raw) => LogFormat::from_str(&raw),
            None if environment == AppEnvironment::Production => LogFormat::Json,
            None => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            routing: RoutingConfig::from_env()?,
            weather: WeatherApiConfig {
                api_key: non_empty_var("OPENWEATHER_API_KEY"),
                base_url: non_empty_var("OPENWEATHER_BASE_URL")
                    .unwrap_or_else(|| OPENWEATHER_BASE_URL.to_string()),
            },
            geocoding: GeocodingConfig {
                api_key: non_empty_var("GOOGLE_MAPS_API_KEY"),
                base_url: non_empty_var("GOOGLE_GEOCODING_BASE_URL")
                    .unwrap_or_else(|| GOOGLE_GEOCODING_BASE_URL.to_string()),
            },
            directory: DirectoryConfig {
                organisations_csv: non_empty_var("ORGANISATIONS_CSV").map(PathBuf::from),
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Line format for the tracing subscriber. Production defaults to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Organisation ids and thresholds fed into the routing resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConfig {
    pub default_organisation: String,
    pub priority_organisation: String,
    pub secondary_organisation: String,
    pub priority_locality: String,
    /// Geofence for the priority region, matched alongside the locality name.
    pub priority_zones: Vec<CoverageZone>,
    pub priority_max_temperature_celsius: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let policy = RoutingPolicy::default();
        Self {
            default_organisation: policy.default_organisation.0,
            priority_organisation: policy.priority_organisation.0,
            secondary_organisation: policy.secondary_organisation.0,
            priority_locality: policy.priority_region.locality_keyword,
            priority_zones: policy.priority_region.zones,
            priority_max_temperature_celsius: policy.priority_temperature_ceiling_celsius,
        }
    }
}

impl RoutingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let priority_max_temperature_celsius =
            match non_empty_var("ROUTING_PRIORITY_MAX_TEMPERATURE_C") {
                Some(raw) => raw
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or(ConfigError::InvalidTemperature { value: raw })?,
                None => defaults.priority_max_temperature_celsius,
            };

        let priority_zones = match non_empty_var("ROUTING_PRIORITY_ZONES") {
            Some(raw) => parse_zones(&raw)?,
            None => defaults.priority_zones,
        };

        Ok(Self {
            default_organisation: non_empty_var("ROUTING_DEFAULT_ORGANISATION")
                .unwrap_or(defaults.default_organisation),
            priority_organisation: non_empty_var("ROUTING_PRIORITY_ORGANISATION")
                .unwrap_or(defaults.priority_organisation),
            secondary_organisation: non_empty_var("ROUTING_SECONDARY_ORGANISATION")
                .unwrap_or(defaults.secondary_organisation),
            priority_locality: non_empty_var("ROUTING_PRIORITY_LOCALITY")
                .unwrap_or(defaults.priority_locality),
            priority_zones,
            priority_max_temperature_celsius,
        })
    }

    pub fn policy(&self) -> RoutingPolicy {
        RoutingPolicy {
            default_organisation: OrganisationId::new(&self.default_organisation),
            priority_organisation: OrganisationId::new(&self.priority_organisation),
            secondary_organisation: OrganisationId::new(&self.secondary_organisation),
            priority_region: PriorityRegion {
                locality_keyword: self.priority_locality.clone(),
                zones: self.priority_zones.clone(),
            },
            priority_temperature_ceiling_celsius: self.priority_max_temperature_celsius,
        }
    }
}

/// Zones are a JSON array in the same tagged shape the API serves, e.g.
/// `[{"type":"CIRCLE","center":{"latitude":53.35,"longitude":-6.26},"radius_km":8}]`.
fn parse_zones(raw: &str) -> Result<Vec<CoverageZone>, ConfigError> {
    let zones: Vec<CoverageZone> =
        serde_json::from_str(raw).map_err(|source| ConfigError::InvalidZones {
            reason: source.to_string(),
        })?;
    for zone in &zones {
        zone.validate().map_err(|source| ConfigError::InvalidZones {
            reason: source.to_string(),
        })?;
    }
    Ok(zones)
}

/// OpenWeather credentials. A missing key only fails when a fetch is attempted.
#[derive(Debug, Clone)]
pub struct WeatherApiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Where the organisation directory is seeded from. `None` uses the built-in seed.
#[derive(Debug, Clone, Default)]
pub struct DirectoryConfig {
    pub organisations_csv: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTemperature { value: String },
    InvalidZones { reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTemperature { value } => write!(
                f,
                "ROUTING_PRIORITY_MAX_TEMPERATURE_C must be a finite number (got '{value}')"
            ),
            ConfigError::InvalidZones { reason } => {
                write!(f, "ROUTING_PRIORITY_ZONES is not a valid zone list: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidTemperature { .. }
            | ConfigError::InvalidZones { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const ENV_KEYS: [&str; 15] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "APP_LOG_FORMAT",
        "ROUTING_DEFAULT_ORGANISATION",
        "ROUTING_PRIORITY_ORGANISATION",
        "ROUTING_SECONDARY_ORGANISATION",
        "ROUTING_PRIORITY_LOCALITY",
        "ROUTING_PRIORITY_MAX_TEMPERATURE_C",
        "ROUTING_PRIORITY_ZONES",
        "OPENWEATHER_API_KEY",
        "OPENWEATHER_BASE_URL",
        "GOOGLE_MAPS_API_KEY",
        "ORGANISATIONS_CSV",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert_eq!(config.routing, RoutingConfig::default());
        assert_eq!(config.routing.policy(), RoutingPolicy::default());
        assert!(config.weather.api_key.is_none());
        assert_eq!(config.weather.base_url, OPENWEATHER_BASE_URL);
        assert!(config.directory.organisations_csv.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn production_defaults_to_json_logs() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "prod");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.telemetry.log_format, LogFormat::Json);

        env::set_var("APP_LOG_FORMAT", "compact");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        reset_env();
    }

    #[test]
    fn routing_overrides_flow_into_policy() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ROUTING_DEFAULT_ORGANISATION", "org_cork_city_street_team");
        env::set_var("ROUTING_PRIORITY_LOCALITY", "Cork");
        env::set_var("ROUTING_PRIORITY_MAX_TEMPERATURE_C", "3.5");
        env::set_var("OPENWEATHER_API_KEY", "  ");

        let config = AppConfig::load().expect("config loads");
        let policy = config.routing.policy();
        assert_eq!(policy.default_organisation.as_str(), "org_cork_city_street_team");
        assert_eq!(policy.priority_organisation.as_str(), "org_beta_dublin");
        assert_eq!(policy.priority_region.locality_keyword, "Cork");
        assert_eq!(policy.priority_temperature_ceiling_celsius, 3.5);
        assert!(config.weather.api_key.is_none(), "blank keys are ignored");
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_priority_temperature() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ROUTING_PRIORITY_MAX_TEMPERATURE_C", "cold");
        match AppConfig::load() {
            Err(ConfigError::InvalidTemperature { value }) => assert_eq!(value, "cold"),
            other => panic!("expected invalid temperature, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn priority_zones_flow_into_region_geofence() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ROUTING_PRIORITY_LOCALITY", "Cork");
        env::set_var(
            "ROUTING_PRIORITY_ZONES",
            r#"[{"type":"CIRCLE","center":{"latitude":53.3498,"longitude":-6.2603},"radius_km":15}]"#,
        );

        let config = AppConfig::load().expect("config loads");
        let region = config.routing.policy().priority_region;
        assert_eq!(region.zones.len(), 1);
        let dun_laoghaire = crate::dispatch::Coordinates {
            latitude: 53.2940,
            longitude: -6.1339,
        };
        assert!(region.matches("Dún Laoghaire", dun_laoghaire));
        assert!(region.matches("Cork", dun_laoghaire));
        let galway = crate::dispatch::Coordinates {
            latitude: 53.2707,
            longitude: -9.0568,
        };
        assert!(!region.matches("Galway", galway));
        reset_env();
    }

    #[test]
    fn rejects_malformed_or_degenerate_priority_zones() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ROUTING_PRIORITY_ZONES", "dublin");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidZones { .. })
        ));

        env::set_var(
            "ROUTING_PRIORITY_ZONES",
            r#"[{"type":"CIRCLE","center":{"latitude":53.35,"longitude":-6.26},"radius_km":-1}]"#,
        );
        match AppConfig::load() {
            Err(ConfigError::InvalidZones { reason }) => assert!(reason.contains("radius")),
            other => panic!("expected invalid zones, got {other:?}"),
        }
        reset_env();
    }
}

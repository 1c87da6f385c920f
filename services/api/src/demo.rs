use crate::infra::{fixed_address, load_organisations, FixedGeocoder, FixedWeather};
use clap::Args;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use streetcheck::config::AppConfig;
use streetcheck::directory::default_organisations;
use streetcheck::dispatch::{
    assess, Coordinates, RoutingContext, RoutingPolicy, RoutingResolver, WeatherCondition,
    WeatherObservation,
};
use streetcheck::error::AppError;
use streetcheck::intake::{
    ContactPreference, InMemoryStore, OrganisationDirectory, ReportIntakeService,
    ReportSubmission, SubmittedReport,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct WeatherArgs {
    /// Air temperature in degrees Celsius
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) temperature: f64,
    /// Feels-like temperature in degrees Celsius (defaults to the air temperature)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) feels_like: Option<f64>,
    /// Provider condition label such as Clear, Rain or Snow
    #[arg(long, default_value = "Clear")]
    pub(crate) condition: String,
    /// Wind speed in metres per second
    #[arg(long, default_value_t = 0.0)]
    pub(crate) wind_speed: f64,
}

impl WeatherArgs {
    fn observation(&self) -> WeatherObservation {
        WeatherObservation::new(
            self.temperature,
            self.feels_like.unwrap_or(self.temperature),
            WeatherCondition::from_label(&self.condition),
            self.wind_speed,
        )
    }
}

#[derive(Args, Debug)]
pub(crate) struct ClassifyArgs {
    #[command(flatten)]
    pub(crate) weather: WeatherArgs,
}

#[derive(Args, Debug)]
pub(crate) struct RouteArgs {
    /// Report latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) latitude: f64,
    /// Report longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) longitude: f64,
    /// Geocoded locality (city) of the report
    #[arg(long, default_value = "")]
    pub(crate) locality: String,
    #[command(flatten)]
    pub(crate) weather: WeatherArgs,
    /// Organisation directory CSV (defaults to ORGANISATIONS_CSV or the built-in seed)
    #[arg(long)]
    pub(crate) organisations_csv: Option<PathBuf>,
}

pub(crate) fn run_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let observation = args.weather.observation();
    observation.validate()?;

    let assessment = assess(&observation);
    print_json(&json!({
        "tier": assessment.tier,
        "rule": assessment.rule,
        "description": assessment.tier.description(),
    }));
    Ok(())
}

pub(crate) fn run_route(args: RouteArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let csv = args
        .organisations_csv
        .or(config.directory.organisations_csv);
    let organisations = load_organisations(csv.as_deref())?;

    let location = Coordinates {
        latitude: args.latitude,
        longitude: args.longitude,
    };
    let context = RoutingContext::assess(location, args.locality, args.weather.observation())?;
    let resolver = RoutingResolver::new(config.routing.policy());
    let decision = resolver.resolve(&context, &organisations)?;

    print_json(&json!({
        "risk": context.risk,
        "decision": decision,
    }));
    Ok(())
}

struct Scenario {
    title: &'static str,
    location: Coordinates,
    city: &'static str,
    county: &'static str,
    observation: WeatherObservation,
    organisations_active: bool,
}

fn scenarios() -> Vec<Scenario> {
    let dublin = Coordinates {
        latitude: 53.3498,
        longitude: -6.2603,
    };
    let cork = Coordinates {
        latitude: 51.8969,
        longitude: -8.4863,
    };

    vec![
        Scenario {
            title: "Dublin city at 3C (amber, priority override)",
            location: dublin,
            city: "Dublin",
            county: "County Dublin",
            observation: WeatherObservation::new(3.0, 1.0, WeatherCondition::Clear, 2.0),
            organisations_active: true,
        },
        Scenario {
            title: "Cork city at 1C feels like -2C (red, nearest team)",
            location: cork,
            city: "Cork",
            county: "County Cork",
            observation: WeatherObservation::new(1.0, -2.0, WeatherCondition::Clear, 4.0),
            organisations_active: true,
        },
        Scenario {
            title: "Dublin city at 1C (red, priority plus secondary notification)",
            location: dublin,
            city: "Dublin",
            county: "County Dublin",
            observation: WeatherObservation::new(1.0, -1.0, WeatherCondition::Rain, 5.0),
            organisations_active: true,
        },
        Scenario {
            title: "Cork city with every organisation inactive (fallback)",
            location: cork,
            city: "Cork",
            county: "County Cork",
            observation: WeatherObservation::new(12.0, 11.0, WeatherCondition::Clear, 3.0),
            organisations_active: false,
        },
    ]
}

pub(crate) async fn run_demo() -> Result<(), AppError> {
    println!("StreetCheck routing demo");

    for (index, scenario) in scenarios().into_iter().enumerate() {
        println!();
        println!("Scenario {}: {}", index + 1, scenario.title);

        let (service, submitted) = run_scenario(&scenario).await?;

        println!(
            "  Risk: {} ({})",
            submitted.risk.tier.label(),
            submitted.risk.rule.unwrap_or("no rule matched")
        );
        println!(
            "  Owner: {} via {}",
            submitted.decision.owner_organisation_id,
            submitted.decision.method.label()
        );
        if let Some(distance) = submitted.decision.distance_km {
            println!("  Distance to coverage center: {:.2} km", distance);
        }
        match &submitted.decision.secondary_notification {
            Some(notification) => println!(
                "  Secondary notification: {} ({})",
                notification.organisation_id,
                notification.reason.label()
            ),
            None => println!("  Secondary notification: none"),
        }

        println!("  Audit trail for {}:", submitted.report.id);
        for entry in service.audit_trail(&submitted.report.id)? {
            println!("    - {}", entry.kind.label());
        }
    }

    Ok(())
}

type DemoService = ReportIntakeService<InMemoryStore, FixedWeather, FixedGeocoder>;

async fn run_scenario(scenario: &Scenario) -> Result<(DemoService, SubmittedReport), AppError> {
    let store = InMemoryStore::with_organisations(default_organisations());
    if !scenario.organisations_active {
        for organisation in default_organisations() {
            store.set_active(&organisation.id, false)?;
        }
    }

    let service = ReportIntakeService::new(
        Arc::new(store),
        Arc::new(FixedWeather(scenario.observation.clone())),
        Arc::new(FixedGeocoder(fixed_address(scenario.city, scenario.county))),
        RoutingPolicy::default(),
    );
    let submitted = service.submit(demo_submission(scenario.location)).await?;
    Ok((service, submitted))
}

fn demo_submission(location: Coordinates) -> ReportSubmission {
    ReportSubmission {
        latitude: location.latitude,
        longitude: location.longitude,
        gps_accuracy_meters: Some(10.0),
        notes: Some("Person sleeping rough, appears cold".to_string()),
        has_photo: false,
        photo_url: None,
        contact_preference: ContactPreference::Anonymous,
        contact_name: None,
        contact_phone: None,
        contact_email: None,
        spotter_id: None,
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => println!("Output unavailable: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streetcheck::dispatch::RoutingMethod;

    #[test]
    fn feels_like_defaults_to_air_temperature() {
        let args = WeatherArgs {
            temperature: 4.0,
            feels_like: None,
            condition: "rain".to_string(),
            wind_speed: 0.0,
        };
        let observation = args.observation();
        assert_eq!(observation.feels_like_celsius, 4.0);
        assert_eq!(observation.condition, WeatherCondition::Rain);
    }

    #[tokio::test]
    async fn scenarios_cover_every_routing_method() {
        let mut methods = Vec::new();
        for scenario in scenarios() {
            let (_, submitted) = run_scenario(&scenario).await.expect("scenario routes");
            methods.push(submitted.decision.method);
        }

        assert_eq!(
            methods,
            vec![
                RoutingMethod::DublinPriority,
                RoutingMethod::NearestOrganisation,
                RoutingMethod::DublinPriority,
                RoutingMethod::FallbackDefault,
            ]
        );
    }

    #[tokio::test]
    async fn failed_submission_is_returned_to_the_caller() {
        let scenario = Scenario {
            title: "off the map",
            location: Coordinates {
                latitude: 91.0,
                longitude: -6.2603,
            },
            city: "Dublin",
            county: "County Dublin",
            observation: WeatherObservation::new(3.0, 1.0, WeatherCondition::Clear, 2.0),
            organisations_active: true,
        };

        match run_scenario(&scenario).await {
            Err(AppError::Intake(_)) => {}
            Err(other) => panic!("expected intake error, got {other}"),
            Ok(_) => panic!("out-of-range coordinates must not route"),
        }
    }
}

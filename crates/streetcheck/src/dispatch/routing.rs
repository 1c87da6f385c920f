use serde::{Deserialize, Serialize};

use super::geo::{self, CoordinateError, Coordinates, CoverageZone};
use super::organisation::{Organisation, OrganisationId};
use super::risk::{self, RiskAssessment, RiskTier, WeatherObservation};

/// Area that receives special-case routing and notification.
///
/// A report is inside the region when its geocoded locality contains
/// `locality_keyword` (case-insensitive) or its coordinates fall inside any of
/// `zones`. An empty keyword disables name matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRegion {
    pub locality_keyword: String,
    #[serde(default)]
    pub zones: Vec<CoverageZone>,
}

impl PriorityRegion {
    pub fn locality(keyword: impl Into<String>) -> Self {
        Self {
            locality_keyword: keyword.into(),
            zones: Vec::new(),
        }
    }

    pub fn with_zone(mut self, zone: CoverageZone) -> Self {
        self.zones.push(zone);
        self
    }

    pub fn matches(&self, locality: &str, location: Coordinates) -> bool {
        let keyword = self.locality_keyword.trim();
        let by_name =
            !keyword.is_empty() && locality.to_lowercase().contains(&keyword.to_lowercase());
        by_name || self.zones.iter().any(|zone| zone.contains(location))
    }
}

/// Organisation ids and thresholds the resolver routes with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    /// Owner when no active organisation can be found.
    pub default_organisation: OrganisationId,
    /// Owner for cold reports inside the priority region.
    pub priority_organisation: OrganisationId,
    /// Receives a notification for red-tier reports inside the priority region.
    pub secondary_organisation: OrganisationId,
    pub priority_region: PriorityRegion,
    pub priority_temperature_ceiling_celsius: f64,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            default_organisation: OrganisationId::new("org_beta_dublin"),
            priority_organisation: OrganisationId::new("org_beta_dublin"),
            secondary_organisation: OrganisationId::new("org_pmvtrust"),
            priority_region: PriorityRegion::locality("dublin"),
            priority_temperature_ceiling_celsius: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingMethod {
    DublinPriority,
    NearestOrganisation,
    FallbackDefault,
}

impl RoutingMethod {
    pub const fn label(self) -> &'static str {
        match self {
            RoutingMethod::DublinPriority => "DUBLIN_PRIORITY",
            RoutingMethod::NearestOrganisation => "NEAREST_ORGANISATION",
            RoutingMethod::FallbackDefault => "FALLBACK_DEFAULT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationReason {
    RedRiskPriorityRegion,
}

impl NotificationReason {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationReason::RedRiskPriorityRegion => "RED_RISK_PRIORITY_REGION",
        }
    }
}

/// Alert to a second organisation that does not transfer ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryNotification {
    pub organisation_id: OrganisationId,
    pub reason: NotificationReason,
}

/// Resolver output. `distance_km` is set exactly when `method` is
/// [`RoutingMethod::NearestOrganisation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    pub owner_organisation_id: OrganisationId,
    pub method: RoutingMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_notification: Option<SecondaryNotification>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(#[from] CoordinateError),
    #[error("invalid weather observation: {field} = {value}")]
    InvalidObservation { field: &'static str, value: f64 },
}

/// Inputs for a single resolution, assessed once per report.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingContext {
    pub location: Coordinates,
    pub locality: String,
    pub observation: WeatherObservation,
    pub risk: RiskAssessment,
}

impl RoutingContext {
    /// Validate the inputs and classify the observation.
    pub fn assess(
        location: Coordinates,
        locality: impl Into<String>,
        observation: WeatherObservation,
    ) -> Result<Self, RoutingError> {
        location.validate()?;
        observation.validate()?;
        let risk = risk::assess(&observation);

        Ok(Self {
            location,
            locality: locality.into(),
            observation,
            risk,
        })
    }

    pub fn risk_tier(&self) -> RiskTier {
        self.risk.tier
    }
}

struct PrimaryRoute {
    owner: OrganisationId,
    method: RoutingMethod,
    distance_km: Option<f64>,
}

impl PrimaryRoute {
    fn fallback(policy: &RoutingPolicy) -> Self {
        Self {
            owner: policy.default_organisation.clone(),
            method: RoutingMethod::FallbackDefault,
            distance_km: None,
        }
    }
}

type PrimaryRule = fn(
    &RoutingPolicy,
    &RoutingContext,
    &[Organisation],
) -> Result<Option<PrimaryRoute>, RoutingError>;

// Evaluated in order; the first rule to return a route owns the report. When
// none does, the policy default owns it.
const PRIMARY_RULES: [PrimaryRule; 2] = [priority_override, nearest_organisation];

fn priority_override(
    policy: &RoutingPolicy,
    context: &RoutingContext,
    _organisations: &[Organisation],
) -> Result<Option<PrimaryRoute>, RoutingError> {
    let in_region = policy
        .priority_region
        .matches(&context.locality, context.location);
    let cold = context.observation.temperature_celsius
        <= policy.priority_temperature_ceiling_celsius;

    Ok((in_region && cold).then(|| PrimaryRoute {
        owner: policy.priority_organisation.clone(),
        method: RoutingMethod::DublinPriority,
        distance_km: None,
    }))
}

fn nearest_organisation(
    _policy: &RoutingPolicy,
    context: &RoutingContext,
    organisations: &[Organisation],
) -> Result<Option<PrimaryRoute>, RoutingError> {
    let nearest = geo::nearest(context.location, organisations)?;
    Ok(nearest.map(|found| PrimaryRoute {
        owner: found.id,
        method: RoutingMethod::NearestOrganisation,
        distance_km: Some(found.distance_km),
    }))
}

/// Stateless resolver applying a [`RoutingPolicy`] to one report at a time.
#[derive(Debug, Clone, Default)]
pub struct RoutingResolver {
    policy: RoutingPolicy,
}

impl RoutingResolver {
    pub fn new(policy: RoutingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    /// Pick the owning organisation and any secondary notification.
    ///
    /// `organisations` is a snapshot taken by the caller for this report only;
    /// inactive entries in it are ignored.
    pub fn resolve(
        &self,
        context: &RoutingContext,
        organisations: &[Organisation],
    ) -> Result<RoutingDecision, RoutingError> {
        context.location.validate()?;

        let PrimaryRoute {
            owner,
            method,
            distance_km,
        } = PRIMARY_RULES
            .iter()
            .find_map(|rule| rule(&self.policy, context, organisations).transpose())
            .transpose()?
            .unwrap_or_else(|| PrimaryRoute::fallback(&self.policy));

        Ok(RoutingDecision {
            owner_organisation_id: owner,
            method,
            distance_km,
            secondary_notification: self.secondary_notification(context),
        })
    }

    fn secondary_notification(&self, context: &RoutingContext) -> Option<SecondaryNotification> {
        let in_region = self
            .policy
            .priority_region
            .matches(&context.locality, context.location);

        (context.risk_tier() == RiskTier::Red && in_region).then(|| SecondaryNotification {
            organisation_id: self.policy.secondary_organisation.clone(),
            reason: NotificationReason::RedRiskPriorityRegion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::organisation::{Country, OrganisationType};
    use crate::dispatch::risk::WeatherCondition;

    const DUBLIN: Coordinates = Coordinates {
        latitude: 53.3498,
        longitude: -6.2603,
    };
    const CORK: Coordinates = Coordinates {
        latitude: 51.8969,
        longitude: -8.4863,
    };

    fn organisation(id: &str, center: Coordinates) -> Organisation {
        Organisation {
            id: OrganisationId::new(id),
            name: id.to_string(),
            kind: OrganisationType::Primary,
            primary_contact_email: format!("{id}@example.ie"),
            primary_contact_phone: "(01) 555 0000".to_string(),
            active: true,
            country: Country::Ireland,
            coverage_zones: Vec::new(),
            coverage_center: center,
        }
    }

    fn context(
        location: Coordinates,
        locality: &str,
        temp: f64,
        feels_like: f64,
    ) -> RoutingContext {
        RoutingContext::assess(
            location,
            locality,
            WeatherObservation::new(temp, feels_like, WeatherCondition::Clear, 2.0),
        )
        .expect("valid context")
    }

    #[test]
    fn priority_override_uses_raw_temperature_not_tier() {
        // 5 °C clear with a mild feels-like is only amber, yet still within the override.
        let resolver = RoutingResolver::default();
        let ctx = context(DUBLIN, "Dublin 8", 5.0, 4.0);
        assert_eq!(ctx.risk_tier(), RiskTier::Amber);

        let decision = resolver
            .resolve(&ctx, &[organisation("org_other", DUBLIN)])
            .expect("resolves");
        assert_eq!(decision.method, RoutingMethod::DublinPriority);
        assert_eq!(decision.owner_organisation_id.as_str(), "org_beta_dublin");
        assert!(decision.distance_km.is_none());
        assert!(decision.secondary_notification.is_none());
    }

    #[test]
    fn warm_priority_region_reports_use_nearest() {
        let resolver = RoutingResolver::default();
        let ctx = context(DUBLIN, "Dublin", 12.0, 11.0);

        let decision = resolver
            .resolve(
                &ctx,
                &[organisation("org_cork", CORK), organisation("org_city", DUBLIN)],
            )
            .expect("resolves");
        assert_eq!(decision.method, RoutingMethod::NearestOrganisation);
        assert_eq!(decision.owner_organisation_id.as_str(), "org_city");
        assert_eq!(decision.distance_km, Some(0.0));
    }

    #[test]
    fn secondary_notification_is_independent_of_primary_rule() {
        // Priority override disabled by a sub-zero ceiling: routing falls through to
        // nearest, but a red Dublin report still notifies the secondary organisation.
        let policy = RoutingPolicy {
            priority_temperature_ceiling_celsius: -40.0,
            ..RoutingPolicy::default()
        };
        let resolver = RoutingResolver::new(policy);
        let ctx = context(DUBLIN, "Dublin", 1.0, -2.0);

        let decision = resolver
            .resolve(&ctx, &[organisation("org_city", DUBLIN)])
            .expect("resolves");
        assert_eq!(decision.method, RoutingMethod::NearestOrganisation);
        assert_eq!(
            decision.secondary_notification,
            Some(SecondaryNotification {
                organisation_id: OrganisationId::new("org_pmvtrust"),
                reason: NotificationReason::RedRiskPriorityRegion,
            })
        );
    }

    #[test]
    fn configured_ids_replace_defaults() {
        let policy = RoutingPolicy {
            default_organisation: OrganisationId::new("org_fallback"),
            ..RoutingPolicy::default()
        };
        let resolver = RoutingResolver::new(policy);
        let ctx = context(CORK, "Cork", 12.0, 11.0);

        let decision = resolver.resolve(&ctx, &[]).expect("resolves");
        assert_eq!(decision.method, RoutingMethod::FallbackDefault);
        assert_eq!(decision.owner_organisation_id.as_str(), "org_fallback");
    }

    #[test]
    fn zone_membership_matches_without_locality_name() {
        let region = PriorityRegion::locality("dublin").with_zone(CoverageZone::Circle {
            center: CORK,
            radius_km: 10.0,
        });
        assert!(region.matches("Ballincollig", CORK));
        assert!(region.matches("DUBLIN CITY", DUBLIN));
        let galway = Coordinates {
            latitude: 53.2707,
            longitude: -9.0568,
        };
        assert!(!region.matches("Galway", galway));
    }

    #[test]
    fn empty_keyword_never_matches_by_name() {
        let region = PriorityRegion::locality("  ");
        assert!(!region.matches("Dublin", DUBLIN));
    }

    #[test]
    fn assess_rejects_invalid_inputs() {
        let observation = WeatherObservation::new(4.0, 2.0, WeatherCondition::Rain, 3.0);
        let bad_point = Coordinates {
            latitude: f64::INFINITY,
            longitude: -6.0,
        };
        assert!(matches!(
            RoutingContext::assess(bad_point, "Dublin", observation.clone()),
            Err(RoutingError::InvalidCoordinates(_))
        ));

        let mut bad_weather = observation;
        bad_weather.temperature_celsius = f64::NAN;
        assert!(matches!(
            RoutingContext::assess(DUBLIN, "Dublin", bad_weather),
            Err(RoutingError::InvalidObservation {
                field: "temperature_celsius",
                ..
            })
        ));
    }

    #[test]
    fn resolve_revalidates_context_location() {
        let mut ctx = context(CORK, "Cork", 12.0, 11.0);
        ctx.location.latitude = 120.0;
        assert!(matches!(
            RoutingResolver::default().resolve(&ctx, &[]),
            Err(RoutingError::InvalidCoordinates(
                CoordinateError::LatitudeOutOfRange(_)
            ))
        ));
    }

    #[test]
    fn decisions_serialize_with_wire_labels() {
        let ctx = context(DUBLIN, "Dublin", 1.0, -1.0);
        let decision = RoutingResolver::default()
            .resolve(&ctx, &[])
            .expect("resolves");
        let json = serde_json::to_value(&decision).expect("serializes");
        assert_eq!(json["method"], "DUBLIN_PRIORITY");
        assert_eq!(
            json["secondary_notification"]["reason"],
            "RED_RISK_PRIORITY_REGION"
        );
        assert!(json.get("distance_km").is_none());
    }
}

use streetcheck::directory::default_organisations;
use streetcheck::dispatch::{
    Coordinates, CoverageZone, NotificationReason, Organisation, PriorityRegion, RiskTier,
    RoutingContext, RoutingDecision, RoutingMethod, RoutingPolicy, RoutingResolver,
    WeatherCondition, WeatherObservation,
};

const DUBLIN_CITY: Coordinates = Coordinates {
    latitude: 53.3498,
    longitude: -6.2603,
};
const CORK_CITY: Coordinates = Coordinates {
    latitude: 51.8969,
    longitude: -8.4863,
};

fn route(
    resolver: &RoutingResolver,
    location: Coordinates,
    locality: &str,
    observation: WeatherObservation,
    organisations: &[Organisation],
) -> RoutingDecision {
    let context = RoutingContext::assess(location, locality, observation).expect("valid inputs");
    resolver
        .resolve(&context, organisations)
        .expect("resolution succeeds")
}

fn assert_distance_matches_method(decision: &RoutingDecision) {
    assert_eq!(
        decision.distance_km.is_some(),
        decision.method == RoutingMethod::NearestOrganisation,
        "distance present iff nearest routing: {decision:?}"
    );
}

#[test]
fn cold_amber_dublin_report_goes_to_priority_owner() {
    let resolver = RoutingResolver::default();
    let observation = WeatherObservation::new(3.0, 1.0, WeatherCondition::Clear, 2.0);

    let decision = route(
        &resolver,
        DUBLIN_CITY,
        "Dublin",
        observation.clone(),
        &default_organisations(),
    );

    assert_eq!(streetcheck::dispatch::classify(&observation), RiskTier::Amber);
    assert_eq!(decision.owner_organisation_id.as_str(), "org_beta_dublin");
    assert_eq!(decision.method, RoutingMethod::DublinPriority);
    assert!(decision.secondary_notification.is_none());
    assert_distance_matches_method(&decision);
}

#[test]
fn red_cork_report_goes_to_the_local_team() {
    let resolver = RoutingResolver::default();
    let observation = WeatherObservation::new(1.0, -2.0, WeatherCondition::Clear, 4.0);

    let decision = route(
        &resolver,
        CORK_CITY,
        "Cork",
        observation,
        &default_organisations(),
    );

    assert_eq!(
        decision.owner_organisation_id.as_str(),
        "org_cork_city_street_team"
    );
    assert_eq!(decision.method, RoutingMethod::NearestOrganisation);
    assert!(decision.distance_km.expect("distance") < 0.001);
    assert!(decision.secondary_notification.is_none());
    assert_distance_matches_method(&decision);
}

#[test]
fn red_dublin_report_also_notifies_secondary() {
    let resolver = RoutingResolver::default();
    let observation = WeatherObservation::new(1.0, -1.0, WeatherCondition::Snow, 6.0);

    let decision = route(
        &resolver,
        DUBLIN_CITY,
        "Dublin 1",
        observation,
        &default_organisations(),
    );

    assert_eq!(decision.method, RoutingMethod::DublinPriority);
    let notification = decision
        .secondary_notification
        .as_ref()
        .expect("secondary notification");
    assert_eq!(notification.organisation_id.as_str(), "org_pmvtrust");
    assert_eq!(notification.reason, NotificationReason::RedRiskPriorityRegion);
    assert_distance_matches_method(&decision);
}

#[test]
fn no_active_organisations_falls_back_to_default() {
    let resolver = RoutingResolver::default();
    let inactive: Vec<Organisation> = default_organisations()
        .into_iter()
        .map(|mut organisation| {
            organisation.active = false;
            organisation
        })
        .collect();
    let observation = WeatherObservation::new(14.0, 13.0, WeatherCondition::Clear, 2.0);

    let decision = route(&resolver, CORK_CITY, "Cork", observation, &inactive);

    assert_eq!(decision.owner_organisation_id.as_str(), "org_beta_dublin");
    assert_eq!(decision.method, RoutingMethod::FallbackDefault);
    assert_distance_matches_method(&decision);
}

#[test]
fn warm_dublin_report_uses_nearest_search() {
    let resolver = RoutingResolver::default();
    let observation = WeatherObservation::new(16.0, 15.0, WeatherCondition::Clear, 2.0);
    let north_dublin = Coordinates::new(53.3850, -6.2550).expect("valid point");

    let decision = route(
        &resolver,
        north_dublin,
        "Dublin",
        observation,
        &default_organisations(),
    );

    assert_eq!(decision.method, RoutingMethod::NearestOrganisation);
    assert_eq!(
        decision.owner_organisation_id.as_str(),
        "org_dublin_north_outreach"
    );
    assert_distance_matches_method(&decision);
}

#[test]
fn geofenced_region_catches_reports_with_unhelpful_locality() {
    let policy = RoutingPolicy {
        priority_region: PriorityRegion::locality("dublin").with_zone(CoverageZone::Circle {
            center: DUBLIN_CITY,
            radius_km: 15.0,
        }),
        ..RoutingPolicy::default()
    };
    let resolver = RoutingResolver::new(policy);
    let observation = WeatherObservation::new(0.5, -3.0, WeatherCondition::Clear, 2.0);
    let dun_laoghaire = Coordinates::new(53.2944, -6.1339).expect("valid point");

    let decision = route(
        &resolver,
        dun_laoghaire,
        "Dún Laoghaire",
        observation,
        &default_organisations(),
    );

    assert_eq!(decision.method, RoutingMethod::DublinPriority);
    assert!(decision.secondary_notification.is_some());
}

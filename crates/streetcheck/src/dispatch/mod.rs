//! Pure decision engine: weather risk tiers, nearest-organisation search and
//! report routing rules. Nothing in here performs I/O.

pub mod geo;
pub mod organisation;
pub mod risk;
pub mod routing;

pub use geo::{
    haversine_km, nearest, CoordinateError, Coordinates, CoverageZone, NearestOrganisation,
    ZoneError,
};
pub use organisation::{Country, Organisation, OrganisationId, OrganisationType};
pub use risk::{
    assess, classify, RiskAssessment, RiskTier, WeatherCondition, WeatherObservation,
};
pub use routing::{
    NotificationReason, PriorityRegion, RoutingContext, RoutingDecision, RoutingError,
    RoutingMethod, RoutingPolicy, RoutingResolver, SecondaryNotification,
};

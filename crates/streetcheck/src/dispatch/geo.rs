use serde::{Deserialize, Serialize};
use tracing::warn;

use super::organisation::{Organisation, OrganisationId};

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        let point = Self {
            latitude,
            longitude,
        };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(CoordinateError::NonFinite {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("coordinates must be finite (got {latitude}, {longitude})")]
    NonFinite { latitude: f64, longitude: f64 },
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // Rounding can push near-antipodal points just past 1.
    let h = h.min(1.0);

    2.0 * h.sqrt().atan2((1.0 - h).sqrt()) * EARTH_RADIUS_KM
}

/// Closest active organisation and how far away its coverage center is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestOrganisation {
    pub id: OrganisationId,
    pub distance_km: f64,
}

/// Linear scan for the closest active organisation.
///
/// Inactive entries are skipped, as are entries whose coverage center is not a
/// valid point. Comparison is strict so the earliest of several equidistant
/// organisations wins; callers that need reproducible ties must pass a stable
/// ordering.
pub fn nearest<'a, I>(
    point: Coordinates,
    organisations: I,
) -> Result<Option<NearestOrganisation>, CoordinateError>
where
    I: IntoIterator<Item = &'a Organisation>,
{
    point.validate()?;

    let mut best: Option<(&'a Organisation, f64)> = None;
    for organisation in organisations {
        if !organisation.active {
            continue;
        }
        if let Err(err) = organisation.coverage_center.validate() {
            warn!(
                organisation_id = %organisation.id,
                error = %err,
                "skipping organisation with invalid coverage center"
            );
            continue;
        }

        let distance = haversine_km(point, organisation.coverage_center);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((organisation, distance)),
        }
    }

    Ok(best.map(|(organisation, distance_km)| NearestOrganisation {
        id: organisation.id.clone(),
        distance_km,
    }))
}

/// Geographic area served by an organisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageZone {
    Circle {
        center: Coordinates,
        radius_km: f64,
    },
    Polygon {
        vertices: Vec<Coordinates>,
    },
}

impl CoverageZone {
    pub fn contains(&self, point: Coordinates) -> bool {
        match self {
            CoverageZone::Circle { center, radius_km } => {
                haversine_km(*center, point) <= *radius_km
            }
            CoverageZone::Polygon { vertices } => polygon_contains(vertices, point),
        }
    }

    pub fn validate(&self) -> Result<(), ZoneError> {
        match self {
            CoverageZone::Circle { center, radius_km } => {
                center.validate()?;
                if !radius_km.is_finite() || *radius_km <= 0.0 {
                    return Err(ZoneError::NonPositiveRadius(*radius_km));
                }
            }
            CoverageZone::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(ZoneError::TooFewVertices(vertices.len()));
                }
                for vertex in vertices {
                    vertex.validate()?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ZoneError {
    #[error("zone point is invalid: {0}")]
    Point(#[from] CoordinateError),
    #[error("circle radius must be positive, got {0}")]
    NonPositiveRadius(f64),
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
}

// Even-odd ray cast in the lat/lng plane. Adequate for city-scale polygons
// that do not straddle the antimeridian.
fn polygon_contains(vertices: &[Coordinates], point: Coordinates) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut previous = vertices[vertices.len() - 1];
    for &current in vertices {
        let above = current.latitude > point.latitude;
        if above != (previous.latitude > point.latitude) {
            let intersect_lng = current.longitude
                + (point.latitude - current.latitude) * (previous.longitude - current.longitude)
                    / (previous.latitude - current.latitude);
            if point.longitude < intersect_lng {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

use serde::{Deserialize, Serialize};

use super::geo::{Coordinates, CoverageZone};

/// Stable identifier for a responder organisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganisationId(pub String);

impl OrganisationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrganisationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganisationType {
    Primary,
    Secondary,
    Outreach,
}

impl OrganisationType {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "PRIMARY" => Some(Self::Primary),
            "SECONDARY" => Some(Self::Secondary),
            "OUTREACH" => Some(Self::Outreach),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "IE")]
    Ireland,
    #[serde(rename = "UK")]
    UnitedKingdom,
}

impl Country {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "IE" => Some(Self::Ireland),
            "UK" | "GB" => Some(Self::UnitedKingdom),
            _ => None,
        }
    }
}

/// Responder organisation as held in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organisation {
    pub id: OrganisationId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OrganisationType,
    pub primary_contact_email: String,
    pub primary_contact_phone: String,
    pub active: bool,
    pub country: Country,
    #[serde(default)]
    pub coverage_zones: Vec<CoverageZone>,
    pub coverage_center: Coordinates,
}

impl Organisation {
    pub fn covers(&self, point: Coordinates) -> bool {
        self.coverage_zones.iter().any(|zone| zone.contains(point))
    }
}

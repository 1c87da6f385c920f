use crate::dispatch::{
    Coordinates, Country, CoverageZone, Organisation, OrganisationId, OrganisationType,
};
use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::DirectoryImportError;

pub(crate) fn parse_organisations<R: Read>(
    reader: R,
) -> Result<Vec<Organisation>, DirectoryImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut organisations = Vec::new();

    // Header is line 1, so the first data row is line 2.
    for (index, record) in csv_reader.deserialize::<OrganisationRow>().enumerate() {
        let row = record?;
        organisations.push(row.into_organisation(index + 2)?);
    }

    Ok(organisations)
}

#[derive(Debug, Deserialize)]
struct OrganisationRow {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    active: Option<String>,
    country: String,
    center_lat: f64,
    center_lng: f64,
    #[serde(default)]
    radius_km: Option<f64>,
}

impl OrganisationRow {
    fn into_organisation(self, line: usize) -> Result<Organisation, DirectoryImportError> {
        let invalid = |reason: String| DirectoryImportError::InvalidRow { line, reason };

        if self.id.trim().is_empty() {
            return Err(invalid("organisation id is empty".to_string()));
        }
        let kind = OrganisationType::from_label(&self.kind)
            .ok_or_else(|| invalid(format!("unknown organisation type '{}'", self.kind)))?;
        let country = Country::from_code(&self.country)
            .ok_or_else(|| invalid(format!("unknown country '{}'", self.country)))?;
        let active = match self.active.as_deref() {
            None => true,
            Some(value) => parse_flag(value)
                .ok_or_else(|| invalid(format!("active must be true or false, got '{value}'")))?,
        };
        let center = Coordinates::new(self.center_lat, self.center_lng)
            .map_err(|err| invalid(err.to_string()))?;

        let coverage_zones = match self.radius_km {
            Some(radius_km) if radius_km.is_finite() && radius_km > 0.0 => {
                vec![CoverageZone::Circle { center, radius_km }]
            }
            Some(radius_km) => {
                return Err(invalid(format!("radius_km must be positive, got {radius_km}")))
            }
            None => Vec::new(),
        };

        Ok(Organisation {
            id: OrganisationId::new(self.id),
            name: self.name,
            kind,
            primary_contact_email: self.email.unwrap_or_default(),
            primary_contact_phone: self.phone.unwrap_or_default(),
            active,
            country,
            coverage_zones,
            coverage_center: center,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

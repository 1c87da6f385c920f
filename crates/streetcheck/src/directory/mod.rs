//! Responder organisation directory: the built-in seed and a CSV importer.

mod parser;

use crate::dispatch::{
    Coordinates, Country, CoverageZone, Organisation, OrganisationId, OrganisationType,
};
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum DirectoryImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: usize, reason: String },
    DuplicateId(OrganisationId),
}

impl std::fmt::Display for DirectoryImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryImportError::Io(err) => {
                write!(f, "failed to read organisation directory: {}", err)
            }
            DirectoryImportError::Csv(err) => write!(f, "invalid organisation CSV data: {}", err),
            DirectoryImportError::InvalidRow { line, reason } => {
                write!(f, "invalid organisation on line {}: {}", line, reason)
            }
            DirectoryImportError::DuplicateId(id) => {
                write!(f, "organisation '{}' appears more than once", id)
            }
        }
    }
}

impl std::error::Error for DirectoryImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DirectoryImportError::Io(err) => Some(err),
            DirectoryImportError::Csv(err) => Some(err),
            DirectoryImportError::InvalidRow { .. } | DirectoryImportError::DuplicateId(_) => None,
        }
    }
}

impl From<std::io::Error> for DirectoryImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for DirectoryImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads organisations from a CSV export, preserving file order.
///
/// Expected header:
/// `id,name,type,email,phone,active,country,center_lat,center_lng,radius_km`.
/// A blank `active` column means active; a blank `radius_km` yields no coverage zone.
pub struct OrganisationImporter;

impl OrganisationImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Organisation>, DirectoryImportError> {
        let file = std::fs::File::open(path.as_ref())?;
        let organisations = Self::from_reader(file)?;
        info!(
            path = %path.as_ref().display(),
            count = organisations.len(),
            "loaded organisation directory"
        );
        Ok(organisations)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Organisation>, DirectoryImportError> {
        let organisations = parser::parse_organisations(reader)?;

        let mut seen = std::collections::HashSet::new();
        for organisation in &organisations {
            if !seen.insert(organisation.id.as_str()) {
                return Err(DirectoryImportError::DuplicateId(organisation.id.clone()));
            }
        }

        Ok(organisations)
    }
}

struct SeedEntry {
    id: &'static str,
    name: &'static str,
    kind: OrganisationType,
    email: &'static str,
    phone: &'static str,
    latitude: f64,
    longitude: f64,
    radius_km: f64,
}

const SEED: [SeedEntry; 5] = [
    SeedEntry {
        id: "org_beta_dublin",
        name: "Beta",
        kind: OrganisationType::Primary,
        email: "info@beta.ie",
        phone: "(01) 555 1234",
        latitude: 53.3498,
        longitude: -6.2603,
        radius_km: 15.0,
    },
    SeedEntry {
        id: "org_pmvtrust",
        name: "Peter McVerry Trust",
        kind: OrganisationType::Secondary,
        email: "info@pmvtrust.ie",
        phone: "(01) 823 0776",
        latitude: 53.3498,
        longitude: -6.2603,
        radius_km: 15.0,
    },
    SeedEntry {
        id: "org_dublin_north_outreach",
        name: "Dublin North Outreach",
        kind: OrganisationType::Outreach,
        email: "contact@dublinnorthoutreach.ie",
        phone: "(01) 555 2345",
        latitude: 53.3807,
        longitude: -6.2543,
        radius_km: 10.0,
    },
    SeedEntry {
        id: "org_dublin_south_outreach",
        name: "Dublin South Outreach",
        kind: OrganisationType::Outreach,
        email: "contact@dublinsouthoutreach.ie",
        phone: "(01) 555 3456",
        latitude: 53.3189,
        longitude: -6.2603,
        radius_km: 10.0,
    },
    SeedEntry {
        id: "org_cork_city_street_team",
        name: "Cork City Street Team",
        kind: OrganisationType::Primary,
        email: "info@corkstreetteam.ie",
        phone: "(021) 555 4567",
        latitude: 51.8969,
        longitude: -8.4863,
        radius_km: 12.0,
    },
];

/// The organisations every fresh deployment starts with.
pub fn default_organisations() -> Vec<Organisation> {
    SEED.iter()
        .map(|entry| {
            let center = Coordinates {
                latitude: entry.latitude,
                longitude: entry.longitude,
            };
            Organisation {
                id: OrganisationId::new(entry.id),
                name: entry.name.to_string(),
                kind: entry.kind,
                primary_contact_email: entry.email.to_string(),
                primary_contact_phone: entry.phone.to_string(),
                active: true,
                country: Country::Ireland,
                coverage_zones: vec![CoverageZone::Circle {
                    center,
                    radius_km: entry.radius_km,
                }],
                coverage_center: center,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_lists_beta_first_and_all_active() {
        let organisations = default_organisations();
        assert_eq!(organisations.len(), 5);
        assert_eq!(organisations[0].id.as_str(), "org_beta_dublin");
        assert!(organisations.iter().all(|org| org.active));
        assert!(organisations
            .iter()
            .all(|org| org.covers(org.coverage_center)));
    }

    #[test]
    fn importer_reads_rows_in_file_order() {
        let csv = "\
id,name,type,email,phone,active,country,center_lat,center_lng,radius_km
org_galway,Galway Street Team,primary,info@galway.ie,(091) 555 0101,true,IE,53.2707,-9.0568,8
org_belfast,Belfast Outreach,OUTREACH,,,no,UK,54.5973,-5.9301,
";
        let organisations = OrganisationImporter::from_reader(csv.as_bytes()).expect("imports");

        assert_eq!(organisations.len(), 2);
        let galway = &organisations[0];
        assert_eq!(galway.id.as_str(), "org_galway");
        assert_eq!(galway.kind, OrganisationType::Primary);
        assert!(galway.active);
        assert_eq!(galway.coverage_zones.len(), 1);

        let belfast = &organisations[1];
        assert_eq!(belfast.country, Country::UnitedKingdom);
        assert!(!belfast.active);
        assert!(belfast.primary_contact_email.is_empty());
        assert!(belfast.coverage_zones.is_empty());
    }

    #[test]
    fn importer_reports_line_of_invalid_row() {
        let csv = "\
id,name,type,email,phone,active,country,center_lat,center_lng,radius_km
org_ok,Ok,PRIMARY,,,true,IE,53.0,-6.0,5
org_bad,Bad,SHELTER,,,true,IE,53.0,-6.0,5
";
        match OrganisationImporter::from_reader(csv.as_bytes()) {
            Err(DirectoryImportError::InvalidRow { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("SHELTER"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn importer_rejects_out_of_range_center_and_duplicates() {
        let out_of_range = "\
id,name,type,email,phone,active,country,center_lat,center_lng,radius_km
org_x,X,PRIMARY,,,true,IE,95.0,-6.0,5
";
        assert!(matches!(
            OrganisationImporter::from_reader(out_of_range.as_bytes()),
            Err(DirectoryImportError::InvalidRow { line: 2, .. })
        ));

        let duplicate = "\
id,name,type,email,phone,active,country,center_lat,center_lng,radius_km
org_x,X,PRIMARY,,,true,IE,53.0,-6.0,5
org_x,X again,OUTREACH,,,true,IE,53.1,-6.1,5
";
        assert!(matches!(
            OrganisationImporter::from_reader(duplicate.as_bytes()),
            Err(DirectoryImportError::DuplicateId(id)) if id.as_str() == "org_x"
        ));
    }
}

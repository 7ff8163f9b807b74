// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::api::TransportError;

/// A spreadsheet, as returned by the readers.
///
/// Every cell is text. Blank cells are `None`, so that "missing" can be told apart
/// from a value that only contains whitespace.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<TableRow>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TableRow {
    /// Position of the row in the spreadsheet. The header is row 1.
    pub row_number: usize,
    pub cells: Vec<Option<String>>,
}

impl TableRow {
    pub fn get(&self, col: usize) -> Option<&str> {
        self.cells.get(col).and_then(|c| c.as_deref())
    }
}

impl Table {
    /// Builds a table from plain strings. Empty strings become blank cells and
    /// the rows are numbered from 2, right below the header.
    pub fn from_strings(header: &[&str], rows: &[Vec<&str>]) -> Table {
        Table {
            header: header.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(idx, cells)| TableRow {
                    row_number: idx + 2,
                    cells: cells
                        .iter()
                        .map(|c| {
                            if c.is_empty() {
                                None
                            } else {
                                Some(c.to_string())
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

/// One row of the site import template.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SiteRecord {
    pub row_number: usize,
    pub site_code: String,
    pub site_name: String,
    pub country_code: String,
    pub time_zone_id: String,
    pub expected_number_of_subjects_screened: Option<String>,
    pub expected_number_of_subjects_enrolled: Option<String>,
    pub maximum_number_of_subjects_screened: Option<String>,
    pub is_training_enabled: String,
    pub is_production_enabled: String,
    pub role_site_manager: Option<String>,
}

/// One row of the user import template.
///
/// All the fields are optional at this stage: a row with a missing email or role
/// is skipped, not rejected with the whole batch.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UserRoleRecord {
    pub row_number: usize,
    pub email: Option<String>,
    pub role_oid: Option<String>,
    pub site_guid: Option<String>,
    pub site_name: Option<String>,
    pub site_code: Option<String>,
}

// ******** Payloads *********

/// The body sent to create a study site.
///
/// The platform accepts every field as text, including the numbers and the flags.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct SitePayload {
    #[serde(rename = "siteCode")]
    pub site_code: String,
    #[serde(rename = "siteName")]
    pub site_name: String,
    #[serde(rename = "countryCode")]
    pub country_code: String,
    #[serde(rename = "timeZoneId")]
    pub time_zone_id: String,
    #[serde(
        rename = "expectedNumberOfSubjectsScreened",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_number_of_subjects_screened: Option<String>,
    #[serde(
        rename = "expectedNumberOfSubjectsEnrolled",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_number_of_subjects_enrolled: Option<String>,
    #[serde(
        rename = "maximumNumberOfSubjectsScreened",
        skip_serializing_if = "Option::is_none"
    )]
    pub maximum_number_of_subjects_screened: Option<String>,
    #[serde(rename = "isTrainingEnabled")]
    pub is_training_enabled: String,
    #[serde(rename = "isProductionEnabled")]
    pub is_production_enabled: String,
}

/// A single role given to a user, optionally scoped to a site.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct RoleAssignment {
    #[serde(rename = "roleOID")]
    pub role_oid: String,
    #[serde(rename = "siteGuid", skip_serializing_if = "Option::is_none")]
    pub site_guid: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct UserInvite {
    pub email: String,
    pub roles: Vec<RoleAssignment>,
}

/// A request to give one role to one user.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoleGrant {
    pub email: String,
    pub role_oid: String,
    pub site_guid: Option<String>,
}

impl RoleGrant {
    /// The user endpoints take a list of users, each with a list of roles.
    pub fn body(&self) -> Vec<UserInvite> {
        vec![UserInvite {
            email: self.email.clone(),
            roles: vec![RoleAssignment {
                role_oid: self.role_oid.clone(),
                site_guid: self.site_guid.clone(),
            }],
        }]
    }
}

// ******** Directory *********

/// An existing study site, as listed by the admin API.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySite {
    #[serde(rename = "siteGuid")]
    pub site_guid: String,
    #[serde(rename = "siteName")]
    pub site_name: Option<String>,
    #[serde(rename = "siteCode")]
    pub site_code: Option<String>,
}

/// The sites that exist at the start of a run. It is fetched once and never
/// updated, even after sites get created.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DirectorySnapshot {
    sites: Vec<DirectorySite>,
}

impl DirectorySnapshot {
    pub fn new(sites: Vec<DirectorySite>) -> DirectorySnapshot {
        DirectorySnapshot { sites }
    }

    pub fn sites(&self) -> &[DirectorySite] {
        &self.sites
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn has_site_guid(&self, guid: &str) -> bool {
        self.sites.iter().any(|s| s.site_guid == guid)
    }

    pub fn has_site_code(&self, code: &str) -> bool {
        self.sites.iter().any(|s| s.site_code.as_deref() == Some(code))
    }

    pub fn has_site_name(&self, name: &str) -> bool {
        self.sites.iter().any(|s| s.site_name.as_deref() == Some(name))
    }

    /// Site codes are not unique in a study, so this may return several sites.
    pub fn sites_with_code(&self, code: &str) -> Vec<&DirectorySite> {
        self.sites
            .iter()
            .filter(|s| s.site_code.as_deref() == Some(code))
            .collect()
    }

    /// First site whose name matches, ignoring case.
    pub fn site_named(&self, name: &str) -> Option<&DirectorySite> {
        let upper = name.to_uppercase();
        self.sites.iter().find(|s| {
            s.site_name
                .as_deref()
                .map(|n| n.to_uppercase() == upper)
                .unwrap_or(false)
        })
    }

    pub fn site(&self, guid: &str) -> Option<&DirectorySite> {
        self.sites.iter().find(|s| s.site_guid == guid)
    }
}

// ******** Output data structures *********

/// The running tally of a provisioning run.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunOutcome {
    /// Sites created or roles assigned.
    pub succeeded: u32,
    /// Spreadsheet rows that could not be processed.
    pub failed: Vec<usize>,
    /// Rows whose site was created but whose site manager was not invited.
    pub not_invited: Vec<usize>,
}

/// The two user endpoints. They do not report errors the same way.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum UserType {
    Admin,
    Clinic,
}

/// Errors that stop a provisioning run.
#[derive(Debug)]
pub enum ProvisioningError {
    /// The spreadsheet does not follow the import template.
    InvalidLayout { expected: Vec<String> },
    /// A required value is missing on at least one row.
    MissingField { field: String, row_number: usize },
    /// The same site code or name appears twice in the spreadsheet.
    DuplicateInBatch { field: String, value: String },
    /// The API client is not allowed to list the sites.
    DirectoryForbidden,
    DirectoryUnavailable { status: u16, body: String },
    /// The platform could not be reached. The rows processed so far are kept.
    Transport {
        row_number: Option<usize>,
        partial: RunOutcome,
        source: TransportError,
    },
}

impl Error for ProvisioningError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProvisioningError::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Display for ProvisioningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisioningError::InvalidLayout { expected } => write!(
                f,
                "Invalid data layout, use the import template (expected columns: {})",
                expected.join(", ")
            ),
            ProvisioningError::MissingField { field, row_number } => write!(
                f,
                "{} is missing for at least one row (first in row {})",
                field, row_number
            ),
            ProvisioningError::DuplicateInBatch { field, value } => {
                write!(f, "Duplicate {} detected in the input file: {}", field, value)
            }
            ProvisioningError::DirectoryForbidden => write!(
                f,
                "Status code: 403 - Failure. Check the API configuration in Viedoc Admin"
            ),
            ProvisioningError::DirectoryUnavailable { status, body } => {
                write!(f, "Could not list the study sites: status {}: {}", status, body)
            }
            ProvisioningError::Transport {
                row_number: Some(row),
                source,
                ..
            } => write!(f, "Request failed while processing row {}: {}", row, source),
            ProvisioningError::Transport {
                row_number: None,
                source,
                ..
            } => write!(f, "Request failed: {}", source),
        }
    }
}

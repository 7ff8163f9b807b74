use log::{debug, info, warn};
use std::collections::HashMap;

use serde_json::Value as JSValue;

use crate::api::{AdminApi, ApiResponse, TransportError};
use crate::config::*;
use crate::normalize::{is_system_role, requires_site, system_role_id, SITE_MANAGER_ROLE};
use crate::response::{check_response_status, ResponseVerdict, KEY_NOT_PRESENT};

/// The columns of the user import template, in this order.
pub const USER_COLUMNS: [&str; 5] = ["email", "roleOID", "siteGuid", "siteName", "siteCode"];

pub const VALID_ROLES_HINT: &str = "For clinic roles: see Role ID in Viedoc Designer. For system roles, the following are valid: RoleStudyManager, RoleSiteManager, ApiManager, RoleDesigner, UnblindedStatistician, DictionaryManager, RefDataSourceManager, EtmfManager, DesignImpactAnalyst.";

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UserBatch {
    pub records: Vec<UserRoleRecord>,
}

impl UserBatch {
    /// The first five columns must follow the template. Other columns are ignored.
    pub fn from_table(table: &Table) -> Result<UserBatch, ProvisioningError> {
        let layout_ok = table.header.len() >= USER_COLUMNS.len()
            && table.header.iter().zip(USER_COLUMNS.iter()).all(|(h, c)| h == c);
        if !layout_ok {
            return Err(ProvisioningError::InvalidLayout {
                expected: USER_COLUMNS.iter().map(|s| s.to_string()).collect(),
            });
        }
        let cell = |row: &TableRow, i: usize| row.get(i).map(|s| s.to_string());
        let records = table
            .rows
            .iter()
            .map(|row| UserRoleRecord {
                row_number: row.row_number,
                email: cell(row, 0),
                role_oid: cell(row, 1),
                site_guid: cell(row, 2),
                site_name: cell(row, 3),
                site_code: cell(row, 4),
            })
            .collect();
        Ok(UserBatch { records })
    }
}

/// The result of looking up the site of a row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SiteResolution {
    Resolved(String),
    /// No site identifier was given.
    Unresolved,
    /// The identifiers given do not designate a site: the row cannot be processed.
    Rejected,
}

/// Finds the site of a row, trying the GUID, then the code, then the name.
///
/// Site codes are not unique in a study: when a code matches several sites, the
/// name is needed to pick one. When a code matches one site, a name, if given,
/// must be the name of that site.
pub fn resolve_site(record: &UserRoleRecord, directory: &DirectorySnapshot) -> SiteResolution {
    if let Some(guid) = &record.site_guid {
        if !directory.has_site_guid(guid) {
            warn!("Invalid siteGuid provided ({})! Skipping this row.", guid);
            return SiteResolution::Rejected;
        }
        info!("SiteGuid {} provided in the input file.", guid);
        return SiteResolution::Resolved(guid.clone());
    }
    info!("SiteGuid not provided. Trying to obtain it from (1) siteCode or (2) siteName.");

    if let Some(code) = &record.site_code {
        let matches = directory.sites_with_code(code);
        return match (matches.as_slice(), &record.site_name) {
            ([], _) => {
                warn!(
                    "Provided siteCode ({}) does not exist in Viedoc! Skipping this row.",
                    code
                );
                SiteResolution::Rejected
            }
            ([site], Some(name)) if site.site_name.as_deref() != Some(name.as_str()) => {
                warn!(
                    "The combination of siteCode '{}' and siteName '{}' does not exist. Skipping this row.",
                    code, name
                );
                SiteResolution::Rejected
            }
            ([site], _) => {
                info!(
                    "Obtained siteGuid {} from siteCode '{}' for import.",
                    site.site_guid, code
                );
                SiteResolution::Resolved(site.site_guid.clone())
            }
            (_, None) => {
                warn!(
                    "SiteCode '{}' is not unique and no siteName was provided to distinguish sites. Skipping this row.",
                    code
                );
                SiteResolution::Rejected
            }
            (sites, Some(name)) => {
                match sites
                    .iter()
                    .find(|s| s.site_name.as_deref() == Some(name.as_str()))
                {
                    Some(site) => {
                        info!(
                            "Obtained siteGuid {} from siteCode '{}' and siteName '{}' for import.",
                            site.site_guid, code, name
                        );
                        SiteResolution::Resolved(site.site_guid.clone())
                    }
                    None => {
                        warn!(
                            "The combination of siteCode '{}' and siteName '{}' does not exist. Skipping this row.",
                            code, name
                        );
                        SiteResolution::Rejected
                    }
                }
            }
        };
    }

    if let Some(name) = &record.site_name {
        return match directory.site_named(name) {
            Some(site) => {
                info!(
                    "Obtained siteGuid {} from siteName '{}' for import.",
                    site.site_guid, name
                );
                SiteResolution::Resolved(site.site_guid.clone())
            }
            None => {
                warn!(
                    "Provided siteName ({}) does not exist in Viedoc! Skipping this row.",
                    name
                );
                SiteResolution::Rejected
            }
        };
    }

    info!("SiteGuid was not obtained.");
    SiteResolution::Unresolved
}

fn send(
    result: Result<ApiResponse, TransportError>,
    row: usize,
    outcome: &RunOutcome,
) -> Result<ApiResponse, ProvisioningError> {
    result.map_err(|source| ProvisioningError::Transport {
        row_number: Some(row),
        partial: outcome.clone(),
        source,
    })
}

fn log_grant(endpoint: &str, grant: &RoleGrant) {
    info!("Sending the following user details to {}:", endpoint);
    info!("- email: {}", grant.email);
    info!("- roleOID: {}", grant.role_oid);
    if let Some(guid) = &grant.site_guid {
        info!("- siteGuid: {}", guid);
    }
}

/// Gives each row its role.
///
/// Each row is classified as a system role, a site manager role or a clinic role,
/// then sent to the matching endpoint. Rows that need a site and do not resolve to
/// one fail without any request. Clinic roles given by name instead of Role ID are
/// translated once using the roles the platform lists in its error response.
///
/// On a transport failure, the run stops and the error carries what was done so far.
pub fn create_users(
    batch: &UserBatch,
    directory: &DirectorySnapshot,
    api: &mut impl AdminApi,
) -> Result<RunOutcome, ProvisioningError> {
    let mut outcome = RunOutcome::default();
    for record in batch.records.iter() {
        create_user(record, directory, api, &mut outcome)?;
    }
    Ok(outcome)
}

fn create_user(
    record: &UserRoleRecord,
    directory: &DirectorySnapshot,
    api: &mut impl AdminApi,
    outcome: &mut RunOutcome,
) -> Result<(), ProvisioningError> {
    let row = record.row_number;
    let (email, raw_role) = match (&record.email, &record.role_oid) {
        (Some(e), Some(r)) => (e.clone(), r.clone()),
        _ => {
            warn!(
                "Skipping row {} as required data is missing (email or roleOID).",
                row
            );
            outcome.failed.push(row);
            return Ok(());
        }
    };
    info!(
        "Working on row {}. Email: {}, roleOID: {}.",
        row, email, raw_role
    );

    let role_oid = match system_role_id(&raw_role) {
        Some(id) => {
            info!("Role {} converted to {} for import.", raw_role, id);
            id.to_string()
        }
        None => raw_role,
    };

    let site_guid: Option<String> = if requires_site(&role_oid) {
        info!("The provided role ({}) requires a siteGuid.", role_oid);
        match resolve_site(record, directory) {
            SiteResolution::Resolved(guid) => Some(guid),
            SiteResolution::Unresolved => None,
            SiteResolution::Rejected => {
                outcome.failed.push(row);
                return Ok(());
            }
        }
    } else {
        None
    };

    if is_system_role(&role_oid) {
        info!("Provided roleOID is a system role. Using the system role import routine.");
        if role_oid == SITE_MANAGER_ROLE && site_guid.is_none() {
            warn!(
                "Trying to add a site manager ({}), but siteGuid, siteName and siteCode are all missing!",
                email
            );
            outcome.failed.push(row);
            return Ok(());
        }
        let grant = RoleGrant {
            email: email.clone(),
            role_oid,
            site_guid,
        };
        match &grant.site_guid {
            Some(guid) => info!("Adding '{}' with role {} to site {}.", email, grant.role_oid, guid),
            None => info!("Adding '{}' with role {}.", email, grant.role_oid),
        }
        log_grant("/admin/adminusers", &grant);
        let response = send(api.assign_admin_role(&grant), row, outcome)?;
        check_response_status(
            &response,
            &email,
            row,
            &mut outcome.failed,
            &mut outcome.succeeded,
            UserType::Admin,
        );
        return Ok(());
    }

    let site_guid = match site_guid {
        Some(g) => g,
        None => {
            warn!(
                "Trying to add a clinic user ({}, role '{}'), but siteGuid, siteName and siteCode are all missing!",
                email, role_oid
            );
            outcome.failed.push(row);
            return Ok(());
        }
    };

    info!("Provided roleOID is not a system role. Trying to import as a clinic role.");
    let grant = RoleGrant {
        email: email.clone(),
        role_oid: role_oid.to_uppercase(),
        site_guid: Some(site_guid),
    };
    assign_clinic_role(api, grant, &role_oid, row, outcome)
}

/// Maps the lowercase display name of each role to its Role ID, from the
/// `availableRoles` list of an error response.
pub fn available_roles(body: &JSValue) -> Option<HashMap<String, String>> {
    let roles = body.get("availableRoles")?.as_array()?;
    let mut res: HashMap<String, String> = HashMap::new();
    for r in roles.iter() {
        if let (Some(name), Some(oid)) = (
            r.get("roleName").and_then(|x| x.as_str()),
            r.get("roleOID").and_then(|x| x.as_str()),
        ) {
            res.insert(name.to_lowercase(), oid.to_string());
        }
    }
    Some(res)
}

fn assign_clinic_role(
    api: &mut impl AdminApi,
    grant: RoleGrant,
    typed_role: &str,
    row: usize,
    outcome: &mut RunOutcome,
) -> Result<(), ProvisioningError> {
    log_grant("/admin/clinicusers", &grant);
    let response = send(api.assign_clinic_role(&grant), row, outcome)?;
    let verdict = check_response_status(
        &response,
        &grant.email,
        row,
        &mut outcome.failed,
        &mut outcome.succeeded,
        UserType::Clinic,
    );
    if verdict != ResponseVerdict::Unresolved || response.status != 400 {
        if verdict == ResponseVerdict::Unresolved {
            warn!(
                "Status code: {} - Unexpected answer. Details: {}",
                response.status, response.body
            );
            outcome.failed.push(row);
        }
        return Ok(());
    }

    let roles = match response.json().as_ref().and_then(available_roles) {
        Some(roles) => roles,
        None => {
            warn!(
                "Status code: 400 - Failure. Is '{}' a valid email?",
                grant.email
            );
            outcome.failed.push(row);
            return Ok(());
        }
    };
    debug!("assign_clinic_role: available roles {:?}", roles);
    warn!("Status code: 400 - Failure. The provided roleOID is not a valid Role ID. Trying to convert.");

    let role_id = match roles.get(&typed_role.to_lowercase()) {
        Some(id) => id.clone(),
        None => {
            warn!(
                "Unable to convert. {} is an invalid roleOID in this study.",
                typed_role
            );
            warn!("{}", VALID_ROLES_HINT);
            outcome.failed.push(row);
            return Ok(());
        }
    };
    info!("{} converted to {} for import.", typed_role, role_id);
    let retry = RoleGrant {
        role_oid: role_id,
        ..grant
    };
    log_grant("/admin/clinicusers", &retry);
    let response = send(api.assign_clinic_role(&retry), row, outcome)?;
    let verdict = check_response_status(
        &response,
        &retry.email,
        row,
        &mut outcome.failed,
        &mut outcome.succeeded,
        UserType::Clinic,
    );
    if verdict == ResponseVerdict::Unresolved {
        warn!(
            "Status code: {} - Failure. User not added. Details: {}",
            response.status, response.body
        );
        outcome.failed.push(row);
    }
    Ok(())
}

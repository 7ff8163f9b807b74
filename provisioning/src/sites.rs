use log::{debug, info, warn};
use std::collections::HashSet;

use crate::api::AdminApi;
use crate::config::*;
use crate::normalize::{is_digits, to_true_false, SITE_MANAGER_ROLE};
use crate::response::{check_response_status, classify_site_creation, error_text, parse_site_guid};
use crate::timezones::convert_time_zone;

/// The columns of the site import template. `roleSiteManager` may be added.
pub const SITE_COLUMNS: [&str; 9] = [
    "siteCode",
    "siteName",
    "countryCode",
    "timeZoneId",
    "expectedNumberOfSubjectsScreened",
    "expectedNumberOfSubjectsEnrolled",
    "maximumNumberOfSubjectsScreened",
    "isTrainingEnabled",
    "isProductionEnabled",
];

pub const SITE_MANAGER_COLUMN: &str = "roleSiteManager";

const REQUIRED_FIELDS: [&str; 6] = [
    "siteCode",
    "siteName",
    "countryCode",
    "timeZoneId",
    "isTrainingEnabled",
    "isProductionEnabled",
];

/// The sites of an import file, checked as a whole.
///
/// Once built, the batch has all the required fields on every row and no code or
/// name appears twice.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SiteBatch {
    pub records: Vec<SiteRecord>,
}

impl SiteBatch {
    pub fn from_table(table: &Table) -> Result<SiteBatch, ProvisioningError> {
        let mut idx: Vec<usize> = Vec::new();
        for col in SITE_COLUMNS.iter() {
            match table.column_index(col) {
                Some(i) => idx.push(i),
                None => {
                    return Err(ProvisioningError::InvalidLayout {
                        expected: SITE_COLUMNS.iter().map(|s| s.to_string()).collect(),
                    });
                }
            }
        }
        info!("Correct import template was used.");
        let manager_idx = table.column_index(SITE_MANAGER_COLUMN);

        for field in REQUIRED_FIELDS.iter() {
            // The lookup cannot fail, the column was found above.
            let col = table.column_index(field).unwrap_or_default();
            if let Some(row) = table.rows.iter().find(|r| r.get(col).is_none()) {
                return Err(ProvisioningError::MissingField {
                    field: field.to_string(),
                    row_number: row.row_number,
                });
            }
        }
        info!("All sites have data for the required fields.");

        let text = |row: &TableRow, i: usize| row.get(idx[i]).unwrap_or_default().to_string();
        let optional = |row: &TableRow, i: usize| row.get(idx[i]).map(|s| s.to_string());
        let records: Vec<SiteRecord> = table
            .rows
            .iter()
            .map(|row| SiteRecord {
                row_number: row.row_number,
                site_code: text(row, 0),
                site_name: text(row, 1),
                country_code: text(row, 2),
                time_zone_id: text(row, 3),
                expected_number_of_subjects_screened: optional(row, 4),
                expected_number_of_subjects_enrolled: optional(row, 5),
                maximum_number_of_subjects_screened: optional(row, 6),
                is_training_enabled: text(row, 7),
                is_production_enabled: text(row, 8),
                role_site_manager: manager_idx.and_then(|i| row.get(i)).map(|s| s.to_string()),
            })
            .collect();

        check_unique("siteCode", records.iter().map(|r| r.site_code.as_str()))?;
        check_unique("siteName", records.iter().map(|r| r.site_name.as_str()))?;
        info!("No duplicates detected within the input file.");

        Ok(SiteBatch { records })
    }
}

fn check_unique<'a>(
    field: &str,
    values: impl Iterator<Item = &'a str>,
) -> Result<(), ProvisioningError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for v in values {
        if !seen.insert(v) {
            return Err(ProvisioningError::DuplicateInBatch {
                field: field.to_string(),
                value: v.to_string(),
            });
        }
    }
    Ok(())
}

fn numeric_field(name: &str, value: &Option<String>) -> Option<String> {
    match value {
        Some(v) if is_digits(v) => Some(v.clone()),
        Some(v) => {
            warn!("Value {} ignored as it is not numeric ({}).", v, name);
            None
        }
        None => None,
    }
}

/// Turns a record into what the platform expects: known time zone display names
/// converted, flags spelled `True`/`False`, country code in uppercase, and the
/// subject counts dropped unless they are plain numbers.
pub fn site_payload(record: &SiteRecord) -> SitePayload {
    let time_zone_id = match convert_time_zone(&record.time_zone_id) {
        Some(tz) => {
            info!("{} converted to {} for import.", record.time_zone_id, tz);
            tz.to_string()
        }
        None => record.time_zone_id.clone(),
    };
    SitePayload {
        site_code: record.site_code.clone(),
        site_name: record.site_name.clone(),
        country_code: record.country_code.to_uppercase(),
        time_zone_id,
        expected_number_of_subjects_screened: numeric_field(
            "expectedNumberOfSubjectsScreened",
            &record.expected_number_of_subjects_screened,
        ),
        expected_number_of_subjects_enrolled: numeric_field(
            "expectedNumberOfSubjectsEnrolled",
            &record.expected_number_of_subjects_enrolled,
        ),
        maximum_number_of_subjects_screened: numeric_field(
            "maximumNumberOfSubjectsScreened",
            &record.maximum_number_of_subjects_screened,
        ),
        is_training_enabled: to_true_false(&record.is_training_enabled),
        is_production_enabled: to_true_false(&record.is_production_enabled),
    }
}

fn log_payload(payload: &SitePayload) {
    info!("- siteCode: {}", payload.site_code);
    info!("- siteName: {}", payload.site_name);
    info!("- countryCode: {}", payload.country_code);
    info!("- timeZoneId: {}", payload.time_zone_id);
    let counts = [
        (
            "expectedNumberOfSubjectsScreened",
            &payload.expected_number_of_subjects_screened,
        ),
        (
            "expectedNumberOfSubjectsEnrolled",
            &payload.expected_number_of_subjects_enrolled,
        ),
        (
            "maximumNumberOfSubjectsScreened",
            &payload.maximum_number_of_subjects_screened,
        ),
    ];
    for (name, value) in counts.iter() {
        if let Some(v) = value {
            info!("- {}: {}", name, v);
        }
    }
    info!("- isTrainingEnabled: {}", payload.is_training_enabled);
    info!("- isProductionEnabled: {}", payload.is_production_enabled);
}

/// Creates the sites of the batch, one row at a time.
///
/// A row is skipped when its code or name already exists in `directory`, or when
/// the platform refuses it. If the row names a site manager, the manager is invited
/// to the new site; failed invitations are tracked apart from failed sites.
///
/// On a transport failure, the run stops and the error carries what was done so far.
pub fn create_sites(
    batch: &SiteBatch,
    directory: &DirectorySnapshot,
    api: &mut impl AdminApi,
) -> Result<RunOutcome, ProvisioningError> {
    let mut outcome = RunOutcome::default();
    for record in batch.records.iter() {
        let row = record.row_number;
        info!(
            "Working on row {} - siteName: '{}', siteCode: '{}'.",
            row, record.site_name, record.site_code
        );

        if directory.has_site_code(&record.site_code) {
            warn!(
                "SiteCode {} already exists in the study. Skipping this row.",
                record.site_code
            );
            outcome.failed.push(row);
            continue;
        }
        if directory.has_site_name(&record.site_name) {
            warn!(
                "SiteName {} already exists in the study. Skipping this row.",
                record.site_name
            );
            outcome.failed.push(row);
            continue;
        }

        let payload = site_payload(record);
        info!("Sending the following site details to /admin/studysites:");
        log_payload(&payload);
        let response = match api.create_site(&payload) {
            Ok(r) => r,
            Err(source) => {
                return Err(ProvisioningError::Transport {
                    row_number: Some(row),
                    partial: outcome,
                    source,
                })
            }
        };
        debug!("create_sites: row {} response {:?}", row, response);

        if let Some(rejection) = classify_site_creation(&response) {
            warn!("{}", rejection.message(&record.site_code));
            if response.status != 403 {
                warn!("Details: {}", error_text(&response.body));
            }
            outcome.failed.push(row);
            continue;
        }
        outcome.succeeded += 1;
        info!("Status code: 201 - Success. Site created.");

        let site_guid = parse_site_guid(&response.body);
        match &site_guid {
            Some(guid) => info!("Created site has siteGuid: {}.", guid),
            None => warn!(
                "Could not read the siteGuid of the created site from the response: {}",
                response.body
            ),
        }

        if let Some(manager) = &record.role_site_manager {
            invite_site_manager(api, manager, site_guid, row, &mut outcome)?;
        }
    }
    Ok(outcome)
}

fn invite_site_manager(
    api: &mut impl AdminApi,
    email: &str,
    site_guid: Option<String>,
    row: usize,
    outcome: &mut RunOutcome,
) -> Result<(), ProvisioningError> {
    let site_guid = match site_guid {
        Some(g) => g,
        None => {
            warn!(
                "Cannot add '{}' as site manager without the siteGuid of the new site.",
                email
            );
            outcome.not_invited.push(row);
            return Ok(());
        }
    };
    info!(
        "Adding '{}' with role {} to site {}.",
        email, SITE_MANAGER_ROLE, site_guid
    );
    info!("Sending the following user details to /admin/adminusers:");
    info!("- email: {}", email);
    info!("- roleOID: {}", SITE_MANAGER_ROLE);
    info!("- siteGuid: {}", site_guid);
    let grant = RoleGrant {
        email: email.to_string(),
        role_oid: SITE_MANAGER_ROLE.to_string(),
        site_guid: Some(site_guid),
    };
    let response = match api.assign_admin_role(&grant) {
        Ok(r) => r,
        Err(source) => {
            return Err(ProvisioningError::Transport {
                row_number: Some(row),
                partial: outcome.clone(),
                source,
            })
        }
    };
    // Invitations are not counted, only the sites are.
    let mut invited: u32 = 0;
    check_response_status(
        &response,
        email,
        row,
        &mut outcome.not_invited,
        &mut invited,
        UserType::Admin,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, ScriptedApi};

    const HEADER: [&str; 10] = [
        "siteCode",
        "siteName",
        "countryCode",
        "timeZoneId",
        "expectedNumberOfSubjectsScreened",
        "expectedNumberOfSubjectsEnrolled",
        "maximumNumberOfSubjectsScreened",
        "isTrainingEnabled",
        "isProductionEnabled",
        "roleSiteManager",
    ];

    fn site_row<'a>(code: &'a str, name: &'a str) -> Vec<&'a str> {
        vec![code, name, "se", "UTC", "", "", "", "Y", "N", ""]
    }

    fn run(rows: &[Vec<&str>], api: &mut ScriptedApi) -> RunOutcome {
        let table = Table::from_strings(&HEADER, rows);
        let batch = SiteBatch::from_table(&table).unwrap();
        let directory = crate::fetch_directory(api).unwrap();
        create_sites(&batch, &directory, api).unwrap()
    }

    #[test]
    fn creates_a_site() {
        let mut api = ScriptedApi::new();
        let outcome = run(&[site_row("S1", "Site One")], &mut api);
        assert_eq!(outcome, RunOutcome { succeeded: 1, ..RunOutcome::default() });
        let sent = api.created_sites();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].country_code, "SE");
        assert_eq!(sent[0].time_zone_id, "UTC");
        assert_eq!(sent[0].is_training_enabled, "True");
        assert_eq!(sent[0].is_production_enabled, "False");
        assert_eq!(sent[0].expected_number_of_subjects_screened, None);
    }

    #[test]
    fn payload_fields_as_text() {
        let mut api = ScriptedApi::new();
        run(
            &[vec![
                "S1",
                "Site One",
                "se",
                "(UTC+01:00) Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna",
                "40",
                "many",
                "",
                "yes",
                "0",
                "",
            ]],
            &mut api,
        );
        let js = serde_json::to_value(api.created_sites()[0]).unwrap();
        assert_eq!(
            js,
            serde_json::json!({
                "siteCode": "S1",
                "siteName": "Site One",
                "countryCode": "SE",
                "timeZoneId": "W. Europe Standard Time",
                "expectedNumberOfSubjectsScreened": "40",
                "isTrainingEnabled": "True",
                "isProductionEnabled": "False",
            })
        );
    }

    #[test]
    fn missing_column_is_a_layout_error() {
        let table = Table::from_strings(&HEADER[..8], &[]);
        assert!(matches!(
            SiteBatch::from_table(&table),
            Err(ProvisioningError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn site_manager_column_is_optional() {
        let table = Table::from_strings(&HEADER[..9], &[site_row("S1", "One")[..9].to_vec()]);
        let batch = SiteBatch::from_table(&table).unwrap();
        assert_eq!(batch.records[0].role_site_manager, None);
    }

    #[test]
    fn missing_required_value_aborts() {
        let mut row = site_row("S2", "Two");
        row[3] = "";
        let table = Table::from_strings(&HEADER, &[site_row("S1", "One"), row]);
        match SiteBatch::from_table(&table) {
            Err(ProvisioningError::MissingField { field, row_number }) => {
                assert_eq!(field, "timeZoneId");
                assert_eq!(row_number, 3);
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn duplicates_in_batch_abort() {
        let table = Table::from_strings(&HEADER, &[site_row("S1", "One"), site_row("S1", "Two")]);
        assert!(matches!(
            SiteBatch::from_table(&table),
            Err(ProvisioningError::DuplicateInBatch { field, .. }) if field == "siteCode"
        ));
        let table = Table::from_strings(&HEADER, &[site_row("S1", "One"), site_row("S2", "One")]);
        assert!(matches!(
            SiteBatch::from_table(&table),
            Err(ProvisioningError::DuplicateInBatch { field, .. }) if field == "siteName"
        ));
    }

    #[test]
    fn existing_sites_are_skipped() {
        let mut api = ScriptedApi::new().with_sites(&[("g1", "Site One", "S9")]);
        let outcome = run(
            &[
                site_row("S1", "Site One"),
                site_row("S9", "Other"),
                site_row("S3", "Three"),
            ],
            &mut api,
        );
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, vec![2, 3]);
        let sent = api.created_sites();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].site_code, "S3");
    }

    #[test]
    fn rejected_sites_are_skipped() {
        let mut api = ScriptedApi::new()
            .created(
                400,
                r#"{"errorMessage":"Study does not have a valid license."}"#,
            )
            .created(403, "Production client required")
            .created(400, "[\n  \"CountryCode is not valid: XX\"\n]");
        let outcome = run(
            &[
                site_row("S1", "One"),
                site_row("S2", "Two"),
                site_row("S3", "Three"),
                site_row("S4", "Four"),
            ],
            &mut api,
        );
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, vec![2, 3, 4]);
    }

    #[test]
    fn site_manager_is_invited_to_new_site() {
        let mut row = site_row("S1", "One");
        row[9] = "boss@x.com";
        let mut api = ScriptedApi::new().created(
            201,
            "\"https://api.test/admin/studysites/7c0e-41aa-9f3b\"",
        );
        let outcome = run(&[row], &mut api);
        assert_eq!(outcome, RunOutcome { succeeded: 1, ..RunOutcome::default() });
        assert_eq!(
            api.role_calls(),
            vec![&Call::AdminRole(RoleGrant {
                email: "boss@x.com".to_string(),
                role_oid: "RoleSiteManager".to_string(),
                site_guid: Some("7c0e-41aa-9f3b".to_string()),
            })]
        );
    }

    #[test]
    fn failed_invitation_is_tracked_apart() {
        let mut row = site_row("S1", "One");
        row[9] = "not-an-email";
        let mut api = ScriptedApi::new().admin(400, "{}");
        let outcome = run(&[row], &mut api);
        assert_eq!(outcome.succeeded, 1);
        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.not_invited, vec![2]);
    }

    #[test]
    fn unreadable_site_guid_skips_invitation() {
        let mut row = site_row("S1", "One");
        row[9] = "boss@x.com";
        let mut api = ScriptedApi::new().created(201, "\"Site created.\"");
        let outcome = run(&[row], &mut api);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.not_invited, vec![2]);
        assert!(api.role_calls().is_empty());
    }
}

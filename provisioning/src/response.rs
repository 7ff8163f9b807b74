use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JSValue;

use crate::api::ApiResponse;
use crate::config::UserType;

/// The body of a 400 after which the platform may or may not have processed the
/// request.
pub const KEY_NOT_PRESENT: &str = "The given key was not present in the dictionary";

/// The body of a 403 when a demo API client tries to create a production site.
pub const PRODUCTION_CLIENT_REQUIRED: &str = "Production client required";

/// How a response to a user endpoint was understood.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ResponseVerdict {
    /// The role was assigned.
    Assigned,
    /// The platform answered with the dictionary error: it is not possible to
    /// tell whether the role was assigned.
    Ambiguous,
    /// The row was recorded as failed.
    Failed,
    /// A 400 from the clinic endpoint, or a status with no defined meaning. Nothing
    /// was recorded, the caller decides.
    Unresolved,
}

/// Interprets the answer of `adminusers` or `clinicusers`.
///
/// The accumulators are updated in place: `assigned` on success, `failed` with the
/// row number on a definite failure.
pub fn check_response_status(
    response: &ApiResponse,
    email: &str,
    row_number: usize,
    failed: &mut Vec<usize>,
    assigned: &mut u32,
    user_type: UserType,
) -> ResponseVerdict {
    match response.status {
        200 => {
            *assigned += 1;
            info!("Status code: 200 - Success. User added.");
            ResponseVerdict::Assigned
        }
        400 if response.body == KEY_NOT_PRESENT => {
            warn!("Status code: 400 - '{}'. Cannot check if the user invite was successful, check in Viedoc Admin.", KEY_NOT_PRESENT);
            ResponseVerdict::Ambiguous
        }
        400 if user_type == UserType::Admin => {
            warn!("Status code: 400 - Failure. Is '{}' a valid email?", email);
            failed.push(row_number);
            ResponseVerdict::Failed
        }
        403 => {
            warn!("Status code: 403 - Failure. Check the API configuration in Viedoc Admin.");
            failed.push(row_number);
            ResponseVerdict::Failed
        }
        _ => ResponseVerdict::Unresolved,
    }
}

/// Why the platform refused to create a site.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SiteRejection {
    LicenseRequired,
    TrainingAndProduction,
    InvalidCountryCode,
    InvalidTimeZone,
    /// Any other 400.
    Unclassified,
    ProductionClientRequired,
    /// Any other 403.
    Forbidden,
    UnexpectedStatus(u16),
}

impl SiteRejection {
    pub fn message(&self, site_code: &str) -> String {
        match self {
            SiteRejection::LicenseRequired => {
                "Status code: 400 - Failure. A license is required to enable the Production status.".to_string()
            }
            SiteRejection::TrainingAndProduction => "Status code: 400 - Failure. The study settings do not allow a site with both Training and Production status.".to_string(),
            SiteRejection::InvalidCountryCode => format!(
                "Error creating site {}. The countryCode was not recognized.",
                site_code
            ),
            SiteRejection::InvalidTimeZone => format!(
                "Error creating site {}. The timeZoneId was not recognized.",
                site_code
            ),
            SiteRejection::Unclassified => {
                "Status code: 400 - Failure. Site not added.".to_string()
            }
            SiteRejection::ProductionClientRequired => "Status code: 403 - Failure. Cannot create a Production site when the API client is in Demo mode.".to_string(),
            SiteRejection::Forbidden => "Status code: 403 - Failure. Check the API configuration in Viedoc Admin. Site not added.".to_string(),
            SiteRejection::UnexpectedStatus(status) => {
                format!("Status code: {} - Failure. Site not added.", status)
            }
        }
    }
}

// Evaluated in order, on the error text of the body.
const BAD_REQUEST_CAUSES: &[(&str, SiteRejection)] = &[
    (
        "Study does not have a valid license.",
        SiteRejection::LicenseRequired,
    ),
    (
        "Combined production and training mode is not allowed in this study.",
        SiteRejection::TrainingAndProduction,
    ),
    ("CountryCode is not valid:", SiteRejection::InvalidCountryCode),
    ("TimeZoneId is not valid:", SiteRejection::InvalidTimeZone),
];

/// The human part of an error body.
///
/// The platform answers with `{"errorMessage": "..."}`, with a list of messages, or
/// with plain text. The first message is returned, or the raw body.
pub fn error_text(body: &str) -> String {
    match serde_json::from_str::<JSValue>(body) {
        Ok(JSValue::Object(obj)) => match obj.get("errorMessage") {
            Some(JSValue::String(s)) => s.clone(),
            _ => body.to_string(),
        },
        Ok(JSValue::Array(arr)) => match arr.first() {
            Some(JSValue::String(s)) => s.clone(),
            _ => body.to_string(),
        },
        Ok(JSValue::String(s)) => s,
        _ => body.to_string(),
    }
}

/// Classifies a site creation response. `None` means the site was created.
pub fn classify_site_creation(response: &ApiResponse) -> Option<SiteRejection> {
    match response.status {
        201 => None,
        400 => {
            let text = error_text(&response.body);
            let cause = BAD_REQUEST_CAUSES
                .iter()
                .find(|(prefix, _)| text.starts_with(prefix))
                .map(|(_, rejection)| *rejection)
                .unwrap_or(SiteRejection::Unclassified);
            Some(cause)
        }
        403 if response.body == PRODUCTION_CLIENT_REQUIRED => {
            Some(SiteRejection::ProductionClientRequired)
        }
        403 => Some(SiteRejection::Forbidden),
        x => Some(SiteRejection::UnexpectedStatus(x)),
    }
}

static TRAILING_GUID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9-]+$").unwrap());

/// Extracts the identifier of a newly created site.
///
/// The creation endpoint answers with a reference to the new resource, usually a
/// JSON string such as `".../studysites/0f8c...-...-9a1e"`. The identifier is the
/// trailing run of lowercase letters, digits and hyphens. Returns `None` when the
/// body does not end with such a run.
pub fn parse_site_guid(body: &str) -> Option<String> {
    let reference = match serde_json::from_str::<JSValue>(body) {
        Ok(JSValue::String(s)) => s,
        _ => body.trim().to_string(),
    };
    TRAILING_GUID
        .find(&reference)
        .map(|m| m.as_str().to_string())
}

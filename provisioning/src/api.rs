use std::error::Error;
use std::fmt::Display;

use serde_json::Value as JSValue;

use crate::config::{RoleGrant, SitePayload};

/// What the platform answered: the status code and the raw body.
///
/// The body is kept as text because some error responses are not JSON.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> ApiResponse {
        ApiResponse {
            status,
            body: body.into(),
        }
    }

    /// The body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<JSValue> {
        serde_json::from_str(&self.body).ok()
    }
}

/// The request could not be completed at all (connection refused, unreadable body, ...).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> TransportError {
        TransportError {
            message: message.into(),
        }
    }
}

impl Error for TransportError {}

impl Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

pub type ApiResult = Result<ApiResponse, TransportError>;

/// The admin endpoints used by the provisioners.
///
/// Implementations are expected to be authenticated already. Non-2xx statuses are
/// not errors at this level: they come back as an `ApiResponse` and the
/// provisioners decide what they mean.
pub trait AdminApi {
    /// `GET /admin/studysites`
    fn list_sites(&mut self) -> ApiResult;

    /// `POST /admin/studysites`
    fn create_site(&mut self, site: &SitePayload) -> ApiResult;

    /// `POST /admin/adminusers`
    fn assign_admin_role(&mut self, grant: &RoleGrant) -> ApiResult;

    /// `POST /admin/clinicusers`
    fn assign_clinic_role(&mut self, grant: &RoleGrant) -> ApiResult;
}

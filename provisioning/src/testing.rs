// An in-memory admin API for the tests.

use std::collections::VecDeque;

use crate::api::{AdminApi, ApiResponse, ApiResult, TransportError};
use crate::config::{DirectorySite, RoleGrant, SitePayload};

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Call {
    ListSites,
    CreateSite(SitePayload),
    AdminRole(RoleGrant),
    ClinicRole(RoleGrant),
}

/// Answers from queues, one per endpoint. An empty queue answers with the default
/// success status of the endpoint.
#[derive(Default)]
pub struct ScriptedApi {
    pub calls: Vec<Call>,
    pub sites: Vec<ApiResult>,
    pub created: VecDeque<ApiResult>,
    pub admin: VecDeque<ApiResult>,
    pub clinic: VecDeque<ApiResult>,
}

impl ScriptedApi {
    pub fn new() -> ScriptedApi {
        let _ = env_logger::builder().is_test(true).try_init();
        ScriptedApi::default()
    }

    pub fn with_sites(mut self, sites: &[(&str, &str, &str)]) -> ScriptedApi {
        let listed: Vec<DirectorySite> = sites
            .iter()
            .map(|(guid, name, code)| DirectorySite {
                site_guid: guid.to_string(),
                site_name: Some(name.to_string()),
                site_code: Some(code.to_string()),
            })
            .collect();
        let body = serde_json::to_string(&listed).unwrap();
        self.sites = vec![Ok(ApiResponse::new(200, body))];
        self
    }

    pub fn created(mut self, status: u16, body: &str) -> ScriptedApi {
        self.created.push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn admin(mut self, status: u16, body: &str) -> ScriptedApi {
        self.admin.push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn clinic(mut self, status: u16, body: &str) -> ScriptedApi {
        self.clinic.push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn clinic_unreachable(mut self) -> ScriptedApi {
        self.clinic
            .push_back(Err(TransportError::new("connection refused")));
        self
    }

    pub fn created_sites(&self) -> Vec<&SitePayload> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::CreateSite(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn role_calls(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::AdminRole(_) | Call::ClinicRole(_)))
            .collect()
    }
}

impl AdminApi for ScriptedApi {
    fn list_sites(&mut self) -> ApiResult {
        self.calls.push(Call::ListSites);
        self.sites
            .first()
            .cloned()
            .unwrap_or_else(|| Ok(ApiResponse::new(200, "[]")))
    }

    fn create_site(&mut self, site: &SitePayload) -> ApiResult {
        self.calls.push(Call::CreateSite(site.clone()));
        let default_body = format!("\"https://api.test/admin/studysites/{}-0000-guid\"", self.created_sites().len());
        self.created
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(201, default_body.to_lowercase())))
    }

    fn assign_admin_role(&mut self, grant: &RoleGrant) -> ApiResult {
        self.calls.push(Call::AdminRole(grant.clone()));
        self.admin
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(200, "")))
    }

    fn assign_clinic_role(&mut self, grant: &RoleGrant) -> ApiResult {
        self.calls.push(Call::ClinicRole(grant.clone()));
        self.clinic
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(200, "")))
    }
}

// Exports of the sites and users of a study.

use serde_json::Value as JSValue;

use crate::admin::io_csv::write_csv;
use crate::admin::*;

pub const SITES_EXPORT: &str = "export_studySites.csv";
pub const USERS_EXPORT: &str = "export_studyUsers.csv";

const DROPPED_SITE_FIELDS: [&str; 2] = ["siteType", "tzOffset"];

pub const USER_EXPORT_COLUMNS: [&str; 8] = [
    "userGuid",
    "displayName",
    "email",
    "roleName",
    "siteGuid",
    "siteName",
    "siteCode",
    "access_to_siteGroup",
];

pub const API_CLIENT: &str = "<<API CLIENT>>";

/// The user endpoints, only needed for the exports.
pub trait UserListing: AdminApi {
    /// `POST /admin/users`: all the users of the study.
    fn list_users(&mut self) -> ApiResult;
    /// `GET /admin/users/{guid}/roles`
    fn user_roles(&mut self, user_guid: &str) -> ApiResult;
}

fn cell(v: Option<&JSValue>) -> Option<String> {
    match v {
        None | Some(JSValue::Null) => None,
        Some(JSValue::String(s)) if s.is_empty() => None,
        Some(JSValue::String(s)) => Some(s.clone()),
        Some(JSValue::Bool(true)) => Some("True".to_string()),
        Some(JSValue::Bool(false)) => Some("False".to_string()),
        Some(x) => Some(x.to_string()),
    }
}

/// The columns are the fields of the listed sites, in the order they come.
pub fn site_rows(sites: &[JSValue]) -> (Vec<String>, Vec<Vec<Option<String>>>) {
    let mut header: Vec<String> = Vec::new();
    for site in sites.iter() {
        if let Some(obj) = site.as_object() {
            for k in obj.keys() {
                if !DROPPED_SITE_FIELDS.contains(&k.as_str()) && !header.contains(k) {
                    header.push(k.clone());
                }
            }
        }
    }
    let rows = sites
        .iter()
        .map(|site| header.iter().map(|k| cell(site.get(k))).collect())
        .collect();
    (header, rows)
}

/// The user part of the export rows. API clients have no usable email.
pub fn user_identity(user: &JSValue) -> (String, Option<String>, Option<String>) {
    let guid = user
        .get("userGuid")
        .and_then(|g| g.as_str())
        .unwrap_or_default()
        .to_string();
    let email = user.get("email").and_then(|e| e.as_str());
    match email {
        None => (guid, Some(API_CLIENT.to_string()), Some(API_CLIENT.to_string())),
        Some(e) if e == guid => (guid, Some(API_CLIENT.to_string()), Some(API_CLIENT.to_string())),
        Some(e) => (guid, cell(user.get("displayName")), Some(e.to_string())),
    }
}

/// One row per role and site. A role without site gives one row with no site.
pub fn role_rows(
    user: &JSValue,
    roles: &JSValue,
    directory: &DirectorySnapshot,
) -> Vec<Vec<Option<String>>> {
    let (guid, display_name, email) = user_identity(user);
    let empty = vec![];
    let roles = roles
        .get("roles")
        .and_then(|r| r.as_array())
        .unwrap_or(&empty);
    let mut res: Vec<Vec<Option<String>>> = Vec::new();
    for role in roles.iter() {
        let site_group = role
            .get("siteGroupGuids")
            .and_then(|g| g.as_array())
            .map(|g| !g.is_empty())
            .unwrap_or(false);
        let mut site_guids: Vec<Option<String>> = role
            .get("siteGuids")
            .and_then(|g| g.as_array())
            .map(|g| g.iter().map(|x| cell(Some(x))).collect())
            .unwrap_or_default();
        if site_guids.is_empty() {
            site_guids.push(None);
        }
        for site_guid in site_guids.into_iter() {
            let site = site_guid.as_deref().and_then(|g| directory.site(g));
            res.push(vec![
                Some(guid.clone()),
                display_name.clone(),
                email.clone(),
                cell(role.get("roleName")),
                site_guid.clone(),
                site.and_then(|s| s.site_name.clone()),
                site.and_then(|s| s.site_code.clone()),
                Some(if site_group { "Yes" } else { "No" }.to_string()),
            ]);
        }
    }
    res
}

pub fn user_list(body: &JSValue) -> AdminResult<Vec<JSValue>> {
    match body.get("userInfos").and_then(|u| u.as_array()) {
        Some(users) => Ok(users.clone()),
        None => whatever!("Unexpected answer from /admin/users: no userInfos"),
    }
}

fn platform_unreachable(source: TransportError) -> Box<AdminError> {
    Box::new(AdminError::Unreachable { source })
}

fn save(path: &Path, header: &[&str], rows: &[Vec<Option<String>>]) {
    match write_csv(path, header, rows) {
        Ok(()) => info!("Output saved: {}", path.display()),
        Err(e) => warn!("Unable to write {}: {}", path.display(), e),
    }
}

/// Writes the sites of the study. A denied listing ends the command without error.
pub fn export_sites(api: &mut impl AdminApi, dir: &Path) -> BAdminResult<()> {
    let response = api.list_sites().map_err(platform_unreachable)?;
    match response.status {
        200 => info!("Status code: 200 - Success."),
        403 => {
            warn!("Status code: 403 - Failure. Check the API configuration in Viedoc Admin.");
            return Ok(());
        }
        status => {
            warn!("Status code: {} - Failure. {}", status, response.body);
            return Ok(());
        }
    }
    let sites: Vec<JSValue> = serde_json::from_str(&response.body).context(ParsingJsonSnafu {})?;
    if sites.is_empty() {
        info!("No study sites were obtained.");
        return Ok(());
    }
    let (header, rows) = site_rows(&sites);
    let header: Vec<&str> = header.iter().map(|s| s.as_str()).collect();
    save(&output_file(dir, SITES_EXPORT), &header, &rows);
    Ok(())
}

/// Writes the users of the study, one row per role and site.
pub fn export_users(api: &mut impl UserListing, dir: &Path) -> BAdminResult<()> {
    let response = api.list_users().map_err(platform_unreachable)?;
    match response.status {
        200 => info!("Status code: 200 - Success."),
        403 => {
            warn!("Status code: 403 - Failure. Check the API configuration in Viedoc Admin.");
            return Ok(());
        }
        status => {
            warn!("Status code: {} - Failure. {}", status, response.body);
            return Ok(());
        }
    }
    let body: JSValue = serde_json::from_str(&response.body).context(ParsingJsonSnafu {})?;
    let users = user_list(&body)?;

    info!("Retrieving list of sites (for siteName and siteCode).");
    let directory = match fetch_directory(&mut *api) {
        Ok(d) => d,
        Err(ProvisioningError::DirectoryForbidden) => {
            warn!("Status code: 403 - Failure. Check the API configuration in Viedoc Admin.");
            return Ok(());
        }
        Err(e) => return Err(Box::new(AdminError::Provisioning { source: e })),
    };

    info!("Retrieving role info per user.");
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for user in users.iter() {
        let (guid, _, email) = user_identity(user);
        match email.as_deref() {
            Some(API_CLIENT) | None => info!("Retrieving info for API client user {}.", guid),
            Some(e) => info!("Retrieving info for user {}.", e),
        }
        let roles = api.user_roles(&guid).map_err(platform_unreachable)?;
        match roles.status {
            200 => debug!("export_users: roles of {}: {}", guid, roles.body),
            403 => {
                warn!("Status code: 403 - Failure. Check the API configuration in Viedoc Admin.");
                return Ok(());
            }
            status => {
                warn!("Status code: {} - Failure. Skipping user {}.", status, guid);
                continue;
            }
        }
        let roles: JSValue = serde_json::from_str(&roles.body).context(ParsingJsonSnafu {})?;
        rows.extend(role_rows(user, &roles, &directory));
    }
    save(&output_file(dir, USERS_EXPORT), &USER_EXPORT_COLUMNS, &rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::fs;

    fn directory() -> DirectorySnapshot {
        DirectorySnapshot::new(vec![DirectorySite {
            site_guid: "g1".to_string(),
            site_name: Some("Karolinska".to_string()),
            site_code: Some("001".to_string()),
        }])
    }

    #[test]
    fn site_columns_drop_internal_fields() {
        let sites = vec![json!({"siteGuid": "g1", "siteType": 1, "siteCode": "001", "tzOffset": 60, "isTrainingEnabled": true, "expectedNumberOfSubjectsScreened": null})];
        let (header, rows) = site_rows(&sites);
        assert_eq!(
            header,
            vec!["siteGuid", "siteCode", "isTrainingEnabled", "expectedNumberOfSubjectsScreened"]
        );
        assert_eq!(
            rows,
            vec![vec![
                Some("g1".to_string()),
                Some("001".to_string()),
                Some("True".to_string()),
                None
            ]]
        );
    }

    #[test]
    fn api_clients_are_masked() {
        let (_, name, email) = user_identity(&json!({"userGuid": "u1", "email": null, "displayName": "x"}));
        assert_eq!(name.as_deref(), Some(API_CLIENT));
        assert_eq!(email.as_deref(), Some(API_CLIENT));
        let (_, _, email) = user_identity(&json!({"userGuid": "u1", "email": "u1"}));
        assert_eq!(email.as_deref(), Some(API_CLIENT));
        let (_, name, email) =
            user_identity(&json!({"userGuid": "u1", "email": "a@x.com", "displayName": "Ann"}));
        assert_eq!(name.as_deref(), Some("Ann"));
        assert_eq!(email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn one_row_per_role_and_site() {
        let user = json!({"userGuid": "u1", "email": "a@x.com", "displayName": "Ann"});
        let roles = json!({"roles": [
            {"roleName": "Monitor", "roleId": 5, "siteGuids": ["g1", "g9"], "siteGroupGuids": []},
            {"roleName": "Study manager", "roleId": 1, "siteGuids": null, "siteGroupGuids": ["sg"]}
        ]});
        let rows = role_rows(&user, &roles, &directory());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][5].as_deref(), Some("Karolinska"));
        assert_eq!(rows[0][6].as_deref(), Some("001"));
        assert_eq!(rows[1][4].as_deref(), Some("g9"));
        assert_eq!(rows[1][5], None);
        assert_eq!(rows[2][3].as_deref(), Some("Study manager"));
        assert_eq!(rows[2][4], None);
        assert_eq!(rows[2][7].as_deref(), Some("Yes"));
        assert_eq!(rows[0][7].as_deref(), Some("No"));
    }

    #[test]
    fn user_list_needs_user_infos() {
        assert!(user_list(&json!({"userInfos": []})).unwrap().is_empty());
        assert!(user_list(&json!({})).is_err());
    }

    #[derive(Default)]
    struct FakeStudy {
        sites: String,
        users: String,
        roles: VecDeque<ApiResponse>,
    }

    impl AdminApi for FakeStudy {
        fn list_sites(&mut self) -> ApiResult {
            Ok(ApiResponse::new(200, self.sites.clone()))
        }
        fn create_site(&mut self, _: &SitePayload) -> ApiResult {
            Ok(ApiResponse::new(500, ""))
        }
        fn assign_admin_role(&mut self, _: &RoleGrant) -> ApiResult {
            Ok(ApiResponse::new(500, ""))
        }
        fn assign_clinic_role(&mut self, _: &RoleGrant) -> ApiResult {
            Ok(ApiResponse::new(500, ""))
        }
    }

    impl UserListing for FakeStudy {
        fn list_users(&mut self) -> ApiResult {
            Ok(ApiResponse::new(200, self.users.clone()))
        }
        fn user_roles(&mut self, _: &str) -> ApiResult {
            Ok(self
                .roles
                .pop_front()
                .unwrap_or_else(|| ApiResponse::new(200, r#"{"roles": []}"#)))
        }
    }

    #[test]
    fn exports_users_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut api = FakeStudy {
            sites: r#"[{"siteGuid": "g1", "siteName": "Karolinska", "siteCode": "001"}]"#.to_string(),
            users: r#"{"userInfos": [{"userGuid": "u1", "email": "a@x.com", "displayName": "Ann"}, {"userGuid": "u2", "email": null}]}"#.to_string(),
            roles: VecDeque::from(vec![
                ApiResponse::new(200, r#"{"roles": [{"roleName": "Monitor", "siteGuids": ["g1"], "siteGroupGuids": null}]}"#),
                ApiResponse::new(200, r#"{"roles": [{"roleName": "API manager", "siteGuids": [], "siteGroupGuids": null}]}"#),
            ]),
        };
        export_users(&mut api, dir.path()).unwrap();
        let content = fs::read_to_string(dir.path().join(USERS_EXPORT)).unwrap();
        assert_eq!(
            content,
            "userGuid,displayName,email,roleName,siteGuid,siteName,siteCode,access_to_siteGroup\n\
             u1,Ann,a@x.com,Monitor,g1,Karolinska,001,No\n\
             u2,<<API CLIENT>>,<<API CLIENT>>,API manager,,,,No\n"
        );
    }

    #[test]
    fn no_sites_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut api = FakeStudy {
            sites: "[]".to_string(),
            ..FakeStudy::default()
        };
        export_sites(&mut api, dir.path()).unwrap();
        assert!(!dir.path().join(SITES_EXPORT).exists());
    }

    #[test]
    fn exports_sites_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut api = FakeStudy {
            sites: r#"[{"siteGuid": "g1", "siteName": "Karolinska", "siteCode": "001", "siteType": 0, "tzOffset": 1}]"#.to_string(),
            ..FakeStudy::default()
        };
        export_sites(&mut api, dir.path()).unwrap();
        let content = fs::read_to_string(dir.path().join(SITES_EXPORT)).unwrap();
        assert_eq!(content, "siteGuid,siteName,siteCode\ng1,Karolinska,001\n");
    }
}

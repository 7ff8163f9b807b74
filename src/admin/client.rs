// The HTTP side of the admin API.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use serde_json::Value as JSValue;

use crate::admin::config_reader::Connection;
use crate::admin::exports::UserListing;
use crate::admin::*;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Builds the form sent to the token endpoint.
pub fn token_form<'a>(client_id: &'a str, client_secret: &'a str) -> [(&'static str, &'a str); 3] {
    [
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ]
}

/// Requests a token with the client credentials.
///
/// Returns `None` if the platform refused the credentials: a 400 usually means a wrong
/// secret, a 500 a wrong client id.
pub fn get_token(http: &Client, connection: &Connection) -> BAdminResult<Option<String>> {
    info!("Getting token...");
    let response = http
        .post(&connection.token_url)
        .form(&token_form(&connection.client_id, &connection.client_secret))
        .send()
        .context(HttpSnafu {
            url: &connection.token_url,
        })?;
    match response.status().as_u16() {
        200 => {
            let js: JSValue = response.json().context(HttpSnafu {
                url: &connection.token_url,
            })?;
            let token = js
                .get("access_token")
                .and_then(|t| t.as_str())
                .map(|t| t.to_string());
            if token.is_some() {
                info!("Token successfully obtained.");
            } else {
                warn!("The token endpoint did not return a token.");
            }
            Ok(token)
        }
        400 => {
            warn!("Status code: 400 - Failure. Could not obtain token. Is the client secret correct?");
            Ok(None)
        }
        500 => {
            warn!("Status code: 500 - Failure. Could not obtain token. Is the client ID correct?");
            Ok(None)
        }
        status => {
            warn!(
                "Status code: {} - Failure. Could not obtain token.",
                status
            );
            Ok(None)
        }
    }
}

/// An authenticated connection to the admin API.
pub struct ViedocClient {
    http: Client,
    api_url: String,
    token: String,
}

impl ViedocClient {
    pub fn connect(connection: Connection) -> BAdminResult<ViedocClient> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context(HttpSnafu {
                url: &connection.token_url,
            })?;
        let token = get_token(&http, &connection)?.context(NoTokenSnafu {})?;
        Ok(ViedocClient {
            http,
            api_url: connection.api_url,
            token,
        })
    }

    pub fn url(&self, path: &str) -> String {
        endpoint(&self.api_url, path)
    }

    fn read(response: reqwest::Result<Response>) -> ApiResult {
        let response = response.map_err(|e| TransportError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportError::new(e.to_string()))?;
        debug!("read: status {}: {}", status, body);
        Ok(ApiResponse::new(status, body))
    }

    fn get(&self, path: &str) -> ApiResult {
        let url = self.url(path);
        debug!("GET {}", url);
        ViedocClient::read(
            self.http
                .get(url)
                .header(ACCEPT, "application/json")
                .bearer_auth(&self.token)
                .send(),
        )
    }

    fn post<T: serde::Serialize + ?Sized>(&self, path: &str, body: &T) -> ApiResult {
        let url = self.url(path);
        debug!("POST {}", url);
        ViedocClient::read(
            self.http
                .post(url)
                .header(ACCEPT, "application/json")
                .bearer_auth(&self.token)
                .json(body)
                .send(),
        )
    }
}

impl UserListing for ViedocClient {
    fn list_users(&mut self) -> ApiResult {
        info!("Retrieving list of users from {}.", self.url("/admin/users"));
        self.post("/admin/users", &serde_json::json!({}))
    }

    fn user_roles(&mut self, user_guid: &str) -> ApiResult {
        self.get(&format!("/admin/users/{}/roles", user_guid))
    }
}

impl AdminApi for ViedocClient {
    fn list_sites(&mut self) -> ApiResult {
        info!("Retrieving list of study sites from {}.", self.url("/admin/studysites"));
        self.get("/admin/studysites")
    }

    fn create_site(&mut self, site: &SitePayload) -> ApiResult {
        self.post("/admin/studysites", site)
    }

    fn assign_admin_role(&mut self, grant: &RoleGrant) -> ApiResult {
        self.post("/admin/adminusers", &grant.body())
    }

    fn assign_clinic_role(&mut self, grant: &RoleGrant) -> ApiResult {
        self.post("/admin/clinicusers", &grant.body())
    }
}

pub fn endpoint(api_url: &str, path: &str) -> String {
    format!("{}{}", api_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        assert_eq!(
            endpoint("https://v4api.viedoc.net/", "/admin/studysites"),
            "https://v4api.viedoc.net/admin/studysites"
        );
        assert_eq!(
            endpoint("https://api.us.viedoc.com", "/admin/users/abc/roles"),
            "https://api.us.viedoc.com/admin/users/abc/roles"
        );
    }

    #[test]
    fn token_request_form() {
        let form = token_form("cid", "secret");
        assert_eq!(form[0], ("grant_type", "client_credentials"));
        assert_eq!(form[1], ("client_id", "cid"));
        assert_eq!(form[2], ("client_secret", "secret"));
    }

    #[test]
    fn role_bodies() {
        let grant = RoleGrant {
            email: "a@x.com".to_string(),
            role_oid: "RoleSiteManager".to_string(),
            site_guid: Some("g1".to_string()),
        };
        assert_eq!(
            serde_json::to_value(grant.body()).unwrap(),
            serde_json::json!([{"email": "a@x.com", "roles": [{"roleOID": "RoleSiteManager", "siteGuid": "g1"}]}])
        );
    }

    #[test]
    fn unreachable_token_endpoint() {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let connection = Connection {
            token_url: "http://127.0.0.1:9/connect/token".to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
            client_id: "cid".to_string(),
            client_secret: "x".to_string(),
        };
        let res = get_token(&http, &connection);
        assert!(matches!(res.map_err(|e| *e), Err(AdminError::Http { .. })));
    }
}

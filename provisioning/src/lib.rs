/*!
Bulk provisioning of study sites and user roles for the Viedoc administration API.

The crate works on tables read from the import templates (see the [manual]) and
talks to the platform through the [AdminApi] trait. It does not know how requests are
sent: the `viedoc-admin` command line tool provides an HTTP implementation.

A run always starts with a snapshot of the sites of the study:

```ignore
let directory = fetch_directory(&mut api)?;
let batch = SiteBatch::from_table(&table)?;
let outcome = create_sites(&batch, &directory, &mut api)?;
for line in outcome.summary(RunKind::Sites) {
    println!("{}", line);
}
```
*/

mod api;
mod config;
pub mod manual;
mod normalize;
mod report;
mod response;
mod sites;
#[cfg(test)]
mod testing;
mod timezones;
mod users;

use log::{debug, info, warn};

pub use crate::api::{AdminApi, ApiResponse, ApiResult, TransportError};
pub use crate::config::*;
pub use crate::normalize::{is_system_role, system_role_id, SYSTEM_ROLES};
pub use crate::report::RunKind;
pub use crate::response::{error_text, KEY_NOT_PRESENT};
pub use crate::sites::{create_sites, site_payload, SiteBatch, SITE_COLUMNS, SITE_MANAGER_COLUMN};
pub use crate::timezones::convert_time_zone;
pub use crate::users::{create_users, resolve_site, SiteResolution, UserBatch, USER_COLUMNS};

/// Reads the sites of the study.
///
/// The snapshot is taken once per run: the sites created during the run are not
/// added to it.
pub fn fetch_directory(api: &mut impl AdminApi) -> Result<DirectorySnapshot, ProvisioningError> {
    let response = api
        .list_sites()
        .map_err(|source| ProvisioningError::Transport {
            row_number: None,
            partial: RunOutcome::default(),
            source,
        })?;
    match response.status {
        200 => {
            let sites: Vec<DirectorySite> =
                serde_json::from_str(&response.body).map_err(|e| {
                    warn!("fetch_directory: unreadable site list: {:?}", e);
                    ProvisioningError::DirectoryUnavailable {
                        status: response.status,
                        body: response.body.clone(),
                    }
                })?;
            info!("Found {} sites in the study.", sites.len());
            debug!("fetch_directory: sites: {:?}", sites);
            Ok(DirectorySnapshot::new(sites))
        }
        403 => Err(ProvisioningError::DirectoryForbidden),
        status => Err(ProvisioningError::DirectoryUnavailable {
            status,
            body: response.body,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedApi;

    #[test]
    fn reads_sites() {
        let mut api = ScriptedApi::new().with_sites(&[("g1", "Karolinska", "001")]);
        let d = fetch_directory(&mut api).unwrap();
        assert_eq!(d.sites().len(), 1);
        assert!(d.has_site_code("001"));
    }

    #[test]
    fn empty_study() {
        let d = fetch_directory(&mut ScriptedApi::new()).unwrap();
        assert!(d.is_empty());
    }

    #[test]
    fn missing_fields_are_tolerated() {
        let mut api = ScriptedApi::new();
        api.sites = vec![Ok(ApiResponse::new(
            200,
            r#"[{"siteGuid":"g1","siteName":null},{"siteGuid":"g2","siteName":"Lund","siteCode":"02","countryCode":"SE"}]"#,
        ))];
        let d = fetch_directory(&mut api).unwrap();
        assert_eq!(d.site_named("lund").map(|s| s.site_guid.as_str()), Some("g2"));
        assert!(d.has_site_guid("g1"));
    }

    #[test]
    fn forbidden_aborts() {
        let mut api = ScriptedApi::new();
        api.sites = vec![Ok(ApiResponse::new(403, ""))];
        assert!(matches!(
            fetch_directory(&mut api),
            Err(ProvisioningError::DirectoryForbidden)
        ));
        api.sites = vec![Ok(ApiResponse::new(500, "oops"))];
        assert!(matches!(
            fetch_directory(&mut api),
            Err(ProvisioningError::DirectoryUnavailable { status: 500, .. })
        ));
        api.sites = vec![Err(TransportError::new("timeout"))];
        assert!(matches!(
            fetch_directory(&mut api),
            Err(ProvisioningError::Transport {
                row_number: None,
                ..
            })
        ));
    }
}

// Clean-up of the values typed in the import templates.

const TRUE_VALUES: &[&str] = &[
    "TRUE", "True", "true", "T", "t", "Yes", "yes", "Y", "y", "1",
];
const FALSE_VALUES: &[&str] = &[
    "FALSE", "False", "false", "F", "f", "No", "no", "N", "n", "0",
];

/// Human readable names of the system roles, and their identifier in the API.
pub const SYSTEM_ROLES: &[(&str, &str)] = &[
    ("study manager", "RoleStudyManager"),
    ("site manager", "RoleSiteManager"),
    ("api manager", "ApiManager"),
    ("designer", "RoleDesigner"),
    ("unblinded statistician", "UnblindedStatistician"),
    ("dictionary manager", "DictionaryManager"),
    ("reference data source manager", "RefDataSourceManager"),
    ("etmf manager", "EtmfManager"),
    ("design impact analyst", "DesignImpactAnalyst"),
];

pub const SITE_MANAGER_ROLE: &str = "RoleSiteManager";

/// Converts the usual spellings of a boolean to `True` or `False`.
/// Anything else is returned unchanged, and the platform will decide.
pub fn to_true_false(x: &str) -> String {
    if TRUE_VALUES.contains(&x) {
        "True".to_string()
    } else if FALSE_VALUES.contains(&x) {
        "False".to_string()
    } else {
        x.to_string()
    }
}

/// The identifier of a system role given by its display name (any case).
pub fn system_role_id(role: &str) -> Option<&'static str> {
    let lower = role.to_lowercase();
    SYSTEM_ROLES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, id)| *id)
}

/// True for the nine system role identifiers, including the site manager.
pub fn is_system_role(role_oid: &str) -> bool {
    SYSTEM_ROLES.iter().any(|(_, id)| *id == role_oid)
}

/// Every role needs a site, except the system roles. The site manager is the
/// exception to the exception.
pub fn requires_site(role_oid: &str) -> bool {
    role_oid == SITE_MANAGER_ROLE || !is_system_role(role_oid)
}

/// Only plain non-negative integers are accepted for the subject counts.
pub fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

use crate::admin::io_csv::write_csv;
use crate::admin::*;

pub const SITES_TEMPLATE: &str = "SitesToAdd_template.csv";
pub const USERS_TEMPLATE: &str = "UsersToAdd_template.csv";

/// Writes the import templates that do not exist yet. Existing files are left as they are.
pub fn write_templates(dir: &Path) -> BAdminResult<()> {
    std::fs::create_dir_all(dir).context(OutputDirectorySnafu {
        path: dir.display().to_string(),
    })?;
    let mut site_header: Vec<&str> = SITE_COLUMNS.to_vec();
    site_header.push(SITE_MANAGER_COLUMN);
    for (name, header) in [
        (SITES_TEMPLATE, site_header),
        (USERS_TEMPLATE, USER_COLUMNS.to_vec()),
    ] {
        let path = output_file(dir, name);
        if path.exists() {
            info!("{} already exists.", path.display());
            continue;
        }
        match write_csv(&path, &header, &[]) {
            Ok(()) => info!("Template created: {}", path.display()),
            Err(e) => warn!("Unable to write {}: {}", path.display(), e),
        }
    }
    Ok(())
}

use crate::config::RunOutcome;

/// What was being provisioned, for the wording of the summary.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RunKind {
    Sites,
    Roles,
}

fn join_rows(rows: &[usize]) -> String {
    rows.iter()
        .map(|r| r.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

impl RunOutcome {
    /// The sentences closing a run: the count first, then the failed rows if any.
    pub fn summary(&self, kind: RunKind) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        lines.push(match (kind, self.succeeded) {
            (RunKind::Sites, 0) => "No sites were created.".to_string(),
            (RunKind::Sites, 1) => "One site was successfully created.".to_string(),
            (RunKind::Sites, n) => format!("{} sites were successfully created.", n),
            (RunKind::Roles, 0) => "No users were created or roles assigned.".to_string(),
            (RunKind::Roles, 1) => "One role was successfully assigned.".to_string(),
            (RunKind::Roles, n) => format!("{} roles were successfully assigned.", n),
        });
        if !self.failed.is_empty() {
            lines.push(match kind {
                RunKind::Sites => format!(
                    "Failed to create site in row: {}.",
                    join_rows(&self.failed)
                ),
                RunKind::Roles => format!("Failed rows: {}.", join_rows(&self.failed)),
            });
        }
        if !self.not_invited.is_empty() {
            lines.push(format!(
                "Failed to invite site manager in row: {}.",
                join_rows(&self.not_invited)
            ));
        }
        lines
    }
}

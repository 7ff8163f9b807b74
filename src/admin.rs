use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::path::{Path, PathBuf};

use viedoc_provisioning::*;

use crate::admin::client::ViedocClient;
use crate::admin::config_reader::*;
use crate::args::{Args, Command, InputArgs};

pub mod client;
pub mod config_reader;
pub mod exports;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod run_log;
pub mod templates;

#[derive(Debug, Snafu)]
pub enum AdminError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet named {name}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("The file {path} is empty"))]
    EmptyInput { path: String },
    #[snafu(display("Unsupported file type for {path}: use xlsx, xlsm, xlsb, xls, ods or csv"))]
    UnsupportedInput { path: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Could not read line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Could not write {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Could not use the output directory {path}"))]
    OutputDirectory {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Missing setting {name}: pass it on the command line or in the configuration file"))]
    MissingSetting { name: String },
    #[snafu(display("Unknown server {server}: run the servers command to see the valid choices"))]
    UnknownServer { server: u32 },
    #[snafu(display("Request to {url} failed"))]
    Http { source: reqwest::Error, url: String },
    #[snafu(display("Could not obtain a token"))]
    NoToken {},
    #[snafu(display("The platform could not be reached"))]
    Unreachable { source: TransportError },
    #[snafu(display("{source}"))]
    Provisioning { source: ProvisioningError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AdminResult<T> = Result<T, AdminError>;

// Boxed, as some variants carry a partial run outcome.
pub type BAdminResult<T> = Result<T, Box<AdminError>>;

/// Reads a spreadsheet into a table, according to its extension.
pub fn read_table(path: &str, worksheet: &Option<String>) -> BAdminResult<Table> {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    info!("Reading input file {}", path);
    let table = match extension.as_deref() {
        Some("csv") => io_csv::read_csv_table(path)?,
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => {
            io_excel::read_excel_table(path, worksheet)?
        }
        _ => return Err(Box::new(AdminError::UnsupportedInput { path: path.to_string() })),
    };
    debug!("read_table: header {:?}, {} rows", table.header, table.rows.len());
    Ok(table)
}

/// Logs the summary of a provisioning run, including when it was interrupted.
fn finish_run(res: Result<RunOutcome, ProvisioningError>, kind: RunKind) -> BAdminResult<()> {
    match res {
        Ok(outcome) => {
            for line in outcome.summary(kind) {
                info!("{}", line);
            }
            Ok(())
        }
        Err(ProvisioningError::Transport {
            row_number,
            partial,
            source,
        }) => {
            warn!("The run was interrupted: the platform could not be reached.");
            for line in partial.summary(kind) {
                info!("{}", line);
            }
            Err(Box::new(AdminError::Provisioning {
                source: ProvisioningError::Transport {
                    row_number,
                    partial,
                    source,
                },
            }))
        }
        Err(e) => Err(Box::new(AdminError::Provisioning { source: e })),
    }
}

fn connect(settings: &Settings) -> BAdminResult<ViedocClient> {
    let connection = settings.connection()?;
    info!("Token URL: {}", connection.token_url);
    info!("API URL: {}", connection.api_url);
    info!("Client ID: {}", masked(&connection.client_id));
    ViedocClient::connect(connection)
}

/// Keeps the first three characters.
pub fn masked(secret: &str) -> String {
    let shown: String = secret.chars().take(3).collect();
    let hidden = secret.chars().count().saturating_sub(3);
    format!("{}{}", shown, "*".repeat(hidden))
}

pub fn run_create_sites(settings: &Settings, input: &InputArgs) -> BAdminResult<()> {
    let worksheet = input
        .excel_worksheet_name
        .clone()
        .or_else(|| settings.excel_worksheet_name.clone());
    let table = read_table(&input.input, &worksheet)?;
    // The layout is checked before connecting.
    let batch = SiteBatch::from_table(&table).context(ProvisioningSnafu {})?;
    info!("{} sites to create.", batch.records.len());
    let mut client = connect(settings)?;
    let directory = fetch_directory(&mut client).context(ProvisioningSnafu {})?;
    finish_run(create_sites(&batch, &directory, &mut client), RunKind::Sites)
}

pub fn run_create_users(settings: &Settings, input: &InputArgs) -> BAdminResult<()> {
    let worksheet = input
        .excel_worksheet_name
        .clone()
        .or_else(|| settings.excel_worksheet_name.clone());
    let table = read_table(&input.input, &worksheet)?;
    let batch = UserBatch::from_table(&table).context(ProvisioningSnafu {})?;
    info!("{} rows to import.", batch.records.len());
    let mut client = connect(settings)?;
    let directory = fetch_directory(&mut client).context(ProvisioningSnafu {})?;
    finish_run(create_users(&batch, &directory, &mut client), RunKind::Roles)
}

pub fn run_export_sites(settings: &Settings) -> BAdminResult<()> {
    let mut client = connect(settings)?;
    exports::export_sites(&mut client, &settings.output_directory)
}

pub fn run_export_users(settings: &Settings) -> BAdminResult<()> {
    let mut client = connect(settings)?;
    exports::export_users(&mut client, &settings.output_directory)
}

pub fn run_servers() {
    for server in SERVERS.iter() {
        println!("{:>2}  {:<22} {}", server.number, server.name, server.api_url);
    }
    println!("{:>2}  {:<22} (tokenUrl and apiUrl required)", CUSTOM_SERVER, "Custom");
}

/// Runs a command. The run log must already be set up.
pub fn run(args: &Args, settings: &Settings) -> BAdminResult<()> {
    info!("viedoc-admin {}", env!("CARGO_PKG_VERSION"));
    debug!("run: settings: {:?}", settings.redacted());
    match &args.command {
        Command::CreateSites(input) => run_create_sites(settings, input),
        Command::CreateUsers(input) => run_create_users(settings, input),
        Command::ExportSites => run_export_sites(settings),
        Command::ExportUsers => run_export_users(settings),
        Command::Templates => templates::write_templates(&settings.output_directory),
        Command::Servers => {
            run_servers();
            Ok(())
        }
    }
}

/// The path of a file in the output directory.
pub fn output_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_secrets() {
        assert_eq!(masked("abcdef"), "abc***");
        assert_eq!(masked("ab"), "ab");
    }

    #[test]
    fn unknown_extension() {
        let res = read_table("users.txt", &None);
        assert!(matches!(
            res.map_err(|e| *e),
            Err(AdminError::UnsupportedInput { .. })
        ));
    }

    #[test]
    fn interrupted_run_is_an_error() {
        let res = finish_run(
            Err(ProvisioningError::Transport {
                row_number: Some(3),
                partial: RunOutcome {
                    succeeded: 1,
                    ..RunOutcome::default()
                },
                source: TransportError::new("reset"),
            }),
            RunKind::Sites,
        );
        assert!(res.is_err());
        assert!(finish_run(Ok(RunOutcome::default()), RunKind::Roles).is_ok());
    }
}

use clap::{Parser, Subcommand};

/// Bulk creation of study sites and user roles in Viedoc, through the admin API.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// (file path, optional) A JSON file with the connection settings (server, clientId, clientSecret, ...).
    /// The other arguments take precedence over the values of this file.
    #[clap(short, long, value_parser, global = true)]
    pub config: Option<String>,

    /// (number 1-11) The Viedoc environment to connect to. Run the `servers` command to see the list.
    #[clap(short, long, value_parser, global = true)]
    pub server: Option<u32>,

    /// (url) The token endpoint, only used with a custom server (11).
    #[clap(long, value_parser, global = true)]
    pub token_url: Option<String>,

    /// (url) The base URL of the API, only used with a custom server (11).
    #[clap(long, value_parser, global = true)]
    pub api_url: Option<String>,

    /// The client id of the API client, as configured in Viedoc Admin.
    #[clap(long, value_parser, global = true)]
    pub client_id: Option<String>,

    /// The secret of the API client.
    #[clap(long, value_parser, env = "VIEDOC_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub client_secret: Option<String>,

    /// (directory, default: current directory) Where the log and the exported files are written.
    #[clap(short, long, value_parser, global = true)]
    pub out: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,

    /// If passed as an argument, the log is only written to the log file.
    #[clap(short, long, takes_value = false, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Creates the sites listed in a spreadsheet, and invites their site managers.
    CreateSites(InputArgs),
    /// Invites users and assigns them roles, as listed in a spreadsheet.
    CreateUsers(InputArgs),
    /// Writes the sites of the study to export_studySites.csv
    ExportSites,
    /// Writes the users of the study and their roles to export_studyUsers.csv
    ExportUsers,
    /// Writes empty import templates in the output directory.
    Templates,
    /// Lists the known Viedoc environments.
    Servers,
}

#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// (file path) The spreadsheet to import: xlsx, xlsm, xls, ods or csv.
    #[clap(value_parser)]
    pub input: String,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_the_command() {
        let args = Args::try_parse_from([
            "viedoc-admin",
            "create-sites",
            "sites.xlsx",
            "--server",
            "2",
            "--client-id",
            "abc",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(args.server, Some(2));
        assert_eq!(args.client_id.as_deref(), Some("abc"));
        assert!(args.verbose);
        match args.command {
            Command::CreateSites(input) => {
                assert_eq!(input.input, "sites.xlsx");
                assert_eq!(input.excel_worksheet_name, None);
            }
            c => panic!("unexpected command {:?}", c),
        }
    }

    #[test]
    fn input_is_required() {
        assert!(Args::try_parse_from(["viedoc-admin", "create-users"]).is_err());
        assert!(Args::try_parse_from(["viedoc-admin", "servers"]).is_ok());
    }
}

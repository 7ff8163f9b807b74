use crate::admin::*;

use serde::{Deserialize, Serialize};
use std::fs;

/// A Viedoc environment.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Server {
    pub number: u32,
    pub name: &'static str,
    pub token_url: &'static str,
    pub api_url: &'static str,
}

pub const SERVERS: [Server; 10] = [
    Server {
        number: 1,
        name: "EU - Training",
        token_url: "https://v4ststraining.viedoc.net/connect/token",
        api_url: "https://v4apitraining.viedoc.net",
    },
    Server {
        number: 2,
        name: "EU - Production",
        token_url: "https://v4sts.viedoc.net/connect/token",
        api_url: "https://v4api.viedoc.net",
    },
    Server {
        number: 3,
        name: "US - Training",
        token_url: "https://ststraining.us.viedoc.com/connect/token",
        api_url: "https://apitraining.us.viedoc.com",
    },
    Server {
        number: 4,
        name: "US - Production",
        token_url: "https://sts.us.viedoc.com/connect/token",
        api_url: "https://api.us.viedoc.com",
    },
    Server {
        number: 5,
        name: "JP - Training",
        token_url: "https://v4ststrainingjp.viedoc.net/connect/token",
        api_url: "https://v4apitrainingjp.viedoc.net",
    },
    Server {
        number: 6,
        name: "JP - Production",
        token_url: "https://v4stsjp.viedoc.net/connect/token",
        api_url: "https://v4apijp.viedoc.net",
    },
    Server {
        number: 7,
        name: "CN - Training",
        token_url: "https://ststraining.viedoc.cn/connect/token",
        api_url: "https://apitraining.viedoc.cn",
    },
    Server {
        number: 8,
        name: "CN - Production",
        token_url: "https://sts.viedoc.cn/connect/token",
        api_url: "https://api.viedoc.cn",
    },
    Server {
        number: 9,
        name: "Stage",
        token_url: "https://v4stsstage.viedoc.net/connect/token",
        api_url: "https://v4apistage.viedoc.net",
    },
    Server {
        number: 10,
        name: "External test",
        token_url: "https://externaltest4sts.viedoc.dev/connect/token",
        api_url: "https://externaltest4api.viedoc.dev",
    },
];

pub const CUSTOM_SERVER: u32 = 11;

pub fn find_server(number: u32) -> Option<&'static Server> {
    SERVERS.iter().find(|s| s.number == number)
}

/// The configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    pub server: Option<u32>,
    #[serde(rename = "tokenUrl")]
    pub token_url: Option<String>,
    #[serde(rename = "apiUrl")]
    pub api_url: Option<String>,
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
    #[serde(rename = "clientSecret")]
    pub client_secret: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

pub fn read_config(path: &str) -> BAdminResult<AdminConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: AdminConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Connection {
    pub token_url: String,
    pub api_url: String,
    pub client_id: String,
    pub client_secret: String,
}

/// The settings of a run, after merging the command line and the configuration file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub server: Option<u32>,
    pub token_url: Option<String>,
    pub api_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub output_directory: PathBuf,
    pub excel_worksheet_name: Option<String>,
}

impl Settings {
    /// Command line arguments take precedence over the configuration file.
    pub fn resolve(args: &Args, config: &AdminConfig) -> Settings {
        Settings {
            server: args.server.or(config.server),
            token_url: args.token_url.clone().or_else(|| config.token_url.clone()),
            api_url: args.api_url.clone().or_else(|| config.api_url.clone()),
            client_id: args.client_id.clone().or_else(|| config.client_id.clone()),
            client_secret: args
                .client_secret
                .clone()
                .or_else(|| config.client_secret.clone()),
            output_directory: PathBuf::from(
                args.out
                    .clone()
                    .or_else(|| config.output_directory.clone())
                    .unwrap_or_else(|| ".".to_string()),
            ),
            excel_worksheet_name: config.excel_worksheet_name.clone(),
        }
    }

    /// The URLs and credentials to use. Fails if anything is missing.
    pub fn connection(&self) -> BAdminResult<Connection> {
        let server = self.server.context(MissingSettingSnafu { name: "server" })?;
        let (token_url, api_url) = if server == CUSTOM_SERVER {
            let token_url = self
                .token_url
                .clone()
                .context(MissingSettingSnafu { name: "tokenUrl" })?;
            let api_url = self
                .api_url
                .clone()
                .context(MissingSettingSnafu { name: "apiUrl" })?;
            (token_url, api_url.trim_end_matches('/').to_string())
        } else {
            let s = find_server(server).context(UnknownServerSnafu { server })?;
            (s.token_url.to_string(), s.api_url.to_string())
        };
        let client_id = self
            .client_id
            .clone()
            .context(MissingSettingSnafu { name: "clientId" })?;
        let client_secret = self
            .client_secret
            .clone()
            .context(MissingSettingSnafu { name: "clientSecret" })?;
        ensure!(
            !client_id.trim().is_empty(),
            MissingSettingSnafu { name: "clientId" }
        );
        Ok(Connection {
            token_url,
            api_url,
            client_id,
            client_secret,
        })
    }

    /// For logging.
    pub fn redacted(&self) -> Settings {
        Settings {
            client_secret: self.client_secret.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        }
    }
}

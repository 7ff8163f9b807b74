use clap::Parser;
use log::{error, info};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

mod admin;
mod args;

use crate::admin::config_reader::{read_config, AdminConfig, Settings};
use crate::admin::run_log::init_run_log;
use crate::admin::BAdminResult;
use crate::args::{Args, Command};

fn settings(args: &Args) -> BAdminResult<Settings> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => AdminConfig::default(),
    };
    Ok(Settings::resolve(args, &config))
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Command::Servers = args.command {
        admin::run_servers();
        return ExitCode::SUCCESS;
    }

    let settings = match settings(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("An error occured: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let out: PathBuf = settings.output_directory.clone();
    if let Err(e) = init_run_log(&out, args.verbose, args.quiet) {
        eprintln!("An error occured: {}", e);
        return ExitCode::FAILURE;
    }

    match admin::run(&args, &settings) {
        Ok(()) => {
            info!("Done.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let mut previous = e.to_string();
            error!("An error occured: {}", previous);
            let mut source = e.source();
            while let Some(s) = source {
                let msg = s.to_string();
                if msg != previous {
                    error!("  caused by: {}", msg);
                }
                previous = msg;
                source = s.source();
            }
            ExitCode::FAILURE
        }
    }
}

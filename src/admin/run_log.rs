// The run log: every log record is appended to log.txt in the output directory,
// and echoed on the console.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};

use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::admin::*;

pub const LOG_FILE: &str = "log.txt";

/// Writes to the log file, and to stdout unless quiet.
pub struct TeeWriter {
    file: File,
    echo: bool,
}

impl TeeWriter {
    pub fn new(file: File, echo: bool) -> TeeWriter {
        TeeWriter { file, echo }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        if self.echo {
            io::stdout().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.echo {
            io::stdout().flush()?;
        }
        Ok(())
    }
}

/// Opens the log for appending. A log that already has content gets a separator
/// line before the new run.
pub fn open_log(dir: &Path) -> BAdminResult<File> {
    let path_s = dir.display().to_string();
    fs::create_dir_all(dir).context(OutputDirectorySnafu { path: &path_s })?;
    let path = output_file(dir, LOG_FILE);
    let continuing = fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .context(OutputDirectorySnafu { path: &path_s })?;
    if continuing {
        write!(file, "\n{}\n\n", "-".repeat(100)).context(OutputDirectorySnafu { path: &path_s })?;
    }
    Ok(file)
}

/// Installs the logger. `RUST_LOG` still applies on top of the chosen level.
pub fn init_run_log(dir: &Path, verbose: bool, quiet: bool) -> BAdminResult<()> {
    let file = open_log(dir)?;
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Builder::new()
        .filter_level(level)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("hyper", LevelFilter::Warn)
        .filter_module("rustls", LevelFilter::Warn)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(TeeWriter::new(file, !quiet))))
        .try_init()
        .map_err(|e| Box::new(AdminError::Whatever {
            message: format!("Could not set up the log: {}", e),
            source: None,
        }))?;
    Ok(())
}

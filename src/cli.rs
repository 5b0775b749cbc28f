//! Command-line interface.
//!
//! Turns the command line into a validated [`Config`]. Unknown flags and flags
//! missing their value are rejected rather than ignored.

use {
    crate::{
        config::{Config, ConfigBuilder, FormatMode, TimeZone, DEFAULT_MAX_ROTATIONS, DEFAULT_OUTPUT},
        error::RollError,
    },
    clap::{ArgAction, Parser},
    std::path::PathBuf,
};

/// logspool, a minimalistic log file generator.
///
/// Reads standard input and appends every chunk to a log file as
/// `<DD-MM-YYYY HH:MM:SS> <tag> <payload>`, moving on to FILENAME.0,
/// FILENAME.1, ... when a file exists or is full.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "logspool")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Output filename.
    #[arg(long, value_name = "FILENAME", default_value = DEFAULT_OUTPUT)]
    pub out: PathBuf,

    /// Tag written into every record.
    #[arg(long, default_value_t = String::new())]
    pub tag: String,

    /// Go to the next log file after SIZE bytes (<= 0 means infinite).
    #[arg(long, value_name = "SIZE", default_value_t = 0, allow_negative_numbers = true)]
    pub size: i64,

    /// Indent continuation lines of multi-line input under the first line.
    #[arg(long)]
    pub deluxe: bool,

    /// Stamp records in UTC instead of local time.
    #[arg(long)]
    pub utc: bool,

    /// Permission bits for created files, in octal.
    #[arg(long, value_name = "OCTAL", default_value = "640", value_parser = parse_octal)]
    pub file_mode: u32,

    /// How many numbered files to try after FILENAME before giving up.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_ROTATIONS)]
    pub max_rotations: usize,

    /// Diagnostics on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Build the run configuration from the parsed arguments.
    pub fn to_config(&self) -> Result<Config, RollError> {
        let mode = if self.deluxe {
            FormatMode::Deluxe
        } else {
            FormatMode::Default
        };
        let time_zone = if self.utc { TimeZone::UTC } else { TimeZone::Local };
        ConfigBuilder::new(&self.out)
            .tag(self.tag.as_str())
            .max_size(u64::try_from(self.size).unwrap_or(0))
            .mode(mode)
            .time_zone(time_zone)
            .file_mode(self.file_mode)
            .max_rotations(self.max_rotations)
            .build()
    }

    /// Default tracing filter for the requested verbosity. `RUST_LOG` overrides it.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn parse_octal(value: &str) -> Result<u32, String> {
    let digits = value.strip_prefix("0o").unwrap_or(value);
    u32::from_str_radix(digits, 8).map_err(|err| format!("'{value}' is not an octal mode: {err}"))
}

/// Parse CLI arguments from an iterator of strings.
/// Useful for testing.
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}

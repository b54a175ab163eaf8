use std::path::PathBuf;

use frc_command::{auto::AutoError, CommandError, SetDefaultCommandError};
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("Could not read config {}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Could not parse config {}", path.display()))]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[snafu(display("Invalid {field}: {reason}"))]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RobotError {
    #[snafu(display("Configuration failed"))]
    Config { source: ConfigError },
    #[snafu(display("Autonomous setup failed"))]
    Auto { source: AutoError },
    #[snafu(display("Command failed"))]
    Command { source: CommandError },
    #[snafu(display("Could not set default command for {subsystem}"))]
    DefaultCommand {
        subsystem: &'static str,
        source: SetDefaultCommandError,
    },
    #[snafu(display("Could not install logger"))]
    Logger { source: log::SetLoggerError },
    #[snafu(display("Invalid match length"))]
    MatchLength {
        source: std::time::TryFromFloatSecsError,
    },
    #[snafu(display("Could not encode the match report"))]
    Report { source: serde_json::Error },
    #[snafu(display("Could not write {}", path.display()))]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

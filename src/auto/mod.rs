//! Autonomous routines authored as PathPlanner `.auto` files.
//!
//! Routines reference robot actions by name; the robot registers those names
//! with [`NamedCommands`] before the routines are built into commands by
//! [`AutoBuilder`].

use std::path::PathBuf;

use snafu::Snafu;

mod builder;
mod named;
mod routine;

pub use builder::{AutoBuilder, PathCommandFactory, AUTO_EXTENSION, NONE_OPTION};
pub use named::NamedCommands;
pub use routine::{AutoRoutine, AutoStep};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AutoError {
    #[snafu(display("Could not read {}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Could not parse auto {}", path.display()))]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[snafu(display("No auto named {name} in {}", dir.display()))]
    NoSuchAuto { name: String, dir: PathBuf },
    #[snafu(display("Auto references path {path}, but no path follower is configured"))]
    PathFollowingUnavailable { path: String },
    #[snafu(display("Cannot wait {seconds} seconds"))]
    InvalidWaitTime {
        seconds: f64,
        source: std::time::TryFromFloatSecsError,
    },
    #[snafu(display("Could not compose auto commands"))]
    Compose { source: crate::CommandError },
}

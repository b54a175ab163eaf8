use std::{fs, path::PathBuf, time::Duration};

use clap::Parser;
use frc_command::{dashboard, robot::RobotRunner};
use log::{info, warn, LevelFilter};
use reefscape_robot::{
    config::RobotConfig,
    container::AUTO_CHOOSER_KEY,
    error::{
        CommandSnafu, ConfigSnafu, MatchLengthSnafu, ReportSnafu, RobotError, WriteSnafu,
    },
    logger,
    sim::{run_match, MatchPlan},
    Robot,
};
use snafu::ResultExt;

#[derive(Parser, Debug)]
#[clap(name = "reefscape-sim", about = "Play a simulated match on the robot")]
struct Args {
    /// Robot configuration. Defaults are used when the file is missing.
    #[clap(long, default_value = "robot.toml")]
    config: PathBuf,
    /// Auto to select on the dashboard chooser.
    #[clap(long)]
    auto: Option<String>,
    #[clap(long, default_value = "15")]
    auto_seconds: f64,
    #[clap(long, default_value = "135")]
    teleop_seconds: f64,
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
    #[clap(long)]
    log_file: Option<PathBuf>,
    /// Write the final dashboard table here as JSON.
    #[clap(long)]
    dashboard: Option<PathBuf>,
    /// Run loops at wall-clock speed instead of as fast as possible.
    #[clap(long)]
    realtime: bool,
}

fn load_config(args: &Args) -> Result<RobotConfig, RobotError> {
    if !args.config.exists() {
        warn!("{} not found; using built-in defaults", args.config.display());
        return Ok(RobotConfig::default());
    }
    RobotConfig::load(&args.config).context(ConfigSnafu)
}

#[snafu::report]
fn main() -> Result<(), RobotError> {
    let args = Args::parse();
    logger::init(args.log_level, args.log_file.as_deref())?;

    let config = load_config(&args)?;
    let plan = MatchPlan {
        autonomous: Duration::try_from_secs_f64(args.auto_seconds).context(MatchLengthSnafu)?,
        teleop: Duration::try_from_secs_f64(args.teleop_seconds).context(MatchLengthSnafu)?,
        realtime: args.realtime,
    };

    let robot = Robot::new(config)?;
    if let Some(auto) = &args.auto {
        if !robot.container().auto_chooser().option_names().contains(auto) {
            warn!("no auto named {auto}; the chooser default will run");
        }
        dashboard::put_string(format!("{AUTO_CHOOSER_KEY}/selected"), auto.clone());
    }

    let mut runner = RobotRunner::new(robot);
    let summary = run_match(&mut runner, &plan).context(CommandSnafu)?;
    info!("match over after {} loops", summary.loops);

    let report = serde_json::to_string_pretty(&summary).context(ReportSnafu)?;
    println!("{report}");

    if let Some(path) = &args.dashboard {
        let table = serde_json::to_string_pretty(&dashboard::snapshot()).context(ReportSnafu)?;
        fs::write(path, table).context(WriteSnafu { path })?;
    }

    log::logger().flush();
    Ok(())
}

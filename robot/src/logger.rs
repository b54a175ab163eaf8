//! Console and file logger for the robot program.
//!
//! Every line carries the robot clock, so simulated runs log simulated time:
//!
//! ```text
//! INFO [2s 140ms] frc_command::robot - entering Autonomous
//! ```

use std::{
    fs::OpenOptions,
    io::{self, BufWriter, Write},
    path::Path,
    sync::{Mutex, OnceLock},
};

use frc_command::clock;
use humantime::format_duration;
use log::{LevelFilter, Metadata, Record};
use snafu::ResultExt;

use crate::error::{LoggerSnafu, RobotError};

type Sink = Box<dyn Write + Send>;

struct RobotLogger {
    /// `None` when no log file was requested, it could not be opened, or a
    /// write to it failed.
    file: Mutex<Option<Sink>>,
}

impl RobotLogger {
    fn new(path: Option<&Path>) -> Self {
        let file = path.and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .ok()
                .map(|file| Box::new(BufWriter::new(file)) as Sink)
        });
        Self {
            file: Mutex::new(file),
        }
    }

    fn has_file(&self) -> bool {
        self.file.lock().map(|file| file.is_some()).unwrap_or(false)
    }

    /// Runs `op` on the log file. The first failure closes the file, with one
    /// warning on the console, and later lines go to the console only.
    fn with_file(&self, op: impl FnOnce(&mut Sink) -> io::Result<()>) {
        let Ok(mut slot) = self.file.lock() else {
            return;
        };
        if let Some(Err(err)) = slot.as_mut().map(op) {
            *slot = None;
            eprintln!("WARN log file write failed, logging to the console only: {err}");
        }
    }
}

impl log::Log for RobotLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "{} [{}] {} - {}\n",
            record.level(),
            format_duration(clock::now()),
            record.target(),
            record.args()
        );

        eprint!("{line}");
        self.with_file(|file| file.write_all(line.as_bytes()));
    }

    fn flush(&self) {
        self.with_file(Write::flush);
    }
}

static LOGGER: OnceLock<RobotLogger> = OnceLock::new();

/// Installs the logger. Lines go to stderr and, when `file` is given, to
/// that file, truncated first.
pub fn init(level: LevelFilter, file: Option<&Path>) -> Result<(), RobotError> {
    let logger = LOGGER.get_or_init(|| RobotLogger::new(file));
    log::set_logger(logger).context(LoggerSnafu)?;
    log::set_max_level(level);

    if let Some(path) = file {
        if !logger.has_file() {
            log::warn!("could not open log file {}; logging to the console only", path.display());
        }
    }
    Ok(())
}

use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use once_cell::sync::OnceCell;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

// Appends timestamped entries to a log file under the app data directory.
// Chat output is the player-facing surface, so nothing is ever printed.
#[derive(Debug)]
struct FileLogger {
    log_path: PathBuf,
}

static LOGGER: OnceCell<FileLogger> = OnceCell::new();

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let log_entry = format!("[{}] {} - {}\n", timestamp, record.level(), record.args());
        let log_file = self.log_path.join("questline.log");

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_file) {
            let _ = file.write_all(log_entry.as_bytes());
        }
    }

    fn flush(&self) {}
}

/// Installs the file logger. `debug_mode` raises the level from Info to Debug.
pub fn init(debug_mode: bool) -> Result<(), SetLoggerError> {
    let log_path = dir::home_dir()
        .expect("Failed to get home directory")
        .join("questline")
        .join("data");

    create_dir_all(&log_path).expect("Could not create log path");

    LOGGER
        .set(FileLogger { log_path })
        .expect("Logger already set");

    let level = if debug_mode {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    log::set_logger(LOGGER.get().unwrap()).map(|()| log::set_max_level(level))
}

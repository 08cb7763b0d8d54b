//! Logger setup.
//!
//! Two sinks behind one [`log::Log`]:
//!
//! | Sink | Level | Format |
//! |---|---|---|
//! | Console (stderr, `env_logger`) | `--log-level` | `[LEVEL] message` |
//! | File `mm_<YYYY-mm-dd_HH-MM-SS>.log` | always debug | timestamp, level, target, message |
//!
//! The file sink is what keeps full error chains out of the console while
//! still recording them.

use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{self, File};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("failed to create log file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("logger already initialized: {0}")]
    AlreadySet(#[from] log::SetLoggerError),
}

/// `mm_2024-03-09_14-05-00.log`
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("mm_{}.log", now.format("%Y-%m-%d_%H-%M-%S"))
}

struct TeeLogger {
    console: env_logger::Logger,
    file: Option<Mutex<LineWriter<File>>>,
}

impl TeeLogger {
    fn write_file(&self, record: &Record) {
        let Some(file) = &self.file else { return };
        if record.level() > Level::Debug {
            return;
        }
        let mut out = file.lock().unwrap_or_else(|e| e.into_inner());
        // Nowhere left to report a failing log write.
        let _ = writeln!(
            out,
            "{} [{:<5}] {}: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        );
    }
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || (self.file.is_some() && metadata.level() <= Level::Debug)
    }

    fn log(&self, record: &Record) {
        self.console.log(record);
        self.write_file(record);
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(file) = &self.file {
            let _ = file.lock().unwrap_or_else(|e| e.into_inner()).flush();
        }
    }
}

fn console_logger(level: LevelFilter) -> env_logger::Logger {
    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .build()
}

fn open_log_file(dir: &Path) -> Result<(File, PathBuf), LogError> {
    let path = dir.join(log_file_name(Local::now()));
    let file = fs::create_dir_all(dir)
        .and_then(|_| File::create(&path))
        .map_err(|source| LogError::File {
            path: path.clone(),
            source,
        })?;
    Ok((file, path))
}

/// Install the global logger. Returns the log file path when one was opened.
pub fn init(console_level: LevelFilter, log_dir: Option<&Path>) -> Result<Option<PathBuf>, LogError> {
    let (file, path) = match log_dir {
        Some(dir) => {
            let (file, path) = open_log_file(dir)?;
            (Some(Mutex::new(LineWriter::new(file))), Some(path))
        }
        None => (None, None),
    };
    let max_level = if file.is_some() {
        console_level.max(LevelFilter::Debug)
    } else {
        console_level
    };
    log::set_boxed_logger(Box::new(TeeLogger {
        console: console_logger(console_level),
        file,
    }))?;
    log::set_max_level(max_level);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record_to(logger: &TeeLogger, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .target("mediamill::process")
                .build(),
        );
    }

    #[test]
    fn file_name_uses_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(log_file_name(at), "mm_2024-03-09_14-05-00.log");
    }

    #[test]
    fn file_sink_records_debug_even_when_console_is_quiet() {
        let tmp = TempDir::new().unwrap();
        let (file, path) = open_log_file(&tmp.path().join("logs")).unwrap();
        let logger = TeeLogger {
            console: console_logger(LevelFilter::Error),
            file: Some(Mutex::new(LineWriter::new(file))),
        };

        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(logger.enabled(&debug));
        record_to(&logger, Level::Debug, "caused by: truncated");
        record_to(&logger, Level::Trace, "noise");
        logger.flush();

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("[DEBUG] mediamill::process: caused by: truncated"));
        assert!(!contents.contains("noise"));
    }

    #[test]
    fn console_only_follows_its_level() {
        let logger = TeeLogger {
            console: console_logger(LevelFilter::Warn),
            file: None,
        };
        assert!(!logger.enabled(&Metadata::builder().level(Level::Info).build()));
        assert!(logger.enabled(&Metadata::builder().level(Level::Error).build()));
    }
}

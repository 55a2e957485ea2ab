use std::io::stderr;
use std::io::Write;

use log::{set_boxed_logger, set_max_level, Level, Log, Metadata, Record, SetLoggerError};

use crate::settings::Logging;

/// Stderr logger with a raw and a json line format, picked from settings.
struct FeedLogger {
    name: String,
    level: Level,
    format: Logging,
}

impl Log for FeedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = match self.format {
            Logging::Raw => format!(
                "{} {:<5} [{}] {}",
                self.name,
                record.level().to_string(),
                record.module_path().unwrap_or_default(),
                record.args()
            ),
            Logging::Json => json!({
                "level": record.level().to_string(),
                "name": self.name,
                "src": {
                    "module_path": record.module_path().unwrap_or_default(),
                    "file": record.file(),
                    "line": record.line()
                },
                "msg": record.args().to_string()
            })
            .to_string(),
        };
        // stderr rather than stdout so rendered rows could one day go to
        // stdout unmixed with operational noise
        let _ = writeln!(&mut stderr(), "{}", line);
    }

    fn flush(&self) {
        let _ = stderr().flush();
    }
}

pub fn init_logger(format: Logging, name: &str, level: Level) -> Result<(), SetLoggerError> {
    set_boxed_logger(Box::new(FeedLogger {
        name: name.to_owned(),
        level,
        format,
    }))?;
    set_max_level(level.to_level_filter());
    Ok(())
}

//! Log setup: env_logger on stdout, every line mirrored into a log file
//! when one is configured.

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use std::fmt::Arguments;
use std::fs::{File, OpenOptions};
use std::io::Write;

struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// The file is truncated, so it holds the current run only
    fn open(path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn write_line(&self, line: &str) {
        let _ = writeln!(self.file.lock(), "{}", line);
    }
}

fn format_line(level: log::Level, target: &str, args: &Arguments) -> String {
    format!(
        "{}:{}:{}: {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        level,
        target,
        args
    )
}

/// Initialise the global logger. `RUST_LOG` filters as usual (default `info`).
pub fn init(log_file: Option<&str>) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.target(env_logger::Target::Stdout);

    let (sink, open_error) = match log_file.map(FileSink::open) {
        Some(Ok(sink)) => (Some(sink), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    builder.format(move |fmt, record| {
        let line = format_line(record.level(), record.target(), record.args());
        if let Some(sink) = &sink {
            sink.write_line(&line);
        }
        writeln!(fmt, "{}", line)
    });
    builder.init();

    match (log_file, open_error) {
        (Some(path), Some(e)) => log::warn!("Logging to stdout only, can't open {}: {}", path, e),
        (Some(path), None) => log::info!("Logging to stdout and {}", path),
        _ => {}
    }
}

// Copyright 2024 Google LLC.
// This project is dual-licensed under Apache 2.0 and MIT terms.
// See LICENSE-APACHE and LICENSE-MIT for details.

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::console::SharedConsole;

impl<T: Send + Write> Log for SharedConsole<T> {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let console = &mut *self.console.lock();
        let _ = writeln!(console, "[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {
        let _ = self.console.lock().flush();
    }
}

/// Initialises the logger with the given shared console.
///
/// # Errors
///
/// Returns an error if a logger has already been installed.
pub fn init(console: &'static impl Log, max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(console)?;
    log::set_max_level(max_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    #[test]
    fn records_are_prefixed_with_level() {
        let console = SharedConsole::new(Vec::new());
        console.log(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("/soc/uart@0 is disabled"))
                .build(),
        );
        console.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("wrote {} bytes", 42))
                .build(),
        );
        let written = String::from_utf8(console.console.lock().clone()).unwrap();
        assert_eq!(written, "[WARN] /soc/uart@0 is disabled\n[INFO] wrote 42 bytes\n");
    }
}

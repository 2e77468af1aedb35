//! Panic reporting for the native binary
//!
//! Panics are logged through `log`, echoed to stderr and appended to
//! `logs/panic.log` so a crash inside the event loop leaves a trace.

use chrono::{DateTime, Local};
use std::backtrace::Backtrace;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic::{self, PanicHookInfo};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

static PANIC_COUNT: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug)]
pub struct PanicReport {
    pub timestamp: DateTime<Local>,
    pub location: String,
    pub message: String,
    pub backtrace: String,
    pub panic_count: usize,
}

impl PanicReport {
    fn from_hook_info(info: &PanicHookInfo) -> Self {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic message".to_string());

        Self {
            timestamp: Local::now(),
            location,
            message,
            backtrace: Backtrace::capture().to_string(),
            panic_count: PANIC_COUNT.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// Log-file block for this panic
    pub fn render(&self) -> String {
        format!(
            "=== PANIC #{} ===\nTimestamp: {}\nLocation: {}\nMessage: {}\nBacktrace:\n{}\n================\n",
            self.panic_count,
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.location,
            self.message,
            self.backtrace
        )
    }

    fn append_to(&self, log_path: &Path) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        file.write_all(self.render().as_bytes())?;
        file.flush()
    }
}

/// Install the hook, writing reports under `log_dir`
pub fn install_panic_handler(log_dir: PathBuf) {
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        log::warn!("[panic_handler] Cannot create {}: {}", log_dir.display(), e);
    }
    let log_path = log_dir.join("panic.log");

    panic::set_hook(Box::new(move |info| {
        let report = PanicReport::from_hook_info(info);
        log::error!(
            "[panic_handler] Panic #{} at {}: {}",
            report.panic_count,
            report.location,
            report.message
        );

        if let Err(e) = report.append_to(&log_path) {
            eprintln!("Failed to write panic log: {}", e);
        }

        eprintln!("torus-countdown panicked at {}: {}", report.location, report.message);
        eprintln!("Log location: {}", log_path.display());
        if std::env::var("RUST_BACKTRACE").is_err() {
            eprintln!("Hint: set RUST_BACKTRACE=1 for a backtrace");
        }
    }));

    log::debug!("[panic_handler] Installed, reports go to {}", log_dir.display());
}

//! Timing scopes and the render debug log.
//!
//! `--perf` prints a `[perf]` line on stderr whenever a [`Scope`] ends.
//! `--render-debug-log PATH` opens a timestamped event log that traces the
//! render pipeline across the UI thread and both worker threads; each line
//! names the thread it came from. Finished scopes are written to the event
//! log too, so render and export durations line up with the events around
//! them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static EVENT_LOG: LazyLock<Mutex<EventLog>> = LazyLock::new(|| Mutex::new(EventLog::closed()));

/// Times the enclosing block. Reports when dropped.
#[derive(Debug)]
#[must_use = "a scope measures until it is dropped"]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Scope {
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        if is_enabled() {
            eprintln!("[perf] {}: {elapsed_ms:.2} ms", self.name);
        }
        log_event("scope", format!("{} took {elapsed_ms:.3} ms", self.name));
    }
}

#[derive(Debug)]
struct EventLog {
    opened_at: Instant,
    writer: Option<BufWriter<File>>,
}

impl EventLog {
    fn closed() -> Self {
        Self {
            opened_at: Instant::now(),
            writer: None,
        }
    }
}

// A panic while holding the lock only ever interrupts a log write, so the
// log stays usable.
fn event_log() -> MutexGuard<'static, EventLog> {
    EVENT_LOG.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// Open the event log at `path`, truncating it, or close it with `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or the header cannot be
/// written.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut log = event_log();
    let Some(path) = path else {
        if let Some(writer) = log.writer.as_mut() {
            writer.flush()?;
        }
        log.writer = None;
        return Ok(());
    };
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "mermedit render debug log start")?;
    writer.flush()?;
    log.opened_at = Instant::now();
    log.writer = Some(writer);
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    event_log().writer.is_some()
}

/// Append `name: detail` to the event log, if one is open.
pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut log = event_log();
    let elapsed_ms = log.opened_at.elapsed().as_secs_f64() * 1000.0;
    let Some(writer) = log.writer.as_mut() else {
        return;
    };
    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("unnamed");
    let _ = writeln!(
        writer,
        "[{elapsed_ms:>10.3} ms] [{thread_name}] {name}: {}",
        detail.as_ref()
    );
    let _ = writer.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_set_enabled_toggles_runtime_flag() {
        set_enabled(true);
        assert!(is_enabled());

        set_enabled(false);
        assert!(!is_enabled());
    }

    #[test]
    fn test_scope_measures_elapsed_time() {
        let scope = scope("test.scope");
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(scope.elapsed_ms() >= 1.0);
    }

    #[test]
    fn test_event_log_records_events_and_scopes_with_thread() {
        let temp_file = NamedTempFile::new().unwrap();
        set_debug_log_path(Some(temp_file.path())).unwrap();
        assert!(is_debug_log_enabled());
        std::thread::Builder::new()
            .name("mermedit-preview".into())
            .spawn(|| {
                log_event("pipeline.schedule", "seq=1 theme=dark");
                drop(scope("pipeline.render"));
            })
            .unwrap()
            .join()
            .unwrap();
        set_debug_log_path(None).unwrap();
        assert!(!is_debug_log_enabled());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.starts_with("mermedit render debug log start"));
        assert!(content.contains("[mermedit-preview] pipeline.schedule: seq=1 theme=dark"));
        assert!(content.contains("scope: pipeline.render took"));
    }
}

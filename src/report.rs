//! Progress and warning reporting.
//!
//! Every pipeline stage reports through a [`Reporter`] instead of writing to
//! the terminal directly. The CLI uses [`TerminalReporter`], which forwards to
//! the `log!` logger; tests use [`MemoryReporter`] and assert on the recorded
//! events.

use parking_lot::Mutex;

/// Severity of a reported event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Stage transitions and general progress.
    Info,
    /// A single asset or stage finished successfully.
    Success,
    /// A stage or category was skipped by configuration.
    Skip,
    /// Recoverable per-asset failure.
    Warn,
    /// Fatal failure, reported right before the error propagates.
    Error,
}

/// A single reported event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub module: &'static str,
    pub level: Level,
    pub message: String,
}

/// Sink for pipeline progress, warnings and errors.
pub trait Reporter {
    fn report(&self, module: &'static str, level: Level, message: &str);

    fn info(&self, module: &'static str, message: &str) {
        self.report(module, Level::Info, message);
    }

    fn success(&self, module: &'static str, message: &str) {
        self.report(module, Level::Success, message);
    }

    fn skip(&self, module: &'static str, message: &str) {
        self.report(module, Level::Skip, message);
    }

    fn warn(&self, module: &'static str, message: &str) {
        self.report(module, Level::Warn, message);
    }

    fn error(&self, module: &'static str, message: &str) {
        self.report(module, Level::Error, message);
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Reporter that prints through the colored terminal logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalReporter;

impl Reporter for TerminalReporter {
    fn report(&self, module: &'static str, level: Level, message: &str) {
        match level {
            Level::Info => crate::log!(module; "{}", message),
            Level::Success => crate::log!(module; "✓ {}", message),
            Level::Skip => crate::log!("skip"; "{}", message),
            Level::Warn => crate::log!("warn"; "{}: {}", module, message),
            Level::Error => crate::log!("error"; "{}: {}", module, message),
        }
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Reporter that records every event, in order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<Event>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Messages recorded at the given level.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.level == level)
            .map(|event| event.message.clone())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(Level::Warn)
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, module: &'static str, level: Level, message: &str) {
        self.events.lock().push(Event {
            module,
            level,
            message: message.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_keeps_order() {
        let reporter = MemoryReporter::new();
        reporter.info("bundle", "starting");
        reporter.warn("inline", "missing ./a.js");
        reporter.success("inline", "./b.js");

        let events = reporter.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].level, Level::Info);
        assert_eq!(events[1].module, "inline");
        assert_eq!(reporter.warnings(), vec!["missing ./a.js".to_string()]);
    }

    #[test]
    fn test_messages_filters_by_level() {
        let reporter = MemoryReporter::new();
        reporter.skip("inline", "images");
        reporter.skip("critical", "disabled");
        reporter.error("bundle", "boom");

        assert_eq!(reporter.messages(Level::Skip).len(), 2);
        assert_eq!(reporter.messages(Level::Error), vec!["boom".to_string()]);
        assert!(reporter.warnings().is_empty());
    }
}

//! Build progress reporting.
//!
//! Every skip and failure is reported as one line carrying a status glyph and
//! the target name. The artifact summary is printed once per run.
//!
//! # Example
//!
//! ```ignore
//! use forge_assets::build::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::TaskStarted { task: "nuke".into(), detail: "dist/".into() });
//! reporter.report(ProgressEvent::TaskCompleted { message: "done".into() });
//! ```

use owo_colors::OwoColorize;
use std::io::Write;
use std::sync::Mutex;

use crate::build::{HookStage, SkipReason};

/// Events that can be reported during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A task (compile, copy, nuke, watch, ...) started
    TaskStarted {
        task: String,
        /// Targets or path the task acts on
        detail: String,
    },
    /// A task finished successfully
    TaskCompleted { message: String },
    /// A target was skipped
    TargetSkipped { target: String, reason: SkipReason },
    /// An entry of a target failed to compile
    TargetFailed { target: String, message: String },
    /// A lifecycle hook failed
    HookFailed { target: String, stage: HookStage, message: String },
    /// Rendered artifact table for the run
    Summary { table: String },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    /// Output writer (for testing)
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress").field("use_colors", &self.use_colors).finish()
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleProgress {
    /// Reporter on stdout; colors when stdout is a terminal.
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
            output: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { use_colors: false, output: Mutex::new(Box::new(output)) }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn paint(&self, text: &str, style: Tone) -> String {
        if !self.use_colors {
            return text.to_string();
        }
        match style {
            Tone::Ok => text.green().bold().to_string(),
            Tone::Warn => text.yellow().bold().to_string(),
            Tone::Bad => text.red().bold().to_string(),
            Tone::Name => text.magenta().bold().to_string(),
            Tone::Header => text.blue().to_string(),
            Tone::Path => text.cyan().to_string(),
        }
    }

    /// Format an event as text; `None` for events with no console output.
    pub fn format_event(&self, event: &ProgressEvent) -> Option<String> {
        let line = match event {
            ProgressEvent::TaskStarted { task, detail } => {
                format!("\n{} {} {}", self.paint("#", Tone::Header), task, self.paint(detail, Tone::Path))
            }
            ProgressEvent::TaskCompleted { message } => {
                format!("  {} {}", self.paint("✓", Tone::Ok), message)
            }
            ProgressEvent::TargetSkipped { target, reason } => {
                let (glyph, tone) = match reason {
                    SkipReason::Disabled | SkipReason::NoEntries => ("~ skip", Tone::Warn),
                    SkipReason::MissingConfig | SkipReason::InvalidConfig(_) => ("✕ skip", Tone::Bad),
                };
                format!(
                    "  {} {} {}",
                    self.paint(glyph, tone),
                    self.paint(target, Tone::Name),
                    self.paint(&format!("({})", reason), tone)
                )
            }
            ProgressEvent::TargetFailed { target, message } => {
                format!("  {} {} {}", self.paint("✕ error", Tone::Bad), self.paint(target, Tone::Name), message)
            }
            ProgressEvent::HookFailed { target, stage, message } => format!(
                "  {} {} {}",
                self.paint(&format!("✕ {} hook", stage), Tone::Bad),
                self.paint(target, Tone::Name),
                message
            ),
            ProgressEvent::Summary { table } => {
                if table.is_empty() {
                    return None;
                }
                table.clone()
            }
        };
        Some(line)
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Ok,
    Warn,
    Bad,
    Name,
    Header,
    Path,
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        let Some(line) = self.format_event(&event) else {
            return;
        };
        if let Ok(mut out) = self.output.lock() {
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Test writer for capturing output.
    #[derive(Clone, Default)]
    struct TestWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl TestWriter {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_skip_lines() {
        let out = TestWriter::default();
        let progress = ConsoleProgress::with_output(out.clone());

        progress.report(ProgressEvent::TargetSkipped {
            target: "svg".into(),
            reason: SkipReason::Disabled,
        });
        progress.report(ProgressEvent::TargetSkipped {
            target: "js".into(),
            reason: SkipReason::MissingConfig,
        });

        let text = out.text();
        assert!(text.contains("~ skip svg (falsy config)"));
        assert!(text.contains("✕ skip js (missing config)"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_failure_lines() {
        let out = TestWriter::default();
        let progress = ConsoleProgress::with_output(out.clone());

        progress.report(ProgressEvent::TargetFailed { target: "css".into(), message: "bad".into() });
        progress.report(ProgressEvent::HookFailed {
            target: "css".into(),
            stage: HookStage::Before,
            message: "exit 1".into(),
        });

        let text = out.text();
        assert!(text.contains("✕ error css bad"));
        assert!(text.contains("✕ before hook css exit 1"));
    }

    #[test]
    fn test_empty_summary_prints_nothing() {
        let out = TestWriter::default();
        let progress = ConsoleProgress::with_output(out.clone());
        progress.report(ProgressEvent::Summary { table: String::new() });
        assert!(out.text().is_empty());
    }

    #[test]
    fn test_colors_wrap_glyphs() {
        let progress = ConsoleProgress::with_output(Vec::new()).with_colors(true);
        let line = progress
            .format_event(&ProgressEvent::TaskCompleted { message: "done".into() })
            .unwrap();
        assert!(line.contains("\x1b["));
        assert!(line.ends_with("done"));
    }

    #[test]
    fn test_null_progress() {
        NullProgress::new().report(ProgressEvent::TaskCompleted { message: "x".into() });
    }
}

//! Progress reporting
//!
//! The pipeline reports step transitions through a callback trait so the
//! CLI can show a spinner while library embedders and tests stay silent.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Callback for pipeline step progress.
pub trait ProgressCallback {
    fn on_step_start(&self, message: &str);
    fn on_step_complete(&self, step: &str, detail: &str);
    fn on_debug(&self, message: &str);
}

/// Console progress with an indicatif spinner.
pub struct ConsoleProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn clear_spinner(&self) {
        if let Ok(mut guard) = self.spinner.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_step_start(&self, message: &str) {
        self.clear_spinner();
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut guard) = self.spinner.lock() {
            *guard = Some(bar);
        }
    }

    fn on_step_complete(&self, step: &str, detail: &str) {
        self.clear_spinner();
        eprintln!("{}: {}", step, detail);
    }

    fn on_debug(&self, message: &str) {
        log::debug!("{}", message);
    }
}

/// No-op progress for tests and embedders.
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_step_start(&self, _message: &str) {}
    fn on_step_complete(&self, _step: &str, _detail: &str) {}
    fn on_debug(&self, message: &str) {
        log::debug!("{}", message);
    }
}

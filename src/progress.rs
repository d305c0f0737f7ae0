//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// One spinner per pipeline stage (loading, validation, comparison, export)
#[derive(Debug)]
pub struct StageReporter {
    current: Option<ProgressBar>,
    show_progress: bool,
    start_time: Instant,
}

impl StageReporter {
    pub fn new(show_progress: bool) -> Self {
        Self {
            current: None,
            show_progress,
            start_time: Instant::now(),
        }
    }

    /// Reporter that never draws anything
    pub fn new_minimal() -> Self {
        Self::new(false)
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Begin a stage, clearing any stage left unfinished
    pub fn start(&mut self, message: &str) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
        if self.show_progress {
            self.current = Some(create_spinner(message));
        }
    }

    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Leave the stage without a completion line, e.g. when it failed
    pub fn abandon(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Drop for StageReporter {
    fn drop(&mut self) {
        self.abandon();
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

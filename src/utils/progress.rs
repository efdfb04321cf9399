/// Progress feedback while walking through the log files.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, message: &str, total: u64);
    fn advance(&self, current_file: &str);
    fn finish(&self, message: &str);
}

/// Reports nothing. Used by tests and non-interactive builds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _message: &str, _total: u64) {}
    fn advance(&self, _current_file: &str) {}
    fn finish(&self, _message: &str) {}
}

#[cfg(feature = "cli")]
pub use cli_progress::CliProgress;

#[cfg(feature = "cli")]
mod cli_progress {
    use super::ProgressReporter;
    use indicatif::{ProgressBar, ProgressStyle};
    use std::sync::Mutex;

    pub struct CliProgress {
        bar: Mutex<Option<ProgressBar>>,
    }

    impl CliProgress {
        pub fn new() -> Self {
            Self {
                bar: Mutex::new(None),
            }
        }

        fn create_file_bar(total: u64) -> ProgressBar {
            let pb = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            {
                pb.set_style(style.progress_chars("█▓░"));
            }
            pb
        }
    }

    impl Default for CliProgress {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ProgressReporter for CliProgress {
        fn start(&self, message: &str, total: u64) {
            let pb = Self::create_file_bar(total);
            pb.set_message(message.to_string());
            if let Ok(mut guard) = self.bar.lock() {
                *guard = Some(pb);
            }
        }

        fn advance(&self, current_file: &str) {
            if let Ok(guard) = self.bar.lock() {
                if let Some(ref pb) = *guard {
                    pb.set_message(current_file.to_string());
                    pb.inc(1);
                }
            }
        }

        fn finish(&self, message: &str) {
            if let Ok(mut guard) = self.bar.lock() {
                if let Some(pb) = guard.take() {
                    pb.finish_with_message(message.to_string());
                }
            }
        }
    }
}

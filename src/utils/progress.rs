use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar over a known number of files; inert when silent
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(total: u64, message: &str, silent: bool) -> Self {
        if silent {
            return Self { progress_bar: None };
        }

        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            progress_bar: Some(pb),
        }
    }

    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    pub fn finish_and_clear(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(reporter: &ProgressReporter) -> Option<u64> {
        reporter.progress_bar.as_ref().map(ProgressBar::position)
    }

    #[test]
    fn test_silent_reporter_is_inert() {
        let reporter = ProgressReporter::new(10, "files", true);
        reporter.increment(3);
        reporter.set_message("still silent");
        reporter.finish_and_clear();
        assert_eq!(position(&reporter), None);
    }

    #[test]
    fn test_visible_reporter_counts() {
        let reporter = ProgressReporter::new(10, "files", false);
        reporter.increment(3);
        reporter.increment(1);
        assert_eq!(position(&reporter), Some(4));
        reporter.finish_and_clear();
    }
}

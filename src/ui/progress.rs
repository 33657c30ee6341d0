use crate::pipeline::{InputOutcome, InputStatus};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    pub fn create_input_progress(&self, total_inputs: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new(total_inputs));
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>4}/{len:4} archives {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message("Starting...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new(true)
    }
}

pub fn update_input_progress(pb: &ProgressBar, outcome: &InputOutcome) {
    pb.inc(1);

    let message = match outcome.status {
        InputStatus::Done => format!("{} ({} files)", outcome.input, outcome.files_found),
        InputStatus::ExtractFailed => format!("{} (failed)", outcome.input),
        InputStatus::Cancelled => format!("{} (skipped)", outcome.input),
        InputStatus::Pending => outcome.input.clone(),
    };
    pb.set_message(message);
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::InputUnit;

    #[test]
    fn test_progress_manager_creation() {
        assert!(ProgressManager::new(true).enabled);
        assert!(!ProgressManager::new(false).enabled);
    }

    #[test]
    fn test_disabled_progress_bar_is_hidden() {
        let manager = ProgressManager::new(false);
        assert!(manager.create_input_progress(3).is_hidden());
    }

    #[test]
    fn test_update_input_progress() {
        let pb = ProgressBar::hidden();
        pb.set_length(2);

        let mut outcome = InputOutcome::new(&InputUnit::from_path("/in/lib.jar"));
        outcome.status = InputStatus::Done;
        outcome.files_found = 7;
        update_input_progress(&pb, &outcome);

        assert_eq!(pb.position(), 1);
        assert_eq!(pb.message(), "lib.jar (7 files)");

        outcome.mark_failed("boom".to_string());
        update_input_progress(&pb, &outcome);
        assert_eq!(pb.position(), 2);
        assert_eq!(pb.message(), "lib.jar (failed)");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "61m 1s");
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
    }
}

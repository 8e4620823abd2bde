//! Terminal progress reporting.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::search::{Progress, ProgressSink};

/// Renders search events as an indicatif bar, printing periodic samples above it.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// `total` is the whole search space; `None` or anything beyond `u64`
    /// falls back to a spinner.
    pub fn new(total: Option<u128>) -> Self {
        let bar = match total.and_then(|t| u64::try_from(t).ok()) {
            Some(total) => {
                let bar = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::with_template(
                    "{spinner:.green} {percent:>3}% [{wide_bar:.cyan/blue}] {pos}/{len} ({eta} remaining)",
                ) {
                    bar.set_style(style);
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {pos} tried {msg}") {
                    bar.set_style(style);
                }
                bar
            }
        };
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for ProgressReporter {
    fn length_started(&self, length: usize, total: Option<u128>) {
        self.bar.suspend(|| match total {
            Some(total) => info!("Trying {total} candidates of length {length}"),
            None => info!("Trying candidates of length {length}"),
        });
        self.bar.set_message(format!("(length {length})"));
    }

    fn batch_completed(&self, attempts: u64) {
        self.bar.set_position(attempts);
    }

    fn progress(&self, observation: &Progress) {
        self.bar
            .println(format!("{}: {}", observation.attempts, observation.last_candidate));
    }
}

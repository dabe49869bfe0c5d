//! Progress-bar observer for interactive runs.

use cadence_engine::{ProgressEvent, RecordingObserver, RunObserver, RunSummary};
use indicatif::{ProgressBar, ProgressStyle};

/// Drives an indicatif bar from engine events while recording them for
/// report building.
pub struct CliObserver {
    bar: ProgressBar,
    inner: RecordingObserver,
}

impl CliObserver {
    /// A fresh observer with a 0..100 progress bar.
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self {
            bar,
            inner: RecordingObserver::default(),
        }
    }

    /// Finish the bar once the run is over.
    pub fn finish(&self) {
        self.bar.finish_with_message("Complete");
    }

    /// The recorded events, in delivery order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.inner.events.clone()
    }
}

impl RunObserver for CliObserver {
    fn on_progress(&mut self, event: ProgressEvent) {
        self.bar.set_position(event.progress as u64);
        self.bar
            .set_message(format!("{} (size {})", event.path.join("/"), event.data_size));
        self.inner.on_progress(event);
    }

    fn on_complete(&mut self, summary: &RunSummary) {
        self.inner.on_complete(summary);
    }
}

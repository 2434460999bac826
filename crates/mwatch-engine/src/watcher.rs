//! Sample polling with deduplication.

use mwatch_core::Sample;
use tracing::trace;

use crate::collaborator::{Collaborator, CollaboratorResult};

/// Reads the current multiplier and reports it only when it changed.
///
/// Novelty is decided on the raw text, not the parsed value: unparseable
/// text still counts as a new event. Blank text means the page has nothing
/// rendered yet and is skipped without touching the last-seen text.
#[derive(Debug, Default)]
pub struct ResultWatcher {
    last_raw: Option<String>,
}

impl ResultWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from the collaborator and return the sample if it is novel.
    pub async fn poll(
        &mut self,
        collaborator: &dyn Collaborator,
    ) -> CollaboratorResult<Option<Sample>> {
        let raw = collaborator.read_sample_text().await?;
        Ok(self.observe(raw))
    }

    /// Dedup step, separated from I/O.
    pub fn observe(&mut self, raw: String) -> Option<Sample> {
        if raw.trim().is_empty() {
            trace!("Blank sample text, skipping");
            return None;
        }
        if self.last_raw.as_deref() == Some(raw.as_str()) {
            return None;
        }

        let sample = Sample::parse(raw.clone());
        self.last_raw = Some(raw);
        Some(sample)
    }

    pub fn last_raw(&self) -> Option<&str> {
        self.last_raw.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::MockCollaborator;

    #[test]
    fn test_duplicate_text_yields_one_sample() {
        let mut watcher = ResultWatcher::new();
        assert!(watcher.observe("2.5x".to_string()).is_some());
        assert!(watcher.observe("2.5x".to_string()).is_none());
    }

    #[test]
    fn test_equality_on_raw_text_not_value() {
        let mut watcher = ResultWatcher::new();
        assert!(watcher.observe("2.5x".to_string()).is_some());
        // Same value, different text: still novel.
        let sample = watcher.observe("2.50x".to_string()).unwrap();
        assert_eq!(sample.value, 2.5);
    }

    #[test]
    fn test_unparseable_text_is_novel_with_zero_value() {
        let mut watcher = ResultWatcher::new();
        let sample = watcher.observe("FLEW AWAY".to_string()).unwrap();
        assert_eq!(sample.value, 0.0);
        assert!(watcher.observe("FLEW AWAY".to_string()).is_none());
    }

    #[test]
    fn test_blank_text_skipped() {
        let mut watcher = ResultWatcher::new();
        assert!(watcher.observe("1.1x".to_string()).is_some());
        assert!(watcher.observe("  ".to_string()).is_none());
        assert_eq!(watcher.last_raw(), Some("1.1x"));
        // The blank read does not reset dedup.
        assert!(watcher.observe("1.1x".to_string()).is_none());
    }

    #[test]
    fn test_value_recurring_after_change_is_novel() {
        let mut watcher = ResultWatcher::new();
        assert!(watcher.observe("3x".to_string()).is_some());
        assert!(watcher.observe("4x".to_string()).is_some());
        assert!(watcher.observe("3x".to_string()).is_some());
    }

    #[tokio::test]
    async fn test_poll_through_collaborator() {
        let mock = MockCollaborator::with_samples(["120x", "200x", "200x"]);
        let mut watcher = ResultWatcher::new();

        let mut novel = Vec::new();
        for _ in 0..3 {
            if let Some(sample) = watcher.poll(&mock).await.unwrap() {
                novel.push(sample.raw);
            }
        }
        assert_eq!(novel, vec!["120x".to_string(), "200x".to_string()]);
    }
}

//! Screenshot-on-failure capture.
//!
//! Capture is diagnostic only: a failing screenshot must never mask the error
//! that triggered it, so every capture problem is logged and swallowed.

use crate::report::{Attachment, StepSink};
use crate::session::Session;

/// Take a screenshot and attach it under the given label.
///
/// Called once per failing operation, with the label naming the locator or
/// operation that failed. Any capture error is downgraded to a warning.
pub fn capture_failure<S: Session + ?Sized>(session: &S, sink: &dyn StepSink, label: &str) {
    match session.screenshot() {
        Ok(payload) => sink.attach(Attachment::png(label, payload)),
        Err(error) => {
            tracing::warn!(label, %error, "failure screenshot could not be captured");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::report::MemorySink;
    use crate::session::MockSession;

    #[test]
    fn test_capture_attaches_labeled_png() {
        let session = MockSession::new();
        let sink = MemorySink::new();
        capture_failure(&session, &sink, "tickets_not_found");
        assert_eq!(sink.attachment_labels(), vec!["tickets_not_found"]);
    }

    #[test]
    fn test_capture_error_is_swallowed() {
        let session = MockSession::new();
        session.fail_screenshots();
        let sink = MemorySink::new();
        capture_failure(&session, &sink, "error");
        assert_eq!(sink.attachment_count(), 0);
    }
}

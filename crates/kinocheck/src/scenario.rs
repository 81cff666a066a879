//! Scenario runner: named pipelines that stop at the first failing step.
//!
//! A scenario is an ordered composition of page operations. There is no
//! partial success and no whole-scenario retry: the first failure aborts the
//! pipeline, one screenshot labeled `error` is captured, and the failure
//! propagates unchanged. The session stays open; its lifecycle belongs to the
//! caller.

use crate::capture::capture_failure;
use crate::report::StepSink;
use crate::result::KinocheckResult;
use crate::session::Session;

/// Run a named scenario pipeline.
///
/// # Errors
///
/// Propagates the first step failure unchanged, after capturing the `error`
/// screenshot.
pub fn run<S, T, F>(
    name: &str,
    session: &S,
    sink: &dyn StepSink,
    pipeline: F,
) -> KinocheckResult<T>
where
    S: Session + ?Sized,
    F: FnOnce() -> KinocheckResult<T>,
{
    let span = tracing::info_span!("scenario", name);
    let _guard = span.enter();
    sink.step(&format!("scenario {name}"));
    tracing::info!("scenario started");

    match pipeline() {
        Ok(value) => {
            sink.step(&format!("scenario {name} completed"));
            tracing::info!("scenario completed");
            Ok(value)
        }
        Err(error) => {
            tracing::error!(%error, "scenario aborted");
            capture_failure(session, sink, "error");
            Err(error)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::report::MemorySink;
    use crate::result::KinocheckError;
    use crate::session::MockSession;

    #[test]
    fn test_success_reports_completion_without_artifacts() {
        let session = MockSession::new();
        let sink = MemorySink::new();

        let value = run("navigation", &session, &sink, || Ok(7)).unwrap();
        assert_eq!(value, 7);
        assert!(sink.has_step("scenario navigation completed"));
        assert_eq!(sink.attachment_count(), 0);
    }

    #[test]
    fn test_failure_aborts_later_steps() {
        let session = MockSession::new();
        let sink = MemorySink::new();
        let mut reached_after_failure = false;

        let result: KinocheckResult<()> = run("navigation", &session, &sink, || {
            Err(KinocheckError::NavigationTargetNotFound {
                operation: "tickets".to_string(),
            })?;
            reached_after_failure = true;
            Ok(())
        });

        assert!(result.is_err());
        assert!(!reached_after_failure);
    }

    #[test]
    fn test_failure_captures_error_screenshot_and_propagates_unchanged() {
        let session = MockSession::new();
        let sink = MemorySink::new();

        let result: KinocheckResult<()> = run("navigation", &session, &sink, || {
            Err(KinocheckError::PageLoadTimeout { ms: 500 })
        });

        match result {
            Err(KinocheckError::PageLoadTimeout { ms }) => assert_eq!(ms, 500),
            other => panic!("expected PageLoadTimeout, got {other:?}"),
        }
        assert_eq!(sink.attachment_labels(), vec!["error"]);
    }

    #[test]
    fn test_session_stays_usable_after_failure() {
        let session = MockSession::new();
        let sink = MemorySink::new();

        let _: KinocheckResult<()> = run("navigation", &session, &sink, || {
            Err(KinocheckError::Timeout { ms: 1 })
        });

        // The runner never closes the session
        assert!(!session.was_called("close_window"));
        assert!(session.navigate("https://www.kinopoisk.ru/").is_ok());
    }
}

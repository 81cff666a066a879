//! Action primitives: the vocabulary every page operation is built from.
//!
//! [`Actions`] binds a borrowed session, a wait policy and a step sink. Each
//! failable primitive polls within the policy's bounded window and, on the
//! terminal failure, captures exactly one labeled screenshot before the error
//! propagates. Probing helpers (`probe`, `try_click`) exist for fallback
//! chains that must not capture per alternative.

use std::fmt;
use std::time::Instant;

use crate::capture::capture_failure;
use crate::locator::Locator;
use crate::report::StepSink;
use crate::result::{KinocheckError, KinocheckResult};
use crate::session::{ElementHandle, Session, READY_STATE_SCRIPT};
use crate::wait::{self, WaitPolicy};

/// Action primitives bound to a session, policy and sink
pub struct Actions<'a, S: Session + ?Sized> {
    session: &'a S,
    sink: &'a dyn StepSink,
    policy: WaitPolicy,
}

impl<S: Session + ?Sized> fmt::Debug for Actions<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actions")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<'a, S: Session + ?Sized> Actions<'a, S> {
    /// Bind a session and sink with the default wait policy
    #[must_use]
    pub fn new(session: &'a S, sink: &'a dyn StepSink) -> Self {
        Self {
            session,
            sink,
            policy: WaitPolicy::default(),
        }
    }

    /// Override the wait policy
    #[must_use]
    pub const fn with_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The bound session
    #[must_use]
    pub const fn session(&self) -> &'a S {
        self.session
    }

    /// The bound sink
    #[must_use]
    pub const fn sink(&self) -> &'a dyn StepSink {
        self.sink
    }

    /// The bound wait policy
    #[must_use]
    pub const fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// All current matches, in document order. No wait, empty is not an error.
    pub fn find_all(&self, locator: &Locator) -> KinocheckResult<Vec<ElementHandle>> {
        self.session.find_elements(locator)
    }

    /// Poll for the first match without capturing on expiry.
    ///
    /// Used by fallback chains that probe several alternatives before deciding
    /// the operation failed. Session-level errors are swallowed here too; the
    /// chain reports one terminal failure for the whole operation.
    #[must_use]
    pub fn probe(&self, locator: &Locator, timeout_ms: u64) -> Option<ElementHandle> {
        self.poll_first(locator, timeout_ms).ok()
    }

    fn poll_first(&self, locator: &Locator, timeout_ms: u64) -> KinocheckResult<ElementHandle> {
        let policy = self.policy.with_timeout(timeout_ms);
        let start = Instant::now();
        loop {
            if let Some(element) = self.session.find_elements(locator)?.into_iter().next() {
                return Ok(element);
            }
            if start.elapsed() >= policy.timeout() {
                return Err(KinocheckError::ElementNotFound {
                    locator: locator.to_string(),
                    timeout_ms,
                });
            }
            std::thread::sleep(policy.poll_interval());
        }
    }

    /// Wait for the first element matching the locator.
    ///
    /// # Errors
    ///
    /// [`KinocheckError::ElementNotFound`] when nothing matched within the
    /// policy timeout; session-level failures propagate immediately instead of
    /// burning the timeout. One screenshot is captured before either error.
    pub fn find(&self, locator: &Locator) -> KinocheckResult<ElementHandle> {
        self.find_within(locator, self.policy.timeout_ms)
    }

    /// [`Actions::find`] with a per-call timeout
    pub fn find_within(&self, locator: &Locator, timeout_ms: u64) -> KinocheckResult<ElementHandle> {
        self.sink.step(&format!("find {locator}"));
        tracing::debug!(%locator, timeout_ms, "find");
        self.poll_first(locator, timeout_ms).map_err(|error| {
            capture_failure(self.session, self.sink, &format!("find failed {locator}"));
            error
        })
    }

    /// Wait for a clickable match and click it, without capturing on expiry.
    ///
    /// # Errors
    ///
    /// [`KinocheckError::ElementNotFound`] when nothing ever matched,
    /// [`KinocheckError::ElementNotInteractable`] when matches existed but none
    /// became displayed and enabled within the timeout.
    pub fn try_click(&self, locator: &Locator, timeout_ms: u64) -> KinocheckResult<ElementHandle> {
        let policy = self.policy.with_timeout(timeout_ms);
        let start = Instant::now();
        let mut saw_match = false;
        loop {
            let found = self.session.find_elements(locator)?;
            saw_match = saw_match || !found.is_empty();
            if let Some(element) = found.into_iter().find(ElementHandle::is_interactable) {
                self.session.click_element(&element)?;
                wait::settle(&self.policy);
                return Ok(element);
            }
            if start.elapsed() >= policy.timeout() {
                return Err(if saw_match {
                    KinocheckError::ElementNotInteractable {
                        locator: locator.to_string(),
                        timeout_ms,
                    }
                } else {
                    KinocheckError::ElementNotFound {
                        locator: locator.to_string(),
                        timeout_ms,
                    }
                });
            }
            std::thread::sleep(policy.poll_interval());
        }
    }

    /// Wait for a clickable match and click it.
    ///
    /// # Errors
    ///
    /// As [`Actions::try_click`]; one screenshot is captured before the error
    /// propagates.
    pub fn click(&self, locator: &Locator) -> KinocheckResult<ElementHandle> {
        self.click_within(locator, self.policy.timeout_ms)
    }

    /// [`Actions::click`] with a per-call timeout
    pub fn click_within(&self, locator: &Locator, timeout_ms: u64) -> KinocheckResult<ElementHandle> {
        self.sink.step(&format!("click {locator}"));
        tracing::debug!(%locator, timeout_ms, "click");
        self.try_click(locator, timeout_ms).map_err(|error| {
            capture_failure(self.session, self.sink, &format!("click failed {locator}"));
            error
        })
    }

    /// Click an already-located element and settle
    pub fn click_handle(&self, element: &ElementHandle) -> KinocheckResult<()> {
        self.session.click_element(element)?;
        wait::settle(&self.policy);
        Ok(())
    }

    /// Find an input, clear it, and type the text verbatim
    pub fn type_text(&self, locator: &Locator, text: &str) -> KinocheckResult<ElementHandle> {
        self.sink.step(&format!("type into {locator}"));
        tracing::debug!(%locator, "type_text");
        let element = self.find(locator)?;
        self.session.clear_element(&element)?;
        self.session.type_into(&element, text)?;
        Ok(element)
    }

    /// Find an element and send the Enter key to it
    pub fn submit_with_enter(&self, locator: &Locator) -> KinocheckResult<ElementHandle> {
        self.sink.step(&format!("submit {locator}"));
        let element = self.find(locator)?;
        self.session.send_enter(&element)?;
        wait::settle(&self.policy);
        Ok(element)
    }

    /// Scroll to the bottom of the document
    pub fn scroll_to_bottom(&self) -> KinocheckResult<()> {
        self.sink.step("scroll to bottom");
        self.session
            .execute_script("window.scrollTo(0, document.body.scrollHeight);")?;
        wait::settle_brief(&self.policy);
        Ok(())
    }

    /// Scroll to the top of the document
    pub fn scroll_to_top(&self) -> KinocheckResult<()> {
        self.sink.step("scroll to top");
        self.session.execute_script("window.scrollTo(0, 0);")?;
        wait::settle_brief(&self.policy);
        Ok(())
    }

    /// Scroll vertically by a pixel offset
    pub fn scroll_by(&self, pixels: i64) -> KinocheckResult<()> {
        self.sink.step(&format!("scroll by {pixels}"));
        self.session
            .execute_script(&format!("window.scrollBy(0, {pixels});"))?;
        wait::settle_brief(&self.policy);
        Ok(())
    }

    /// Poll until `document.readyState` is `complete`.
    ///
    /// # Errors
    ///
    /// [`KinocheckError::PageLoadTimeout`] on expiry; one screenshot is
    /// captured first.
    pub fn wait_for_load_complete(&self) -> KinocheckResult<()> {
        self.wait_for_load_complete_within(self.policy.timeout_ms)
    }

    /// [`Actions::wait_for_load_complete`] with a per-call timeout
    pub fn wait_for_load_complete_within(&self, timeout_ms: u64) -> KinocheckResult<()> {
        self.sink.step("wait for page load");
        let policy = self.policy.with_timeout(timeout_ms);
        wait::wait_until(
            || {
                self.session
                    .execute_script(READY_STATE_SCRIPT)
                    .map(|value| value.as_str() == Some("complete"))
                    .unwrap_or(false)
            },
            &policy,
        )
        .map(|_| ())
        .map_err(|_| {
            capture_failure(self.session, self.sink, "page_load_timeout");
            KinocheckError::PageLoadTimeout { ms: timeout_ms }
        })
    }

    /// Switch focus to the most recently opened window
    pub fn switch_to_latest_tab(&self) -> KinocheckResult<()> {
        self.sink.step("switch to latest tab");
        let handles = self.session.window_handles()?;
        match handles.last() {
            Some(handle) => self.session.switch_to_window(handle),
            None => Err(KinocheckError::SessionError {
                message: "no open windows".to_string(),
            }),
        }
    }

    /// Close the focused window and return focus to the first remaining one
    pub fn close_current_tab(&self) -> KinocheckResult<()> {
        self.sink.step("close current tab");
        self.session.close_window()?;
        let handles = self.session.window_handles()?;
        match handles.first() {
            Some(handle) => self.session.switch_to_window(handle),
            None => Ok(()),
        }
    }

    /// Capture a labeled diagnostic screenshot. Never fails the caller.
    pub fn screenshot(&self, label: &str) {
        self.sink.step(&format!("screenshot {label}"));
        capture_failure(self.session, self.sink, label);
    }
}

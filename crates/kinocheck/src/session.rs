//! Session boundary: the synchronous browser contract and a scripted mock.
//!
//! The core never creates or closes a real session; fixtures own the lifecycle
//! and hand the core a `&dyn Session`. Everything above this trait is
//! browser-agnostic and unit-testable against [`MockSession`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::locator::Locator;
use crate::result::KinocheckResult;

/// A located element as seen across the session boundary.
///
/// Lookups return handles or fail; there is no null placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Session-scoped element id
    pub id: String,
    /// Lower-case tag name
    pub tag_name: String,
    /// Visible text content, if any
    pub text: Option<String>,
    /// Whether the element is rendered with a visible box
    pub displayed: bool,
    /// Whether the element accepts interaction
    pub enabled: bool,
}

impl ElementHandle {
    /// Create a displayed, enabled handle with a fresh id
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tag_name: tag_name.into(),
            text: None,
            displayed: true,
            enabled: true,
        }
    }

    /// Set the visible text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_displayed(mut self, displayed: bool) -> Self {
        self.displayed = displayed;
        self
    }

    /// Set enabled state
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Displayed and enabled
    #[must_use]
    pub fn is_interactable(&self) -> bool {
        self.displayed && self.enabled
    }
}

/// Synchronous browser session contract.
///
/// Every call blocks until the browser answered. Finding zero elements is not
/// an error; `find_elements` returns an empty vector and the caller decides
/// whether absence is a failure.
pub trait Session {
    /// Navigate the current window to a URL
    fn navigate(&self, url: &str) -> KinocheckResult<()>;

    /// All elements currently matching the locator, in document order
    fn find_elements(&self, locator: &Locator) -> KinocheckResult<Vec<ElementHandle>>;

    /// Click an element
    fn click_element(&self, element: &ElementHandle) -> KinocheckResult<()>;

    /// Clear an input element
    fn clear_element(&self, element: &ElementHandle) -> KinocheckResult<()>;

    /// Type text into an element verbatim
    fn type_into(&self, element: &ElementHandle, text: &str) -> KinocheckResult<()>;

    /// Send the Enter key to an element
    fn send_enter(&self, element: &ElementHandle) -> KinocheckResult<()>;

    /// Evaluate a JavaScript expression and return its value
    fn execute_script(&self, script: &str) -> KinocheckResult<Value>;

    /// URL of the current window
    fn current_url(&self) -> KinocheckResult<String>;

    /// Title of the current document
    fn title(&self) -> KinocheckResult<String>;

    /// Serialized markup of the current document
    fn page_source(&self) -> KinocheckResult<String>;

    /// PNG screenshot of the current viewport
    fn screenshot(&self) -> KinocheckResult<Vec<u8>>;

    /// Handles of all open windows, oldest first
    fn window_handles(&self) -> KinocheckResult<Vec<String>>;

    /// Switch focus to a window handle
    fn switch_to_window(&self, handle: &str) -> KinocheckResult<()>;

    /// Close the focused window
    fn close_window(&self) -> KinocheckResult<()>;
}

/// Script used by load-completion waits; the mock answers it too.
pub const READY_STATE_SCRIPT: &str = "document.readyState";

#[derive(Debug, Default)]
struct MockState {
    url: String,
    title: String,
    source: String,
    elements: HashMap<String, Vec<ElementHandle>>,
    script_results: HashMap<String, Value>,
    windows: Vec<String>,
    current_window: usize,
    last_typed: Option<String>,
    fail_screenshots: bool,
    call_history: Vec<String>,
}

/// Scripted in-memory session for unit tests.
///
/// Elements and script results are keyed by the locator/script display string.
/// Every trait call is recorded in a history so tests can verify both what
/// happened and what did not. Sending Enter simulates the search navigation:
/// the title and source are rewritten around the last typed text.
#[derive(Debug, Default)]
pub struct MockSession {
    state: Mutex<MockState>,
}

impl MockSession {
    /// Create an empty mock with one open window
    #[must_use]
    pub fn new() -> Self {
        let session = Self::default();
        {
            let mut state = session.state.lock().unwrap();
            state.windows.push("window-0".to_string());
            state
                .script_results
                .insert(READY_STATE_SCRIPT.to_string(), Value::String("complete".into()));
        }
        session
    }

    /// Script the elements a locator resolves to
    pub fn add_elements(&self, locator: &Locator, elements: Vec<ElementHandle>) {
        let mut state = self.state.lock().unwrap();
        state.elements.insert(locator.to_string(), elements);
    }

    /// Script a single element for a locator
    pub fn add_element(&self, locator: &Locator, element: ElementHandle) {
        self.add_elements(locator, vec![element]);
    }

    /// Script the value a script evaluates to
    pub fn set_script_result(&self, script: impl Into<String>, value: Value) {
        let mut state = self.state.lock().unwrap();
        state.script_results.insert(script.into(), value);
    }

    /// Make `document.readyState` report a non-complete state
    pub fn set_ready_state(&self, ready_state: &str) {
        self.set_script_result(READY_STATE_SCRIPT, Value::String(ready_state.to_string()));
    }

    /// Set the current document title
    pub fn set_title(&self, title: impl Into<String>) {
        self.state.lock().unwrap().title = title.into();
    }

    /// Set the current document source
    pub fn set_source(&self, source: impl Into<String>) {
        self.state.lock().unwrap().source = source.into();
    }

    /// Simulate a popup opening a new window
    pub fn open_window(&self, handle: impl Into<String>) {
        self.state.lock().unwrap().windows.push(handle.into());
    }

    /// Make screenshot calls fail
    pub fn fail_screenshots(&self) {
        self.state.lock().unwrap().fail_screenshots = true;
    }

    /// Full ordered call history
    #[must_use]
    pub fn call_history(&self) -> Vec<String> {
        self.state.lock().unwrap().call_history.clone()
    }

    /// Whether any recorded call starts with the given prefix
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .call_history
            .iter()
            .any(|call| call.starts_with(prefix))
    }

    /// Number of recorded calls starting with the given prefix
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .call_history
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().call_history.push(call);
    }
}

impl Session for MockSession {
    fn navigate(&self, url: &str) -> KinocheckResult<()> {
        self.record(format!("navigate:{url}"));
        self.state.lock().unwrap().url = url.to_string();
        Ok(())
    }

    fn find_elements(&self, locator: &Locator) -> KinocheckResult<Vec<ElementHandle>> {
        self.record(format!("find_elements:{locator}"));
        let state = self.state.lock().unwrap();
        Ok(state
            .elements
            .get(&locator.to_string())
            .cloned()
            .unwrap_or_default())
    }

    fn click_element(&self, element: &ElementHandle) -> KinocheckResult<()> {
        self.record(format!("click:{}", element.id));
        Ok(())
    }

    fn clear_element(&self, element: &ElementHandle) -> KinocheckResult<()> {
        self.record(format!("clear:{}", element.id));
        Ok(())
    }

    fn type_into(&self, element: &ElementHandle, text: &str) -> KinocheckResult<()> {
        self.record(format!("type:{}:{text}", element.id));
        self.state.lock().unwrap().last_typed = Some(text.to_string());
        Ok(())
    }

    fn send_enter(&self, element: &ElementHandle) -> KinocheckResult<()> {
        self.record(format!("enter:{}", element.id));
        let mut state = self.state.lock().unwrap();
        if let Some(query) = state.last_typed.clone() {
            state.title = format!("{query} — результаты поиска");
            state.source = format!("<html><body>{query}</body></html>");
        }
        Ok(())
    }

    fn execute_script(&self, script: &str) -> KinocheckResult<Value> {
        self.record(format!("script:{script}"));
        let state = self.state.lock().unwrap();
        Ok(state
            .script_results
            .get(script)
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn current_url(&self) -> KinocheckResult<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    fn title(&self) -> KinocheckResult<String> {
        Ok(self.state.lock().unwrap().title.clone())
    }

    fn page_source(&self) -> KinocheckResult<String> {
        Ok(self.state.lock().unwrap().source.clone())
    }

    fn screenshot(&self) -> KinocheckResult<Vec<u8>> {
        self.record("screenshot".to_string());
        let state = self.state.lock().unwrap();
        if state.fail_screenshots {
            return Err(crate::result::KinocheckError::ScreenshotError {
                message: "screenshot unavailable".to_string(),
            });
        }
        // Minimal PNG magic so artifact sinks see a plausible payload
        Ok(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }

    fn window_handles(&self) -> KinocheckResult<Vec<String>> {
        Ok(self.state.lock().unwrap().windows.clone())
    }

    fn switch_to_window(&self, handle: &str) -> KinocheckResult<()> {
        self.record(format!("switch_window:{handle}"));
        let mut state = self.state.lock().unwrap();
        match state.windows.iter().position(|w| w == handle) {
            Some(index) => {
                state.current_window = index;
                Ok(())
            }
            None => Err(crate::result::KinocheckError::SessionError {
                message: format!("no such window: {handle}"),
            }),
        }
    }

    fn close_window(&self) -> KinocheckResult<()> {
        self.record("close_window".to_string());
        let mut state = self.state.lock().unwrap();
        let index = state.current_window;
        if index < state.windows.len() {
            state.windows.remove(index);
        }
        state.current_window = 0;
        Ok(())
    }
}

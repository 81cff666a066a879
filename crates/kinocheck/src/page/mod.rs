//! Page abstraction: stateless page objects over a borrowed session.
//!
//! A page owns nothing but its declared locators; all browser state lives
//! behind the session. Navigation targets whose markup shifts between site
//! releases declare ordered locator alternatives, and operations fall back to
//! text scans when the primary strategy fails outright.

mod main_page;
mod media_page;

pub use main_page::MainPage;
pub use media_page::MediaPage;

use crate::action::Actions;
use crate::capture::capture_failure;
use crate::locator::{Locator, LocatorList};
use crate::result::{KinocheckError, KinocheckResult};
use crate::session::{ElementHandle, Session};

/// A named page object
pub trait Page {
    /// Human-readable page name, used in step reports
    fn name(&self) -> &'static str;
}

/// How visible text is matched during fallback scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    /// Case-sensitive substring match
    Exact,
    /// Case-insensitive substring match
    CaseInsensitive,
}

impl TextMatch {
    /// Whether the candidate text contains the needle under this mode
    #[must_use]
    pub fn matches(&self, candidate: &str, needle: &str) -> bool {
        match self {
            Self::Exact => candidate.contains(needle),
            Self::CaseInsensitive => candidate.to_lowercase().contains(&needle.to_lowercase()),
        }
    }
}

/// Try each locator alternative in declared order and click the first that
/// resolves to a displayed element.
///
/// Each alternative gets its own short, non-capturing probe; the operation
/// commits to the first alternative that passes the visibility check, and
/// later alternatives are never tried.
///
/// # Errors
///
/// [`KinocheckError::NavigationTargetNotFound`] when every alternative was
/// exhausted; exactly one screenshot labeled `{operation}_not_found` is
/// captured first.
pub fn click_first_match<S: Session + ?Sized>(
    actions: &Actions<'_, S>,
    operation: &str,
    alternatives: &LocatorList,
    per_try_timeout_ms: u64,
) -> KinocheckResult<ElementHandle> {
    actions.sink().step(&format!("{operation}: try {alternatives}"));
    for locator in alternatives {
        if let Some(element) = actions.probe(locator, per_try_timeout_ms) {
            if element.displayed {
                tracing::debug!(%locator, operation, "alternative matched");
                actions.click_handle(&element)?;
                return Ok(element);
            }
        }
    }
    capture_failure(
        actions.session(),
        actions.sink(),
        &format!("{operation}_not_found"),
    );
    Err(KinocheckError::NavigationTargetNotFound {
        operation: operation.to_string(),
    })
}

/// Scan every element of a broader tag and click the first textual match.
///
/// This is the secondary strategy for operations whose primary locator failed
/// outright rather than merely being slow.
///
/// # Errors
///
/// [`KinocheckError::NavigationTargetNotFound`] when no element of the tag
/// carried the text; one screenshot labeled `{operation}_not_found` is
/// captured first.
pub fn click_by_text<S: Session + ?Sized>(
    actions: &Actions<'_, S>,
    operation: &str,
    tag: &str,
    needle: &str,
    matching: TextMatch,
) -> KinocheckResult<ElementHandle> {
    actions
        .sink()
        .step(&format!("{operation}: scan <{tag}> for {needle:?}"));
    let candidates = actions.find_all(&Locator::css(tag))?;
    for element in candidates {
        let matched = element
            .text
            .as_deref()
            .is_some_and(|text| matching.matches(text, needle));
        if matched {
            actions.click_handle(&element)?;
            return Ok(element);
        }
    }
    capture_failure(
        actions.session(),
        actions.sink(),
        &format!("{operation}_not_found"),
    );
    Err(KinocheckError::NavigationTargetNotFound {
        operation: operation.to_string(),
    })
}

//! Locator model: strategy + selector pairs and ordered fallback lists.
//!
//! A [`Locator`] is an immutable description of how to find elements. It never
//! talks to a browser itself; instead it generates the JavaScript query
//! expressions the session boundary executes. A [`LocatorList`] declares
//! ordered alternatives for targets whose markup shifts between site releases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element lookup strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum By {
    /// Match on the `name` attribute
    Name,
    /// Match anchors by exact visible text
    LinkText,
    /// CSS selector
    Css,
    /// XPath expression
    XPath,
    /// Match on a single class name
    ClassName,
}

impl By {
    /// Short strategy tag used in display strings and failure labels
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::LinkText => "link_text",
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::ClassName => "class",
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable (strategy, selector) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    by: By,
    selector: String,
}

impl Locator {
    /// Create a locator with an explicit strategy
    #[must_use]
    pub fn new(by: By, selector: impl Into<String>) -> Self {
        Self {
            by,
            selector: selector.into(),
        }
    }

    /// Locator matching the `name` attribute
    #[must_use]
    pub fn name(selector: impl Into<String>) -> Self {
        Self::new(By::Name, selector)
    }

    /// Locator matching anchors by exact visible text
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::new(By::LinkText, text)
    }

    /// CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(By::Css, selector)
    }

    /// XPath locator
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::new(By::XPath, expression)
    }

    /// Locator matching a single class name
    #[must_use]
    pub fn class_name(name: impl Into<String>) -> Self {
        Self::new(By::ClassName, name)
    }

    /// Get the strategy
    #[must_use]
    pub const fn by(&self) -> By {
        self.by
    }

    /// Get the raw selector string
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// JavaScript expression evaluating to an array of matching elements
    #[must_use]
    pub fn to_query_all(&self) -> String {
        match self.by {
            By::Name => {
                let attr = format!("[name={:?}]", self.selector);
                format!("Array.from(document.querySelectorAll({attr:?}))")
            }
            By::LinkText => {
                format!(
                    "Array.from(document.querySelectorAll('a')).filter(el => el.textContent.trim() === {:?})",
                    self.selector
                )
            }
            By::Css => format!("Array.from(document.querySelectorAll({:?}))", self.selector),
            By::XPath => {
                format!(
                    "(() => {{ const r = document.evaluate({:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); return out; }})()",
                    self.selector
                )
            }
            By::ClassName => {
                format!(
                    "Array.from(document.getElementsByClassName({:?}))",
                    self.selector
                )
            }
        }
    }

    /// JavaScript expression evaluating to the first match or null
    #[must_use]
    pub fn to_query(&self) -> String {
        match self.by {
            By::Name => {
                let attr = format!("[name={:?}]", self.selector);
                format!("document.querySelector({attr:?})")
            }
            By::Css => format!("document.querySelector({:?})", self.selector),
            By::XPath => {
                format!(
                    "document.evaluate({:?}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                    self.selector
                )
            }
            By::LinkText | By::ClassName => {
                format!("({})[0] ?? null", self.to_query_all())
            }
        }
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self.by {
            By::Name => {
                let attr = format!("[name={:?}]", self.selector);
                format!("document.querySelectorAll({attr:?}).length")
            }
            By::Css => format!("document.querySelectorAll({:?}).length", self.selector),
            By::XPath => {
                format!(
                    "document.evaluate({:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
                    self.selector
                )
            }
            By::LinkText | By::ClassName => format!("({}).length", self.to_query_all()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.by, self.selector)
    }
}

/// Ordered list of alternative locators for one logical target.
///
/// Declaration order is the priority order: the first alternative that
/// resolves to a usable element wins, and later alternatives are not tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorList {
    alternatives: Vec<Locator>,
}

impl LocatorList {
    /// Create a list from alternatives in priority order
    #[must_use]
    pub fn new(alternatives: Vec<Locator>) -> Self {
        Self { alternatives }
    }

    /// Alternatives in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, Locator> {
        self.alternatives.iter()
    }

    /// Number of alternatives
    #[must_use]
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }
}

impl<'a> IntoIterator for &'a LocatorList {
    type Item = &'a Locator;
    type IntoIter = std::slice::Iter<'a, Locator>;

    fn into_iter(self) -> Self::IntoIter {
        self.alternatives.iter()
    }
}

impl From<Vec<Locator>> for LocatorList {
    fn from(alternatives: Vec<Locator>) -> Self {
        Self::new(alternatives)
    }
}

impl fmt::Display for LocatorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.alternatives.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(" | "))
    }
}

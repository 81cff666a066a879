//! Kinocheck: page-object browser automation core for movie-catalog E2E suites.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      KINOCHECK layers                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  scenario  — named pipelines, abort on first failure         │
//! │  page      — MainPage / MediaPage, locator fallback chains   │
//! │  action    — find / click / type / scroll / wait primitives  │
//! │  session   — sync Session trait: MockSession | CdpSession    │
//! │  report    — StepSink: steps + labeled artifacts             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is synchronous and single-threaded: each primitive blocks until
//! it succeeds or its bounded wait expires, and every terminal failure leaves
//! exactly one labeled screenshot behind. Session lifecycle belongs to the
//! test fixture; the core only borrows.
//!
//! The [`api`] module is a separate collaborator: a blocking HTTP client for
//! the movie metadata service with a sentinel error contract.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod action;
mod capture;
mod locator;
mod page;
mod report;
mod result;
mod session;
mod wait;

pub mod api;
#[cfg(feature = "browser")]
pub mod browser;
pub mod scenario;

pub use action::Actions;
pub use capture::capture_failure;
pub use locator::{By, Locator, LocatorList};
pub use page::{click_by_text, click_first_match, MainPage, MediaPage, Page, TextMatch};
pub use report::{Attachment, AttachmentKind, DirSink, MemorySink, NullSink, StepSink};
pub use result::{KinocheckError, KinocheckResult};
pub use session::{ElementHandle, MockSession, Session, READY_STATE_SCRIPT};
pub use wait::{
    poll_for, settle, settle_brief, wait_until, WaitPolicy, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_SETTLE_MS, DEFAULT_TIMEOUT_MS,
};

#[cfg(feature = "browser")]
pub use browser::{BrowserSessionConfig, CdpSession};

/// Initialize tracing output for binaries and harnesses.
///
/// Respects `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .try_init();
}

#[cfg(test)]
mod integration_tests {
    //! End-to-end flows across the public surface, mock-driven.

    use super::*;

    #[test]
    fn test_full_journey_through_public_api() {
        let session = MockSession::new();
        let sink = MemorySink::new();
        session.add_element(&Locator::name("kp_query"), ElementHandle::new("input"));
        session.add_element(
            &Locator::css("a[href*='afisha']"),
            ElementHandle::new("a").with_text("Билеты"),
        );
        session.add_element(
            &Locator::link_text("Вакансии"),
            ElementHandle::new("a").with_text("Вакансии"),
        );
        session.add_element(
            &Locator::xpath(
                "//button[@type='button' and normalize-space(text())='Служба поддержки']",
            ),
            ElementHandle::new("button").with_text("Служба поддержки"),
        );
        session.add_element(
            &Locator::xpath("//a[@data-tid='de7c6530' and @href='/media/']"),
            ElementHandle::new("a"),
        );
        session.add_element(
            &Locator::class_name("media-rubrics-navigation__button"),
            ElementHandle::new("button"),
        );
        session.add_element(
            &Locator::xpath(
                "//a[@class='media-rubrics-navigation__item-link' and @href='/media/rubric/318/']",
            ),
            ElementHandle::new("a"),
        );

        let policy = WaitPolicy::no_delays().with_timeout(50);
        let main = MainPage::new(&session, &sink).with_policy(policy);
        let media = main.complete_navigation("Мимино").unwrap();
        media.complete_media_navigation().unwrap();

        assert!(sink.has_step("scenario kinopoisk navigation completed"));
        assert!(sink.has_step("scenario media navigation completed"));
        // No failure artifacts, only the post-search diagnostic
        assert_eq!(sink.attachment_labels(), vec!["after_search"]);
    }

    #[test]
    fn test_failure_keeps_session_open_for_fixture_teardown() {
        let session = MockSession::new();
        let sink = MemorySink::new();
        let policy = WaitPolicy::no_delays().with_timeout(30);
        let main = MainPage::new(&session, &sink).with_policy(policy);

        // Search input never appears, journey aborts early
        assert!(main.complete_navigation("Мимино").is_err());
        assert!(!session.was_called("close_window"));
        assert!(session.title().is_ok());
    }
}

//! Main page of the movie-catalog site: search plus the header and footer
//! navigation targets.

use std::fmt;

use super::{click_by_text, click_first_match, MediaPage, Page, TextMatch};
use crate::action::Actions;
use crate::capture::capture_failure;
use crate::locator::{Locator, LocatorList};
use crate::report::StepSink;
use crate::result::{KinocheckError, KinocheckResult};
use crate::scenario;
use crate::session::Session;
use crate::wait::{self, WaitPolicy};

/// URL the main page opens
pub const BASE_URL: &str = "https://www.kinopoisk.ru/";

/// Per-alternative probe timeout used by fallback lists
const ALTERNATIVE_TIMEOUT_MS: u64 = 3_000;

/// Main page object
pub struct MainPage<'a, S: Session + ?Sized> {
    actions: Actions<'a, S>,
}

impl<S: Session + ?Sized> fmt::Debug for MainPage<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainPage").finish_non_exhaustive()
    }
}

impl<S: Session + ?Sized> Page for MainPage<'_, S> {
    fn name(&self) -> &'static str {
        "main page"
    }
}

impl<'a, S: Session + ?Sized> MainPage<'a, S> {
    /// Bind the page to a session and sink with the default wait policy
    #[must_use]
    pub fn new(session: &'a S, sink: &'a dyn StepSink) -> Self {
        Self {
            actions: Actions::new(session, sink),
        }
    }

    /// Override the wait policy
    #[must_use]
    pub fn with_policy(mut self, policy: WaitPolicy) -> Self {
        self.actions = self.actions.with_policy(policy);
        self
    }

    /// The bound action primitives
    #[must_use]
    pub const fn actions(&self) -> &Actions<'a, S> {
        &self.actions
    }

    fn search_input() -> Locator {
        Locator::name("kp_query")
    }

    fn tickets_links() -> LocatorList {
        LocatorList::new(vec![
            Locator::xpath("//a[text()='Билеты в кино']"),
            Locator::xpath("//a[contains(text(), 'Билеты')]"),
            Locator::css("a[href*='afisha']"),
            Locator::css("a[data-tid*='tickets']"),
        ])
    }

    fn vacancies_link() -> Locator {
        Locator::link_text("Вакансии")
    }

    fn support_button() -> Locator {
        Locator::xpath("//button[@type='button' and normalize-space(text())='Служба поддержки']")
    }

    fn media_link() -> Locator {
        Locator::xpath("//a[@data-tid='de7c6530' and @href='/media/']")
    }

    /// Open the main page and wait for the document to finish loading
    pub fn open(&self) -> KinocheckResult<&Self> {
        self.actions.sink().step("open main page");
        self.actions.session().navigate(BASE_URL)?;
        self.actions.wait_for_load_complete()?;
        Ok(self)
    }

    /// Search for a movie: clear the field, type the query, commit with Enter
    pub fn search(&self, query: &str) -> KinocheckResult<&Self> {
        self.actions.sink().step(&format!("search for {query}"));
        let input = self.actions.type_text(&Self::search_input(), query)?;
        self.actions.session().send_enter(&input)?;
        wait::settle(self.actions.policy());
        Ok(self)
    }

    /// Navigate to the cinema tickets section via the locator alternatives
    pub fn go_to_tickets(&self) -> KinocheckResult<&Self> {
        // Each alternative gets a short probe, never longer than the policy
        let per_try = self.actions.policy().timeout_ms.min(ALTERNATIVE_TIMEOUT_MS);
        click_first_match(&self.actions, "tickets", &Self::tickets_links(), per_try)?;
        Ok(self)
    }

    /// Navigate to the vacancies page in the footer.
    ///
    /// Falls back to scanning all anchors for the exact link text when the
    /// primary locator fails outright.
    pub fn go_to_vacancies(&self) -> KinocheckResult<&Self> {
        self.actions.scroll_to_bottom()?;
        match self
            .actions
            .try_click(&Self::vacancies_link(), self.actions.policy().timeout_ms)
        {
            Ok(_) => Ok(self),
            Err(error) => {
                tracing::debug!(%error, "vacancies link fallback to text scan");
                click_by_text(&self.actions, "vacancies", "a", "Вакансии", TextMatch::Exact)?;
                Ok(self)
            }
        }
    }

    /// Open the support dialog from the footer.
    ///
    /// Falls back to a case-insensitive scan over all buttons.
    pub fn go_to_support(&self) -> KinocheckResult<&Self> {
        self.actions.scroll_to_bottom()?;
        match self
            .actions
            .try_click(&Self::support_button(), self.actions.policy().timeout_ms)
        {
            Ok(_) => Ok(self),
            Err(error) => {
                tracing::debug!(%error, "support button fallback to text scan");
                click_by_text(
                    &self.actions,
                    "support",
                    "button",
                    "поддержки",
                    TextMatch::CaseInsensitive,
                )?;
                Ok(self)
            }
        }
    }

    /// Navigate to the media section, transitioning to its page object.
    ///
    /// The media page borrows the same session; no new session is created.
    pub fn go_to_media(self) -> KinocheckResult<MediaPage<'a, S>> {
        let result = self
            .actions
            .try_click(&Self::media_link(), self.actions.policy().timeout_ms);
        if let Err(error) = result {
            tracing::debug!(%error, "media link fallback to href scan");
            let candidates = self.actions.find_all(&Locator::css("a[href*='/media/']"))?;
            match candidates.first() {
                Some(element) => self.actions.click_handle(element)?,
                None => {
                    capture_failure(self.actions.session(), self.actions.sink(), "media_not_found");
                    return Err(KinocheckError::NavigationTargetNotFound {
                        operation: "media".to_string(),
                    });
                }
            }
        }
        Ok(MediaPage::from_actions(self.actions))
    }

    /// The full navigation journey: open, search, tickets, vacancies, support,
    /// media. Aborts at the first failing step with an `error` screenshot.
    pub fn complete_navigation(self, query: &str) -> KinocheckResult<MediaPage<'a, S>> {
        let session = self.actions.session();
        let sink = self.actions.sink();
        scenario::run("kinopoisk navigation", session, sink, move || {
            self.open()?;
            self.search(query)?;
            self.actions.screenshot("after_search");
            self.go_to_tickets()?;
            self.go_to_vacancies()?;
            self.go_to_support()?;
            self.go_to_media()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::report::MemorySink;
    use crate::session::{ElementHandle, MockSession};

    fn fast_page<'a>(session: &'a MockSession, sink: &'a MemorySink) -> MainPage<'a, MockSession> {
        MainPage::new(session, sink).with_policy(WaitPolicy::no_delays().with_timeout(30))
    }

    /// Script every element the full journey needs
    fn script_full_journey(session: &MockSession) {
        session.add_element(&Locator::name("kp_query"), ElementHandle::new("input"));
        session.add_element(
            &Locator::xpath("//a[text()='Билеты в кино']"),
            ElementHandle::new("a").with_text("Билеты в кино"),
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
    }

    mod open_tests {
        use super::*;

        #[test]
        fn test_open_navigates_and_waits_for_load() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            let page = fast_page(&session, &sink);

            page.open().unwrap();
            assert!(session.was_called("navigate:https://www.kinopoisk.ru/"));
            assert!(session.was_called("script:document.readyState"));
        }

        #[test]
        fn test_open_fails_when_page_never_loads() {
            let session = MockSession::new();
            session.set_ready_state("loading");
            let sink = MemorySink::new();
            let page = fast_page(&session, &sink);

            let error = page.open().unwrap_err();
            assert!(matches!(error, KinocheckError::PageLoadTimeout { .. }));
        }
    }

    mod search_tests {
        use super::*;

        #[test]
        fn test_search_clears_types_and_commits() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            session.add_element(&Locator::name("kp_query"), ElementHandle::new("input"));
            let page = fast_page(&session, &sink);

            page.search("Мимино").unwrap();
            assert!(session.was_called("clear:"));
            assert!(session.was_called("enter:"));
        }

        #[test]
        fn test_search_result_contains_query_case_insensitively() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            session.add_element(&Locator::name("kp_query"), ElementHandle::new("input"));
            let page = fast_page(&session, &sink);

            page.search("Мимино").unwrap();
            let title = session.title().unwrap().to_lowercase();
            let source = session.page_source().unwrap().to_lowercase();
            let query = "Мимино".to_lowercase();
            assert!(title.contains(&query) || source.contains(&query));
        }
    }

    mod tickets_tests {
        use super::*;

        #[test]
        fn test_tickets_via_second_alternative() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            let element = ElementHandle::new("a").with_text("Билеты и кино");
            let id = element.id.clone();
            session.add_element(&Locator::xpath("//a[contains(text(), 'Билеты')]"), element);
            let page = fast_page(&session, &sink);

            page.go_to_tickets().unwrap();
            assert!(session.was_called(&format!("click:{id}")));
        }

        #[test]
        fn test_tickets_exhaustion_labels_artifact() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            let page = fast_page(&session, &sink);

            let error = page.go_to_tickets().unwrap_err();
            assert!(matches!(
                error,
                KinocheckError::NavigationTargetNotFound { .. }
            ));
            assert_eq!(sink.attachment_labels(), vec!["tickets_not_found"]);
        }
    }

    mod footer_tests {
        use super::*;

        #[test]
        fn test_vacancies_primary_locator() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            session.add_element(
                &Locator::link_text("Вакансии"),
                ElementHandle::new("a").with_text("Вакансии"),
            );
            let page = fast_page(&session, &sink);

            page.go_to_vacancies().unwrap();
            assert!(session.was_called("script:window.scrollTo(0, document.body.scrollHeight);"));
            assert!(session.was_called("click:"));
        }

        #[test]
        fn test_vacancies_falls_back_to_anchor_scan() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            let anchor = ElementHandle::new("a").with_text("Вакансии компании");
            let id = anchor.id.clone();
            session.add_element(&Locator::css("a"), anchor);
            let page = fast_page(&session, &sink);

            page.go_to_vacancies().unwrap();
            assert!(session.was_called(&format!("click:{id}")));
        }

        #[test]
        fn test_support_falls_back_case_insensitively() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            let button = ElementHandle::new("button").with_text("служба ПОДДЕРЖКИ");
            let id = button.id.clone();
            session.add_element(&Locator::css("button"), button);
            let page = fast_page(&session, &sink);

            page.go_to_support().unwrap();
            assert!(session.was_called(&format!("click:{id}")));
        }
    }

    mod media_tests {
        use super::*;

        #[test]
        fn test_media_transition_returns_media_page() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            session.add_element(
                &Locator::xpath("//a[@data-tid='de7c6530' and @href='/media/']"),
                ElementHandle::new("a"),
            );
            let page = fast_page(&session, &sink);

            let media = page.go_to_media().unwrap();
            assert_eq!(media.name(), "media page");
        }

        #[test]
        fn test_media_fallback_clicks_first_href_match() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            let alternative = ElementHandle::new("a");
            let id = alternative.id.clone();
            session.add_element(&Locator::css("a[href*='/media/']"), alternative);
            let page = fast_page(&session, &sink);

            page.go_to_media().unwrap();
            assert!(session.was_called(&format!("click:{id}")));
        }

        #[test]
        fn test_media_missing_everywhere_errors() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            let page = fast_page(&session, &sink);

            let error = page.go_to_media().unwrap_err();
            assert!(matches!(
                error,
                KinocheckError::NavigationTargetNotFound { .. }
            ));
            assert_eq!(sink.attachment_labels(), vec!["media_not_found"]);
        }
    }

    mod journey_tests {
        use super::*;

        #[test]
        fn test_complete_navigation_happy_path() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            script_full_journey(&session);
            let page = fast_page(&session, &sink);

            let media = page.complete_navigation("Мимино").unwrap();
            assert_eq!(media.name(), "media page");
            assert!(sink.has_step("scenario kinopoisk navigation completed"));
            // Diagnostic capture after search, nothing labeled error
            assert_eq!(sink.attachment_labels(), vec!["after_search"]);
        }

        #[test]
        fn test_complete_navigation_aborts_on_tickets_failure() {
            let session = MockSession::new();
            let sink = MemorySink::new();
            // Everything except the tickets alternatives
            session.add_element(&Locator::name("kp_query"), ElementHandle::new("input"));
            let page = fast_page(&session, &sink);

            let error = page.complete_navigation("Мимино").unwrap_err();
            assert!(matches!(
                error,
                KinocheckError::NavigationTargetNotFound { .. }
            ));
            // Later steps never ran
            assert!(!session.was_called("script:window.scrollTo(0, document.body.scrollHeight);"));
            // Operation capture plus the scenario's own error capture
            assert_eq!(
                sink.attachment_labels(),
                vec!["after_search", "tickets_not_found", "error"]
            );
        }
    }
}

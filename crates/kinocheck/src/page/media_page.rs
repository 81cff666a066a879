//! Media section page: rubric navigation.

use std::fmt;

use super::Page;
use crate::action::Actions;
use crate::locator::Locator;
use crate::report::StepSink;
use crate::result::KinocheckResult;
use crate::scenario;
use crate::session::Session;
use crate::wait::WaitPolicy;

/// Media page object
pub struct MediaPage<'a, S: Session + ?Sized> {
    actions: Actions<'a, S>,
}

impl<S: Session + ?Sized> fmt::Debug for MediaPage<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPage").finish_non_exhaustive()
    }
}

impl<S: Session + ?Sized> Page for MediaPage<'_, S> {
    fn name(&self) -> &'static str {
        "media page"
    }
}

impl<'a, S: Session + ?Sized> MediaPage<'a, S> {
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

    pub(crate) fn from_actions(actions: Actions<'a, S>) -> Self {
        Self { actions }
    }

    /// The bound action primitives
    #[must_use]
    pub const fn actions(&self) -> &Actions<'a, S> {
        &self.actions
    }

    fn rubrics_button() -> Locator {
        Locator::class_name("media-rubrics-navigation__button")
    }

    fn my_name_is_link() -> Locator {
        Locator::xpath(
            "//a[@class='media-rubrics-navigation__item-link' and @href='/media/rubric/318/']",
        )
    }

    /// Open the rubric navigation panel
    pub fn open_rubrics(&self) -> KinocheckResult<&Self> {
        self.actions.sink().step("open media rubrics");
        self.actions.click(&Self::rubrics_button())?;
        Ok(self)
    }

    /// Navigate to the "Меня зовут..." rubric
    pub fn go_to_my_name_is(&self) -> KinocheckResult<&Self> {
        self.actions.sink().step("open rubric 'Меня зовут...'");
        self.actions.click(&Self::my_name_is_link())?;
        Ok(self)
    }

    /// The media journey: open the rubrics panel, then the rubric page
    pub fn complete_media_navigation(&self) -> KinocheckResult<&Self> {
        let session = self.actions.session();
        let sink = self.actions.sink();
        scenario::run("media navigation", session, sink, || {
            self.open_rubrics()?;
            self.go_to_my_name_is()?;
            Ok(self)
        })
    }
}

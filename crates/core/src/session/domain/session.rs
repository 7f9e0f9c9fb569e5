use crate::detection::domain::detection_result::DetectionResult;
use crate::era::domain::era::Era;
use crate::era::infrastructure::era_catalog::EraCatalog;
use crate::shared::encoded_image::EncodedImage;

use super::action::Action;
use super::screen::Screen;

/// Immutable snapshot of one user's session.
///
/// All changes go through [`Session::apply`], which returns the next
/// snapshot. Actions that make no sense on the current screen return an
/// unchanged copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    screen: Screen,
    era: Option<&'static Era>,
    captured: Option<EncodedImage>,
    detection: Option<DetectionResult>,
    generated: Option<EncodedImage>,
    generating: bool,
    editing: bool,
    notice: Option<String>,
}

/// What a front-end should render for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View<'a> {
    Splash,
    EraSelection {
        selected: Option<&'static Era>,
    },
    Capture {
        era: &'static Era,
    },
    Processing {
        era: &'static Era,
    },
    Result {
        era: &'static Era,
        image: &'a EncodedImage,
        detection: Option<DetectionResult>,
        editing: bool,
    },
    /// The screen's data is not there yet; render a neutral placeholder.
    Waiting,
}

impl Session {
    pub fn new() -> Self {
        Self {
            screen: Screen::Splash,
            era: None,
            captured: None,
            detection: None,
            generated: None,
            generating: false,
            editing: false,
            notice: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn era(&self) -> Option<&'static Era> {
        self.era
    }

    pub fn captured(&self) -> Option<&EncodedImage> {
        self.captured.as_ref()
    }

    pub fn detection(&self) -> Option<DetectionResult> {
        self.detection
    }

    pub fn generated(&self) -> Option<&EncodedImage> {
        self.generated.as_ref()
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Whether `action` would change anything from this snapshot.
    pub fn accepts(&self, action: &Action) -> bool {
        match action {
            Action::Start => self.screen == Screen::Splash,
            Action::Back => matches!(self.screen, Screen::EraSelection | Screen::Capture),
            Action::SelectEra(_) => self.screen == Screen::EraSelection,
            Action::SubmitCapture { .. } => {
                self.screen == Screen::Capture && self.era.is_some() && !self.generating
            }
            Action::GenerationSucceeded(_) | Action::GenerationFailed(_) => {
                self.screen == Screen::Processing && self.generating
            }
            Action::EditRequested => self.screen == Screen::Result && !self.editing,
            Action::EditSucceeded(_) | Action::EditFailed(_) => {
                self.screen == Screen::Result && self.editing
            }
            Action::Restart => true,
            Action::GoToSplash => self.screen != Screen::Processing && !self.editing,
            Action::DismissNotice => self.notice.is_some(),
        }
    }

    /// The single transition function.
    pub fn apply(&self, action: Action) -> Session {
        if !self.accepts(&action) {
            log::debug!(
                "Ignoring {} on the {} screen",
                action.name(),
                self.screen
            );
            return self.clone();
        }

        let mut next = self.clone();
        match action {
            Action::Start => next.screen = Screen::EraSelection,
            Action::Back => {
                next.screen = match self.screen {
                    Screen::Capture => Screen::EraSelection,
                    _ => Screen::Splash,
                }
            }
            Action::SelectEra(id) => {
                next.era = Some(EraCatalog::new().get(id));
                next.captured = None;
                next.detection = None;
                next.generated = None;
                next.screen = Screen::Capture;
            }
            Action::SubmitCapture { image, detection } => {
                next.captured = Some(image);
                next.detection = Some(detection);
                next.generated = None;
                next.generating = true;
                next.notice = None;
                next.screen = Screen::Processing;
            }
            Action::GenerationSucceeded(image) => {
                next.generated = Some(image);
                next.generating = false;
                next.screen = Screen::Result;
            }
            Action::GenerationFailed(message) => {
                next.generating = false;
                next.notice = Some(message);
                next.screen = Screen::Capture;
            }
            Action::EditRequested => {
                next.editing = true;
                next.notice = None;
            }
            Action::EditSucceeded(image) => {
                next.generated = Some(image);
                next.editing = false;
            }
            Action::EditFailed(message) => {
                next.editing = false;
                next.notice = Some(message);
            }
            Action::Restart => {
                next = Session {
                    screen: Screen::EraSelection,
                    ..Session::new()
                };
            }
            Action::GoToSplash => next.screen = Screen::Splash,
            Action::DismissNotice => next.notice = None,
        }

        if next.screen != self.screen {
            log::debug!("Session moved from {} to {}", self.screen, next.screen);
        }
        next
    }

    /// What to render. Screens whose data is missing render as
    /// [`View::Waiting`] rather than partially.
    pub fn view(&self) -> View<'_> {
        match self.screen {
            Screen::Splash => View::Splash,
            Screen::EraSelection => View::EraSelection { selected: self.era },
            Screen::Capture => match self.era {
                Some(era) => View::Capture { era },
                None => View::Waiting,
            },
            Screen::Processing => match self.era {
                Some(era) => View::Processing { era },
                None => View::Waiting,
            },
            Screen::Result => match (self.era, self.generated.as_ref()) {
                (Some(era), Some(image)) => View::Result {
                    era,
                    image,
                    detection: self.detection,
                    editing: self.editing,
                },
                _ => View::Waiting,
            },
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::era::domain::era::EraId;
    use crate::shared::constants::GENERATION_FAILED_NOTICE;

    fn jpeg(tag: u8) -> EncodedImage {
        EncodedImage::jpeg(vec![0xFF, 0xD8, tag])
    }

    fn at_capture(era: EraId) -> Session {
        Session::new()
            .apply(Action::Start)
            .apply(Action::SelectEra(era))
    }

    fn submit(session: &Session) -> Session {
        session.apply(Action::SubmitCapture {
            image: jpeg(1),
            detection: DetectionResult::new(1, 0, 1),
        })
    }

    fn at_result() -> Session {
        submit(&at_capture(EraId::OldEgypt)).apply(Action::GenerationSucceeded(jpeg(2)))
    }

    #[test]
    fn test_happy_path_reaches_result() {
        let session = at_capture(EraId::OldEgypt);
        assert_eq!(session.screen(), Screen::Capture);
        assert_eq!(session.era().unwrap().id, EraId::OldEgypt);

        let processing = submit(&session);
        assert_eq!(processing.screen(), Screen::Processing);
        assert!(processing.is_generating());
        assert_eq!(processing.detection(), Some(DetectionResult::new(1, 0, 1)));

        let result = processing.apply(Action::GenerationSucceeded(jpeg(2)));
        assert_eq!(result.screen(), Screen::Result);
        assert!(!result.is_generating());
        assert_eq!(result.generated(), Some(&jpeg(2)));
        assert!(matches!(result.view(), View::Result { .. }));
    }

    #[test]
    fn test_back_navigation() {
        let selection = Session::new().apply(Action::Start);
        assert_eq!(selection.apply(Action::Back).screen(), Screen::Splash);

        let capture = at_capture(EraId::CopticEgypt);
        let back = capture.apply(Action::Back);
        assert_eq!(back.screen(), Screen::EraSelection);
        assert_eq!(back.era().unwrap().id, EraId::CopticEgypt);
    }

    #[test]
    fn test_failed_generation_returns_to_capture_keeping_era() {
        let failed = submit(&at_capture(EraId::IslamicEgypt))
            .apply(Action::GenerationFailed(GENERATION_FAILED_NOTICE.into()));

        assert_eq!(failed.screen(), Screen::Capture);
        assert!(failed.generated().is_none());
        assert!(!failed.is_generating());
        assert_eq!(failed.era().unwrap().id, EraId::IslamicEgypt);
        assert_eq!(failed.notice(), Some(GENERATION_FAILED_NOTICE));
    }

    #[test]
    fn test_failed_edit_keeps_image_and_screen() {
        let editing = at_result().apply(Action::EditRequested);
        assert!(editing.is_editing());

        let failed = editing.apply(Action::EditFailed("edit failed".into()));
        assert_eq!(failed.screen(), Screen::Result);
        assert_eq!(failed.generated().unwrap().bytes(), jpeg(2).bytes());
        assert!(!failed.is_editing());
        assert_eq!(failed.notice(), Some("edit failed"));
    }

    #[test]
    fn test_successful_edit_replaces_image() {
        let edited = at_result()
            .apply(Action::EditRequested)
            .apply(Action::EditSucceeded(jpeg(3)));
        assert_eq!(edited.generated(), Some(&jpeg(3)));
        assert_eq!(edited.screen(), Screen::Result);
    }

    #[test]
    fn test_second_edit_request_is_noop() {
        let editing = at_result().apply(Action::EditRequested);
        assert_eq!(editing.apply(Action::EditRequested), editing);
    }

    #[test]
    fn test_restart_clears_everything_and_is_idempotent() {
        let edited = at_result().apply(Action::EditRequested);
        let once = edited.apply(Action::Restart);

        assert_eq!(once.screen(), Screen::EraSelection);
        assert!(once.era().is_none());
        assert!(once.captured().is_none());
        assert!(once.detection().is_none());
        assert!(once.generated().is_none());
        assert!(!once.is_editing());
        assert!(!once.is_generating());

        assert_eq!(once.apply(Action::Restart), once);
    }

    #[test]
    fn test_restart_from_processing_drops_late_completion() {
        let restarted = submit(&at_capture(EraId::OldEgypt)).apply(Action::Restart);
        let late = restarted.apply(Action::GenerationSucceeded(jpeg(9)));
        assert_eq!(late, restarted);
    }

    #[test]
    fn test_invalid_actions_are_noops() {
        let splash = Session::new();
        assert_eq!(splash.apply(Action::SelectEra(EraId::OldEgypt)), splash);
        assert_eq!(splash.apply(Action::GenerationSucceeded(jpeg(1))), splash);
        assert_eq!(splash.apply(Action::EditRequested), splash);

        let capture = at_capture(EraId::OldEgypt);
        assert_eq!(capture.apply(Action::Start), capture);
        assert_eq!(capture.apply(Action::EditSucceeded(jpeg(1))), capture);

        let processing = submit(&capture);
        assert_eq!(submit(&processing), processing);
        assert_eq!(processing.apply(Action::GoToSplash), processing);
        assert_eq!(processing.apply(Action::Back), processing);
    }

    #[test]
    fn test_go_to_splash_keeps_selections() {
        let splash = at_result().apply(Action::GoToSplash);
        assert_eq!(splash.screen(), Screen::Splash);
        assert!(splash.generated().is_some());
        assert_eq!(splash.era().unwrap().id, EraId::OldEgypt);
    }

    #[test]
    fn test_go_to_splash_refused_while_editing() {
        let editing = at_result().apply(Action::EditRequested);
        assert_eq!(editing.apply(Action::GoToSplash), editing);

        let edited = editing.apply(Action::EditSucceeded(jpeg(3)));
        assert!(!edited.is_editing());
        assert_eq!(edited.apply(Action::GoToSplash).screen(), Screen::Splash);
    }

    #[test]
    fn test_reentry_through_splash_starts_with_no_portrait() {
        let reentered = at_result()
            .apply(Action::GoToSplash)
            .apply(Action::Start)
            .apply(Action::SelectEra(EraId::CopticEgypt));
        assert_eq!(reentered.screen(), Screen::Capture);
        assert!(reentered.generated().is_none());
        assert!(reentered.captured().is_none());
        assert!(reentered.detection().is_none());

        let failed = submit(&reentered).apply(Action::GenerationFailed("oops".into()));
        assert_eq!(failed.screen(), Screen::Capture);
        assert_eq!(failed.era().unwrap().id, EraId::CopticEgypt);
        assert!(failed.generated().is_none());

        let accepted = submit(&reentered).apply(Action::GenerationSucceeded(jpeg(4)));
        assert!(accepted.apply(Action::EditRequested).is_editing());
    }

    #[test]
    fn test_new_capture_clears_notice() {
        let failed = submit(&at_capture(EraId::OldEgypt))
            .apply(Action::GenerationFailed("oops".into()));
        assert!(failed.notice().is_some());
        assert!(submit(&failed).notice().is_none());
        assert!(failed.apply(Action::DismissNotice).notice().is_none());
    }

    #[test]
    fn test_view_waits_for_missing_data() {
        assert_eq!(Session::new().view(), View::Splash);
        assert!(matches!(
            at_capture(EraId::OldEgypt).view(),
            View::Capture { .. }
        ));

        let result_without_image = Session {
            screen: Screen::Result,
            era: Some(EraCatalog::new().get(EraId::OldEgypt)),
            ..Session::new()
        };
        assert_eq!(result_without_image.view(), View::Waiting);

        let result_without_era = Session {
            screen: Screen::Result,
            generated: Some(jpeg(1)),
            ..Session::new()
        };
        assert_eq!(result_without_era.view(), View::Waiting);
    }
}

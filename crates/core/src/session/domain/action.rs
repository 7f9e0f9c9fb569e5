use crate::detection::domain::detection_result::DetectionResult;
use crate::era::domain::era::EraId;
use crate::shared::encoded_image::EncodedImage;

/// Everything that can move a session: user intents and collaborator
/// completions.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Start,
    Back,
    SelectEra(EraId),
    SubmitCapture {
        image: EncodedImage,
        detection: DetectionResult,
    },
    GenerationSucceeded(EncodedImage),
    GenerationFailed(String),
    EditRequested,
    EditSucceeded(EncodedImage),
    EditFailed(String),
    Restart,
    GoToSplash,
    DismissNotice,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Back => "back",
            Action::SelectEra(_) => "select_era",
            Action::SubmitCapture { .. } => "submit_capture",
            Action::GenerationSucceeded(_) => "generation_succeeded",
            Action::GenerationFailed(_) => "generation_failed",
            Action::EditRequested => "edit_requested",
            Action::EditSucceeded(_) => "edit_succeeded",
            Action::EditFailed(_) => "edit_failed",
            Action::Restart => "restart",
            Action::GoToSplash => "go_to_splash",
            Action::DismissNotice => "dismiss_notice",
        }
    }
}

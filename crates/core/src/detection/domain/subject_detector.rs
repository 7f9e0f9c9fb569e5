use crate::detection::domain::detection_result::DetectionResult;
use crate::shared::frame::Frame;

/// The face detection collaborator as the capture flow sees it.
///
/// Never fails for a well-formed frame: when `models_ready` is false, or the
/// underlying models cannot produce an answer, the result is
/// [`DetectionResult::none`].
pub trait SubjectDetector: Send {
    fn detect(&mut self, frame: &Frame, models_ready: bool) -> DetectionResult;
}

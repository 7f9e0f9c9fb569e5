use crate::detection::domain::face_detector::DetectedFace;
use crate::shared::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

/// Estimates the presented gender of one detected face within a frame.
pub trait GenderClassifier: Send {
    fn classify(
        &mut self,
        frame: &Frame,
        face: &DetectedFace,
    ) -> Result<Gender, Box<dyn std::error::Error>>;
}

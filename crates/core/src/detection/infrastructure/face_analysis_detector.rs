use std::sync::Arc;

use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::subject_detector::SubjectDetector;
use crate::shared::frame::Frame;

use super::model_cache::{DetectionModels, ModelCache};

/// Counts subjects by running the face model, then the gender model on each
/// face found.
///
/// Any failure inside the models degrades to an empty result; the capture
/// flow must never be blocked by detection.
pub struct FaceAnalysisDetector {
    models: Arc<ModelCache>,
}

impl FaceAnalysisDetector {
    pub fn new(models: Arc<ModelCache>) -> Self {
        Self { models }
    }
}

impl SubjectDetector for FaceAnalysisDetector {
    fn detect(&mut self, frame: &Frame, models_ready: bool) -> DetectionResult {
        if !models_ready {
            log::info!("Detection models not ready, reporting no subjects");
            return DetectionResult::none();
        }

        match self.models.with_models(|models| analyse(models, frame)) {
            Some(Ok(result)) => {
                log::info!("{result}");
                result
            }
            Some(Err(e)) => {
                log::warn!("Face detection failed: {e}");
                DetectionResult::none()
            }
            None => {
                log::warn!("Detection models reported ready but are not loaded");
                DetectionResult::none()
            }
        }
    }
}

fn analyse(
    models: &mut DetectionModels,
    frame: &Frame,
) -> Result<DetectionResult, Box<dyn std::error::Error>> {
    let faces = models.faces.detect(frame)?;
    let genders = faces.iter().map(|face| {
        let classifier = models.genders.as_mut()?;
        match classifier.classify(frame, face) {
            Ok(gender) => Some(gender),
            Err(e) => {
                log::warn!("Gender estimate failed for one face: {e}");
                None
            }
        }
    });
    Ok(DetectionResult::from_genders(genders))
}

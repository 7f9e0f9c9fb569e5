/// Gender estimation with the InsightFace `genderage` ONNX model.
///
/// The model takes a 96×96 RGB crop (raw 0-255 values, NCHW) centred on the
/// face and sized to 1.5× its longer side, and returns `[female, male, age]`.
use std::path::Path;

use crate::detection::domain::face_detector::DetectedFace;
use crate::detection::domain::gender_classifier::{Gender, GenderClassifier};
use crate::shared::frame::Frame;

use super::execution_provider::preferred_execution_providers;
use super::math::softmax2_second;

const INPUT_SIZE: usize = 96;

/// Crop side relative to the face's longer side.
const CROP_SCALE: f64 = 1.5;

pub struct OnnxGenderAgeClassifier {
    session: ort::session::Session,
}

impl OnnxGenderAgeClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;
        Ok(Self { session })
    }
}

impl GenderClassifier for OnnxGenderAgeClassifier {
    fn classify(
        &mut self,
        frame: &Frame,
        face: &DetectedFace,
    ) -> Result<Gender, Box<dyn std::error::Error>> {
        let input = preprocess(frame, face, INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("genderage model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let values: Vec<f32> = tensor.iter().copied().collect();
        if values.len() < 2 {
            return Err(format!("genderage output too short: {} values", values.len()).into());
        }

        let p_male = softmax2_second(values[0], values[1]);
        log::debug!("face {:.0}x{:.0}: p(male)={p_male:.2}", face.width(), face.height());
        Ok(if p_male >= 0.5 {
            Gender::Male
        } else {
            Gender::Female
        })
    }
}

/// Samples a `size`×`size` square around the face (nearest neighbour),
/// zero-filling anything that falls outside the frame.
fn preprocess(frame: &Frame, face: &DetectedFace, size: usize) -> ndarray::Array4<f32> {
    let (x1, y1, x2, _) = face.square_around(CROP_SCALE);
    let side = (x2 - x1).max(1) as f64;
    let step = side / size as f64;
    let src = frame.as_ndarray();
    let w = frame.width() as i64;
    let h = frame.height() as i64;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));
    for ty in 0..size {
        let sy = y1 + ((ty as f64 + 0.5) * step) as i64;
        if sy < 0 || sy >= h {
            continue;
        }
        for tx in 0..size {
            let sx = x1 + ((tx as f64 + 0.5) * step) as i64;
            if sx < 0 || sx >= w {
                continue;
            }
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[sy as usize, sx as usize, c]] as f32;
            }
        }
    }
    tensor
}

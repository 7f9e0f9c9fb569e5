/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Only boxes are kept; the pose keypoints the model also emits are not
/// needed to count subjects.
use std::path::Path;

use ndarray::Array4;

use crate::detection::domain::face_detector::{DetectedFace, FaceDetector};
use crate::shared::frame::Frame;

use super::execution_provider::preferred_execution_providers;
use super::math::bbox_iou;

/// Used when the model declares a dynamic input shape.
const FALLBACK_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.45;

/// Faces narrower than this fraction of the frame's shorter side are ignored
/// (background passers-by, posters).
const MIN_FACE_FRACTION: f64 = 0.03;

/// Gray used for letterbox padding.
const PAD_VALUE: f32 = 114.0 / 255.0;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(FALLBACK_INPUT_SIZE);

        log::debug!("Subject model loaded, input size {input_size}");

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let letterbox = Letterbox::fit(frame.width(), frame.height(), self.input_size);
        let input = ort::value::Tensor::from_array(letterbox.tensor(frame))?;
        let outputs = self.session.run(ort::inputs![input])?;
        if outputs.len() == 0 {
            return Err("subject model produced no outputs".into());
        }

        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("subject model output is not contiguous")?;
        let candidates = decode_candidates(data, &shape, self.confidence)?;

        let min_width = frame.width().min(frame.height()) as f64 * MIN_FACE_FRACTION;
        Ok(suppress_overlaps(
            candidates.into_iter().map(|f| letterbox.to_frame(f)).collect(),
            NMS_IOU_THRESH,
        )
        .into_iter()
        .filter(|f| f.width() >= min_width)
        .collect())
    }
}

/// Aspect-preserving fit of a frame into a square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    size: u32,
    scale: f64,
    scaled_w: u32,
    scaled_h: u32,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn fit(width: u32, height: u32, size: u32) -> Self {
        let scale = (size as f64 / width as f64).min(size as f64 / height as f64);
        let scaled_w = (width as f64 * scale).round() as u32;
        let scaled_h = (height as f64 * scale).round() as u32;
        Self {
            size,
            scale,
            scaled_w,
            scaled_h,
            pad_x: (size - scaled_w) / 2,
            pad_y: (size - scaled_h) / 2,
        }
    }

    /// NCHW float tensor in [0, 1], nearest-neighbour sampled.
    fn tensor(&self, frame: &Frame) -> Array4<f32> {
        let side = self.size as usize;
        let mut tensor = Array4::<f32>::from_elem((1, 3, side, side), PAD_VALUE);
        let pixels = frame.as_ndarray();
        let max_x = frame.width() as usize - 1;
        let max_y = frame.height() as usize - 1;

        for y in 0..self.scaled_h as usize {
            let sy = ((y as f64 / self.scale) as usize).min(max_y);
            let ty = self.pad_y as usize + y;
            for x in 0..self.scaled_w as usize {
                let sx = ((x as f64 / self.scale) as usize).min(max_x);
                let tx = self.pad_x as usize + x;
                for c in 0..3 {
                    tensor[[0, c, ty, tx]] = f32::from(pixels[[sy, sx, c]]) / 255.0;
                }
            }
        }
        tensor
    }

    /// Maps a box from model-input space back to frame pixels.
    fn to_frame(&self, face: DetectedFace) -> DetectedFace {
        let (px, py) = (self.pad_x as f64, self.pad_y as f64);
        DetectedFace {
            x1: (face.x1 - px) / self.scale,
            y1: (face.y1 - py) / self.scale,
            x2: (face.x2 - px) / self.scale,
            y2: (face.y2 - py) / self.scale,
            confidence: face.confidence,
        }
    }
}

/// Reads `[cx, cy, w, h, conf, ...]` rows from a `[1, feats, dets]` or
/// `[1, dets, feats]` output, keeping rows at or above `min_confidence`.
/// Boxes stay in model-input coordinates.
fn decode_candidates(
    data: &[f32],
    shape: &[usize],
    min_confidence: f64,
) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
    let &[_, a, b] = shape else {
        return Err(format!("unexpected subject model output shape {shape:?}").into());
    };
    let features_first = a < b;
    let (rows, features) = if features_first { (b, a) } else { (a, b) };
    if features < 5 || data.len() < rows * features {
        return Err(format!("subject model output too small for shape {shape:?}").into());
    }

    let at = |row: usize, feature: usize| -> f64 {
        let index = if features_first {
            feature * rows + row
        } else {
            row * features + feature
        };
        f64::from(data[index])
    };

    Ok((0..rows)
        .filter(|&row| at(row, 4) >= min_confidence)
        .map(|row| {
            let (cx, cy, w, h) = (at(row, 0), at(row, 1), at(row, 2), at(row, 3));
            DetectedFace {
                x1: cx - w / 2.0,
                y1: cy - h / 2.0,
                x2: cx + w / 2.0,
                y2: cy + h / 2.0,
                confidence: at(row, 4),
            }
        })
        .collect())
}

/// Greedy non-maximum suppression, most confident first.
fn suppress_overlaps(mut faces: Vec<DetectedFace>, iou_thresh: f64) -> Vec<DetectedFace> {
    faces.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let corners = |f: &DetectedFace| [f.x1, f.y1, f.x2, f.y2];
    let mut kept: Vec<DetectedFace> = Vec::with_capacity(faces.len());
    for face in faces {
        let overlaps = kept
            .iter()
            .any(|k| bbox_iou(&corners(k), &corners(&face)) > iou_thresh);
        if !overlaps {
            kept.push(face);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn face(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64) -> DetectedFace {
        DetectedFace {
            x1,
            y1,
            x2,
            y2,
            confidence,
        }
    }

    #[test]
    fn test_letterbox_portrait_capture_pads_sides() {
        let lb = Letterbox::fit(720, 1280, 640);
        assert_relative_eq!(lb.scale, 0.5);
        assert_eq!((lb.scaled_w, lb.scaled_h), (360, 640));
        assert_eq!((lb.pad_x, lb.pad_y), (140, 0));
    }

    #[test]
    fn test_letterbox_landscape_pads_top_and_bottom() {
        let lb = Letterbox::fit(200, 100, 640);
        assert_relative_eq!(lb.scale, 3.2);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 160));
    }

    #[test]
    fn test_letterbox_tensor_values() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50);
        let lb = Letterbox::fit(100, 50, 64);
        let tensor = lb.tensor(&frame);
        assert_eq!(tensor.shape(), &[1, 3, 64, 64]);
        assert_relative_eq!(tensor[[0, 1, lb.pad_y as usize + 1, 1]], 1.0);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], PAD_VALUE);
    }

    #[test]
    fn test_to_frame_undoes_letterbox() {
        let lb = Letterbox::fit(720, 1280, 640);
        let mapped = lb.to_frame(face(140.0, 0.0, 190.0, 100.0, 0.9));
        assert_relative_eq!(mapped.x1, 0.0);
        assert_relative_eq!(mapped.x2, 100.0);
        assert_relative_eq!(mapped.y2, 200.0);
    }

    /// Six detections of `[cx, cy, w, h, conf]`; only the first two are
    /// confident.
    fn rows() -> Vec<[f32; 5]> {
        let mut rows = vec![[0.0; 5]; 6];
        rows[0] = [50.0, 50.0, 20.0, 40.0, 0.9];
        rows[1] = [10.0, 10.0, 4.0, 4.0, 0.6];
        rows[2] = [80.0, 80.0, 8.0, 8.0, 0.2];
        rows
    }

    #[test]
    fn test_decode_detections_first_layout() {
        let data: Vec<f32> = rows().into_iter().flatten().collect();
        let faces = decode_candidates(&data, &[1, 6, 5], 0.5).unwrap();
        assert_eq!(faces.len(), 2);
        assert_relative_eq!(faces[0].x1, 40.0);
        assert_relative_eq!(faces[0].y2, 70.0);
    }

    #[test]
    fn test_decode_features_first_layout() {
        let rows = rows();
        let data: Vec<f32> = (0..5)
            .flat_map(|feature| rows.iter().map(move |row| row[feature]))
            .collect();
        let faces = decode_candidates(&data, &[1, 5, 6], 0.5).unwrap();
        assert_eq!(faces.len(), 2);
        assert_relative_eq!(faces[1].x1, 8.0);
        assert_relative_eq!(faces[1].confidence, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        assert!(decode_candidates(&[0.0; 4], &[1, 4], 0.5).is_err());
        assert!(decode_candidates(&[0.0; 4], &[1, 2, 2], 0.5).is_err());
    }

    #[test]
    fn test_suppress_overlaps_keeps_most_confident() {
        let kept = suppress_overlaps(
            vec![
                face(2.0, 2.0, 102.0, 102.0, 0.5),
                face(0.0, 0.0, 100.0, 100.0, 0.9),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_suppress_overlaps_keeps_separate_faces() {
        let kept = suppress_overlaps(
            vec![
                face(0.0, 0.0, 50.0, 50.0, 0.9),
                face(200.0, 200.0, 250.0, 250.0, 0.8),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 2);
        assert!(suppress_overlaps(Vec::new(), 0.3).is_empty());
    }
}

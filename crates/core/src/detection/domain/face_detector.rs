use crate::shared::frame::Frame;

/// A detected face: bounding box in frame pixels plus detector confidence.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
}

impl DetectedFace {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Square box around the face center, `scale` times the longer side.
    ///
    /// Attribute models expect a loose square crop rather than a tight box.
    pub fn square_around(&self, scale: f64) -> (i64, i64, i64, i64) {
        let cx = (self.x1 + self.x2) / 2.0;
        let cy = (self.y1 + self.y2) / 2.0;
        let half = self.width().max(self.height()) * scale / 2.0;
        (
            (cx - half).round() as i64,
            (cy - half).round() as i64,
            (cx + half).round() as i64,
            (cy + half).round() as i64,
        )
    }
}

/// Domain interface for locating faces in a still.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(x1: f64, y1: f64, x2: f64, y2: f64) -> DetectedFace {
        DetectedFace {
            x1,
            y1,
            x2,
            y2,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_square_around_uses_longer_side() {
        let f = face(10.0, 20.0, 30.0, 60.0); // 20 x 40, center (20, 40)
        assert_eq!(f.square_around(1.0), (0, 20, 40, 60));
    }

    #[test]
    fn test_square_around_scales() {
        let f = face(40.0, 40.0, 60.0, 60.0);
        assert_eq!(f.square_around(2.0), (30, 30, 70, 70));
    }
}

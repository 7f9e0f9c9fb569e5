use std::path::{Path, PathBuf};

use crate::capture::domain::frame_source::{CaptureError, FrameSource, SourceInfo};
use crate::shared::frame::Frame;

/// Adapts an uploaded image file to the [`FrameSource`] interface.
///
/// The file is decoded once on open at its native resolution; every grab
/// returns that same frame, so uploads and the live feed share one capture
/// path.
pub struct ImageFileSource {
    path: PathBuf,
    frame: Option<Frame>,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frame: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Decodes any format the `image` crate understands into an RGB frame.
pub fn decode_image_file(path: &Path) -> Result<Frame, CaptureError> {
    let img = image::open(path)
        .map_err(|e| CaptureError::Decode(format!("{}: {e}", path.display())))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height))
}

impl FrameSource for ImageFileSource {
    fn open(&mut self) -> Result<SourceInfo, CaptureError> {
        let frame = match self.frame.take() {
            Some(frame) => frame,
            None => decode_image_file(&self.path)?,
        };
        let info = SourceInfo {
            width: frame.width(),
            height: frame.height(),
        };
        self.frame = Some(frame);
        Ok(info)
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        self.frame.clone().ok_or(CaptureError::SourceClosed)
    }

    fn close(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_png(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("upload.png");
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_open_reports_native_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(dir.path(), 64, 48);
        let mut source = ImageFileSource::new(&path);
        let info = source.open().unwrap();
        assert_eq!(info, SourceInfo { width: 64, height: 48 });
        assert_eq!(source.path(), path.as_path());
    }

    #[test]
    fn test_grab_returns_decoded_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(dir.path(), 8, 4);
        let mut source = ImageFileSource::new(path);
        source.open().unwrap();
        let frame = source.grab().unwrap();
        assert_eq!(frame.width(), 8);
        assert_eq!(frame.height(), 4);
        assert_eq!(&frame.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_grab_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(dir.path(), 4, 4);
        let mut source = ImageFileSource::new(path);
        source.open().unwrap();
        source.close();
        assert!(matches!(source.grab(), Err(CaptureError::SourceClosed)));
    }

    #[test]
    fn test_undecodable_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        let mut source = ImageFileSource::new(path);
        assert!(matches!(source.open(), Err(CaptureError::Decode(_))));
    }
}

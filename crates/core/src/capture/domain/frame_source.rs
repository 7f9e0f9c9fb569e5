use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    /// The camera could not be acquired. Live capture is over; upload still works.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to encode capture: {0}")]
    Encode(String),
    #[error("a countdown or detection is already in progress")]
    Busy,
    #[error("capture source is closed")]
    SourceClosed,
}

/// Native resolution reported by a source once opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
}

/// A producer of still frames: a live camera feed or a decoded upload.
pub trait FrameSource: Send {
    /// Acquires the underlying device or file.
    fn open(&mut self) -> Result<SourceInfo, CaptureError>;

    /// Rasterizes the current frame at native resolution.
    fn grab(&mut self) -> Result<Frame, CaptureError>;

    /// Releases the device. Must be safe to call more than once.
    fn close(&mut self);
}

/// An opened source that is closed again when dropped.
///
/// The capture screen holds one of these for as long as it is shown, so the
/// camera is released on every way out, errors included.
pub struct AcquiredSource {
    source: Box<dyn FrameSource>,
    info: SourceInfo,
}

impl AcquiredSource {
    pub fn acquire(mut source: Box<dyn FrameSource>) -> Result<Self, CaptureError> {
        match source.open() {
            Ok(info) => {
                log::info!("Capture source opened at {}x{}", info.width, info.height);
                Ok(Self { source, info })
            }
            Err(e) => {
                source.close();
                Err(e)
            }
        }
    }

    pub fn info(&self) -> SourceInfo {
        self.info
    }

    pub fn grab(&mut self) -> Result<Frame, CaptureError> {
        self.source.grab()
    }
}

impl Drop for AcquiredSource {
    fn drop(&mut self) {
        self.source.close();
        log::debug!("Capture source released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        opened: usize,
        closed: usize,
    }

    struct StubSource {
        calls: Arc<Mutex<Calls>>,
        fail_open: bool,
    }

    impl FrameSource for StubSource {
        fn open(&mut self) -> Result<SourceInfo, CaptureError> {
            self.calls.lock().unwrap().opened += 1;
            if self.fail_open {
                return Err(CaptureError::DeviceUnavailable("no camera".into()));
            }
            Ok(SourceInfo {
                width: 4,
                height: 2,
            })
        }

        fn grab(&mut self) -> Result<Frame, CaptureError> {
            Ok(Frame::new(vec![0; 4 * 2 * 3], 4, 2))
        }

        fn close(&mut self) {
            self.calls.lock().unwrap().closed += 1;
        }
    }

    fn stub(fail_open: bool) -> (Box<dyn FrameSource>, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let source = StubSource {
            calls: calls.clone(),
            fail_open,
        };
        (Box::new(source), calls)
    }

    #[test]
    fn test_drop_releases_source() {
        let (source, calls) = stub(false);
        {
            let mut acquired = AcquiredSource::acquire(source).unwrap();
            assert_eq!(acquired.info().width, 4);
            acquired.grab().unwrap();
            assert_eq!(calls.lock().unwrap().closed, 0);
        }
        assert_eq!(calls.lock().unwrap().closed, 1);
    }

    #[test]
    fn test_failed_open_still_releases() {
        let (source, calls) = stub(true);
        let err = AcquiredSource::acquire(source).err().unwrap();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.opened, 1);
        assert_eq!(calls.closed, 1);
    }

    #[test]
    fn test_release_on_error_path() {
        fn use_camera(source: Box<dyn FrameSource>) -> Result<(), CaptureError> {
            let _camera = AcquiredSource::acquire(source)?;
            Err(CaptureError::Encode("boom".into()))
        }

        let (source, calls) = stub(false);
        assert!(use_camera(source).is_err());
        assert_eq!(calls.lock().unwrap().closed, 1);
    }
}

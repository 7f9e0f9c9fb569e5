use std::time::{Duration, Instant};

use crate::capture::domain::countdown::{Countdown, CountdownEvent};
use crate::capture::domain::frame_source::{AcquiredSource, CaptureError};
use crate::capture::domain::image_encoder::ImageEncoder;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::subject_detector::SubjectDetector;
use crate::shared::encoded_image::EncodedImage;
use crate::shared::frame::Frame;

/// Reports whether the detection models have finished loading.
pub type ReadyProbe = Box<dyn Fn() -> bool + Send>;

/// One capture's worth of output.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPortrait {
    pub image: EncodedImage,
    pub detection: DetectionResult,
    pub width: u32,
    pub height: u32,
    /// Time spent in the subject detector.
    pub detect_ms: f64,
}

/// Result of advancing the countdown by one step.
#[derive(Debug, Clone, PartialEq)]
pub enum CountdownStep {
    Idle,
    Show(u8),
    Captured(CapturedPortrait),
}

/// Still capture: grab → encode → detect, either immediately or at the end
/// of a 3-2-1 countdown.
///
/// Refuses to start while a countdown runs or a detection is in flight.
pub struct CapturePortraitUseCase {
    detector: Box<dyn SubjectDetector>,
    encoder: Box<dyn ImageEncoder>,
    models_ready: ReadyProbe,
    countdown: Countdown,
    detecting: bool,
}

impl CapturePortraitUseCase {
    pub fn new(
        detector: Box<dyn SubjectDetector>,
        encoder: Box<dyn ImageEncoder>,
        models_ready: ReadyProbe,
        countdown: Countdown,
    ) -> Self {
        Self {
            detector,
            encoder,
            models_ready,
            countdown,
            detecting: false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.countdown.is_active() || self.detecting
    }

    /// Number the countdown currently shows, if running.
    pub fn countdown_value(&self) -> Option<u8> {
        self.countdown.current()
    }

    /// Captures the current frame right away.
    pub fn capture_now(
        &mut self,
        source: &mut AcquiredSource,
    ) -> Result<CapturedPortrait, CaptureError> {
        if self.is_busy() {
            return Err(CaptureError::Busy);
        }
        let frame = source.grab()?;
        self.process(frame)
    }

    /// Starts a countdown and returns the first number to show.
    pub fn start_countdown(&mut self) -> Result<u8, CaptureError> {
        if self.is_busy() || !self.countdown.start() {
            return Err(CaptureError::Busy);
        }
        Ok(self.countdown.current().unwrap_or_default())
    }

    /// Advances the countdown; captures from `source` when it reaches zero.
    pub fn tick(&mut self, source: &mut AcquiredSource) -> Result<CountdownStep, CaptureError> {
        match self.countdown.tick() {
            CountdownEvent::Idle => Ok(CountdownStep::Idle),
            CountdownEvent::Show(n) => Ok(CountdownStep::Show(n)),
            CountdownEvent::Capture => {
                let frame = source.grab()?;
                self.process(frame).map(CountdownStep::Captured)
            }
        }
    }

    /// Runs a whole countdown, one step per `interval`, and returns the
    /// capture taken at zero. `on_show` receives each number displayed.
    pub fn run_countdown(
        &mut self,
        source: &mut AcquiredSource,
        interval: Duration,
        mut on_show: impl FnMut(u8),
    ) -> Result<CapturedPortrait, CaptureError> {
        on_show(self.start_countdown()?);

        let ticker = crossbeam_channel::tick(interval);
        loop {
            if ticker.recv().is_err() {
                return Err(CaptureError::SourceClosed);
            }
            match self.tick(source)? {
                CountdownStep::Show(n) => on_show(n),
                CountdownStep::Captured(portrait) => return Ok(portrait),
                CountdownStep::Idle => return Err(CaptureError::SourceClosed),
            }
        }
    }

    fn process(&mut self, frame: Frame) -> Result<CapturedPortrait, CaptureError> {
        let image = self.encoder.encode(&frame)?;

        self.detecting = true;
        let started = Instant::now();
        let detection = self.detector.detect(&frame, (self.models_ready)());
        self.detecting = false;
        let detect_ms = started.elapsed().as_secs_f64() * 1000.0;

        log::info!(
            "Captured {}x{} still ({} bytes), detection took {detect_ms:.0}ms: {detection}",
            frame.width(),
            frame.height(),
            image.len(),
        );

        Ok(CapturedPortrait {
            image,
            detection,
            width: frame.width(),
            height: frame.height(),
            detect_ms,
        })
    }
}

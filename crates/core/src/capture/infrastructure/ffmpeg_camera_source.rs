use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, TrySendError};

use crate::capture::domain::frame_source::{CaptureError, FrameSource, SourceInfo};
use crate::shared::constants::{CAMERA_IDEAL_HEIGHT, CAMERA_IDEAL_WIDTH, CAMERA_WARMUP_FRAMES};
use crate::shared::frame::Frame;

/// libavdevice demuxer used for webcams on this platform.
pub const CAMERA_INPUT_FORMAT: &str = if cfg!(target_os = "macos") {
    "avfoundation"
} else if cfg!(target_os = "windows") {
    "dshow"
} else {
    "video4linux2"
};

/// How long a grab waits for the camera to deliver a frame.
const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Device opened when none is configured. DirectShow needs a device name,
/// so Windows has no default.
pub fn default_device() -> Option<&'static str> {
    if cfg!(target_os = "macos") {
        Some("0")
    } else if cfg!(target_os = "windows") {
        None
    } else {
        Some("/dev/video0")
    }
}

/// Live webcam feed read through libavdevice (ffmpeg-next).
///
/// Asks the device for 720x1280 and accepts whatever resolution it settles
/// on. Frames are converted to RGB24 at native resolution on a reader
/// thread, so a grab returns what the camera sees now rather than a frame
/// queued in the device buffers since opening.
pub struct FfmpegCameraSource {
    device: String,
    feed: Option<CameraFeed>,
}

struct OpenCamera {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
}

/// Moves an open camera onto its reader thread.
struct ReaderCamera(OpenCamera);

// Safety: the camera is moved to the reader thread before its first use and
// never touched from any other thread afterwards.
unsafe impl Send for ReaderCamera {}

impl ReaderCamera {
    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        self.0.next_frame()
    }
}

impl FfmpegCameraSource {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            feed: None,
        }
    }

    /// Opens the platform's default camera, if it has one.
    pub fn default_camera() -> Result<Self, CaptureError> {
        default_device().map(Self::new).ok_or_else(|| {
            CaptureError::DeviceUnavailable(format!(
                "no default {CAMERA_INPUT_FORMAT} device; pass one explicitly"
            ))
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl FrameSource for FfmpegCameraSource {
    fn open(&mut self) -> Result<SourceInfo, CaptureError> {
        if let Some(feed) = &self.feed {
            return Ok(feed.info);
        }

        ffmpeg_next::init().map_err(unavailable)?;

        let ictx = match open_device(&self.device, true) {
            Ok(ictx) => ictx,
            Err(e) => {
                log::debug!("Camera rejected ideal size ({e}), retrying with defaults");
                open_device(&self.device, false)?
            }
        };

        let mut camera = OpenCamera::from_input(ictx)?;
        for _ in 0..CAMERA_WARMUP_FRAMES {
            camera.next_frame()?;
        }

        let info = SourceInfo {
            width: camera.width,
            height: camera.height,
        };
        log::info!(
            "Camera {} streaming at {}x{}",
            self.device,
            info.width,
            info.height
        );
        let mut camera = ReaderCamera(camera);
        self.feed = Some(CameraFeed::spawn(info, move || camera.next_frame()));
        Ok(info)
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        self.feed
            .as_ref()
            .ok_or(CaptureError::SourceClosed)?
            .current(FRAME_TIMEOUT)
    }

    fn close(&mut self) {
        if self.feed.take().is_some() {
            log::debug!("Camera {} closed", self.device);
        }
    }
}

/// Frames pulled continuously on a background thread. Only the newest one is
/// kept; older frames are evicted as new ones arrive.
struct CameraFeed {
    info: SourceInfo,
    frames: Receiver<Result<Frame, CaptureError>>,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl CameraFeed {
    fn spawn<F>(info: SourceInfo, mut next_frame: F) -> Self
    where
        F: FnMut() -> Result<Frame, CaptureError> + Send + 'static,
    {
        let (tx, frames) = crossbeam_channel::bounded(1);
        let evict = frames.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let stopped = Arc::clone(&stop);

        let reader = thread::Builder::new()
            .name("chronolens-camera".into())
            .spawn(move || {
                while !stopped.load(Ordering::Relaxed) {
                    let item = next_frame();
                    let ended = item.is_err();
                    match tx.try_send(item) {
                        Ok(()) => {}
                        Err(TrySendError::Full(item)) => {
                            let _ = evict.try_recv();
                            let _ = tx.try_send(item);
                        }
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                    if ended {
                        break;
                    }
                }
            });

        let reader = match reader {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to start camera reader: {e}");
                None
            }
        };

        Self {
            info,
            frames,
            stop,
            reader,
        }
    }

    /// The first frame decoded after this call. Frames already queued are
    /// stale and skipped.
    fn current(&self, timeout: Duration) -> Result<Frame, CaptureError> {
        if self.reader.is_none() {
            return Err(CaptureError::DeviceUnavailable("camera reader not running".into()));
        }
        for stale in self.frames.try_iter() {
            if let Err(e) = stale {
                return Err(e);
            }
        }
        match self.frames.recv_timeout(timeout) {
            Ok(frame) => frame,
            Err(_) => Err(CaptureError::DeviceUnavailable(
                "camera stopped delivering frames".into(),
            )),
        }
    }
}

impl Drop for CameraFeed {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

impl OpenCamera {
    fn from_input(ictx: ffmpeg_next::format::context::Input) -> Result<Self, CaptureError> {
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| CaptureError::DeviceUnavailable("device has no video stream".into()))?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(unavailable)?;
        let decoder = codec_ctx.decoder().video().map_err(unavailable)?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(unavailable)?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
        })
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        while let Some((stream, packet)) = self.ictx.packets().next() {
            if stream.index() != self.stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }

            let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
                self.scaler
                    .run(&decoded, &mut rgb)
                    .map_err(|e| CaptureError::Decode(e.to_string()))?;
                let pixels = extract_rgb_pixels(&rgb, self.width, self.height);
                return Ok(Frame::new(pixels, self.width, self.height));
            }
        }
        Err(CaptureError::DeviceUnavailable("camera stream ended".into()))
    }
}

fn find_input_format(name: &str) -> Result<ffmpeg_next::format::Input, CaptureError> {
    ffmpeg_next::device::input::video()
        .find(|format| format.name().split(',').any(|alias| alias == name))
        .ok_or_else(|| {
            CaptureError::DeviceUnavailable(format!("ffmpeg built without {name} support"))
        })
}

fn open_device(
    device: &str,
    ideal_size: bool,
) -> Result<ffmpeg_next::format::context::Input, CaptureError> {
    let format = ffmpeg_next::format::Format::Input(find_input_format(CAMERA_INPUT_FORMAT)?);
    let mut options = ffmpeg_next::Dictionary::new();
    if ideal_size {
        options.set(
            "video_size",
            &format!("{CAMERA_IDEAL_WIDTH}x{CAMERA_IDEAL_HEIGHT}"),
        );
    }

    match ffmpeg_next::format::open_with(device, &format, options) {
        Ok(ffmpeg_next::format::context::Context::Input(ictx)) => Ok(ictx),
        Ok(_) => Err(CaptureError::DeviceUnavailable(format!(
            "{device} is not an input device"
        ))),
        Err(e) => Err(CaptureError::DeviceUnavailable(format!("{device}: {e}"))),
    }
}

fn unavailable(e: ffmpeg_next::Error) -> CaptureError {
    CaptureError::DeviceUnavailable(e.to_string())
}

/// Copies RGB24 rows out of an ffmpeg frame, dropping stride padding.
pub(crate) fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const GENDERAGE_MODEL_NAME: &str = "genderage.onnx";
pub const GENDERAGE_MODEL_URL: &str =
    "https://huggingface.co/public-data/insightface/resolve/main/models/buffalo_l/genderage.onnx";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Quality used when encoding captured frames as JPEG.
pub const CAPTURE_JPEG_QUALITY: u8 = 90;

/// Ideal live-feed resolution (portrait).
pub const CAMERA_IDEAL_WIDTH: u32 = 720;
pub const CAMERA_IDEAL_HEIGHT: u32 = 1280;

/// Frames discarded after opening the camera while exposure settles.
pub const CAMERA_WARMUP_FRAMES: usize = 5;

/// First value shown by the capture countdown.
pub const COUNTDOWN_START: u8 = 3;

/// Aspect ratio requested from the image generation service.
pub const OUTPUT_ASPECT_RATIO: &str = "9:16";

pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GENERATION_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound on a single generation or edit request.
pub const GENERATION_TIMEOUT_SECS: u64 = 120;

/// Prefix for exported portrait file names.
pub const EXPORT_FILE_PREFIX: &str = "chronolens";

/// Notice shown when generation fails and the user is returned to capture.
pub const GENERATION_FAILED_NOTICE: &str =
    "Sorry, the time machine malfunctioned. Please try again.";

/// Notice shown when an edit fails; the previous portrait stays.
pub const EDIT_FAILED_NOTICE: &str = "Sorry, that edit didn't work. Your portrait is unchanged.";

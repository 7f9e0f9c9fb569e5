mod settings;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use chronolens_core::capture::domain::countdown::Countdown;
use chronolens_core::capture::domain::frame_source::{AcquiredSource, CaptureError, FrameSource};
use chronolens_core::capture::infrastructure::ffmpeg_camera_source::FfmpegCameraSource;
use chronolens_core::capture::infrastructure::image_file_source::ImageFileSource;
use chronolens_core::capture::infrastructure::jpeg_encoder::JpegEncoder;
use chronolens_core::detection::infrastructure::face_analysis_detector::FaceAnalysisDetector;
use chronolens_core::detection::infrastructure::model_cache::ModelCache;
use chronolens_core::era::domain::era::EraId;
use chronolens_core::export::infrastructure::file_portrait_writer::FilePortraitWriter;
use chronolens_core::generation::infrastructure::gemini_client::{GeminiClient, GeminiConfig};
use chronolens_core::pipeline::capture_portrait_use_case::{
    CapturePortraitUseCase, CapturedPortrait,
};
use chronolens_core::pipeline::session_controller::SessionController;
use chronolens_core::pipeline::session_logger::LogSessionLogger;
use chronolens_core::session::domain::screen::Screen;
use chronolens_core::shared::constants::IMAGE_EXTENSIONS;

use settings::{Environment, Settings};

/// How long a one-shot run waits for the detection models before capturing.
const MODEL_WAIT: Duration = Duration::from_secs(60);
const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);

/// Reimagine a portrait in a historical Egyptian era.
#[derive(Parser)]
#[command(name = "chronolens")]
struct Cli {
    /// Target era: old-kingdom, coptic or islamic.
    #[arg(long)]
    era: Option<EraId>,

    /// Portrait image to upload instead of using the camera.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Capture from the live camera.
    #[arg(long)]
    camera: bool,

    /// Camera device (e.g. /dev/video0, or the avfoundation index).
    #[arg(long)]
    device: Option<String>,

    /// Take the camera shot after a 3-2-1 countdown.
    #[arg(long)]
    countdown: bool,

    /// Edit instruction applied to the result (repeatable, applied in order).
    #[arg(long = "edit")]
    edits: Vec<String>,

    /// Directory the finished portrait is saved to.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Image generation model name.
    #[arg(long)]
    model: Option<String>,

    /// Print the available eras and exit.
    #[arg(long)]
    list_eras: bool,

    /// Walk through the screens interactively.
    #[arg(long)]
    interactive: bool,

    /// Persist the effective model, confidence, device and output directory.
    #[arg(long)]
    save_settings: bool,
}

/// Settings after layering flags over environment over file.
struct Effective {
    settings: Settings,
    api_key: Option<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    if cli.list_eras {
        print_eras();
        return Ok(());
    }

    let effective = resolve_settings(&cli, Settings::load(), Environment::from_process());
    if cli.save_settings {
        effective.settings.save();
        log::info!("Settings saved");
    }

    print_banner();

    let models = ModelCache::onnx(
        effective.settings.confidence,
        None,
        Some(Box::new(download_progress)),
    );
    let mut capture = build_capture(&models);

    let client = Arc::new(GeminiClient::new(GeminiConfig {
        api_key: effective.api_key.clone(),
        endpoint: effective.settings.endpoint.clone(),
        model: effective.settings.model.clone(),
        timeout: Duration::from_secs(effective.settings.request_timeout_secs),
    })?);
    let mut controller = SessionController::new(
        client.clone(),
        client,
        Box::new(FilePortraitWriter::new()),
        Box::new(LogSessionLogger::new()),
    );

    let result = if cli.interactive {
        run_interactive(&cli, &effective.settings, &mut controller, &mut capture)
    } else {
        if !models.wait_ready(MODEL_WAIT) {
            log::warn!("Detection models not ready, continuing without subject counts");
        }
        run_once(&cli, &effective.settings, &mut controller, &mut capture)
    };
    controller.finish();
    result
}

fn run_once(
    cli: &Cli,
    settings: &Settings,
    controller: &mut SessionController,
    capture: &mut CapturePortraitUseCase,
) -> Result<(), Box<dyn std::error::Error>> {
    let era = cli.era.ok_or("--era is required")?;
    controller.start();
    controller.select_era(era);

    let source: Box<dyn FrameSource> = match &cli.input {
        Some(path) => Box::new(ImageFileSource::new(path)),
        None => Box::new(open_camera(cli, settings)?),
    };
    let mut source = AcquiredSource::acquire(source)?;
    let portrait = if cli.countdown {
        capture.run_countdown(&mut source, COUNTDOWN_INTERVAL, show_count)?
    } else {
        capture.capture_now(&mut source)?
    };
    drop(source);

    generate(controller, portrait);
    if let Some(notice) = controller.session().notice() {
        return Err(notice.into());
    }
    print_result(controller);

    for edit in &cli.edits {
        controller.submit_edit(edit)?;
        println!("Editing: {}", edit.trim());
        controller.wait();
        if let Some(notice) = controller.session().notice() {
            eprintln!("{notice}");
        }
    }

    let path = controller.export(&output_dir(cli, settings))?;
    println!("Saved {}", path.display());
    Ok(())
}

fn run_interactive(
    cli: &Cli,
    settings: &Settings,
    controller: &mut SessionController,
    capture: &mut CapturePortraitUseCase,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut camera: Option<AcquiredSource> = None;

    loop {
        if let Some(notice) = controller.session().notice() {
            println!("\n! {notice}");
            controller.dismiss_notice();
        }

        let screen = controller.session().screen();
        if screen != Screen::Capture && camera.take().is_some() {
            log::debug!("Left the capture screen, camera released");
        }

        match screen {
            Screen::Splash => println!("\nPress Enter to begin, or q to quit."),
            Screen::EraSelection => {
                println!("\nChoose an era (number or name), b to go back:");
                for (i, era) in controller.catalog().eras().enumerate() {
                    println!("  {}. {:20} {}", i + 1, era.name, era.description);
                }
            }
            Screen::Capture => {
                if camera.is_none() && cli.input.is_none() {
                    camera = match open_camera(cli, settings)
                        .and_then(|c| AcquiredSource::acquire(Box::new(c)))
                    {
                        Ok(source) => Some(source),
                        Err(e) => {
                            println!("Camera unavailable ({e}); upload a photo instead.");
                            None
                        }
                    };
                }
                println!("\nc = capture now, t = 3-2-1 timer, u <path> = upload, b = back");
            }
            Screen::Processing => {
                println!("\nTraveling back in time...");
                controller.wait();
                continue;
            }
            Screen::Result => {
                print_result(controller);
                println!("\ne <instruction> = edit, s = save, r = restart, h = home, q = quit");
            }
        }

        prompt()?;
        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line?;
        let (command, rest) = split_command(&line);
        if command == "q" {
            return Ok(());
        }

        match screen {
            Screen::Splash => {
                controller.start();
            }
            Screen::EraSelection => match command {
                "b" => {
                    controller.back();
                }
                choice => match parse_era_choice(choice, controller) {
                    Some(id) => {
                        controller.select_era(id);
                    }
                    None => println!("Unknown era '{choice}'"),
                },
            },
            Screen::Capture => {
                let taken = match command {
                    "b" => {
                        controller.back();
                        continue;
                    }
                    "c" | "t" => match camera.as_mut() {
                        Some(source) if command == "t" => {
                            capture.run_countdown(source, COUNTDOWN_INTERVAL, show_count)
                        }
                        Some(source) => capture.capture_now(source),
                        None => Err(CaptureError::DeviceUnavailable("no camera".into())),
                    },
                    "u" => upload(capture, rest.or(cli.input.as_deref().and_then(Path::to_str))),
                    other => {
                        println!("Unknown command '{other}'");
                        continue;
                    }
                };
                match taken {
                    Ok(portrait) => {
                        camera = None;
                        generate(controller, portrait);
                    }
                    Err(e) => println!("Capture failed: {e}"),
                }
            }
            Screen::Processing => {}
            Screen::Result => match command {
                "e" => match controller.submit_edit(rest.unwrap_or_default()) {
                    Ok(()) => {
                        println!("Editing...");
                        controller.wait();
                    }
                    Err(e) => println!("{e}"),
                },
                "s" => match controller.export(&output_dir(cli, settings)) {
                    Ok(path) => println!("Saved {}", path.display()),
                    Err(e) => println!("Save failed: {e}"),
                },
                "r" => {
                    controller.restart();
                }
                "h" => {
                    controller.go_to_splash();
                }
                other => println!("Unknown command '{other}'"),
            },
        }
    }
}

fn generate(controller: &mut SessionController, portrait: CapturedPortrait) {
    println!("{}", portrait.detection);
    if controller.submit_portrait(portrait) {
        println!("Traveling back in time...");
        controller.wait();
    }
}

fn upload(
    capture: &mut CapturePortraitUseCase,
    path: Option<&str>,
) -> Result<CapturedPortrait, CaptureError> {
    let path = path.ok_or_else(|| CaptureError::Decode("no file given".into()))?;
    let mut source = AcquiredSource::acquire(Box::new(ImageFileSource::new(path)))?;
    capture.capture_now(&mut source)
}

fn build_capture(models: &Arc<ModelCache>) -> CapturePortraitUseCase {
    let ready = Arc::clone(models);
    CapturePortraitUseCase::new(
        Box::new(FaceAnalysisDetector::new(Arc::clone(models))),
        Box::new(JpegEncoder::new()),
        Box::new(move || ready.is_ready()),
        Countdown::new(),
    )
}

fn open_camera(cli: &Cli, settings: &Settings) -> Result<FfmpegCameraSource, CaptureError> {
    match cli.device.as_ref().or(settings.camera_device.as_ref()) {
        Some(device) => Ok(FfmpegCameraSource::new(device.clone())),
        None => FfmpegCameraSource::default_camera(),
    }
}

fn print_result(controller: &SessionController) {
    let Some(view) = controller.result_view() else {
        return;
    };
    println!("\n== {} ==", view.era_name);
    println!("{}", view.era_description);
    if let Some(fact) = view.fact {
        println!("\n\"{fact}\"");
    }
    println!(
        "\nPortrait ready ({} KB, {})",
        view.image.len() / 1024,
        view.image.mime_type()
    );
    if let Some(line) = view.detection_line {
        println!("{line}");
    }
}

fn print_eras() {
    let catalog = chronolens_core::era::infrastructure::era_catalog::EraCatalog::new();
    for era in catalog.eras() {
        println!("{:12} {:20} {}", era.id.slug(), era.name, era.description);
    }
}

fn print_banner() {
    println!("ChronoLens: step into the past");
}

fn show_count(n: u8) {
    println!("  {n}...");
}

fn prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}

/// First word of the line and the trimmed remainder.
fn split_command(line: &str) -> (&str, Option<&str>) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, Some(rest.trim()).filter(|r| !r.is_empty())),
        None => (line, None),
    }
}

fn parse_era_choice(choice: &str, controller: &SessionController) -> Option<EraId> {
    if let Ok(index) = choice.parse::<usize>() {
        return controller
            .catalog()
            .eras()
            .nth(index.checked_sub(1)?)
            .map(|era| era.id);
    }
    choice.parse().ok()
}

fn resolve_settings(cli: &Cli, file: Settings, env: Environment) -> Effective {
    let mut settings = file.with_env(&env);
    if let Some(model) = &cli.model {
        settings.model = model.clone();
    }
    if let Some(confidence) = cli.confidence {
        settings.confidence = confidence;
    }
    if let Some(device) = &cli.device {
        settings.camera_device = Some(device.clone());
    }
    if let Some(dir) = &cli.output_dir {
        settings.export_dir = Some(dir.clone());
    }
    Effective {
        settings,
        api_key: env.api_key,
    }
}

fn output_dir(cli: &Cli, settings: &Settings) -> PathBuf {
    cli.output_dir
        .clone()
        .or_else(|| settings.export_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.list_eras {
        return Ok(());
    }
    if let Some(confidence) = cli.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(
                format!("Confidence must be between 0.0 and 1.0, got {confidence}").into(),
            );
        }
    }
    if let Some(input) = &cli.input {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
        if !is_image(input) {
            return Err(format!(
                "Input must be an image ({}), got {}",
                IMAGE_EXTENSIONS.join(", "),
                input.display()
            )
            .into());
        }
        if cli.camera {
            return Err("--input and --camera are mutually exclusive".into());
        }
    }
    if cli.countdown && cli.input.is_some() {
        return Err("--countdown only applies to camera capture".into());
    }
    if !cli.interactive {
        if cli.era.is_none() {
            return Err("--era is required unless --interactive is used".into());
        }
        if cli.input.is_none() && !cli.camera {
            return Err(
                "One of --input or --camera is required unless --interactive is used".into(),
            );
        }
    }
    if let Some(blank) = cli.edits.iter().find(|e| e.trim().is_empty()) {
        return Err(format!("Edit instructions must not be blank, got {blank:?}").into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}

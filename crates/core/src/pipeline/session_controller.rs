use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use rand::Rng;

use crate::detection::domain::detection_result::DetectionResult;
use crate::era::domain::era::{Era, EraId};
use crate::era::infrastructure::era_catalog::EraCatalog;
use crate::export::domain::portrait_writer::{ExportError, PortraitWriter};
use crate::generation::domain::image_editor::{EditError, EditInstruction, ImageEditor};
use crate::generation::domain::image_generator::{GenerationError, ImageGenerator};
use crate::pipeline::capture_portrait_use_case::CapturedPortrait;
use crate::pipeline::session_logger::SessionLogger;
use crate::session::domain::action::Action;
use crate::session::domain::screen::Screen;
use crate::session::domain::session::Session;
use crate::shared::constants::{EDIT_FAILED_NOTICE, GENERATION_FAILED_NOTICE};
use crate::shared::encoded_image::EncodedImage;

/// What the result screen shows besides the portrait itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView<'a> {
    pub era_name: &'static str,
    pub era_description: &'static str,
    pub fact: Option<&'static str>,
    /// "Detected: Male: X, Female: Y", when a detection was recorded.
    pub detection_line: Option<String>,
    pub image: &'a EncodedImage,
    pub editing: bool,
}

enum Outcome {
    Generated(Result<EncodedImage, GenerationError>),
    Edited(Result<EncodedImage, EditError>),
}

struct Completion {
    ticket: u64,
    outcome: Outcome,
    elapsed: Duration,
}

/// Drives a [`Session`] from user intents and collaborator completions.
///
/// Generation and edit calls run on a worker thread, one at a time. Their
/// results come back over a channel and are applied by [`poll`] or
/// [`wait`]. A completion that arrives after the user restarted is dropped.
///
/// [`poll`]: SessionController::poll
/// [`wait`]: SessionController::wait
pub struct SessionController {
    session: Session,
    catalog: EraCatalog,
    generator: Arc<dyn ImageGenerator>,
    editor: Arc<dyn ImageEditor>,
    writer: Box<dyn PortraitWriter>,
    logger: Box<dyn SessionLogger>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    next_ticket: u64,
    pending: Option<u64>,
}

impl SessionController {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        editor: Arc<dyn ImageEditor>,
        writer: Box<dyn PortraitWriter>,
        logger: Box<dyn SessionLogger>,
    ) -> Self {
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();
        Self {
            session: Session::new(),
            catalog: EraCatalog::new(),
            generator,
            editor,
            writer,
            logger,
            completion_tx,
            completion_rx,
            next_ticket: 0,
            pending: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn catalog(&self) -> &EraCatalog {
        &self.catalog
    }

    /// Whether a generation or edit call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn start(&mut self) -> &Session {
        self.dispatch(Action::Start)
    }

    pub fn back(&mut self) -> &Session {
        self.dispatch(Action::Back)
    }

    pub fn select_era(&mut self, id: EraId) -> &Session {
        self.dispatch(Action::SelectEra(id))
    }

    pub fn go_to_splash(&mut self) -> &Session {
        self.dispatch(Action::GoToSplash)
    }

    pub fn dismiss_notice(&mut self) -> &Session {
        self.dispatch(Action::DismissNotice)
    }

    /// Clears every selection and result. Any call still in flight is
    /// abandoned; its result is ignored when it arrives.
    pub fn restart(&mut self) -> &Session {
        if self.pending.take().is_some() {
            log::info!("Restart abandons the call in flight");
        }
        self.dispatch(Action::Restart)
    }

    /// Submits a capture as [`submit_capture`](Self::submit_capture) does and
    /// records its detection time when accepted.
    pub fn submit_portrait(&mut self, portrait: CapturedPortrait) -> bool {
        let detect_ms = portrait.detect_ms;
        let submitted = self.submit_capture(portrait.image, portrait.detection);
        if submitted {
            self.logger.timing("detect", detect_ms);
        }
        submitted
    }

    /// Hands a capture to the generator. Returns `false` when the session is
    /// not on the capture screen with an era selected, or already generating.
    pub fn submit_capture(&mut self, image: EncodedImage, detection: DetectionResult) -> bool {
        let action = Action::SubmitCapture {
            image: image.clone(),
            detection,
        };
        if !self.session.accepts(&action) {
            log::debug!("Capture submitted outside the capture screen, ignored");
            return false;
        }
        let Some(era) = self.session.era() else {
            return false;
        };
        self.dispatch(action);

        let generator = Arc::clone(&self.generator);
        self.spawn("generate", move || {
            Outcome::Generated(generator.generate(&image, era, &detection))
        });
        true
    }

    /// Asks the editor to change the current portrait.
    ///
    /// Blank instructions are rejected before any call, as is a second edit
    /// while one is running.
    pub fn submit_edit(&mut self, instruction: &str) -> Result<(), EditError> {
        let instruction = EditInstruction::parse(instruction)?;
        if self.session.is_editing() {
            return Err(EditError::EditInFlight);
        }
        if !self.session.accepts(&Action::EditRequested) {
            return Err(EditError::NothingToEdit);
        }
        let Some(current) = self.session.generated().cloned() else {
            return Err(EditError::NothingToEdit);
        };
        self.dispatch(Action::EditRequested);

        let editor = Arc::clone(&self.editor);
        log::info!("Editing portrait: {instruction}");
        self.spawn("edit", move || {
            Outcome::Edited(editor.edit(&current, &instruction))
        });
        Ok(())
    }

    /// Applies a finished call, if one is ready. Never blocks.
    pub fn poll(&mut self) -> bool {
        match self.completion_rx.try_recv() {
            Ok(completion) => self.complete(completion),
            Err(_) => false,
        }
    }

    /// Blocks until the outstanding call finishes and applies it. Returns
    /// `false` immediately when nothing is in flight.
    pub fn wait(&mut self) -> bool {
        while self.pending.is_some() {
            match self.completion_rx.recv() {
                Ok(completion) => {
                    if self.complete(completion) {
                        return true;
                    }
                }
                Err(_) => return false,
            }
        }
        false
    }

    /// As [`wait`](Self::wait), giving up after `timeout`.
    pub fn wait_timeout(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.pending.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.completion_rx.recv_timeout(remaining) {
                Ok(completion) => {
                    if self.complete(completion) {
                        return true;
                    }
                }
                Err(_) => return false,
            }
        }
        false
    }

    /// Saves the current portrait into `dir`.
    pub fn export(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        match (self.session.era(), self.session.generated()) {
            (Some(era), Some(image)) => self.writer.write(image, era.id, dir),
            _ => Err(ExportError::NothingToExport),
        }
    }

    /// Data for the result screen, with a random fact from the era.
    pub fn result_view(&self) -> Option<ResultView<'_>> {
        self.result_view_with(&mut rand::thread_rng())
    }

    pub fn result_view_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ResultView<'_>> {
        if self.session.screen() != Screen::Result {
            return None;
        }
        let era: &'static Era = self.session.era()?;
        let image = self.session.generated()?;
        Some(ResultView {
            era_name: era.name,
            era_description: era.description,
            fact: self.catalog.random_fact(era, rng),
            detection_line: self.session.detection().map(|d| d.to_string()),
            image,
            editing: self.session.is_editing(),
        })
    }

    /// Logs the end-of-session summary.
    pub fn finish(&self) {
        self.logger.summary();
    }

    fn dispatch(&mut self, action: Action) -> &Session {
        let name = action.name();
        let from = self.session.screen();
        self.session = self.session.apply(action);
        let to = self.session.screen();
        if from != to {
            self.logger.transition(name, from, to);
        }
        &self.session
    }

    fn spawn<F>(&mut self, stage: &'static str, call: F)
    where
        F: FnOnce() -> Outcome + Send + 'static,
    {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending = Some(ticket);

        let tx = self.completion_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("chronolens-{stage}"))
            .spawn(move || {
                let started = Instant::now();
                let outcome = call();
                let _ = tx.send(Completion {
                    ticket,
                    outcome,
                    elapsed: started.elapsed(),
                });
            });

        if let Err(e) = spawned {
            log::error!("Failed to start {stage} worker: {e}");
            let outcome = match stage {
                "edit" => Outcome::Edited(Err(EditError::Request(e.to_string()))),
                _ => Outcome::Generated(Err(GenerationError::Request(e.to_string()))),
            };
            self.complete(Completion {
                ticket,
                outcome,
                elapsed: Duration::ZERO,
            });
        }
    }

    fn complete(&mut self, completion: Completion) -> bool {
        if self.pending != Some(completion.ticket) {
            log::debug!("Dropping stale result #{}", completion.ticket);
            return false;
        }
        self.pending = None;
        let elapsed_ms = completion.elapsed.as_secs_f64() * 1000.0;

        let action = match completion.outcome {
            Outcome::Generated(result) => {
                self.logger.timing("generate", elapsed_ms);
                match result {
                    Ok(image) => {
                        self.logger
                            .info(&format!("Portrait generated ({} bytes)", image.len()));
                        Action::GenerationSucceeded(image)
                    }
                    Err(e) => {
                        log::warn!("Generation failed: {e}");
                        Action::GenerationFailed(GENERATION_FAILED_NOTICE.to_string())
                    }
                }
            }
            Outcome::Edited(result) => {
                self.logger.timing("edit", elapsed_ms);
                match result {
                    Ok(image) => {
                        self.logger
                            .info(&format!("Portrait edited ({} bytes)", image.len()));
                        Action::EditSucceeded(image)
                    }
                    Err(e) => {
                        log::warn!("Edit failed: {e}");
                        Action::EditFailed(EDIT_FAILED_NOTICE.to_string())
                    }
                }
            }
        };
        self.dispatch(action);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::session_logger::NullSessionLogger;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    // --- Stubs ---

    #[derive(Default)]
    struct StubGenerator {
        fail: bool,
        calls: Mutex<Vec<(EraId, DetectionResult, Vec<u8>)>>,
    }

    impl ImageGenerator for StubGenerator {
        fn generate(
            &self,
            source: &EncodedImage,
            era: &Era,
            detection: &DetectionResult,
        ) -> Result<EncodedImage, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((era.id, *detection, source.bytes().to_vec()));
            if self.fail {
                Err(GenerationError::NoImage)
            } else {
                Ok(EncodedImage::new(b"generated".to_vec(), "image/png"))
            }
        }
    }

    /// Editor that waits for the test to release each call.
    struct GatedEditor {
        release: Receiver<Result<Vec<u8>, ()>>,
        calls: Mutex<Vec<String>>,
    }

    impl ImageEditor for GatedEditor {
        fn edit(
            &self,
            _current: &EncodedImage,
            instruction: &EditInstruction,
        ) -> Result<EncodedImage, EditError> {
            self.calls.lock().unwrap().push(instruction.to_string());
            match self.release.recv() {
                Ok(Ok(bytes)) => Ok(EncodedImage::jpeg(bytes)),
                _ => Err(EditError::NoImage),
            }
        }
    }

    struct StubWriter {
        written: Arc<Mutex<Vec<(EraId, Vec<u8>, PathBuf)>>>,
    }

    impl PortraitWriter for StubWriter {
        fn write(
            &self,
            image: &EncodedImage,
            era: EraId,
            dir: &Path,
        ) -> Result<PathBuf, ExportError> {
            let path = dir.join("portrait.png");
            self.written
                .lock()
                .unwrap()
                .push((era, image.bytes().to_vec(), path.clone()));
            Ok(path)
        }
    }

    struct Harness {
        controller: SessionController,
        generator: Arc<StubGenerator>,
        editor: Arc<GatedEditor>,
        release_edit: Sender<Result<Vec<u8>, ()>>,
        written: Arc<Mutex<Vec<(EraId, Vec<u8>, PathBuf)>>>,
    }

    fn harness(fail_generation: bool) -> Harness {
        let generator = Arc::new(StubGenerator {
            fail: fail_generation,
            ..StubGenerator::default()
        });
        let (release_edit, release) = crossbeam_channel::unbounded();
        let editor = Arc::new(GatedEditor {
            release,
            calls: Mutex::new(Vec::new()),
        });
        let written = Arc::new(Mutex::new(Vec::new()));
        let controller = SessionController::new(
            generator.clone(),
            editor.clone(),
            Box::new(StubWriter {
                written: written.clone(),
            }),
            Box::new(NullSessionLogger),
        );
        Harness {
            controller,
            generator,
            editor,
            release_edit,
            written,
        }
    }

    fn capture() -> EncodedImage {
        EncodedImage::jpeg(vec![0xFF, 0xD8, 0x01])
    }

    fn to_result(h: &mut Harness) {
        h.controller.start();
        h.controller.select_era(EraId::OldEgypt);
        assert!(h
            .controller
            .submit_capture(capture(), DetectionResult::new(1, 0, 1)));
        assert!(h.controller.wait());
        assert_eq!(h.controller.session().screen(), Screen::Result);
    }

    // --- Tests ---

    #[test]
    fn test_end_to_end_old_kingdom() {
        let mut h = harness(false);
        h.controller.start();
        h.controller.select_era(EraId::OldEgypt);
        assert!(h
            .controller
            .submit_capture(capture(), DetectionResult::new(1, 0, 1)));
        assert_eq!(h.controller.session().screen(), Screen::Processing);
        assert!(h.controller.is_busy());

        assert!(h.controller.wait());
        assert!(!h.controller.is_busy());

        let calls = h.generator.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![(EraId::OldEgypt, DetectionResult::new(1, 0, 1), capture().bytes().to_vec())]
        );

        let mut rng = StdRng::seed_from_u64(7);
        let view = h.controller.result_view_with(&mut rng).unwrap();
        assert_eq!(view.era_name, "Old Kingdom");
        assert_eq!(view.image.bytes(), b"generated");
        assert_eq!(view.detection_line.as_deref(), Some("Detected: Male: 1, Female: 0"));

        let era = h.controller.catalog().get(EraId::OldEgypt);
        let facts = h.controller.catalog().facts(EraId::OldEgypt);
        let fact = view.fact.unwrap();
        assert!(facts.contains(&fact) || era.fallback_fact == Some(fact));
    }

    #[test]
    fn test_failed_generation_returns_to_capture() {
        let mut h = harness(true);
        h.controller.start();
        h.controller.select_era(EraId::CopticEgypt);
        h.controller
            .submit_capture(capture(), DetectionResult::none());
        assert!(h.controller.wait());

        let session = h.controller.session();
        assert_eq!(session.screen(), Screen::Capture);
        assert!(session.generated().is_none());
        assert_eq!(session.era().unwrap().id, EraId::CopticEgypt);
        assert_eq!(session.notice(), Some(GENERATION_FAILED_NOTICE));
        assert!(h.controller.result_view().is_none());
    }

    #[test]
    fn test_submit_capture_requires_capture_screen() {
        let mut h = harness(false);
        assert!(!h
            .controller
            .submit_capture(capture(), DetectionResult::none()));
        assert!(h.generator.calls.lock().unwrap().is_empty());
        assert!(!h.controller.wait());
    }

    #[test]
    fn test_blank_edit_never_reaches_editor() {
        let mut h = harness(false);
        to_result(&mut h);
        assert!(matches!(
            h.controller.submit_edit("   "),
            Err(EditError::EmptyInstruction)
        ));
        assert!(h.editor.calls.lock().unwrap().is_empty());
        assert!(!h.controller.session().is_editing());
    }

    #[test]
    fn test_only_one_edit_in_flight() {
        let mut h = harness(false);
        to_result(&mut h);

        h.controller.submit_edit("add a golden collar").unwrap();
        assert!(matches!(
            h.controller.submit_edit("and a crown"),
            Err(EditError::EditInFlight)
        ));

        h.release_edit.send(Ok(b"edited".to_vec())).unwrap();
        assert!(h.controller.wait());
        assert_eq!(h.controller.session().generated().unwrap().bytes(), b"edited");
        assert_eq!(
            *h.editor.calls.lock().unwrap(),
            vec!["add a golden collar".to_string()]
        );
    }

    #[test]
    fn test_failed_edit_keeps_portrait() {
        let mut h = harness(false);
        to_result(&mut h);
        let before = h.controller.session().generated().cloned().unwrap();

        h.controller.submit_edit("make it night").unwrap();
        h.release_edit.send(Err(())).unwrap();
        assert!(h.controller.wait());

        let session = h.controller.session();
        assert_eq!(session.screen(), Screen::Result);
        assert_eq!(session.generated().unwrap().bytes(), before.bytes());
        assert_eq!(session.notice(), Some(EDIT_FAILED_NOTICE));
    }

    #[test]
    fn test_edit_outside_result_is_refused() {
        let mut h = harness(false);
        h.controller.start();
        assert!(matches!(
            h.controller.submit_edit("add a hat"),
            Err(EditError::NothingToEdit)
        ));
    }

    #[test]
    fn test_restart_discards_late_edit() {
        let mut h = harness(false);
        to_result(&mut h);
        h.controller.submit_edit("add a hat").unwrap();

        h.controller.restart();
        assert!(!h.controller.is_busy());
        h.release_edit.send(Ok(b"late".to_vec())).unwrap();
        assert!(!h.controller.wait_timeout(Duration::from_millis(50)));

        let session = h.controller.session();
        assert_eq!(session.screen(), Screen::EraSelection);
        assert!(session.generated().is_none());
        assert!(session.era().is_none());
    }

    #[test]
    fn test_home_during_edit_waits_for_the_edit() {
        let mut h = harness(false);
        to_result(&mut h);
        h.controller.submit_edit("add a hat").unwrap();

        assert_eq!(h.controller.go_to_splash().screen(), Screen::Result);
        h.release_edit.send(Ok(b"hat".to_vec())).unwrap();
        assert!(h.controller.wait());
        assert_eq!(h.controller.session().generated().unwrap().bytes(), b"hat");

        assert_eq!(h.controller.go_to_splash().screen(), Screen::Splash);
        h.controller.start();
        h.controller.select_era(EraId::CopticEgypt);
        assert!(h
            .controller
            .submit_capture(capture(), DetectionResult::new(0, 1, 1)));
        assert!(h.controller.wait());
        assert!(h.controller.submit_edit("add a veil").is_ok());
    }

    #[test]
    fn test_reentry_failure_leaves_no_stale_portrait() {
        let mut h = harness(false);
        to_result(&mut h);
        h.controller.go_to_splash();
        h.controller.start();
        h.controller.select_era(EraId::CopticEgypt);
        assert!(h.controller.session().generated().is_none());
        assert!(matches!(
            h.controller.export(Path::new("/tmp/portraits")),
            Err(ExportError::NothingToExport)
        ));
        assert!(h.written.lock().unwrap().is_empty());
    }

    struct RecordingLogger {
        timings: Arc<Mutex<Vec<(String, f64)>>>,
    }

    impl SessionLogger for RecordingLogger {
        fn transition(&mut self, _action: &str, _from: Screen, _to: Screen) {}
        fn timing(&mut self, stage: &str, duration_ms: f64) {
            self.timings.lock().unwrap().push((stage.to_string(), duration_ms));
        }
        fn info(&mut self, _message: &str) {}
    }

    #[test]
    fn test_submit_portrait_records_detection_time() {
        let timings = Arc::new(Mutex::new(Vec::new()));
        let (_release_edit, release) = crossbeam_channel::unbounded();
        let mut controller = SessionController::new(
            Arc::new(StubGenerator::default()),
            Arc::new(GatedEditor {
                release,
                calls: Mutex::new(Vec::new()),
            }),
            Box::new(StubWriter {
                written: Arc::new(Mutex::new(Vec::new())),
            }),
            Box::new(RecordingLogger {
                timings: timings.clone(),
            }),
        );
        let portrait = CapturedPortrait {
            image: capture(),
            detection: DetectionResult::new(1, 0, 1),
            width: 4,
            height: 6,
            detect_ms: 12.5,
        };

        assert!(!controller.submit_portrait(portrait.clone()));
        assert!(timings.lock().unwrap().is_empty());

        controller.start();
        controller.select_era(EraId::OldEgypt);
        assert!(controller.submit_portrait(portrait));
        assert!(controller.wait());

        let timings = timings.lock().unwrap();
        let stages: Vec<&str> = timings.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(stages, vec!["detect", "generate"]);
        assert_eq!(timings[0].1, 12.5);
    }

    #[test]
    fn test_export_writes_current_portrait() {
        let mut h = harness(false);
        let dir = Path::new("/tmp/portraits");
        assert!(matches!(
            h.controller.export(dir),
            Err(ExportError::NothingToExport)
        ));

        to_result(&mut h);
        let path = h.controller.export(dir).unwrap();
        assert_eq!(path, dir.join("portrait.png"));
        let written = h.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, EraId::OldEgypt);
        assert_eq!(written[0].1, b"generated");
    }

    #[test]
    fn test_poll_is_nonblocking() {
        let mut h = harness(false);
        assert!(!h.controller.poll());
        to_result(&mut h);
        h.controller.submit_edit("add a hat").unwrap();
        assert!(!h.controller.poll());
        h.release_edit.send(Ok(b"hat".to_vec())).unwrap();
        assert!(h.controller.wait_timeout(Duration::from_secs(5)));
        assert!(!h.controller.session().is_editing());
    }
}

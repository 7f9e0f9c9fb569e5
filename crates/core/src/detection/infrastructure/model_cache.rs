use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::gender_classifier::GenderClassifier;

use super::model_resolver::{ModelStore, ProgressFn, GENDER_MODEL, SUBJECT_MODEL};
use super::onnx_genderage_classifier::OnnxGenderAgeClassifier;
use super::onnx_yolo_detector::OnnxYoloDetector;

/// Loaded detection models. The gender model is optional: without it faces
/// are still counted, just not split by gender.
pub struct DetectionModels {
    pub faces: Box<dyn FaceDetector>,
    pub genders: Option<Box<dyn GenderClassifier>>,
}

pub type ModelLoader = Box<dyn FnOnce() -> Result<DetectionModels, String> + Send>;

/// Detection models resolved and loaded on a background thread at startup.
///
/// Readers check [`ModelCache::is_ready`] without blocking; the capture flow
/// passes that flag to the detector so a capture taken before the models
/// finish loading yields an empty result instead of waiting.
pub struct ModelCache {
    slot: Mutex<Option<Result<DetectionModels, String>>>,
    ready: Condvar,
    loaded: AtomicBool,
}

impl ModelCache {
    /// Start loading with `loader` on a background thread.
    pub fn spawn(loader: ModelLoader) -> Arc<Self> {
        let cache = Arc::new(Self::empty());
        let worker = cache.clone();
        thread::spawn(move || {
            let result = loader();
            match &result {
                Ok(_) => log::info!("Face detection models loaded"),
                Err(e) => log::warn!("Face detection unavailable: {e}"),
            }
            worker.store(result);
        });
        cache
    }

    /// Resolve (downloading if needed) and load the ONNX face and gender models.
    pub fn onnx(
        confidence: f64,
        bundled_dir: Option<PathBuf>,
        progress: Option<ProgressFn>,
    ) -> Arc<Self> {
        Self::spawn(Box::new(move || {
            let store = ModelStore::platform(bundled_dir).map_err(|e| e.to_string())?;
            let face_path = store
                .resolve(SUBJECT_MODEL, progress)
                .map_err(|e| e.to_string())?;
            let faces = OnnxYoloDetector::new(&face_path, confidence).map_err(|e| e.to_string())?;

            let genders = store
                .resolve(GENDER_MODEL, None)
                .map_err(|e| e.to_string())
                .and_then(|path| OnnxGenderAgeClassifier::new(&path).map_err(|e| e.to_string()));

            let genders: Option<Box<dyn GenderClassifier>> = match genders {
                Ok(classifier) => Some(Box::new(classifier)),
                Err(e) => {
                    log::warn!("Gender model unavailable, counting faces only: {e}");
                    None
                }
            };

            Ok(DetectionModels {
                faces: Box::new(faces),
                genders,
            })
        }))
    }

    /// A cache whose models are already available.
    pub fn preloaded(models: DetectionModels) -> Arc<Self> {
        let cache = Self::empty();
        cache.store(Ok(models));
        Arc::new(cache)
    }

    /// A cache that never becomes ready.
    pub fn unavailable(reason: &str) -> Arc<Self> {
        let cache = Self::empty();
        cache.store(Err(reason.to_string()));
        Arc::new(cache)
    }

    pub fn is_ready(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Block until loading finishes or `timeout` elapses. Returns readiness.
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        let guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let (_guard, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |slot| slot.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        self.is_ready()
    }

    /// Run `f` against the loaded models. `None` if they are not loaded.
    pub fn with_models<T>(&self, f: impl FnOnce(&mut DetectionModels) -> T) -> Option<T> {
        let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(Ok(models)) => Some(f(models)),
            _ => None,
        }
    }

    fn empty() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
            loaded: AtomicBool::new(false),
        }
    }

    fn store(&self, result: Result<DetectionModels, String>) {
        let ok = result.is_ok();
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        self.loaded.store(ok, Ordering::Release);
        self.ready.notify_all();
    }
}

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{
    GENDERAGE_MODEL_NAME, GENDERAGE_MODEL_URL, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};

/// Application directory name under the platform cache/config roots.
pub const APP_DIR_NAME: &str = "ChronoLens";

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create model directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no cache directory on this platform")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// A model file and where to fetch it from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelAsset {
    pub name: &'static str,
    pub url: &'static str,
}

pub const SUBJECT_MODEL: ModelAsset = ModelAsset {
    name: YOLO_MODEL_NAME,
    url: YOLO_MODEL_URL,
};

pub const GENDER_MODEL: ModelAsset = ModelAsset {
    name: GENDERAGE_MODEL_NAME,
    url: GENDERAGE_MODEL_URL,
};

/// Where model files live: a writable cache, optionally backed by a
/// read-only directory shipped alongside the binary.
#[derive(Debug, Clone)]
pub struct ModelStore {
    cache_dir: PathBuf,
    bundled_dir: Option<PathBuf>,
}

impl ModelStore {
    pub fn new(cache_dir: PathBuf, bundled_dir: Option<PathBuf>) -> Self {
        Self {
            cache_dir,
            bundled_dir,
        }
    }

    /// Store rooted at the platform cache directory.
    pub fn platform(bundled_dir: Option<PathBuf>) -> Result<Self, ModelResolveError> {
        Ok(Self::new(model_cache_dir()?, bundled_dir))
    }

    /// Local copy of `asset`, cache first, then the bundled directory.
    pub fn locate(&self, asset: ModelAsset) -> Option<PathBuf> {
        std::iter::once(self.cache_dir.as_path())
            .chain(self.bundled_dir.as_deref())
            .map(|dir| dir.join(asset.name))
            .find(|path| path.is_file())
    }

    /// Local copy of `asset`, downloading it into the cache when missing.
    pub fn resolve(
        &self,
        asset: ModelAsset,
        progress: Option<ProgressFn>,
    ) -> Result<PathBuf, ModelResolveError> {
        if let Some(path) = self.locate(asset) {
            return Ok(path);
        }

        log::info!("Downloading {} from {}", asset.name, asset.url);
        fs::create_dir_all(&self.cache_dir).map_err(|source| ModelResolveError::CreateDir {
            path: self.cache_dir.clone(),
            source,
        })?;
        let dest = self.cache_dir.join(asset.name);
        download(asset.url, &dest, progress)?;
        Ok(dest)
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/ChronoLens/models/`
/// - Linux: `$XDG_CACHE_HOME/ChronoLens/models/` or `~/.cache/ChronoLens/models/`
/// - Windows: `%LOCALAPPDATA%/ChronoLens/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    let root = if cfg!(target_os = "macos") {
        dirs::data_dir()
    } else {
        dirs::cache_dir()
    };
    root.map(|d| d.join(APP_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Downloads to a `.part` file renamed into place on success, so an
/// interrupted transfer never leaves a truncated model behind.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let partial = dest.with_extension("part");
    let result = fetch_to(url, &partial, progress).and_then(|()| {
        fs::rename(&partial, dest).map_err(|source| ModelResolveError::Write {
            path: dest.to_path_buf(),
            source,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

fn fetch_to(url: &str, path: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| ModelResolveError::Download {
            url: url.to_string(),
            source,
        })?;

    let write_err = |source| ModelResolveError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::create(path).map_err(write_err)?;
    let mut sink = ProgressWriter {
        inner: io::BufWriter::new(file),
        written: 0,
        total: response.content_length().unwrap_or(0),
        progress,
    };
    io::copy(&mut response, &mut sink).map_err(write_err)?;
    sink.flush().map_err(write_err)
}

/// Writer that reports the running byte count after each write.
struct ProgressWriter<W> {
    inner: W,
    written: u64,
    total: u64,
    progress: Option<ProgressFn>,
}

impl<W: Write> Write for ProgressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        if let Some(cb) = &self.progress {
            cb(self.written, self.total);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

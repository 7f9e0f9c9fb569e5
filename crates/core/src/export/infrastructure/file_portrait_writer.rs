use std::path::{Path, PathBuf};

use crate::era::domain::era::EraId;
use crate::export::domain::portrait_writer::{export_file_name, ExportError, PortraitWriter};
use crate::shared::encoded_image::EncodedImage;

/// Writes portraits as-is (no re-encode) to timestamped files.
pub struct FilePortraitWriter;

impl FilePortraitWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FilePortraitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PortraitWriter for FilePortraitWriter {
    fn write(&self, image: &EncodedImage, era: EraId, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let path = dir.join(export_file_name(era, timestamp_ms, image.extension()));
        std::fs::write(&path, image.bytes()).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

        log::info!("Saved portrait to {}", path.display());
        Ok(path)
    }
}

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::era::domain::era::EraId;
use crate::shared::constants::EXPORT_FILE_PREFIX;
use crate::shared::encoded_image::EncodedImage;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("there is no generated portrait to export")]
    NothingToExport,
}

/// `chronolens-{ERA_ID}-{timestamp_ms}.{ext}`
pub fn export_file_name(era: EraId, timestamp_ms: i64, extension: &str) -> String {
    format!("{EXPORT_FILE_PREFIX}-{}-{timestamp_ms}.{extension}", era.as_str())
}

/// Saves a generated portrait under a directory.
pub trait PortraitWriter: Send {
    /// Writes `image` into `dir`, returning the path written.
    fn write(&self, image: &EncodedImage, era: EraId, dir: &Path) -> Result<PathBuf, ExportError>;
}

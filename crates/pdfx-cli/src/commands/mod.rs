//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod output;
pub mod process;
pub mod rules;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use pdfx_core::models::config::PdfxConfig;
use pdfx_core::pdf::ExtractedImage;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pdfx")
        .join("config.json")
}

/// The `--config` path if given, otherwise the default location.
pub fn config_path(config: Option<&str>) -> PathBuf {
    config.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration used by a run.
///
/// An explicit `--config` must exist. Without one, the default file is used
/// when present and the built-in defaults otherwise.
pub fn load_config(config: Option<&str>) -> anyhow::Result<PdfxConfig> {
    if let Some(path) = config {
        debug!("Loading configuration from {}", path);
        return Ok(PdfxConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading configuration from {}", path.display());
        Ok(PdfxConfig::from_file(&path)?)
    } else {
        debug!("No configuration file, using defaults");
        Ok(PdfxConfig::default())
    }
}

/// Write a document's extracted text to `<dir>/<stem>_text.txt`.
pub fn save_text(dir: &Path, stem: &str, text: &str) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}_text.txt", stem));
    fs::write(&path, text)?;
    debug!("Wrote text to {}", path.display());
    Ok(path)
}

/// Write extracted images under `<dir>/images/`.
pub fn save_images(dir: &Path, stem: &str, images: &[ExtractedImage]) -> anyhow::Result<usize> {
    if images.is_empty() {
        return Ok(0);
    }

    let image_dir = dir.join("images");
    fs::create_dir_all(&image_dir)?;
    for image in images {
        let path = image_dir.join(image.file_name(stem));
        fs::write(&path, &image.data)?;
        debug!(
            "Wrote {}x{} image to {}",
            image.width,
            image.height,
            path.display()
        );
    }
    Ok(images.len())
}

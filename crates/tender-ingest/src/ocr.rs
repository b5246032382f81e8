use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use tender_core::{BackendError, Config, OcrEngine, RenderedPage};

/// Recognition through the `tesseract` command-line program.
///
/// Each page image is written to a temporary PNG and recognised with
/// `tesseract <png> stdout -l <languages>`.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    languages: String,
    dpi: u32,
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>, languages: impl Into<String>, dpi: u32) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
            dpi,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.tesseract_path.clone(),
            config.ocr_languages.clone(),
            config.ocr_dpi,
        )
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }

    /// True if the binary can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, page: &RenderedPage) -> Result<String, BackendError> {
        let mut image = tempfile::Builder::new()
            .prefix("tender-ocr-")
            .suffix(".png")
            .tempfile()?;
        image.write_all(&page.png)?;
        image.flush()?;

        let output = Command::new(&self.binary)
            .arg(image.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--dpi")
            .arg(self.dpi.to_string())
            .output()
            .map_err(|e| {
                BackendError::RecognitionError(format!(
                    "failed to run {}: {e}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::RecognitionError(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

//! Tesseract OCR fallback.
//!
//! Rasterizes a page with poppler's `pdftoppm` and recognizes it with the
//! `tesseract` command-line binary. Each invocation is independent; no
//! engine state is shared across workers.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use tempfile::TempDir;
use tracing::{debug, trace};

use super::{OcrProvider, Result};
use crate::error::OcrError;

/// OCR provider shelling out to pdftoppm and tesseract.
pub struct TesseractOcr {
    dpi: u32,
    languages: String,
}

impl TesseractOcr {
    pub fn new(dpi: u32, languages: impl Into<String>) -> Self {
        Self {
            dpi,
            languages: languages.into(),
        }
    }

    /// Convert one PDF page to a PNG in `output_dir`.
    fn rasterize(&self, pdf_path: &Path, page: u32, output_dir: &Path) -> Result<PathBuf> {
        let page_str = page.to_string();
        let output_prefix = output_dir.join("page");

        let status = Command::new("pdftoppm")
            .args(["-png", "-r", &self.dpi.to_string(), "-f", &page_str, "-l", &page_str])
            .arg(pdf_path)
            .arg(&output_prefix)
            .status();

        match status {
            Ok(s) if s.success() => self.find_page_image(output_dir, page).ok_or_else(|| {
                OcrError::Raster {
                    page,
                    reason: "no image generated".to_string(),
                }
            }),
            Ok(s) => Err(OcrError::Raster {
                page,
                reason: format!("pdftoppm exited with {}", s),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::MissingBinary {
                binary: "pdftoppm".to_string(),
                hint: "install poppler-utils".to_string(),
            }),
            Err(e) => Err(OcrError::Io(e)),
        }
    }

    /// Find the image file pdftoppm wrote for a page.
    fn find_page_image(&self, temp_path: &Path, page: u32) -> Option<PathBuf> {
        // pdftoppm pads the page number: page-01.png, page-001.png, ...
        for digits in [1, 2, 3, 4] {
            let filename = format!("page-{:0width$}.png", page, width = digits);
            let path = temp_path.join(&filename);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Run tesseract on an image file.
    fn recognize(&self, image_path: &Path, page: u32) -> Result<String> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.languages])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => Err(OcrError::Recognition {
                page,
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::MissingBinary {
                binary: "tesseract".to_string(),
                hint: "install tesseract-ocr".to_string(),
            }),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl OcrProvider for TesseractOcr {
    fn page_text(&self, pdf_path: &Path, page: u32) -> Result<String> {
        let start = Instant::now();

        let temp_dir = TempDir::new()?;
        let image_path = self.rasterize(pdf_path, page, temp_dir.path())?;
        trace!("rasterized page {} to {}", page, image_path.display());

        let text = self.recognize(&image_path, page)?;
        debug!(
            "OCR of {} page {} took {}ms, {} chars",
            pdf_path.display(),
            page,
            start.elapsed().as_millis(),
            text.len()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_page_image_handles_padding() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-003.png"), b"").unwrap();

        let ocr = TesseractOcr::new(300, "rus+eng");
        let found = ocr.find_page_image(dir.path(), 3).unwrap();
        assert_eq!(found, dir.path().join("page-003.png"));
        assert!(ocr.find_page_image(dir.path(), 4).is_none());
    }
}

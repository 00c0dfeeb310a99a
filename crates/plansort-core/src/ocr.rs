//! OCR engine backends.
//!
//! Two concerns cross this boundary: per-image orientation detection (OSD)
//! and rendering a batch of page images into one searchable PDF. Both shell
//! out to tesseract in the concrete backend.

use crate::error::PlansortError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Language the OCR engine is configured for. Fixed, not runtime config.
pub const OCR_LANG: &str = "nld";

/// Trait for OCR engine backends.
pub trait OcrEngine: Send + Sync {
    /// Detect the rotation (degrees, clockwise) needed to bring the page
    /// image upright. `Ok(None)` means the detector could not make a call,
    /// which is an expected, recoverable outcome; `Err` is reserved for real
    /// failures such as a missing engine binary.
    fn detect_orientation(&self, image: &Path) -> Result<Option<i32>, PlansortError>;

    /// Render `images`, in order, into a single searchable PDF written to
    /// `<output_base>.pdf`, using sparse-text page segmentation.
    fn render_searchable_pdf(
        &self,
        images: &[PathBuf],
        output_base: &Path,
        text_only: bool,
    ) -> Result<(), PlansortError>;

    /// Name of this engine backend (for diagnostics).
    fn engine_name(&self) -> &str;
}

/// Accumulates the inputs for one searchable-PDF render.
///
/// `build` validates before touching the engine: at least one image and an
/// output base path are required, and violating either is a configuration
/// error raised before any processing begins.
#[derive(Default)]
pub struct SearchablePdfBuilder {
    images: Vec<PathBuf>,
    output_base: Option<PathBuf>,
    text_only: bool,
}

impl SearchablePdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_image(mut self, image: PathBuf) -> Self {
        self.images.push(image);
        self
    }

    pub fn output_base(mut self, path: PathBuf) -> Self {
        self.output_base = Some(path);
        self
    }

    pub fn text_only(mut self, text_only: bool) -> Self {
        self.text_only = text_only;
        self
    }

    /// Render via `engine` and return the path of the finished PDF.
    pub fn build(self, engine: &dyn OcrEngine) -> Result<PathBuf, PlansortError> {
        if self.images.is_empty() {
            return Err(PlansortError::NoImages);
        }
        let output_base = self.output_base.ok_or(PlansortError::NoOutputFile)?;

        engine.render_searchable_pdf(&self.images, &output_base, self.text_only)?;
        Ok(output_base.with_extension("pdf"))
    }
}

/// OCR backend shelling out to the tesseract binary.
pub struct TesseractEngine {
    lang: String,
}

impl TesseractEngine {
    pub fn new() -> Self {
        TesseractEngine {
            lang: OCR_LANG.to_string(),
        }
    }

    /// Check if tesseract is available on the system.
    pub fn is_available() -> bool {
        Command::new("tesseract")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn detect_orientation(&self, image: &Path) -> Result<Option<i32>, PlansortError> {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .args(["--psm", "0", "-l", &self.lang])
            .output()
            .map_err(|e| map_spawn_error(e, "tesseract", "tesseract-ocr"))?;

        if !output.status.success() {
            // OSD refuses pages with too little text; that is the expected
            // failure mode for sparse drawings, not a run-stopping error.
            tracing::debug!(
                image = %image.display(),
                stderr = %String::from_utf8_lossy(&output.stderr),
                "orientation detection failed"
            );
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_osd_rotation(&stdout))
    }

    fn render_searchable_pdf(
        &self,
        images: &[PathBuf],
        output_base: &Path,
        text_only: bool,
    ) -> Result<(), PlansortError> {
        // The image list file lives in a scoped scratch dir so it is removed
        // on every exit path, error or not.
        let scratch = tempfile::tempdir()?;
        let list_path = scratch.path().join("pages.txt");
        let mut list = String::new();
        for image in images {
            list.push_str(&image.to_string_lossy());
            list.push('\n');
        }
        std::fs::write(&list_path, list)?;

        let mut cmd = Command::new("tesseract");
        cmd.arg(&list_path)
            .arg(output_base)
            .args(["-l", &self.lang, "--psm", "11"]);
        if text_only {
            cmd.args(["-c", "textonly_pdf=1"]);
        }
        cmd.arg("pdf");

        let output = cmd
            .output()
            .map_err(|e| map_spawn_error(e, "tesseract", "tesseract-ocr"))?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(PlansortError::ToolFailed {
                tool: "tesseract",
                code,
                stderr,
            });
        }

        Ok(())
    }

    fn engine_name(&self) -> &str {
        "tesseract"
    }
}

fn map_spawn_error(
    e: std::io::Error,
    tool: &'static str,
    package: &'static str,
) -> PlansortError {
    if e.kind() == std::io::ErrorKind::NotFound {
        PlansortError::ToolNotFound { tool, package }
    } else {
        PlansortError::Io(e)
    }
}

/// Pull the `Rotate: N` line out of tesseract's OSD report.
fn parse_osd_rotation(osd: &str) -> Option<i32> {
    osd.lines().find_map(|line| {
        line.trim()
            .strip_prefix("Rotate:")
            .and_then(|rest| rest.trim().parse::<i32>().ok())
    })
}

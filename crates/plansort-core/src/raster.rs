use crate::error::PlansortError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolution used when rasterizing input pages for OCR.
pub const RASTER_DPI: u32 = 200;

/// Trait for PDF page rasterization backends.
pub trait PageRasterizer: Send + Sync {
    /// Render every page of `pdf` into `out_dir` as an image file, one per
    /// page, returning the image paths in page order. A PDF that yields no
    /// pages at all is an error; partial per-page recovery is not attempted.
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, PlansortError>;

    /// Name of this rasterization backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Rasterization backend using pdftoppm (from poppler-utils).
pub struct PdftoppmRasterizer {
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new() -> Self {
        PdftoppmRasterizer { dpi: RASTER_DPI }
    }

    /// Check if pdftoppm is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftoppm")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, PlansortError> {
        let prefix = out_dir.join("page");

        let output = Command::new("pdftoppm")
            .args(["-jpeg", "-r", &self.dpi.to_string()])
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PlansortError::ToolNotFound {
                        tool: "pdftoppm",
                        package: "poppler-utils",
                    }
                } else {
                    PlansortError::Io(e)
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(PlansortError::ToolFailed {
                tool: "pdftoppm",
                code,
                stderr,
            });
        }

        let pages = collect_page_images(out_dir)?;
        if pages.is_empty() {
            return Err(PlansortError::NoPageImages(pdf.to_path_buf()));
        }

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}

/// Collect the `page-*.jpg` files pdftoppm wrote, in page order.
///
/// pdftoppm zero-pads the page number uniformly within one invocation, so a
/// lexicographic sort restores page order.
fn collect_page_images(out_dir: &Path) -> Result<Vec<PathBuf>, PlansortError> {
    let mut pages: Vec<PathBuf> = std::fs::read_dir(out_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("page-") && n.ends_with(".jpg"))
                    .unwrap_or(false)
        })
        .collect();
    pages.sort();
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_page_images_in_page_order() {
        let dir = tempfile::tempdir().unwrap();
        // Out-of-order creation; padding is what keeps the sort correct.
        for name in ["page-03.jpg", "page-01.jpg", "page-02.jpg"] {
            std::fs::write(dir.path().join(name), b"jpg").unwrap();
        }
        // Stray files must not be picked up.
        std::fs::write(dir.path().join("pages.txt"), b"list").unwrap();

        let pages = collect_page_images(dir.path()).unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["page-01.jpg", "page-02.jpg", "page-03.jpg"]);
    }

    #[test]
    fn empty_directory_yields_no_images() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_page_images(dir.path()).unwrap().is_empty());
    }
}

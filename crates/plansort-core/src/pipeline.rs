//! Pipeline orchestration.
//!
//! Drives rasterize → orient → OCR render → extract+route over the input
//! files, strictly sequentially, then archives each processed input and
//! purges the temp directory. All filesystem side effects happen here or in
//! the router; the component backends stay side-effect free beyond their own
//! outputs.

use crate::error::PlansortError;
use crate::event::EventSink;
use crate::layout::LayoutExtractor;
use crate::ocr::{OcrEngine, SearchablePdfBuilder};
use crate::orient;
use crate::raster::PageRasterizer;
use crate::route;
use crate::title;
use lopdf::Document;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Tally of one completed run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub files_processed: usize,
    pub pages_filed: usize,
    pub pages_manual: usize,
}

/// One batch run over a snapshot of the input directory.
///
/// Constructed via [`Pipeline::build`], which performs the directory
/// validation and enumerates the input files once; files added afterwards
/// are ignored. A pipeline instance assumes exclusive ownership of the
/// temp, output, manual and finished directories while it runs.
pub struct Pipeline {
    in_file_paths: Vec<PathBuf>,
    dir_out: PathBuf,
    dir_manual: PathBuf,
    dir_temp: PathBuf,
    dir_finished: PathBuf,
    file_index: usize,
}

impl Pipeline {
    /// Validate the directory layout and enumerate the input files.
    ///
    /// The input directory must exist and be a directory; the other four are
    /// created if missing. Fails without side effects on the input tree.
    pub fn build(
        dir_in: &Path,
        dir_out: &Path,
        dir_manual: &Path,
        dir_temp: &Path,
        dir_finished: &Path,
    ) -> Result<Pipeline, PlansortError> {
        tracing::info!(path = %dir_in.display(), "checking input directory");
        if !dir_in.exists() {
            return Err(PlansortError::InputDirMissing(dir_in.to_path_buf()));
        }
        if !dir_in.is_dir() {
            return Err(PlansortError::InputDirNotDirectory(dir_in.to_path_buf()));
        }

        for dir in [dir_out, dir_manual, dir_temp, dir_finished] {
            tracing::info!(path = %dir.display(), "ensuring directory exists");
            std::fs::create_dir_all(dir)?;
        }

        tracing::info!(path = %dir_in.display(), "enumerating input files");
        let mut in_file_paths: Vec<PathBuf> = std::fs::read_dir(dir_in)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        // Directory order is filesystem-dependent; sort for deterministic runs.
        in_file_paths.sort();
        tracing::info!(count = in_file_paths.len(), "found input files");

        Ok(Pipeline {
            in_file_paths,
            dir_out: dir_out.to_path_buf(),
            dir_manual: dir_manual.to_path_buf(),
            dir_temp: dir_temp.to_path_buf(),
            dir_finished: dir_finished.to_path_buf(),
            file_index: 0,
        })
    }

    /// Number of input files in this run's snapshot.
    pub fn file_count(&self) -> usize {
        self.in_file_paths.len()
    }

    /// Process every enumerated input file, then clean up.
    ///
    /// Files are processed one at a time, pages one at a time; there is no
    /// internal parallelism and no cancellation. Any unrecovered error aborts
    /// the whole run: already-archived inputs stay archived, unprocessed ones
    /// stay in the input directory, so a re-run picks up where this one
    /// stopped.
    pub fn run(
        &mut self,
        rasterizer: &dyn PageRasterizer,
        ocr: &dyn OcrEngine,
        layout: &dyn LayoutExtractor,
        sink: &EventSink,
    ) -> Result<RunSummary, PlansortError> {
        let mut summary = RunSummary::default();

        for index in 0..self.in_file_paths.len() {
            self.file_index = index;
            let in_file = self.in_file_paths[index].clone();

            let temp_pdf = self.ocr_input_file(&in_file, rasterizer, ocr, sink)?;
            self.process_temp_file(&temp_pdf, layout, sink, &mut summary)?;
            self.archive_input_file(&in_file, sink)?;
            summary.files_processed += 1;
        }

        self.file_index = self.in_file_paths.len();
        self.clear_temp_files(sink)?;
        self.emit_status(sink, "Finished");

        Ok(summary)
    }

    /// Rasterize one input file, correct page orientation and render the
    /// searchable PDF into the temp directory. Returns the temp PDF path.
    fn ocr_input_file(
        &self,
        in_file: &Path,
        rasterizer: &dyn PageRasterizer,
        ocr: &dyn OcrEngine,
        sink: &EventSink,
    ) -> Result<PathBuf, PlansortError> {
        let message = format!("Obtaining images from PDF file {}", in_file.display());
        self.emit_status(sink, &message);
        sink.log(&message);

        // Page images live in a scratch dir under temp that is removed when
        // this function returns, on the error path included.
        let raster_dir = tempfile::tempdir_in(&self.dir_temp)?;
        let images = rasterizer.rasterize(in_file, raster_dir.path())?;

        let mut builder = SearchablePdfBuilder::new();
        for (page_index, image) in images.iter().enumerate() {
            self.emit_status(
                sink,
                format!(
                    "Detecting orientation of page {page_index} from file {}",
                    in_file.display()
                ),
            );
            let angle = match ocr.detect_orientation(image)? {
                Some(angle) => {
                    sink.log(format!(
                        "Detected orientation of angle {angle} for page {page_index}"
                    ));
                    angle
                }
                None => {
                    sink.log(format!(
                        "Orientation detection failed for page {page_index}"
                    ));
                    0
                }
            };

            sink.log(format!("Rotating page {page_index} by angle {angle}"));
            self.emit_status(
                sink,
                format!(
                    "Rotating page {page_index} from file {} by {angle}",
                    in_file.display()
                ),
            );
            orient::rotate_upright(image, angle)?;

            sink.log(format!("Adding page {page_index} to output pdf"));
            builder = builder.add_image(image.clone());
        }

        self.emit_status(sink, format!("Performing OCR on file {}", in_file.display()));
        let stem = in_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let output_base = self.dir_temp.join(stem);
        let temp_pdf = builder.output_base(output_base).build(ocr)?;

        sink.log(format!(
            "Finished OCR for file with path {}, wrote OCR'ed file to path {}",
            in_file.display(),
            temp_pdf.display()
        ));
        Ok(temp_pdf)
    }

    /// Re-open the OCR output and route every page.
    fn process_temp_file(
        &self,
        temp_pdf: &Path,
        layout: &dyn LayoutExtractor,
        sink: &EventSink,
        summary: &mut RunSummary,
    ) -> Result<(), PlansortError> {
        sink.log(format!("Opening temp file {}", temp_pdf.display()));
        let doc = Document::load(temp_pdf)?;

        sink.log(format!("Reading temp file {}", temp_pdf.display()));
        let pages = layout.extract_pages(temp_pdf)?;

        // Pair reader pages with layout pages at the same index. get_pages()
        // is ordered by page number, and the layouts come back in page order.
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        for (page_number, page_layout) in page_numbers.into_iter().zip(pages.iter()) {
            self.process_page(&doc, page_number, page_layout, sink, summary)?;
        }

        Ok(())
    }

    /// Classify one page by its title block and write it to its destination.
    fn process_page(
        &self,
        doc: &Document,
        page_number: u32,
        page: &crate::layout::PageLayout,
        sink: &EventSink,
        summary: &mut RunSummary,
    ) -> Result<(), PlansortError> {
        sink.log("Getting all text elements in page");
        sink.log(format!(
            "Found {} text elements on page {} of pdf file",
            page.blocks.len(),
            page.page_number
        ));

        sink.log("Attempting to find title of document");
        let title = title::find_title(page);
        match &title {
            Some(title) => {
                sink.log(format!(
                    "Detected project number {} and drawing number {} for page {}",
                    title.project_nr, title.drawing_nr, page.page_number
                ));
                summary.pages_filed += 1;
            }
            None => {
                sink.log(format!(
                    "Failed to detect title for page {}",
                    page.page_number
                ));
                summary.pages_manual += 1;
            }
        }

        let dest = route::route_page(
            doc,
            page_number,
            title.as_ref(),
            &self.dir_out,
            &self.dir_manual,
        )?;
        sink.log(format!(
            "Wrote page {} to {}",
            page.page_number,
            dest.display()
        ));
        Ok(())
    }

    /// Move a fully processed input file into the finished directory.
    fn archive_input_file(&self, in_file: &Path, sink: &EventSink) -> Result<(), PlansortError> {
        let file_name = in_file
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("unnamed.pdf"));
        let dest = self.dir_finished.join(file_name);
        sink.log(format!(
            "Moving in file {} to {}",
            in_file.display(),
            dest.display()
        ));
        std::fs::rename(in_file, dest)?;
        Ok(())
    }

    /// Delete every file under the temp directory.
    fn clear_temp_files(&self, sink: &EventSink) -> Result<(), PlansortError> {
        sink.log("Clearing temp files");
        for entry in std::fs::read_dir(&self.dir_temp)? {
            let path = entry?.path();
            if path.is_file() {
                sink.log(format!("Unlinking temp file {}", path.display()));
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn emit_status(&self, sink: &EventSink, message: impl Into<String>) {
        let progress = progress_percent(self.file_index, self.in_file_paths.len());
        sink.status(progress, message);
    }
}

/// Overall progress after starting file `processed` of `total`, as a
/// truncated percentage. An empty run is complete from the start.
pub fn progress_percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (processed as f64 / total as f64) * 100.0;
    percent.min(100.0) as u8
}

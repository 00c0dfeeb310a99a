//! Conversion and filing pipeline for scanned engineering drawings.
//!
//! One run rasterizes each input PDF, corrects page rotation via OCR
//! orientation detection, renders a searchable PDF, then files every page by
//! the project/drawing number found in its title block. Pages without a
//! parsable title go to a manual-review folder; processed inputs are
//! archived and temp files purged.
//!
//! The external transforms (rasterization, OCR, layout extraction) sit
//! behind traits so the pipeline can be driven without poppler or tesseract
//! installed; the shipped backends shell out to those tools.

pub mod error;
pub mod event;
pub mod layout;
pub mod ocr;
pub mod orient;
pub mod pipeline;
pub mod raster;
pub mod route;
pub mod title;

pub use error::PlansortError;
pub use event::{EventSink, PipelineEvent};
pub use pipeline::{Pipeline, RunSummary};

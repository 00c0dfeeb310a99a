//! Title block detection.
//!
//! This drawing format carries its title block at a fixed spot on the page;
//! any text block whose center falls within a small radius of that spot is a
//! title candidate.

use crate::layout::PageLayout;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Where the title block sits on this drawing format, in PDF points.
pub const TITLE_DETECT_CENTER_X: f32 = 730.98;
pub const TITLE_DETECT_CENTER_Y: f32 = 64.752;
pub const TITLE_DETECT_TOLERANCE: f32 = 15.0;

/// A leading integer project number, a dot, then a drawing number that may
/// itself contain dots (e.g. `12345.6.7`). Deliberately permissive: any
/// `[0-9.]` run is accepted as a drawing number.
static TITLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)\.([0-9.]+)").expect("title pattern compiles"));

/// Project/drawing number pair parsed from a title block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleMatch {
    pub project_nr: String,
    pub drawing_nr: String,
}

/// Find the title of a page, if any.
///
/// Candidate selection is first-found in layout-extraction order, not
/// nearest-by-distance: exactly one title element is expected in-region, and
/// when several exist the first wins. A page whose first in-region block
/// fails the pattern has no title, even if a matching block follows.
pub fn find_title(page: &PageLayout) -> Option<TitleMatch> {
    let block = page.blocks.iter().find(|block| {
        let (cx, cy) = block.bbox.center();
        let dx = cx - TITLE_DETECT_CENTER_X;
        let dy = cy - TITLE_DETECT_CENTER_Y;
        (dx * dx + dy * dy).sqrt() <= TITLE_DETECT_TOLERANCE
    })?;

    parse_title(&block.text)
}

/// Match the project/drawing number pattern anywhere in `text`.
pub fn parse_title(text: &str) -> Option<TitleMatch> {
    let caps = TITLE_PATTERN.captures(text)?;
    Some(TitleMatch {
        project_nr: caps[1].to_string(),
        drawing_nr: caps[2].to_string(),
    })
}

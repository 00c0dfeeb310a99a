//! Geometric text layout extraction.
//!
//! Re-opens the OCR output PDF and recovers, per page, the text blocks with
//! their bounding boxes. The concrete backend runs `pdftotext -bbox-layout`
//! and scans its XML report line by line; only page, block and word tags
//! carry information we need, so a full XML parser is not warranted.

use crate::error::PlansortError;
use std::path::Path;
use std::process::Command;

/// Axis-aligned bounding box in PDF points, origin at the bottom-left of the
/// page (y grows upward).
#[derive(Debug, Clone, PartialEq)]
pub struct BBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BBox {
    pub fn center(&self) -> (f32, f32) {
        (
            (self.x_max - self.x_min) / 2.0 + self.x_min,
            (self.y_max - self.y_min) / 2.0 + self.y_min,
        )
    }
}

/// One contiguous run of text on a page.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub text: String,
    pub bbox: BBox,
}

/// Text layout of a single page.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub page_number: usize,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<TextBlock>,
}

/// Trait for geometric text layout extraction backends.
pub trait LayoutExtractor: Send + Sync {
    /// Extract the text layout of every page of `pdf`, in page order.
    fn extract_pages(&self, pdf: &Path) -> Result<Vec<PageLayout>, PlansortError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Layout extraction backend using pdftotext (from poppler-utils).
pub struct PdftotextLayout;

impl PdftotextLayout {
    pub fn new() -> Self {
        PdftotextLayout
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutExtractor for PdftotextLayout {
    fn extract_pages(&self, pdf: &Path) -> Result<Vec<PageLayout>, PlansortError> {
        let output = Command::new("pdftotext")
            .arg("-bbox-layout")
            .arg(pdf)
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PlansortError::ToolNotFound {
                        tool: "pdftotext",
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
                tool: "pdftotext",
                code,
                stderr,
            });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        Ok(parse_layout_xml(&xml))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Parse pdftotext's `-bbox-layout` XML into per-page text blocks.
///
/// The report's y-axis runs top-down; boxes are flipped into bottom-left
/// origin coordinates using the page height, so downstream geometry works in
/// ordinary PDF space.
fn parse_layout_xml(xml: &str) -> Vec<PageLayout> {
    let mut pages: Vec<PageLayout> = Vec::new();
    let mut current_block: Option<BBox> = None;
    let mut current_words: Vec<String> = Vec::new();

    for raw in xml.lines() {
        let line = raw.trim();

        if line.starts_with("<page ") {
            pages.push(PageLayout {
                page_number: pages.len() + 1,
                width: parse_attr_f32(line, "width").unwrap_or(0.0),
                height: parse_attr_f32(line, "height").unwrap_or(0.0),
                blocks: Vec::new(),
            });
            continue;
        }

        if line.starts_with("<block ") {
            current_block = parse_bbox(line);
            current_words.clear();
            continue;
        }

        if line.starts_with("<word ") {
            if let Some(word_text) = parse_word_text(line) {
                let w = decode_xml_entities(&word_text).trim().to_string();
                if !w.is_empty() {
                    current_words.push(w);
                }
            }
            continue;
        }

        if line.starts_with("</block>") {
            if let (Some(page), Some(bbox)) = (pages.last_mut(), current_block.take()) {
                let text = current_words.join(" ");
                if !text.is_empty() {
                    page.blocks.push(TextBlock {
                        text,
                        bbox: flip_y(bbox, page.height),
                    });
                }
            }
            current_words.clear();
        }
    }

    pages
}

/// Convert a top-down box to bottom-left-origin PDF coordinates.
fn flip_y(bbox: BBox, page_height: f32) -> BBox {
    BBox {
        x_min: bbox.x_min,
        y_min: page_height - bbox.y_max,
        x_max: bbox.x_max,
        y_max: page_height - bbox.y_min,
    }
}

fn parse_attr_f32(tag: &str, name: &str) -> Option<f32> {
    parse_attr(tag, name)?.parse().ok()
}

fn parse_attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{}=\"", name);
    let start = tag.find(&needle)? + needle.len();
    let rest = &tag[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn parse_bbox(tag: &str) -> Option<BBox> {
    Some(BBox {
        x_min: parse_attr_f32(tag, "xMin")?,
        y_min: parse_attr_f32(tag, "yMin")?,
        x_max: parse_attr_f32(tag, "xMax")?,
        y_max: parse_attr_f32(tag, "yMax")?,
    })
}

fn parse_word_text(word_tag: &str) -> Option<String> {
    let start = word_tag.find('>')? + 1;
    let end = word_tag.rfind("</word>")?;
    Some(word_tag[start..end].to_string())
}

fn decode_xml_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blocks_with_flipped_coordinates() {
        let xml = r#"
<doc>
  <page width="841.89" height="595.276">
    <flow>
      <block xMin="100.0" yMin="500.0" xMax="200.0" yMax="520.0">
        <line xMin="100.0" yMin="500.0" xMax="200.0" yMax="520.0">
          <word xMin="100.0" yMin="500.0" xMax="150.0" yMax="520.0">12345.6.7</word>
          <word xMin="152.0" yMin="500.0" xMax="200.0" yMax="520.0">A&amp;B</word>
        </line>
      </block>
    </flow>
  </page>
</doc>
"#;
        let pages = parse_layout_xml(xml);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].width, 841.89);

        let block = &pages[0].blocks[0];
        assert_eq!(block.text, "12345.6.7 A&B");
        assert_eq!(block.bbox.x_min, 100.0);
        // 595.276 - 520.0 and 595.276 - 500.0: top-down flipped to PDF space.
        assert!((block.bbox.y_min - 75.276).abs() < 1e-3);
        assert!((block.bbox.y_max - 95.276).abs() < 1e-3);
    }

    #[test]
    fn empty_blocks_are_dropped() {
        let xml = r#"
  <page width="100" height="100">
      <block xMin="1" yMin="1" xMax="2" yMax="2">
      </block>
  </page>
"#;
        let pages = parse_layout_xml(xml);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].blocks.is_empty());
    }

    #[test]
    fn pages_are_numbered_in_order() {
        let xml = "<page width=\"10\" height=\"10\">\n</page>\n<page width=\"20\" height=\"20\">\n</page>\n";
        let pages = parse_layout_xml(xml);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[1].page_number, 2);
        assert_eq!(pages[1].width, 20.0);
    }

    #[test]
    fn bbox_center() {
        let b = BBox {
            x_min: 10.0,
            y_min: 20.0,
            x_max: 30.0,
            y_max: 40.0,
        };
        assert_eq!(b.center(), (20.0, 30.0));
    }
}

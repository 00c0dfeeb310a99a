//! Page routing: writing classified pages to their destinations.
//!
//! Each page of the OCR output becomes exactly one standalone single-page
//! PDF: under the project tree when a title was found, in the manual-review
//! folder otherwise.

use crate::error::PlansortError;
use crate::title::TitleMatch;
use chrono::Utc;
use lopdf::Document;
use std::path::{Path, PathBuf};

/// Bucket directory name for a project number: first two characters, the
/// rest replaced by `X`. Short project numbers get no filler at all.
pub fn masked_prefix(project_nr: &str) -> String {
    let prefix: String = project_nr.chars().take(2).collect();
    let fill = project_nr.chars().count().saturating_sub(2);
    format!("{}{}", prefix, "X".repeat(fill))
}

/// Destination for a successfully classified page:
/// `out_dir/<masked-prefix>/<project_nr>/<project_nr>.<drawing_nr>.pdf`.
pub fn success_path(out_dir: &Path, title: &TitleMatch) -> PathBuf {
    out_dir
        .join(masked_prefix(&title.project_nr))
        .join(&title.project_nr)
        .join(format!("{}.{}.pdf", title.project_nr, title.drawing_nr))
}

/// Destination for an unclassifiable page: `manual_dir/<unix-time>.pdf`.
/// The timestamp is the only collision handling there is.
pub fn manual_path(manual_dir: &Path) -> PathBuf {
    let now = Utc::now();
    manual_dir.join(format!(
        "{}.{}.pdf",
        now.timestamp(),
        now.timestamp_subsec_micros()
    ))
}

/// Write page `page_number` of `doc` to its destination and return the path.
///
/// Success routing creates the intermediate directories; an existing file at
/// the destination is silently overwritten. Write failures propagate.
pub fn route_page(
    doc: &Document,
    page_number: u32,
    title: Option<&TitleMatch>,
    out_dir: &Path,
    manual_dir: &Path,
) -> Result<PathBuf, PlansortError> {
    let dest = match title {
        Some(title) => {
            let path = success_path(out_dir, title);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            path
        }
        None => manual_path(manual_dir),
    };

    write_single_page(doc, page_number, &dest)?;
    Ok(dest)
}

/// Serialize a brand-new PDF containing only `page_number` of `doc`.
fn write_single_page(
    doc: &Document,
    page_number: u32,
    dest: &Path,
) -> Result<(), PlansortError> {
    let total = doc.get_pages().len() as u32;
    let others: Vec<u32> = (1..=total).filter(|&n| n != page_number).collect();

    let mut single = doc.clone();
    single.delete_pages(&others);
    single.prune_objects();
    single.save(dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    fn make_pdf(pages: usize) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::new();
        for _ in 0..pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![0.into(), 0.into(), 842.into(), 595.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn title(project: &str, drawing: &str) -> TitleMatch {
        TitleMatch {
            project_nr: project.to_string(),
            drawing_nr: drawing.to_string(),
        }
    }

    #[test]
    fn masks_all_but_first_two_characters() {
        assert_eq!(masked_prefix("12345"), "12XXX");
        assert_eq!(masked_prefix("123"), "12X");
        assert_eq!(masked_prefix("12"), "12");
    }

    #[test]
    fn short_project_numbers_get_no_filler() {
        // len - 2 would be negative; it must clamp to zero.
        assert_eq!(masked_prefix("7"), "7");
        assert_eq!(masked_prefix(""), "");
    }

    #[test]
    fn success_path_layout() {
        let path = success_path(Path::new("/out"), &title("12345", "6.7"));
        assert_eq!(path, PathBuf::from("/out/12XXX/12345/12345.6.7.pdf"));
    }

    #[test]
    fn manual_path_is_a_timestamped_pdf() {
        let path = manual_path(Path::new("/manual"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with(".pdf"));
        let stem = name.trim_end_matches(".pdf");
        let (secs, micros) = stem.split_once('.').unwrap();
        assert!(secs.parse::<i64>().is_ok());
        assert!(micros.parse::<u32>().is_ok());
    }

    #[test]
    fn routes_titled_page_into_project_tree() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let manual = dir.path().join("manual");
        std::fs::create_dir_all(&manual).unwrap();

        let doc = make_pdf(3);
        let dest = route_page(&doc, 2, Some(&title("100", "1.0")), &out, &manual).unwrap();

        assert_eq!(dest, out.join("10X").join("100").join("100.1.0.pdf"));
        let written = Document::load(&dest).unwrap();
        assert_eq!(written.get_pages().len(), 1);
        assert_eq!(std::fs::read_dir(&manual).unwrap().count(), 0);
    }

    #[test]
    fn routes_untitled_page_to_manual_review() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let manual = dir.path().join("manual");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::create_dir_all(&manual).unwrap();

        let doc = make_pdf(1);
        let dest = route_page(&doc, 1, None, &out, &manual).unwrap();

        assert_eq!(dest.parent().unwrap(), manual);
        let written = Document::load(&dest).unwrap();
        assert_eq!(written.get_pages().len(), 1);
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn existing_destination_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let manual = dir.path().join("manual");
        std::fs::create_dir_all(&manual).unwrap();

        let doc = make_pdf(2);
        let t = title("100", "1.0");
        let first = route_page(&doc, 1, Some(&t), &out, &manual).unwrap();
        let second = route_page(&doc, 2, Some(&t), &out, &manual).unwrap();
        assert_eq!(first, second);
        assert!(Document::load(&second).is_ok());
    }
}

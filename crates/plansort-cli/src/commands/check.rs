use plansort_core::error::PlansortError;
use plansort_core::layout::PdftotextLayout;
use plansort_core::ocr::TesseractEngine;
use plansort_core::raster::PdftoppmRasterizer;

pub fn run() -> Result<(), PlansortError> {
    let tools: [(&str, bool, &str); 3] = [
        (
            "pdftoppm",
            PdftoppmRasterizer::is_available(),
            "poppler-utils",
        ),
        (
            "tesseract",
            TesseractEngine::is_available(),
            "tesseract-ocr (with the nld language data)",
        ),
        (
            "pdftotext",
            PdftotextLayout::is_available(),
            "poppler-utils",
        ),
    ];

    let mut all_ok = true;
    for (tool, available, package) in tools {
        if available {
            println!("{tool}: ok");
        } else {
            println!("{tool}: missing (install {package})");
            all_ok = false;
        }
    }

    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}

use plansort_core::error::PlansortError;
use plansort_core::event::{EventSink, PipelineEvent};
use plansort_core::layout::PdftotextLayout;
use plansort_core::ocr::TesseractEngine;
use plansort_core::pipeline::Pipeline;
use plansort_core::raster::PdftoppmRasterizer;
use std::path::PathBuf;

pub fn run(
    in_dir: PathBuf,
    out_dir: PathBuf,
    manual_dir: PathBuf,
    temp_dir: PathBuf,
    finished_dir: PathBuf,
    output_format: &str,
) -> Result<(), PlansortError> {
    // Validation happens here, before the background thread starts, so
    // configuration errors surface immediately.
    let mut pipeline = Pipeline::build(&in_dir, &out_dir, &manual_dir, &temp_dir, &finished_dir)?;

    let (sink, rx) = EventSink::channel();

    // The pipeline blocks on OCR for long stretches; run it on its own
    // thread and consume events here as they arrive.
    let handle = std::thread::spawn(move || {
        let rasterizer = PdftoppmRasterizer::new();
        let engine = TesseractEngine::new();
        let layout = PdftotextLayout::new();
        pipeline.run(&rasterizer, &engine, &layout, &sink)
    });

    let json = output_format == "json";
    for event in rx {
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            match &event {
                PipelineEvent::Status { progress, message } => {
                    println!("[{progress:>3}%] {message}");
                }
                PipelineEvent::Log { timestamp, message } => {
                    println!("{timestamp:.3}  {message}");
                }
            }
        }
    }

    let summary = match handle.join() {
        Ok(result) => result?,
        Err(_) => {
            return Err(PlansortError::Io(std::io::Error::other(
                "pipeline thread panicked",
            )))
        }
    };

    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "Processed {} file(s): {} page(s) filed, {} page(s) to manual review",
            summary.files_processed, summary.pages_filed, summary.pages_manual
        );
    }

    Ok(())
}

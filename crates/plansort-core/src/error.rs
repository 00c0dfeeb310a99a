use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PlansortError {
    #[error("input path {0} does not exist")]
    InputDirMissing(PathBuf),

    #[error("input path {0} is not a directory")]
    InputDirNotDirectory(PathBuf),

    #[error("{tool} not found. Install {package}")]
    ToolNotFound {
        tool: &'static str,
        package: &'static str,
    },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("rasterization produced no page images for {0}")]
    NoPageImages(PathBuf),

    #[error("at least one page image is required to build the searchable PDF")]
    NoImages,

    #[error("an output file is required to build the searchable PDF")]
    NoOutputFile,

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

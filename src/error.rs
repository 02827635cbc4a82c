use std::path::PathBuf;
use thiserror::Error;

/// Domain failures callers may want to tell apart from plain I/O errors.
///
/// Everything else in the crate propagates as [`anyhow::Error`]; these three
/// carry enough structure to decide policy (abort the run vs skip the image)
/// at the orchestrator level.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// The external extraction tool exited non-zero or did not create the
    /// expected output directory. Fatal for the whole run.
    #[error("extraction failed for image '{image}': {reason}")]
    ExtractionFailed { image: String, reason: String },

    /// The run script has no `CLASSPATH=$APP_HOME/lib/...` line, so the main
    /// library cannot be identified.
    #[error("no main library found in run script {}", script.display())]
    MainLibraryNotFound { script: PathBuf },

    /// The run script has no `eval set --` line, so the main class cannot be
    /// identified.
    #[error("no main class found in run script {}", script.display())]
    MainClassNotFound { script: PathBuf },
}

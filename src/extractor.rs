//! Extraction invoker: materializes an image's filesystem via the external
//! extraction script.

use crate::config::{AuthMode, ImageDescriptor};
use crate::error::ComponentError;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Extractor trait for materializing an image's filesystem into a directory.
pub trait Extractor {
    /// Extracts `image` into a subdirectory of `components_dir` named after
    /// the image's component name, and returns that extraction root.
    fn extract(&self, image: &ImageDescriptor, components_dir: &Path) -> Result<PathBuf>;
}

/// Invokes the external extraction tool (`docker_extractor.sh`) as a child
/// process.
///
/// Basic-auth credentials are passed as environment scoped to that single
/// child invocation, so concurrent extractions against different registries
/// cannot see each other's credentials.
pub struct ScriptExtractor {
    script: PathBuf,
}

impl ScriptExtractor {
    pub fn new<P: Into<PathBuf>>(script: P) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Extractor for ScriptExtractor {
    fn extract(&self, image: &ImageDescriptor, components_dir: &Path) -> Result<PathBuf> {
        let out_dir = components_dir.join(image.component_name());

        info!(
            "Extracting image '{}' ({} layer(s), {} auth) into {}",
            image.reference,
            image.layers,
            image.auth.kind(),
            out_dir.display()
        );

        let mut command = Command::new(&self.script);
        command
            .arg("-n")
            .arg(image.layers.to_string())
            .arg("-o")
            .arg(&out_dir)
            .arg("-t")
            .arg(image.auth.kind())
            .arg(&image.reference);

        if let AuthMode::Basic(credentials) = &image.auth {
            command
                .env("BASIC_USER", &credentials.user)
                .env("BASIC_PASSWORD", &credentials.password);
        }

        debug!("Running extraction script: {:?}", command);
        let output = command.output().context(format!(
            "Failed to execute extraction script: {}",
            self.script.display()
        ))?;

        if !output.status.success() {
            return Err(ComponentError::ExtractionFailed {
                image: image.reference.clone(),
                reason: format!(
                    "script exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            }
            .into());
        }
        if !out_dir.exists() {
            return Err(ComponentError::ExtractionFailed {
                image: image.reference.clone(),
                reason: format!("output directory {} was not created", out_dir.display()),
            }
            .into());
        }

        Ok(out_dir)
    }
}

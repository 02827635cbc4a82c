//! Flattens an extraction root into a normalized component directory.
//!
//! The external extractor materializes an image's filesystem with the service
//! buried under `home/service/` (run script at `home/service/bin/service`,
//! jars under `home/service/lib/`). [`normalize`] reshapes that tree in
//! place — the extraction root *becomes* the component directory:
//!
//! - `home/` entries are pulled up to the root (minus `service` and
//!   `Dockerfile`),
//! - non-main libraries are offered to the shared [`LibStore`] and recorded in
//!   `libConfig.json`,
//! - the remaining `service/` contents (including `bin/`) are pulled up,
//! - the main class token lands in a `mainclass` file.
//!
//! A root without a `home/` subdirectory signals a malformed or empty
//! extraction: the whole root is deleted and [`Outcome::Discarded`] is
//! returned. This rule applies to already-normalized directories too —
//! re-normalizing is destructive by design, not idempotent.
//!
//! There is no rollback: a failure partway (for example a run script with no
//! classpath line) leaves the directory partially transformed.

use crate::config::LibsConfig;
use crate::error::ComponentError;
use crate::lib_store::LibStore;
use crate::run_script::RunScript;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub const HOME_DIR: &str = "home";
pub const SERVICE_DIR: &str = "service";
pub const LIB_DIR: &str = "lib";
pub const BIN_DIR: &str = "bin";
pub const RUN_SCRIPT_NAME: &str = "service";
pub const MAIN_CLASS_FILE: &str = "mainclass";

/// `home/` entries that stay in place during the first flattening pass.
const HOME_IGNORE: [&str; 2] = [SERVICE_DIR, "Dockerfile"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The root is now a component directory.
    Normalized,
    /// The root had no `home/` substructure and was deleted.
    Discarded,
}

/// Normalizes `root` in place, moving shared libraries into `store`.
pub fn normalize(root: &Path, store: &LibStore) -> Result<Outcome> {
    let home = root.join(HOME_DIR);
    if !home.exists() {
        warn!(
            "No '{}' directory under {}, discarding extraction root",
            HOME_DIR,
            root.display()
        );
        fs::remove_dir_all(root)
            .context(format!("Failed to discard extraction root: {}", root.display()))?;
        return Ok(Outcome::Discarded);
    }

    // Stale output of a previous run.
    for stale in [LIB_DIR, BIN_DIR] {
        let path = root.join(stale);
        if path.exists() {
            debug!("Removing stale '{}' under {}", stale, root.display());
            fs::remove_dir_all(&path)?;
        }
    }

    for entry in fs::read_dir(&home)? {
        let entry = entry?;
        let name = entry.file_name();
        if HOME_IGNORE.iter().any(|ignored| name == *ignored) {
            continue;
        }
        fs::rename(entry.path(), root.join(&name))
            .context(format!("Failed to move {:?} out of home", name))?;
    }

    let service_dir = home.join(SERVICE_DIR);
    let script_path = service_dir.join(BIN_DIR).join(RUN_SCRIPT_NAME);
    let script = RunScript::load(&script_path)?;
    let main_library = script.main_library.ok_or(ComponentError::MainLibraryNotFound {
        script: script_path.clone(),
    })?;
    let main_class = script.main_class.ok_or(ComponentError::MainClassNotFound {
        script: script_path.clone(),
    })?;
    debug!(
        "Run script {}: main library '{}', main class '{}'",
        script_path.display(),
        main_library,
        main_class
    );

    let mut libs = collect_libs(&service_dir.join(LIB_DIR), &main_library, store)?;
    // read_dir order is platform-dependent
    libs.sort();
    LibsConfig { libs }.save(root)?;

    for entry in fs::read_dir(&service_dir)? {
        let entry = entry?;
        fs::rename(entry.path(), root.join(entry.file_name()))
            .context(format!("Failed to move {:?} out of service dir", entry.file_name()))?;
    }

    fs::remove_dir_all(&home)
        .context(format!("Failed to remove {}", home.display()))?;

    // Append, matching the artifact contract of the run-script generator's
    // consumers: repeated runs accumulate rather than overwrite.
    let mut main_class_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(root.join(MAIN_CLASS_FILE))?;
    main_class_file.write_all(main_class.as_bytes())?;

    info!("Normalized component at {}", root.display());
    Ok(Outcome::Normalized)
}

/// Offers every non-main library to the store and returns their names. A
/// missing `lib/` directory yields an empty list.
fn collect_libs(lib_dir: &Path, main_library: &str, store: &LibStore) -> Result<Vec<String>> {
    let mut libs = Vec::new();
    if !lib_dir.is_dir() {
        return Ok(libs);
    }
    for entry in fs::read_dir(lib_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == main_library {
            continue;
        }
        store.adopt(&entry.path())?;
        libs.push(name);
    }
    Ok(libs)
}

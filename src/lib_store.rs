//! Run-wide deduplicated library store.
//!
//! All component tasks move their non-main libraries into a single shared
//! directory, keyed by filename. Content is assumed identical across
//! components sharing a filename, so the first task to claim a name moves its
//! copy in and every later task just deletes its duplicate.
//!
//! The claim table is a `Mutex<HashSet<String>>` seeded from the directory's
//! existing entries, so "does the store already have X" and "X is now mine to
//! move" are a single atomic step. Concurrent tasks adopting the same
//! filename cannot both rename into the store.

use anyhow::{anyhow, Context, Result};
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const LIB_STORE_DIR: &str = "lib";

/// Outcome of offering one library file to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adoption {
    /// The filename was new; the file now lives in the store.
    Moved,
    /// Another component already owns this filename; the duplicate copy was
    /// deleted.
    Discarded,
}

pub struct LibStore {
    dir: PathBuf,
    claimed: Mutex<HashSet<String>>,
}

impl LibStore {
    /// Opens (creating if needed) the store directory and seeds the claim
    /// table with whatever filenames are already present.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .context(format!("Failed to create library store: {}", dir.display()))?;

        let mut claimed = HashSet::new();
        for entry in fs::read_dir(dir)
            .context(format!("Failed to list library store: {}", dir.display()))?
        {
            let entry = entry?;
            claimed.insert(entry.file_name().to_string_lossy().into_owned());
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            claimed: Mutex::new(claimed),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Atomically claims `source`'s filename: moves the file into the store
    /// if the name was unclaimed, deletes the duplicate otherwise.
    pub fn adopt(&self, source: &Path) -> Result<Adoption> {
        let name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("Library path has no filename: {}", source.display()))?;

        let claim_won = self.claimed.lock().unwrap().insert(name.clone());

        if claim_won {
            fs::rename(source, self.dir.join(&name))
                .context(format!("Failed to move library '{}' into store", name))?;
            debug!("Library '{}' moved into shared store", name);
            Ok(Adoption::Moved)
        } else {
            fs::remove_file(source)
                .context(format!("Failed to discard duplicate library '{}'", name))?;
            debug!("Library '{}' already in shared store, duplicate discarded", name);
            Ok(Adoption::Discarded)
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.claimed.lock().unwrap().contains(name)
    }
}

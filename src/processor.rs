//! Fan-out/fan-in pipeline orchestrator.
//!
//! This module provides [`ComponentProcessor`], a high-level orchestrator
//! that:
//! - resolves every configured image reference into an
//!   [`ImageDescriptor`](crate::config::ImageDescriptor),
//! - opens the run-wide shared [`LibStore`],
//! - runs one extract → normalize task per image on its own OS thread,
//! - joins all tasks unconditionally and aggregates their results.
//!
//! Aggregation policy is collect-all-errors, not fail-fast: a failing image
//! never interrupts the other tasks, and the final error lists every image
//! that failed. Discarded extractions (no `home/` substructure) are counted
//! but do not fail the run. There are no retries.
//!
//! ### Type parameters
//! - `E`: a concrete [`Extractor`] — the external-script invoker in
//!   production, a stub in tests.

use crate::config::{ExtractConfig, ImageDescriptor};
use crate::extractor::Extractor;
use crate::lib_store::{LibStore, LIB_STORE_DIR};
use crate::normalizer::{self, Outcome};
use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::thread;

/// Counts of per-image outcomes after a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub normalized: usize,
    pub discarded: usize,
}

/// Orchestrates the extract → normalize pipeline for a batch of images.
pub struct ComponentProcessor<E: Extractor> {
    extractor: E,
}

impl<E: Extractor + Sync> ComponentProcessor<E> {
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }

    /// Runs the full pipeline for one image: extract its filesystem into a
    /// subdirectory of `components_dir`, then normalize that root in place.
    pub fn process(
        &self,
        image: &ImageDescriptor,
        components_dir: &Path,
        store: &LibStore,
    ) -> Result<Outcome> {
        let root = self.extractor.extract(image, components_dir)?;
        normalizer::normalize(&root, store)
    }

    /// Processes every configured image concurrently and waits for all of
    /// them.
    ///
    /// Returns the outcome counts on success. If any image fails, the other
    /// tasks still run to completion and the returned error names every
    /// failed image.
    pub fn run(&self, config: &ExtractConfig, components_dir: &Path) -> Result<RunSummary> {
        fs::create_dir_all(components_dir).context(format!(
            "Failed to create components directory: {}",
            components_dir.display()
        ))?;
        let store = LibStore::open(&components_dir.join(LIB_STORE_DIR))?;

        let images: Vec<ImageDescriptor> = config
            .images
            .iter()
            .map(|reference| config.resolve(reference))
            .collect::<Result<_>>()?;

        info!(
            "Processing {} image(s) into {}",
            images.len(),
            components_dir.display()
        );

        let results: Vec<Result<Outcome>> = thread::scope(|scope| {
            let handles: Vec<_> = images
                .iter()
                .map(|image| {
                    let store = &store;
                    scope.spawn(move || self.process(image, components_dir, store))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(anyhow!("component task panicked")))
                })
                .collect()
        });

        let mut summary = RunSummary::default();
        let mut failures = Vec::new();
        for (image, result) in images.iter().zip(results) {
            match result {
                Ok(Outcome::Normalized) => summary.normalized += 1,
                Ok(Outcome::Discarded) => {
                    warn!(
                        "Image '{}' produced no usable extraction, component skipped",
                        image.reference
                    );
                    summary.discarded += 1;
                }
                Err(err) => {
                    error!("Image '{}' failed: {:#}", image.reference, err);
                    failures.push(format!("{}: {:#}", image.reference, err));
                }
            }
        }

        if !failures.is_empty() {
            return Err(anyhow!(
                "{} of {} image(s) failed: {}",
                failures.len(),
                images.len(),
                failures.join("; ")
            ));
        }

        info!(
            "Run complete: {} component(s) normalized, {} discarded",
            summary.normalized, summary.discarded
        );
        Ok(summary)
    }
}

use anyhow::Result;
use oci2comp::{
    ComponentProcessor, ExtractConfig, Extractor, ImageDescriptor, LibsConfig, RunSummary,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Stub extractor that materializes a canned extraction tree instead of
/// calling the external script.
struct StubExtractor;

impl Extractor for StubExtractor {
    fn extract(&self, image: &ImageDescriptor, components_dir: &Path) -> Result<PathBuf> {
        let root = components_dir.join(image.component_name());

        if image.reference.contains("broken") {
            anyhow::bail!("simulated extraction failure for {}", image.reference);
        }
        if image.reference.contains("empty") {
            // Tool "succeeded" but produced nothing useful: no home/.
            fs::create_dir_all(root.join("etc"))?;
            return Ok(root);
        }

        let bin_dir = root.join("home/service/bin");
        let lib_dir = root.join("home/service/lib");
        fs::create_dir_all(&bin_dir)?;
        fs::create_dir_all(&lib_dir)?;

        let main_lib = format!("{}-core.jar", image.component_name());
        fs::write(
            bin_dir.join("service"),
            format!(
                "#!/bin/sh\n\
                 CLASSPATH=$APP_HOME/lib/{main_lib}:$APP_HOME/lib/*\n\
                 eval set -- \"$@\" com.example.{} extra\n",
                image.component_name()
            ),
        )?;
        fs::write(lib_dir.join(&main_lib), "main")?;
        fs::write(lib_dir.join("common.jar"), "shared")?;

        Ok(root)
    }
}

fn config(images: &[&str]) -> ExtractConfig {
    let json = serde_json::json!({ "images": images });
    serde_json::from_value(json).unwrap()
}

#[test]
fn test_run_normalizes_every_image() {
    let tmp = tempfile::tempdir().unwrap();
    let components = tmp.path().join("components");
    let processor = ComponentProcessor::new(StubExtractor);

    let summary = processor
        .run(&config(&["ghcr.io/th2/estore", "ghcr.io/th2/codec"]), &components)
        .unwrap();
    assert_eq!(
        summary,
        RunSummary {
            normalized: 2,
            discarded: 0
        }
    );

    for name in ["estore", "codec"] {
        let component = components.join(name);
        assert!(component.join("bin/service").exists());
        assert!(component.join(format!("lib/{name}-core.jar")).exists());
        assert_eq!(
            LibsConfig::load(&component).unwrap().libs,
            vec!["common.jar".to_string()]
        );
    }

    // common.jar was contributed by both components but stored once.
    let store = components.join("lib");
    assert!(store.join("common.jar").exists());
    assert_eq!(fs::read_dir(&store).unwrap().count(), 1);
}

#[test]
fn test_malformed_extraction_is_skipped_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let components = tmp.path().join("components");
    let processor = ComponentProcessor::new(StubExtractor);

    let summary = processor
        .run(&config(&["ghcr.io/th2/estore", "ghcr.io/th2/empty"]), &components)
        .unwrap();
    assert_eq!(
        summary,
        RunSummary {
            normalized: 1,
            discarded: 1
        }
    );

    assert!(components.join("estore").exists());
    assert!(!components.join("empty").exists());
}

#[test]
fn test_failed_image_does_not_interrupt_the_others() {
    let tmp = tempfile::tempdir().unwrap();
    let components = tmp.path().join("components");
    let processor = ComponentProcessor::new(StubExtractor);

    let err = processor
        .run(
            &config(&["ghcr.io/th2/estore", "ghcr.io/th2/broken", "ghcr.io/th2/codec"]),
            &components,
        )
        .unwrap_err();

    // Aggregate error names the failed image only.
    let message = format!("{err:#}");
    assert!(message.contains("1 of 3"));
    assert!(message.contains("ghcr.io/th2/broken"));

    // The healthy images still completed.
    assert!(components.join("estore/bin/service").exists());
    assert!(components.join("codec/bin/service").exists());
}

#[test]
fn test_run_with_no_images_is_empty_success() {
    let tmp = tempfile::tempdir().unwrap();
    let components = tmp.path().join("components");
    let processor = ComponentProcessor::new(StubExtractor);

    let summary = processor.run(&config(&[]), &components).unwrap();
    assert_eq!(summary, RunSummary::default());
    assert!(components.join("lib").is_dir());
}

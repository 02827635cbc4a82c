use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{debug, info, LevelFilter};
use std::path::PathBuf;

use oci2comp::{ComponentProcessor, ExtractConfig, ScriptExtractor};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        default_value = oci2comp::config::DEFAULT_CONFIG_NAME,
        help = "Extraction config file (images, layer overrides, registry credentials)"
    )]
    config: PathBuf,

    #[arg(
        short,
        long,
        default_value = "./components",
        help = "Output directory for normalized component directories"
    )]
    output: PathBuf,

    #[arg(
        short,
        long,
        default_value = "./docker_extractor.sh",
        help = "External extraction script to invoke per image"
    )]
    script: PathBuf,

    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Verbose mode (-v for info, -vv for debug, -vvv for trace)"
    )]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity level
    let log_level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_env(Env::default())
        .filter_level(log_level)
        .init();

    info!("Starting oci2comp with config: {}", cli.config.display());
    debug!("Components directory: {}", cli.output.display());
    debug!("Extraction script: {}", cli.script.display());

    let config = ExtractConfig::load(&cli.config)?;
    let processor = ComponentProcessor::new(ScriptExtractor::new(cli.script));
    let summary = processor.run(&config, &cli.output)?;

    println!(
        "Done: {} component(s) normalized, {} discarded",
        summary.normalized, summary.discarded
    );
    Ok(())
}

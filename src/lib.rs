pub mod config;
pub mod error;
pub mod extractor;
pub mod lib_store;
pub mod normalizer;
pub mod processor;
pub mod run_script;

// Re-exports for easy access
pub use config::{AuthMode, Credentials, ExtractConfig, ImageDescriptor, LibsConfig};
pub use error::ComponentError;
pub use extractor::{Extractor, ScriptExtractor};
pub use lib_store::{Adoption, LibStore};
pub use normalizer::Outcome;
pub use processor::{ComponentProcessor, RunSummary};
pub use run_script::RunScript;

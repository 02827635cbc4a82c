//! Run configuration and per-image descriptor resolution.
//!
//! The orchestrator is driven by a single JSON file (`extract_config.json` by
//! default) with three fields:
//! - `images` — the image references to extract,
//! - `layers_config` — name-substring → layer-count overrides for the
//!   external extractor,
//! - `registry_mapping` — registry domain → `user:password` credentials for
//!   registries that require basic auth.
//!
//! [`ExtractConfig::resolve`] turns a raw image reference into an
//! [`ImageDescriptor`] with its layer count and auth mode already decided, so
//! the extraction invoker never looks at the raw maps. Credential strings are
//! validated eagerly at load time; a `registry_mapping` value without a `:`
//! separator fails [`ExtractConfig::load`] instead of surfacing later inside a
//! worker thread.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "extract_config.json";

/// Declarative list of images to extract plus per-image overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    pub images: Vec<String>,
    #[serde(default)]
    pub layers_config: HashMap<String, u32>,
    #[serde(default)]
    pub registry_mapping: HashMap<String, String>,
}

impl ExtractConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config: ExtractConfig = serde_json::from_str(&content)
            .context(format!("Failed to parse config file: {}", path.display()))?;

        // Catch malformed credential strings up front, before any thread is
        // spawned for an image that would use them.
        for (domain, raw) in &config.registry_mapping {
            Credentials::parse(raw)
                .context(format!("Invalid credentials for registry '{}'", domain))?;
        }

        Ok(config)
    }

    /// Resolves a raw image reference into a descriptor with layer count and
    /// auth mode decided from the config maps.
    pub fn resolve(&self, reference: &str) -> Result<ImageDescriptor> {
        // Any matching substring sets the override; with several matching
        // entries the winner is unspecified (map iteration order).
        let mut layers = 1;
        for (pattern, count) in &self.layers_config {
            if reference.contains(pattern.as_str()) {
                layers = *count;
            }
        }

        let domain = reference.split('/').next().unwrap_or(reference);
        let auth = match self.registry_mapping.get(domain) {
            Some(raw) => AuthMode::Basic(Credentials::parse(raw)?),
            None => AuthMode::Token,
        };

        Ok(ImageDescriptor {
            reference: reference.to_string(),
            layers,
            auth,
        })
    }
}

/// How the external extractor authenticates against the image's registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    Token,
    Basic(Credentials),
}

impl AuthMode {
    /// The auth-type token passed to the external tool's `-t` flag.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthMode::Token => "token",
            AuthMode::Basic(_) => "basic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    /// Parses a `user:password` string as stored in `registry_mapping`.
    pub fn parse(raw: &str) -> Result<Self> {
        let (user, password) = raw
            .split_once(':')
            .context("Credentials must be in 'user:password' form")?;
        Ok(Self {
            user: user.to_string(),
            password: password.to_string(),
        })
    }
}

/// One image to extract, with its per-image settings already resolved.
#[derive(Debug, Clone)]
pub struct ImageDescriptor {
    pub reference: String,
    pub layers: u32,
    pub auth: AuthMode,
}

impl ImageDescriptor {
    /// Directory name for this image's component: the last `/`-segment of the
    /// reference.
    pub fn component_name(&self) -> &str {
        self.reference
            .rsplit('/')
            .next()
            .unwrap_or(&self.reference)
    }
}

/// Schema of the per-component `libConfig.json` artifact: the libraries this
/// component contributed to the shared store, excluding its main library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibsConfig {
    pub libs: Vec<String>,
}

impl LibsConfig {
    pub const FILE_NAME: &'static str = "libConfig.json";

    pub fn save(&self, component_dir: &Path) -> Result<()> {
        let path = component_dir.join(Self::FILE_NAME);
        let content = serde_json::to_string(self).context("Failed to serialize libConfig")?;
        fs::write(&path, content)
            .context(format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn load(component_dir: &Path) -> Result<Self> {
        let path = component_dir.join(Self::FILE_NAME);
        let content = fs::read_to_string(&path)
            .context(format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).context(format!("Failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: &str) -> ExtractConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_layer_count_defaults_to_one() {
        let cfg = config(r#"{"images": [], "layers_config": {"estore": 3}}"#);
        let descriptor = cfg.resolve("ghcr.io/th2-net/th2-codec:1.5.0").unwrap();
        assert_eq!(descriptor.layers, 1);
    }

    #[test]
    fn test_layer_count_substring_override() {
        let cfg = config(r#"{"images": [], "layers_config": {"estore": 3}}"#);
        let descriptor = cfg.resolve("ghcr.io/th2-net/th2-estore:4.1.0").unwrap();
        assert_eq!(descriptor.layers, 3);
    }

    #[test]
    fn test_auth_token_for_unmapped_domain() {
        let cfg = config(r#"{"images": [], "registry_mapping": {"private.io": "bob:s3cret"}}"#);
        let descriptor = cfg.resolve("ghcr.io/th2-net/th2-estore:4.1.0").unwrap();
        assert_eq!(descriptor.auth, AuthMode::Token);
        assert_eq!(descriptor.auth.kind(), "token");
    }

    #[test]
    fn test_auth_basic_for_mapped_domain() {
        let cfg = config(r#"{"images": [], "registry_mapping": {"private.io": "bob:s3cret"}}"#);
        let descriptor = cfg.resolve("private.io/team/app:1.0").unwrap();
        assert_eq!(
            descriptor.auth,
            AuthMode::Basic(Credentials {
                user: "bob".to_string(),
                password: "s3cret".to_string(),
            })
        );
        assert_eq!(descriptor.auth.kind(), "basic");
    }

    #[test]
    fn test_credentials_password_may_contain_colon() {
        let creds = Credentials::parse("bob:pa:ss").unwrap();
        assert_eq!(creds.user, "bob");
        assert_eq!(creds.password, "pa:ss");
    }

    #[test]
    fn test_credentials_without_separator_rejected() {
        assert!(Credentials::parse("bobs3cret").is_err());
    }

    #[test]
    fn test_component_name_is_last_segment() {
        let cfg = config(r#"{"images": []}"#);
        let descriptor = cfg.resolve("ghcr.io/th2-net/th2-estore:4.1.0").unwrap();
        assert_eq!(descriptor.component_name(), "th2-estore:4.1.0");

        let bare = cfg.resolve("estore").unwrap();
        assert_eq!(bare.component_name(), "estore");
    }

    #[test]
    fn test_libs_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let libs = LibsConfig {
            libs: vec!["dep1.jar".to_string(), "dep2.jar".to_string()],
        };
        libs.save(dir.path()).unwrap();
        assert_eq!(LibsConfig::load(dir.path()).unwrap(), libs);
    }
}

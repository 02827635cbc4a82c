//! Parser for the generated `bin/service` run script.
//!
//! The script is a Gradle-style launcher; two of its lines matter here:
//! - the classpath line `CLASSPATH=$APP_HOME/lib/<main-lib>:...` names the
//!   component's main library first,
//! - the `eval set -- ... <main-class> <extra>` line carries the main class
//!   as its second-to-last whitespace-separated token.
//!
//! [`RunScript::parse`] makes a single pass over the text and reports both
//! values with explicit presence, leaving it to the caller to decide whether
//! absence is an error.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const CLASSPATH_MARKER: &str = "CLASSPATH=$APP_HOME/lib/";
pub const MAIN_CLASS_MARKER: &str = "eval set --";

/// Structured result of scanning a run script. First matching line wins for
/// each field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunScript {
    pub main_library: Option<String>,
    pub main_class: Option<String>,
}

impl RunScript {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .context(format!("Failed to read run script: {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut script = RunScript::default();
        for line in text.lines() {
            if script.main_library.is_none() {
                if let Some(library) = main_library_from(line) {
                    script.main_library = Some(library);
                }
            }
            if script.main_class.is_none() {
                if let Some(class) = main_class_from(line) {
                    script.main_class = Some(class);
                }
            }
            if script.main_library.is_some() && script.main_class.is_some() {
                break;
            }
        }
        script
    }
}

/// Text between the classpath marker and the next `:` on the line. A line
/// with no trailing `:` yields everything after the marker.
fn main_library_from(line: &str) -> Option<String> {
    let (_, rest) = line.trim_end().split_once(CLASSPATH_MARKER)?;
    let library = rest.split(':').next().unwrap_or(rest);
    Some(library.to_string())
}

/// Second-to-last whitespace-separated token of an `eval set --` line.
fn main_class_from(line: &str) -> Option<String> {
    if !line.contains(MAIN_CLASS_MARKER) {
        return None;
    }
    let mut tokens = line.split_whitespace().rev();
    tokens.next()?;
    tokens.next().map(|token| token.to_string())
}

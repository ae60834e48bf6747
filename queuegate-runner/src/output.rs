//! Action output
//!
//! Reports the gate result the way a GitHub Actions step does: step
//! outputs go to the file named by `GITHUB_OUTPUT`, errors become workflow
//! command annotations on stdout.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

const ANNOTATION_TITLE: &str = "Job Queue Gate";

/// Destination for step outputs
#[derive(Debug, Clone)]
pub struct ActionOutput {
    path: Option<PathBuf>,
}

impl ActionOutput {
    /// Uses `GITHUB_OUTPUT` when set, stdout otherwise
    pub fn from_env() -> Self {
        let path = std::env::var_os("GITHUB_OUTPUT")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self { path }
    }

    /// Sets a step output
    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        match &self.path {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                writeln!(file, "{}={}", name, value)
                    .with_context(|| format!("Failed to write output '{}'", name))?;
            }
            None => println!("{}={}", name, value),
        }
        Ok(())
    }
}

/// Formats an `::error` workflow command
pub fn error_annotation(message: &str) -> String {
    format!(
        "::error title={}::{}",
        escape_property(ANNOTATION_TITLE),
        escape_data(message)
    )
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

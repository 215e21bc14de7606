//! Server personality rendering.
//!
//! Personalities are the only way to inject files into a Windows server at
//! boot on this provider. Each template under the personality directory is
//! rendered with the environment's variables and submitted with a
//! destination path on the node.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::core::constants::{PERSONALITY_DEST_DIR, PERSONALITY_FILES, PERSONALITY_SOFT_LIMIT};
use crate::core::template::{self, TemplateVars};
use crate::error::{Result, TemplateError};

/// A template file and where its rendered output lands on the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalitySource {
    pub source: PathBuf,
    pub destination: String,
}

impl PersonalitySource {
    /// The fixed set of personality templates found in `dir`.
    pub fn defaults(dir: &Path) -> Vec<Self> {
        PERSONALITY_FILES
            .iter()
            .map(|name| Self {
                source: dir.join(name),
                destination: format!("{}\\{}", PERSONALITY_DEST_DIR, name),
            })
            .collect()
    }
}

/// A rendered personality, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalityFile {
    pub path: String,
    pub contents: String,
}

impl PersonalityFile {
    /// Hex-encoded SHA-256 of the rendered contents.
    pub fn digest(&self) -> String {
        Sha256::digest(self.contents.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// Summary safe to print: rendered contents carry credentials.
    pub fn summary(&self) -> PersonalitySummary {
        PersonalitySummary {
            path: self.path.clone(),
            bytes: self.contents.len(),
            sha256: self.digest(),
        }
    }
}

/// Printable description of a rendered personality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalitySummary {
    pub path: String,
    pub bytes: usize,
    pub sha256: String,
}

/// Render every source with `vars`.
///
/// # Errors
///
/// Returns `TemplateError::ReadSource` if any source cannot be read. No size
/// check blocks submission; oversized files are only logged.
pub fn render_all(sources: &[PersonalitySource], vars: &TemplateVars) -> Result<Vec<PersonalityFile>> {
    let mut rendered = Vec::with_capacity(sources.len());
    for p in sources {
        let content = std::fs::read_to_string(&p.source).map_err(|source| TemplateError::ReadSource {
            path: p.source.clone(),
            source,
        })?;
        let contents = template::render(&content, vars);

        debug!(
            source = %p.source.display(),
            destination = %p.destination,
            bytes = contents.len(),
            "rendered personality"
        );
        if contents.len() > PERSONALITY_SOFT_LIMIT {
            warn!(
                destination = %p.destination,
                bytes = contents.len(),
                limit = PERSONALITY_SOFT_LIMIT,
                "personality may exceed the provider size limit; servers may fail to build"
            );
        }

        rendered.push(PersonalityFile {
            path: p.destination.clone(),
            contents,
        });
    }
    Ok(rendered)
}

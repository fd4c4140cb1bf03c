//! Resource Locator
//!
//! Resolves a source name either as a filesystem path or as a resource name
//! relative to an ordered list of resource roots.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding the default resource roots
pub const RESOURCE_PATH_ENV: &str = "DYNPROPS_RESOURCE_PATH";

/// Finds backing files for source names
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    roots: Vec<PathBuf>,
}

impl ResourceLocator {
    /// Create a locator over explicit resource roots
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Create a locator from `DYNPROPS_RESOURCE_PATH`, falling back to the current directory
    pub fn from_env() -> Self {
        let roots: Vec<PathBuf> = std::env::var_os(RESOURCE_PATH_ENV)
            .map(|paths| std::env::split_paths(&paths).collect())
            .unwrap_or_default();

        if roots.is_empty() {
            Self::new(vec![PathBuf::from(".")])
        } else {
            Self::new(roots)
        }
    }

    /// Configured resource roots, in search order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolve a name to an existing file
    ///
    /// A plain filesystem path wins; otherwise the name is looked up under each
    /// root in order, ignoring a leading `/`.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }

        let relative = name.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }

        let found = self
            .roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file());

        match &found {
            Some(path) => debug!("Resolved resource '{}' to {}", name, path.display()),
            None => debug!("Resource '{}' not found under {} roots", name, self.roots.len()),
        }
        found
    }
}

impl Default for ResourceLocator {
    fn default() -> Self {
        Self::from_env()
    }
}

//! Component declaration: where the host loads the frontend from.

use std::path::{Path, PathBuf};

use pcmplay_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Name the component is registered under.
pub const COMPONENT_NAME: &str = "pcm_audio_player";

/// Dev server the frontend runs on during development.
pub const DEFAULT_DEV_URL: &str = "http://localhost:3000";

/// Build output directory, relative to the package root.
pub const BUILD_DIR: &str = "frontend/build";

/// Where the host loads the component's frontend from.
///
/// Fixed for the life of the process; pick it once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BuildSource {
    /// A running frontend dev server.
    LocalDevServer { url: String },
    /// A production build on disk.
    BundledAssets { path: PathBuf },
}

impl BuildSource {
    pub fn dev_server() -> Self {
        Self::LocalDevServer {
            url: DEFAULT_DEV_URL.to_string(),
        }
    }

    /// The production build inside `package_dir`.
    pub fn bundled_in(package_dir: impl AsRef<Path>) -> Self {
        Self::BundledAssets {
            path: package_dir.as_ref().join(BUILD_DIR),
        }
    }

    pub const fn is_release(&self) -> bool {
        matches!(self, Self::BundledAssets { .. })
    }

    /// Verify a bundled build exists. Dev servers are not probed.
    pub fn check(&self) -> Result<()> {
        match self {
            Self::LocalDevServer { url } if url.is_empty() => Err(Error::InvalidArgument(
                "dev server URL is empty".to_string(),
            )),
            Self::LocalDevServer { .. } => Ok(()),
            Self::BundledAssets { path } if path.is_dir() => Ok(()),
            Self::BundledAssets { path } => Err(Error::InvalidArgument(format!(
                "frontend build not found at {}",
                path.display()
            ))),
        }
    }
}

impl Default for BuildSource {
    fn default() -> Self {
        Self::BundledAssets {
            path: PathBuf::from(BUILD_DIR),
        }
    }
}

/// Everything the host needs to register the component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDeclaration {
    pub name: String,
    pub source: BuildSource,
    /// Value the host sees before the component reports anything.
    pub default_value: i32,
}

impl ComponentDeclaration {
    pub fn new(source: BuildSource) -> Self {
        Self {
            name: COMPONENT_NAME.to_string(),
            source,
            default_value: 0,
        }
    }
}

//! Per-session configuration for the writer.

use crate::format::{GraphicsProfile, TargetPlatform};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings that control how a container is written.
///
/// The options are plain data (serde-enabled) so build tools can load them
/// from their own configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XnbOptions {
    /// Platform byte written to the header.
    pub platform: TargetPlatform,
    /// Graphics profile flag written to the header.
    pub profile: GraphicsProfile,
    /// Request LZ4 compression of the body. Ignored when any type in the
    /// session's type table refuses compression for the target platform.
    pub compress: bool,
    /// Content root. External references must point inside it.
    pub root_directory: Option<PathBuf>,
    /// Directory external references are made relative to. Defaults to the
    /// content root.
    pub relocation_path: Option<PathBuf>,
}

impl Default for XnbOptions {
    fn default() -> Self {
        Self {
            platform: TargetPlatform::Windows,
            profile: GraphicsProfile::Reach,
            compress: cfg!(feature = "lz4_flex"),
            root_directory: None,
            relocation_path: None,
        }
    }
}

impl XnbOptions {
    /// Sets the target platform.
    pub fn platform(mut self, platform: TargetPlatform) -> Self {
        self.platform = platform;
        self
    }

    /// Sets the graphics profile.
    pub fn profile(mut self, profile: GraphicsProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Enables or disables body compression.
    pub fn compress(mut self, enable: bool) -> Self {
        self.compress = enable;
        self
    }

    /// Sets the content root directory.
    pub fn root_directory(mut self, root: impl AsRef<Path>) -> Self {
        self.root_directory = Some(root.as_ref().to_path_buf());
        self
    }

    /// Sets the directory external references are relative to.
    pub fn relocation_path(mut self, path: impl AsRef<Path>) -> Self {
        self.relocation_path = Some(path.as_ref().to_path_buf());
        self
    }
}

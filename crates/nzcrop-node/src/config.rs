//! Node configuration, loaded from TOML.
//!
//! ```toml
//! input_topic = "camera/depth/image_raw"
//! output_topic = "camera/depth/cropped"
//!
//! [crop]
//! degenerate_range = "reject"
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::{Path, PathBuf};

use nzcrop_core::CropConfig;
use serde::{Deserialize, Serialize};

/// Topic names, transport, and cropper settings for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Topic the raw images arrive on.
    pub input_topic: String,
    /// Topic cropped images are published to.
    pub output_topic: String,
    /// Transport hint passed to the host when subscribing.
    pub image_transport: String,
    /// Cropper settings.
    pub crop: CropConfig,
}

impl NodeConfig {
    /// Default for [`input_topic`](Self::input_topic).
    pub const DEFAULT_INPUT_TOPIC: &str = "image_raw";
    /// Default for [`output_topic`](Self::output_topic).
    pub const DEFAULT_OUTPUT_TOPIC: &str = "image";
    /// Default for [`image_transport`](Self::image_transport).
    pub const DEFAULT_IMAGE_TRANSPORT: &str = "raw";

    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML or a
    /// key has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            input_topic: Self::DEFAULT_INPUT_TOPIC.to_owned(),
            output_topic: Self::DEFAULT_OUTPUT_TOPIC.to_owned(),
            image_transport: Self::DEFAULT_IMAGE_TRANSPORT.to_owned(),
            crop: CropConfig::default(),
        }
    }
}

/// Errors from loading a [`NodeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The text is not valid TOML or does not match [`NodeConfig`].
    #[error("invalid node configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

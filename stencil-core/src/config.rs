use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the optional layout file looked up in the source root.
pub const LAYOUT_FILE: &str = "stencil.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read layout file")]
    Io(#[from] std::io::Error),
    #[error("failed to parse layout file")]
    Parsing(#[from] toml::de::Error),
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub layout: SourceLayout,
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&data)?;

        Ok(config)
    }

    /// Reads `stencil.toml` from the source root, falling back to defaults
    /// when the file does not exist.
    pub fn for_source<P: AsRef<Path>>(source_dir: P) -> Result<Self, ConfigError> {
        let path = source_dir.as_ref().join(LAYOUT_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }

        log::debug!("Reading layout from {}", path.display());
        Self::read(path)
    }
}

/// Where things live inside a source tree, relative to its root.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SourceLayout {
    pub pages: String,
    pub globals: String,
    pub templates: String,
    pub template_extension: String,
    pub content: String,
    pub preview: String,
    pub line: String,
    #[serde(rename = "static")]
    pub static_dir: String,
    pub syntax_theme: String,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            pages: "pages.spec".into(),
            globals: "globals.spec".into(),
            templates: "templates".into(),
            template_extension: "html".into(),
            content: "content".into(),
            preview: "preview".into(),
            line: "line".into(),
            static_dir: "static".into(),
            syntax_theme: "base16-ocean.dark".into(),
        }
    }
}

impl SourceLayout {
    pub fn pages_file(&self, root: &Path) -> PathBuf {
        root.join(&self.pages)
    }

    pub fn globals_file(&self, root: &Path) -> PathBuf {
        root.join(&self.globals)
    }

    pub fn templates_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.templates)
    }

    pub fn static_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.static_dir)
    }
}

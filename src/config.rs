use std::io::Read as _;
use std::path::Path;

use serde::Deserialize;

use crate::error::{NdiffError, Result};

/// Maximum config file size. Configs larger than this are rejected before parsing.
const MAX_CONFIG_BYTES: u64 = 1024 * 1024; // 1 MiB

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub context_lines: Option<usize>,
    #[serde(default)]
    pub color: ColorPolicy,
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ColorPolicy {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Default, Deserialize)]
pub struct IgnoreConfig {
    /// Path fragments to skip when walking directories in recursive mode.
    #[serde(default)]
    pub paths: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let mut file = std::fs::File::open(path).map_err(|source| NdiffError::FileRead {
            path: path.into(),
            source,
        })?;
        if file.metadata().map(|m| m.len()).unwrap_or(0) > MAX_CONFIG_BYTES {
            return Err(NdiffError::ConfigInvalid(
                "config file exceeds 1 MiB size limit".to_string(),
            ));
        }
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|source| NdiffError::FileRead {
                path: path.into(),
                source,
            })?;
        let config: Config = toml::from_str(&content).map_err(|source| NdiffError::ConfigParse {
            path: path.into(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_cwd() -> Result<Option<Config>> {
        let path = Path::new("ndiff.toml");
        match Config::load(path) {
            Ok(cfg) => Ok(Some(cfg)),
            Err(NdiffError::FileRead { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(NdiffError::ConfigInvalid(format!(
                "unsupported version {}",
                self.version
            )));
        }
        if let Some(n) = self.context_lines {
            if n > 1000 {
                return Err(NdiffError::ConfigInvalid(
                    "context_lines cannot exceed 1000".to_string(),
                ));
            }
        }
        for path in &self.ignore.paths {
            if path.trim().is_empty() {
                return Err(NdiffError::ConfigInvalid(
                    "ignore path cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

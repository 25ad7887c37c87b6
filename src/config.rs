//! Global machoscope configuration.
//!
//! Persistent settings plus a registry of recently analyzed binaries,
//! stored as JSON under the platform data directory.

use crate::error::{Error, Result};
use machoscope_core::MachoFile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Application name for config file storage.
const APP_NAME: &str = "machoscope";

/// Config filename inside the data directory.
const CONFIG_FILENAME: &str = "config.json";

/// How many recently analyzed files to remember.
const RECENT_CAPACITY: usize = 32;

/// Global machoscope configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachoscopeConfig {
    /// Configuration format version.
    pub version: u8,

    /// Maximum symbols printed per table before truncation.
    pub symbol_page_size: usize,

    /// Whether `inspect` runs the cross-reference builder.
    #[serde(default = "default_true")]
    pub xrefs_on_inspect: bool,

    /// Registry of recently analyzed files, keyed by MD5 digest.
    #[serde(default)]
    pub recent: HashMap<String, RecentFile>,
}

fn default_true() -> bool {
    true
}

impl Default for MachoscopeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            symbol_page_size: 200,
            xrefs_on_inspect: true,
            recent: HashMap::new(),
        }
    }
}

impl MachoscopeConfig {
    /// Load configuration from disk.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| Error::ConfigLoad(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| Error::ConfigLoad(e.to_string()))
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Err(Error::ConfigSave("could not determine data directory".into()));
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::ConfigSave(e.to_string()))?;
        }
        let raw =
            serde_json::to_string_pretty(self).map_err(|e| Error::ConfigSave(e.to_string()))?;
        std::fs::write(&path, raw).map_err(|e| Error::ConfigSave(e.to_string()))
    }

    /// Path of the config file, `None` when no data directory exists.
    fn config_path() -> Option<PathBuf> {
        let data_dir = dirs::data_local_dir().or_else(dirs::data_dir)?;
        Some(data_dir.join(APP_NAME).join(CONFIG_FILENAME))
    }

    /// Record a successfully analyzed file in the registry.
    pub fn record_recent(&mut self, file: &MachoFile) {
        let record = RecentFile::from_model(file);
        self.recent.insert(file.md5_digest.clone(), record);

        // Evict oldest entries beyond capacity.
        while self.recent.len() > RECENT_CAPACITY {
            let oldest = self
                .recent
                .iter()
                .min_by_key(|(_, r)| r.last_opened)
                .map(|(digest, _)| digest.clone());
            match oldest {
                Some(digest) => {
                    self.recent.remove(&digest);
                }
                None => break,
            }
        }
    }

    /// Look up a recent file by digest.
    pub fn get_recent(&self, digest: &str) -> Option<&RecentFile> {
        self.recent.get(digest)
    }
}

/// Registry entry for an analyzed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentFile {
    /// File name without directories.
    pub filename: String,

    /// Path the file was analyzed from.
    pub filepath: String,

    /// Byte length at analysis time.
    pub file_size: u64,

    /// Whether the file was a fat/universal binary.
    pub is_fat: bool,

    /// Unix timestamp of the last analysis.
    #[serde(default)]
    pub last_opened: u64,
}

impl RecentFile {
    fn from_model(file: &MachoFile) -> Self {
        Self {
            filename: file.filename.clone(),
            filepath: file.filepath.clone(),
            file_size: file.file_size,
            is_fat: file.is_fat,
            last_opened: unix_now(),
        }
    }
}

/// Current time as Unix seconds.
fn unix_now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

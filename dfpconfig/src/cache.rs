//! On-disk cache of the last used request headers
//!
//! Only non-secret headers are kept: passwords and tokens never reach the
//! disk.

use crate::Config;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::{debug, warn};

/// File name of the header cache inside [`Config::home`]
pub const CACHE_FILE: &str = "dfp_api_cache.yaml";

/// Headers remembered between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedHeaders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_code: Option<String>,
}

impl Config {
    pub fn cache_path(&self) -> PathBuf {
        self.home.join(CACHE_FILE)
    }

    /// Reads the cached headers; a missing or unreadable cache is `None`.
    pub fn load_cached_headers(&self) -> Option<CachedHeaders> {
        let path = self.cache_path();
        let data = fs::read(&path).ok()?;
        match serde_yaml::from_slice(&data) {
            Ok(headers) => {
                debug!(cache = %path.display(), "Loaded cached headers");
                Some(headers)
            }
            Err(err) => {
                warn!(cache = %path.display(), "Ignoring unreadable header cache: {}", err);
                None
            }
        }
    }

    pub fn save_cached_headers(&self, headers: &CachedHeaders) -> Result<()> {
        fs::create_dir_all(&self.home)?;
        let yaml = serde_yaml::to_string(headers)?;
        fs::write(self.cache_path(), yaml)?;
        debug!(cache = %self.cache_path().display(), "Saved cached headers");
        Ok(())
    }
}

/**
 * ============================================================================
 * RANKINGS CONFIGURATION MODULE
 * ============================================================================
 *
 * PURPOSE: Settings document schema and persistence
 *
 * STORAGE: JSON document in the host-provided data directory
 * FILE PATH: {data_dir}/mc-rankings.json
 *
 * DOCUMENT LAYOUT:
 * {
 *   "license-key": "...", "server-key": "...", "server-name": "...",
 *   "api-endpoint": "...", "frontend-url": "...", "enabled": true,
 *   "leaderboards": { "<namespace>": { "<id>": { "title": "...",
 *     "metric": "...", "higherIsBetter": true, "secret-key": "...",
 *     "enabled": true } } }
 * }
 *
 * FUNCTIONALITY:
 * - Create the document with fresh identity keys on first run
 * - Load the document on every later run
 * - Persist new leaderboard records atomically (temp file + rename)
 *
 * ============================================================================
 */

use crate::rankings::error::{RankingsError, Result};
use crate::rankings::keys;
use crate::rankings::types::ServerIdentity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// File name of the settings document inside the data directory.
pub const SETTINGS_FILE: &str = "mc-rankings.json";

/// Compiled-in collector base URL, overridable through `api-endpoint`.
pub const DEFAULT_API_URL: &str = "https://mc-rankings.com/api/v1/";

/// Compiled-in leaderboard page template, overridable through `frontend-url`.
pub const DEFAULT_FRONTEND_URL: &str = "https://mc-rankings.com/<serverName>/<pluginName>/<id>";

fn default_api_endpoint() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_frontend_url() -> String {
    DEFAULT_FRONTEND_URL.to_string()
}

fn default_true() -> bool {
    true
}

/**
 * Persisted record of one leaderboard
 * The secret key is the leaderboard's permanent credential at the collector
 */
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardRecord {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub metric: String,

    #[serde(rename = "higherIsBetter", default)]
    pub higher_is_better: bool,

    #[serde(rename = "secret-key")]
    pub secret_key: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl LeaderboardRecord {
    /// Fresh record with a newly generated secret, enabled.
    pub fn generate(title: &str, metric: &str, higher_is_better: bool) -> Self {
        Self {
            title: title.to_string(),
            metric: metric.to_string(),
            higher_is_better,
            secret_key: keys::generate_key(),
            enabled: true,
        }
    }
}

/**
 * Complete settings document
 * Identity keys are required, everything else falls back to defaults
 */
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RankingsDocument {
    pub license_key: String,

    pub server_key: String,

    pub server_name: String,

    // Collector base URL
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    // Template with <serverName>, <pluginName> and <id> placeholders
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    // Global kill switch
    #[serde(default = "default_true")]
    pub enabled: bool,

    // namespace -> leaderboard id -> record
    #[serde(default)]
    pub leaderboards: BTreeMap<String, BTreeMap<u32, LeaderboardRecord>>,
}

impl RankingsDocument {
    /**
     * Document written on first-ever run
     * Generates license key, server key and a unique server name
     */
    pub fn generate() -> Self {
        Self {
            license_key: keys::generate_key(),
            server_key: keys::generate_key(),
            server_name: keys::generate_server_name(),
            api_endpoint: default_api_endpoint(),
            frontend_url: default_frontend_url(),
            enabled: true,
            leaderboards: BTreeMap::new(),
        }
    }

    pub fn identity(&self) -> ServerIdentity {
        ServerIdentity {
            license_key: self.license_key.clone(),
            server_key: self.server_key.clone(),
            server_name: self.server_name.clone(),
        }
    }

    pub fn leaderboard(&self, namespace: &str, id: u32) -> Option<&LeaderboardRecord> {
        self.leaderboards.get(namespace)?.get(&id)
    }
}

/**
 * Durable settings store
 * Loaded once at startup, written synchronously on the caller's thread
 */
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    created: bool,
    document: Mutex<RankingsDocument>,
}

impl ConfigStore {
    /**
     * Open the settings document in `data_dir`
     * Creates the directory and a fresh document if none exists yet
     */
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .map_err(|e| RankingsError::configuration("create directory for", data_dir, e))?;

        let path = data_dir.join(SETTINGS_FILE);

        if path.exists() {
            let document = load_document(&path)?;
            log::debug!("Loaded rankings settings from {}", path.display());
            return Ok(Self {
                path,
                created: false,
                document: Mutex::new(document),
            });
        }

        let document = RankingsDocument::generate();
        save_document(&path, &document)?;
        log::debug!("Created rankings settings at {}", path.display());

        Ok(Self {
            path,
            created: true,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when this process created the document (first-ever run).
    pub fn was_created(&self) -> bool {
        self.created
    }

    pub fn identity(&self) -> ServerIdentity {
        self.document().identity()
    }

    pub fn api_endpoint(&self) -> String {
        self.document().api_endpoint.clone()
    }

    pub fn frontend_url(&self) -> String {
        self.document().frontend_url.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.document().enabled
    }

    pub fn leaderboard(&self, namespace: &str, id: u32) -> Option<LeaderboardRecord> {
        self.document().leaderboard(namespace, id).cloned()
    }

    /**
     * Persist a leaderboard record unless one already exists
     *
     * The existence check and the write happen under the store lock, so two
     * racing first-creations produce exactly one record. The in-memory
     * document only changes once the file write succeeded.
     *
     * Returns true if a record was written.
     */
    pub fn insert_leaderboard_if_absent(
        &self,
        namespace: &str,
        id: u32,
        make: impl FnOnce() -> LeaderboardRecord,
    ) -> Result<bool> {
        let mut document = self.document();
        if document.leaderboard(namespace, id).is_some() {
            return Ok(false);
        }

        let mut updated = document.clone();
        updated
            .leaderboards
            .entry(namespace.to_string())
            .or_default()
            .insert(id, make());

        save_document(&self.path, &updated)?;
        *document = updated;

        log::debug!("Persisted leaderboard {}/{}", namespace, id);
        Ok(true)
    }

    fn document(&self) -> MutexGuard<'_, RankingsDocument> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_document(path: &Path) -> Result<RankingsDocument> {
    let json_str =
        fs::read_to_string(path).map_err(|e| RankingsError::configuration("read", path, e))?;

    serde_json::from_str(&json_str).map_err(|e| RankingsError::configuration("parse", path, e))
}

/**
 * Save document to disk atomically
 * Writes a temp file next to the target and renames it into place
 */
fn save_document(path: &Path, document: &RankingsDocument) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");

    let json_str = serde_json::to_string_pretty(document)
        .map_err(|e| RankingsError::configuration("serialize", path, e))?;

    fs::write(&temp_path, json_str)
        .map_err(|e| RankingsError::configuration("write", &temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| RankingsError::configuration("write", path, e))?;

    Ok(())
}

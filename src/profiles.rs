//! Per-identity profile store
//!
//! Each profile bundles the fingerprint-relevant settings and the cookie
//! jar for one browser identity. Profiles persist as a single JSON
//! document so readers never observe a partially-written store; every
//! mutation is a locked read-modify-write of the whole map.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

/// Profile store errors
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("profile {0} already exists")]
    AlreadyExists(String),

    #[error("profile {0} does not exist")]
    NotFound(String),

    #[error("invalid profile update: {0}")]
    InvalidUpdate(serde_json::Error),

    #[error("failed to encode profile store: {0}")]
    Encode(serde_json::Error),

    #[error("profile store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Browser viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

/// Spoofed geolocation coordinates
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single browser cookie
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Expiry as unix seconds; session cookie when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

/// Fingerprint settings applied when a session context is created
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSettings {
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub language: String,
    pub timezone: String,
    pub geolocation: Option<Geolocation>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            user_agent: None,
            language: "en-US".to_string(),
            timezone: "UTC".to_string(),
            geolocation: None,
        }
    }
}

/// One persisted browser identity
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub cookies: Vec<Cookie>,
    pub settings: ProfileSettings,
}

impl Profile {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            last_used: now,
            cookies: Vec::new(),
            settings: ProfileSettings::default(),
        }
    }
}

type ProfileMap = BTreeMap<String, Profile>;

/// Durable map from profile id to [`Profile`], stored as one JSON file.
///
/// The store is shared across concurrent sessions; the internal lock makes
/// each operation an atomic read-modify-write so near-simultaneous
/// persists from different instances never interleave.
pub struct ProfileStore {
    profile_file: PathBuf,
    lock: Mutex<()>,
}

impl ProfileStore {
    /// Open (or initialize) the store under the given directory.
    pub fn new(profile_dir: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let profile_dir = profile_dir.as_ref();
        std::fs::create_dir_all(profile_dir)?;

        let store = Self {
            profile_file: profile_dir.join("profiles.json"),
            lock: Mutex::new(()),
        };

        if !store.profile_file.exists() {
            store.save(&ProfileMap::new())?;
        }

        Ok(store)
    }

    /// Retrieve a profile, lazily creating and persisting the default one
    /// when the id is unknown.
    pub fn get(&self, profile_id: &str) -> Result<Profile, ProfileError> {
        let _guard = self.lock.lock();
        let mut profiles = self.load()?;

        if let Some(profile) = profiles.get(profile_id) {
            return Ok(profile.clone());
        }

        let profile = Profile::new();
        profiles.insert(profile_id.to_string(), profile.clone());
        self.save(&profiles)?;
        info!("Created profile {} on first access", profile_id);
        Ok(profile)
    }

    /// Create a new profile with default settings.
    pub fn create(&self, profile_id: &str) -> Result<Profile, ProfileError> {
        let _guard = self.lock.lock();
        let mut profiles = self.load()?;

        if profiles.contains_key(profile_id) {
            return Err(ProfileError::AlreadyExists(profile_id.to_string()));
        }

        let profile = Profile::new();
        profiles.insert(profile_id.to_string(), profile.clone());
        self.save(&profiles)?;
        Ok(profile)
    }

    /// Apply a partial update to a profile.
    ///
    /// The patch is deep-merged: JSON objects merge key-by-key, anything
    /// else (scalars, arrays) overwrites. `last_used` is bumped.
    pub fn update(&self, profile_id: &str, updates: Value) -> Result<Profile, ProfileError> {
        let _guard = self.lock.lock();
        let mut profiles = self.load()?;

        let profile = profiles
            .get(profile_id)
            .ok_or_else(|| ProfileError::NotFound(profile_id.to_string()))?;

        let mut merged =
            serde_json::to_value(profile).map_err(ProfileError::Encode)?;
        deep_merge(&mut merged, &updates);

        let mut profile: Profile =
            serde_json::from_value(merged).map_err(ProfileError::InvalidUpdate)?;
        profile.last_used = Utc::now();

        profiles.insert(profile_id.to_string(), profile.clone());
        self.save(&profiles)?;
        Ok(profile)
    }

    /// Replace a profile's cookie jar, bumping `last_used`.
    pub fn update_cookies(
        &self,
        profile_id: &str,
        cookies: Vec<Cookie>,
    ) -> Result<(), ProfileError> {
        let _guard = self.lock.lock();
        let mut profiles = self.load()?;

        let profile = profiles
            .get_mut(profile_id)
            .ok_or_else(|| ProfileError::NotFound(profile_id.to_string()))?;

        profile.cookies = cookies;
        profile.last_used = Utc::now();
        self.save(&profiles)
    }

    /// Delete a profile. Returns whether anything was removed.
    pub fn delete(&self, profile_id: &str) -> Result<bool, ProfileError> {
        let _guard = self.lock.lock();
        let mut profiles = self.load()?;

        if profiles.remove(profile_id).is_some() {
            self.save(&profiles)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// List all profile ids.
    pub fn list(&self) -> Result<Vec<String>, ProfileError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.keys().cloned().collect())
    }

    /// Remove profiles not used within `max_age_days`. Returns the number
    /// of profiles removed.
    pub fn cleanup(&self, max_age_days: i64) -> Result<usize, ProfileError> {
        let _guard = self.lock.lock();
        let profiles = self.load()?;
        let now = Utc::now();
        let max_age = Duration::days(max_age_days);

        let kept: ProfileMap = profiles
            .iter()
            .filter(|(_, profile)| now.signed_duration_since(profile.last_used) < max_age)
            .map(|(id, profile)| (id.clone(), profile.clone()))
            .collect();

        let removed = profiles.len() - kept.len();
        if removed > 0 {
            self.save(&kept)?;
            info!("Profile cleanup removed {} stale profiles", removed);
        }
        Ok(removed)
    }

    fn load(&self) -> Result<ProfileMap, ProfileError> {
        if !self.profile_file.exists() {
            return Ok(ProfileMap::new());
        }

        let content = std::fs::read_to_string(&self.profile_file)?;
        match serde_json::from_str(&content) {
            Ok(profiles) => Ok(profiles),
            Err(e) => {
                // Corrupt store: quarantine and start over rather than
                // failing every caller.
                let backup = self.profile_file.with_extension("json.bak");
                warn!(
                    "Profile store unreadable ({}), quarantining to {}",
                    e,
                    backup.display()
                );
                std::fs::rename(&self.profile_file, &backup)?;
                Ok(ProfileMap::new())
            }
        }
    }

    fn save(&self, profiles: &ProfileMap) -> Result<(), ProfileError> {
        let content =
            serde_json::to_string_pretty(profiles).map_err(ProfileError::Encode)?;
        std::fs::write(&self.profile_file, content)?;
        Ok(())
    }
}

/// Merge `patch` into `base`: objects merge recursively, everything else
/// overwrites.
fn deep_merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.get_mut(key) {
                    Some(slot) => deep_merge(slot, patch_value),
                    None => {
                        base_map.insert(key.clone(), patch_value.clone());
                    }
                }
            }
        }
        (slot, patch_value) => *slot = patch_value.clone(),
    }
}

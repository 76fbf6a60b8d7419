// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Persisted browser-session snapshots
//!
//! A snapshot is captured by a separate interactive login tool and consumed
//! here to skip the login flow: cookies plus per-origin localStorage. The
//! workflow treats it as immutable input and never writes it back.
//!
//! Absence and invalidity are distinct conditions: a missing file means no
//! login was ever captured (auth_missing), an unparseable file is a hard
//! error, and a *rejected* snapshot only shows up later as a login redirect.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A cookie restored into the automated session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    /// Unix seconds; -1 for session cookies
    #[serde(default)]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

/// One localStorage entry under an origin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageItem {
    pub name: String,
    pub value: String,
}

/// localStorage contents for a single origin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
    pub origin: String,
    #[serde(default)]
    pub local_storage: Vec<StorageItem>,
}

/// Previously captured authenticated browser-session state
///
/// Matches the storage-state JSON written by the interactive capture tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(default)]
    pub cookies: Vec<SnapshotCookie>,
    #[serde(default)]
    pub origins: Vec<OriginState>,
}

impl SessionSnapshot {
    /// Parse a snapshot from storage-state JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::session(format!("invalid session snapshot: {}", e)))
    }

    /// Serialize back to storage-state JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// localStorage items for one origin, if captured
    pub fn local_storage_for(&self, origin: &str) -> Option<HashMap<String, String>> {
        self.origins.iter().find(|o| o.origin == origin).map(|o| {
            o.local_storage
                .iter()
                .map(|item| (item.name.clone(), item.value.clone()))
                .collect()
        })
    }

    /// Whether the snapshot carries any state at all
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.origins.is_empty()
    }
}

/// Reads the single global session snapshot from disk
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store over the given snapshot path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot
    ///
    /// `Ok(None)` means no snapshot was ever captured; an unreadable or
    /// unparseable file is an error, not absence.
    pub fn load(&self) -> Result<Option<SessionSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path)?;
        Ok(Some(SessionSnapshot::from_json(&json)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "cookies": [
            {
                "name": "session_token",
                "value": "abc123",
                "domain": ".adobe.com",
                "path": "/",
                "expires": 1893456000,
                "httpOnly": true,
                "secure": true,
                "sameSite": "Lax"
            }
        ],
        "origins": [
            {
                "origin": "https://podcast.adobe.com",
                "localStorage": [
                    { "name": "ims_token", "value": "eyJhbGciOiJSUzI1NiJ9" }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_storage_state() {
        let snapshot = SessionSnapshot::from_json(FIXTURE).unwrap();

        assert_eq!(snapshot.cookies.len(), 1);
        assert_eq!(snapshot.cookies[0].name, "session_token");
        assert!(snapshot.cookies[0].http_only);

        let storage = snapshot
            .local_storage_for("https://podcast.adobe.com")
            .unwrap();
        assert_eq!(storage.get("ims_token").map(String::as_str), Some("eyJhbGciOiJSUzI1NiJ9"));
    }

    #[test]
    fn test_round_trip() {
        let snapshot = SessionSnapshot::from_json(FIXTURE).unwrap();
        let json = snapshot.to_json().unwrap();
        let again = SessionSnapshot::from_json(&json).unwrap();
        assert_eq!(again.cookies[0].value, "abc123");
        assert_eq!(again.origins[0].origin, "https://podcast.adobe.com");
    }

    #[test]
    fn test_invalid_json_is_error_not_absence() {
        assert!(SessionSnapshot::from_json("{not json").is_err());
    }

    #[test]
    fn test_store_absent_vs_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");

        let store = SessionStore::new(&path);
        assert!(store.load().unwrap().is_none());

        std::fs::write(&path, FIXTURE).unwrap();
        let snapshot = store.load().unwrap().unwrap();
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, "garbage").unwrap();

        assert!(SessionStore::new(&path).load().is_err());
    }
}

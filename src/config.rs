// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Workflow configuration

use std::path::PathBuf;
use std::time::Duration;

/// Default target: the enhancement SPA
pub const DEFAULT_TARGET_URL: &str = "https://podcast.adobe.com/en/enhance";

/// Realistic desktop user agent applied to the automated session
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Workflow configuration
///
/// Every wait in the workflow is bounded by one of these durations; there is
/// no unbounded wait anywhere. Tests shrink them to milliseconds.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Target application URL
    pub target_url: String,
    /// Path of the persisted session snapshot
    pub session_path: PathBuf,
    /// Where the diagnostic screenshot lands on upload-confirmation failure
    pub screenshot_path: PathBuf,
    /// User agent applied to the session
    pub user_agent: String,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Page-load timeout
    pub navigation_timeout: Duration,
    /// Bound on waiting for the SPA to hydrate (upload control visible)
    pub render_timeout: Duration,
    /// Settle delay after clearing a queued file
    pub queue_settle: Duration,
    /// Bound on the file-chooser event after clicking the upload control
    pub chooser_timeout: Duration,
    /// Number of one-per-interval polls for upload confirmation
    pub confirm_attempts: u32,
    /// Interval between upload-confirmation polls
    pub confirm_interval: Duration,
    /// Bound on server-side processing (download control visible)
    pub processing_timeout: Duration,
    /// Bound on the download completing once triggered
    pub download_timeout: Duration,
    /// URL substrings that identify a login/auth-provider redirect
    pub login_url_markers: Vec<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            session_path: PathBuf::from("adobe-auth.json"),
            screenshot_path: PathBuf::from("debug-upload-fail.png"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport_width: 1280,
            viewport_height: 720,
            navigation_timeout: Duration::from_secs(30),
            render_timeout: Duration::from_secs(30),
            queue_settle: Duration::from_secs(2),
            chooser_timeout: Duration::from_secs(10),
            confirm_attempts: 10,
            confirm_interval: Duration::from_secs(1),
            processing_timeout: Duration::from_secs(10 * 60),
            download_timeout: Duration::from_secs(5 * 60),
            login_url_markers: vec![
                "login".to_string(),
                "signin".to_string(),
                "auth.services.adobe.com".to_string(),
            ],
        }
    }
}

impl WorkflowConfig {
    /// Create a new workflow config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target URL
    pub fn target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = url.into();
        self
    }

    /// Set the session snapshot path
    pub fn session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = path.into();
        self
    }

    /// Set the diagnostic screenshot path
    pub fn screenshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot_path = path.into();
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the navigation timeout
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Set the render timeout
    pub fn render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// Set the processing timeout
    pub fn processing_timeout(mut self, timeout: Duration) -> Self {
        self.processing_timeout = timeout;
        self
    }

    /// Set the download timeout
    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Add a login-redirect URL marker
    pub fn login_url_marker(mut self, marker: impl Into<String>) -> Self {
        self.login_url_markers.push(marker.into());
        self
    }

    /// Check whether a URL looks like a login/auth-provider redirect
    pub fn is_login_url(&self, url: &str) -> bool {
        self.login_url_markers.iter().any(|m| url.contains(m))
    }

    /// Config with all waits collapsed, for exercising the state machine
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            navigation_timeout: Duration::from_millis(50),
            render_timeout: Duration::from_millis(50),
            queue_settle: Duration::from_millis(1),
            chooser_timeout: Duration::from_millis(50),
            confirm_interval: Duration::from_millis(1),
            processing_timeout: Duration::from_millis(50),
            download_timeout: Duration::from_millis(50),
            ..Default::default()
        }
    }
}

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Automation surface
//!
//! Capability contract between the workflow engine and whatever drives the
//! actual browser. The engine only sees the few observable predicates and
//! actions it needs; all selector and CDP detail stays inside the adapter,
//! which keeps the state machine testable against a scripted fake.

mod chrome;

pub use chrome::ChromeSurface;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::session::SessionSnapshot;

/// The UI controls the workflow observes and operates
///
/// These are the only points of contact with the remote application; how
/// each one is located (selector, label text) is the adapter's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Primary "choose files" upload control; its presence means the SPA
    /// has finished hydrating
    ChooseFiles,
    /// Delete/remove control for an already-queued file
    RemoveQueued,
    /// Download control; its appearance means processing completed
    Download,
}

/// Abstract browser-driving capability
///
/// All waits are bounded and report not-found instead of raising, so the
/// engine keeps full control over failure classification. The two one-shot
/// event operations (`upload_via_chooser`, `download_via_click`) are atomic
/// arm-then-trigger-then-await-both: the listener is armed strictly before
/// the click that produces the event, so callers cannot misorder the race.
#[async_trait]
pub trait AutomationSurface {
    /// Open a browser session restoring the given snapshot
    async fn open(&mut self, snapshot: &SessionSnapshot) -> Result<()>;

    /// Load a URL, bounded
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait for a control to be present; `false` means the bound elapsed
    async fn wait_for(&mut self, control: Control, timeout: Duration) -> Result<bool>;

    /// Point-in-time presence check, no waiting
    async fn is_present(&mut self, control: Control) -> Result<bool>;

    /// URL the page currently resolves to
    async fn current_url(&mut self) -> Result<String>;

    /// Full rendered text of the page
    async fn page_text(&mut self) -> Result<String>;

    /// Click a control
    async fn click(&mut self, control: Control) -> Result<()>;

    /// Arm a file-chooser listener, click `trigger`, await the chooser and
    /// attach `file` to it
    async fn upload_via_chooser(
        &mut self,
        trigger: Control,
        file: &Path,
        timeout: Duration,
    ) -> Result<()>;

    /// Arm a download listener, click `trigger`, await completion and
    /// persist the artifact to `dest`
    async fn download_via_click(
        &mut self,
        trigger: Control,
        dest: &Path,
        timeout: Duration,
    ) -> Result<()>;

    /// Save a screenshot of the current page
    async fn capture_screenshot(&mut self, path: &Path) -> Result<()>;

    /// Release all browser resources; must not fail the run
    async fn close(&mut self);
}

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! The upload/wait/download state machine
//!
//! The target application exposes no API and no structured feedback channel:
//! readiness, upload acceptance, completion and session validity are all
//! inferred from transient DOM state under bounded waits. Each phase resolves
//! to exactly one of: proceed, a classified failure, or an escalation to a
//! diagnostic capture. Failures are terminal; recovery is re-invocation.

use std::fmt;

use crate::config::WorkflowConfig;
use crate::error::Result;
use crate::job::{FailureKind, Job, UploadAttempt, WorkflowOutcome};
use crate::session::SessionSnapshot;
use crate::surface::{AutomationSurface, Control};

/// Workflow phases, in execution order
///
/// Linear, with two early exits: input/session validation before any browser
/// resource, and the auth check on render failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    ValidateInput,
    ValidateSession,
    Navigate,
    AwaitRender,
    ClearQueue,
    Upload,
    ConfirmUpload,
    AwaitProcessing,
    Download,
    VerifyOutput,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::ValidateInput => "validate_input",
            Phase::ValidateSession => "validate_session",
            Phase::Navigate => "navigate",
            Phase::AwaitRender => "await_render",
            Phase::ClearQueue => "clear_queue",
            Phase::Upload => "upload",
            Phase::ConfirmUpload => "confirm_upload",
            Phase::AwaitProcessing => "await_processing",
            Phase::Download => "download",
            Phase::VerifyOutput => "verify_output",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Drives one job to its terminal outcome
pub struct WorkflowEngine {
    config: WorkflowConfig,
}

impl WorkflowEngine {
    /// Create an engine with the given config
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Engine configuration
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run one job to completion
    ///
    /// Input and session are validated before any browser resource is
    /// acquired. Whatever happens afterwards, the surface is closed before
    /// the outcome is returned; close never produces a further error.
    pub async fn run<S: AutomationSurface + ?Sized>(
        &self,
        surface: &mut S,
        job: &Job,
        snapshot: Option<&SessionSnapshot>,
    ) -> WorkflowOutcome {
        tracing::debug!(phase = %Phase::ValidateInput, input = %job.input.display(), "validating input");
        if !job.input_exists() {
            return WorkflowOutcome::failure(
                FailureKind::InputMissing,
                format!("Input file not found: {}", job.input.display()),
            );
        }

        tracing::debug!(phase = %Phase::ValidateSession, "validating session snapshot");
        let Some(snapshot) = snapshot else {
            return WorkflowOutcome::failure(
                FailureKind::AuthMissing,
                format!(
                    "Session snapshot not found: {}. Capture a login session first.",
                    self.config.session_path.display()
                ),
            );
        };

        // Everything past this point holds browser resources. Unclassified
        // errors from the automation layer surface as generic with the
        // original message intact.
        let outcome = match self.drive(surface, job, snapshot).await {
            Ok(outcome) => outcome,
            Err(e) => WorkflowOutcome::failure(FailureKind::Generic, e.to_string()),
        };

        surface.close().await;
        outcome
    }

    async fn drive<S: AutomationSurface + ?Sized>(
        &self,
        surface: &mut S,
        job: &Job,
        snapshot: &SessionSnapshot,
    ) -> Result<WorkflowOutcome> {
        let config = &self.config;

        tracing::info!(phase = %Phase::Navigate, url = %config.target_url, "[1/5] navigating");
        surface.open(snapshot).await?;
        surface
            .navigate(&config.target_url, config.navigation_timeout)
            .await?;

        // The SPA hydrates asynchronously; the document load event is not
        // enough. The upload control appearing is the render-ready signal.
        tracing::info!(phase = %Phase::AwaitRender, "[2/5] waiting for page to render");
        if !surface
            .wait_for(Control::ChooseFiles, config.render_timeout)
            .await?
        {
            let url = surface.current_url().await.unwrap_or_default();
            tracing::warn!(%url, "upload control never appeared");
            if config.is_login_url(&url) {
                return Ok(WorkflowOutcome::failure(
                    FailureKind::AuthExpired,
                    "Session expired. Capture a fresh login session.",
                ));
            }
            return Ok(WorkflowOutcome::failure(
                FailureKind::NoUpload,
                "Could not find upload button on the page",
            ));
        }

        // The service keeps at most one queued file per account; an absent
        // delete control just means the queue is already empty.
        if surface.is_present(Control::RemoveQueued).await? {
            tracing::info!(phase = %Phase::ClearQueue, "removing existing file from queue");
            surface.click(Control::RemoveQueued).await?;
            tokio::time::sleep(config.queue_settle).await;
        }

        tracing::info!(phase = %Phase::Upload, file = %job.input.display(), "[3/5] uploading file");
        surface
            .upload_via_chooser(Control::ChooseFiles, &job.input, config.chooser_timeout)
            .await?;

        // No explicit acceptance signal exists; the input's basename showing
        // up in rendered text is the confirmation. A filename that already
        // appears elsewhere on the page will confirm spuriously.
        let basename = job.input_basename();
        let mut attempt = UploadAttempt::started();
        for second in 1..=config.confirm_attempts {
            tokio::time::sleep(config.confirm_interval).await;
            let text = surface.page_text().await?;
            if text.contains(&basename) {
                attempt.confirm(second);
                tracing::info!(
                    phase = %Phase::ConfirmUpload,
                    second,
                    "upload confirmed: {:?} found on page",
                    basename
                );
                break;
            }
        }
        if !attempt.confirmed {
            // The one diagnostic artifact: this is the most UI-fragile phase
            if let Err(e) = surface.capture_screenshot(&config.screenshot_path).await {
                tracing::warn!("diagnostic screenshot failed: {}", e);
            } else {
                tracing::warn!(
                    path = %config.screenshot_path.display(),
                    "upload not confirmed, screenshot saved"
                );
            }
            return Ok(WorkflowOutcome::failure(
                FailureKind::UploadFailed,
                format!(
                    "File {:?} not found on page after {}s. Upload may have failed.",
                    basename, config.confirm_attempts
                ),
            ));
        }

        // The download control appearing is the sole completion signal
        tracing::info!(
            phase = %Phase::AwaitProcessing,
            timeout_secs = config.processing_timeout.as_secs(),
            "[4/5] waiting for processing"
        );
        if !surface
            .wait_for(Control::Download, config.processing_timeout)
            .await?
        {
            return Ok(WorkflowOutcome::failure(
                FailureKind::Timeout,
                format!(
                    "Processing timed out ({} min). Download button not found.",
                    config.processing_timeout.as_secs() / 60
                ),
            ));
        }

        tracing::info!(phase = %Phase::Download, dest = %job.output.display(), "[5/5] downloading");
        surface
            .download_via_click(Control::Download, &job.output, config.download_timeout)
            .await?;

        // A save that reports success but produced nothing is still a failure
        tracing::debug!(phase = %Phase::VerifyOutput, "checking output artifact");
        if !job.output_exists() {
            return Ok(WorkflowOutcome::failure(
                FailureKind::DownloadFailed,
                "Download completed but file not found",
            ));
        }

        tracing::info!(phase = %Phase::Done, "job complete");
        Ok(WorkflowOutcome::Success)
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::Error;

    /// Scripted stand-in for the browser layer
    ///
    /// One-shot events are modeled faithfully: the chooser/download event
    /// fires synchronously at click time and is lost unless a listener was
    /// armed beforehand.
    struct FakeSurface {
        // behavior knobs
        render_ready: bool,
        resolved_url: String,
        queued_file: bool,
        chooser_fires: bool,
        confirm_at_poll: Option<u32>,
        processing_completes: bool,
        download_produces_file: bool,
        navigate_error: Option<String>,
        render_probe_failures: u32,

        // observations
        opened: bool,
        close_count: u32,
        clicks: Vec<Control>,
        text_polls: u32,
        screenshot: Option<PathBuf>,
        uploaded_file: Option<PathBuf>,
        chooser_armed: bool,
        chooser_event_lost: bool,
    }

    impl FakeSurface {
        fn happy() -> Self {
            Self {
                render_ready: true,
                resolved_url: "https://podcast.adobe.com/en/enhance".to_string(),
                queued_file: false,
                chooser_fires: true,
                confirm_at_poll: Some(3),
                processing_completes: true,
                download_produces_file: true,
                navigate_error: None,
                render_probe_failures: 0,
                opened: false,
                close_count: 0,
                clicks: Vec::new(),
                text_polls: 0,
                screenshot: None,
                uploaded_file: None,
                chooser_armed: false,
                chooser_event_lost: false,
            }
        }

        /// The triggering click, as the browser would run it: the one-shot
        /// chooser event fires here, synchronously, and is gone afterwards
        fn click_upload_control(&mut self) {
            self.clicks.push(Control::ChooseFiles);
            if self.chooser_fires && !self.chooser_armed {
                self.chooser_event_lost = true;
            }
        }
    }

    #[async_trait]
    impl AutomationSurface for FakeSurface {
        async fn open(&mut self, _snapshot: &SessionSnapshot) -> crate::error::Result<()> {
            self.opened = true;
            Ok(())
        }

        async fn navigate(&mut self, url: &str, _timeout: Duration) -> crate::error::Result<()> {
            if let Some(ref reason) = self.navigate_error {
                return Err(Error::navigation(url, reason.clone()));
            }
            Ok(())
        }

        async fn wait_for(
            &mut self,
            control: Control,
            _timeout: Duration,
        ) -> crate::error::Result<bool> {
            Ok(match control {
                Control::ChooseFiles => {
                    // Probes failing mid-redirect stay inside the bounded
                    // wait: the surface absorbs them and reports not-found
                    // at the deadline instead of raising
                    if self.render_probe_failures > 0 {
                        self.render_probe_failures = 0;
                        false
                    } else {
                        self.render_ready
                    }
                }
                Control::Download => self.processing_completes,
                Control::RemoveQueued => self.queued_file,
            })
        }

        async fn is_present(&mut self, control: Control) -> crate::error::Result<bool> {
            Ok(match control {
                Control::RemoveQueued => self.queued_file,
                Control::ChooseFiles => self.render_ready,
                Control::Download => self.processing_completes,
            })
        }

        async fn current_url(&mut self) -> crate::error::Result<String> {
            Ok(self.resolved_url.clone())
        }

        async fn page_text(&mut self) -> crate::error::Result<String> {
            self.text_polls += 1;
            let confirmed = self.uploaded_file.is_some()
                && self
                    .confirm_at_poll
                    .is_some_and(|at| self.text_polls >= at);
            if confirmed {
                let name = self
                    .uploaded_file
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(format!("Enhance Speech\n{}\nProcessing...", name))
            } else {
                Ok("Enhance Speech\nChoose files".to_string())
            }
        }

        async fn click(&mut self, control: Control) -> crate::error::Result<()> {
            self.clicks.push(control);
            if control == Control::RemoveQueued {
                self.queued_file = false;
            }
            Ok(())
        }

        async fn upload_via_chooser(
            &mut self,
            _trigger: Control,
            file: &Path,
            timeout: Duration,
        ) -> crate::error::Result<()> {
            // Armed strictly before the click; the event fires during the
            // click and must still be observed
            self.chooser_armed = true;
            self.click_upload_control();
            self.chooser_armed = false;

            if !self.chooser_fires || self.chooser_event_lost {
                return Err(Error::timeout("file chooser", timeout.as_millis() as u64));
            }
            self.uploaded_file = Some(file.to_path_buf());
            Ok(())
        }

        async fn download_via_click(
            &mut self,
            trigger: Control,
            dest: &Path,
            _timeout: Duration,
        ) -> crate::error::Result<()> {
            self.clicks.push(trigger);
            if self.download_produces_file {
                std::fs::write(dest, b"enhanced-audio")?;
            }
            Ok(())
        }

        async fn capture_screenshot(&mut self, path: &Path) -> crate::error::Result<()> {
            self.screenshot = Some(path.to_path_buf());
            Ok(())
        }

        async fn close(&mut self) {
            self.close_count += 1;
        }
    }

    fn fixture_job(dir: &tempfile::TempDir) -> Job {
        let input = dir.path().join("episode.wav");
        std::fs::write(&input, b"raw-audio").unwrap();
        Job::new(input, dir.path().join("enhanced.wav"))
    }

    fn engine() -> WorkflowEngine {
        WorkflowEngine::new(WorkflowConfig::for_tests())
    }

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot::default()
    }

    #[tokio::test]
    async fn missing_input_fails_before_browser() {
        let dir = tempfile::tempdir().unwrap();
        let job = Job::new(dir.path().join("absent.wav"), dir.path().join("out.wav"));
        let mut fake = FakeSurface::happy();

        let outcome = engine().run(&mut fake, &job, Some(&snapshot())).await;

        assert_eq!(outcome.exit_code(), 1);
        assert!(matches!(
            outcome,
            WorkflowOutcome::Failure { kind: FailureKind::InputMissing, .. }
        ));
        assert!(!fake.opened);
    }

    #[tokio::test]
    async fn missing_session_fails_before_browser() {
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();

        let outcome = engine().run(&mut fake, &job, None).await;

        assert_eq!(outcome.exit_code(), 2);
        assert!(matches!(
            outcome,
            WorkflowOutcome::Failure { kind: FailureKind::AuthMissing, .. }
        ));
        assert!(!fake.opened);
    }

    #[tokio::test]
    async fn login_redirect_is_auth_expired() {
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();
        fake.render_ready = false;
        fake.resolved_url = "https://auth.services.adobe.com/en_US/index.html".to_string();

        let outcome = engine().run(&mut fake, &job, Some(&snapshot())).await;

        assert_eq!(outcome.exit_code(), 3);
        assert!(matches!(
            outcome,
            WorkflowOutcome::Failure { kind: FailureKind::AuthExpired, .. }
        ));
        assert_eq!(fake.close_count, 1);
    }

    #[tokio::test]
    async fn probe_failures_during_redirect_still_classify_auth_expired() {
        // While the page actively redirects to the login provider, presence
        // probes can fail transiently; that must end in auth_expired via the
        // URL check, never in a generic failure
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();
        fake.render_ready = false;
        fake.render_probe_failures = 3;
        fake.resolved_url = "https://auth.services.adobe.com/en_US/index.html".to_string();

        let outcome = engine().run(&mut fake, &job, Some(&snapshot())).await;

        assert_eq!(outcome.exit_code(), 3);
        assert!(matches!(
            outcome,
            WorkflowOutcome::Failure { kind: FailureKind::AuthExpired, .. }
        ));
        assert_eq!(fake.close_count, 1);
    }

    #[tokio::test]
    async fn render_failure_without_redirect_is_no_upload() {
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();
        fake.render_ready = false;

        let outcome = engine().run(&mut fake, &job, Some(&snapshot())).await;

        assert_eq!(outcome.exit_code(), 1);
        assert!(matches!(
            outcome,
            WorkflowOutcome::Failure { kind: FailureKind::NoUpload, .. }
        ));
    }

    #[tokio::test]
    async fn unconfirmed_upload_takes_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();
        fake.confirm_at_poll = None;

        let eng = engine();
        let outcome = eng.run(&mut fake, &job, Some(&snapshot())).await;

        assert!(matches!(
            outcome,
            WorkflowOutcome::Failure { kind: FailureKind::UploadFailed, .. }
        ));
        assert_eq!(outcome.exit_code(), 1);
        // All polls exhausted, then exactly one diagnostic capture
        assert_eq!(fake.text_polls, eng.config().confirm_attempts);
        assert_eq!(fake.screenshot.as_deref(), Some(eng.config().screenshot_path.as_path()));
    }

    #[tokio::test]
    async fn processing_deadline_is_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();
        fake.processing_completes = false;

        let outcome = engine().run(&mut fake, &job, Some(&snapshot())).await;

        assert_eq!(outcome.exit_code(), 1);
        assert!(matches!(
            outcome,
            WorkflowOutcome::Failure { kind: FailureKind::Timeout, .. }
        ));
        // No screenshot for this failure; upload confirmation is the only
        // phase that captures one
        assert!(fake.screenshot.is_none());
    }

    #[tokio::test]
    async fn empty_download_is_download_failed() {
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();
        fake.download_produces_file = false;

        let outcome = engine().run(&mut fake, &job, Some(&snapshot())).await;

        assert_eq!(outcome.exit_code(), 1);
        assert!(matches!(
            outcome,
            WorkflowOutcome::Failure { kind: FailureKind::DownloadFailed, .. }
        ));
    }

    #[tokio::test]
    async fn end_to_end_success() {
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();

        let outcome = engine().run(&mut fake, &job, Some(&snapshot())).await;

        assert_eq!(outcome, WorkflowOutcome::Success);
        assert_eq!(outcome.exit_code(), 0);
        assert!(job.output_exists());
        // Confirmed at the third one-second poll
        assert_eq!(fake.text_polls, 3);
        assert_eq!(fake.uploaded_file.as_deref(), Some(job.input.as_path()));
        assert_eq!(fake.close_count, 1);
    }

    #[tokio::test]
    async fn queued_file_is_cleared_first() {
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();
        fake.queued_file = true;

        let outcome = engine().run(&mut fake, &job, Some(&snapshot())).await;

        assert_eq!(outcome, WorkflowOutcome::Success);
        assert!(fake.clicks.contains(&Control::RemoveQueued));
    }

    #[tokio::test]
    async fn consecutive_runs_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let eng = engine();

        for _ in 0..2 {
            let mut fake = FakeSurface::happy();
            let outcome = eng.run(&mut fake, &job, Some(&snapshot())).await;
            assert_eq!(outcome, WorkflowOutcome::Success);
            assert!(fake.opened);
            assert_eq!(fake.close_count, 1);
        }
    }

    #[tokio::test]
    async fn chooser_event_fired_on_trigger_is_still_observed() {
        // The fake fires the one-shot chooser event synchronously inside the
        // triggering click and drops it if no listener is armed. Success here
        // proves the listener is armed strictly before the trigger.
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();

        let outcome = engine().run(&mut fake, &job, Some(&snapshot())).await;

        assert_eq!(outcome, WorkflowOutcome::Success);
        assert!(!fake.chooser_event_lost);
    }

    #[tokio::test]
    async fn chooser_never_opening_is_generic() {
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();
        fake.chooser_fires = false;

        let outcome = engine().run(&mut fake, &job, Some(&snapshot())).await;

        assert_eq!(outcome.exit_code(), 1);
        assert!(matches!(
            outcome,
            WorkflowOutcome::Failure { kind: FailureKind::Generic, .. }
        ));
        assert_eq!(fake.close_count, 1);
    }

    #[tokio::test]
    async fn navigation_error_is_generic_with_cause() {
        let dir = tempfile::tempdir().unwrap();
        let job = fixture_job(&dir);
        let mut fake = FakeSurface::happy();
        fake.navigate_error = Some("net::ERR_CONNECTION_REFUSED".to_string());

        let outcome = engine().run(&mut fake, &job, Some(&snapshot())).await;

        match outcome {
            WorkflowOutcome::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::Generic);
                assert!(message.contains("net::ERR_CONNECTION_REFUSED"));
            }
            WorkflowOutcome::Success => panic!("expected failure"),
        }
        assert_eq!(fake.close_count, 1);
    }
}

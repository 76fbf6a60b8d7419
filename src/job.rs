// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Job description and workflow outcomes
//!
//! The failure taxonomy and its exit-code mapping are an external contract:
//! callers script against both the wire strings and the process exit codes,
//! so both are spelled out as explicit tables here.

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// A single upload/wait/download job
#[derive(Debug, Clone)]
pub struct Job {
    /// Source audio file to upload
    pub input: PathBuf,
    /// Destination path for the enhanced artifact
    pub output: PathBuf,
}

impl Job {
    /// Create a new job
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Base filename of the input, used to confirm the upload in page text
    pub fn input_basename(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Check the input file exists
    pub fn input_exists(&self) -> bool {
        self.input.exists()
    }

    /// Check the output artifact exists
    pub fn output_exists(&self) -> bool {
        self.output.exists()
    }
}

/// Classified failure causes, in order of workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Invalid invocation
    Args,
    /// Source artifact absent
    InputMissing,
    /// No session snapshot available
    AuthMissing,
    /// Session snapshot rejected by the remote (redirected to login)
    AuthExpired,
    /// Page loaded but the upload control never appeared
    NoUpload,
    /// Upload triggered but never confirmed within the polling window
    UploadFailed,
    /// Server-side processing exceeded the maximum wait
    Timeout,
    /// Download reported complete but the artifact is missing
    DownloadFailed,
    /// Any other failure, original message preserved
    Generic,
}

impl FailureKind {
    /// Wire string for the structured report
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Args => "args",
            FailureKind::InputMissing => "input_missing",
            FailureKind::AuthMissing => "auth_missing",
            FailureKind::AuthExpired => "auth_expired",
            FailureKind::NoUpload => "no_upload",
            FailureKind::UploadFailed => "upload_failed",
            FailureKind::Timeout => "timeout",
            FailureKind::DownloadFailed => "download_failed",
            FailureKind::Generic => "generic",
        }
    }

    /// Process exit code for this failure kind
    ///
    /// Stable contract: only the two auth conditions get dedicated codes,
    /// everything else is 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            FailureKind::AuthMissing => 2,
            FailureKind::AuthExpired => 3,
            FailureKind::Args
            | FailureKind::InputMissing
            | FailureKind::NoUpload
            | FailureKind::UploadFailed
            | FailureKind::Timeout
            | FailureKind::DownloadFailed
            | FailureKind::Generic => 1,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a workflow run
///
/// Exactly one is produced per run, then immediately reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// Artifact saved to the job's output path
    Success,
    /// Run failed with a classified cause
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl WorkflowOutcome {
    /// Create a failure outcome
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        WorkflowOutcome::Failure {
            kind,
            message: message.into(),
        }
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            WorkflowOutcome::Success => 0,
            WorkflowOutcome::Failure { kind, .. } => kind.exit_code(),
        }
    }

    /// Check if this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowOutcome::Success)
    }
}

/// Transient record of one upload trigger and its confirmation
///
/// Lives only for the duration of the confirmation polling window.
#[derive(Debug, Clone)]
pub struct UploadAttempt {
    /// When the file chooser was resolved
    pub triggered_at: Instant,
    /// Whether the filename was observed in page text
    pub confirmed: bool,
    /// One-based poll second at which confirmation happened
    pub confirmed_at_second: Option<u32>,
}

impl UploadAttempt {
    /// Record a fresh, unconfirmed attempt
    pub fn started() -> Self {
        Self {
            triggered_at: Instant::now(),
            confirmed: false,
            confirmed_at_second: None,
        }
    }

    /// Mark the attempt confirmed at the given poll second
    pub fn confirm(&mut self, second: u32) {
        self.confirmed = true;
        self.confirmed_at_second = Some(second);
    }
}

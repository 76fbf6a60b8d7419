// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Result reporting
//!
//! The structured channel is exactly one JSON line on stdout per run, plus
//! a process exit code. Human diagnostics stay on stderr (tracing). Both the
//! line shape and the exit codes are stable contracts for calling scripts.

use serde::Serialize;

use crate::job::{FailureKind, WorkflowOutcome};

/// The single structured line a run emits
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Report {
    Success {
        success: bool,
    },
    Failure {
        error: FailureKind,
        message: String,
    },
}

impl Report {
    /// Report for a terminal workflow outcome
    pub fn from_outcome(outcome: &WorkflowOutcome) -> Self {
        match outcome {
            WorkflowOutcome::Success => Report::Success { success: true },
            WorkflowOutcome::Failure { kind, message } => Report::Failure {
                error: *kind,
                message: message.clone(),
            },
        }
    }

    /// Report for an invocation error raised before a job exists
    pub fn args(message: impl Into<String>) -> Self {
        Report::Failure {
            error: FailureKind::Args,
            message: message.into(),
        }
    }

    /// The JSON line, without trailing newline
    pub fn to_line(&self) -> String {
        // Both variants are plain field structs; serialization cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| "{\"error\":\"generic\"}".to_string())
    }

    /// Exit code paired with this report
    pub fn exit_code(&self) -> u8 {
        match self {
            Report::Success { .. } => 0,
            Report::Failure { error, .. } => error.exit_code(),
        }
    }

    /// Print the line to stdout
    pub fn emit(&self) {
        println!("{}", self.to_line());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_line_is_exact() {
        let report = Report::from_outcome(&WorkflowOutcome::Success);
        assert_eq!(report.to_line(), r#"{"success":true}"#);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_failure_line_shape() {
        let outcome = WorkflowOutcome::failure(FailureKind::Timeout, "Processing timed out");
        let report = Report::from_outcome(&outcome);
        assert_eq!(
            report.to_line(),
            r#"{"error":"timeout","message":"Processing timed out"}"#
        );
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_auth_codes() {
        let missing = Report::from_outcome(&WorkflowOutcome::failure(
            FailureKind::AuthMissing,
            "no snapshot",
        ));
        assert_eq!(missing.exit_code(), 2);

        let expired = Report::from_outcome(&WorkflowOutcome::failure(
            FailureKind::AuthExpired,
            "redirected to login",
        ));
        assert_eq!(expired.exit_code(), 3);
    }

    #[test]
    fn test_args_report() {
        let report = Report::args("Usage: clearcast --input <file> --output <file>");
        assert_eq!(report.exit_code(), 1);
        assert!(report.to_line().starts_with(r#"{"error":"args""#));
    }
}

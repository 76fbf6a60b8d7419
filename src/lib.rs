// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # clearcast - UI-driven audio enhancement
//!
//! Drives a remote, UI-only audio enhancement web application through a real
//! browser: upload an audio file, wait for server-side processing, download
//! the enhanced artifact. The target gives no API and no structured feedback,
//! so every signal is inferred from transient DOM state under bounded waits,
//! and every outcome maps to a machine-readable report and exit code.
//!
//! ## Example
//!
//! ```rust,no_run
//! use clearcast::{ChromeSurface, Job, SessionStore, WorkflowConfig, WorkflowEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = WorkflowConfig::default();
//!     let snapshot = SessionStore::new(&config.session_path).load().ok().flatten();
//!
//!     let job = Job::new("raw.wav", "enhanced.wav");
//!     let engine = WorkflowEngine::new(config.clone());
//!     let mut surface = ChromeSurface::new(config);
//!
//!     let outcome = engine.run(&mut surface, &job, snapshot.as_ref()).await;
//!     println!("exit code {}", outcome.exit_code());
//! }
//! ```

pub mod config;
pub mod error;
pub mod job;
pub mod report;
pub mod session;
pub mod surface;
pub mod workflow;

// Re-exports for convenience

// Workflow
pub use workflow::{Phase, WorkflowEngine};

// Job model and outcomes
pub use job::{FailureKind, Job, UploadAttempt, WorkflowOutcome};

// Configuration
pub use config::{WorkflowConfig, DEFAULT_TARGET_URL, DEFAULT_USER_AGENT};

// Session snapshots
pub use session::{OriginState, SessionSnapshot, SessionStore, SnapshotCookie, StorageItem};

// Automation surface
pub use surface::{AutomationSurface, ChromeSurface, Control};

// Reporting
pub use report::Report;

// Errors
pub use error::{Error, Result};

/// clearcast version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Workflow engine
//!
//! Sequences one upload/wait/download job through its phases and classifies
//! every failure into the taxonomy. One terminal outcome per run, no retry.

mod engine;

pub use engine::{Phase, WorkflowEngine};

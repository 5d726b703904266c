// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation engine: the work queue, one-shot job triggers, the per-block
//! generator, and the orchestrator tying them together.

pub mod generator;
pub mod orchestrator;
pub mod queue;
pub mod scheduler;

pub use generator::{BlockGenerator, BlockOutcome};
pub use orchestrator::{EnqueueReport, GenerationService};
pub use queue::WorkQueue;
pub use scheduler::Scheduler;

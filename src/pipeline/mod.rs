//! Scoring pipeline.
//!
//! ```text
//! behavior features -> anomaly score -> sensitivity classification
//!   -> integrity check -> risk fusion -> conditional explanations
//!   -> conditional alert summary
//! ```
//!
//! [`ThreatDetectionPipeline::run`] is the single entry point the worker
//! calls per event; the submodules below are its components, each testable
//! in isolation.

pub mod behavior;
pub mod coordinator;
pub mod diff;
pub mod explanation;
pub mod fusion;
pub mod integrity;
pub mod sensitivity;

pub use coordinator::{IncomingAccess, PipelineResult, QueuedAccess, ThreatDetectionPipeline};

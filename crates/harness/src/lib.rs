//! Vector reconciliation and parallel execution engine for SLH-DSA ACVP testing.
//!
//! The harness reads the `prompt`, `expectedResults` and (for signature
//! verification) `internalProjection` files of each test family, merges them
//! case by case, and drives an external subject-under-test once per case.
//!
//! ```text
//! VectorIndex ──► reconcile ──► Invocation::build ──► Runner ──► ResultAggregator
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod harness;
pub mod invocation;
pub mod loader;
pub mod model;
pub mod reconcile;
pub mod report;
pub mod runner;

pub use config::HarnessConfig;
pub use engine::{AcvpEngine, InvocationResult, SubprocessEngine};
pub use error::{HarnessError, LaunchError, Result};
pub use harness::{prepare, prepare_family, run, run_prepared, PreparedFamily};
pub use invocation::Invocation;
pub use loader::{FamilyDocuments, FamilyFiles, VectorIndex};
pub use model::*;
pub use report::{CaseOutcome, FamilyReport, ResultAggregator, RunSummary, Tally, Verdict};
pub use runner::{Completion, Runner};

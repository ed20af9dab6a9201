//! # slhdsa-acvp
//!
//! ACVP conformance harness for SLH-DSA (FIPS 205) implementations.
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports functionality from its sub-crates:
//!
//! - [`slhdsa-acvp-harness`]: vector reconciliation and parallel execution
//! - [`slhdsa-acvp-params`]: file layout, selector tokens and parameter-set names
//!
//! The `acvp-client` binary wires both to the command line.

pub use slhdsa_acvp_harness as harness;
pub use slhdsa_acvp_params as params;

/// Common imports for harness users
pub mod prelude {
    pub use crate::harness::{
        AcvpEngine, HarnessConfig, HarnessError, Invocation, InvocationResult, MergedRecord,
        Result, Runner, RunSummary, SubprocessEngine, TestFamily, Verdict, VectorIndex,
    };
}

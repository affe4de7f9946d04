//! Provides API for the operator and related tooling.
#![warn(missing_docs)]

/// Benchmark module with the machinery shared by all benchmark tools.
pub mod benchmark;
/// Drill module for running drill HTTP load tests.
pub mod drill;
/// Labels module for managing resource labels.
#[cfg(feature = "controller")]
pub(crate) mod labels;
/// Tools module listing the benchmark tools the operator can run.
#[cfg(feature = "controller")]
pub mod tools;
/// Utils module for shared utility functions.
#[cfg(feature = "controller")]
pub mod utils;

/// A list of constants used in various K8s resources
#[cfg(feature = "controller")]
const CONTROLLER_NAME: &str = "loadbench";

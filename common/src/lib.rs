//! Provides types and functions shared by the loadbench binaries.
#![deny(missing_docs)]
#[cfg(feature = "telemetry")]
pub mod telemetry;

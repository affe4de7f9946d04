//! Shared machinery for running benchmark tools as Kubernetes jobs.
//!
//! Each benchmark tool defines its own custom resource and implements [`Benchmark`] for it.
//! The reconciler in [`controller`] is shared by all tools.
pub mod conditions;
#[cfg(feature = "controller")]
pub mod controller;
mod spec;

pub use spec::*;

use std::{collections::BTreeMap, fmt::Debug};

use k8s_openapi::{api::batch::v1::JobSpec, NamespaceResourceScope};
use kube::Resource;
use serde::de::DeserializeOwned;

/// Where the benchmark definition files come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkSource<'a> {
    /// File contents keyed by file name, written into a config map owned by the benchmark.
    Inline(&'a BTreeMap<String, String>),
    /// Name of an existing config map in the benchmark's namespace.
    ConfigMap(&'a str),
}

/// Reference to the config map holding the benchmark definition files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigArtifactRef {
    /// Name of the config map.
    pub name: String,
}

/// A benchmark resource that can never be turned into a job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSpec {
    /// Neither inline files nor a config map were given.
    #[error("one of benchmarksVolume or benchmarksConfigMap must be set")]
    MissingSource,
    /// Both inline files and a config map were given.
    #[error("only one of benchmarksVolume or benchmarksConfigMap may be set")]
    AmbiguousSource,
    /// The entry file path has no file name.
    #[error("benchmarkFile {0:?} does not name a file")]
    EmptyEntryFile(String),
    /// The entry file is not among the inline files.
    #[error("benchmarkFile {path:?} refers to {key:?} which is not a key of benchmarksVolume")]
    UnknownEntryFile {
        /// Entry file path as given.
        path: String,
        /// File name the path resolves to.
        key: String,
    },
}

/// A benchmark tool kind.
///
/// Implementors provide the translation from their resource into a job spec. The translation
/// must be pure: the same resource and artifact always produce the same job spec.
pub trait Benchmark:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Current status of the resource.
    fn benchmark_status(&self) -> Option<&BenchmarkStatus>;

    /// Validated source of the benchmark definition files.
    fn benchmark_source(&self) -> Result<BenchmarkSource<'_>, InvalidSpec>;

    /// Build the job spec running the benchmark with the files from `artifact`.
    fn job_spec(&self, artifact: &ConfigArtifactRef) -> JobSpec;
}

/// File name of the entry file, which is also its key in the config artifact.
pub fn entry_file_key(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Check that exactly one source is set and that it contains the entry file.
pub fn validate_source<'a>(
    inline: Option<&'a BTreeMap<String, String>>,
    config_map: Option<&'a str>,
    entry_file: &str,
) -> Result<BenchmarkSource<'a>, InvalidSpec> {
    let key = entry_file_key(entry_file);
    if key.is_empty() {
        return Err(InvalidSpec::EmptyEntryFile(entry_file.to_owned()));
    }
    let config_map = config_map.filter(|name| !name.is_empty());
    match (inline, config_map) {
        (Some(_), Some(_)) => Err(InvalidSpec::AmbiguousSource),
        (None, None) => Err(InvalidSpec::MissingSource),
        (None, Some(name)) => Ok(BenchmarkSource::ConfigMap(name)),
        (Some(files), None) if files.contains_key(key) => Ok(BenchmarkSource::Inline(files)),
        (Some(_), None) => Err(InvalidSpec::UnknownEntryFile {
            path: entry_file.to_owned(),
            key: key.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> BTreeMap<String, String> {
        BTreeMap::from_iter([
            ("the-benchmark.yml".to_owned(), "benchmark content".to_owned()),
            ("included-file.yml".to_owned(), "included content".to_owned()),
        ])
    }

    #[test]
    fn entry_file_key_is_base_name() {
        assert_eq!(entry_file_key("/benchmarks/the-benchmark.yml"), "the-benchmark.yml");
        assert_eq!(entry_file_key("the-benchmark.yml"), "the-benchmark.yml");
        assert_eq!(entry_file_key("/benchmarks/"), "");
    }

    #[test]
    fn inline_source_with_entry_file() {
        let files = files();
        assert_eq!(
            validate_source(Some(&files), None, "/benchmarks/the-benchmark.yml"),
            Ok(BenchmarkSource::Inline(&files))
        );
    }

    #[test]
    fn inline_source_without_entry_file() {
        let files = files();
        assert_eq!(
            validate_source(Some(&files), None, "/benchmarks/missing.yml"),
            Err(InvalidSpec::UnknownEntryFile {
                path: "/benchmarks/missing.yml".to_owned(),
                key: "missing.yml".to_owned(),
            })
        );
    }

    #[test]
    fn config_map_source() {
        assert_eq!(
            validate_source(None, Some("shared-benchmarks"), "plan.yml"),
            Ok(BenchmarkSource::ConfigMap("shared-benchmarks"))
        );
    }

    #[test]
    fn exactly_one_source() {
        let files = files();
        assert_eq!(
            validate_source(Some(&files), Some("shared"), "the-benchmark.yml"),
            Err(InvalidSpec::AmbiguousSource)
        );
        assert_eq!(
            validate_source(None, None, "the-benchmark.yml"),
            Err(InvalidSpec::MissingSource)
        );
        assert_eq!(
            validate_source(None, Some(""), "the-benchmark.yml"),
            Err(InvalidSpec::MissingSource)
        );
    }

    #[test]
    fn entry_file_must_name_a_file() {
        let files = files();
        assert_eq!(
            validate_source(Some(&files), None, "/benchmarks/"),
            Err(InvalidSpec::EmptyEntryFile("/benchmarks/".to_owned()))
        );
    }
}

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::benchmark::{BenchmarkStatus, ImageSpec, PodConfigurationSpec};

/// Primary CRD for running a drill HTTP load test.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "perf.loadbench.io",
    version = "v1alpha1",
    kind = "Drill",
    plural = "drills",
    status = "BenchmarkStatus",
    derive = "PartialEq",
    namespaced,
    printcolumn = r#"{"name":"Running", "type":"boolean", "jsonPath":".status.running"}"#,
    printcolumn = r#"{"name":"Completed", "type":"boolean", "jsonPath":".status.completed"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DrillSpec {
    /// Image running drill.
    pub image: ImageSpec,
    /// Benchmark definition files keyed by file name.
    /// They are mounted into the drill container under /benchmarks.
    pub benchmarks_volume: Option<BTreeMap<String, String>>,
    /// Name of an existing config map holding the benchmark definition files.
    /// Mutually exclusive with benchmarksVolume.
    pub benchmarks_config_map: Option<String>,
    /// Path of the benchmark file passed to drill, e.g. /benchmarks/benchmark.yml.
    pub benchmark_file: String,
    /// Additional command line options passed to drill, e.g. `--stats --quiet`.
    pub options: Option<String>,
    /// Pod level settings of the drill job.
    #[serde(default)]
    pub pod_config: PodConfigurationSpec,
}

use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{Affinity, ResourceRequirements, Toleration},
    apimachinery::pkg::apis::meta::v1::Condition,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Container image used to run a benchmark tool.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    /// Image reference, e.g. `xridge/drill:latest`.
    pub name: String,
    /// Pull policy for the image, one of Always, Never or IfNotPresent.
    pub pull_policy: Option<String>,
    /// Name of a secret in the same namespace used to pull the image.
    pub pull_secret: Option<String>,
}

/// Pod level settings applied to the benchmark workload.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodConfigurationSpec {
    /// Labels added to the benchmark pods.
    pub pod_labels: Option<BTreeMap<String, String>>,
    /// Annotations added to the benchmark pods.
    pub pod_annotations: Option<BTreeMap<String, String>>,
    /// Compute resources of the benchmark container.
    pub resources: Option<ResourceRequirements>,
    /// Scheduling constraints of the benchmark pods.
    #[serde(default)]
    pub pod_scheduling: PodSchedulingSpec,
}

/// Scheduling constraints, copied unmodified onto the pod spec.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodSchedulingSpec {
    /// Pod affinity and anti-affinity rules.
    pub affinity: Option<Affinity>,
    /// Tolerations of the benchmark pods.
    pub tolerations: Option<Vec<Toleration>>,
    /// Node labels the benchmark pods must be scheduled onto.
    pub node_selector: Option<BTreeMap<String, String>>,
    /// Schedule the benchmark pods onto this node directly.
    pub node_name: Option<String>,
}

/// Status shared by all benchmark resources.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkStatus {
    /// Generation of the resource these conditions describe.
    pub observed_generation: Option<i64>,
    /// True while the benchmark pods are running.
    #[serde(default)]
    pub running: bool,
    /// True once the benchmark has finished, successfully or not.
    #[serde(default)]
    pub completed: bool,
    /// Scheduled, Running, Complete and Failed conditions.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

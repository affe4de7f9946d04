//! Helper methods only available for tests

use std::collections::BTreeMap;

use k8s_openapi::api::{
    batch::v1::{Job, JobCondition, JobSpec, JobStatus},
    core::v1::ConfigMap,
};
use kube::{core::ObjectMeta, Resource};

use crate::{
    benchmark::{BenchmarkStatus, ImageSpec},
    drill::{Drill, DrillSpec},
    utils::test::WithStatus,
};

pub const DRILL_STATUS_PATH: &str =
    "/apis/perf.loadbench.io/v1alpha1/namespaces/test/drills/sample/status";
pub const JOBS_PATH: &str = "/apis/batch/v1/namespaces/test/jobs";

/// Path of a named job in the test namespace.
pub fn job_path(name: &str) -> String {
    format!("{JOBS_PATH}/{name}")
}

/// Path of a named config map in the test namespace.
pub fn config_map_path(name: &str) -> String {
    format!("/api/v1/namespaces/test/configmaps/{name}")
}

impl DrillSpec {
    /// A drill spec with inline benchmark files
    pub fn test() -> Self {
        Self {
            image: ImageSpec {
                name: "xridge/drill:test".to_owned(),
                pull_policy: Some("Always".to_owned()),
                pull_secret: None,
            },
            benchmarks_volume: Some(BTreeMap::from_iter([
                ("the-benchmark.yml".to_owned(), "benchmark content".to_owned()),
                ("included-file.yml".to_owned(), "included content".to_owned()),
            ])),
            benchmark_file: "/benchmarks/the-benchmark.yml".to_owned(),
            options: Some("--stats".to_owned()),
            ..Default::default()
        }
    }
}

// Add tests specific implementation to the Drill
impl Drill {
    /// A normal test drill at generation 1
    pub fn test() -> Self {
        let mut drill = Drill::new("sample", DrillSpec::test());
        let meta = drill.meta_mut();
        meta.namespace = Some("test".to_owned());
        meta.uid = Some("sample-uid".to_owned());
        meta.generation = Some(1);
        meta.resource_version = Some("1".to_owned());
        drill
    }
    /// Modify a drill to have an expected spec
    pub fn with_spec(self, spec: DrillSpec) -> Self {
        Self { spec, ..self }
    }
    /// Modify a drill to be at a given generation
    pub fn with_generation(mut self, generation: i64) -> Self {
        self.meta_mut().generation = Some(generation);
        self
    }
}

impl WithStatus for Drill {
    type Status = BenchmarkStatus;
    /// Modify a drill to have an expected status
    fn with_status(self, status: BenchmarkStatus) -> Self {
        Self {
            status: Some(status),
            ..self
        }
    }
}

/// A job as the API server reports it for the test drill.
pub fn drill_job(name: &str, status: Option<JobStatus>) -> Job {
    let owner = Drill::test()
        .controller_owner_ref(&())
        .expect("test drill should have an owner reference");
    Job {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some("test".to_owned()),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(JobSpec::default()),
        status,
    }
}

/// Job status with pods running.
pub fn active_status() -> JobStatus {
    JobStatus {
        active: Some(1),
        ..Default::default()
    }
}

/// Job status with a single true condition.
pub fn finished_status(type_: &str, message: Option<&str>) -> JobStatus {
    JobStatus {
        conditions: Some(vec![JobCondition {
            type_: type_.to_owned(),
            status: "True".to_owned(),
            message: message.map(str::to_owned),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

/// A pre-existing config map holding benchmark files.
pub fn shared_config_map() -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some("shared-benchmarks".to_owned()),
            namespace: Some("test".to_owned()),
            ..Default::default()
        },
        data: Some(BTreeMap::from_iter([(
            "plan.yml".to_owned(),
            "benchmark content".to_owned(),
        )])),
        ..Default::default()
    }
}

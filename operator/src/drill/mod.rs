//! Drill is a k8s custom resource that runs the drill HTTP load testing tool.
pub mod job;
mod spec;
#[cfg(all(test, feature = "controller"))]
pub mod stub;

pub use spec::*;

use k8s_openapi::api::batch::v1::JobSpec;

use crate::benchmark::{
    validate_source, Benchmark, BenchmarkSource, BenchmarkStatus, ConfigArtifactRef, InvalidSpec,
};

impl Benchmark for Drill {
    fn benchmark_status(&self) -> Option<&BenchmarkStatus> {
        self.status.as_ref()
    }

    fn benchmark_source(&self) -> Result<BenchmarkSource<'_>, InvalidSpec> {
        validate_source(
            self.spec.benchmarks_volume.as_ref(),
            self.spec.benchmarks_config_map.as_deref(),
            &self.spec.benchmark_file,
        )
    }

    fn job_spec(&self, artifact: &ConfigArtifactRef) -> JobSpec {
        job::job_spec(&self.spec, artifact)
    }
}

/// Start a controller for the Drill CRD.
#[cfg(feature = "controller")]
pub async fn run(k_client: kube::Client) {
    crate::benchmark::controller::run::<Drill>(k_client).await
}

use std::{sync::Arc, time::Duration};

use futures::stream::StreamExt;
use k8s_openapi::{
    api::{batch::v1::Job, core::v1::ConfigMap},
    apimachinery::pkg::apis::meta::v1::OwnerReference,
};
use kube::{
    api::{Patch, PatchParams},
    client::Client,
    runtime::{
        controller::Action,
        watcher::{self, Config},
        Controller,
    },
    Api, Resource, ResourceExt,
};
use opentelemetry::{global, metrics::Counter, KeyValue};
use tracing::{debug, error, info, warn};

use crate::{
    benchmark::{
        conditions::{JobPhase, COMPLETE},
        Benchmark, BenchmarkSource, BenchmarkStatus, ConfigArtifactRef,
    },
    labels::{benchmark_labels, MANAGED_BY_LABEL_SELECTOR},
    utils::{apply_config_map, create_job, Clock, Context},
};

/// Handle errors during reconciliation.
fn on_error<B: Benchmark>(
    benchmark: Arc<B>,
    error: &Error,
    _context: Arc<Context<impl Clock>>,
) -> Action {
    warn!(name = benchmark.name_any(), %error, "reconcile failed, requeueing");
    Action::requeue(Duration::from_secs(5))
}

/// Errors produced by the reconcile function.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Talking to the API server failed.
    #[error("Kube error: {source}")]
    Kube {
        /// Error reported by the client.
        #[from]
        source: kube::Error,
    },
    /// Benchmarks are namespaced, a resource without a namespace can't be reconciled.
    #[error("{kind} {name} has no namespace")]
    MissingNamespace {
        /// Kind of the benchmark resource.
        kind: String,
        /// Name of the benchmark resource.
        name: String,
    },
    /// The config map referenced by the benchmark does not exist (yet).
    #[error("config map {0} referenced by the benchmark does not exist")]
    MissingConfigArtifact(String),
    /// A job with the benchmark's job name exists but belongs to something else.
    #[error("job {0} exists but is not controlled by the benchmark")]
    ForeignJob(String),
}

/// Start a controller for a benchmark CRD.
pub async fn run<B: Benchmark>(k_client: Client) {
    let context = Arc::new(Context::new(k_client.clone()));

    let benchmarks: Api<B> = Api::all(k_client.clone());
    let jobs = Api::<Job>::all(k_client.clone());

    Controller::new(benchmarks, Config::default())
        .owns(
            jobs,
            watcher::Config::default().labels(MANAGED_BY_LABEL_SELECTOR),
        )
        .shutdown_on_signal()
        .run(reconcile::<B>, on_error::<B>, context)
        .for_each(|rec_res| async move {
            match rec_res {
                Ok((benchmark, _)) => {
                    debug!(benchmark.name, "reconcile success");
                }
                Err(err) => {
                    error!(?err, "reconcile error")
                }
            }
        })
        .await;
}

/// Perform a reconcile pass for a benchmark CRD
pub(crate) async fn reconcile<B: Benchmark>(
    benchmark: Arc<B>,
    cx: Arc<Context<impl Clock>>,
) -> Result<Action, Error> {
    let result = reconcile_(benchmark, cx.clone()).await;
    cx.metrics.reconcile(&B::kind(&()), result.is_ok());
    result
}

/// Name of the job and config map belonging to one generation of a benchmark.
pub fn workload_name(benchmark: &impl Resource) -> String {
    format!(
        "{}-{}",
        benchmark.meta().name.as_deref().unwrap_or_default(),
        benchmark.meta().generation.unwrap_or_default()
    )
}

/// Perform a reconcile pass for a benchmark CRD
async fn reconcile_<B: Benchmark>(
    benchmark: Arc<B>,
    cx: Arc<Context<impl Clock>>,
) -> Result<Action, Error> {
    let name = benchmark.name_any();
    let generation = benchmark.meta().generation.unwrap_or_default();

    // Conditions of an older generation describe an older job.
    let mut status = match benchmark.benchmark_status() {
        Some(status) if status.observed_generation == Some(generation) => status.clone(),
        _ => BenchmarkStatus::for_generation(generation),
    };
    if status.is_finished() {
        debug!(name, generation, "benchmark finished, nothing to do");
        return Ok(Action::await_change());
    }

    let ns = benchmark.namespace().ok_or_else(|| Error::MissingNamespace {
        kind: B::kind(&()).to_string(),
        name: name.clone(),
    })?;
    let job_name = workload_name(benchmark.as_ref());
    let jobs: Api<Job> = Api::namespaced(cx.k_client.clone(), &ns);

    let job = match jobs.get_opt(&job_name).await? {
        Some(job) => job,
        None => {
            let source = match benchmark.benchmark_source() {
                Ok(source) => source,
                Err(err) => {
                    warn!(name, generation, %err, "benchmark can not be run");
                    if status.reject("InvalidSpec", &err.to_string(), cx.clock.now()) {
                        patch_status(cx.clone(), benchmark.as_ref(), &ns, &status).await?;
                        cx.metrics.outcome(&B::kind(&()), "invalid");
                    }
                    return Ok(Action::await_change());
                }
            };
            let orefs = benchmark
                .controller_owner_ref(&())
                .map(|oref| vec![oref])
                .unwrap_or_default();
            let artifact =
                config_artifact(cx.clone(), &ns, &job_name, orefs.clone(), &name, source).await?;
            let job = create_job(
                cx.clone(),
                &ns,
                orefs,
                &job_name,
                benchmark_labels(&name),
                benchmark.job_spec(&artifact),
            )
            .await?;
            info!(name, generation, job_name, "created benchmark job");
            job
        }
    };
    // A conflicting create reads back whichever job holds the name.
    if !is_controlled_by(&job, benchmark.as_ref()) {
        return Err(Error::ForeignJob(job_name));
    }

    let phase = JobPhase::from(&job);
    debug!(name, generation, ?phase, "observed benchmark job");
    if status.observe(&phase, cx.clock.now()) {
        patch_status(cx.clone(), benchmark.as_ref(), &ns, &status).await?;
        if phase.is_terminal() {
            let outcome = if status.is_true(COMPLETE) {
                "complete"
            } else {
                "failed"
            };
            cx.metrics.outcome(&B::kind(&()), outcome);
        }
    }

    // The job is owned, so any change to it triggers the next pass.
    Ok(Action::await_change())
}

/// Make sure the config map with the benchmark files exists and return a reference to it.
async fn config_artifact(
    cx: Arc<Context<impl Clock>>,
    ns: &str,
    artifact_name: &str,
    orefs: Vec<OwnerReference>,
    benchmark_name: &str,
    source: BenchmarkSource<'_>,
) -> Result<ConfigArtifactRef, Error> {
    match source {
        BenchmarkSource::Inline(files) => {
            apply_config_map(
                cx,
                ns,
                orefs,
                artifact_name,
                benchmark_labels(benchmark_name),
                files.clone(),
            )
            .await?;
            Ok(ConfigArtifactRef {
                name: artifact_name.to_owned(),
            })
        }
        BenchmarkSource::ConfigMap(name) => {
            let config_maps: Api<ConfigMap> = Api::namespaced(cx.k_client.clone(), ns);
            if config_maps.get_opt(name).await?.is_none() {
                return Err(Error::MissingConfigArtifact(name.to_owned()));
            }
            Ok(ConfigArtifactRef {
                name: name.to_owned(),
            })
        }
    }
}

fn is_controlled_by(job: &Job, benchmark: &impl Resource) -> bool {
    let uid = benchmark.meta().uid.as_deref();
    job.owner_references()
        .iter()
        .any(|oref| oref.controller == Some(true) && Some(oref.uid.as_str()) == uid)
}

/// Merge patch body for the status.
///
/// Carries the resource version the status was computed from, so a write based on a stale
/// copy of the resource fails with a conflict instead of overwriting newer conditions.
fn status_patch(benchmark: &impl Resource, status: &BenchmarkStatus) -> serde_json::Value {
    match &benchmark.meta().resource_version {
        Some(version) => serde_json::json!({
            "metadata": { "resourceVersion": version },
            "status": status,
        }),
        None => serde_json::json!({ "status": status }),
    }
}

async fn patch_status<B: Benchmark>(
    cx: Arc<Context<impl Clock>>,
    benchmark: &B,
    ns: &str,
    status: &BenchmarkStatus,
) -> Result<(), kube::Error> {
    let benchmarks: Api<B> = Api::namespaced(cx.k_client.clone(), ns);
    benchmarks
        .patch_status(
            &benchmark.name_any(),
            &PatchParams::default(),
            &Patch::Merge(status_patch(benchmark, status)),
        )
        .await?;
    Ok(())
}

/// Counters recorded by the benchmark controllers.
pub struct Metrics {
    reconciles: Counter<u64>,
    outcomes: Counter<u64>,
}

impl Metrics {
    /// Create the instruments on the global meter.
    pub fn init() -> Self {
        let meter = global::meter("loadbench");
        let reconciles = meter
            .u64_counter("benchmark_reconcile_count")
            .with_description("Number of benchmark reconciles")
            .init();
        let outcomes = meter
            .u64_counter("benchmark_outcome_count")
            .with_description("Number of benchmarks that reached a final state")
            .init();
        Self {
            reconciles,
            outcomes,
        }
    }

    fn reconcile(&self, kind: &str, ok: bool) {
        self.reconciles.add(
            1,
            &[
                KeyValue::new("kind", kind.to_owned()),
                KeyValue::new("result", if ok { "ok" } else { "err" }),
            ],
        );
    }

    fn outcome(&self, kind: &str, outcome: &'static str) {
        self.outcomes.add(
            1,
            &[
                KeyValue::new("kind", kind.to_owned()),
                KeyValue::new("outcome", outcome),
            ],
        );
    }
}

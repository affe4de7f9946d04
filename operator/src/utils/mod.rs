//! Utils is shared functions and constants for the controller

use std::{collections::BTreeMap, sync::Arc};

use k8s_openapi::{
    api::{
        batch::v1::{Job, JobSpec},
        core::v1::ConfigMap,
    },
    apimachinery::pkg::apis::meta::v1::OwnerReference,
    chrono::{DateTime, Utc},
};
use kube::{
    api::{Patch, PatchParams, PostParams},
    client::Client,
    core::ObjectMeta,
    Api,
};

use crate::{benchmark::controller::Metrics, CONTROLLER_NAME};

/// Operator Context
pub struct Context<C> {
    /// Kube client
    pub k_client: Client,
    /// Clock that provide the current time
    pub clock: C,
    /// Controller metrics
    pub metrics: Metrics,
}

impl Context<UtcClock> {
    /// Create new context
    pub fn new(k_client: Client) -> Self {
        Context {
            k_client,
            clock: UtcClock,
            metrics: Metrics::init(),
        }
    }
}

/// Provides the current time.
pub trait Clock {
    /// Report the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Provides the current time using real time.
pub struct UtcClock;
impl Clock for UtcClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Apply a config map
pub async fn apply_config_map(
    cx: Arc<Context<impl Clock>>,
    ns: &str,
    orefs: Vec<OwnerReference>,
    name: &str,
    labels: Option<BTreeMap<String, String>>,
    data: BTreeMap<String, String>,
) -> Result<(), kube::error::Error> {
    let serverside = PatchParams::apply(CONTROLLER_NAME);
    let config_maps: Api<ConfigMap> = Api::namespaced(cx.k_client.clone(), ns);
    // Apply config map
    let map_data = ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            owner_references: Some(orefs),
            labels,
            ..ObjectMeta::default()
        },
        data: Some(data),
        ..Default::default()
    };
    config_maps
        .patch(name, &serverside, &Patch::Apply(map_data))
        .await?;
    Ok(())
}

/// Create a Job unless one with the same name exists.
///
/// Jobs are not updated once created, an existing job is returned as is.
pub async fn create_job(
    cx: Arc<Context<impl Clock>>,
    ns: &str,
    orefs: Vec<OwnerReference>,
    name: &str,
    labels: Option<BTreeMap<String, String>>,
    spec: JobSpec,
) -> Result<Job, kube::error::Error> {
    let jobs: Api<Job> = Api::namespaced(cx.k_client.clone(), ns);

    let job: Job = Job {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            owner_references: Some(orefs),
            labels,
            ..ObjectMeta::default()
        },
        spec: Some(spec),
        ..Default::default()
    };
    match jobs.create(&PostParams::default(), &job).await {
        Ok(job) => Ok(job),
        Err(kube::Error::Api(err)) if err.reason == "AlreadyExists" => jobs.get(name).await,
        Err(e) => Err(e),
    }
}

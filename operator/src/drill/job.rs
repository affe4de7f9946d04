use k8s_openapi::api::{
    batch::v1::JobSpec,
    core::v1::{
        ConfigMapVolumeSource, Container, LocalObjectReference, PodSpec, PodTemplateSpec, Volume,
        VolumeMount,
    },
};
use kube::core::ObjectMeta;

use crate::{
    benchmark::{entry_file_key, ConfigArtifactRef},
    drill::DrillSpec,
};

/// Directory the benchmark definition files are mounted at.
pub const BENCHMARKS_MOUNT_PATH: &str = "/benchmarks";
const BENCHMARKS_VOLUME_NAME: &str = "benchmarks";
const BENCHMARK_FLAG: &str = "--benchmark";

/// Path of the entry file as seen from inside the container.
///
/// Always derived from the mount path and the file name, the directory given by the user is
/// ignored.
pub fn entry_file_arg(spec: &DrillSpec) -> String {
    format!(
        "{BENCHMARKS_MOUNT_PATH}/{}",
        entry_file_key(&spec.benchmark_file)
    )
}

/// Arguments of the drill container: user options first, then the benchmark file.
pub fn args(spec: &DrillSpec) -> Vec<String> {
    let mut args: Vec<String> = spec
        .options
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_owned)
        .collect();
    // Last, so user options can't change which file is run.
    args.push(BENCHMARK_FLAG.to_owned());
    args.push(entry_file_arg(spec));
    args
}

/// Build the drill job spec.
pub fn job_spec(spec: &DrillSpec, artifact: &ConfigArtifactRef) -> JobSpec {
    let image_pull_secrets = spec
        .image
        .pull_secret
        .as_ref()
        .filter(|secret| !secret.is_empty())
        .map(|secret| {
            vec![LocalObjectReference {
                name: Some(secret.to_owned()),
            }]
        });
    let scheduling = &spec.pod_config.pod_scheduling;

    JobSpec {
        template: PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: spec.pod_config.pod_labels.clone(),
                annotations: spec.pod_config.pod_annotations.clone(),
                ..Default::default()
            }),
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "drill".to_owned(),
                    image: Some(spec.image.name.to_owned()),
                    image_pull_policy: spec.image.pull_policy.clone(),
                    command: Some(vec!["drill".to_owned()]),
                    args: Some(args(spec)),
                    resources: spec.pod_config.resources.clone(),
                    volume_mounts: Some(vec![VolumeMount {
                        mount_path: BENCHMARKS_MOUNT_PATH.to_owned(),
                        name: BENCHMARKS_VOLUME_NAME.to_owned(),
                        read_only: Some(true),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }],
                image_pull_secrets,
                volumes: Some(vec![Volume {
                    config_map: Some(ConfigMapVolumeSource {
                        name: Some(artifact.name.to_owned()),
                        ..Default::default()
                    }),
                    name: BENCHMARKS_VOLUME_NAME.to_owned(),
                    ..Default::default()
                }]),
                affinity: scheduling.affinity.clone(),
                tolerations: scheduling.tolerations.clone(),
                node_selector: scheduling.node_selector.clone(),
                node_name: scheduling.node_name.clone(),
                restart_policy: Some("Never".to_owned()),
                ..Default::default()
            }),
        },
        ..Default::default()
    }
}

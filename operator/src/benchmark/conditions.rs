//! Maps the state of a benchmark job onto the benchmark status conditions.
use k8s_openapi::{
    api::batch::v1::Job,
    apimachinery::pkg::apis::meta::v1::{Condition, Time},
    chrono::{DateTime, Utc},
};

use crate::benchmark::BenchmarkStatus;

/// The benchmark job has been created.
pub const SCHEDULED: &str = "Scheduled";
/// At least one benchmark pod is active.
pub const RUNNING: &str = "Running";
/// The benchmark job finished successfully.
pub const COMPLETE: &str = "Complete";
/// The benchmark job failed, or the benchmark could not be started at all.
pub const FAILED: &str = "Failed";

/// Observed state of a benchmark job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPhase {
    /// Created but no pod is active yet.
    Pending,
    /// At least one pod is active.
    Running,
    /// The job reported Complete.
    Succeeded,
    /// The job reported Failed.
    Failed {
        /// Message of the job's Failed condition.
        message: Option<String>,
    },
}

impl JobPhase {
    /// Reports if the job will not change anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Succeeded | JobPhase::Failed { .. })
    }
}

impl From<&Job> for JobPhase {
    fn from(job: &Job) -> Self {
        let Some(status) = &job.status else {
            return JobPhase::Pending;
        };
        let conditions = status.conditions.as_deref().unwrap_or_default();
        let is_true = |type_: &str| {
            conditions
                .iter()
                .find(|c| c.type_ == type_ && c.status == "True")
        };
        if let Some(failed) = is_true("Failed") {
            JobPhase::Failed {
                message: failed.message.clone(),
            }
        } else if is_true("Complete").is_some() {
            JobPhase::Succeeded
        } else if status.active.unwrap_or_default() > 0 {
            JobPhase::Running
        } else {
            JobPhase::Pending
        }
    }
}

impl BenchmarkStatus {
    /// Empty status for a generation of a benchmark resource.
    pub fn for_generation(generation: i64) -> Self {
        Self {
            observed_generation: Some(generation),
            ..Default::default()
        }
    }

    /// Find a condition by its type.
    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Reports if the condition of the given type is present and true.
    pub fn is_true(&self, type_: &str) -> bool {
        self.condition(type_).map_or(false, |c| c.status == "True")
    }

    /// Reports if a terminal condition has been recorded.
    pub fn is_finished(&self) -> bool {
        self.is_true(COMPLETE) || self.is_true(FAILED)
    }

    /// Record the observed job phase, returning true if the status changed.
    ///
    /// `Running` is only set once the job has active pods, a pending job sets `Scheduled` alone.
    /// Once a terminal condition is set the status is frozen and later observations are ignored.
    pub fn observe(&mut self, phase: &JobPhase, now: DateTime<Utc>) -> bool {
        if self.is_finished() {
            return false;
        }
        let before = self.clone();
        self.set_condition(
            SCHEDULED,
            true,
            "JobCreated",
            "benchmark job has been created",
            now,
        );
        match phase {
            JobPhase::Pending => {}
            JobPhase::Running => {
                self.set_condition(RUNNING, true, "PodsActive", "benchmark pods are running", now);
            }
            JobPhase::Succeeded => {
                self.finish_running(now);
                self.set_condition(
                    COMPLETE,
                    true,
                    "JobSucceeded",
                    "benchmark job finished successfully",
                    now,
                );
            }
            JobPhase::Failed { message } => {
                self.finish_running(now);
                self.set_condition(
                    FAILED,
                    true,
                    "JobFailed",
                    message.as_deref().unwrap_or("benchmark job failed"),
                    now,
                );
            }
        }
        self.running = *phase == JobPhase::Running;
        self.completed = phase.is_terminal();
        *self != before
    }

    /// Record that the benchmark can never run for this generation.
    pub fn reject(&mut self, reason: &str, message: &str, now: DateTime<Utc>) -> bool {
        if self.is_finished() {
            return false;
        }
        let before = self.clone();
        self.set_condition(FAILED, true, reason, message, now);
        self.running = false;
        self.completed = true;
        *self != before
    }

    fn finish_running(&mut self, now: DateTime<Utc>) {
        if self.condition(RUNNING).is_some() {
            self.set_condition(RUNNING, false, "JobFinished", "benchmark pods have exited", now);
        }
    }

    // Only a change of status moves the transition time.
    fn set_condition(
        &mut self,
        type_: &str,
        status: bool,
        reason: &str,
        message: &str,
        now: DateTime<Utc>,
    ) {
        let status = if status { "True" } else { "False" };
        if let Some(existing) = self.conditions.iter_mut().find(|c| c.type_ == type_) {
            if existing.status == status {
                return;
            }
            existing.status = status.to_owned();
            existing.reason = reason.to_owned();
            existing.message = message.to_owned();
            existing.last_transition_time = Time(now);
            existing.observed_generation = self.observed_generation;
        } else {
            self.conditions.push(Condition {
                type_: type_.to_owned(),
                status: status.to_owned(),
                reason: reason.to_owned(),
                message: message.to_owned(),
                last_transition_time: Time(now),
                observed_generation: self.observed_generation,
            });
        }
    }
}

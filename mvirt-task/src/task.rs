//! The task entity: identity, descriptor and status monitoring.

use tracing::{debug, info, warn};

use crate::builder::{self, BuildReport};
use crate::channel::{StatusReceiver, StatusSender, rendezvous};
use crate::config::TaskConfig;
use crate::descriptor::TaskDescriptor;
use crate::error::{Result, TaskError};
use crate::id;
use crate::spec::ContainerSpec;
use crate::status::{Classification, TaskState, TaskStatus};

/// Label key (under the configured namespace) that keeps the task name.
pub const NAME_LABEL: &str = "task.name";

/// Placement collaborator that binds a task to an offer.
pub trait Scheduler {
    /// Try to place `task`, building its descriptor on success.
    fn schedule_task(&self, task: &mut Task) -> bool;
}

/// Terminal result of a task, resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded(TaskState),
    Failed { state: TaskState, message: String },
}

impl Outcome {
    pub fn state(&self) -> TaskState {
        match self {
            Outcome::Succeeded(state) | Outcome::Failed { state, .. } => *state,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }
}

/// A single scheduling attempt. Not reused across submissions.
pub struct Task {
    descriptor: TaskDescriptor,
    spec: ContainerSpec,
    status_tx: StatusSender,
    status_rx: StatusReceiver,
    outcome: Option<Outcome>,
}

impl Task {
    /// Create a task with the default [`TaskConfig`].
    pub fn new(spec: ContainerSpec, name: &str) -> Result<Self> {
        Self::with_config(spec, name, &TaskConfig::default())
    }

    /// Create a task, generating its identity.
    ///
    /// The name is also written into the container labels, since the container
    /// runtime may override the container name.
    pub fn with_config(mut spec: ContainerSpec, name: &str, config: &TaskConfig) -> Result<Self> {
        spec.set_namespaced_label(&config.label_namespace, NAME_LABEL, name);

        let task_id = id::task_id(name, config.id_length);
        let (status_tx, status_rx) = rendezvous(&task_id);

        debug!(task_id = %task_id, image = %spec.image, "created task");

        Ok(Self {
            descriptor: TaskDescriptor {
                task_id,
                name: name.to_string(),
                ..Default::default()
            },
            spec,
            status_tx,
            status_rx,
            outcome: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.descriptor.task_id
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    /// The descriptor as built; what gets submitted to the scheduler.
    pub fn descriptor(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Populate the descriptor and bind it to `node`.
    pub fn build(&mut self, node: &str) -> BuildReport {
        builder::build(&mut self.descriptor, &self.spec, node)
    }

    /// Hand the task to `scheduler`. Returns whether it was placed.
    pub fn schedule(&mut self, scheduler: &impl Scheduler) -> bool {
        let placed = scheduler.schedule_task(self);
        debug!(task_id = %self.id(), placed, "schedule attempt");
        placed
    }

    /// Producer handle for the scheduler-event dispatcher.
    pub fn status_sender(&self) -> StatusSender {
        self.status_tx.clone()
    }

    /// Deliver a status event, suspending until the monitor takes it.
    pub async fn send_status(&self, status: TaskStatus) -> Result<()> {
        self.status_tx.send(status).await
    }

    /// Wait for the next status event.
    pub async fn get_status(&mut self) -> Result<TaskStatus> {
        self.status_rx.recv().await
    }

    /// Read and classify exactly one status event.
    ///
    /// Returns `Ok(false)` while the task is in flight and `Ok(true)` once it
    /// finished or was killed. A failed, lost or errored task yields
    /// [`TaskError::Terminated`] carrying the scheduler message. Callers loop
    /// until the task is terminal; wrap the call in a timeout for bounded
    /// waits. Cancelling a pending call does not lose an event.
    pub async fn monitor(&mut self) -> Result<bool> {
        if self.outcome.is_some() {
            return Err(TaskError::AlreadyTerminal(self.id().to_string()));
        }

        let status = self.get_status().await?;
        let state = status.state;

        match state.classify() {
            Classification::InFlight => {
                debug!(task_id = %self.id(), %state, "task in flight");
                Ok(false)
            }
            Classification::Succeeded => {
                info!(task_id = %self.id(), %state, "task completed");
                self.outcome = Some(Outcome::Succeeded(state));
                Ok(true)
            }
            Classification::Failed => {
                let message = status.message.unwrap_or_default();
                warn!(task_id = %self.id(), %state, message = %message, "task failed");
                self.outcome = Some(Outcome::Failed {
                    state,
                    message: message.clone(),
                });
                Err(TaskError::Terminated { state, message })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn task() -> Task {
        Task::new(ContainerSpec::new("alpine"), "web").unwrap()
    }

    /// Deliver `status` from another task and run one monitor step.
    async fn monitor_with(task: &mut Task, status: TaskStatus) -> Result<bool> {
        let sender = task.status_sender();
        let producer = tokio::spawn(async move { sender.send(status).await });
        let result = task.monitor().await;
        producer.await.unwrap().unwrap();
        result
    }

    #[test]
    fn test_identity_with_name() {
        let task = task();
        assert!(task.id().starts_with("web."));
        assert_eq!(task.id().len(), "web.".len() + 12);
        assert_eq!(task.name(), "web");
        assert_eq!(task.descriptor().task_id, task.id());
    }

    #[test]
    fn test_identity_without_name() {
        let task = Task::new(ContainerSpec::new("alpine"), "").unwrap();
        assert_eq!(task.id().len(), 12);
        assert!(!task.id().contains('.'));
    }

    #[test]
    fn test_identities_do_not_collide() {
        let ids: HashSet<String> = (0..10_000).map(|_| task().id().to_string()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_name_recorded_in_labels() {
        let task = task();
        assert_eq!(task.spec().labels["io.mvirt.task.name"], "web");
    }

    #[test]
    fn test_custom_config() {
        let config = TaskConfig {
            label_namespace: "com.example".to_string(),
            id_length: 20,
        };
        let task = Task::with_config(ContainerSpec::new("alpine"), "db", &config).unwrap();
        assert_eq!(task.id().len(), "db.".len() + 20);
        assert_eq!(task.spec().labels["com.example.task.name"], "db");
    }

    #[test]
    fn test_build_binds_node() {
        let mut task = task();
        let report = task.build("node-3");
        assert!(report.is_clean());
        assert_eq!(task.descriptor().agent_id.as_deref(), Some("node-3"));
        assert!(
            task.descriptor()
                .labels()
                .any(|l| l == "io.mvirt.task.name=web")
        );
    }

    struct FixedNode(Option<&'static str>);

    impl Scheduler for FixedNode {
        fn schedule_task(&self, task: &mut Task) -> bool {
            match self.0 {
                Some(node) => {
                    task.build(node);
                    true
                }
                None => false,
            }
        }
    }

    #[test]
    fn test_schedule() {
        let mut task = task();
        assert!(!task.schedule(&FixedNode(None)));
        assert!(task.descriptor().agent_id.is_none());

        assert!(task.schedule(&FixedNode(Some("node-1"))));
        assert_eq!(task.descriptor().agent_id.as_deref(), Some("node-1"));
    }

    #[tokio::test]
    async fn test_monitor_finished() {
        let mut task = task();
        let status = TaskStatus::new(task.id(), TaskState::Finished);
        assert!(monitor_with(&mut task, status).await.unwrap());
        assert_eq!(task.outcome(), Some(&Outcome::Succeeded(TaskState::Finished)));
    }

    #[tokio::test]
    async fn test_monitor_killed_is_not_an_error() {
        let mut task = task();
        let status = TaskStatus::new(task.id(), TaskState::Killed);
        assert!(monitor_with(&mut task, status).await.unwrap());
        assert!(task.outcome().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_monitor_failed_carries_message() {
        let mut task = task();
        let status = TaskStatus::new(task.id(), TaskState::Failed).with_message("oom");

        let err = monitor_with(&mut task, status).await.unwrap_err();
        assert_eq!(err.to_string(), "oom");
        assert!(matches!(
            err,
            TaskError::Terminated {
                state: TaskState::Failed,
                ..
            }
        ));
        assert!(task.is_terminal());
    }

    #[tokio::test]
    async fn test_monitor_lost_and_error_are_failures() {
        for state in [TaskState::Lost, TaskState::Error] {
            let mut task = task();
            let status = TaskStatus::new(task.id(), state).with_message("agent gone");
            let err = monitor_with(&mut task, status).await.unwrap_err();
            assert!(err.is_terminal_failure());
            assert_eq!(err.to_string(), "agent gone");
            assert_eq!(task.outcome().unwrap().state(), state);
        }
    }

    #[tokio::test]
    async fn test_monitor_in_flight() {
        for state in [
            TaskState::Staging,
            TaskState::Starting,
            TaskState::Running,
            TaskState::Other,
        ] {
            let mut task = task();
            let status = TaskStatus::new(task.id(), state);
            assert!(!monitor_with(&mut task, status).await.unwrap());
            assert!(task.outcome().is_none());
        }
    }

    #[tokio::test]
    async fn test_monitor_after_terminal() {
        let mut task = task();
        let status = TaskStatus::new(task.id(), TaskState::Finished);
        assert!(monitor_with(&mut task, status).await.unwrap());

        let err = task.monitor().await.unwrap_err();
        assert!(matches!(err, TaskError::AlreadyTerminal(id) if id == task.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_ignores_withdrawn_send() {
        let mut task = task();
        let sender = task.status_sender();

        let failed = TaskStatus::new(task.id(), TaskState::Failed).with_message("boom");
        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(20), sender.send(failed)).await;
        assert!(timed_out.is_err());

        let running = TaskStatus::new(task.id(), TaskState::Running);
        assert!(!monitor_with(&mut task, running).await.unwrap());
        assert!(task.outcome().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_with_timeout() {
        let mut task = task();
        let result =
            tokio::time::timeout(std::time::Duration::from_secs(30), task.monitor()).await;
        assert!(result.is_err());
        assert!(task.outcome().is_none());
    }
}

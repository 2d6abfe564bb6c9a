//! mvirt-task - Task descriptors and lifecycle tracking for cluster scheduling.
//!
//! A [`Task`] is one scheduling attempt of a container workload:
//!
//! - **Builder**: turns a [`ContainerSpec`] plus a chosen node into a
//!   resource-annotated [`TaskDescriptor`]
//! - **Monitor**: reads status events one at a time from a rendezvous
//!   channel and classifies them as in flight or terminal
//!
//! Placement, submission transport and retries belong to the caller.

pub mod builder;
pub mod channel;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod id;
pub mod spec;
pub mod status;
pub mod task;

pub use builder::{BuildReport, BuildWarning};
pub use channel::{StatusReceiver, StatusSender};
pub use config::TaskConfig;
pub use descriptor::{Network, TaskDescriptor};
pub use error::{Result, TaskError};
pub use spec::{ContainerSpec, PortBinding};
pub use status::{Classification, TaskState, TaskStatus};
pub use task::{Outcome, Scheduler, Task};

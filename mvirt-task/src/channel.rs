//! Rendezvous delivery of status events.
//!
//! The receiver announces that it is waiting by posting a reply slot; a send
//! takes the next announced slot and fills it. Until a receiver is waiting a
//! send holds on to its event, so dropping a pending send never delivers
//! anything. Events are neither buffered beyond the handoff nor dropped, and
//! arrive in send order.
//!
//! A reply slot outlives a cancelled `recv`: the next `recv` resumes on the
//! same slot, so an event handed over in between is still observed.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::trace;

use crate::error::{Result, TaskError};
use crate::status::TaskStatus;

type ReplySlot = oneshot::Sender<TaskStatus>;

/// Producer half, handed to the scheduler-event dispatcher.
#[derive(Clone)]
pub struct StatusSender {
    task_id: String,
    waiting: Arc<Mutex<mpsc::Receiver<ReplySlot>>>,
}

/// Consumer half, owned by the task.
pub struct StatusReceiver {
    task_id: String,
    ready: mpsc::Sender<ReplySlot>,
    pending: Option<oneshot::Receiver<TaskStatus>>,
}

/// Create a rendezvous channel for `task_id`.
pub fn rendezvous(task_id: &str) -> (StatusSender, StatusReceiver) {
    let (ready, waiting) = mpsc::channel(1);
    (
        StatusSender {
            task_id: task_id.to_string(),
            waiting: Arc::new(Mutex::new(waiting)),
        },
        StatusReceiver {
            task_id: task_id.to_string(),
            ready,
            pending: None,
        },
    )
}

impl StatusSender {
    /// Deliver `status`, suspending until a receiver is waiting for it.
    ///
    /// Dropping this future before it completes withdraws the event.
    pub async fn send(&self, status: TaskStatus) -> Result<()> {
        trace!(task_id = %self.task_id, state = %status.state, "delivering status");

        let mut waiting = self.waiting.lock().await;
        let mut status = status;
        loop {
            let slot = waiting
                .recv()
                .await
                .ok_or_else(|| TaskError::ChannelClosed(self.task_id.clone()))?;

            match slot.send(status) {
                Ok(()) => return Ok(()),
                // Receiver went away with its slot; try the next one.
                Err(returned) => status = returned,
            }
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

impl StatusReceiver {
    /// Wait for the next status event.
    pub async fn recv(&mut self) -> Result<TaskStatus> {
        if self.pending.is_none() {
            let (slot, reply) = oneshot::channel();
            self.ready
                .send(slot)
                .await
                .map_err(|_| TaskError::ChannelClosed(self.task_id.clone()))?;
            self.pending = Some(reply);
        }

        let reply = self
            .pending
            .as_mut()
            .ok_or_else(|| TaskError::ChannelClosed(self.task_id.clone()))?;
        let received = reply.await;
        self.pending = None;
        received.map_err(|_| TaskError::ChannelClosed(self.task_id.clone()))
    }
}

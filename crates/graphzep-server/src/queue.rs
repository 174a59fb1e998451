//! In-process FIFO ingestion queue (spec §5).
//!
//! The ingestion HTTP boundary is the only place ordering is guaranteed:
//! a single worker task drains jobs serially, so `add_memory` calls
//! submitted in order produce memories whose `created_at` is
//! non-decreasing and whose insertion order is preserved. Everything else
//! reaches the engine directly and may run concurrently.

use std::sync::Arc;

use graphzep_core::memory_manager::AddMemoryParams;
use graphzep_core::model::Episodic;
use graphzep_core::{Engine, Error};
use tokio::sync::{mpsc, oneshot};

struct IngestJob {
    params: AddMemoryParams,
    respond: oneshot::Sender<Result<Episodic, Error>>,
}

#[derive(Clone)]
pub struct IngestQueue {
    sender: mpsc::UnboundedSender<IngestJob>,
}

impl IngestQueue {
    /// Spawns the single serial worker and returns a handle callers clone
    /// freely; the worker task owns `engine` for the life of the process.
    pub fn spawn(engine: Arc<Engine>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<IngestJob>();
        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let result = engine.add_memory(job.params).await;
                let _ = job.respond.send(result);
            }
        });
        Self { sender }
    }

    /// Enqueues `params` and waits for its turn at the front of the
    /// worker's serial queue. Callers that submit several jobs in a row
    /// (one HTTP request, several messages) should enqueue all of them
    /// before awaiting any, to preserve submission order.
    pub fn enqueue(&self, params: AddMemoryParams) -> oneshot::Receiver<Result<Episodic, Error>> {
        let (respond, receiver) = oneshot::channel();
        // An error here means the worker task died; the receiver being
        // dropped without a reply surfaces as a RecvError to the caller.
        let _ = self.sender.send(IngestJob { params, respond });
        receiver
    }
}

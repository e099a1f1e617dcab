use super::request::WorkItem;
use crate::{Handler, response::internal_error};
use core::panic::AssertUnwindSafe;
use futures::FutureExt;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// The receiving end of the pool's queue, shared by every worker.
///
/// Workers take turns on the mutex, which hands out the lock in the order it
/// was requested, so the queue is drained in push order.
pub(crate) type SharedQueue = Arc<Mutex<mpsc::UnboundedReceiver<WorkItem>>>;

/// Worker task responsible for running [`WorkItem`]s through the inner
/// handler.
///
/// The worker waits for its turn on the shared queue, takes exactly one item,
/// releases the queue and then runs the inner handler to completion before
/// asking for the next item. A worker therefore never has more than one item
/// in flight, and a pool of `N` workers never runs more than `N` handler
/// invocations at once.
///
/// A panic inside the handler is contained: the caller gets a `500` and the
/// worker carries on, so the pool never loses capacity.
///
/// The loop ends once every sender is gone and the queue has been drained.
///
/// # Arguments
///
/// - `_worker_id`: Index of this worker, used for logs and tracing.
/// - `queue`: The shared receiving half of the work queue.
/// - `inner`: The handler every item is delivered to.
#[allow(clippy::used_underscore_binding)]
pub(crate) async fn worker_loop<H>(_worker_id: usize, queue: SharedQueue, inner: Arc<H>)
where
    H: Handler,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started");

    loop {
        // The guard is dropped at the end of this statement: the next worker
        // can dequeue while this one is busy.
        let item = queue.lock().await.recv().await;
        let Some(WorkItem {
            request,
            completion,
        }) = item
        else {
            break;
        };

        let response = match AssertUnwindSafe(inner.handle(request))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(_panic) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Worker {_worker_id} recovered from a panicking handler");
                internal_error()
            }
        };

        if completion.send(response).is_err() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Worker {_worker_id} finished a request nobody is waiting for");
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} stopped");
}

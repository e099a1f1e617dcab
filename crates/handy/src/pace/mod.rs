//! A fixed-size worker pool that paces requests through an inner handler.
//!
//! [`Pace`] wraps a [`Handler`] and exposes the same contract. Every request
//! is pushed onto a single ordered queue and picked up by one of `N`
//! persistent worker tasks, which gives two guarantees:
//!
//! - **Bounded concurrency**: at most `N` invocations of the inner handler run
//!   at any instant. The bound is structural (there are `N` workers), not a
//!   counted permit.
//! - **FIFO dispatch**: if the push of request `A` happens before the push of
//!   request `B`, some worker starts `A` no later than any worker starts `B`.
//!
//! Completion order is *not* preserved: with more than one worker, a request
//! dispatched later can finish first when the earlier one takes longer.
//!
//! ## Zero workers
//!
//! `Pace::new(0, ..)` is accepted. No worker exists, so every submission is
//! queued and never completes. The pool does not detect or report this; a
//! worker count of zero is a configuration error on the caller's side.
//!
//! ## Lifecycle
//!
//! Workers run for as long as any clone of the [`Pace`] exists. Once the last
//! clone is dropped the queue closes; workers finish what is already queued
//! and exit.

mod request;
mod worker;

pub use request::Completion;

use crate::{Error, Handler, Request, Response, Result, response::internal_error};
use request::WorkItem;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use worker::{SharedQueue, worker_loop};

/// A bounded-concurrency, order-preserving decorator around a [`Handler`].
///
/// Cloning is cheap; all clones feed the same queue and workers.
#[derive(Clone, Debug)]
pub struct Pace {
    sender: mpsc::UnboundedSender<WorkItem>,
    // Keeps the queue open even when no worker holds it (`workers == 0`).
    _queue: SharedQueue,
    workers: usize,
}

impl Pace {
    /// Creates a pool of `count` workers delivering requests to `inner`.
    ///
    /// The workers are spawned as tasks on the current Tokio runtime, so this
    /// must be called from within one.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn new<H>(count: usize, inner: H) -> Self
    where
        H: Handler,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue: SharedQueue = Arc::new(Mutex::new(receiver));
        let inner = Arc::new(inner);

        for worker_id in 0..count {
            tokio::spawn(worker_loop(worker_id, Arc::clone(&queue), Arc::clone(&inner)));
        }

        #[cfg(feature = "tracing")]
        if count == 0 {
            tracing::warn!("Pace created without workers; requests will never complete");
        }

        Self {
            sender,
            _queue: queue,
            workers: count,
        }
    }

    /// Returns the fixed number of workers in this pool.
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Pushes `request` onto the queue and returns its pending completion.
    ///
    /// The push happens before this method returns, so requests submitted one
    /// after the other from the same task are dispatched in that order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] if the queue no longer accepts items.
    pub fn submit(&self, request: Request) -> Result<Completion> {
        let (item, completion) = WorkItem::new(request);
        self.sender.send(item).map_err(|_| Error::QueueClosed)?;
        Ok(completion)
    }

    /// Submits `request` and waits for the inner handler's response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be queued or if it was
    /// dropped without a response.
    pub async fn try_handle(&self, request: Request) -> Result<Response> {
        self.submit(request)?.await
    }
}

impl Handler for Pace {
    fn handle(&self, req: Request) -> impl Future<Output = Response> + Send {
        async move {
            match self.try_handle(req).await {
                Ok(res) => res,
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Paced request failed: {_e}");
                    internal_error()
                }
            }
        }
    }
}

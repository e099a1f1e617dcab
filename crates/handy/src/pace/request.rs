//! Work items handed from callers to pool workers.
//!
//! A [`WorkItem`] pairs a request with the sending half of a one-shot
//! channel. The submitting caller keeps the receiving half wrapped in a
//! [`Completion`], which resolves once the worker that picked the item up has
//! run the inner handler to the end.

use crate::{Error, Request, Response, Result};
use core::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::oneshot;

/// One pending invocation of the inner handler.
///
/// Consumed by exactly one worker; dropped after the worker fires
/// `completion`.
#[derive(Debug)]
pub(crate) struct WorkItem {
    pub(crate) request: Request,
    pub(crate) completion: oneshot::Sender<Response>,
}

impl WorkItem {
    /// Creates an item for `request` together with the caller's side of its
    /// completion signal.
    pub(crate) fn new(request: Request) -> (Self, Completion) {
        let (completion, rx) = oneshot::channel();
        (
            Self {
                request,
                completion,
            },
            Completion { rx },
        )
    }
}

/// The caller's side of a submitted request.
///
/// Resolves to the inner handler's response once a worker has processed the
/// request. Dropping a `Completion` does not withdraw the request: it stays
/// queued, still runs, and its response is discarded.
#[derive(Debug)]
#[must_use = "a submitted request keeps running; await the completion to get its response"]
pub struct Completion {
    rx: oneshot::Receiver<Response>,
}

impl Completion {
    /// Returns the response if the worker has already fired the signal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerDropped`] if the signal can never fire.
    pub fn try_recv(&mut self) -> Result<Option<Response>> {
        match self.rx.try_recv() {
            Ok(res) => Ok(Some(res)),
            Err(oneshot::error::TryRecvError::Empty) => Ok(None),
            Err(oneshot::error::TryRecvError::Closed) => Err(Error::WorkerDropped),
        }
    }
}

impl Future for Completion {
    type Output = Result<Response>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map_err(|_| Error::WorkerDropped)
    }
}

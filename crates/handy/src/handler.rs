//! The request handler abstraction shared by every component.
//!
//! A [`Handler`] maps one [`Request`] to one [`Response`]. The decorators in
//! this crate ([`Pace`], [`Delay`]) both consume and implement it, so they
//! compose freely:
//!
//! ```
//! use handy::{Delay, Handler, Pace, Response, handler_fn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let app = Pace::new(4, Delay::new(handler_fn(|_req| async {
//!     Response::new("ok".into())
//! })));
//! let res = app.handle(handy::Request::new("".into())).await;
//! assert_eq!(res.body().as_ref(), b"ok");
//! # }
//! ```
//!
//! [`Pace`]: crate::Pace
//! [`Delay`]: crate::Delay

use bytes::Bytes;
use std::sync::Arc;

/// A fully buffered HTTP request.
pub type Request = http::Request<Bytes>;

/// A fully buffered HTTP response.
pub type Response = http::Response<Bytes>;

/// A unit of behavior mapping one request to one response.
///
/// Handlers are shared across tasks (`Send + Sync`) and are invoked without
/// external locking. A handler that keeps interior state is responsible for
/// its own synchronization.
pub trait Handler: Send + Sync + 'static {
    /// Produces the response for `req`.
    fn handle(&self, req: Request) -> impl Future<Output = Response> + Send;
}

impl<H> Handler for Arc<H>
where
    H: Handler,
{
    fn handle(&self, req: Request) -> impl Future<Output = Response> + Send {
        H::handle(self, req)
    }
}

/// A [`Handler`] backed by an async closure. See [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps an async closure as a [`Handler`].
pub const fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send,
{
    HandlerFn { f }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send,
{
    fn handle(&self, req: Request) -> impl Future<Output = Response> + Send {
        (self.f)(req)
    }
}

impl<F> core::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

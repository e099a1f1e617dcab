//! Bridges [`Handler`]s onto the axum/tower service stack.
//!
//! Handlers work on fully buffered requests, so [`HandlerService`] collects
//! the incoming body (up to a limit) before calling the handler, and turns the
//! buffered response back into a streaming [`Body`].

use super::telemetry::{
    decrement_requests_inflight, increment_requests, increment_requests_inflight,
    record_request_duration,
};
use axum::body::{Body, to_bytes};
use core::{
    convert::Infallible,
    task::{Context, Poll},
};
use futures::future::BoxFuture;
use handy::Handler;
use http::{Request, Response, StatusCode};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};
use tower::Service;

/// A [`tower::Service`] delivering buffered requests to a [`Handler`].
pub struct HandlerService<H> {
    route: &'static str,
    handler: Arc<H>,
    max_body_bytes: usize,
    inflight: Arc<AtomicUsize>,
}

impl<H> HandlerService<H>
where
    H: Handler,
{
    /// Wraps `handler`; `route` labels logs and metrics.
    pub fn new(route: &'static str, handler: H, max_body_bytes: usize) -> Self {
        Self {
            route,
            handler: Arc::new(handler),
            max_body_bytes,
            inflight: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<H> Clone for HandlerService<H> {
    fn clone(&self) -> Self {
        Self {
            route: self.route,
            handler: Arc::clone(&self.handler),
            max_body_bytes: self.max_body_bytes,
            inflight: Arc::clone(&self.inflight),
        }
    }
}

/// Tracks one request from the moment it is accepted.
///
/// Dropping the guard ends the request, whether the handler finished or the
/// client went away and the future was dropped mid-flight.
struct InflightGuard {
    route: &'static str,
    start: Instant,
    inflight: Arc<AtomicUsize>,
}

impl InflightGuard {
    fn start(route: &'static str, inflight: Arc<AtomicUsize>) -> Self {
        increment_requests(route);
        increment_requests_inflight(route);
        inflight.fetch_add(1, Ordering::Relaxed);
        Self {
            route,
            start: Instant::now(),
            inflight,
        }
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        let _remaining = self.inflight.fetch_sub(1, Ordering::Relaxed) - 1;
        decrement_requests_inflight(self.route);
        record_request_duration(
            self.route,
            self.start.elapsed().as_secs_f64() * 1000.0,
        );

        #[cfg(feature = "tracing")]
        tracing::trace!("{} request ended, {_remaining} still in flight", self.route);
    }
}

impl<H> Service<Request<Body>> for HandlerService<H>
where
    H: Handler,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let route = self.route;
        let handler = Arc::clone(&self.handler);
        let limit = self.max_body_bytes;
        let guard = InflightGuard::start(route, Arc::clone(&self.inflight));

        #[cfg(feature = "tracing")]
        let span = tracing::info_span!(
            "request",
            route,
            method = %req.method(),
            path = %req.uri().path()
        );

        let fut = async move {
            let _guard = guard;
            let (parts, body) = req.into_parts();
            let res = match to_bytes(body, limit).await {
                Ok(bytes) => handler
                    .handle(Request::from_parts(parts, bytes))
                    .await
                    .map(Body::from),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Rejected {route} request body: {_e}");
                    payload_too_large()
                }
            };

            Ok(res)
        };

        #[cfg(feature = "tracing")]
        let fut = {
            use tracing::Instrument;
            fut.instrument(span)
        };

        Box::pin(fut)
    }
}

fn payload_too_large() -> Response<Body> {
    let mut res = Response::new(Body::from("413 payload too large\n"));
    *res.status_mut() = StatusCode::PAYLOAD_TOO_LARGE;
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use core::time::Duration;
    use handy::handler_fn;
    use tower::ServiceExt;

    #[tokio::test]
    async fn buffers_bodies_for_the_handler() {
        let service = HandlerService::new(
            "echo",
            handler_fn(|req: handy::Request| async move {
                Response::new(Bytes::from(format!("{} bytes", req.body().len())))
            }),
            16,
        );

        let res = service
            .clone()
            .oneshot(Request::new(Body::from("0123456789")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), b"10 bytes");

        let res = service
            .oneshot(Request::new(Body::from("x".repeat(17))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn abandoned_requests_leave_flight() {
        let mut service = HandlerService::new(
            "pace",
            handler_fn(|_req: handy::Request| futures::future::pending::<handy::Response>()),
            16,
        );

        let mut call = service.call(Request::new(Body::empty()));
        let timed_out = tokio::time::timeout(Duration::from_millis(20), &mut call).await;
        assert!(timed_out.is_err(), "handler should never finish");
        assert_eq!(service.inflight.load(Ordering::Relaxed), 1);

        // What axum does when the client disconnects.
        drop(call);
        assert_eq!(service.inflight.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn finished_requests_leave_flight() {
        let service = HandlerService::new(
            "status",
            handler_fn(|_req: handy::Request| async { Response::new(Bytes::new()) }),
            16,
        );

        for _ in 0..3 {
            service
                .clone()
                .oneshot(Request::new(Body::empty()))
                .await
                .unwrap();
        }
        assert_eq!(service.inflight.load(Ordering::Relaxed), 0);
    }

    #[cfg(feature = "tracing")]
    #[tokio::test]
    async fn requests_run_in_a_route_span() {
        use std::sync::Mutex;
        use tracing::{Subscriber, span};
        use tracing_subscriber::{
            Layer, layer::Context as LayerContext, prelude::*, registry::LookupSpan,
        };

        struct Spans(Arc<Mutex<Vec<String>>>);

        impl<S> Layer<S> for Spans
        where
            S: Subscriber + for<'a> LookupSpan<'a>,
        {
            fn on_new_span(
                &self,
                attrs: &span::Attributes<'_>,
                _id: &span::Id,
                _ctx: LayerContext<'_, S>,
            ) {
                let span = format!("{} {:?}", attrs.metadata().name(), attrs.values());
                self.0.lock().unwrap().push(span);
            }
        }

        let spans = Arc::new(Mutex::new(Vec::new()));
        let _default = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(Spans(Arc::clone(&spans))),
        );

        let service = HandlerService::new(
            "delay",
            handler_fn(|_req: handy::Request| async { Response::new(Bytes::new()) }),
            16,
        );
        let req = http::Request::put("/users/42").body(Body::empty()).unwrap();
        service.oneshot(req).await.unwrap();

        let spans = spans.lock().unwrap();
        assert_eq!(spans.len(), 1, "{spans:?}");
        let span = &spans[0];
        assert!(span.starts_with("request "), "{span}");
        for field in ["delay", "PUT", "/users/42"] {
            assert!(span.contains(field), "{field} missing from {span}");
        }
    }
}

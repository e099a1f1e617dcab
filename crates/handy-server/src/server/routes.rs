use super::{config::ServerConfig, service::HandlerService};
use axum::Router;
use bytes::Bytes;
use handy::{Delay, Handler, Pace, Redirects, Request, Response, Status, handler_fn};

/// Answers `200` with the method and path it was reached with.
fn echo() -> impl Handler {
    handler_fn(|req: Request| {
        let body = format!("{} {}\n", req.method(), req.uri().path());
        core::future::ready(Response::new(Bytes::from(body)))
    })
}

/// Builds the application router:
///
/// - `/pace/...`: paced, then delayed, then echoed
/// - `/delay/...`: delayed, then echoed
/// - `/status/...`: the status code named by the path
/// - anything else: the configured redirects, or `404`
///
/// The route prefix is stripped before the handler sees the path.
pub fn build_router(config: &ServerConfig) -> Router {
    let limit = config.max_body_bytes;
    let pace = Pace::new(config.pace_workers, Delay::new(echo()));

    Router::new()
        .nest_service("/pace", service("pace", pace, limit))
        .nest_service("/delay", service("delay", Delay::new(echo()), limit))
        .nest_service("/status", service("status", Status::default(), limit))
        .fallback_service(service(
            "redirect",
            Redirects::new(config.redirects.clone()),
            limit,
        ))
}

fn service<H: Handler>(route: &'static str, handler: H, limit: usize) -> HandlerService<H> {
    HandlerService::new(route, handler, limit)
}

//! Tower integration for the router.
//!
//! [`RouterService`] implements `tower::Service` for both event kinds, so a
//! transport can stack ordinary tower middleware (timeouts, concurrency
//! limits, buffering) in front of routing:
//!
//! ```rust,ignore
//! use tower::{ServiceBuilder, ServiceExt};
//!
//! let svc = ServiceBuilder::new()
//!     .concurrency_limit(64)
//!     .service(RouterService::new(router));
//!
//! let outcome = svc.oneshot(MessageEvent::new("!ping")).await?;
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower::Service;

use herald_core::{MessageEvent, SlashEvent};

use crate::error::DispatchError;
use crate::router::{EventRouter, RouteOutcome};

/// A cloneable `tower::Service` over a shared [`EventRouter`].
#[derive(Debug, Clone)]
pub struct RouterService {
    router: Arc<EventRouter>,
}

impl RouterService {
    /// Wraps a shared router.
    pub fn new(router: Arc<EventRouter>) -> Self {
        Self { router }
    }

    /// Returns the wrapped router.
    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }
}

impl Service<MessageEvent> for RouterService {
    type Response = RouteOutcome;
    type Error = DispatchError;
    type Future = BoxFuture<'static, Result<RouteOutcome, DispatchError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: MessageEvent) -> Self::Future {
        let router = Arc::clone(&self.router);
        Box::pin(async move { router.route_message(event).await })
    }
}

impl Service<SlashEvent> for RouterService {
    type Response = RouteOutcome;
    type Error = DispatchError;
    type Future = BoxFuture<'static, Result<RouteOutcome, DispatchError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: SlashEvent) -> Self::Future {
        let router = Arc::clone(&self.router);
        Box::pin(async move { router.route_slash(event).await })
    }
}

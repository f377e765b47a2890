//! Tower layer that serves GET routes through the response cache.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::handler::Handler;
use axum::http::{Method, Request, Response};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{StreamExt, stream};
use http_body_util::BodyExt;
use memento_core::{CacheConfigError, CacheStatus};
use tower::{Layer, Service};
use tracing::{debug, info, warn};

use super::keys::RequestFingerprint;
use super::response::CachedResponse;
use super::route::{RouteCacheConfig, RoutePlan};
use super::service::CacheService;
use super::single_flight::FlightOutcome;
use crate::error::AppError;

/// Largest request body read for fingerprinting. Requests with larger
/// bodies skip the cache.
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Layer que cachea las respuestas de una ruta GET.
///
/// Construction validates the route declaration, so a cache config on a
/// non-GET route fails at startup.
#[derive(Clone)]
pub struct ResponseCacheLayer {
    plan: Arc<RoutePlan>,
    cache: CacheService,
}

impl ResponseCacheLayer {
    pub fn new(
        method: &Method,
        route: &str,
        config: RouteCacheConfig,
        cache: &CacheService,
    ) -> Result<Self, CacheConfigError> {
        let plan = config.validate(method, route, cache.options())?;

        info!(
            route = %route,
            ttl = plan.flight.ttl,
            lock_behavior = %plan.flight.behavior,
            tags = ?plan.flight.set_options.tags,
            "Cache enabled for route"
        );

        Ok(Self {
            plan: Arc::new(plan),
            cache: cache.clone(),
        })
    }

    pub fn plan(&self) -> &RoutePlan {
        &self.plan
    }
}

impl<S> Layer<S> for ResponseCacheLayer {
    type Service = ResponseCacheMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ResponseCacheMiddleware {
            inner,
            plan: Arc::clone(&self.plan),
            cache: self.cache.clone(),
        }
    }
}

/// Middleware that answers from the cache or runs the route once.
#[derive(Clone)]
pub struct ResponseCacheMiddleware<S> {
    inner: S,
    plan: Arc<RoutePlan>,
    cache: CacheService,
}

/// Ways the wrapped route can end without a cacheable response.
enum Bail<E> {
    Respond(Response<Body>),
    Error(E),
}

impl<S> Service<Request<Body>> for ResponseCacheMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // The ready service goes into the future; a fresh clone stays behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let plan = Arc::clone(&self.plan);
        let cache = self.cache.clone();

        Box::pin(async move {
            if request.method() != Method::GET {
                return inner.call(request).await;
            }

            let (mut parts, body) = request.into_parts();
            let (body, bytes) = if plan.include.body.is_enabled() {
                match buffer_body(body, MAX_REQUEST_BODY_BYTES).await {
                    Buffered::Complete(bytes) => (Body::from(bytes.clone()), bytes),
                    Buffered::PassThrough(body) => {
                        debug!(
                            route = %plan.route,
                            "Request body not fingerprintable, skipping cache"
                        );
                        return inner.call(Request::from_parts(parts, body)).await;
                    },
                }
            } else {
                (body, Bytes::new())
            };

            let fingerprint = RequestFingerprint::capture(&mut parts, &bytes).await;
            let custom = match &plan.discriminator {
                Some(discriminator) => discriminator.discriminate(&parts).await,
                None => None,
            };
            let key = fingerprint.cache_key(cache.key_prefix(), &plan, custom.as_ref());
            let request = Request::from_parts(parts, body);

            let outcome = cache
                .get_or_compute(&key, &plan.flight, CachedResponse::is_cacheable, move || {
                    async move {
                        let response = match inner.call(request).await {
                            Ok(response) => response,
                            Err(e) => return Err(Bail::Error(e)),
                        };
                        let (parts, body) = response.into_parts();
                        match to_bytes(body, usize::MAX).await {
                            Ok(bytes) => Ok(CachedResponse::capture(&parts, &bytes)),
                            Err(e) => Err(Bail::Respond(
                                AppError::Internal(format!("Unreadable response body: {}", e))
                                    .into_response(),
                            )),
                        }
                    }
                })
                .await;

            match outcome {
                Ok(FlightOutcome::Hit(cached)) => {
                    debug!(key = %key, "Serving cached response");
                    Ok(cached.into_response(CacheStatus::Hit))
                },
                Ok(FlightOutcome::Miss(cached)) => Ok(cached.into_response(CacheStatus::Miss)),
                Ok(FlightOutcome::Unavailable) => Ok(AppError::ServiceUnavailable(
                    "Response is being computed by another request".to_string(),
                )
                .into_response()),
                Err(Bail::Respond(response)) => Ok(response),
                Err(Bail::Error(e)) => Err(e),
            }
        })
    }
}

/// A request body read for fingerprinting.
enum Buffered {
    Complete(Bytes),
    /// Too large or broken; carries the bytes read so far followed by the
    /// rest of the original stream.
    PassThrough(Body),
}

/// Reads up to `limit` bytes of `body` without losing any of it.
async fn buffer_body(mut body: Body, limit: usize) -> Buffered {
    let mut buffer = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Unreadable request body, skipping cache");
                let head = stream::iter([Ok(Bytes::from(buffer)), Err(e)]);
                return Buffered::PassThrough(Body::from_stream(head));
            },
        };

        let Ok(data) = frame.into_data() else {
            continue;
        };
        buffer.extend_from_slice(&data);

        if buffer.len() > limit {
            let head = stream::once(async move { Ok(Bytes::from(buffer)) });
            let rest = body.into_data_stream();
            return Buffered::PassThrough(Body::from_stream(head.chain(rest)));
        }
    }

    Buffered::Complete(Bytes::from(buffer))
}

/// Registration of cached routes on an axum [`Router`].
pub trait RouterCacheExt<S>: Sized {
    /// Adds a route served through the response cache.
    ///
    /// # Errors
    ///
    /// Fails when `method` is not GET or the declaration is invalid. Nothing
    /// is registered in that case.
    fn cached_route<H, T>(
        self,
        method: Method,
        path: &str,
        handler: H,
        config: RouteCacheConfig,
        cache: &CacheService,
    ) -> Result<Self, CacheConfigError>
    where
        H: Handler<T, S>,
        T: 'static;
}

impl<S> RouterCacheExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn cached_route<H, T>(
        self,
        method: Method,
        path: &str,
        handler: H,
        config: RouteCacheConfig,
        cache: &CacheService,
    ) -> Result<Self, CacheConfigError>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let layer = ResponseCacheLayer::new(&method, path, config, cache)?;
        Ok(self.route(path, get(handler).layer(layer)))
    }
}

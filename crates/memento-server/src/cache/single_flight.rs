//! Single-flight read-through: one request computes, the others wait,
//! bypass or fail depending on the route's lock behavior.

use std::future::Future;
use std::panic::{AssertUnwindSafe, resume_unwind};

use futures::FutureExt;
use memento_core::LockBehavior;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::service::{CacheService, SetOptions};

/// How a read-through call stores what it computes.
#[derive(Debug, Clone, Default)]
pub struct FlightPlan {
    /// TTL in seconds of the stored value.
    pub ttl: u64,
    /// What to do when another caller holds the lock.
    pub behavior: LockBehavior,
    /// Compression and tags of the stored value.
    pub set_options: SetOptions,
}

/// Result of [`CacheService::get_or_compute`].
#[derive(Debug, Clone, PartialEq)]
pub enum FlightOutcome<T> {
    /// Served from the cache, possibly after waiting for another caller.
    Hit(T),
    /// Computed by this caller.
    Miss(T),
    /// The key is being computed elsewhere and the behavior is `fail`.
    Unavailable,
}

impl<T> FlightOutcome<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Hit(value) | Self::Miss(value) => Some(value),
            Self::Unavailable => None,
        }
    }
}

impl CacheService {
    /// Reads `key`, computing and storing it on a miss.
    ///
    /// Only the lock holder stores its result, and only when `cacheable`
    /// accepts it. The holder's computation runs on a detached task, so it
    /// stores its value and releases the lock even if the caller is dropped
    /// midway. Panics release the lock and resume in the caller.
    /// Losers follow `plan.behavior`; a waiter that times out computes the
    /// value itself without storing it. Errors from `compute` are returned
    /// as-is and never cached.
    pub async fn get_or_compute<T, E, F, Fut, P>(
        &self,
        key: &str,
        plan: &FlightPlan,
        cacheable: P,
        compute: F,
    ) -> Result<FlightOutcome<T>, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        E: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        P: Fn(&T) -> bool + Send + 'static,
    {
        if let Some(value) = self.get::<T>(key).await {
            return Ok(FlightOutcome::Hit(value));
        }

        if self.acquire_lock(key).await {
            let cache = self.clone();
            let owned_key = key.to_string();
            let plan = plan.clone();
            let holder = tokio::spawn(async move {
                cache
                    .compute_and_store(&owned_key, &plan, cacheable, compute())
                    .await
            });

            return match holder.await {
                Ok(result) => result.map(FlightOutcome::Miss),
                Err(e) if e.is_panic() => resume_unwind(e.into_panic()),
                Err(e) => {
                    warn!(key = %key, error = %e, "Lock holder task cancelled");
                    Ok(FlightOutcome::Unavailable)
                },
            };
        }

        match plan.behavior {
            LockBehavior::Wait => {
                if let Some(value) = self.wait_for_cache::<T>(key, self.lock_timeout()).await {
                    return Ok(FlightOutcome::Hit(value));
                }
                debug!(key = %key, "Wait timed out, computing directly");
                compute().await.map(FlightOutcome::Miss)
            },
            LockBehavior::Bypass => {
                debug!(key = %key, "Lock held elsewhere, bypassing cache");
                compute().await.map(FlightOutcome::Miss)
            },
            LockBehavior::Fail => {
                debug!(key = %key, "Lock held elsewhere, failing fast");
                Ok(FlightOutcome::Unavailable)
            },
        }
    }

    /// Runs the lock holder's computation, stores an accepted value and
    /// releases the lock on every exit path.
    async fn compute_and_store<T, E, Fut, P>(
        &self,
        key: &str,
        plan: &FlightPlan,
        cacheable: P,
        computation: Fut,
    ) -> Result<T, E>
    where
        T: Serialize,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&T) -> bool,
    {
        let value = match AssertUnwindSafe(computation).catch_unwind().await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                self.release_lock(key).await;
                return Err(e);
            },
            Err(panic) => {
                self.release_lock(key).await;
                resume_unwind(panic);
            },
        };

        if cacheable(&value) {
            self.set(key, &value, plan.ttl, plan.set_options.clone())
                .await;
        } else {
            debug!(key = %key, "Result not cacheable, skipping store");
        }

        self.release_lock(key).await;
        Ok(value)
    }
}

//! Provider doubles.

use async_trait::async_trait;
use futures::StreamExt;
use memento_providers::{CacheProvider, KeyBatches, ProviderError, ProviderResult};

/// Provider whose every call fails, as an unreachable backend would.
#[derive(Debug, Default)]
pub struct FailingProvider;

fn down<T>() -> ProviderResult<T> {
    Err(ProviderError::unavailable("connection refused"))
}

#[async_trait]
impl CacheProvider for FailingProvider {
    async fn get(&self, _key: &str) -> ProviderResult<Option<String>> {
        down()
    }

    async fn set(&self, _key: &str, _value: &str, _ttl_seconds: u64) -> ProviderResult<()> {
        down()
    }

    async fn del(&self, _key: &str) -> ProviderResult<bool> {
        down()
    }

    async fn del_many(&self, _keys: &[String]) -> ProviderResult<u64> {
        down()
    }

    async fn add_to_set(
        &self,
        _key: &str,
        _members: &[String],
        _ttl_seconds: Option<u64>,
    ) -> ProviderResult<()> {
        down()
    }

    async fn get_set_members(&self, _key: &str) -> ProviderResult<Vec<String>> {
        down()
    }

    async fn acquire_lock(&self, _key: &str, _ttl_ms: u64) -> ProviderResult<bool> {
        down()
    }

    async fn release_lock(&self, _key: &str) -> ProviderResult<()> {
        down()
    }

    fn scan<'a>(&'a self, _pattern: &'a str) -> KeyBatches<'a> {
        futures::stream::once(async { down() }).boxed()
    }

    async fn disconnect(&self) -> ProviderResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

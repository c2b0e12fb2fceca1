use async_trait::async_trait;

use crate::descriptor::Descriptor;
use crate::digest::Digest;
use crate::reference::NamedReference;

/// Turns a reference into a top-level descriptor. An external
/// collaborator: authentication and token flows live behind this trait,
/// not in the core.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, reference: &NamedReference) -> anyhow::Result<Descriptor>;

    /// Returns a fetcher scoped to the canonical (digested) reference.
    async fn fetcher(&self, reference: &NamedReference) -> anyhow::Result<std::sync::Arc<dyn Fetcher>>;
}

/// Retrieves a single blob by digest from whatever registry/transport the
/// resolver scoped this fetcher to.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, digest: &Digest) -> anyhow::Result<Vec<u8>>;
}

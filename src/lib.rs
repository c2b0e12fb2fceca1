pub mod assemble;
pub mod buildinfo;
pub mod cache;
pub mod descriptor;
pub mod digest;
pub mod dirs;
pub mod error;
pub mod image_config;
pub mod logger;
pub mod manifest;
pub mod metadata;
pub mod platform;
pub mod reference;
pub mod registry;
pub mod resolver;
pub mod result;
pub mod sbom;
pub mod traverse;

use std::sync::Arc;

use tokio::sync::Mutex;

pub use error::Error;
pub use result::InspectResult;

use cache::ContentCache;
use resolver::Resolver;

/// Ties reference parsing, resolution, traversal and assembly together.
/// The only entry point a caller needs.
pub struct Loader {
    resolver: Arc<dyn Resolver>,
    cache: Arc<dyn ContentCache>,
}

impl Loader {
    pub fn new(resolver: Arc<dyn Resolver>, cache: Arc<dyn ContentCache>) -> Self {
        Loader { resolver, cache }
    }

    pub async fn load(&self, image_reference: &str) -> Result<InspectResult, Error> {
        let named = reference::parse(image_reference)?;

        let descriptor = self
            .resolver
            .resolve(&named)
            .await
            .map_err(|source| Error::ResolveFailed {
                reference: named.to_string(),
                source,
            })?;

        let canonical = named.with_digest(&descriptor.digest.to_string());

        let fetcher = self
            .resolver
            .fetcher(&canonical)
            .await
            .map_err(|source| Error::ResolveFailed {
                reference: canonical.to_string(),
                source,
            })?;

        let result = Arc::new(Mutex::new(traverse::TraversalResult::new()));

        traverse::fetch(&self.cache, &fetcher, descriptor.clone(), &result).await?;

        assemble::assemble(&self.cache, &fetcher, descriptor.digest, result).await
    }
}

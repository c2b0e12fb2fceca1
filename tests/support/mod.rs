use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use imageinspect::descriptor::Descriptor;
use imageinspect::digest::{Algorithm, Digest};
use imageinspect::reference::NamedReference;
use imageinspect::resolver::{Fetcher, Resolver};

/// An in-memory registry double: every blob it can serve is registered up
/// front by digest, and resolution always returns the configured top
/// descriptor regardless of what reference string is asked for.
pub struct MockRegistry {
    blobs: HashMap<Digest, Vec<u8>>,
    top: Descriptor,
}

pub struct MockRegistryBuilder {
    blobs: HashMap<Digest, Vec<u8>>,
}

impl MockRegistryBuilder {
    pub fn new() -> Self {
        MockRegistryBuilder {
            blobs: HashMap::new(),
        }
    }

    pub fn put_json(mut self, value: &serde_json::Value) -> (Self, Digest) {
        let bytes = serde_json::to_vec(value).expect("serializable fixture");
        let digest = Digest::of(Algorithm::Sha256, &bytes);
        self.blobs.insert(digest.clone(), bytes);
        (self, digest)
    }

    pub fn build(self, top: Descriptor) -> Arc<MockRegistry> {
        Arc::new(MockRegistry {
            blobs: self.blobs,
            top,
        })
    }
}

#[async_trait]
impl Resolver for MockRegistry {
    async fn resolve(&self, _reference: &NamedReference) -> anyhow::Result<Descriptor> {
        Ok(self.top.clone())
    }

    async fn fetcher(&self, _reference: &NamedReference) -> anyhow::Result<Arc<dyn Fetcher>> {
        Ok(Arc::new(MockFetcher {
            blobs: self.blobs.clone(),
        }))
    }
}

struct MockFetcher {
    blobs: HashMap<Digest, Vec<u8>>,
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, digest: &Digest) -> anyhow::Result<Vec<u8>> {
        self.blobs
            .get(digest)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such blob `{}` in mock registry", digest))
    }
}

pub fn descriptor(media_type: &str, digest: &Digest, size: u64) -> Descriptor {
    Descriptor {
        media_type: media_type.to_string(),
        digest: digest.clone(),
        size,
        platform: None,
        annotations: None,
    }
}

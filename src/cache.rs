use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::digest::Digest;
use crate::error::Error;
use crate::resolver::Fetcher;

struct CachedBlob {
    content_type: String,
    bytes: Vec<u8>,
}

/// A content-addressed blob store: write bytes keyed by digest
/// (idempotent), read bytes back by digest. The traverser never evicts
/// within a single `Load` call.
#[async_trait]
pub trait ContentCache: Send + Sync {
    async fn provide(&self, digest: &Digest) -> anyhow::Result<Option<Vec<u8>>>;
    async fn ingest(&self, digest: &Digest, content_type: &str, bytes: Vec<u8>) -> anyhow::Result<()>;
}

/// In-memory backing, safe for concurrent ingest of the same key: the
/// second writer's bytes are discarded once the first has landed.
#[derive(Default)]
pub struct MemoryCache {
    blobs: Mutex<HashMap<Digest, CachedBlob>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentCache for MemoryCache {
    async fn provide(&self, digest: &Digest) -> anyhow::Result<Option<Vec<u8>>> {
        let blobs = self.blobs.lock().await;
        Ok(blobs.get(digest).map(|b| b.bytes.clone()))
    }

    async fn ingest(&self, digest: &Digest, content_type: &str, bytes: Vec<u8>) -> anyhow::Result<()> {
        let mut blobs = self.blobs.lock().await;
        blobs.entry(digest.clone()).or_insert(CachedBlob {
            content_type: content_type.to_string(),
            bytes,
        });
        Ok(())
    }
}

/// Filesystem-backed store rooted at a configured directory, laid out as
/// `<root>/<algorithm>/<encoded>/{type,data}`.
pub struct FsCache {
    root: PathBuf,
    // Guards directory creation; reads/writes to distinct digests never
    // contend on file content, only on `create_dir_all` of shared parents.
    lock: Mutex<()>,
}

impl FsCache {
    pub fn new(root: PathBuf) -> Self {
        FsCache {
            root,
            lock: Mutex::new(()),
        }
    }

    fn paths(&self, digest: &Digest) -> (PathBuf, PathBuf, PathBuf) {
        let mut location = self.root.clone();
        location.push(digest.algorithm.to_string());
        location.push(&digest.encoded);

        let mut type_path = location.clone();
        type_path.push("type");

        let mut data_path = location.clone();
        data_path.push("data");

        (location, type_path, data_path)
    }
}

#[async_trait]
impl ContentCache for FsCache {
    async fn provide(&self, digest: &Digest) -> anyhow::Result<Option<Vec<u8>>> {
        let (_location, _type_path, data_path) = self.paths(digest);
        if !data_path.exists() {
            return Ok(None);
        }
        let bytes = tokio::fs::read(&data_path)
            .await
            .with_context(|| format!("could not read cache data file {:?}", data_path))?;
        Ok(Some(bytes))
    }

    async fn ingest(&self, digest: &Digest, content_type: &str, bytes: Vec<u8>) -> anyhow::Result<()> {
        let (location, type_path, data_path) = self.paths(digest);

        let _guard = self.lock.lock().await;
        tokio::fs::create_dir_all(&location)
            .await
            .with_context(|| format!("could not create cache directory {:?}", location))?;
        tokio::fs::write(&type_path, content_type)
            .await
            .with_context(|| format!("could not write cache type file {:?}", type_path))?;
        tokio::fs::write(&data_path, &bytes)
            .await
            .with_context(|| format!("could not write cache data file {:?}", data_path))?;
        Ok(())
    }
}

/// Fetches `digest` if absent from `cache`, ingests it, and returns the
/// bytes either way. This is the only way the traverser touches content.
pub async fn fetch_and_cache(
    cache: &Arc<dyn ContentCache>,
    fetcher: &Arc<dyn Fetcher>,
    digest: &Digest,
    media_type: &str,
) -> Result<Vec<u8>, Error> {
    if let Some(bytes) = cache
        .provide(digest)
        .await
        .map_err(|source| Error::FetchFailed {
            digest: digest.clone(),
            source,
        })?
    {
        log::debug!("cache hit for `{}`", digest);
        return Ok(bytes);
    }

    log::debug!("cache miss for `{}`, fetching", digest);
    let bytes = fetcher
        .fetch(digest)
        .await
        .map_err(|source| Error::FetchFailed {
            digest: digest.clone(),
            source,
        })?;

    cache
        .ingest(digest, media_type, bytes.clone())
        .await
        .map_err(|source| Error::FetchFailed {
            digest: digest.clone(),
            source,
        })?;

    Ok(bytes)
}

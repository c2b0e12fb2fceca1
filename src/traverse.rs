use std::collections::HashMap;
use std::convert::TryFrom;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::cache::{fetch_and_cache, ContentCache};
use crate::descriptor::{Descriptor, ANNOTATION_REFERENCE_DIGEST};
use crate::digest::Digest;
use crate::error::Error;
use crate::image_config;
use crate::manifest::{Index, Manifest};
use crate::platform;
use crate::resolver::Fetcher;

/// The shared traversal state: every manifest and index fetched so far,
/// keyed by digest, plus the platform-to-image index and the
/// referrer-to-subject map. Guarded by a single mutex acquired only
/// around each mutation, never across fetch/decode I/O.
#[derive(Default)]
pub struct TraversalResult {
    pub indexes: HashMap<Digest, (Descriptor, Index)>,
    pub manifests: HashMap<Digest, (Descriptor, Manifest)>,
    pub images: HashMap<String, Digest>,
    pub refs: HashMap<Digest, Vec<Digest>>,
}

impl TraversalResult {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Recursively fetches `descriptor` and everything it reaches, populating
/// `result`. Manifests and indexes are decoded and recorded; anything
/// else is ignored. Index children fan out concurrently with
/// await-all/first-error/cancel-siblings semantics.
pub async fn fetch(
    cache: &Arc<dyn ContentCache>,
    fetcher: &Arc<dyn Fetcher>,
    descriptor: Descriptor,
    result: &Arc<Mutex<TraversalResult>>,
) -> Result<(), Error> {
    let bytes =
        fetch_and_cache(cache, fetcher, &descriptor.digest, &descriptor.media_type).await?;

    if descriptor.is_manifest() {
        let manifest: Manifest = serde_json::from_slice(&bytes)
            .context("manifest JSON")
            .map_err(|source| Error::DecodeFailed {
                context: "manifest",
                source,
            })?;

        let digest = descriptor.digest.clone();

        if let Some(reference) = descriptor.annotation(ANNOTATION_REFERENCE_DIGEST) {
            let subject = Digest::try_from(reference).map_err(|e| Error::DecodeFailed {
                context: "reference-digest annotation",
                source: anyhow::anyhow!(e.to_string()),
            })?;
            let mut guard = result.lock().await;
            guard.refs.entry(subject).or_default().push(digest.clone());
            guard
                .manifests
                .insert(digest, (descriptor.clone(), manifest));
        } else {
            let config_descriptor = manifest.config.clone();
            let platform_key = match &descriptor.platform {
                Some(p) => platform::normalized_string(p),
                None => {
                    let config = image_config::decode(cache, fetcher, &config_descriptor).await?;
                    platform::normalized_string(&crate::descriptor::Platform {
                        os: config.os,
                        architecture: config.architecture,
                        variant: config.variant,
                    })
                }
            };

            let mut guard = result.lock().await;
            guard.images.insert(platform_key, digest.clone());
            guard
                .manifests
                .insert(digest, (descriptor.clone(), manifest));
        }

        return Ok(());
    }

    if descriptor.is_index() {
        let index: Index = serde_json::from_slice(&bytes)
            .context("index JSON")
            .map_err(|source| Error::DecodeFailed {
                context: "index",
                source,
            })?;

        {
            let mut guard = result.lock().await;
            guard
                .indexes
                .insert(descriptor.digest.clone(), (descriptor.clone(), index.clone()));
        }

        let mut set: JoinSet<Result<(), Error>> = JoinSet::new();
        for child in index.manifests.clone() {
            let cache = Arc::clone(cache);
            let fetcher = Arc::clone(fetcher);
            let result = Arc::clone(result);
            set.spawn(async move { fetch(&cache, &fetcher, child, &result).await });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    set.abort_all();
                    return Err(error);
                }
                Err(join_error) => {
                    set.abort_all();
                    return Err(Error::DecodeFailed {
                        context: "index child traversal task",
                        source: anyhow::anyhow!(join_error),
                    });
                }
            }
        }
    }

    Ok(())
}

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::buildinfo;
use crate::cache::ContentCache;
use crate::descriptor::ANNOTATION_IMAGE_TITLE;
use crate::digest::Digest;
use crate::error::Error;
use crate::image_config;
use crate::resolver::Fetcher;
use crate::result::{Image, InspectResult, ResultType};
use crate::sbom;
use crate::traverse::TraversalResult;

const ANNOTATION_AUTHORS: &str = "org.opencontainers.image.authors";
const ANNOTATION_VENDOR: &str = "org.opencontainers.image.vendor";
const ANNOTATION_URL: &str = "org.opencontainers.image.url";
const ANNOTATION_SOURCE: &str = "org.opencontainers.image.source";
const ANNOTATION_REVISION: &str = "org.opencontainers.image.revision";
const ANNOTATION_DOCUMENTATION: &str = "org.opencontainers.image.documentation";
const ANNOTATION_DESCRIPTION: &str = "org.opencontainers.image.description";
const ANNOTATION_LICENSES: &str = "org.opencontainers.image.licenses";

/// Walks the finished `TraversalResult` and produces the public report:
/// one `Image` per resolved platform, joined with decoded config,
/// provenance and SBOM.
pub async fn assemble(
    cache: &Arc<dyn ContentCache>,
    fetcher: &Arc<dyn Fetcher>,
    root_digest: Digest,
    result: Arc<Mutex<TraversalResult>>,
) -> Result<InspectResult, Error> {
    let guard = result.lock().await;

    let result_type = if guard.manifests.contains_key(&root_digest) {
        ResultType::Manifest
    } else if guard.indexes.contains_key(&root_digest) {
        ResultType::Index
    } else {
        ResultType::Unknown
    };

    let mut platforms: Vec<String> = guard.images.keys().cloned().collect();
    platforms.sort();

    let mut images = HashMap::with_capacity(guard.images.len());

    for platform_key in &platforms {
        let digest = guard
            .images
            .get(platform_key)
            .expect("platform key taken from the same map")
            .clone();

        let (descriptor, manifest) = guard
            .manifests
            .get(&digest)
            .ok_or_else(|| Error::MissingManifest {
                digest: digest.clone(),
            })?;

        let mut annotations: HashMap<String, String> = HashMap::new();
        if let Some(a) = &descriptor.annotations {
            annotations.extend(a.clone());
        }
        if let Some(a) = &manifest.annotations {
            annotations.extend(a.clone());
        }

        let mut image = Image {
            size: manifest.total_layer_size(),
            platform: Some(platform_key.clone()),
            title: annotations.get(ANNOTATION_IMAGE_TITLE).cloned(),
            author: annotations.get(ANNOTATION_AUTHORS).cloned(),
            vendor: annotations.get(ANNOTATION_VENDOR).cloned(),
            url: annotations.get(ANNOTATION_URL).cloned(),
            source: annotations.get(ANNOTATION_SOURCE).cloned(),
            revision: annotations.get(ANNOTATION_REVISION).cloned(),
            documentation: annotations.get(ANNOTATION_DOCUMENTATION).cloned(),
            description: annotations.get(ANNOTATION_DESCRIPTION).cloned(),
            short_description: None,
            license: annotations.get(ANNOTATION_LICENSES).cloned(),
            ..Image::default()
        };

        if let Some(refs) = guard.refs.get(&digest) {
            let referrer_manifests: Result<Vec<_>, Error> = refs
                .iter()
                .map(|r| {
                    guard
                        .manifests
                        .get(r)
                        .map(|(_, m)| m)
                        .ok_or_else(|| Error::MissingManifest { digest: r.clone() })
                })
                .collect();
            let referrer_manifests = referrer_manifests?;
            image.sbom = sbom::decode(cache, fetcher, &digest, &referrer_manifests).await?;
        }

        image.provenance = buildinfo::decode(cache, fetcher, &manifest.config).await?;
        image.config = Some(image_config::decode(cache, fetcher, &manifest.config).await?);

        images.insert(platform_key.clone(), image);
    }

    drop(guard);

    Ok(InspectResult {
        digest: root_digest,
        result_type,
        platforms,
        images,
    })
}


use std::collections::HashMap;

use anyhow::Context;
use serde_derive::Deserialize;

use crate::cache::{fetch_and_cache, ContentCache};
use crate::descriptor::Descriptor;
use crate::error::Error;
use crate::resolver::Fetcher;
use crate::result::{Material, Provenance};

/// Only the field build-info decoding cares about; the rest of the config
/// JSON is decoded separately by `image_config::decode`.
#[derive(Deserialize)]
struct ImageConfigWithBuildInfo {
    #[serde(rename = "BuildInfo", default)]
    build_info: Option<String>,
}

#[derive(Deserialize)]
struct BuildInfo {
    #[serde(default)]
    attrs: HashMap<String, Option<String>>,
    #[serde(default)]
    sources: Vec<Source>,
}

#[derive(Deserialize)]
struct Source {
    #[serde(rename = "Type", default)]
    r#type: String,
    #[serde(rename = "Ref", default)]
    r#ref: String,
    #[serde(rename = "Alias", default)]
    alias: String,
    #[serde(rename = "Pin", default)]
    pin: String,
}

/// Reads the cached config blob, extracts the base64-encoded `BuildInfo`
/// field if present, and decodes it into a `Provenance`. Does nothing
/// when the field is absent.
pub async fn decode(
    cache: &std::sync::Arc<dyn ContentCache>,
    fetcher: &std::sync::Arc<dyn Fetcher>,
    descriptor: &Descriptor,
) -> Result<Option<Provenance>, Error> {
    let bytes = fetch_and_cache(cache, fetcher, &descriptor.digest, &descriptor.media_type).await?;

    let config: ImageConfigWithBuildInfo = serde_json::from_slice(&bytes)
        .context("image config JSON (build-info probe)")
        .map_err(|source| Error::DecodeFailed {
            context: "build info config",
            source,
        })?;

    let encoded = match config.build_info {
        Some(encoded) => encoded,
        None => return Ok(None),
    };

    let decoded = base64::decode(&encoded)
        .context("base64 build-info payload")
        .map_err(|source| Error::DecodeFailed {
            context: "build info base64",
            source,
        })?;

    let build_info: BuildInfo = serde_json::from_slice(&decoded)
        .context("build-info JSON")
        .map_err(|source| Error::DecodeFailed {
            context: "build info",
            source,
        })?;

    let mut provenance = Provenance::default();

    if let Some(Some(context)) = build_info.attrs.get("context") {
        provenance.build_source = Some(context.clone());
    }
    if let Some(Some(filename)) = build_info.attrs.get("filename") {
        provenance.build_definition = Some(filename.clone());
    }

    for (key, value) in &build_info.attrs {
        let value = match value {
            Some(v) => v,
            None => continue,
        };
        if let Some(arg) = key.strip_prefix("build-arg:") {
            provenance
                .build_parameters
                .get_or_insert_with(HashMap::new)
                .insert(arg.to_string(), value.clone());
        }
    }

    provenance.materials = build_info
        .sources
        .into_iter()
        .map(|source| Material {
            r#type: non_empty(source.r#type),
            r#ref: non_empty(source.r#ref),
            alias: non_empty(source.alias),
            pin: non_empty(source.pin),
        })
        .collect();

    Ok(Some(provenance))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

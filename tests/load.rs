mod support;

use std::sync::Arc;

use imageinspect::cache::MemoryCache;
use imageinspect::descriptor::{
    Platform, MEDIA_TYPE_IN_TOTO, MEDIA_TYPE_OCI_INDEX, MEDIA_TYPE_OCI_MANIFEST,
};
use imageinspect::digest::{Algorithm, Digest};
use imageinspect::error::Error;
use imageinspect::result::ResultType;
use imageinspect::Loader;

use support::{descriptor, MockRegistryBuilder};

fn config_json(os: &str, architecture: &str) -> serde_json::Value {
    serde_json::json!({
        "architecture": architecture,
        "os": os,
        "rootfs": {"diff_ids": [], "type": "layers"}
    })
}

fn layer(digest: &Digest, size: u64) -> serde_json::Value {
    serde_json::json!({
        "mediaType": "application/vnd.oci.image.layer.v1.tar",
        "digest": digest.to_string(),
        "size": size,
    })
}

#[tokio::test]
async fn single_arch_manifest() {
    let builder = MockRegistryBuilder::new();
    let (builder, config_digest) = builder.put_json(&config_json("linux", "arm64"));

    let layer_a = Digest::of(Algorithm::Sha256, b"layer-a");
    let layer_b = Digest::of(Algorithm::Sha256, b"layer-b");

    let manifest = serde_json::json!({
        "schemaVersion": 2,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "digest": config_digest.to_string(), "size": 0},
        "layers": [layer(&layer_a, 100), layer(&layer_b, 200)],
    });
    let (builder, manifest_digest) = builder.put_json(&manifest);

    let top = descriptor(MEDIA_TYPE_OCI_MANIFEST, &manifest_digest, 0);
    let registry = builder.build(top);

    let loader = Loader::new(registry, Arc::new(MemoryCache::new()));
    let report = loader.load("test").await.unwrap();

    assert_eq!(report.result_type, ResultType::Manifest);
    assert_eq!(report.platforms, vec!["linux/arm64".to_string()]);
    assert_eq!(report.images["linux/arm64"].size, 300);
}

#[tokio::test]
async fn multi_arch_index() {
    let builder = MockRegistryBuilder::new();
    let (builder, arm64_config) = builder.put_json(&config_json("linux", "arm64"));
    let (builder, amd64_config) = builder.put_json(&config_json("linux", "amd64"));

    let arm64_layer = Digest::of(Algorithm::Sha256, b"arm64-layer");
    let amd64_layer = Digest::of(Algorithm::Sha256, b"amd64-layer");

    let arm64_manifest = serde_json::json!({
        "schemaVersion": 2,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "digest": arm64_config.to_string(), "size": 0},
        "layers": [layer(&arm64_layer, 25)],
    });
    let (builder, arm64_manifest_digest) = builder.put_json(&arm64_manifest);

    let amd64_manifest = serde_json::json!({
        "schemaVersion": 2,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "digest": amd64_config.to_string(), "size": 0},
        "layers": [layer(&amd64_layer, 50)],
    });
    let (builder, amd64_manifest_digest) = builder.put_json(&amd64_manifest);

    let index = serde_json::json!({
        "schemaVersion": 2,
        "manifests": [
            {
                "mediaType": MEDIA_TYPE_OCI_MANIFEST,
                "digest": arm64_manifest_digest.to_string(),
                "size": 0,
                "platform": {"architecture": "arm64", "os": "linux"},
            },
            {
                "mediaType": MEDIA_TYPE_OCI_MANIFEST,
                "digest": amd64_manifest_digest.to_string(),
                "size": 0,
                "platform": {"architecture": "amd64", "os": "linux"},
            },
        ],
    });
    let (builder, index_digest) = builder.put_json(&index);

    let top = descriptor(MEDIA_TYPE_OCI_INDEX, &index_digest, 0);
    let registry = builder.build(top);

    let loader = Loader::new(registry, Arc::new(MemoryCache::new()));
    let report = loader.load("test").await.unwrap();

    assert_eq!(report.result_type, ResultType::Index);
    assert_eq!(
        report.platforms,
        vec!["linux/amd64".to_string(), "linux/arm64".to_string()]
    );
    assert_eq!(report.images["linux/amd64"].size, 50);
    assert_eq!(report.images["linux/arm64"].size, 25);
}

#[tokio::test]
async fn title_propagation() {
    let builder = MockRegistryBuilder::new();
    let (builder, config_digest) = builder.put_json(&config_json("linux", "amd64"));

    let manifest = serde_json::json!({
        "schemaVersion": 2,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "digest": config_digest.to_string(), "size": 0},
        "layers": [],
        "annotations": {"org.opencontainers.image.title": "this is title"},
    });
    let (builder, manifest_digest) = builder.put_json(&manifest);

    let top = Platform {
        os: "linux".to_string(),
        architecture: "amd64".to_string(),
        variant: None,
    };
    let mut top_descriptor = descriptor(MEDIA_TYPE_OCI_MANIFEST, &manifest_digest, 0);
    top_descriptor.platform = Some(top);
    let registry = builder.build(top_descriptor);

    let loader = Loader::new(registry, Arc::new(MemoryCache::new()));
    let report = loader.load("test").await.unwrap();

    assert_eq!(
        report.images["linux/amd64"].title.as_deref(),
        Some("this is title")
    );
}

#[tokio::test]
async fn attestation_bound_sbom() {
    let builder = MockRegistryBuilder::new();
    let (builder, config_digest) = builder.put_json(&config_json("linux", "amd64"));

    let manifest = serde_json::json!({
        "schemaVersion": 2,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "digest": config_digest.to_string(), "size": 0},
        "layers": [],
    });
    let (builder, manifest_digest) = builder.put_json(&manifest);

    let spdx = serde_json::json!({
        "packages": [
            {
                "name": "musl",
                "versionInfo": "1.2",
                "externalRefs": [
                    {"referenceCategory": "PACKAGE_MANAGER", "referenceType": "purl", "referenceLocator": "pkg:alpine/musl@1.2"},
                ],
            }
        ]
    });

    let mut subject_digest = std::collections::HashMap::new();
    subject_digest.insert("sha256".to_string(), manifest_digest.encoded.clone());
    let statement = serde_json::json!({
        "predicateType": "https://spdx.dev/Document",
        "subject": [{"digest": subject_digest}],
        "predicate": spdx,
    });
    let (builder, statement_digest) = builder.put_json(&statement);

    let mut annotations = std::collections::HashMap::new();
    annotations.insert(
        "in-toto.io/predicate-type".to_string(),
        "https://spdx.dev/Document".to_string(),
    );
    let attestation_manifest = serde_json::json!({
        "schemaVersion": 2,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "digest": config_digest.to_string(), "size": 0},
        "layers": [{
            "mediaType": MEDIA_TYPE_IN_TOTO,
            "digest": statement_digest.to_string(),
            "size": 0,
            "annotations": annotations,
        }],
    });
    let (builder, attestation_manifest_digest) = builder.put_json(&attestation_manifest);

    let index = serde_json::json!({
        "schemaVersion": 2,
        "manifests": [
            {
                "mediaType": MEDIA_TYPE_OCI_MANIFEST,
                "digest": manifest_digest.to_string(),
                "size": 0,
                "platform": {"architecture": "amd64", "os": "linux"},
            },
            {
                "mediaType": MEDIA_TYPE_OCI_MANIFEST,
                "digest": attestation_manifest_digest.to_string(),
                "size": 0,
                "annotations": {"vnd.docker.reference.digest": manifest_digest.to_string()},
            },
        ],
    });
    let (builder, index_digest) = builder.put_json(&index);

    let top = descriptor(MEDIA_TYPE_OCI_INDEX, &index_digest, 0);
    let registry = builder.build(top);

    let loader = Loader::new(registry, Arc::new(MemoryCache::new()));
    let report = loader.load("test").await.unwrap();

    let sbom = report.images["linux/amd64"].sbom.as_ref().unwrap();
    assert_eq!(sbom.alpine_packages.len(), 1);
    assert!(sbom.unknown_packages.is_empty());
    assert_eq!(sbom.alpine_packages[0].name.as_deref(), Some("musl"));
    assert_eq!(sbom.alpine_packages[0].version.as_deref(), Some("1.2"));
}

#[tokio::test]
async fn subject_mismatch_fails() {
    let builder = MockRegistryBuilder::new();
    let (builder, config_digest) = builder.put_json(&config_json("linux", "amd64"));

    let manifest = serde_json::json!({
        "schemaVersion": 2,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "digest": config_digest.to_string(), "size": 0},
        "layers": [],
    });
    let (builder, manifest_digest) = builder.put_json(&manifest);

    let other = Digest::of(Algorithm::Sha256, b"not-the-subject");
    let mut subject_digest = std::collections::HashMap::new();
    subject_digest.insert("sha256".to_string(), other.encoded.clone());
    let statement = serde_json::json!({
        "predicateType": "https://spdx.dev/Document",
        "subject": [{"digest": subject_digest}],
        "predicate": {"packages": []},
    });
    let (builder, statement_digest) = builder.put_json(&statement);

    let mut annotations = std::collections::HashMap::new();
    annotations.insert(
        "in-toto.io/predicate-type".to_string(),
        "https://spdx.dev/Document".to_string(),
    );
    let attestation_manifest = serde_json::json!({
        "schemaVersion": 2,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "digest": config_digest.to_string(), "size": 0},
        "layers": [{
            "mediaType": MEDIA_TYPE_IN_TOTO,
            "digest": statement_digest.to_string(),
            "size": 0,
            "annotations": annotations,
        }],
    });
    let (builder, attestation_manifest_digest) = builder.put_json(&attestation_manifest);

    let index = serde_json::json!({
        "schemaVersion": 2,
        "manifests": [
            {
                "mediaType": MEDIA_TYPE_OCI_MANIFEST,
                "digest": manifest_digest.to_string(),
                "size": 0,
                "platform": {"architecture": "amd64", "os": "linux"},
            },
            {
                "mediaType": MEDIA_TYPE_OCI_MANIFEST,
                "digest": attestation_manifest_digest.to_string(),
                "size": 0,
                "annotations": {"vnd.docker.reference.digest": manifest_digest.to_string()},
            },
        ],
    });
    let (builder, index_digest) = builder.put_json(&index);

    let top = descriptor(MEDIA_TYPE_OCI_INDEX, &index_digest, 0);
    let registry = builder.build(top);

    let loader = Loader::new(registry, Arc::new(MemoryCache::new()));
    let error = loader.load("test").await.unwrap_err();

    assert!(matches!(error, Error::SubjectMismatch { .. }));
}

#[tokio::test]
async fn build_args_propagation() {
    let builder = MockRegistryBuilder::new();

    let build_info = serde_json::json!({
        "attrs": {
            "context": "git://x",
            "filename": "Dockerfile",
            "build-arg:FOO": "1",
            "build-arg:BAR": "2",
        },
        "sources": [],
    });
    let encoded = base64::encode(serde_json::to_vec(&build_info).unwrap());

    let mut config = config_json("linux", "amd64");
    config["BuildInfo"] = serde_json::Value::String(encoded);
    let (builder, config_digest) = builder.put_json(&config);

    let manifest = serde_json::json!({
        "schemaVersion": 2,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "digest": config_digest.to_string(), "size": 0},
        "layers": [],
    });
    let (builder, manifest_digest) = builder.put_json(&manifest);

    let mut top_descriptor = descriptor(MEDIA_TYPE_OCI_MANIFEST, &manifest_digest, 0);
    top_descriptor.platform = Some(Platform {
        os: "linux".to_string(),
        architecture: "amd64".to_string(),
        variant: None,
    });
    let registry = builder.build(top_descriptor);

    let loader = Loader::new(registry, Arc::new(MemoryCache::new()));
    let report = loader.load("test").await.unwrap();

    let provenance = report.images["linux/amd64"].provenance.as_ref().unwrap();
    assert_eq!(provenance.build_source.as_deref(), Some("git://x"));
    assert_eq!(provenance.build_definition.as_deref(), Some("Dockerfile"));
    let params = provenance.build_parameters.as_ref().unwrap();
    assert_eq!(params.get("FOO").map(String::as_str), Some("1"));
    assert_eq!(params.get("BAR").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn zero_child_index_is_empty() {
    let builder = MockRegistryBuilder::new();
    let index = serde_json::json!({
        "schemaVersion": 2,
        "manifests": [],
    });
    let (builder, index_digest) = builder.put_json(&index);

    let top = descriptor(MEDIA_TYPE_OCI_INDEX, &index_digest, 0);
    let registry = builder.build(top);

    let loader = Loader::new(registry, Arc::new(MemoryCache::new()));
    let report = loader.load("test").await.unwrap();

    assert_eq!(report.result_type, ResultType::Index);
    assert!(report.platforms.is_empty());
    assert!(report.images.is_empty());
}

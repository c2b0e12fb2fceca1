use std::panic::{self, AssertUnwindSafe};

use anyhow::Context;
use serde_derive::Deserialize;

use crate::cache::{fetch_and_cache, ContentCache};
use crate::descriptor::{
    ANNOTATION_IN_TOTO_PREDICATE_TYPE, MEDIA_TYPE_IN_TOTO, PREDICATE_TYPE_SPDX,
};
use crate::digest::Digest;
use crate::error::Error;
use crate::manifest::Manifest;
use crate::resolver::Fetcher;
use crate::result::{Package, PackageCreator, Sbom};

const LICENSE_SEPARATOR: &str = " AND ";

#[derive(Deserialize)]
struct InTotoStatement {
    #[serde(rename = "predicateType")]
    predicate_type: String,
    subject: Vec<InTotoSubject>,
    predicate: serde_json::Value,
}

#[derive(Deserialize)]
struct InTotoSubject {
    #[serde(default)]
    digest: std::collections::HashMap<String, String>,
}

#[derive(Deserialize)]
struct SpdxDocument {
    #[serde(default)]
    packages: Vec<SpdxPackage>,
}

#[derive(Deserialize)]
struct SpdxPackage {
    #[serde(rename = "name", default)]
    name: String,
    #[serde(rename = "versionInfo", default)]
    version_info: String,
    #[serde(rename = "description", default)]
    description: String,
    #[serde(rename = "downloadLocation", default)]
    download_location: String,
    #[serde(rename = "homepage", default)]
    homepage: String,
    #[serde(rename = "licenseConcluded", default)]
    license_concluded: String,
    #[serde(rename = "originator", default)]
    originator: String,
    #[serde(rename = "externalRefs", default)]
    external_refs: Vec<SpdxExternalRef>,
    #[serde(rename = "hasFiles", default)]
    has_files: Vec<SpdxFileRef>,
}

#[derive(Deserialize)]
struct SpdxExternalRef {
    #[serde(rename = "referenceCategory", default)]
    category: String,
    #[serde(rename = "referenceType", default)]
    ref_type: String,
    #[serde(rename = "referenceLocator", default)]
    locator: String,
}

/// One entry of a package's `hasFiles`, mirroring `addSPDX`'s `p.Files`.
#[derive(Deserialize)]
struct SpdxFileRef {
    #[serde(rename = "fileName", default)]
    file_name: Option<String>,
}

/// Scans every referrer manifest pointing at `subject` for an in-toto+SPDX
/// attestation layer, decodes each, and folds the packages into one SBOM.
/// Returns `None` when no referrer carries a usable SPDX layer.
pub async fn decode(
    cache: &std::sync::Arc<dyn ContentCache>,
    fetcher: &std::sync::Arc<dyn Fetcher>,
    subject: &Digest,
    referrer_manifests: &[&Manifest],
) -> Result<Option<Sbom>, Error> {
    let mut alpine = Vec::new();
    let mut unknown = Vec::new();

    for manifest in referrer_manifests {
        for layer in &manifest.layers {
            if layer.media_type != MEDIA_TYPE_IN_TOTO {
                continue;
            }
            if layer.annotation(ANNOTATION_IN_TOTO_PREDICATE_TYPE) != Some(PREDICATE_TYPE_SPDX) {
                continue;
            }

            let bytes =
                fetch_and_cache(cache, fetcher, &layer.digest, &layer.media_type).await?;

            let statement: InTotoStatement = serde_json::from_slice(&bytes)
                .context("in-toto statement JSON")
                .map_err(|source| Error::DecodeFailed {
                    context: "in-toto statement",
                    source,
                })?;

            if statement.predicate_type != PREDICATE_TYPE_SPDX {
                return Err(Error::UnexpectedPredicate {
                    found: statement.predicate_type,
                });
            }

            validate_subject(&statement, &layer.digest, subject)?;

            let predicate_bytes = serde_json::to_vec(&statement.predicate)
                .context("re-encode in-toto predicate")
                .map_err(|source| Error::DecodeFailed {
                    context: "spdx predicate",
                    source,
                })?;

            let document = decode_spdx(&predicate_bytes)?;
            for package in document.packages {
                bucket_package(package, &mut alpine, &mut unknown);
            }
        }
    }

    if alpine.is_empty() && unknown.is_empty() {
        return Ok(None);
    }

    sort_packages(&mut alpine);
    sort_packages(&mut unknown);

    Ok(Some(Sbom {
        alpine_packages: alpine,
        unknown_packages: unknown,
    }))
}

fn validate_subject(
    statement: &InTotoStatement,
    attestation: &Digest,
    subject: &Digest,
) -> Result<(), Error> {
    let expected = subject.to_string();
    let validated = statement.subject.iter().any(|s| {
        s.digest
            .iter()
            .any(|(alg, hash)| format!("{}:{}", alg, hash) == expected)
    });

    if validated {
        Ok(())
    } else {
        Err(Error::SubjectMismatch {
            attestation: attestation.clone(),
            subject: subject.clone(),
        })
    }
}

/// Wraps the decode in `catch_unwind`: a malformed document must not take
/// down the process, only fail this one attestation.
fn decode_spdx(bytes: &[u8]) -> Result<SpdxDocument, Error> {
    panic::catch_unwind(AssertUnwindSafe(|| serde_json::from_slice::<SpdxDocument>(bytes)))
        .map_err(|_| Error::DecodeFailed {
            context: "spdx document (panic during parse)",
            source: anyhow::anyhow!("spdx json parser panicked"),
        })?
        .context("spdx document JSON")
        .map_err(|source| Error::DecodeFailed {
            context: "spdx document",
            source,
        })
}

fn bucket_package(spdx: SpdxPackage, alpine: &mut Vec<Package>, unknown: &mut Vec<Package>) {
    let mut is_alpine = false;
    let mut cpes = Vec::new();

    for reference in &spdx.external_refs {
        if reference.category == "PACKAGE_MANAGER"
            && reference.ref_type == "purl"
            && reference.locator.starts_with("pkg:alpine/")
        {
            is_alpine = true;
        }
        if reference.category == "SECURITY" && reference.ref_type == "cpe23Type" {
            cpes.push(reference.locator.clone());
        }
    }

    let files = spdx
        .has_files
        .into_iter()
        .filter_map(|f| f.file_name)
        .collect();

    let package = Package {
        name: non_empty(spdx.name),
        version: non_empty(spdx.version_info),
        description: non_empty(spdx.description),
        creator: parse_originator(&spdx.originator),
        download_url: non_empty(spdx.download_location),
        homepage_url: non_empty(spdx.homepage),
        license: split_license(&spdx.license_concluded),
        files,
        cpes,
    };

    if is_alpine {
        alpine.push(package);
    } else {
        unknown.push(package);
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Splits an SPDX `PackageOriginator` string into a person or an
/// organization, mirroring the split the original Go tool gets for free
/// from `spdx/tools-golang`'s `PackageOriginatorPerson` /
/// `PackageOriginatorOrganization` fields. The raw field is one of
/// `"Person: Name (email)"`, `"Organization: Name"` or `"NOASSERTION"`.
fn parse_originator(originator: &str) -> PackageCreator {
    if let Some(name) = originator.strip_prefix("Person: ") {
        return PackageCreator {
            name: non_empty(name.to_string()),
            org: None,
        };
    }
    if let Some(org) = originator.strip_prefix("Organization: ") {
        return PackageCreator {
            name: None,
            org: non_empty(org.to_string()),
        };
    }
    PackageCreator::default()
}

/// `P.licenseConcluded` is a single SPDX license expression; the original
/// splits it on `" AND "` into the individual licenses that make it up.
fn split_license(license_concluded: &str) -> Vec<String> {
    license_concluded
        .split(LICENSE_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn sort_packages(packages: &mut [Package]) {
    packages.sort_by(|a, b| match (&a.name, &b.name) {
        (Some(an), Some(bn)) if an == bn => a.version.cmp(&b.version),
        _ => a.name.cmp(&b.name),
    });
}

use std::collections::HashMap;

use serde_derive::Serialize;

use crate::digest::Digest;
use crate::image_config::Config;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum ResultType {
    #[serde(rename = "manifest")]
    Manifest,
    #[serde(rename = "index")]
    Index,
    #[serde(rename = "unknown")]
    Unknown,
}

/// The public, serialized report produced by a single `load`.
#[derive(Clone, Debug, Serialize)]
pub struct InspectResult {
    #[serde(rename = "Digest")]
    pub digest: Digest,

    #[serde(rename = "ResultType")]
    pub result_type: ResultType,

    #[serde(rename = "Platforms")]
    pub platforms: Vec<String>,

    #[serde(rename = "Images")]
    pub images: HashMap<String, Image>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Identity {
    #[serde(rename = "PublicKey", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Signature {
    #[serde(rename = "Verified")]
    pub verified: bool,
    #[serde(rename = "Identity")]
    pub identity: Identity,
}

/// The originator of a package: a person, an organization, or both absent.
/// Mirrors the original's split of `PackageOriginatorPerson` /
/// `PackageOriginatorOrganization` into one `Creator` value.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PackageCreator {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Org", skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Package {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Version", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Creator")]
    pub creator: PackageCreator,
    #[serde(rename = "DownloadURL", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(rename = "HomepageURL", skip_serializing_if = "Option::is_none")]
    pub homepage_url: Option<String>,
    #[serde(rename = "License", skip_serializing_if = "Vec::is_empty", default)]
    pub license: Vec<String>,
    #[serde(rename = "Files", skip_serializing_if = "Vec::is_empty", default)]
    pub files: Vec<String>,
    #[serde(rename = "CPEs", skip_serializing_if = "Vec::is_empty", default)]
    pub cpes: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Sbom {
    #[serde(rename = "AlpinePackages", skip_serializing_if = "Vec::is_empty", default)]
    pub alpine_packages: Vec<Package>,
    #[serde(rename = "UnknownPackages", skip_serializing_if = "Vec::is_empty", default)]
    pub unknown_packages: Vec<Package>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Material {
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(rename = "Ref", skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
    #[serde(rename = "Alias", skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(rename = "Pin", skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Provenance {
    #[serde(rename = "BuildSource", skip_serializing_if = "Option::is_none")]
    pub build_source: Option<String>,
    #[serde(rename = "BuildDefinition", skip_serializing_if = "Option::is_none")]
    pub build_definition: Option<String>,
    #[serde(rename = "BuildParameters", skip_serializing_if = "Option::is_none")]
    pub build_parameters: Option<HashMap<String, String>>,
    #[serde(rename = "Materials", skip_serializing_if = "Vec::is_empty", default)]
    pub materials: Vec<Material>,
}

/// Per-platform image report: descriptor-derived metadata joined with
/// decoded config, build provenance and SBOM.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Image {
    #[serde(rename = "Title", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "Platform", skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(rename = "Author", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(rename = "Vendor", skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    #[serde(rename = "Url", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(rename = "Source", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(rename = "Revision", skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    #[serde(rename = "Documentation", skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    #[serde(rename = "ShortDescription", skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,

    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "License", skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(rename = "Size")]
    pub size: u64,

    #[serde(rename = "Signatures", skip_serializing_if = "Vec::is_empty", default)]
    pub signatures: Vec<Signature>,

    #[serde(rename = "SBOM", skip_serializing_if = "Option::is_none")]
    pub sbom: Option<Sbom>,

    #[serde(rename = "Provenance", skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,

    #[serde(rename = "Config", skip_serializing_if = "Option::is_none")]
    pub config: Option<Config>,
}

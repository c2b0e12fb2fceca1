use std::fmt;

use regex::Regex;

use crate::error::Error;

const DEFAULT_REGISTRY: &str = "docker.io";
const DEFAULT_NAMESPACE: &str = "library";
const DEFAULT_TAG: &str = "latest";

// registry(optional)/namespace/name(:tag | @digest)?
const PATTERN: &str = r"^(?:(?P<registry>[a-zA-Z0-9][a-zA-Z0-9.-]*(?::[0-9]+)?)/)?(?P<name>[a-z0-9]+(?:[._-][a-z0-9]+)*(?:/[a-z0-9]+(?:[._-][a-z0-9]+)*)*)(?:(?::(?P<tag>[a-zA-Z0-9_][a-zA-Z0-9._-]{0,127}))|(?:@(?P<digest>[a-z0-9]+:[a-zA-Z0-9]+)))?$";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locator {
    Tag(String),
    Digest(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Tag(tag) => write!(f, "{}", tag),
            Locator::Digest(digest) => write!(f, "{}", digest),
        }
    }
}

/// A user-supplied image reference after Docker-style default application:
/// missing registry becomes `docker.io`, a bare top-level name gets the
/// `library/` namespace, and a missing tag/digest becomes `latest`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedReference {
    pub registry: String,
    pub name: String,
    pub locator: Locator,
}

impl NamedReference {
    /// `registry/name:tag` or `registry/name@digest` — what `Resolve` is
    /// called with.
    pub fn to_string(&self) -> String {
        format!("{}/{}{}", self.registry, self.name, self.locator_suffix())
    }

    /// Rewrites the locator to a digest, producing the canonical
    /// (content-addressed) reference the fetcher is scoped to.
    pub fn with_digest(&self, digest: &str) -> NamedReference {
        NamedReference {
            registry: self.registry.clone(),
            name: self.name.clone(),
            locator: Locator::Digest(digest.to_string()),
        }
    }

    fn locator_suffix(&self) -> String {
        match &self.locator {
            Locator::Tag(tag) => format!(":{}", tag),
            Locator::Digest(digest) => format!("@{}", digest),
        }
    }
}

/// Parses a human-readable reference (`library/alpine:latest`,
/// `alpine`, `ghcr.io/org/name@sha256:...`) applying Docker's defaults.
/// Fails with `Error::InvalidReference` when the input does not match
/// the grammar.
pub fn parse(reference: &str) -> Result<NamedReference, Error> {
    let regex = Regex::new(PATTERN).unwrap();
    let captures = regex
        .captures(reference)
        .ok_or_else(|| Error::InvalidReference {
            reference: reference.to_string(),
            reason: "does not match the reference grammar".to_string(),
        })?;

    let registry = captures
        .name("registry")
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_REGISTRY.to_string());

    let mut name = captures.name("name").unwrap().as_str().to_string();
    if !name.contains('/') {
        name = format!("{}/{}", DEFAULT_NAMESPACE, name);
    }

    let locator = match (captures.name("tag"), captures.name("digest")) {
        (Some(tag), None) => Locator::Tag(tag.as_str().to_string()),
        (None, Some(digest)) => Locator::Digest(digest.as_str().to_string()),
        (None, None) => Locator::Tag(DEFAULT_TAG.to_string()),
        (Some(_), Some(_)) => {
            return Err(Error::InvalidReference {
                reference: reference.to_string(),
                reason: "cannot specify both a tag and a digest".to_string(),
            })
        }
    };

    Ok(NamedReference {
        registry,
        name,
        locator,
    })
}

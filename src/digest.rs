use std::convert::TryFrom;
use std::fmt;

use regex::Regex;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use sha2::{digest::Digest as Sha2Digest, Sha256, Sha512};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Sha256,
    Sha512,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512 => "sha512",
        };
        write!(f, "{}", name)
    }
}

/// A content pointer: `<algorithm>:<hex>`. The only handle used to fetch
/// anything and the key of every map in the traversal result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Digest {
    pub algorithm: Algorithm,
    pub encoded: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParseDigestError(String);

impl fmt::Display for ParseDigestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid digest format `{}`", self.0)
    }
}

impl std::error::Error for ParseDigestError {}

const DIGEST_PATTERN: &str = "^(?P<algorithm>[a-z0-9]+):(?P<encoded>[a-zA-Z0-9]+)$";

impl TryFrom<&str> for Digest {
    type Error = ParseDigestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let regex = Regex::new(DIGEST_PATTERN).unwrap();
        let captures = regex
            .captures(value)
            .ok_or_else(|| ParseDigestError(value.to_string()))?;

        let algorithm = captures.name("algorithm").unwrap().as_str();
        let encoded = captures.name("encoded").unwrap().as_str();

        let algorithm = match algorithm {
            "sha256" => Algorithm::Sha256,
            "sha512" => Algorithm::Sha512,
            other => return Err(ParseDigestError(format!("unsupported algorithm `{}`", other))),
        };

        Ok(Digest {
            algorithm,
            encoded: encoded.to_string(),
        })
    }
}

impl Digest {
    /// Computes the digest of `bytes` under `algorithm`.
    pub fn of(algorithm: Algorithm, bytes: &[u8]) -> Digest {
        let encoded = match algorithm {
            Algorithm::Sha256 => format!("{:x}", Sha256::digest(bytes)),
            Algorithm::Sha512 => format!("{:x}", Sha512::digest(bytes)),
        };
        Digest { algorithm, encoded }
    }

    /// True when `bytes` hashes to this digest under its own algorithm.
    pub fn verify(&self, bytes: &[u8]) -> bool {
        Digest::of(self.algorithm, bytes).encoded == self.encoded
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", &self.algorithm, &self.encoded)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        Digest::try_from(string.as_str()).map_err(de::Error::custom)
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

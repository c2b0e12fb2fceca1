use thiserror::Error;

use crate::digest::Digest;

/// Typed failure modes of the core. The CLI renders these through an
/// `anyhow` cause chain; library callers match on the variant.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid reference `{reference}`: {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("could not resolve reference `{reference}`")]
    ResolveFailed {
        reference: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("could not fetch `{digest}`")]
    FetchFailed {
        digest: Digest,
        #[source]
        source: anyhow::Error,
    },

    #[error("could not decode {context}")]
    DecodeFailed {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("attestation `{attestation}` does not reference subject `{subject}`")]
    SubjectMismatch { attestation: Digest, subject: Digest },

    #[error("manifest `{digest}` referenced during assembly was never fetched")]
    MissingManifest { digest: Digest },

    #[error("in-toto predicate type `{found}` is not an SPDX document")]
    UnexpectedPredicate { found: String },
}

pub type Result<T> = std::result::Result<T, Error>;

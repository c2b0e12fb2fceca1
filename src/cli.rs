use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::Verbosity;

/// Read-only inspector for images in OCI/Docker registries.
#[derive(Parser, Debug)]
#[clap(version, author, about)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: Verbosity,

    /// Directory used to cache fetched blobs. Defaults to the platform
    /// cache directory when omitted.
    #[clap(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Image reference, e.g. `library/alpine:latest`
    pub reference: String,
}

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use imageinspect::cache::{ContentCache, FsCache};
use imageinspect::registry::HttpRegistry;
use imageinspect::Loader;

mod cli;
mod dirs;
mod logger;
mod metadata;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose.log_level()).context("could not initialize logger")?;
    log::trace!("current pid is `{}`", process::id());

    let cache_dir = cli.cache_dir.unwrap_or_else(dirs::default_cache_dir);
    log::debug!("using cache directory `{}`", cache_dir.display());

    let cache: Arc<dyn ContentCache> = Arc::new(FsCache::new(cache_dir));
    let resolver = Arc::new(HttpRegistry::new().context("could not build registry client")?);

    let loader = Loader::new(resolver, cache);

    match loader.load(&cli.reference).await {
        Ok(report) => {
            let json = serde_json::to_string_pretty(&report)
                .context("could not serialize inspection result")?;
            println!("{}", json);
            Ok(())
        }
        Err(error) => {
            eprintln!("error: {:#}", anyhow::Error::from(error));
            process::exit(1);
        }
    }
}

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::metadata::{NAME, ORGANIZATION, QUALIFIER};

pub fn project_directories() -> ProjectDirs {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, NAME).unwrap()
}

/// Default cache directory used when `--cache-dir` is not given.
pub fn default_cache_dir() -> PathBuf {
    project_directories().cache_dir().to_path_buf()
}

use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::{Result, StoreError};
use crate::store::Store;

pub const DB_FILE: &str = "hlsf.db";

/// Default base directory for all HLSF state.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".hlsf")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Open (creating as needed) the database under `base_dir`, or under
/// [`default_base_dir`] when none is given.
pub fn open_in(base_dir: Option<&Path>) -> Result<Store> {
    let base = base_dir.map(PathBuf::from).unwrap_or_else(default_base_dir);
    fs::create_dir_all(&base).map_err(|e| {
        StoreError::InvalidData(format!("failed to create {}: {e}", base.display()))
    })?;
    let path = base.join(DB_FILE);
    tracing::debug!(path = %path.display(), "opening store");
    Store::open(&path)
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::persist::SqliteKv;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.finmind", "FinMind", "finmind"));

/// Location of the data file: `override_path` if given, else the platform
/// data directory.
pub fn db_path(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = override_path {
        if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        return Ok(p.to_path_buf());
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("finmind.sqlite"))
}

pub fn open_or_init(override_path: Option<&Path>) -> Result<SqliteKv> {
    let path = db_path(override_path)?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "opened data file");
    SqliteKv::new(conn).with_context(|| format!("Init schema in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::KvStore;

    #[test]
    fn explicit_path_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.sqlite");
        let kv = open_or_init(Some(&path)).unwrap();
        kv.save("k", "v").unwrap();
        assert!(path.exists());
        drop(kv);

        let again = open_or_init(Some(&path)).unwrap();
        assert_eq!(again.load("k").unwrap().as_deref(), Some("v"));
    }
}

//! Shared helpers for integration tests: isolated on-disk specifications and
//! network-free ISO sources.

#![allow(clippy::expect_used, clippy::unwrap_used, dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use thornsec::resolve::{IsoCache, IsoMetadata, IsoSource};
use thornsec::spec::NetworkConfig;

/// A temporary directory holding specification files for one test.
pub struct SpecContext {
    dir: TempDir,
}

impl SpecContext {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Root of the context directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the context root, creating parents.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write spec file");
        path
    }

    /// Write `network.json` with the given contents and load it.
    pub fn load(&self, contents: &str) -> NetworkConfig {
        let path = self.write("network.json", contents);
        NetworkConfig::load(&path).expect("spec must load")
    }
}

/// ISO source that never touches the network and always fails, so plans
/// compile the same way with or without connectivity.
#[derive(Debug)]
pub struct OfflineIso;

impl IsoSource for OfflineIso {
    fn fetch(&self, _base_url: &str) -> anyhow::Result<IsoMetadata> {
        anyhow::bail!("offline")
    }
}

/// Cache whose fetch always fails.
pub fn offline_cache() -> IsoCache {
    IsoCache::new(Box::new(OfflineIso))
}

/// ISO source with a fixed in-memory answer.
#[derive(Debug)]
pub struct FixedIso;

impl IsoSource for FixedIso {
    fn fetch(&self, base_url: &str) -> anyhow::Result<IsoMetadata> {
        Ok(IsoMetadata {
            url: format!("{base_url}debian-netinst.iso"),
            sha512: "feedbeef".to_string(),
        })
    }
}

/// Cache over the fixed source.
pub fn fixed_cache() -> IsoCache {
    IsoCache::new(Box::new(FixedIso))
}

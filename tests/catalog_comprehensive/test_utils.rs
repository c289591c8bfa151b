//! Shared helpers for the catalog suite

#![allow(dead_code)]

use std::path::Path;
use std::sync::Once;

use tempfile::TempDir;
use tsid::{Catalog, CatalogConfig};

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// A catalog in a fresh temporary directory
pub struct TestCatalog {
    pub dir: TempDir,
    pub catalog: Option<Catalog>,
}

impl TestCatalog {
    pub fn new() -> Self {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::open(dir.path()).unwrap();
        Self {
            dir,
            catalog: Some(catalog),
        }
    }

    pub fn with_config(config: CatalogConfig) -> Self {
        init_tracing();
        let dir = TempDir::new().unwrap();
        config
            .write_to_file(&dir.path().join(tsid::CONFIG_FILE_NAME))
            .unwrap();
        let catalog = Catalog::open(dir.path()).unwrap();
        Self {
            dir,
            catalog: Some(catalog),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog.as_ref().unwrap()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Drop the open catalog and open the directory again
    pub fn reopen(&mut self) -> &Catalog {
        self.catalog = None;
        self.catalog = Some(Catalog::open(self.dir.path()).unwrap());
        self.catalog()
    }

    /// Drop the open catalog, leaving only what is on disk
    pub fn close(&mut self) {
        self.catalog = None;
    }
}

/// Table files of one family directory, sorted
pub fn table_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "sst"))
        .collect();
    files.sort();
    files
}

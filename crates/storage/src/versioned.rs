//! VersionedFamily: segment-based family with point-in-time snapshots
//!
//! This module implements the [`Family`] contract using:
//! - an append-only list of immutable `Arc<Segment>`s, one per commit
//! - `parking_lot::RwLock` around the list and its version
//! - optional directory backing, one table file per segment
//!
//! # Design Notes
//!
//! - **No compaction**: segments are never merged or removed
//! - **Commit is the visibility point**: a segment joins the list only after
//!   its table file (if any) has been synced and renamed into place
//! - **Serialized commits**: a commit lock keeps file numbers and list order
//!   identical

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use tsid_core::Result;

use crate::family::{Family, FamilyKey, Flusher, Reader, Snapshot};
use crate::file_name::{is_tmp_file_name, parse_table_file_name, table_file_name, tmp_file_name};
use crate::format::table::{read_table_file, write_table_file};
use crate::snapshot::FamilySnapshot;

/// One committed, immutable segment
#[derive(Debug)]
pub struct Segment {
    /// Table file number (also the commit order)
    file_number: u64,
    /// Key/value pairs of the segment
    entries: BTreeMap<FamilyKey, Vec<u8>>,
}

impl Segment {
    /// File number of this segment
    pub fn file_number(&self) -> u64 {
        self.file_number
    }

    /// True if the segment holds `key`
    pub fn contains(&self, key: FamilyKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of keys in the segment
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the segment holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Reader for Segment {
    fn get(&self, key: FamilyKey) -> Option<&[u8]> {
        self.entries.get(&key).map(|v| v.as_slice())
    }
}

#[derive(Debug, Default)]
struct FamilyState {
    /// Incremented once per commit
    version: u64,
    /// Committed segments, oldest first
    segments: Vec<Arc<Segment>>,
}

/// Shared state of a family, referenced by its handles, snapshots and flushers
#[derive(Debug)]
pub(crate) struct FamilyInner {
    name: String,
    dir: Option<PathBuf>,
    state: RwLock<FamilyState>,
    commit_lock: Mutex<()>,
    next_file_number: AtomicU64,
    pub(crate) active_snapshots: AtomicUsize,
}

/// Segment-based storage family
///
/// Cloning the handle shares the family.
#[derive(Debug, Clone)]
pub struct VersionedFamily {
    inner: Arc<FamilyInner>,
}

impl VersionedFamily {
    fn with_state(name: &str, dir: Option<PathBuf>, state: FamilyState, next: u64) -> Self {
        Self {
            inner: Arc::new(FamilyInner {
                name: name.to_string(),
                dir,
                state: RwLock::new(state),
                commit_lock: Mutex::new(()),
                next_file_number: AtomicU64::new(next),
                active_snapshots: AtomicUsize::new(0),
            }),
        }
    }

    /// Create an empty family that lives only in memory
    pub fn in_memory(name: &str) -> Self {
        Self::with_state(name, None, FamilyState::default(), 1)
    }

    /// Open (or create) a family backed by table files in `dir`
    ///
    /// Every `NNNNNN.sst` file is loaded in file-number order; leftover
    /// `.tmp` files from an interrupted commit are removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or a table file is
    /// corrupt.
    pub fn open(name: &str, dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let mut file_numbers = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(number) = parse_table_file_name(file_name) {
                file_numbers.push(number);
            } else if is_tmp_file_name(file_name) {
                warn!(family = name, file = file_name, "Removing incomplete table file");
                std::fs::remove_file(entry.path())?;
            }
        }
        file_numbers.sort_unstable();

        let mut segments = Vec::with_capacity(file_numbers.len());
        for &file_number in &file_numbers {
            let entries = read_table_file(&dir.join(table_file_name(file_number)))?;
            segments.push(Arc::new(Segment {
                file_number,
                entries,
            }));
        }

        let next = file_numbers.last().map_or(1, |n| n + 1);
        info!(
            family = name,
            dir = %dir.display(),
            segments = segments.len(),
            "Opened family"
        );
        let state = FamilyState {
            version: segments.len() as u64,
            segments,
        };
        Ok(Self::with_state(name, Some(dir), state, next))
    }

    /// Current version (number of commits)
    pub fn version(&self) -> u64 {
        self.inner.state.read().version
    }

    /// Number of committed segments
    pub fn segment_count(&self) -> usize {
        self.inner.state.read().segments.len()
    }

    /// Number of snapshots not yet released
    pub fn active_snapshots(&self) -> usize {
        self.inner.active_snapshots.load(Ordering::SeqCst)
    }

    /// Backing directory, `None` for an in-memory family
    pub fn dir(&self) -> Option<&Path> {
        self.inner.dir.as_deref()
    }
}

impl Family for VersionedFamily {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn get_snapshot(&self) -> Box<dyn Snapshot> {
        let state = self.inner.state.read();
        Box::new(FamilySnapshot::new(
            state.version,
            state.segments.clone(),
            Arc::clone(&self.inner),
        ))
    }

    fn new_flusher(&self) -> Box<dyn Flusher> {
        Box::new(SegmentFlusher {
            inner: Arc::clone(&self.inner),
            pending: BTreeMap::new(),
        })
    }
}

/// Buffers pairs and commits them as one segment
pub struct SegmentFlusher {
    inner: Arc<FamilyInner>,
    pending: BTreeMap<FamilyKey, Vec<u8>>,
}

impl Flusher for SegmentFlusher {
    fn add(&mut self, key: FamilyKey, value: &[u8]) -> Result<()> {
        self.pending.insert(key, value.to_vec());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let _guard = self.inner.commit_lock.lock();
        let file_number = self.inner.next_file_number.load(Ordering::SeqCst);

        if let Some(dir) = &self.inner.dir {
            write_table_file(
                &dir.join(table_file_name(file_number)),
                &dir.join(tmp_file_name(file_number)),
                &self.pending,
            )?;
        }
        self.inner
            .next_file_number
            .store(file_number + 1, Ordering::SeqCst);

        let segment = Arc::new(Segment {
            file_number,
            entries: std::mem::take(&mut self.pending),
        });
        let keys = segment.len();

        let mut state = self.inner.state.write();
        state.segments.push(segment);
        state.version += 1;
        debug!(
            family = %self.inner.name,
            file_number,
            keys,
            version = state.version,
            "Committed segment"
        );
        Ok(())
    }
}

//! Fault-injecting family wrapper
//!
//! Faults are switched on and off at runtime and apply to every snapshot and
//! flusher handed out afterwards, as well as to ones already open.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tsid_core::{Error, Result};

use crate::family::{Family, FamilyKey, Flusher, Reader, Snapshot};
use crate::versioned::VersionedFamily;

/// Place where a fault can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// `Snapshot::find_readers`
    FindReaders,
    /// `Flusher::add`
    Add,
    /// `Flusher::commit`
    Commit,
}

#[derive(Debug)]
struct Faults {
    find_readers: AtomicBool,
    commit: AtomicBool,
    /// Adds that may still succeed; `usize::MAX` means unlimited
    add_budget: AtomicUsize,
    snapshots_taken: AtomicUsize,
}

impl Faults {
    fn check(&self, point: FaultPoint, family: &str) -> Result<()> {
        let failed = match point {
            FaultPoint::FindReaders => self.find_readers.load(Ordering::SeqCst),
            FaultPoint::Commit => self.commit.load(Ordering::SeqCst),
            FaultPoint::Add => self
                .add_budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |budget| match budget {
                    usize::MAX => Some(usize::MAX),
                    0 => None,
                    n => Some(n - 1),
                })
                .is_err(),
        };
        if failed {
            Err(Error::storage(format!(
                "injected {:?} failure in family {}",
                point, family
            )))
        } else {
            Ok(())
        }
    }
}

/// A [`Family`] that fails on demand
#[derive(Debug, Clone)]
pub struct FaultyFamily {
    inner: VersionedFamily,
    faults: Arc<Faults>,
}

impl FaultyFamily {
    /// Wrap an existing family
    pub fn new(inner: VersionedFamily) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults {
                find_readers: AtomicBool::new(false),
                commit: AtomicBool::new(false),
                add_budget: AtomicUsize::new(usize::MAX),
                snapshots_taken: AtomicUsize::new(0),
            }),
        }
    }

    /// Wrap a fresh in-memory family
    pub fn in_memory(name: &str) -> Self {
        Self::new(VersionedFamily::in_memory(name))
    }

    /// Make every call at `point` fail
    pub fn inject(&self, point: FaultPoint) {
        match point {
            FaultPoint::FindReaders => self.faults.find_readers.store(true, Ordering::SeqCst),
            FaultPoint::Commit => self.faults.commit.store(true, Ordering::SeqCst),
            FaultPoint::Add => self.faults.add_budget.store(0, Ordering::SeqCst),
        }
    }

    /// Let the next `n` adds succeed, then fail every add after them
    pub fn fail_add_after(&self, n: usize) {
        self.faults.add_budget.store(n, Ordering::SeqCst);
    }

    /// Stop failing at `point`
    pub fn heal(&self, point: FaultPoint) {
        match point {
            FaultPoint::FindReaders => self.faults.find_readers.store(false, Ordering::SeqCst),
            FaultPoint::Commit => self.faults.commit.store(false, Ordering::SeqCst),
            FaultPoint::Add => self.faults.add_budget.store(usize::MAX, Ordering::SeqCst),
        }
    }

    /// Stop failing everywhere
    pub fn heal_all(&self) {
        self.heal(FaultPoint::FindReaders);
        self.heal(FaultPoint::Add);
        self.heal(FaultPoint::Commit);
    }

    /// The wrapped family
    pub fn inner(&self) -> &VersionedFamily {
        &self.inner
    }

    /// Snapshots handed out so far
    pub fn snapshots_taken(&self) -> usize {
        self.faults.snapshots_taken.load(Ordering::SeqCst)
    }

    /// Snapshots handed out and not yet released
    pub fn active_snapshots(&self) -> usize {
        self.inner.active_snapshots()
    }
}

impl Family for FaultyFamily {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get_snapshot(&self) -> Box<dyn Snapshot> {
        self.faults.snapshots_taken.fetch_add(1, Ordering::SeqCst);
        Box::new(FaultySnapshot {
            name: self.inner.name().to_string(),
            inner: self.inner.get_snapshot(),
            faults: Arc::clone(&self.faults),
        })
    }

    fn new_flusher(&self) -> Box<dyn Flusher> {
        Box::new(FaultyFlusher {
            name: self.inner.name().to_string(),
            inner: self.inner.new_flusher(),
            faults: Arc::clone(&self.faults),
        })
    }
}

struct FaultySnapshot {
    name: String,
    inner: Box<dyn Snapshot>,
    faults: Arc<Faults>,
}

impl Snapshot for FaultySnapshot {
    fn find_readers(&self, key: FamilyKey) -> Result<Vec<Arc<dyn Reader>>> {
        self.faults.check(FaultPoint::FindReaders, &self.name)?;
        self.inner.find_readers(key)
    }

    fn version(&self) -> u64 {
        self.inner.version()
    }
}

struct FaultyFlusher {
    name: String,
    inner: Box<dyn Flusher>,
    faults: Arc<Faults>,
}

impl Flusher for FaultyFlusher {
    fn add(&mut self, key: FamilyKey, value: &[u8]) -> Result<()> {
        self.faults.check(FaultPoint::Add, &self.name)?;
        self.inner.add(key, value)
    }

    fn commit(&mut self) -> Result<()> {
        self.faults.check(FaultPoint::Commit, &self.name)?;
        self.inner.commit()
    }
}

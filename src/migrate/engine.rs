use super::classify::{self, PathClassification};
use super::report;
use crate::db::{ShareRecord, ShareStore, UpdatePlan};
use crate::eos::{FileMetadata, Lookup, StorageBackend};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// How long to wait for a freshly created version folder to become visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyVersionPointer,
    OutsideManagedTree,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyVersionPointer => write!(f, "already points to the version folder"),
            SkipReason::OutsideManagedTree => write!(f, "file not under home directory"),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Skipped(SkipReason),
    Updated {
        plan: UpdatePlan,
        version_folder: String,
    },
    Failed(Error),
}

/// What happened to one share.
#[derive(Debug)]
pub struct RecordResult {
    pub share_id: i64,
    pub file_source: Option<i64>,
    /// Backend path of the shared file, once resolved.
    pub path: Option<String>,
    pub outcome: Outcome,
    pub finished_at: DateTime<Utc>,
}

/// Repoints public file shares at their version folders.
pub struct Reconciler<'a, B: ?Sized, S: ?Sized> {
    backend: &'a B,
    store: &'a S,
    home_prefix: String,
    retry: RetryPolicy,
}

impl<'a, B, S> Reconciler<'a, B, S>
where
    B: StorageBackend + ?Sized,
    S: ShareStore + ?Sized,
{
    pub fn new(backend: &'a B, store: &'a S, home_prefix: &str, retry: RetryPolicy) -> Self {
        Self {
            backend,
            store,
            home_prefix: home_prefix.to_string(),
            retry,
        }
    }

    /// Process every share on a pool of `concurrency` workers and wait for all of them.
    ///
    /// A worker blocks on each backend call, so `concurrency` also bounds the
    /// number of backend processes alive at once. Results come back in input order.
    pub fn run(&self, shares: &[ShareRecord], concurrency: usize) -> Result<Vec<RecordResult>> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|idx| format!("reconcile-{}", idx))
            .build()?;

        let dry_run = self.store.is_dry_run();
        let results = pool.install(|| {
            shares
                .par_iter()
                .map(|share| {
                    let result = self.reconcile(share);
                    report::log_result(&result, dry_run);
                    result
                })
                .collect()
        });
        Ok(results)
    }

    /// Process one share. Never fails; errors end up in the outcome.
    pub fn reconcile(&self, share: &ShareRecord) -> RecordResult {
        let mut path = None;
        let outcome = self
            .try_reconcile(share, &mut path)
            .unwrap_or_else(Outcome::Failed);

        RecordResult {
            share_id: share.id,
            file_source: share.file_source,
            path,
            outcome,
            finished_at: Utc::now(),
        }
    }

    fn try_reconcile(&self, share: &ShareRecord, path: &mut Option<String>) -> Result<Outcome> {
        let inode = share.file_source.ok_or(Error::MissingFileSource(share.id))?;
        let file = match self.backend.lookup_by_inode(inode)? {
            Lookup::Found(meta) => meta,
            Lookup::NotFound => return Err(Error::InodeNotFound(inode)),
        };
        debug!(
            "RECORD: {} share_type:{} item_source:{:?} item_target:{:?} file_source:{} \
             file_target:{:?} path:{:?} uid:{} gid:{}",
            share.id,
            share.share_type,
            share.item_source,
            share.item_target,
            inode,
            share.file_target,
            file.path,
            file.owner_uid,
            file.owner_gid
        );
        *path = Some(file.path.clone());

        let version_folder = match classify::classify(&file.path, &self.home_prefix) {
            PathClassification::AlreadyVersionPointer => {
                return Ok(Outcome::Skipped(SkipReason::AlreadyVersionPointer))
            }
            PathClassification::OutsideManagedTree => {
                return Ok(Outcome::Skipped(SkipReason::OutsideManagedTree))
            }
            PathClassification::PointsIntoExistingVersionFolder => {
                debug!("RECORD: {} points into a version folder", share.id);
                self.resolve_path(classify::parent_dir(&file.path))?
            }
            PathClassification::NeedsVersionFolder => self.resolve_version_folder(&file)?,
        };
        debug!(
            "RECORD: {} version folder inode:{} path:{:?}",
            share.id, version_folder.inode, version_folder.path
        );

        let plan = UpdatePlan::from_version_folder(&version_folder)?;
        self.store.apply_update(share.id, &plan)?;
        Ok(Outcome::Updated {
            plan,
            version_folder: version_folder.path,
        })
    }

    fn resolve_path(&self, path: &str) -> Result<FileMetadata> {
        match self.backend.lookup_by_path(path)? {
            Lookup::Found(meta) => Ok(meta),
            Lookup::NotFound => Err(Error::PathNotFound(path.to_string())),
        }
    }

    /// Find the sibling version folder of `file`, creating it as the file's owner if absent.
    fn resolve_version_folder(&self, file: &FileMetadata) -> Result<FileMetadata> {
        let candidate = classify::version_folder_path(&file.path);
        if let Lookup::Found(meta) = self.backend.lookup_by_path(&candidate)? {
            return Ok(meta);
        }

        debug!(
            "Creating version folder {:?} as {}:{}",
            candidate, file.owner_uid, file.owner_gid
        );
        self.backend
            .create_version_folder(&file.owner_uid, &file.owner_gid, &file.path)?;
        self.await_version_folder(&candidate)
    }

    // The lookup may be served by a replica that has not seen the creation yet.
    fn await_version_folder(&self, path: &str) -> Result<FileMetadata> {
        let attempts = self.retry.max_attempts;
        for attempt in 1..=attempts {
            match self.backend.lookup_by_path(path) {
                Ok(Lookup::Found(meta)) => {
                    debug!("Version folder {:?} visible after {} lookups", path, attempt);
                    return Ok(meta);
                }
                Ok(Lookup::NotFound) => {
                    debug!("Version folder {:?} not visible yet ({}/{})", path, attempt, attempts)
                }
                Err(err) => debug!(
                    "Version folder {:?} lookup failed ({}/{}): {}",
                    path, attempt, attempts, err
                ),
            }
            if attempt < attempts && !self.retry.delay.is_zero() {
                thread::sleep(self.retry.delay);
            }
        }
        Err(Error::VersionFolderNotPropagated {
            path: path.to_string(),
            attempts,
        })
    }
}

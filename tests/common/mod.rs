#![allow(dead_code)]

use share_migrator::db::{ShareRecord, ShareStore, UpdatePlan};
use share_migrator::eos::{FileMetadata, Lookup, StorageBackend};
use share_migrator::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;

pub const HOME: &str = "/eos/scratch/user/";

pub fn meta(inode: i64, path: &str, owner: &str) -> FileMetadata {
    FileMetadata {
        inode,
        path: path.to_string(),
        owner_uid: owner.to_string(),
        owner_gid: owner.to_string(),
        size: Some(1024),
    }
}

pub fn share(id: i64, file_source: i64) -> ShareRecord {
    ShareRecord {
        id,
        share_type: 3,
        item_source: Some(file_source.to_string()),
        item_target: Some(format!("/{}", file_source)),
        file_source: Some(file_source),
        file_target: Some("/doc.txt".to_string()),
    }
}

// EOS answers for a directory with or without its trailing slash.
fn key(path: &str) -> String {
    path.trim_end_matches('/').to_string()
}

/// Version folder that `create_version_folder` makes visible only after
/// `hidden_for` further path lookups.
struct PendingFolder {
    meta: FileMetadata,
    hidden_for: u32,
}

#[derive(Default)]
pub struct FakeBackend {
    by_inode: Mutex<HashMap<i64, FileMetadata>>,
    by_path: Mutex<HashMap<String, FileMetadata>>,
    broken_paths: Mutex<HashMap<String, String>>,
    creatable: Mutex<HashMap<String, (String, FileMetadata, u32)>>,
    pending: Mutex<HashMap<String, PendingFolder>>,
    refuse_creation: Mutex<bool>,
    pub inode_lookups: Mutex<Vec<i64>>,
    pub path_lookups: Mutex<Vec<String>>,
    pub creations: Mutex<Vec<(String, String, String)>>,
}

impl FakeBackend {
    pub fn with_file(self, meta: FileMetadata) -> Self {
        self.by_inode.lock().unwrap().insert(meta.inode, meta.clone());
        self.by_path.lock().unwrap().insert(key(&meta.path), meta);
        self
    }

    /// A path that resolves but has no inode entry of its own.
    pub fn with_path(self, meta: FileMetadata) -> Self {
        self.by_path.lock().unwrap().insert(key(&meta.path), meta);
        self
    }

    pub fn with_broken_path(self, path: &str, stderr: &str) -> Self {
        self.broken_paths
            .lock()
            .unwrap()
            .insert(path.to_string(), stderr.to_string());
        self
    }

    /// Creating the version folder of `file_path` yields `folder`, visible
    /// after `hidden_for` lookups that still answer NotFound.
    pub fn creates(self, file_path: &str, folder: FileMetadata, hidden_for: u32) -> Self {
        self.creatable.lock().unwrap().insert(
            file_path.to_string(),
            (key(&folder.path), folder, hidden_for),
        );
        self
    }

    pub fn refusing_creation(self) -> Self {
        *self.refuse_creation.lock().unwrap() = true;
        self
    }

    pub fn path_lookup_count(&self, path: &str) -> usize {
        self.path_lookups
            .lock()
            .unwrap()
            .iter()
            .filter(|p| *p == path)
            .count()
    }
}

impl StorageBackend for FakeBackend {
    fn lookup_by_inode(&self, inode: i64) -> Result<Lookup> {
        self.inode_lookups.lock().unwrap().push(inode);
        Ok(match self.by_inode.lock().unwrap().get(&inode) {
            Some(meta) => Lookup::Found(meta.clone()),
            None => Lookup::NotFound,
        })
    }

    fn lookup_by_path(&self, path: &str) -> Result<Lookup> {
        self.path_lookups.lock().unwrap().push(path.to_string());
        if let Some(stderr) = self.broken_paths.lock().unwrap().get(path) {
            return Err(Error::Backend {
                status: Some(1),
                stderr: stderr.clone(),
            });
        }

        let path = key(path);
        let mut pending = self.pending.lock().unwrap();
        if let Some(folder) = pending.get_mut(&path) {
            if folder.hidden_for > 0 {
                folder.hidden_for -= 1;
                return Ok(Lookup::NotFound);
            }
            let folder = pending.remove(&path).unwrap();
            self.by_path.lock().unwrap().insert(path.clone(), folder.meta);
        }

        Ok(match self.by_path.lock().unwrap().get(&path) {
            Some(meta) => Lookup::Found(meta.clone()),
            None => Lookup::NotFound,
        })
    }

    fn create_version_folder(&self, owner_uid: &str, owner_gid: &str, path: &str) -> Result<()> {
        self.creations.lock().unwrap().push((
            owner_uid.to_string(),
            owner_gid.to_string(),
            path.to_string(),
        ));
        if *self.refuse_creation.lock().unwrap() {
            return Err(Error::Backend {
                status: Some(13),
                stderr: "error: you don't own this file".to_string(),
            });
        }
        if let Some((folder_path, meta, hidden_for)) = self.creatable.lock().unwrap().remove(path)
        {
            self.pending
                .lock()
                .unwrap()
                .insert(folder_path, PendingFolder { meta, hidden_for });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeStore {
    shares: Vec<ShareRecord>,
    dry_run: bool,
    /// Rows the database reports for an update of these ids, instead of 1.
    affected_rows: HashMap<i64, usize>,
    pub updates: Mutex<Vec<(i64, UpdatePlan)>>,
}

impl FakeStore {
    pub fn new(shares: Vec<ShareRecord>) -> Self {
        Self {
            shares,
            ..Default::default()
        }
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn with_affected_rows(mut self, share_id: i64, rows: usize) -> Self {
        self.affected_rows.insert(share_id, rows);
        self
    }

    pub fn updates(&self) -> Vec<(i64, UpdatePlan)> {
        self.updates.lock().unwrap().clone()
    }
}

impl ShareStore for FakeStore {
    fn fetch_shares(&self, _owner: Option<&str>) -> Result<Vec<ShareRecord>> {
        Ok(self.shares.clone())
    }

    fn apply_update(&self, share_id: i64, plan: &UpdatePlan) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        let rows = self.affected_rows.get(&share_id).copied().unwrap_or(1);
        share_migrator::db::share::ensure_single_row(share_id, rows)?;
        self.updates.lock().unwrap().push((share_id, plan.clone()));
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

use super::schema::oc_share;
use crate::eos::FileMetadata;
use crate::error::{Error, Result};
use crate::migrate::classify;
use diesel::mysql::{Mysql, MysqlConnection};
use diesel::prelude::*;
use diesel::query_builder::QueryFragment;
use diesel::query_dsl::methods::ExecuteDsl;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// `share_type` of a public link share.
pub const PUBLIC_LINK_SHARE_TYPE: i32 = 3;
pub const FILE_ITEM_TYPE: &str = "file";

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = oc_share)]
#[diesel(check_for_backend(diesel::mysql::Mysql))]
pub struct ShareRecord {
    pub id: i64,
    pub share_type: i32,
    pub item_source: Option<String>,
    pub item_target: Option<String>,
    pub file_source: Option<i64>,
    pub file_target: Option<String>,
}

/// New values for a share that should point at a version folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePlan {
    pub item_source: String,
    pub item_target: String,
    pub file_source: i64,
    pub file_target: String,
}

impl UpdatePlan {
    /// Only version folders can become share targets.
    pub fn from_version_folder(meta: &FileMetadata) -> Result<UpdatePlan> {
        if !classify::is_version_folder(&meta.path) {
            return Err(Error::NotVersionFolder(meta.path.clone()));
        }
        Ok(UpdatePlan {
            item_source: meta.inode.to_string(),
            item_target: format!("/{}", meta.inode),
            file_source: meta.inode,
            file_target: format!("/{}", classify::base_name(&meta.path)),
        })
    }
}

pub trait ShareStore: Send + Sync {
    /// Public link shares of files, optionally of a single owner, by ascending id.
    fn fetch_shares(&self, owner: Option<&str>) -> Result<Vec<ShareRecord>>;

    /// Point share `share_id` at the version folder described by `plan`.
    fn apply_update(&self, share_id: i64, plan: &UpdatePlan) -> Result<()>;

    fn is_dry_run(&self) -> bool;
}

/// An update keyed by primary id must touch exactly one row.
pub fn ensure_single_row(share_id: i64, rows: usize) -> Result<()> {
    if rows == 1 {
        Ok(())
    } else {
        Err(Error::Consistency { share_id, rows })
    }
}

fn shares_query(owner: Option<&str>) -> oc_share::BoxedQuery<'_, Mysql> {
    let mut query = oc_share::table
        .filter(oc_share::share_type.eq(PUBLIC_LINK_SHARE_TYPE))
        .filter(oc_share::item_type.eq(FILE_ITEM_TYPE))
        .order(oc_share::id.asc())
        .into_boxed();
    if let Some(owner) = owner {
        query = query.filter(oc_share::uid_owner.eq(owner));
    }
    query
}

fn update_query(
    share_id: i64,
    plan: &UpdatePlan,
) -> impl RunQueryDsl<MysqlConnection> + ExecuteDsl<MysqlConnection> + QueryFragment<Mysql> + '_
{
    diesel::update(oc_share::table.find(share_id)).set((
        oc_share::item_source.eq(plan.item_source.as_str()),
        oc_share::item_target.eq(plan.item_target.as_str()),
        oc_share::file_source.eq(plan.file_source),
        oc_share::file_target.eq(plan.file_target.as_str()),
    ))
}

pub struct MysqlShareStore {
    connection: Mutex<MysqlConnection>,
    dry_run: bool,
}

impl MysqlShareStore {
    pub fn new(connection: MysqlConnection, dry_run: bool) -> Self {
        Self {
            connection: Mutex::new(connection),
            dry_run,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MysqlConnection>> {
        self.connection.lock().map_err(|_| Error::ConnectionPoisoned)
    }
}

impl ShareStore for MysqlShareStore {
    fn fetch_shares(&self, owner: Option<&str>) -> Result<Vec<ShareRecord>> {
        let mut connection = self.lock()?;
        let shares = shares_query(owner)
            .select(ShareRecord::as_select())
            .load(&mut *connection)?;
        debug!("Loaded {} shares (owner filter: {:?})", shares.len(), owner);
        Ok(shares)
    }

    fn apply_update(&self, share_id: i64, plan: &UpdatePlan) -> Result<()> {
        if self.dry_run {
            debug!("Dry run, not updating share {}: {:?}", share_id, plan);
            return Ok(());
        }

        let mut connection = self.lock()?;
        let rows = update_query(share_id, plan).execute(&mut *connection)?;
        ensure_single_row(share_id, rows)
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

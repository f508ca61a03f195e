use super::file_info::{self, FileMetadata};
use crate::config::EosConfig;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Exit status of `eos file info` when the inode or path does not exist.
pub const NOT_FOUND_STATUS: i32 = 2;

/// Result of a metadata lookup. Absence is a value here, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(FileMetadata),
    NotFound,
}

/// Operations the migration needs from the storage backend.
pub trait StorageBackend: Send + Sync {
    fn lookup_by_inode(&self, inode: i64) -> Result<Lookup>;

    fn lookup_by_path(&self, path: &str) -> Result<Lookup>;

    /// Create the version folder of the file at `path`, acting as its owner.
    fn create_version_folder(&self, owner_uid: &str, owner_gid: &str, path: &str) -> Result<()>;
}

/// Drives the `eos` command line tool.
#[derive(Debug, Clone)]
pub struct EosClient {
    binary: PathBuf,
    mgm_url: String,
    lookup_uid: String,
    lookup_gid: String,
}

impl EosClient {
    pub fn new(config: &EosConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            mgm_url: config.mgm_url.clone(),
            lookup_uid: config.lookup_uid.clone(),
            lookup_gid: config.lookup_gid.clone(),
        }
    }

    fn command(&self, uid: &str, gid: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-r")
            .arg(uid)
            .arg(gid)
            .env("EOS_MGM_URL", &self.mgm_url)
            .stdin(Stdio::null());
        cmd
    }

    pub(crate) fn file_info_command(&self, target: &str) -> Command {
        let mut cmd = self.command(&self.lookup_uid, &self.lookup_gid);
        cmd.args(["file", "info", target, "-m"]);
        cmd
    }

    pub(crate) fn version_command(&self, owner_uid: &str, owner_gid: &str, path: &str) -> Command {
        let mut cmd = self.command(owner_uid, owner_gid);
        cmd.args(["file", "version", path]);
        cmd
    }

    fn run(&self, mut cmd: Command) -> Result<Output> {
        debug!("Running {:?}", cmd);
        let output = cmd.output().map_err(|source| Error::Spawn {
            program: self.binary.display().to_string(),
            source,
        })?;
        debug!("Exit status: {}", output.status);
        Ok(output)
    }

    fn file_info(&self, target: &str) -> Result<Lookup> {
        let output = self.run(self.file_info_command(target))?;
        interpret_file_info(&output)
    }
}

impl StorageBackend for EosClient {
    fn lookup_by_inode(&self, inode: i64) -> Result<Lookup> {
        self.file_info(&format!("inode:{}", inode))
    }

    fn lookup_by_path(&self, path: &str) -> Result<Lookup> {
        self.file_info(path)
    }

    fn create_version_folder(&self, owner_uid: &str, owner_gid: &str, path: &str) -> Result<()> {
        let output = self.run(self.version_command(owner_uid, owner_gid, path))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(backend_error(&output))
        }
    }
}

/// Map a finished `file info -m` invocation onto a lookup result.
pub fn interpret_file_info(output: &Output) -> Result<Lookup> {
    match output.status.code() {
        Some(0) => {
            let stdout = std::str::from_utf8(&output.stdout)
                .map_err(|e| Error::parse(format!("file info output is not UTF-8: {}", e)))?;
            file_info::parse(stdout).map(Lookup::Found)
        }
        Some(NOT_FOUND_STATUS) => Ok(Lookup::NotFound),
        _ => Err(backend_error(output)),
    }
}

fn backend_error(output: &Output) -> Error {
    Error::Backend {
        status: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

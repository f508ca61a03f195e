use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database connection lock poisoned")]
    ConnectionPoisoned,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Backend command failed with status {status:?}: {stderr}")]
    Backend { status: Option<i32>, stderr: String },

    #[error("Cannot execute backend command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot update share {share_id}: expected exactly one row, {rows} affected")]
    Consistency { share_id: i64, rows: usize },

    #[error("'{0}' is not a version folder")]
    NotVersionFolder(String),

    #[error("Version folder '{path}' still not visible after {attempts} lookups")]
    VersionFolderNotPropagated { path: String, attempts: u32 },

    #[error("No file with inode {0}")]
    InodeNotFound(i64),

    #[error("No file at '{0}'")]
    PathNotFound(String),

    #[error("Share {0} has no file_source")]
    MissingFileSource(i64),

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Report error: {0}")]
    Report(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod client;
pub mod file_info;

pub use client::{EosClient, Lookup, StorageBackend};
pub use file_info::FileMetadata;

pub mod mysql;
pub mod schema;
pub mod share;

pub use mysql::establish_connection;
pub use share::{MysqlShareStore, ShareRecord, ShareStore, UpdatePlan};

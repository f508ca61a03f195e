use crate::error::Result;
use diesel::mysql::MysqlConnection;
use diesel::prelude::*;
use tracing::debug;

pub fn establish_connection(database_url: &str) -> Result<MysqlConnection> {
    let connection = MysqlConnection::establish(database_url)?;
    debug!("Connected to database");
    Ok(connection)
}

use crate::{MySQLConnection, MySQLPrepared, MySQLSqlWriter};
use trophy_core::Driver;

/// Driver for MySQL and MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySQLDriver;

impl MySQLDriver {
    pub const fn new() -> Self {
        Self
    }
}

impl Driver for MySQLDriver {
    type Connection = MySQLConnection;
    type SqlWriter = MySQLSqlWriter;
    type Prepared = MySQLPrepared;

    const NAME: &'static str = "mysql";

    fn sql_writer(&self) -> Self::SqlWriter {
        MySQLSqlWriter::default()
    }
}

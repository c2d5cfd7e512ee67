use crate::{PostgresConnection, PostgresPrepared, PostgresSqlWriter};
use trophy_core::Driver;

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDriver {}

impl PostgresDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for PostgresDriver {
    type Connection = PostgresConnection;
    type SqlWriter = PostgresSqlWriter;
    type Prepared = PostgresPrepared;

    const NAME: &'static str = "postgres";

    fn sql_writer(&self) -> PostgresSqlWriter {
        PostgresSqlWriter {}
    }
}

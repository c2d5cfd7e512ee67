use crate::{Connection, Counter, Driver, Result, SqlWriter};
use anyhow::Context;
use std::future::Future;

/// Brings the database to the layout the manager expects.
///
/// Invoked once at startup, on a pooled connection, before any operation
/// runs. Must be idempotent: it runs at every startup.
pub trait SchemaUpdater: Send + Sync {
    fn ensure_schema<C: Connection>(
        &self,
        connection: &mut C,
        prefix: &str,
        counters: &[Counter],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Creates the achievements table and one table per counter when missing.
///
/// Never alters existing tables.
#[derive(Default, Debug, Clone, Copy)]
pub struct TableSchemaUpdater {}

impl TableSchemaUpdater {
    pub fn new() -> Self {
        Self {}
    }
}

impl SchemaUpdater for TableSchemaUpdater {
    async fn ensure_schema<C: Connection>(
        &self,
        connection: &mut C,
        prefix: &str,
        counters: &[Counter],
    ) -> Result<()> {
        let writer = connection.driver().sql_writer();
        let mut statements = Vec::with_capacity(counters.len() + 1);
        let mut sql = String::new();
        writer.write_create_achievements_table(&mut sql, prefix);
        statements.push(sql);
        for counter in counters {
            let mut sql = String::new();
            writer.write_create_counter_table(&mut sql, prefix, counter);
            statements.push(sql);
        }
        for sql in statements {
            log::debug!("{}", sql);
            connection
                .execute(sql.into())
                .await
                .with_context(|| format!("While creating the tables of {}", <C::Driver as Driver>::NAME))?;
        }
        Ok(())
    }
}

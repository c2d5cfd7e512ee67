use trophy_core::{SqlWriter, Value};

/// SQLite dialect: text storage for dates and uuids, `INSERT OR REPLACE` upserts.
#[derive(Default, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn write_column_type(&self, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) | Value::Int32(..) | Value::Int64(..) | Value::UInt64(..) => {
                out.push_str("INTEGER")
            }
            Value::Float64(..) => out.push_str("REAL"),
            Value::Varchar(..) | Value::Date(..) | Value::Timestamp(..) | Value::Uuid(..) => {
                out.push_str("TEXT")
            }
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Null => log::error!("A NULL value does not determine any column type"),
        }
    }

    fn write_upsert(
        &self,
        out: &mut String,
        prefix: &str,
        table: &str,
        columns: &[&str],
        _keys: &[&str],
    ) {
        self.write_insert_into(out, "INSERT OR REPLACE INTO", prefix, table, columns);
        out.push(';');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trophy_core::Counter;

    #[test]
    fn dialect() {
        let writer = SqliteSqlWriter::default();
        let mut out = String::new();
        writer.write_upsert_achievement(&mut out, "aa_");
        assert_eq!(
            out,
            r#"INSERT OR REPLACE INTO "aa_achievements" ("player_id", "achievement_name", "date") VALUES (?, ?, ?);"#
        );
        out.clear();
        writer.write_upsert_counter(&mut out, "", &Counter::CONNECTIONS);
        assert_eq!(
            out,
            r#"INSERT OR REPLACE INTO "connections" ("player_id", "connections", "date") VALUES (?, ?, ?);"#
        );
        out.clear();
        writer.write_create_counter_table(&mut out, "", &Counter::CONNECTIONS);
        assert_eq!(
            out,
            "CREATE TABLE IF NOT EXISTS \"connections\" (\n\
             \"player_id\" TEXT NOT NULL,\n\
             \"connections\" INTEGER NOT NULL,\n\
             \"date\" TEXT NOT NULL,\n\
             PRIMARY KEY (\"player_id\"));"
        );
    }
}

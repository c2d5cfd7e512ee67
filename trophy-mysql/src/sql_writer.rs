use trophy_core::{SqlWriter, Value};

/// MySQL dialect: backtick identifiers, `REPLACE INTO` upserts.
#[derive(Default, Clone, Copy)]
pub struct MySQLSqlWriter {}

impl SqlWriter for MySQLSqlWriter {
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(out, value, '`', "``");
        out.push('`');
    }

    fn write_column_type(&self, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::UInt64(..) => out.push_str("BIGINT UNSIGNED"),
            Value::Float64(..) => out.push_str("DOUBLE"),
            Value::Varchar(..) => out.push_str("VARCHAR(255)"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Timestamp(..) => out.push_str("DATETIME(3)"),
            Value::Uuid(..) => out.push_str("CHAR(36)"),
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
        self.write_insert_into(out, "REPLACE INTO", prefix, table, columns);
        out.push(';');
    }
}

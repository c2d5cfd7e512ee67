use std::fmt::Write;
use trophy_core::{SqlWriter, Value};

/// PostgreSQL dialect: numbered placeholders, standard `ON CONFLICT` upserts.
#[derive(Default, Clone, Copy)]
pub struct PostgresSqlWriter {}

impl SqlWriter for PostgresSqlWriter {
    fn write_placeholder(&self, out: &mut String, index: usize) {
        let _ = write!(out, "${index}");
    }

    fn write_column_type(&self, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::UInt64(..) => out.push_str("NUMERIC(20)"),
            Value::Float64(..) => out.push_str("DOUBLE PRECISION"),
            Value::Varchar(..) => out.push_str("VARCHAR(255)"),
            Value::Blob(..) => out.push_str("BYTEA"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Timestamp(..) => out.push_str("TIMESTAMP"),
            Value::Uuid(..) => out.push_str("UUID"),
            Value::Null => log::error!("A NULL value does not determine any column type"),
        }
    }
}

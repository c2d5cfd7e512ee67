use crate::{Counter, Value, separated_by};
use std::fmt::Write;

/// Table holding one row per (player, achievement).
pub const ACHIEVEMENTS_TABLE: &str = "achievements";
/// Player UUID column, present in every table.
pub const PLAYER_COLUMN: &str = "player_id";
/// Achievement name column.
pub const ACHIEVEMENT_COLUMN: &str = "achievement_name";
/// Awarded timestamp in the achievements table, last update date in counter tables.
pub const DATE_COLUMN: &str = "date";

/// Dialect printer producing the SQL text of every statement the manager runs.
///
/// Writers are pure string builders. Every dialect binds the parameters of a
/// statement in the same order, documented on each method, so the manager
/// binds without knowing which backend it talks to. The default
/// implementations produce standard SQL with `INSERT ... ON CONFLICT` upserts.
pub trait SqlWriter: Send + Sync {
    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', "\"\"");
        out.push('"');
    }

    /// Prefixed and quoted table name.
    fn write_table_name(&self, out: &mut String, prefix: &str, name: &str) {
        self.write_identifier_quoted(out, &format!("{prefix}{name}"));
    }

    /// Parameter placeholder, `index` starts from 1.
    fn write_placeholder(&self, out: &mut String, _index: usize) {
        out.push('?');
    }

    /// Render the SQL type for a `Value` prototype.
    fn write_column_type(&self, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::UInt64(..) => out.push_str("NUMERIC(20)"),
            Value::Float64(..) => out.push_str("DOUBLE PRECISION"),
            Value::Varchar(..) => out.push_str("VARCHAR(255)"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Timestamp(..) => out.push_str("TIMESTAMP"),
            Value::Uuid(..) => out.push_str("UUID"),
            Value::Null => log::error!("A NULL value does not determine any column type"),
        }
    }

    fn write_create_table(
        &self,
        out: &mut String,
        prefix: &str,
        name: &str,
        columns: &[(&str, Value)],
        primary_key: &[&str],
    ) {
        out.push_str("CREATE TABLE IF NOT EXISTS ");
        self.write_table_name(out, prefix, name);
        out.push_str(" (\n");
        separated_by(
            out,
            columns,
            |out, (column, ty)| {
                self.write_identifier_quoted(out, column);
                out.push(' ');
                self.write_column_type(out, ty);
                out.push_str(" NOT NULL");
            },
            ",\n",
        );
        out.push_str(",\nPRIMARY KEY (");
        separated_by(
            out,
            primary_key,
            |out, column| self.write_identifier_quoted(out, column),
            ", ",
        );
        out.push_str("));");
    }

    /// Insert a row, or overwrite the non key columns of the row having the
    /// same `keys`. Binds `columns` in order.
    fn write_upsert(
        &self,
        out: &mut String,
        prefix: &str,
        table: &str,
        columns: &[&str],
        keys: &[&str],
    ) {
        self.write_insert_into(out, "INSERT INTO", prefix, table, columns);
        out.push_str("\nON CONFLICT (");
        separated_by(
            out,
            keys,
            |out, column| self.write_identifier_quoted(out, column),
            ", ",
        );
        out.push_str(") DO UPDATE SET ");
        separated_by(
            out,
            columns.iter().filter(|c| !keys.contains(c)),
            |out, column| {
                self.write_identifier_quoted(out, column);
                out.push_str(" = EXCLUDED.");
                self.write_identifier_quoted(out, column);
            },
            ", ",
        );
        out.push(';');
    }

    /// `<verb> <table> (<columns>) VALUES (<placeholders>)` without a terminator.
    fn write_insert_into(
        &self,
        out: &mut String,
        verb: &str,
        prefix: &str,
        table: &str,
        columns: &[&str],
    ) {
        out.push_str(verb);
        out.push(' ');
        self.write_table_name(out, prefix, table);
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, column| self.write_identifier_quoted(out, column),
            ", ",
        );
        out.push_str(") VALUES (");
        separated_by(
            out,
            1..=columns.len(),
            |out, i| self.write_placeholder(out, i),
            ", ",
        );
        out.push(')');
    }

    fn write_create_achievements_table(&self, out: &mut String, prefix: &str) {
        self.write_create_table(
            out,
            prefix,
            ACHIEVEMENTS_TABLE,
            &[
                (PLAYER_COLUMN, Value::Uuid(None)),
                (ACHIEVEMENT_COLUMN, Value::Varchar(None)),
                (DATE_COLUMN, Value::Timestamp(None)),
            ],
            &[PLAYER_COLUMN, ACHIEVEMENT_COLUMN],
        );
    }

    fn write_create_counter_table(&self, out: &mut String, prefix: &str, counter: &Counter) {
        self.write_create_table(
            out,
            prefix,
            counter.name(),
            &[
                (PLAYER_COLUMN, Value::Uuid(None)),
                (counter.name(), Value::Int64(None)),
                (DATE_COLUMN, Value::Date(None)),
            ],
            &[PLAYER_COLUMN],
        );
    }

    /// Binds: player, achievement name, awarded timestamp.
    fn write_upsert_achievement(&self, out: &mut String, prefix: &str) {
        self.write_upsert(
            out,
            prefix,
            ACHIEVEMENTS_TABLE,
            &[PLAYER_COLUMN, ACHIEVEMENT_COLUMN, DATE_COLUMN],
            &[PLAYER_COLUMN, ACHIEVEMENT_COLUMN],
        );
    }

    /// Binds: player. Returns the count, no row when the player has none.
    fn write_select_counter(&self, out: &mut String, prefix: &str, counter: &Counter) {
        out.push_str("SELECT ");
        self.write_identifier_quoted(out, counter.name());
        out.push_str(" FROM ");
        self.write_table_name(out, prefix, counter.name());
        out.push_str(" WHERE ");
        self.write_identifier_quoted(out, PLAYER_COLUMN);
        out.push_str(" = ");
        self.write_placeholder(out, 1);
        out.push(';');
    }

    /// Binds: player, new count, date.
    fn write_upsert_counter(&self, out: &mut String, prefix: &str, counter: &Counter) {
        self.write_upsert(
            out,
            prefix,
            counter.name(),
            &[PLAYER_COLUMN, counter.name(), DATE_COLUMN],
            &[PLAYER_COLUMN],
        );
    }

    /// Binds: player. Returns name and timestamp ordered by timestamp then name.
    fn write_select_player_achievements(&self, out: &mut String, prefix: &str) {
        out.push_str("SELECT ");
        self.write_identifier_quoted(out, ACHIEVEMENT_COLUMN);
        out.push_str(", ");
        self.write_identifier_quoted(out, DATE_COLUMN);
        out.push_str(" FROM ");
        self.write_table_name(out, prefix, ACHIEVEMENTS_TABLE);
        out.push_str(" WHERE ");
        self.write_identifier_quoted(out, PLAYER_COLUMN);
        out.push_str(" = ");
        self.write_placeholder(out, 1);
        out.push_str(" ORDER BY ");
        self.write_identifier_quoted(out, DATE_COLUMN);
        out.push_str(", ");
        self.write_identifier_quoted(out, ACHIEVEMENT_COLUMN);
        out.push(';');
    }

    /// Binds: player, optionally achievement name. Returns a single count.
    fn write_count_achievements(&self, out: &mut String, prefix: &str, by_name: bool) {
        out.push_str("SELECT COUNT(*) FROM ");
        self.write_table_name(out, prefix, ACHIEVEMENTS_TABLE);
        out.push_str(" WHERE ");
        self.write_identifier_quoted(out, PLAYER_COLUMN);
        out.push_str(" = ");
        self.write_placeholder(out, 1);
        if by_name {
            out.push_str(" AND ");
            self.write_identifier_quoted(out, ACHIEVEMENT_COLUMN);
            out.push_str(" = ");
            self.write_placeholder(out, 2);
        }
        out.push(';');
    }

    /// No binds. Returns player and achievement count, most achievements first.
    fn write_select_top_players(&self, out: &mut String, prefix: &str, limit: u32) {
        out.push_str("SELECT ");
        self.write_identifier_quoted(out, PLAYER_COLUMN);
        out.push_str(", COUNT(*) FROM ");
        self.write_table_name(out, prefix, ACHIEVEMENTS_TABLE);
        out.push_str(" GROUP BY ");
        self.write_identifier_quoted(out, PLAYER_COLUMN);
        out.push_str(" ORDER BY COUNT(*) DESC, ");
        self.write_identifier_quoted(out, PLAYER_COLUMN);
        let _ = write!(out, " LIMIT {limit};");
    }
}

/// Standard SQL writer, used when a dialect needs no customization.
#[derive(Default, Clone, Copy)]
pub struct GenericSqlWriter {}

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {}

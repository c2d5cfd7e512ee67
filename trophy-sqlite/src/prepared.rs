use crate::{CBox, error_message_from_ptr};
use libsqlite3_sys::*;
use std::{
    ffi::{CStr, c_int},
    fmt::{self, Display},
    os::raw::{c_char, c_void},
};
use trophy_core::{AsValue, DATE_FORMAT, Error, Prepared, Result, TIMESTAMP_FORMAT, Value, truncate_long};

pub struct SqlitePrepared {
    pub(crate) statement: CBox<*mut sqlite3_stmt>,
    pub(crate) index: u64,
}

impl SqlitePrepared {
    pub(crate) fn new(prepared: CBox<*mut sqlite3_stmt>) -> Self {
        unsafe {
            sqlite3_clear_bindings(*prepared);
        }
        Self {
            statement: prepared,
            index: 1,
        }
    }

    fn bind_text(&mut self, index: c_int, text: &str) -> c_int {
        unsafe {
            sqlite3_bind_text(
                *self.statement,
                index,
                text.as_ptr() as *const c_char,
                text.len() as c_int,
                SQLITE_TRANSIENT(),
            )
        }
    }
}

impl Prepared for SqlitePrepared {
    fn bind(&mut self, value: impl AsValue) -> Result<&mut Self> {
        let index = self.index;
        self.bind_index(value, index)
    }

    /// Parameters are numbered from 1, like SQLite does.
    fn bind_index(&mut self, value: impl AsValue, index: u64) -> Result<&mut Self> {
        let index = index as c_int;
        let value = value.as_value();
        unsafe {
            let rc = match value {
                ref v if v.is_null() => sqlite3_bind_null(*self.statement, index),
                Value::Boolean(Some(v)) => sqlite3_bind_int(*self.statement, index, v as c_int),
                Value::Int32(Some(v)) => sqlite3_bind_int(*self.statement, index, v),
                Value::Int64(Some(v)) => sqlite3_bind_int64(*self.statement, index, v),
                Value::UInt64(Some(v)) => {
                    let Ok(v) = sqlite3_int64::try_from(v) else {
                        return Err(Error::msg(format!(
                            "Cannot bind u64 value `{v}` into sqlite integer because it's out of bounds"
                        )));
                    };
                    sqlite3_bind_int64(*self.statement, index, v)
                }
                Value::Float64(Some(v)) => sqlite3_bind_double(*self.statement, index, v),
                Value::Varchar(Some(ref v)) => self.bind_text(index, v),
                Value::Blob(Some(ref v)) => sqlite3_bind_blob(
                    *self.statement,
                    index,
                    v.as_ptr() as *const c_void,
                    v.len() as c_int,
                    SQLITE_TRANSIENT(),
                ),
                Value::Date(Some(v)) => self.bind_text(index, &v.format(DATE_FORMAT)?),
                Value::Timestamp(Some(v)) => self.bind_text(index, &v.format(TIMESTAMP_FORMAT)?),
                Value::Uuid(Some(v)) => self.bind_text(index, &v.hyphenated().to_string()),
                _ => {
                    let error =
                        Error::msg(format!("Cannot use a {:?} as a query parameter", value));
                    log::error!("{:#}", error);
                    return Err(error);
                }
            };
            if rc != SQLITE_OK {
                let db = sqlite3_db_handle(*self.statement);
                let query = sqlite3_sql(*self.statement);
                let error = Error::msg(error_message_from_ptr(&sqlite3_errmsg(db)).to_string())
                    .context(format!(
                        "Cannot bind parameter {} to query:\n{}",
                        index,
                        truncate_long!(CStr::from_ptr(query).to_string_lossy())
                    ));
                log::error!("{:#}", error);
                return Err(error);
            }
        }
        self.index = index as u64 + 1;
        Ok(self)
    }
}

impl Display for SqlitePrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sql = unsafe { sqlite3_sql(*self.statement) };
        if sql.is_null() {
            return write!(f, "{:p}", *self.statement);
        }
        let sql = unsafe { CStr::from_ptr(sql) }.to_string_lossy();
        f.write_str(&truncate_long!(sql))
    }
}
